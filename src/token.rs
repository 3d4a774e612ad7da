use std::fmt;
use std::mem;

/// Token kinds produced by the scanner. Literal payloads ride along inside
/// the `STRING` and `NUMBER` variants.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone)]
pub enum TokenType {
    // Single-character tokens.
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACE,
    RIGHT_BRACE,
    COMMA,
    DOT,
    MINUS,
    PLUS,
    SEMICOLON,
    SLASH,
    STAR,

    // One or two character tokens.
    BANG,
    BANG_EQUAL,
    EQUAL,
    EQUAL_EQUAL,
    GREATER,
    GREATER_EQUAL,
    LESS,
    LESS_EQUAL,

    // Literals.
    IDENTIFIER,
    STRING(String),
    NUMBER(f64),

    // Keywords.
    AND,
    CLASS,
    ELSE,
    FALSE,
    FUN,
    FOR,
    IF,
    NIL,
    OR,
    PRINT,
    RETURN,
    SUPER,
    THIS,
    TRUE,
    VAR,
    WHILE,

    EOF,
}

impl PartialEq for TokenType {
    // Kind equality only. NUMBER(1.0) and NUMBER(2.0) are the same kind of
    // token; the parser matches on kinds and reads payloads separately.
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

impl Eq for TokenType {}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub line: usize,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, line: usize) -> Self {
        Self {
            token_type,
            lexeme,
            line,
        }
    }
}

impl fmt::Display for Token {
    /// `KIND LEXEME LITERAL`, with `null` for tokens that carry no literal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind: String = format!("{:?}", self.token_type);
        let kind: &str = kind.split('(').next().unwrap_or("");

        match &self.token_type {
            TokenType::STRING(literal) => write!(f, "{} {} {}", kind, self.lexeme, literal),

            TokenType::NUMBER(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{} {} {:.1}", kind, self.lexeme, n)
                } else {
                    write!(f, "{} {} {}", kind, self.lexeme, n)
                }
            }

            _ => write!(f, "{} {} null", kind, self.lexeme),
        }
    }
}
