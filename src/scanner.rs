use std::iter::FusedIterator;

use log::{debug, info};
use phf::phf_map;

use crate::error::LoxError;
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and" => TokenType::AND,
    b"class" => TokenType::CLASS,
    b"else" => TokenType::ELSE,
    b"false" => TokenType::FALSE,
    b"fun" => TokenType::FUN,
    b"for" => TokenType::FOR,
    b"if" => TokenType::IF,
    b"nil" => TokenType::NIL,
    b"or" => TokenType::OR,
    b"print" => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super" => TokenType::SUPER,
    b"this" => TokenType::THIS,
    b"true" => TokenType::TRUE,
    b"var" => TokenType::VAR,
    b"while" => TokenType::WHILE,
};

/// Streaming scanner over a raw byte buffer.
///
/// Yields `Ok(Token)` per lexeme, `Err` for unexpected characters and
/// unterminated strings, then a final `EOF` token. Errors do not stop the
/// stream; scanning resumes at the next byte so one bad character cannot
/// hide later diagnostics.
#[derive(Debug, Clone)]
pub struct Scanner {
    source: Vec<u8>,
    start: usize,
    current: usize,
    line: usize,
    eof_emitted: bool,
}

impl Scanner {
    pub fn new(buf: Vec<u8>) -> Self {
        info!("scanner over {} byte(s)", buf.len());

        Self {
            source: buf,
            start: 0,
            current: 0,
            line: 1,
            eof_emitted: false,
        }
    }

    /// Scan one lexeme starting at `self.start`. `Ok(None)` means the
    /// lexeme produced no token (whitespace or a comment).
    fn scan_token(&mut self) -> Result<Option<TokenType>, LoxError> {
        let byte: u8 = self.advance();

        let token_type: TokenType = match byte {
            b'(' => TokenType::LEFT_PAREN,

            b')' => TokenType::RIGHT_PAREN,

            b'{' => TokenType::LEFT_BRACE,

            b'}' => TokenType::RIGHT_BRACE,

            b',' => TokenType::COMMA,

            b'.' => TokenType::DOT,

            b'-' => TokenType::MINUS,

            b'+' => TokenType::PLUS,

            b';' => TokenType::SEMICOLON,

            b'*' => TokenType::STAR,

            b'!' => {
                if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                }
            }

            b'=' => {
                if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                }
            }

            b'<' => {
                if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                }
            }

            b'>' => {
                if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                }
            }

            b'/' => {
                if self.match_byte(b'/') {
                    debug!("comment at line {}", self.line);

                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.advance();
                    }

                    return Ok(None);
                }

                TokenType::SLASH
            }

            b' ' | b'\r' | b'\t' => return Ok(None),

            b'\n' => {
                self.line += 1;

                return Ok(None);
            }

            b'"' => self.scan_string()?,

            b'0'..=b'9' => self.scan_number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(),

            _ => {
                debug!("unexpected byte 0x{:02x} at line {}", byte, self.line);

                return Err(LoxError::scan(
                    self.line,
                    format!("Unexpected character: {}", byte as char),
                ));
            }
        };

        Ok(Some(token_type))
    }

    /// String literals may span lines; no escape sequences are processed.
    fn scan_string(&mut self) -> Result<TokenType, LoxError> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.peek() == b'\n' {
                self.line += 1;
            }

            self.advance();
        }

        if self.is_at_end() {
            return Err(LoxError::scan(self.line, "Unterminated string."));
        }

        // Closing quote.
        self.advance();

        let literal: String =
            String::from_utf8_lossy(&self.source[self.start + 1..self.current - 1]).into_owned();

        debug!("string literal: {:?}", literal);

        Ok(TokenType::STRING(literal))
    }

    fn scan_number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // A fractional part needs a digit after the dot, otherwise the dot
        // is a separate token (e.g. `1.foo`).
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: String =
            String::from_utf8_lossy(&self.source[self.start..self.current]).into_owned();

        // The lexeme is digits-and-dot by construction, so this parse
        // cannot fail for finite input.
        let number: f64 = text.parse().unwrap_or(0.0);

        debug!("number literal: {}", number);

        TokenType::NUMBER(number)
    }

    fn scan_identifier(&mut self) -> TokenType {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }

        match KEYWORDS.get(&self.source[self.start..self.current]) {
            Some(token_type) => token_type.clone(),

            None => TokenType::IDENTIFIER,
        }
    }

    #[inline]
    fn advance(&mut self) -> u8 {
        let byte: u8 = self.source[self.current];

        self.current += 1;

        byte
    }

    #[inline]
    fn match_byte(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.current += 1;

            true
        }
    }

    #[inline]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.source[self.current]
        }
    }

    #[inline]
    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.source.len() {
            0
        } else {
            self.source[self.current + 1]
        }
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

impl Iterator for Scanner {
    type Item = Result<Token, LoxError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.is_at_end() {
                if self.eof_emitted {
                    return None;
                }

                self.eof_emitted = true;

                info!("EOF at line {}", self.line);

                return Some(Ok(Token::new(TokenType::EOF, String::new(), self.line)));
            }

            self.start = self.current;

            match self.scan_token() {
                Ok(Some(token_type)) => {
                    let lexeme: String =
                        String::from_utf8_lossy(&self.source[self.start..self.current])
                            .into_owned();

                    debug!(
                        "token {:?} '{}' at line {}",
                        token_type, lexeme, self.line
                    );

                    return Some(Ok(Token::new(token_type, lexeme, self.line)));
                }

                Ok(None) => continue,

                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl FusedIterator for Scanner {}
