use std::rc::Rc;

use crate::stmt::Stmt;
use crate::token::Token;

/// Identity of a resolvable expression node, stamped by the parser.
///
/// The resolver's side table is keyed by these ids rather than by node
/// addresses, so the table survives AST moves. Ids increase monotonically
/// across every parse feeding one interpreter (the REPL threads the
/// counter through), so two occurrences of the same name never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub u32);

/// Body of a function, shared between its declaration site and every
/// closure value created from it.
#[derive(Debug)]
pub struct FunctionExpr {
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug)]
pub enum Expr {
    /// A literal keeps its source token; the evaluator reads the payload.
    Literal(Token),

    Grouping(Box<Expr>),

    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `and` / `or`, kept apart from `Binary` for short-circuiting.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    Variable {
        id: ExprId,
        name: Token,
    },

    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// Property read: `object.name`.
    Get {
        object: Box<Expr>,
        name: Token,
    },

    /// Property write: `object.name = value`.
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    This {
        id: ExprId,
        keyword: Token,
    },

    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },

    /// Anonymous `fun (params) { body }` expression.
    Function(Rc<FunctionExpr>),
}
