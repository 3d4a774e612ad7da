//! Error hierarchy for the interpreter.
//!
//! Every stage (scanner, parser, resolver, runtime, CLI) converts its
//! failures into a [`LoxError`] variant, giving the crate a uniform
//! `Result<T>` alias and a single place where diagnostic formats live.
//! The `Display` impls derived below produce exactly the text the CLI
//! prints, so callers report an error with nothing more than `eprintln!`.
//!
//! This module does not print anything itself.

use std::io;

use log::info;
use thiserror::Error;

use crate::token::{Token, TokenType};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical error: `[line N] Error: MESSAGE`.
    #[error("[line {line}] Error: {message}")]
    Scan { message: String, line: usize },

    /// Syntax error attached to a token: `[line N] Error at 'LEXEME': MESSAGE`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Static-analysis error, same shape as a parse error.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime error: `MESSAGE` followed by `[line N]` on its own line.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    pub fn scan<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("scan error: line={}, msg={}", line, message);

        LoxError::Scan { message, line }
    }

    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            location: locate(token),
            line: token.line,
        }
    }

    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            location: locate(token),
            line: token.line,
        }
    }

    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("runtime error: line={}, msg={}", line, message);

        LoxError::Runtime { message, line }
    }

    /// Process exit code for this error per the CLI contract: 65 for
    /// anything caught before execution, 70 once the program is running.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoxError::Scan { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. } => 65,

            LoxError::Runtime { .. } | LoxError::Io(_) => 70,
        }
    }
}

fn locate(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
