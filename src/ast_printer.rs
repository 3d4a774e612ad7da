use crate::expr::{Expr, FunctionExpr};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::TokenType;

/// Renders the AST in parenthesized prefix form, one top-level statement
/// per line. Behind the `--ast` CLI flag; also handy in tests for
/// asserting on tree shape (e.g. that `for` really desugared).
pub struct AstPrinter;

impl AstPrinter {
    pub fn print_program(statements: &[Stmt]) -> String {
        statements
            .iter()
            .map(Self::print_stmt)
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(expr {})", Self::print(expr)),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(expr) => format!("(var {} {})", name.lexeme, Self::print(expr)),

                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => {
                let mut out: String = "(block".to_string();

                for s in statements {
                    out.push(' ');
                    out.push_str(&Self::print_stmt(s));
                }

                out.push(')');
                out
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),

                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::Return { value, .. } => match value {
                Some(expr) => format!("(return {})", Self::print(expr)),

                None => "(return)".to_string(),
            },

            Stmt::Function(decl) => format!(
                "(fun {} {})",
                decl.name.lexeme,
                Self::function_parts(&decl.function)
            ),

            Stmt::Class {
                name,
                superclass,
                methods,
                class_methods,
            } => {
                let mut out: String = format!("(class {}", name.lexeme);

                if let Some(Expr::Variable {
                    name: super_name, ..
                }) = superclass
                {
                    out.push_str(&format!(" (< {})", super_name.lexeme));
                }

                for method in methods {
                    out.push(' ');
                    out.push_str(&Self::print_method(method));
                }

                for method in class_methods {
                    out.push_str(" (class ");
                    out.push_str(&Self::print_method(method));
                    out.push(')');
                }

                out.push(')');
                out
            }
        }
    }

    pub fn print(expr: &Expr) -> String {
        match expr {
            Expr::Literal(token) => match &token.token_type {
                TokenType::NUMBER(n) => {
                    if n.fract() == 0.0 {
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }

                TokenType::STRING(s) => s.clone(),

                TokenType::TRUE => "true".to_string(),

                TokenType::FALSE => "false".to_string(),

                TokenType::NIL => "nil".to_string(),

                _ => token.lexeme.clone(),
            },

            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut out: String = format!("(call {}", Self::print(callee));

                for argument in arguments {
                    out.push(' ');
                    out.push_str(&Self::print(argument));
                }

                out.push(')');
                out
            }

            Expr::Get { object, name } => {
                format!("(get {} {})", Self::print(object), name.lexeme)
            }

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(set {} {} {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::This { .. } => "this".to_string(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            Expr::Function(function) => Self::print_function(function),
        }
    }

    fn print_method(decl: &FunctionDecl) -> String {
        format!("({} {})", decl.name.lexeme, Self::function_parts(&decl.function))
    }

    fn print_function(function: &FunctionExpr) -> String {
        format!("(fun {})", Self::function_parts(function))
    }

    /// `(params) stmt stmt ...`, the shared tail of every function form.
    fn function_parts(function: &FunctionExpr) -> String {
        let params: Vec<&str> = function
            .params
            .iter()
            .map(|param| param.lexeme.as_str())
            .collect();

        let mut out: String = format!("({})", params.join(" "));

        for stmt in &function.body {
            out.push(' ');
            out.push_str(&Self::print_stmt(stmt));
        }

        out
    }
}
