use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::expr::{Expr, ExprId};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::{LoxClass, LoxFunction, LoxInstance, NativeFunction, Value};

/// Non-local exits threaded through the evaluator. A `return` statement
/// travels as `Return` until the nearest enclosing function call site
/// catches it; `Error` propagates all the way out. Block scopes restore
/// their environment for both alike.
pub enum Unwind {
    Error(LoxError),
    Return(Value),
}

impl From<LoxError> for Unwind {
    fn from(e: LoxError) -> Self {
        Unwind::Error(e)
    }
}

impl From<io::Error> for Unwind {
    fn from(e: io::Error) -> Self {
        Unwind::Error(LoxError::Io(e))
    }
}

type Exec<T> = std::result::Result<T, Unwind>;

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    /// Resolver side table: expression identity to scope depth. Absent
    /// entries mean the name is global.
    locals: HashMap<ExprId, usize>,
    output: Rc<RefCell<dyn Write>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Rc::new(RefCell::new(io::stdout())))
    }

    /// Route `print` somewhere other than stdout. Tests capture program
    /// output this way.
    pub fn with_output(output: Rc<RefCell<dyn Write>>) -> Self {
        let globals: Rc<RefCell<Environment>> = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::Native(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: clock_native,
            })),
        );

        info!("interpreter ready, globals seeded");

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Resolver callback: remember that expression `id` refers to a frame
    /// `depth` hops up from wherever it is evaluated.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Run a resolved program. The first runtime error aborts the rest.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}

                Err(Unwind::Error(e)) => return Err(e),

                // The resolver rejects top-level `return`, so this arm is
                // unreachable for programs that got this far.
                Err(Unwind::Return(_)) => return Ok(()),
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Exec<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.output.borrow_mut(), "{}", value)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,

                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let frame = Environment::with_enclosing(Rc::clone(&self.environment));

                self.execute_block(statements, Rc::new(RefCell::new(frame)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,

                    None => Value::Nil,
                };

                Err(Unwind::Return(value))
            }

            Stmt::Function(decl) => {
                let function = LoxFunction {
                    name: Some(decl.name.lexeme.clone()),
                    declaration: Rc::clone(&decl.function),
                    closure: Rc::clone(&self.environment),
                    is_initializer: false,
                };

                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));

                Ok(())
            }

            Stmt::Class {
                name,
                superclass,
                methods,
                class_methods,
            } => self.execute_class(name, superclass.as_ref(), methods, class_methods),
        }
    }

    /// Run `statements` inside `frame`, restoring the previous frame on
    /// every exit path: normal completion, runtime error, and `return`.
    fn execute_block(
        &mut self,
        statements: &[Stmt],
        frame: Rc<RefCell<Environment>>,
    ) -> Exec<()> {
        let previous: Rc<RefCell<Environment>> = Rc::clone(&self.environment);

        self.environment = frame;

        let mut result: Exec<()> = Ok(());

        for stmt in statements {
            result = self.execute(stmt);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[FunctionDecl],
        class_methods: &[FunctionDecl],
    ) -> Exec<()> {
        let superclass: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => {
                let line: usize = match expr {
                    Expr::Variable { name, .. } => name.line,

                    _ => name.line,
                };

                match self.evaluate(expr)? {
                    Value::Class(class) => Some(class),

                    _ => {
                        return Err(
                            LoxError::runtime(line, "Superclass must be a class.").into()
                        )
                    }
                }
            }

            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // Methods of a subclass capture an extra frame holding `super`.
        let previous: Rc<RefCell<Environment>> = Rc::clone(&self.environment);

        if let Some(superclass) = &superclass {
            let mut frame = Environment::with_enclosing(Rc::clone(&self.environment));

            frame.define("super", Value::Class(Rc::clone(superclass)));

            self.environment = Rc::new(RefCell::new(frame));
        }

        let methods: HashMap<String, Rc<LoxFunction>> =
            self.build_method_map(methods, true);

        let class_method_map: HashMap<String, Rc<LoxFunction>> =
            self.build_method_map(class_methods, false);

        // The metaclass makes `Klass.method()` work: the class object is
        // treated as an instance of it during property lookup.
        let metaclass = LoxClass {
            name: format!("{} metaclass", name.lexeme),
            superclass: None,
            methods: class_method_map,
            metaclass: None,
        };

        let class = LoxClass {
            name: name.lexeme.clone(),
            superclass,
            methods,
            metaclass: Some(Rc::new(metaclass)),
        };

        debug!("class '{}' constructed", class.name);

        self.environment = previous;

        self.environment
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)))?;

        Ok(())
    }

    fn build_method_map(
        &self,
        declarations: &[FunctionDecl],
        allow_initializer: bool,
    ) -> HashMap<String, Rc<LoxFunction>> {
        let mut map: HashMap<String, Rc<LoxFunction>> = HashMap::new();

        for decl in declarations {
            let function = LoxFunction {
                name: Some(decl.name.lexeme.clone()),
                declaration: Rc::clone(&decl.function),
                closure: Rc::clone(&self.environment),
                is_initializer: allow_initializer && decl.name.lexeme == "init",
            };

            map.insert(decl.name.lexeme.clone(), Rc::new(function));
        }

        map
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    fn evaluate(&mut self, expr: &Expr) -> Exec<Value> {
        match expr {
            Expr::Literal(token) => self.evaluate_literal(token),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        let written: bool = Environment::assign_at(
                            &self.environment,
                            distance,
                            &name.lexeme,
                            value.clone(),
                        );

                        if !written {
                            return Err(LoxError::runtime(
                                name.line,
                                format!("Undefined variable '{}'.", name.lexeme),
                            )
                            .into());
                        }
                    }

                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());

                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call_value(callee, args, paren)
            }

            Expr::Get { object, name } => self.evaluate_get(object, name),

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object: Value = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => {
                        let value: Value = self.evaluate(value)?;

                        instance
                            .borrow_mut()
                            .fields
                            .insert(name.lexeme.clone(), value.clone());

                        Ok(value)
                    }

                    _ => Err(
                        LoxError::runtime(name.line, "Only instances have fields.").into()
                    ),
                }
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),

            Expr::Function(declaration) => {
                let function = LoxFunction {
                    name: None,
                    declaration: Rc::clone(declaration),
                    closure: Rc::clone(&self.environment),
                    is_initializer: false,
                };

                Ok(Value::Function(Rc::new(function)))
            }
        }
    }

    fn evaluate_literal(&self, token: &Token) -> Exec<Value> {
        match &token.token_type {
            TokenType::NUMBER(n) => Ok(Value::Number(*n)),

            TokenType::STRING(s) => Ok(Value::String(s.clone())),

            TokenType::TRUE => Ok(Value::Bool(true)),

            TokenType::FALSE => Ok(Value::Bool(false)),

            TokenType::NIL => Ok(Value::Nil),

            _ => Err(LoxError::runtime(token.line, "Invalid literal.").into()),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Exec<Value> {
        let right: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(
                    LoxError::runtime(operator.line, "Operand must be a number.").into()
                ),
            },

            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),

            _ => Err(LoxError::runtime(operator.line, "Invalid unary operator.").into()),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Exec<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(self.numbers_expected(operator)),
            },

            TokenType::STAR => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(self.numbers_expected(operator)),
            },

            // IEEE 754 division: dividing by zero produces an infinity or
            // NaN, never a runtime error.
            TokenType::SLASH => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),

                _ => Err(self.numbers_expected(operator)),
            },

            TokenType::GREATER => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(self.numbers_expected(operator)),
            },

            TokenType::GREATER_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(self.numbers_expected(operator)),
            },

            TokenType::LESS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(self.numbers_expected(operator)),
            },

            TokenType::LESS_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(self.numbers_expected(operator)),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            _ => Err(LoxError::runtime(operator.line, "Invalid binary operator.").into()),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Exec<Value> {
        let left: Value = self.evaluate(left)?;

        // The operand value itself is returned, not a coerced boolean.
        match operator.token_type {
            TokenType::OR if left.is_truthy() => Ok(left),

            TokenType::AND if !left.is_truthy() => Ok(left),

            _ => self.evaluate(right),
        }
    }

    fn evaluate_get(&mut self, object: &Expr, name: &Token) -> Exec<Value> {
        let object: Value = self.evaluate(object)?;

        match object {
            Value::Instance(instance) => {
                // Fields shadow methods.
                if let Some(value) = instance.borrow().fields.get(&name.lexeme) {
                    return Ok(value.clone());
                }

                let method: Option<Rc<LoxFunction>> =
                    instance.borrow().class.find_method(&name.lexeme);

                match method {
                    Some(method) => {
                        let bound = method.bind(Value::Instance(Rc::clone(&instance)));

                        Ok(Value::Function(Rc::new(bound)))
                    }

                    None => Err(self.undefined_property(name)),
                }
            }

            // The class object is an instance of its metaclass; this is
            // what makes `Klass.method()` dispatch to class methods.
            Value::Class(class) => {
                let method: Option<Rc<LoxFunction>> = class
                    .metaclass
                    .as_ref()
                    .and_then(|metaclass| metaclass.find_method(&name.lexeme));

                match method {
                    Some(method) => {
                        let bound = method.bind(Value::Class(Rc::clone(&class)));

                        Ok(Value::Function(Rc::new(bound)))
                    }

                    None => Err(self.undefined_property(name)),
                }
            }

            _ => Err(LoxError::runtime(name.line, "Only instances have properties.").into()),
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Exec<Value> {
        let distance: usize = match self.locals.get(&id) {
            Some(&distance) => distance,

            None => {
                return Err(LoxError::runtime(
                    keyword.line,
                    "Undefined variable 'super'.",
                )
                .into())
            }
        };

        let superclass: Rc<LoxClass> =
            match Environment::get_at(&self.environment, distance, "super") {
                Some(Value::Class(class)) => class,

                _ => {
                    return Err(LoxError::runtime(
                        keyword.line,
                        "Undefined variable 'super'.",
                    )
                    .into())
                }
            };

        // `this` lives in the frame just inside the one holding `super`.
        let object: Value = Environment::get_at(&self.environment, distance - 1, "this")
            .unwrap_or(Value::Nil);

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(object)))),

            None => Err(self.undefined_property(method)),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Exec<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, &name.lexeme)
                .ok_or_else(|| {
                    LoxError::runtime(
                        name.line,
                        format!("Undefined variable '{}'.", name.lexeme),
                    )
                    .into()
                }),

            None => self.globals.borrow().get(name).map_err(Unwind::from),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────────────────────────

    fn call_value(&mut self, callee: Value, arguments: Vec<Value>, paren: &Token) -> Exec<Value> {
        match callee {
            Value::Native(native) => {
                self.check_arity(native.arity, arguments.len(), paren)?;

                (native.func)(&arguments)
                    .map_err(|msg| LoxError::runtime(paren.line, msg).into())
            }

            Value::Function(function) => {
                self.check_arity(function.arity(), arguments.len(), paren)?;

                self.call_function(&function, arguments)
            }

            Value::Class(class) => {
                self.check_arity(class.arity(), arguments.len(), paren)?;

                let instance: Rc<RefCell<LoxInstance>> =
                    Rc::new(RefCell::new(LoxInstance::new(Rc::clone(&class))));

                if let Some(initializer) = class.find_method("init") {
                    let bound = initializer.bind(Value::Instance(Rc::clone(&instance)));

                    self.call_function(&bound, arguments)?;
                }

                Ok(Value::Instance(instance))
            }

            _ => Err(LoxError::runtime(
                paren.line,
                "Can only call functions and classes.",
            )
            .into()),
        }
    }

    fn call_function(&mut self, function: &LoxFunction, arguments: Vec<Value>) -> Exec<Value> {
        debug!(
            "calling {} with {} argument(s)",
            function.name.as_deref().unwrap_or("<anonymous>"),
            arguments.len()
        );

        let mut frame = Environment::with_enclosing(Rc::clone(&function.closure));

        for (param, argument) in function.declaration.params.iter().zip(arguments) {
            frame.define(&param.lexeme, argument);
        }

        let result: Exec<()> =
            self.execute_block(&function.declaration.body, Rc::new(RefCell::new(frame)));

        match result {
            // Falling off the end yields nil, except in an initializer,
            // which always hands back the instance under construction.
            Ok(()) => {
                if function.is_initializer {
                    Ok(self.bound_this(function))
                } else {
                    Ok(Value::Nil)
                }
            }

            Err(Unwind::Return(value)) => {
                if function.is_initializer {
                    Ok(self.bound_this(function))
                } else {
                    Ok(value)
                }
            }

            Err(e) => Err(e),
        }
    }

    fn bound_this(&self, function: &LoxFunction) -> Value {
        Environment::get_at(&function.closure, 0, "this").unwrap_or(Value::Nil)
    }

    fn check_arity(&self, expected: usize, got: usize, paren: &Token) -> Exec<()> {
        if expected == got {
            Ok(())
        } else {
            Err(LoxError::runtime(
                paren.line,
                format!("Expected {} arguments but got {}.", expected, got),
            )
            .into())
        }
    }

    fn numbers_expected(&self, operator: &Token) -> Unwind {
        LoxError::runtime(operator.line, "Operands must be numbers.").into()
    }

    fn undefined_property(&self, name: &Token) -> Unwind {
        LoxError::runtime(
            name.line,
            format!("Undefined property '{}'.", name.lexeme),
        )
        .into()
    }
}

fn clock_native(_args: &[Value]) -> std::result::Result<Value, String> {
    let seconds: f64 = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("Clock error: {}", e))?
        .as_secs_f64();

    Ok(Value::Number(seconds))
}
