use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// One frame of the scope chain. Frames are shared (`Rc`) because every
/// closure keeps its defining frame alive, and mutable (`RefCell`) because
/// assignment writes through the chain.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Unconditional write into this frame. Redefinition is legal here;
    /// the resolver rejects duplicates in non-global scopes statically.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(LoxError::runtime(
                name.line,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);

            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::runtime(
                name.line,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Frame exactly `distance` hops up the chain, or `None` if the chain
    /// is shorter (the resolver makes that unreachable for resolved ids).
    fn ancestor(
        this: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut frame: Rc<RefCell<Environment>> = Rc::clone(this);

        for _ in 0..distance {
            let next: Option<Rc<RefCell<Environment>>> = frame.borrow().enclosing.clone();

            frame = next?;
        }

        Some(frame)
    }

    /// Depth-addressed read used for resolved locals.
    pub fn get_at(
        this: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
    ) -> Option<Value> {
        let frame: Rc<RefCell<Environment>> = Self::ancestor(this, distance)?;

        let value: Option<Value> = frame.borrow().values.get(name).cloned();

        value
    }

    /// Depth-addressed write. Returns whether the slot existed.
    pub fn assign_at(
        this: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
    ) -> bool {
        match Self::ancestor(this, distance) {
            Some(frame) => {
                let mut frame = frame.borrow_mut();

                if frame.values.contains_key(name) {
                    frame.values.insert(name.to_string(), value);

                    true
                } else {
                    false
                }
            }

            None => false,
        }
    }
}
