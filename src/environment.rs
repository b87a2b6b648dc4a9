//! Runtime scope frames.
//!
//! An [`Environment`] is one frame of the lexical scope chain: a bindings map
//! plus an optional parent link fixed at creation. Frames are shared through
//! `Rc<RefCell<_>>` because a closure captures the frame that was active at
//! its declaration and must keep it alive after the declaring block exits.
//!
//! Two access paths exist and they fail differently:
//!
//! - [`Environment::get`] / [`Environment::assign`] walk the chain by name
//!   and surface "Undefined variable" as an ordinary runtime error. This is
//!   the path for references the resolver could not bind to a local scope.
//! - [`Environment::get_at`] / [`Environment::assign_at`] jump exactly
//!   `distance` parent links and expect the name to be present in that frame.
//!   A miss there means the resolver and interpreter disagree about scope
//!   shape, which is a crate bug, so these panic instead of erroring.

use crate::error::{Result, VeeryError};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// A root frame with no parent (the globals frame).
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// A child frame chained to `enclosing`.
    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Insert or overwrite a binding in this frame. Redefinition is permitted
    /// and last-write-wins, mirroring the resolver's redeclaration rule.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look up `name` in this frame, then outward through the chain.
    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(VeeryError::runtime(
                line,
                format!("Undefined variable '{name}'."),
            ))
        }
    }

    /// Assign to an existing binding in this frame or the nearest enclosing
    /// frame that has one.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(VeeryError::runtime(
                line,
                format!("Undefined variable '{name}'."),
            ))
        }
    }

    /// Read `name` from the frame exactly `distance` links above `env`.
    pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Value {
        Self::ancestor(env, distance)
            .borrow()
            .values
            .get(name)
            .cloned()
            .unwrap_or_else(|| {
                panic!("resolved variable '{name}' missing at distance {distance}")
            })
    }

    /// Write `name` in the frame exactly `distance` links above `env`.
    pub fn assign_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &str, value: Value) {
        let frame: Rc<RefCell<Environment>> = Self::ancestor(env, distance);
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(name) {
            Some(slot) => *slot = value,
            None => panic!("resolved variable '{name}' missing at distance {distance}"),
        }
    }

    /// Follow `distance` enclosing links starting from `env`.
    fn ancestor(env: &Rc<RefCell<Environment>>, distance: usize) -> Rc<RefCell<Environment>> {
        let mut current: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..distance {
            let parent: Rc<RefCell<Environment>> = current
                .borrow()
                .enclosing
                .clone()
                .expect("scope chain shorter than resolved distance");

            current = parent;
        }

        current
    }
}
