use std::{
    cell::RefCell,
    collections::HashMap,
    rc::Rc,
};

use crate::{
    error::{Error, Result, RuntimeError},
    token::Token,
    value::Value,
};

/// One lexical scope. Lookups and assignments that miss here continue in
/// `enclosing`; definitions always land in this scope.
#[derive(Debug, Default)]
pub(crate) struct Environment {
    enclosing: Option<Rc<RefCell<Environment>>>,
    values: HashMap<String, Value>,
}

impl Environment {
    pub(crate) fn new() -> Self {
        Self { enclosing: None, values: HashMap::new() }
    }

    pub(crate) fn enclosed_by(e: &Rc<RefCell<Environment>>) -> Self {
        Self { enclosing: Some(Rc::clone(e)), values: HashMap::new() }
    }

    pub(crate) fn get(&self, name: &Token) -> Result<Value> {
        self.values.get(&name.lexeme)
            .map(|v| Ok(v.clone()))
            .unwrap_or_else(|| {
                self.enclosing.as_ref()
                    .map(|e| e.borrow().get(name))
                    .unwrap_or_else(|| Err(undefined_var_error(name)))
            })
    }

    pub(crate) fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        match self.values.get_mut(&name.lexeme) {
            Some(v) => {
                *v = value;
                Ok(())
            }
            None => self.enclosing.as_ref()
                .map(|e| e.borrow_mut().assign(name, value))
                .unwrap_or_else(|| Err(undefined_var_error(name))),
        }
    }

    pub(crate) fn define<S: Into<String>>(&mut self, name: S, value: Value) {
        self.values.insert(name.into(), value);
    }
}

fn undefined_var_error(name: &Token) -> Error {
    Error::runtime(
        RuntimeError::UndefinedVariable,
        name.clone(),
        format!("Undefined variable '{}'.", name.lexeme)
    )
}
