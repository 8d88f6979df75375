use std::io::Write;

use tracing::debug;

use crate::{
    environment::Environment,
    error::Result,
    interpreter::{Completion, Interpreter},
    value::{Function, NativeFn, Value},
};

pub(crate) trait Callable<W: Write> {
    fn arity(&self) -> usize;
    fn call(&self, interpreter: &mut Interpreter<W>, args: Vec<Value>) -> Result<Value>;
}

impl Value {
    pub(crate) fn callable<W: Write>(&self) -> Option<&dyn Callable<W>> {
        match self {
            Value::Function(ref f) => Some(f),
            Value::NativeFn(ref n) => Some(n),
            _ => None,
        }
    }
}

impl <W: Write> Callable<W> for NativeFn {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter<W>, args: Vec<Value>) -> Result<Value> {
        Ok((self.body)(&args))
    }
}

impl <W: Write> Callable<W> for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter<W>, args: Vec<Value>) -> Result<Value> {
        debug!(function = %self.declaration.name.lexeme, args = args.len(), "calling");

        let mut environment = Environment::enclosed_by(&self.closure);
        for (param, arg) in self.declaration.params.iter().zip(args) {
            environment.define(param.lexeme.as_str(), arg);
        }

        Ok(match interpreter.execute_block(&self.declaration.body, environment)? {
            Completion::Returned(value) => value,
            Completion::Normal => Value::Nil,
        })
    }
}
