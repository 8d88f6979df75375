use std::{
    cell::RefCell,
    io::Write,
    mem,
    rc::Rc,
    time::{SystemTime, UNIX_EPOCH},
};

use tracing::debug;

use crate::{
    environment::Environment,
    error::{Error, Result, RuntimeError},
    expr::{self, Expr},
    stmt::Stmt,
    token::{Token, TokenKind},
    value::Value,
};

/// How a statement finished: fell through, or hit a `return`.
#[derive(Debug, PartialEq)]
pub(crate) enum Completion {
    Normal,
    Returned(Value),
}

pub struct Interpreter<W> {
    environment: Rc<RefCell<Environment>>,
    writer: W,
}

impl <W: Write> Interpreter<W> {
    pub fn new(writer: W) -> Self {
        let mut globals = Environment::new();
        globals.define("clock", Value::new_native_fn("clock", 0, |_| {
            let seconds = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0);
            Value::from(seconds)
        }));
        Interpreter {
            environment: Rc::new(RefCell::new(globals)),
            writer,
        }
    }

    /// Executes the statements in order, stopping at the first runtime error.
    /// Bindings made here persist across calls.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        for s in statements.iter() {
            match self.execute(s) {
                Ok(Completion::Normal) => {},
                Ok(Completion::Returned(_)) => {
                    return Err(Error::internal("'return' escaped every function call."))
                },
                Err(e) => {
                    debug!(error = %e, "execution halted");
                    return Err(e)
                },
            }
        }
        Ok(())
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn execute(&mut self, s: &Stmt) -> Result<Completion> {
        match s {
            Stmt::Block(b) => {
                let environment = Environment::enclosed_by(&self.environment);
                self.execute_block(&b.statements, environment)
            },
            Stmt::Expression(e) => {
                self.evaluate(&e.expression)?;
                Ok(Completion::Normal)
            },
            Stmt::Function(f) => {
                let function = Value::new_function(f.clone(), Rc::clone(&self.environment));
                self.environment.borrow_mut().define(f.name.lexeme.as_str(), function);
                Ok(Completion::Normal)
            },
            Stmt::If(i) => {
                if self.evaluate_condition(&i.keyword, &i.condition)? {
                    self.execute(&i.then_branch)
                } else if let Some(else_branch) = &i.else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Completion::Normal)
                }
            },
            Stmt::Print(p) => {
                let value = self.evaluate(&p.expression)?;
                writeln!(self.writer, "{}", value)?;
                Ok(Completion::Normal)
            },
            Stmt::Return(r) => {
                let value = match &r.value {
                    Some(value) => self.evaluate(value)?,
                    None => Value::Nil,
                };
                Ok(Completion::Returned(value))
            },
            Stmt::Var(v) => {
                let value = match &v.initializer {
                    Some(initializer) => self.evaluate(initializer)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().define(v.name.lexeme.as_str(), value);
                Ok(Completion::Normal)
            },
            Stmt::While(w) => {
                while self.evaluate_condition(&w.keyword, &w.condition)? {
                    if let returned @ Completion::Returned(_) = self.execute(&w.body)? {
                        return Ok(returned)
                    }
                }
                Ok(Completion::Normal)
            },
        }
    }

    /// Runs `statements` in `environment`, then puts the previous environment
    /// back whether or not they succeeded.
    pub(crate) fn execute_block(&mut self, statements: &[Stmt], environment: Environment) -> Result<Completion> {
        let previous = mem::replace(&mut self.environment, Rc::new(RefCell::new(environment)));
        let result = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Completion> {
        for statement in statements {
            if let returned @ Completion::Returned(_) = self.execute(statement)? {
                return Ok(returned)
            }
        }
        Ok(Completion::Normal)
    }

    fn evaluate_condition(&mut self, keyword: &Token, condition: &Expr) -> Result<bool> {
        match self.evaluate(condition)? {
            Value::Bool(b) => Ok(b),
            other => Err(Error::runtime(
                RuntimeError::TypeError,
                keyword.clone(),
                format!("Condition must be a boolean, got {}.", other.type_name())
            )),
        }
    }

    fn evaluate(&mut self, e: &Expr) -> Result<Value> {
        match e {
            Expr::Assign(a) => {
                let value = self.evaluate(&a.value)?;
                if let Some(name) = &a.name {
                    self.environment.borrow_mut().assign(name, value.clone())?;
                }
                Ok(value)
            },
            Expr::Binary(b) => self.binary(b),
            Expr::Call(c) => self.call(c),
            Expr::Grouping(g) => self.evaluate(&g.expression),
            Expr::Literal(l) => Ok(Value::from(l.value.clone())),
            Expr::Logical(l) => self.logical(l),
            Expr::Unary(u) => self.unary(u),
            Expr::Variable(v) => self.environment.borrow().get(&v.name),
        }
    }

    fn binary(&mut self, e: &expr::Binary) -> Result<Value> {
        let left = self.evaluate(e.left.as_ref())?;
        let right = self.evaluate(e.right.as_ref())?;

        use Value::{Bool, Number, String};
        match e.op.kind {
            TokenKind::Minus => compute_if_numbers(&e.op, left, right, |l, r| l - r),
            TokenKind::Plus => match (left, right) {
                (Number(left), Number(right)) => Ok(Number(left + right)),
                (String(mut left), String(right)) => {
                    left.push_str(right.as_str());
                    Ok(String(left))
                },
                _ => Err(Error::runtime(
                    RuntimeError::TypeError,
                    e.op.clone(),
                    "Operands must be two numbers or two strings."
                )),
            },
            TokenKind::Slash => compute_if_numbers(&e.op, left, right, |l, r| l / r),
            TokenKind::Star => compute_if_numbers(&e.op, left, right, |l, r| l * r),
            TokenKind::Greater => compute_if_numbers(&e.op, left, right, |l, r| l > r),
            TokenKind::GreaterEqual => compute_if_numbers(&e.op, left, right, |l, r| l >= r),
            TokenKind::Less => compute_if_numbers(&e.op, left, right, |l, r| l < r),
            TokenKind::LessEqual => compute_if_numbers(&e.op, left, right, |l, r| l <= r),
            TokenKind::EqualEqual => Ok(Bool(left.is_equal(&right))),
            TokenKind::BangEqual => Ok(Bool(!left.is_equal(&right))),
            _ => Err(Error::internal(format!("'{}' is not a binary operator.", e.op.lexeme))),
        }
    }

    fn call(&mut self, e: &expr::Call) -> Result<Value> {
        let callee = self.evaluate(&e.callee)?;

        let args: Vec<Value> = e.arguments.iter()
            .map(|a| self.evaluate(a))
            .collect::<Result<_>>()?;

        let callable = callee.callable::<W>().ok_or_else(|| Error::runtime(
            RuntimeError::UncallableValue,
            e.paren.clone(),
            "Can only call functions."
        ))?;

        if args.len() != callable.arity() {
            return Err(Error::runtime(
                RuntimeError::ArityMismatch,
                e.paren.clone(),
                format!("Expected {} arguments but got {}.", callable.arity(), args.len())
            ))
        }

        callable.call(self, args)
    }

    fn logical(&mut self, e: &expr::Logical) -> Result<Value> {
        let left = self.evaluate(&e.left)?;
        let left = require_bool(&e.op, left)?;

        use TokenKind::*;
        match (&e.op.kind, left) {
            (Or, true) | (And, false) => Ok(Value::Bool(left)),
            (Or, false) | (And, true) => {
                let right = self.evaluate(&e.right)?;
                Ok(Value::Bool(require_bool(&e.op, right)?))
            },
            _ => Err(Error::internal(format!("'{}' is not a logical operator.", e.op.lexeme))),
        }
    }

    fn unary(&mut self, e: &expr::Unary) -> Result<Value> {
        let right = self.evaluate(e.right.as_ref())?;
        let op = match &e.op {
            Some(op) => op,
            None => return Ok(right),
        };

        match (&op.kind, right) {
            (TokenKind::Minus, Value::Number(n)) => Ok(Value::Number(-n)),
            (TokenKind::Minus, _) => Err(Error::runtime(
                RuntimeError::TypeError,
                op.clone(),
                "Operand must be a number."
            )),
            (TokenKind::Bang, right) => Ok(Value::Bool(!require_bool(op, right)?)),
            _ => Err(Error::internal(format!("'{}' is not a unary operator.", op.lexeme))),
        }
    }
}

fn require_bool(op: &Token, value: Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(Error::runtime(
            RuntimeError::TypeError,
            op.clone(),
            format!("Operand must be a boolean, got {}.", other.type_name())
        )),
    }
}

fn compute_if_numbers<T: Into<Value>>(
    op: &Token,
    left: Value,
    right: Value,
    f: impl Fn(f64, f64) -> T
) -> Result<Value> {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => Ok(f(left, right).into()),
        _ => Err(Error::runtime(RuntimeError::TypeError, op.clone(), "Operands must be numbers.")),
    }
}
