use crate::config::RunConfig;
use crate::language::{ast::*, span::Location};
use crate::runtime::{
    analyze, builtins,
    environment::{Environment, ScopeId},
    error::{RuntimeError, RuntimeErrorKind, RuntimeResult},
    value::{FunctionRep, Value},
};
use crate::stack::ensure_sufficient_stack;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

/// Tree-walking evaluator for a parsed [`Unit`].
///
/// Output produced by `print`/`println` goes to the configured sink and is
/// flushed when a run finishes, whether or not it failed.
pub struct Interpreter {
    unit: Rc<Unit>,
    env: Environment,
    config: RunConfig,
    output: Box<dyn Write>,
    input: Box<dyn BufRead>,
    call_depth: usize,
}

impl Interpreter {
    pub fn new(unit: Unit) -> Self {
        Self {
            unit: Rc::new(unit),
            env: Environment::new(),
            config: RunConfig::default(),
            output: Box::new(io::stdout()),
            input: Box::new(io::BufReader::new(io::stdin())),
            call_depth: 0,
        }
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    pub fn with_input(mut self, input: impl BufRead + 'static) -> Self {
        self.input = Box::new(input);
        self
    }

    #[cfg(test)]
    pub(crate) fn scope_depth(&self) -> usize {
        self.env.depth()
    }

    #[cfg(test)]
    pub(crate) fn global(&self, name: &str) -> Option<Value> {
        self.env.lookup(self.env.global(), name)
    }

    pub fn analyze(&self) -> RuntimeResult<()> {
        analyze::analyze(&self.unit)
    }

    /// Analyzes (unless disabled) and then executes.
    pub fn run(&mut self) -> RuntimeResult<Value> {
        if self.config.analyze {
            self.analyze()?;
        }
        self.execute()
    }

    /// Evaluates the top-level items in order against a fresh global scope.
    /// The result is the value of the last item, or 0 for an empty unit.
    pub fn execute(&mut self) -> RuntimeResult<Value> {
        self.env = Environment::new();
        self.call_depth = 0;
        let global = self.env.global();
        for intrinsic in builtins::INTRINSICS.iter() {
            self.env.bind(global, intrinsic.name, Value::Intrinsic(intrinsic));
        }

        let unit = Rc::clone(&self.unit);
        let result = self.run_items(&unit, global);
        let flushed = self.output.flush();
        let value = result?;
        flushed.map_err(|err| output_error(err, &Location::synthetic()))?;
        Ok(value)
    }

    fn run_items(&mut self, unit: &Unit, scope: ScopeId) -> RuntimeResult<Value> {
        let mut last = Value::Int(0);
        for item in &unit.items {
            last = match item {
                TopLevel::Function(def) => self.define_function(def, scope),
                TopLevel::Stmt(stmt) => self.exec_stmt(stmt, scope)?,
            };
        }
        Ok(last)
    }

    fn define_function(&mut self, def: &Rc<FunctionDef>, scope: ScopeId) -> Value {
        tracing::debug!(function = %def.name.name, at = %def.location, "define function");
        self.env
            .bind(scope, &def.name.name, Value::function(Rc::clone(def), scope));
        Value::Int(0)
    }

    /// Runs `f` in a new child of `parent`. The scope is released on every
    /// exit path before the result is handed back.
    fn with_scope<T>(
        &mut self,
        parent: ScopeId,
        f: impl FnOnce(&mut Self, ScopeId) -> RuntimeResult<T>,
    ) -> RuntimeResult<T> {
        let scope = self.env.push_scope(parent);
        let result = f(self, scope);
        self.env.pop_scope(scope);
        result
    }

    fn exec_block(&mut self, block: &Block, scope: ScopeId) -> RuntimeResult<Value> {
        let mut last = Value::Int(0);
        for stmt in &block.stmts {
            last = self.exec_stmt(stmt, scope)?;
        }
        Ok(last)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, scope: ScopeId) -> RuntimeResult<Value> {
        match stmt {
            Stmt::VarDef { name, location } => {
                self.env
                    .define(scope, &name.name, Value::Int(0))
                    .map_err(|kind| kind.at(location))?;
                Ok(Value::Int(0))
            }
            Stmt::If {
                cond,
                then_block,
                else_block,
                ..
            } => {
                if self.eval_condition(cond, scope)? {
                    self.with_scope(scope, |this, inner| this.exec_block(then_block, inner))?;
                } else if let Some(block) = else_block {
                    self.with_scope(scope, |this, inner| this.exec_block(block, inner))?;
                }
                Ok(Value::Int(0))
            }
            Stmt::While { cond, body, .. } => {
                while self.with_scope(scope, |this, inner| this.eval_condition(cond, inner))? {
                    self.with_scope(scope, |this, inner| this.exec_block(body, inner))?;
                }
                Ok(Value::Int(0))
            }
            Stmt::Expr(expr) => self.eval_expr(expr, scope),
        }
    }

    fn eval_condition(&mut self, cond: &Expr, scope: ScopeId) -> RuntimeResult<bool> {
        match self.eval_expr(cond, scope)? {
            Value::Int(value) => Ok(value != 0),
            other => Err(RuntimeErrorKind::NonNumericCondition {
                found: other.kind(),
            }
            .at(cond.location())),
        }
    }

    fn eval_expr(&mut self, expr: &Expr, scope: ScopeId) -> RuntimeResult<Value> {
        ensure_sufficient_stack(|| self.eval_expr_inner(expr, scope))
    }

    fn eval_expr_inner(&mut self, expr: &Expr, scope: ScopeId) -> RuntimeResult<Value> {
        match expr {
            Expr::IntLiteral { text, location } => text
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| RuntimeErrorKind::IntegerLiteral { text: text.clone() }.at(location)),
            Expr::StringLiteral { value, .. } => Ok(Value::string(value.as_str())),
            Expr::VarRef(ident) => self.lookup(ident, scope),
            Expr::Assign { target, value, .. } => {
                let value = self.eval_expr(value, scope)?;
                self.env
                    .assign(scope, &target.name, value.clone())
                    .map_err(|kind| kind.at(&target.location))?;
                Ok(value)
            }
            Expr::Binary {
                op,
                left,
                right,
                location,
            } => self.eval_binary(*op, left, right, location, scope),
            Expr::Call {
                callee,
                args,
                location,
            } => self.eval_call(callee, args, location, scope),
        }
    }

    fn lookup(&self, ident: &Identifier, scope: ScopeId) -> RuntimeResult<Value> {
        self.env.lookup(scope, &ident.name).ok_or_else(|| {
            RuntimeErrorKind::UndefinedName {
                name: ident.name.clone(),
            }
            .at(&ident.location)
        })
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        location: &Location,
        scope: ScopeId,
    ) -> RuntimeResult<Value> {
        let lhs = self.eval_operand(op, left, location, scope)?;
        // The right operand of a logical operator runs only when it can
        // change the outcome.
        match op {
            BinaryOp::And if lhs == 0 => return Ok(Value::Int(0)),
            BinaryOp::Or if lhs != 0 => return Ok(Value::Int(1)),
            _ => {}
        }
        let rhs = self.eval_operand(op, right, location, scope)?;
        let result = match op {
            BinaryOp::Add => lhs.wrapping_add(rhs),
            BinaryOp::Sub => lhs.wrapping_sub(rhs),
            BinaryOp::Mul => lhs.wrapping_mul(rhs),
            BinaryOp::Div => {
                if rhs == 0 {
                    return Err(RuntimeErrorKind::DivisionByZero.at(location));
                }
                lhs.wrapping_div(rhs)
            }
            BinaryOp::Lt => i64::from(lhs < rhs),
            BinaryOp::LtEq => i64::from(lhs <= rhs),
            BinaryOp::Gt => i64::from(lhs > rhs),
            BinaryOp::GtEq => i64::from(lhs >= rhs),
            BinaryOp::Eq => i64::from(lhs == rhs),
            BinaryOp::NotEq => i64::from(lhs != rhs),
            BinaryOp::And | BinaryOp::Or => i64::from(rhs != 0),
        };
        Ok(Value::Int(result))
    }

    fn eval_operand(
        &mut self,
        op: BinaryOp,
        operand: &Expr,
        location: &Location,
        scope: ScopeId,
    ) -> RuntimeResult<i64> {
        match self.eval_expr(operand, scope)? {
            Value::Int(value) => Ok(value),
            other => Err(RuntimeErrorKind::NonNumericOperand {
                op: op.symbol(),
                found: other.kind(),
            }
            .at(location)),
        }
    }

    fn eval_args(&mut self, args: &[Expr], scope: ScopeId) -> RuntimeResult<Vec<Value>> {
        args.iter().map(|arg| self.eval_expr(arg, scope)).collect()
    }

    fn eval_call(
        &mut self,
        callee: &Identifier,
        args: &[Expr],
        location: &Location,
        scope: ScopeId,
    ) -> RuntimeResult<Value> {
        match self.lookup(callee, scope)? {
            Value::Function(rep) => self.call_function(&rep, args, location, scope),
            Value::Intrinsic(intrinsic) => {
                let values = self.eval_args(args, scope)?;
                intrinsic.invoke(self, &values, location)
            }
            other => Err(RuntimeErrorKind::NotCallable {
                name: callee.name.clone(),
                kind: other.kind(),
            }
            .at(location)),
        }
    }

    /// Arguments are evaluated in the caller's scope, then bound in a frame
    /// whose parent is the function's closure. The body gets a scope of its
    /// own beneath that frame.
    #[tracing::instrument(level = "debug", skip_all, fields(function = %rep.name()))]
    fn call_function(
        &mut self,
        rep: &Rc<FunctionRep>,
        args: &[Expr],
        location: &Location,
        scope: ScopeId,
    ) -> RuntimeResult<Value> {
        if args.len() != rep.arity() {
            return Err(RuntimeErrorKind::ArityMismatch {
                name: rep.name().to_string(),
                expected: rep.arity(),
                received: args.len(),
            }
            .at(location));
        }
        let values = self.eval_args(args, scope)?;
        if self.call_depth >= self.config.max_call_depth {
            return Err(RuntimeErrorKind::CallDepthExceeded {
                limit: self.config.max_call_depth,
            }
            .at(location));
        }

        self.call_depth += 1;
        let result = self.with_scope(rep.closure(), |this, frame| {
            for (param, value) in rep.params().iter().zip(values) {
                this.env.bind(frame, &param.name, value);
            }
            ensure_sufficient_stack(|| {
                this.with_scope(frame, |this, body| this.exec_block(rep.body(), body))
            })
        });
        self.call_depth -= 1;
        result
    }

    pub(crate) fn write_output(&mut self, text: &str, location: &Location) -> RuntimeResult<()> {
        self.output
            .write_all(text.as_bytes())
            .map_err(|err| output_error(err, location))
    }

    /// Reads the next whitespace-delimited token from the input source and
    /// parses it as a signed integer.
    pub(crate) fn read_int(&mut self, location: &Location) -> RuntimeResult<i64> {
        self.output
            .flush()
            .map_err(|err| output_error(err, location))?;

        let mut token = String::new();
        loop {
            let buf = self.input.fill_buf().map_err(|err| {
                RuntimeErrorKind::Input {
                    message: err.to_string(),
                }
                .at(location)
            })?;
            if buf.is_empty() {
                break;
            }
            let mut consumed = 0;
            let mut complete = false;
            for &byte in buf {
                if byte.is_ascii_whitespace() {
                    if !token.is_empty() {
                        complete = true;
                        break;
                    }
                } else {
                    token.push(char::from(byte));
                }
                consumed += 1;
            }
            self.input.consume(consumed);
            if complete {
                break;
            }
        }

        if token.is_empty() {
            return Err(RuntimeErrorKind::Input {
                message: "unexpected end of input".to_string(),
            }
            .at(location));
        }
        token.parse::<i64>().map_err(|_| {
            RuntimeErrorKind::Input {
                message: format!("'{token}' is not an integer"),
            }
            .at(location)
        })
    }
}

fn output_error(err: io::Error, location: &Location) -> RuntimeError {
    RuntimeErrorKind::Output {
        message: err.to_string(),
    }
    .at(location)
}
