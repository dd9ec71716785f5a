use crate::language::ast::*;
use crate::runtime::{
    builtins,
    error::{RuntimeErrorKind, RuntimeResult},
};
use crate::stack::ensure_sufficient_stack;
use std::collections::HashSet;

/// Rejects references to names that are never introduced anywhere before
/// the point of use.
///
/// Scoping is deliberately flat: a `var` inside one block satisfies later
/// references anywhere in the program. Anything this lets through is
/// caught again during evaluation.
pub fn analyze(unit: &Unit) -> RuntimeResult<()> {
    let mut analyzer = Analyzer {
        defined: builtins::names().map(str::to_string).collect(),
    };
    for item in &unit.items {
        match item {
            TopLevel::Function(def) => analyzer.function(def)?,
            TopLevel::Stmt(stmt) => analyzer.stmt(stmt)?,
        }
    }
    tracing::debug!(names = analyzer.defined.len(), "analysis complete");
    Ok(())
}

struct Analyzer {
    defined: HashSet<String>,
}

impl Analyzer {
    fn function(&mut self, def: &FunctionDef) -> RuntimeResult<()> {
        self.defined.insert(def.name.name.clone());
        for param in &def.params {
            self.defined.insert(param.name.clone());
        }
        self.block(&def.body)
    }

    fn block(&mut self, block: &Block) -> RuntimeResult<()> {
        block.stmts.iter().try_for_each(|stmt| self.stmt(stmt))
    }

    fn stmt(&mut self, stmt: &Stmt) -> RuntimeResult<()> {
        match stmt {
            Stmt::VarDef { name, .. } => {
                self.defined.insert(name.name.clone());
                Ok(())
            }
            Stmt::If {
                cond,
                then_block,
                else_block,
                ..
            } => {
                self.expr(cond)?;
                self.block(then_block)?;
                match else_block {
                    Some(block) => self.block(block),
                    None => Ok(()),
                }
            }
            Stmt::While { cond, body, .. } => {
                self.expr(cond)?;
                self.block(body)
            }
            Stmt::Expr(expr) => self.expr(expr),
        }
    }

    fn expr(&mut self, expr: &Expr) -> RuntimeResult<()> {
        ensure_sufficient_stack(|| self.expr_inner(expr))
    }

    fn expr_inner(&mut self, expr: &Expr) -> RuntimeResult<()> {
        match expr {
            Expr::IntLiteral { .. } | Expr::StringLiteral { .. } => Ok(()),
            Expr::VarRef(ident) => self.require(ident),
            Expr::Assign { target, value, .. } => {
                self.require(target)?;
                self.expr(value)
            }
            Expr::Binary { left, right, .. } => {
                self.expr(left)?;
                self.expr(right)
            }
            Expr::Call { callee, args, .. } => {
                self.require(callee)?;
                args.iter().try_for_each(|arg| self.expr(arg))
            }
        }
    }

    fn require(&self, ident: &Identifier) -> RuntimeResult<()> {
        if self.defined.contains(&ident.name) {
            Ok(())
        } else {
            Err(RuntimeErrorKind::UndefinedName {
                name: ident.name.clone(),
            }
            .at(&ident.location))
        }
    }
}
