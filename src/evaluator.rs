//! Evaluator for req - walks parsed statements against a context

use crate::ast::{Expression, Literal, Statement};
use crate::commands::CommandRegistry;
use crate::compare::compare;
use crate::config::EvalConfig;
use crate::context::Context;
use crate::error::EvalError;
use crate::interpolate::interpolate;
use crate::select::select;
use crate::value::Value;
use indexmap::IndexMap;

/// Evaluator holding the command registry and configuration
///
/// Evaluation is synchronous: each statement, including any command it calls,
/// runs to completion before the next one starts.
#[derive(Debug)]
pub struct Evaluator {
    commands: CommandRegistry,
    config: EvalConfig,
}

impl Evaluator {
    /// Create a new evaluator with the built-in commands registered
    pub fn new() -> Self {
        Self::with_config(EvalConfig::default())
    }

    pub fn with_config(config: EvalConfig) -> Self {
        Self {
            commands: CommandRegistry::with_builtins(),
            config,
        }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Register a command under `name`, replacing any existing one
    pub fn add_cmd<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + 'static,
    {
        self.commands.register(name, handler);
    }

    pub fn has_cmd(&self, name: &str) -> bool {
        self.commands.has_command(name)
    }

    /// Run statements in a fresh context, returning the final bindings
    pub fn run(&self, statements: &[Statement]) -> Result<Context, EvalError> {
        let mut ctx = Context::new();
        self.run_with(&mut ctx, statements)?;
        Ok(ctx)
    }

    /// Run statements in order against `ctx`, stopping at the first error
    ///
    /// Bindings made by statements before the failing one stay in `ctx`.
    pub fn run_with(&self, ctx: &mut Context, statements: &[Statement]) -> Result<(), EvalError> {
        for statement in statements {
            self.eval(ctx, statement)?;
        }
        Ok(())
    }

    /// Evaluate a single statement
    pub fn eval(&self, ctx: &mut Context, statement: &Statement) -> Result<Value, EvalError> {
        tracing::debug!(
            line = statement.span().map(|s| s.line),
            "evaluating statement"
        );

        let result = match statement {
            Statement::VarDecl { name, value, .. } => {
                self.eval_expression(ctx, value).map(|value| {
                    ctx.declare(name.clone(), value.clone());
                    value
                })
            }
            Statement::Expr { expr, .. } => self.eval_expression(ctx, expr),
        };

        result.map_err(|err| err.at(statement.span()))
    }

    /// Evaluate an expression
    pub fn eval_expression(&self, ctx: &Context, expr: &Expression) -> Result<Value, EvalError> {
        self.evaluate(ctx, expr).map_err(|err| err.at(expr.span()))
    }

    fn evaluate(&self, ctx: &Context, expr: &Expression) -> Result<Value, EvalError> {
        match expr {
            Expression::Literal { value, .. } => match value {
                Literal::Nil => Ok(Value::Nil),
                Literal::String(s) => interpolate(ctx, s),
                Literal::Int(i) => Ok(Value::Int(*i)),
                Literal::Bool(b) => Ok(Value::Bool(*b)),
            },

            Expression::Array { items, .. } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expression(ctx, item)?);
                }
                Ok(Value::Array(values))
            }

            Expression::Hash { pairs, .. } => {
                let mut map = IndexMap::with_capacity(pairs.len());
                for (key, value_expr) in pairs {
                    let value = self.eval_expression(ctx, value_expr)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::Hash(map))
            }

            Expression::Ref { name, .. } => ctx.get(name).cloned(),

            Expression::Index { object, index, .. } => {
                let container = self.eval_expression(ctx, object)?;
                let key = self.eval_expression(ctx, index)?;
                select(&container, &key)
            }

            Expression::Field { object, name, .. } => {
                let container = self.eval_expression(ctx, object)?;
                select(&container, &Value::name(name.as_str()))
            }

            Expression::Call { name, args, .. } => self.call_command(ctx, name, args),

            Expression::Compare {
                op, left, right, ..
            } => {
                let left_val = self.eval_expression(ctx, left)?;
                let right_val = self.eval_expression(ctx, right)?;
                compare(*op, &left_val, &right_val)
            }

            Expression::Tuple { first, second, .. } => {
                let first = self.eval_expression(ctx, first)?;
                let second = self.eval_expression(ctx, second)?;
                Ok(Value::tuple(first, second))
            }
        }
    }

    fn call_command(
        &self,
        ctx: &Context,
        name: &str,
        args: &[Expression],
    ) -> Result<Value, EvalError> {
        let command = self
            .commands
            .get(name)
            .ok_or_else(|| EvalError::UnknownCommand(name.to_string()))?;

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expression(ctx, arg)?);
        }

        tracing::debug!(command = name, args = values.len(), "dispatching command");

        command(values.as_slice()).map_err(|source| EvalError::Command {
            name: name.to_string(),
            source,
        })
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
