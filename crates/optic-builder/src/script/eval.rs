//! Evaluate a parsed script by driving the builder

use super::ast::{Args, Expr, Script, Statement};
use super::ScriptError;
use crate::{op, PlanError, PlanExt};
use optic_ir::{Value, ValueMap};
use optic_registry::{CallArgs, FunctionCatalog, FunctionKind};
use std::collections::HashMap;

/// Holds `let` bindings across statements
#[derive(Debug, Default)]
pub struct Evaluator {
    bindings: HashMap<String, Value>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binding(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Run every statement; the last bare expression is the result.
    pub fn run(&mut self, script: &Script) -> Result<Value, ScriptError> {
        let mut result = None;
        for statement in &script.statements {
            match statement {
                Statement::Let { name, expr } => {
                    let value = self.eval(expr)?;
                    tracing::trace!(name = %name, kind = %value.kind_name(), "bound");
                    self.bindings.insert(name.clone(), value);
                }
                Statement::Expr(expr) => result = Some(self.eval(expr)?),
            }
        }
        tracing::debug!(statements = script.statements.len(), "evaluated script");
        result.ok_or(ScriptError::NoResult)
    }

    fn eval(&self, expr: &Expr) -> Result<Value, ScriptError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Ident(name) => self
                .bindings
                .get(name)
                .cloned()
                .ok_or_else(|| ScriptError::Unbound(name.clone())),
            Expr::Array(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Expr::Object(entries) => {
                let mut map = ValueMap::new();
                for (key, item) in entries {
                    map.insert(key.clone(), self.eval(item)?);
                }
                Ok(Value::Map(map))
            }
            Expr::Call {
                target,
                method,
                args,
            } => {
                // an unbound identifier before the dot names a function namespace
                if let Expr::Ident(namespace) = target.as_ref() {
                    if !self.bindings.contains_key(namespace) {
                        return self.call_function(namespace, method, args);
                    }
                }
                let receiver = self.eval(target)?;
                self.call_method(receiver, method, args)
            }
        }
    }

    fn call_function(&self, namespace: &str, name: &str, args: &Args) -> Result<Value, ScriptError> {
        let args = self.eval_args(args)?;
        let decl = FunctionCatalog::global()
            .lookup(namespace, name)
            .map_err(PlanError::from)?;
        let value = match decl.kind {
            FunctionKind::Source => Value::Plan(op::source(name, args)?),
            _ => Value::Node(op::call(namespace, name, args)?),
        };
        Ok(value)
    }

    fn call_method(&self, receiver: Value, method: &str, args: &Args) -> Result<Value, ScriptError> {
        let plan = match receiver {
            Value::Plan(plan) => plan,
            other => {
                return Err(ScriptError::NotAPlan {
                    method: method.to_string(),
                    found: other.kind_name(),
                })
            }
        };

        let args = self.eval_args(args)?;
        if method == "col" {
            return match args {
                CallArgs::Single(Value::String(column)) => Ok(Value::Node(plan.col(&column)?)),
                other => Err(ScriptError::ColumnName(describe(&other))),
            };
        }
        Ok(Value::Plan(plan.apply(method, args)?))
    }

    /// One positional argument is passed as a bare value so the normalizer
    /// can read a lone object as named options.
    fn eval_args(&self, args: &Args) -> Result<CallArgs, ScriptError> {
        Ok(match args {
            Args::Positional(exprs) => {
                let mut values = exprs
                    .iter()
                    .map(|expr| self.eval(expr))
                    .collect::<Result<Vec<_>, _>>()?;
                match values.pop() {
                    Some(value) if values.is_empty() => CallArgs::Single(value),
                    Some(value) => {
                        values.push(value);
                        CallArgs::Positional(values)
                    }
                    None => CallArgs::none(),
                }
            }
            Args::Named(entries) => {
                let mut named = ValueMap::new();
                for (key, expr) in entries {
                    named.insert(key.clone(), self.eval(expr)?);
                }
                CallArgs::Named(named)
            }
        })
    }
}

fn describe(args: &CallArgs) -> String {
    match args {
        CallArgs::Single(value) => value.kind_name(),
        CallArgs::Positional(values) => format!("{} arguments", values.len()),
        CallArgs::Named(_) => "named arguments".to_string(),
    }
}
