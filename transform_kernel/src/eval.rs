//! Rule-script evaluator — tree-walking, step-budgeted, no host access.
//!
//! The binding table is the only mutable surface a script can reach:
//! every name resolves to a shared `TrackedProxy` or an invocation-local
//! variable. There is no filesystem, network, clock, or process surface
//! by construction.
//!
//! Every fault is an `Err` value. The evaluator never panics on script
//! input.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::ast::{BinaryOp, Expr, Stmt, Target, UnaryOp};
use crate::error::ScriptError;
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::proxy::TrackedProxy;
use crate::value::FieldValue;

/// Safety limits for one script execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvalLimits {
    /// Hard bound on statement/expression evaluations.
    pub max_steps: u64,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self { max_steps: 100_000 }
    }
}

/// The variable-binding table handed to one script execution.
///
/// Proxies are shared handles so that secondary names (`dev`/`device`)
/// observe the same instance. One invocation is single-threaded.
#[derive(Default)]
pub struct Namespace {
    bindings: BTreeMap<String, Rc<RefCell<TrackedProxy>>>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: &str, proxy: Rc<RefCell<TrackedProxy>>) {
        self.bindings.insert(name.to_string(), proxy);
    }

    pub fn get(&self, name: &str) -> Option<&Rc<RefCell<TrackedProxy>>> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

/// Tokenize, parse, and execute one script against a namespace.
pub fn run_script(
    source: &str,
    ns: &Namespace,
    limits: &EvalLimits,
) -> Result<(), ScriptError> {
    let tokens = tokenize(source)?;
    let program = parse(&tokens)?;
    let mut evaluator = Evaluator {
        ns,
        locals: BTreeMap::new(),
        steps: 0,
        max_steps: limits.max_steps,
    };
    evaluator.exec_block(&program)
}

struct Evaluator<'a> {
    ns: &'a Namespace,
    locals: BTreeMap<String, FieldValue>,
    steps: u64,
    max_steps: u64,
}

impl<'a> Evaluator<'a> {
    fn step(&mut self) -> Result<(), ScriptError> {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(ScriptError::StepBudgetExceeded(self.max_steps));
        }
        Ok(())
    }

    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<(), ScriptError> {
        for stmt in stmts {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<(), ScriptError> {
        self.step()?;
        match stmt {
            Stmt::Assign { target, value } => {
                let value = self.eval(value)?;
                match target {
                    Target::Local(name) => {
                        if self.ns.contains(name) {
                            return Err(ScriptError::TypeMismatch(format!(
                                "{:?} is a proxy binding and cannot be reassigned",
                                name
                            )));
                        }
                        self.locals.insert(name.clone(), value);
                    }
                    Target::Field { binding, field } => {
                        let proxy = self
                            .ns
                            .get(binding)
                            .ok_or_else(|| ScriptError::UnknownVariable(binding.clone()))?;
                        proxy.borrow_mut().set(field, value)?;
                    }
                }
                Ok(())
            }
            Stmt::If {
                branches,
                else_body,
            } => {
                for (cond, body) in branches {
                    if self.eval_condition(cond)? {
                        return self.exec_block(body);
                    }
                }
                self.exec_block(else_body)
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
                Ok(())
            }
        }
    }

    fn eval_condition(&mut self, expr: &Expr) -> Result<bool, ScriptError> {
        let value = self.eval(expr)?;
        value.as_bool().ok_or_else(|| {
            ScriptError::TypeMismatch(format!(
                "condition must be bool, got {}",
                value.type_name()
            ))
        })
    }

    fn eval(&mut self, expr: &Expr) -> Result<FieldValue, ScriptError> {
        self.step()?;
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Var(name) => {
                if let Some(v) = self.locals.get(name) {
                    return Ok(v.clone());
                }
                if self.ns.contains(name) {
                    return Err(ScriptError::TypeMismatch(format!(
                        "{:?} is a proxy binding, not a value — read a field from it",
                        name
                    )));
                }
                Err(ScriptError::UnknownVariable(name.clone()))
            }
            Expr::Field { binding, field } => {
                let proxy = self
                    .ns
                    .get(binding)
                    .ok_or_else(|| ScriptError::UnknownVariable(binding.clone()))?;
                let value = proxy.borrow().get(field)?;
                Ok(value)
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                apply_unary(*op, value)
            }
            Expr::Binary { op, left, right } => match op {
                // Short-circuit forms evaluate the right side lazily.
                BinaryOp::And => {
                    if !self.eval_condition(left)? {
                        return Ok(FieldValue::Bool(false));
                    }
                    Ok(FieldValue::Bool(self.eval_condition(right)?))
                }
                BinaryOp::Or => {
                    if self.eval_condition(left)? {
                        return Ok(FieldValue::Bool(true));
                    }
                    Ok(FieldValue::Bool(self.eval_condition(right)?))
                }
                _ => {
                    let l = self.eval(left)?;
                    let r = self.eval(right)?;
                    apply_binary(*op, l, r)
                }
            },
            Expr::Call { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                call_builtin(name, values)
            }
        }
    }
}

fn apply_unary(op: UnaryOp, value: FieldValue) -> Result<FieldValue, ScriptError> {
    match op {
        UnaryOp::Not => match value.as_bool() {
            Some(b) => Ok(FieldValue::Bool(!b)),
            None => Err(ScriptError::TypeMismatch(format!(
                "! expects bool, got {}",
                value.type_name()
            ))),
        },
        UnaryOp::Neg => match value.as_num() {
            Some(n) => FieldValue::from_num(-n)
                .ok_or_else(|| ScriptError::Overflow("negation out of range".to_string())),
            None => Err(ScriptError::TypeMismatch(format!(
                "unary - expects a number, got {}",
                value.type_name()
            ))),
        },
    }
}

fn apply_binary(
    op: BinaryOp,
    left: FieldValue,
    right: FieldValue,
) -> Result<FieldValue, ScriptError> {
    match op {
        BinaryOp::Eq => Ok(FieldValue::Bool(left == right)),
        BinaryOp::Ne => Ok(FieldValue::Bool(left != right)),

        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (&left, &right) {
                (FieldValue::Str(a), FieldValue::Str(b)) => a.cmp(b),
                (a, b) => match (a.as_num(), b.as_num()) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    // Ordering against unset (or any non-comparable pair)
                    // is a fault — only equality works there.
                    _ => {
                        return Err(ScriptError::TypeMismatch(format!(
                            "cannot order {} against {}",
                            a.type_name(),
                            b.type_name()
                        )))
                    }
                },
            };
            let result = match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(FieldValue::Bool(result))
        }

        BinaryOp::In => match (&left, &right) {
            (FieldValue::Str(needle), FieldValue::Str(haystack)) => {
                Ok(FieldValue::Bool(haystack.contains(needle.as_str())))
            }
            (a, b) => Err(ScriptError::TypeMismatch(format!(
                "in expects string in string, got {} in {}",
                a.type_name(),
                b.type_name()
            ))),
        },

        BinaryOp::Add => {
            if let (FieldValue::Str(a), FieldValue::Str(b)) = (&left, &right) {
                return Ok(FieldValue::Str(format!("{}{}", a, b)));
            }
            numeric_binop(op, left, right)
        }
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            numeric_binop(op, left, right)
        }

        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit ops handled in eval"),
    }
}

fn numeric_binop(
    op: BinaryOp,
    left: FieldValue,
    right: FieldValue,
) -> Result<FieldValue, ScriptError> {
    let symbol = match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Rem => "%",
        _ => unreachable!("not an arithmetic op"),
    };
    let (x, y) = match (left.as_num(), right.as_num()) {
        (Some(x), Some(y)) => (x, y),
        _ => {
            return Err(ScriptError::TypeMismatch(format!(
                "{} expects numbers, got {} and {}",
                symbol,
                left.type_name(),
                right.type_name()
            )))
        }
    };
    let result = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x
            .checked_mul(y)
            .ok_or_else(|| ScriptError::Overflow(format!("{} * {}", x, y)))?,
        BinaryOp::Div => {
            if y == 0 {
                return Err(ScriptError::DivisionByZero);
            }
            x / y
        }
        BinaryOp::Rem => {
            if y == 0 {
                return Err(ScriptError::DivisionByZero);
            }
            x % y
        }
        _ => unreachable!(),
    };
    FieldValue::from_num(result)
        .ok_or_else(|| ScriptError::Overflow(format!("{} {} {}", x, symbol, y)))
}

fn call_builtin(name: &str, args: Vec<FieldValue>) -> Result<FieldValue, ScriptError> {
    fn arity(name: &str, expected: usize, args: &[FieldValue]) -> Result<(), ScriptError> {
        if args.len() != expected {
            return Err(ScriptError::BadArity {
                name: name.to_string(),
                expected,
                got: args.len(),
            });
        }
        Ok(())
    }
    fn string_arg<'v>(name: &str, v: &'v FieldValue) -> Result<&'v str, ScriptError> {
        v.as_str().ok_or_else(|| {
            ScriptError::TypeMismatch(format!("{} expects a string, got {}", name, v.type_name()))
        })
    }

    match name {
        "lower" => {
            arity(name, 1, &args)?;
            Ok(FieldValue::Str(string_arg(name, &args[0])?.to_lowercase()))
        }
        "upper" => {
            arity(name, 1, &args)?;
            Ok(FieldValue::Str(string_arg(name, &args[0])?.to_uppercase()))
        }
        "contains" => {
            arity(name, 2, &args)?;
            let hay = string_arg(name, &args[0])?;
            let needle = string_arg(name, &args[1])?;
            Ok(FieldValue::Bool(hay.contains(needle)))
        }
        "starts_with" => {
            arity(name, 2, &args)?;
            let hay = string_arg(name, &args[0])?;
            let prefix = string_arg(name, &args[1])?;
            Ok(FieldValue::Bool(hay.starts_with(prefix)))
        }
        "ends_with" => {
            arity(name, 2, &args)?;
            let hay = string_arg(name, &args[0])?;
            let suffix = string_arg(name, &args[1])?;
            Ok(FieldValue::Bool(hay.ends_with(suffix)))
        }
        "len" => {
            arity(name, 1, &args)?;
            match &args[0] {
                FieldValue::Str(s) => Ok(FieldValue::Int(s.chars().count() as i64)),
                FieldValue::Bytes(b) => Ok(FieldValue::Int(b.len() as i64)),
                other => Err(ScriptError::TypeMismatch(format!(
                    "len expects string or bytes, got {}",
                    other.type_name()
                ))),
            }
        }
        "str" => {
            arity(name, 1, &args)?;
            Ok(FieldValue::Str(args[0].to_string()))
        }
        _ => Err(ScriptError::NotCallable(name.to_string())),
    }
}
