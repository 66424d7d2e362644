//! Error taxonomy for the kernel.
//!
//! `SchemaError` surfaces at schema declaration time (programmer error).
//! `ProxyError` and `ScriptError` surface while a rule runs and are
//! contained at the controller boundary — they never cross it.

use thiserror::Error;

/// Invalid schema declaration. Raised at construction, never at run time.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("duplicate field {field:?} in {entity:?} schema")]
    DuplicateField { entity: String, field: String },

    #[error("alias {alias:?} targets undeclared field {target:?} in {entity:?} schema")]
    UnknownAliasTarget {
        entity: String,
        alias: String,
        target: String,
    },

    #[error("alias {alias:?} shadows a declared field in {entity:?} schema")]
    AliasShadowsField { entity: String, alias: String },

    #[error("exclusion {field:?} is not a declared field in {entity:?} schema")]
    UnknownExclusion { entity: String, field: String },
}

/// Faults raised by proxy field access.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("unknown field {name:?} on {entity:?} proxy")]
    UnknownField { entity: String, name: String },
}

/// Faults raised while parsing or evaluating a rule script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("parse error at line {line}: {message}")]
    Parse { line: u32, message: String },

    #[error("unknown variable {0:?}")]
    UnknownVariable(String),

    #[error(transparent)]
    UnknownField(#[from] ProxyError),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("step budget exhausted after {0} steps")]
    StepBudgetExceeded(u64),

    #[error("{0:?} is not a builtin function")]
    NotCallable(String),

    #[error("{name} expects {expected} argument(s), got {got}")]
    BadArity {
        name: String,
        expected: usize,
        got: usize,
    },
}
