//! Error taxonomy.
//!
//! Each stage of the pipeline has its own error type:
//!
//! | Stage | Error |
//! |-------|-------|
//! | Model text → parsed model | [`ModelError::Format`] |
//! | Parsed model → invariants | [`ModelError::Validation`] |
//! | Expression text → typed constraint | [`ExprError`] |
//! | Engine run | [`SolverError`] |
//! | Request routing | [`CommandError`] |
//!
//! Every variant renders a human-readable message; the dispatcher copies it
//! into the `message` field of an `ERROR` response.

use crate::validation::ValidationError;

/// Expression resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    #[error("syntax error in '{expr}': {reason}")]
    Syntax { expr: String, reason: String },

    #[error("unknown variable '{name}'")]
    UnknownVariable { name: String },

    #[error("type error in '{expr}': {reason}")]
    Type { expr: String, reason: String },
}

impl ExprError {
    pub(crate) fn syntax(expr: &str, reason: impl Into<String>) -> Self {
        Self::Syntax {
            expr: expr.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn type_error(expr: &str, reason: impl Into<String>) -> Self {
        Self::Type {
            expr: expr.to_string(),
            reason: reason.into(),
        }
    }
}

/// Model submission failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("invalid model format: {0}")]
    Format(String),

    #[error("invalid model: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid constraint '{constraint}': {source}")]
    Constraint {
        constraint: String,
        #[source]
        source: ExprError,
    },

    #[error("invalid objective expression: {0}")]
    Objective(#[source] ExprError),
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Format(err.to_string())
    }
}

/// Solve failure, distinct from an infeasible or unknown outcome.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    #[error("no model submitted")]
    NoModel,

    #[error("invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("engine failure: {0}")]
    Engine(String),
}

impl SolverError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Request handling failure, reported as an `ERROR` response.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("busy: a solve is in progress")]
    Busy,

    #[error("no solution available")]
    NoSolution,

    #[error("variable '{0}' not found in solution")]
    VariableNotFound(String),

    #[error("error submitting model: {0}")]
    Model(#[from] ModelError),

    #[error("error solving model: {0}")]
    Solver(#[from] SolverError),
}
