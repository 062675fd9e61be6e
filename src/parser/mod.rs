//! Model text parsers.
//!
//! `submit_model` accepts either model kind. The kind is detected from the
//! top-level keys: `tasks` selects RCPSP, otherwise `variables` selects the
//! generic form.

mod generic;
mod rcpsp;

pub use generic::{parse_generic, parse_generic_value};
pub use rcpsp::{parse_rcpsp, parse_rcpsp_value};

use serde_json::Value;

use crate::error::ModelError;
use crate::models::{GenericModel, RcpspModel};

/// A parsed model of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelDefinition {
    Generic(GenericModel),
    Rcpsp(RcpspModel),
}

impl ModelDefinition {
    /// Short kind name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ModelDefinition::Generic(_) => "generic",
            ModelDefinition::Rcpsp(_) => "rcpsp",
        }
    }
}

/// Parses model text of either kind.
pub fn parse_model(text: &str) -> Result<ModelDefinition, ModelError> {
    let value: Value = serde_json::from_str(text)?;
    parse_model_value(value)
}

/// Parses an already-decoded model of either kind.
pub fn parse_model_value(value: Value) -> Result<ModelDefinition, ModelError> {
    let Some(object) = value.as_object() else {
        return Err(ModelError::Format("model must be a JSON object".to_string()));
    };
    if object.contains_key("tasks") {
        parse_rcpsp_value(value).map(ModelDefinition::Rcpsp)
    } else if object.contains_key("variables") {
        parse_generic_value(value).map(ModelDefinition::Generic)
    } else {
        Err(ModelError::Format(
            "model must contain a 'variables' or 'tasks' field".to_string(),
        ))
    }
}
