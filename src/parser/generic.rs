//! Generic model parser.

use serde_json::Value;

use crate::error::ModelError;
use crate::models::GenericModel;

/// Parses a generic model from JSON text.
///
/// Fails with [`ModelError::Format`] when the text is not a JSON object or
/// when a variable lacks a well-typed `name` or two-element integer
/// `domain`. Constraint strings are not inspected.
pub fn parse_generic(text: &str) -> Result<GenericModel, ModelError> {
    let value: Value = serde_json::from_str(text)?;
    parse_generic_value(value)
}

/// Parses a generic model from an already-decoded JSON value.
pub fn parse_generic_value(value: Value) -> Result<GenericModel, ModelError> {
    if !value.is_object() {
        return Err(ModelError::Format("model must be a JSON object".to_string()));
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_model() {
        let model = parse_generic(
            r#"{
                "variables": [
                    {"name": "x", "domain": [0, 10]},
                    {"name": "y", "domain": [0, 10]}
                ],
                "constraints": ["x + y <= 7", "x - y >= -2"],
                "objective": {"expression": "x + y", "maximize": true}
            }"#,
        )
        .unwrap();

        assert_eq!(model.variable_count(), 2);
        assert_eq!(model.variables[0].name, "x");
        assert_eq!(model.constraints.len(), 2);
        assert_eq!(model.constraints[1], "x - y >= -2");
        assert!(model.objective.unwrap().maximize);
    }

    #[test]
    fn test_constraints_and_objective_optional() {
        let model = parse_generic(r#"{"variables": [{"name": "x", "domain": [1, 2]}]}"#).unwrap();
        assert!(model.constraints.is_empty());
        assert!(model.objective.is_none());
    }

    #[test]
    fn test_format_errors() {
        let cases = [
            "not json",
            "[1, 2]",
            r#"{"constraints": []}"#,
            r#"{"variables": [{"domain": [0, 1]}]}"#,
            r#"{"variables": [{"name": "x"}]}"#,
            r#"{"variables": [{"name": 3, "domain": [0, 1]}]}"#,
            r#"{"variables": [{"name": "x", "domain": "0..1"}]}"#,
            r#"{"variables": [], "objective": {"maximize": true}}"#,
            r#"{"variables": [], "constraints": [1]}"#,
        ];
        for text in cases {
            assert!(
                matches!(parse_generic(text), Err(ModelError::Format(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn test_domain_bounds_not_checked_here() {
        let model = parse_generic(r#"{"variables": [{"name": "x", "domain": [5, 1]}]}"#).unwrap();
        assert_eq!(model.variables[0].domain, (5, 1));
    }
}
