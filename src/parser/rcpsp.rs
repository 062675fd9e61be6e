//! RCPSP model parser.

use serde_json::Value;

use crate::error::ModelError;
use crate::models::RcpspModel;

/// Parses an RCPSP project from JSON text.
///
/// ```json
/// {
///   "tasks": [
///     {"duration": 2, "predecessors": [], "resources": [1]},
///     {"duration": 3, "predecessors": [0], "resources": [1]}
///   ],
///   "resource_capacities": [1]
/// }
/// ```
///
/// Every task must carry `duration`, `predecessors` and `resources`.
/// Cross-field checks (vector lengths, index ranges) are left to
/// validation.
pub fn parse_rcpsp(text: &str) -> Result<RcpspModel, ModelError> {
    let value: Value = serde_json::from_str(text)?;
    parse_rcpsp_value(value)
}

/// Parses an RCPSP project from an already-decoded JSON value.
pub fn parse_rcpsp_value(value: Value) -> Result<RcpspModel, ModelError> {
    if !value.is_object() {
        return Err(ModelError::Format("model must be a JSON object".to_string()));
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskRecord;

    #[test]
    fn test_parse_project() {
        let model = parse_rcpsp(
            r#"{
                "tasks": [
                    {"duration": 2, "predecessors": [], "resources": [1]},
                    {"duration": 3, "predecessors": [0], "resources": [1]}
                ],
                "resource_capacities": [1]
            }"#,
        )
        .unwrap();

        assert_eq!(model.task_count(), 2);
        assert_eq!(
            model.tasks[1],
            TaskRecord::new(3).with_predecessor(0).with_demands(vec![1])
        );
        assert_eq!(model.resource_capacities, vec![1]);
    }

    #[test]
    fn test_missing_fields() {
        let cases = [
            r#"{"tasks": [{"predecessors": [], "resources": []}], "resource_capacities": []}"#,
            r#"{"tasks": [{"duration": 1, "resources": []}], "resource_capacities": []}"#,
            r#"{"tasks": [{"duration": 1, "predecessors": []}], "resource_capacities": []}"#,
            r#"{"tasks": [{"duration": 1, "predecessors": [], "resources": []}]}"#,
            r#"{"tasks": [{"duration": "long", "predecessors": [], "resources": []}], "resource_capacities": []}"#,
        ];
        for text in cases {
            assert!(matches!(parse_rcpsp(text), Err(ModelError::Format(_))), "{text}");
        }
    }

    #[test]
    fn test_no_cross_field_checks() {
        // Mismatched vectors and bad indices parse; the builder rejects them.
        let model = parse_rcpsp(
            r#"{"tasks": [{"duration": 1, "predecessors": [9], "resources": [1, 2]}],
                "resource_capacities": [1]}"#,
        )
        .unwrap();
        assert_eq!(model.tasks[0].predecessors, vec![9]);
    }
}
