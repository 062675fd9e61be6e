//! Requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CommandError;
use crate::models::SolutionSnapshot;

/// A decoded request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace the active model. `model` is JSON text or a JSON object.
    SubmitModel { model: Value },
    /// Solve the active model, optionally within `timeout` seconds.
    SolveModel { timeout: Option<f64> },
    /// Return the cached solution.
    GetSolution,
    /// Set a solver parameter.
    SetParameter { name: String, value: Value },
    /// Return one variable from the cached solution.
    GetVariable { name: String },
    /// Return the wall-clock time of the last solve.
    GetSolveTime,
}

impl Command {
    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SubmitModel { .. } => "submit_model",
            Command::SolveModel { .. } => "solve_model",
            Command::GetSolution => "get_solution",
            Command::SetParameter { .. } => "set_parameter",
            Command::GetVariable { .. } => "get_variable",
            Command::GetSolveTime => "get_solve_time",
        }
    }

    /// Decodes a request object.
    pub fn from_request(request: &Value) -> Result<Self, CommandError> {
        let Some(fields) = request.as_object() else {
            return Err(CommandError::InvalidRequest(
                "request must be a JSON object".to_string(),
            ));
        };

        let command = match fields.get("command") {
            None | Some(Value::Null) => return Err(CommandError::MissingField("command")),
            Some(Value::String(name)) => name.as_str(),
            Some(_) => {
                return Err(CommandError::InvalidField {
                    field: "command",
                    reason: "expected a string".to_string(),
                })
            }
        };

        match command {
            "submit_model" => match present(fields.get("model")) {
                None => Err(CommandError::MissingField("model")),
                Some(model @ (Value::String(_) | Value::Object(_))) => Ok(Command::SubmitModel {
                    model: model.clone(),
                }),
                Some(_) => Err(CommandError::InvalidField {
                    field: "model",
                    reason: "expected model text or a JSON object".to_string(),
                }),
            },
            "solve_model" => {
                let timeout = match present(fields.get("timeout")) {
                    None => None,
                    Some(value) => Some(
                        value
                            .as_f64()
                            .filter(|t| t.is_finite() && *t > 0.0)
                            .ok_or_else(|| CommandError::InvalidField {
                                field: "timeout",
                                reason: "expected a positive number of seconds".to_string(),
                            })?,
                    ),
                };
                Ok(Command::SolveModel { timeout })
            }
            "get_solution" => Ok(Command::GetSolution),
            "set_parameter" => {
                let name = required_string(fields.get("name"), "name")?;
                let value = present(fields.get("value"))
                    .cloned()
                    .ok_or(CommandError::MissingField("value"))?;
                Ok(Command::SetParameter { name, value })
            }
            "get_variable" => Ok(Command::GetVariable {
                name: required_string(fields.get("name"), "name")?,
            }),
            "get_solve_time" => Ok(Command::GetSolveTime),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

/// Treats an explicit `null` like an absent field.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn required_string(value: Option<&Value>, field: &'static str) -> Result<String, CommandError> {
    match present(value) {
        None => Err(CommandError::MissingField(field)),
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(CommandError::MissingField(field)),
        Some(_) => Err(CommandError::InvalidField {
            field,
            reason: "expected a string".to_string(),
        }),
    }
}

/// Outcome marker carried by every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// A response. Fields other than `status` appear only when set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<SolutionSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solve_time: Option<f64>,
}

impl Response {
    fn success() -> Self {
        Self {
            status: ResponseStatus::Success,
            message: None,
            solution: None,
            value: None,
            solve_time: None,
        }
    }

    /// `SUCCESS` with a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success()
        }
    }

    /// `SUCCESS` with a solution.
    pub fn solution(solution: SolutionSnapshot) -> Self {
        Self {
            solution: Some(solution),
            ..Self::success()
        }
    }

    /// `SUCCESS` with a variable value.
    pub fn value(value: i64) -> Self {
        Self {
            value: Some(value),
            ..Self::success()
        }
    }

    /// `SUCCESS` with a solve time.
    pub fn solve_time(seconds: f64) -> Self {
        Self {
            solve_time: Some(seconds),
            ..Self::success()
        }
    }

    /// `ERROR` with a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: Some(message.into()),
            ..Self::success()
        }
    }

    /// Whether this is a `SUCCESS` response.
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// Serializes the response.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            serde_json::json!({
                "status": ResponseStatus::Error,
                "message": format!("failed to encode response: {err}"),
            })
            .to_string()
        })
    }
}

impl From<&CommandError> for Response {
    fn from(err: &CommandError) -> Self {
        Response::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(request: Value) -> Result<Command, CommandError> {
        Command::from_request(&request)
    }

    #[test]
    fn test_decode_commands() {
        assert_eq!(
            decode(json!({"command": "submit_model", "model": "{}"})).unwrap(),
            Command::SubmitModel { model: json!("{}") }
        );
        assert_eq!(
            decode(json!({"command": "solve_model"})).unwrap(),
            Command::SolveModel { timeout: None }
        );
        assert_eq!(
            decode(json!({"command": "solve_model", "timeout": 1.5})).unwrap(),
            Command::SolveModel { timeout: Some(1.5) }
        );
        assert_eq!(
            decode(json!({"command": "set_parameter", "name": "random_seed", "value": 4})).unwrap(),
            Command::SetParameter {
                name: "random_seed".into(),
                value: json!(4)
            }
        );
        assert_eq!(
            decode(json!({"command": "get_variable", "name": "x"})).unwrap().name(),
            "get_variable"
        );
        assert_eq!(decode(json!({"command": "get_solution"})).unwrap(), Command::GetSolution);
        assert_eq!(decode(json!({"command": "get_solve_time"})).unwrap(), Command::GetSolveTime);
    }

    #[test]
    fn test_model_object_accepted() {
        let cmd = decode(json!({"command": "submit_model", "model": {"variables": []}})).unwrap();
        assert!(matches!(cmd, Command::SubmitModel { model: Value::Object(_) }));

        let err = decode(json!({"command": "submit_model", "model": 3})).unwrap_err();
        assert!(matches!(err, CommandError::InvalidField { field: "model", .. }));
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            decode(json!({"command": "set_parameter", "value": 1})).unwrap_err(),
            CommandError::MissingField("name")
        );
        assert_eq!(
            decode(json!({"command": "set_parameter", "name": "x"})).unwrap_err(),
            CommandError::MissingField("value")
        );
        assert_eq!(
            decode(json!({"command": "set_parameter", "name": "x", "value": null})).unwrap_err(),
            CommandError::MissingField("value")
        );
        assert_eq!(
            decode(json!({"command": "get_variable"})).unwrap_err(),
            CommandError::MissingField("name")
        );
        assert_eq!(
            decode(json!({"command": "submit_model"})).unwrap_err(),
            CommandError::MissingField("model")
        );
        assert_eq!(decode(json!({})).unwrap_err(), CommandError::MissingField("command"));
    }

    #[test]
    fn test_invalid_timeout() {
        for timeout in [json!(0), json!(-2.0), json!("10")] {
            let err = decode(json!({"command": "solve_model", "timeout": timeout})).unwrap_err();
            assert!(matches!(err, CommandError::InvalidField { field: "timeout", .. }));
        }
    }

    #[test]
    fn test_unknown_command() {
        let err = decode(json!({"command": "explode"})).unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("explode".into()));
        assert!(matches!(decode(json!([1])), Err(CommandError::InvalidRequest(_))));
    }

    #[test]
    fn test_response_shape() {
        let json: Value = serde_json::from_str(&Response::value(3).to_json()).unwrap();
        assert_eq!(json, json!({"status": "SUCCESS", "value": 3}));

        let json: Value = serde_json::from_str(&Response::error("boom").to_json()).unwrap();
        assert_eq!(json, json!({"status": "ERROR", "message": "boom"}));
    }
}
