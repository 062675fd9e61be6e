//! Command dispatcher.

use std::sync::{Mutex, MutexGuard, TryLockError};

use serde_json::Value;

use super::command::{Command, Response};
use crate::engine::{CpSolver, SearchSolver};
use crate::error::CommandError;
use crate::session::SolvingSession;

/// Routes commands to a single solving session.
///
/// The session sits behind a mutex taken with `try_lock`: a request that
/// arrives while another one holds the session (a long solve) is answered
/// with a busy error instead of waiting.
pub struct Dispatcher<S: CpSolver = SearchSolver> {
    session: Mutex<SolvingSession<S>>,
}

impl Default for Dispatcher<SearchSolver> {
    fn default() -> Self {
        Self::new(SolvingSession::new())
    }
}

impl<S: CpSolver> Dispatcher<S> {
    /// Creates a dispatcher owning `session`.
    pub fn new(session: SolvingSession<S>) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    /// Acquires the session, or fails with [`CommandError::Busy`].
    pub fn lock_session(&self) -> Result<MutexGuard<'_, SolvingSession<S>>, CommandError> {
        match self.session.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::WouldBlock) => Err(CommandError::Busy),
            Err(TryLockError::Poisoned(poisoned)) => {
                tracing::warn!("session lock poisoned by an earlier panic; recovering");
                Ok(poisoned.into_inner())
            }
        }
    }

    /// Handles one request text and returns the response text.
    pub fn handle_request(&self, text: &str) -> String {
        let response = match serde_json::from_str::<Value>(text) {
            Ok(request) => self.handle_value(&request),
            Err(err) => {
                let err = CommandError::InvalidRequest(format!("malformed JSON: {err}"));
                tracing::warn!(error = %err, "rejected request");
                Response::from(&err)
            }
        };
        response.to_json()
    }

    /// Handles one decoded request.
    pub fn handle_value(&self, request: &Value) -> Response {
        let result = Command::from_request(request).and_then(|command| {
            tracing::debug!(command = command.name(), "handling request");
            self.dispatch(command)
        });
        match result {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "request failed");
                Response::from(&err)
            }
        }
    }

    /// Executes a command against the session.
    pub fn dispatch(&self, command: Command) -> Result<Response, CommandError> {
        let mut session = self.lock_session()?;

        match command {
            Command::SubmitModel { model } => {
                match model {
                    Value::String(text) => session.submit(&text)?,
                    other => session.submit_value(other)?,
                }
                Ok(Response::message("Model submitted successfully"))
            }
            Command::SolveModel { timeout } => {
                let snapshot = session.solve(timeout)?;
                Ok(Response::solution(snapshot))
            }
            Command::GetSolution => session
                .last_solution()
                .cloned()
                .map(Response::solution)
                .ok_or(CommandError::NoSolution),
            Command::SetParameter { name, value } => {
                let message = format!("Parameter {name} set to {value}");
                session.set_parameter(&name, value)?;
                Ok(Response::message(message))
            }
            Command::GetVariable { name } => {
                let solution = session.last_solution().ok_or(CommandError::NoSolution)?;
                solution
                    .value(&name)
                    .map(Response::value)
                    .ok_or(CommandError::VariableNotFound(name))
            }
            Command::GetSolveTime => session
                .last_solution()
                .map(|s| Response::solve_time(s.solve_time))
                .ok_or(CommandError::NoSolution),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ResponseStatus;
    use serde_json::json;

    const TWO_TASKS: &str = r#"{"tasks": [{"duration": 2, "predecessors": [], "resources": [1]}, {"duration": 3, "predecessors": [0], "resources": [1]}], "resource_capacities": [1]}"#;

    fn request(dispatcher: &Dispatcher, body: Value) -> Value {
        serde_json::from_str(&dispatcher.handle_request(&body.to_string())).unwrap()
    }

    fn submit(dispatcher: &Dispatcher, model: &str) -> Value {
        request(dispatcher, json!({"command": "submit_model", "model": model}))
    }

    #[test]
    fn test_end_to_end() {
        let d = Dispatcher::default();

        let resp = submit(&d, TWO_TASKS);
        assert_eq!(resp["status"], "SUCCESS");
        assert_eq!(resp["message"], "Model submitted successfully");

        let resp = request(&d, json!({"command": "solve_model", "timeout": 10}));
        assert_eq!(resp["status"], "SUCCESS");
        assert_eq!(resp["solution"]["status"], "OPTIMAL");
        assert_eq!(resp["solution"]["objective_value"], 5);
        assert_eq!(resp["solution"]["variables"]["start_0"], 0);
        assert!(resp["solution"]["variables"]["start_1"].as_i64().unwrap() >= 2);

        let resp = request(&d, json!({"command": "get_variable", "name": "makespan"}));
        assert_eq!(resp, json!({"status": "SUCCESS", "value": 5}));

        let resp = request(&d, json!({"command": "get_solve_time"}));
        assert!(resp["solve_time"].as_f64().unwrap() >= 0.0);

        let resp = request(&d, json!({"command": "get_solution"}));
        assert_eq!(resp["solution"]["variables"]["end_1"], 5);
    }

    #[test]
    fn test_get_variable_requires_solve() {
        let d = Dispatcher::default();
        submit(&d, TWO_TASKS);

        let resp = request(&d, json!({"command": "get_variable", "name": "start_0"}));
        assert_eq!(resp["status"], "ERROR");

        request(&d, json!({"command": "solve_model"}));
        let resp = request(&d, json!({"command": "get_variable", "name": "nope"}));
        assert_eq!(resp["status"], "ERROR");
        assert_eq!(resp["message"], "variable 'nope' not found in solution");
    }

    #[test]
    fn test_no_solution_errors() {
        let d = Dispatcher::default();
        for command in ["get_solution", "get_solve_time"] {
            let resp = request(&d, json!({"command": command}));
            assert_eq!(resp, json!({"status": "ERROR", "message": "no solution available"}));
        }
    }

    #[test]
    fn test_solve_without_model() {
        let d = Dispatcher::default();
        let resp = request(&d, json!({"command": "solve_model"}));
        assert_eq!(resp["status"], "ERROR");
        assert!(resp["message"].as_str().unwrap().contains("no model submitted"));
    }

    #[test]
    fn test_malformed_model_keeps_cached_solution() {
        let d = Dispatcher::default();
        submit(&d, TWO_TASKS);
        request(&d, json!({"command": "solve_model"}));

        let resp = submit(&d, "{\"tasks\": [");
        assert_eq!(resp["status"], "ERROR");
        assert!(resp["message"]
            .as_str()
            .unwrap()
            .starts_with("error submitting model"));

        let resp = request(&d, json!({"command": "get_variable", "name": "makespan"}));
        assert_eq!(resp["value"], 5);
    }

    #[test]
    fn test_validation_error_reported() {
        let d = Dispatcher::default();
        let resp = submit(
            &d,
            r#"{"tasks": [{"duration": 1, "predecessors": [4], "resources": []}], "resource_capacities": []}"#,
        );
        assert_eq!(resp["status"], "ERROR");
        assert!(resp["message"].as_str().unwrap().contains("predecessor 4"));
    }

    #[test]
    fn test_model_as_object() {
        let d = Dispatcher::default();
        let model: Value = serde_json::from_str(TWO_TASKS).unwrap();
        let resp = request(&d, json!({"command": "submit_model", "model": model}));
        assert_eq!(resp["status"], "SUCCESS");
    }

    #[test]
    fn test_set_parameter() {
        let d = Dispatcher::default();
        let resp = request(
            &d,
            json!({"command": "set_parameter", "name": "max_time_in_seconds", "value": 5}),
        );
        assert_eq!(resp["message"], "Parameter max_time_in_seconds set to 5");

        let resp = request(
            &d,
            json!({"command": "set_parameter", "name": "random_seed", "value": "abc"}),
        );
        assert_eq!(resp["status"], "ERROR");

        let resp = request(&d, json!({"command": "set_parameter", "value": 5}));
        assert_eq!(resp["message"], "missing required field 'name'");
    }

    #[test]
    fn test_unknown_command_and_bad_json() {
        let d = Dispatcher::default();
        let resp = request(&d, json!({"command": "reboot"}));
        assert_eq!(resp, json!({"status": "ERROR", "message": "unknown command: reboot"}));

        let resp: Value = serde_json::from_str(&d.handle_request("{oops")).unwrap();
        assert_eq!(resp["status"], "ERROR");
        assert!(resp["message"].as_str().unwrap().contains("malformed JSON"));
    }

    #[test]
    fn test_busy_while_session_held() {
        let d = Dispatcher::default();
        let guard = d.lock_session().unwrap();

        let resp = d.handle_value(&json!({"command": "get_solution"}));
        assert_eq!(resp.status, ResponseStatus::Error);
        assert_eq!(resp.message.as_deref(), Some("busy: a solve is in progress"));

        drop(guard);
        let resp = d.handle_value(&json!({"command": "solve_model"}));
        assert_eq!(resp.message.as_deref(), Some("error solving model: no model submitted"));
    }

    #[test]
    fn test_infeasible_is_success() {
        let d = Dispatcher::default();
        submit(
            &d,
            r#"{"variables": [{"name": "x", "domain": [0, 3]}], "constraints": ["x >= 4"]}"#,
        );
        let resp = request(&d, json!({"command": "solve_model"}));
        assert_eq!(resp["status"], "SUCCESS");
        assert_eq!(resp["solution"]["status"], "INFEASIBLE");
        assert_eq!(resp["solution"]["variables"], json!({}));
    }

    #[test]
    fn test_unknown_is_success() {
        let d = Dispatcher::default();
        let variables: Vec<Value> = (0..13)
            .map(|i| json!({"name": format!("p{i}"), "domain": [0, 11]}))
            .collect();
        let mut constraints = Vec::new();
        for i in 0..13 {
            for j in i + 1..13 {
                constraints.push(format!("p{i} != p{j}"));
            }
        }
        let model = json!({"variables": variables, "constraints": constraints});
        let resp = request(&d, json!({"command": "submit_model", "model": model}));
        assert_eq!(resp["status"], "SUCCESS");

        let resp = request(&d, json!({"command": "solve_model", "timeout": 0.05}));
        assert_eq!(resp["status"], "SUCCESS");
        assert_eq!(resp["solution"]["status"], "UNKNOWN");
        assert_eq!(resp["solution"]["variables"], json!({}));
        assert_eq!(resp["solution"]["message"], "no solution found");

        let resp = request(&d, json!({"command": "get_variable", "name": "p0"}));
        assert_eq!(resp["status"], "ERROR");
    }
}
