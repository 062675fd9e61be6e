//! Solution snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::engine::SolveStatus;

/// Immutable result of one solve, as reported to clients.
///
/// `variables` is keyed by name (sorted) and is empty unless the status
/// is `OPTIMAL` or `FEASIBLE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionSnapshot {
    /// Variable values by name.
    pub variables: BTreeMap<String, i64>,
    /// Solve outcome.
    pub status: SolveStatus,
    /// Wall-clock solve time in seconds.
    pub solve_time: f64,
    /// Objective value, when the model has an objective and a solution
    /// was found.
    pub objective_value: Option<i64>,
    /// Explanation when no values are available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SolutionSnapshot {
    /// Creates a snapshot with no values.
    pub fn empty(status: SolveStatus, solve_time: f64) -> Self {
        let message = match status {
            SolveStatus::Infeasible => Some("problem is infeasible".to_string()),
            SolveStatus::ModelInvalid => Some("model is invalid".to_string()),
            SolveStatus::Unknown => Some("no solution found".to_string()),
            SolveStatus::Optimal | SolveStatus::Feasible => None,
        };
        Self {
            variables: BTreeMap::new(),
            status,
            solve_time,
            objective_value: None,
            message,
        }
    }

    /// Value of a named variable.
    pub fn value(&self, name: &str) -> Option<i64> {
        self.variables.get(name).copied()
    }

    /// Whether variable values are available.
    pub fn has_solution(&self) -> bool {
        self.status.has_solution()
    }
}
