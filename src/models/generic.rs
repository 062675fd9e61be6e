//! Generic constraint model definition.
//!
//! The JSON form accepted by `submit_model`:
//!
//! ```json
//! {
//!   "variables": [{"name": "x", "domain": [0, 10]}],
//!   "constraints": ["x + y <= 7"],
//!   "objective": {"expression": "x + y", "maximize": true}
//! }
//! ```
//!
//! `constraints` and `objective` are optional. Constraint strings are kept
//! verbatim; they are resolved against the declared variables when the
//! model is built.

use serde::{Deserialize, Serialize};

/// A variable declaration: a name and an inclusive integer domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDecl {
    /// Variable name.
    pub name: String,
    /// Inclusive bounds `(lower, upper)`.
    pub domain: (i64, i64),
}

impl VariableDecl {
    /// Creates a declaration.
    pub fn new(name: impl Into<String>, lower: i64, upper: i64) -> Self {
        Self {
            name: name.into(),
            domain: (lower, upper),
        }
    }

    /// Lower bound.
    #[inline]
    pub fn lower(&self) -> i64 {
        self.domain.0
    }

    /// Upper bound.
    #[inline]
    pub fn upper(&self) -> i64 {
        self.domain.1
    }
}

/// Objective expression and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawObjective")]
pub struct ObjectiveSpec {
    /// Arithmetic expression over declared variables.
    pub expression: String,
    /// `true` to maximize, `false` to minimize.
    pub maximize: bool,
}

impl ObjectiveSpec {
    /// A maximization objective.
    pub fn maximize(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            maximize: true,
        }
    }

    /// A minimization objective.
    pub fn minimize(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            maximize: false,
        }
    }
}

/// Wire form of the objective. `maximize` defaults to `true`;
/// `minimize` is accepted as the opposite spelling.
#[derive(Deserialize)]
struct RawObjective {
    expression: String,
    maximize: Option<bool>,
    minimize: Option<bool>,
}

impl TryFrom<RawObjective> for ObjectiveSpec {
    type Error = String;

    fn try_from(raw: RawObjective) -> Result<Self, Self::Error> {
        let maximize = match (raw.maximize, raw.minimize) {
            (Some(max), Some(min)) if max == min => {
                return Err("objective sets 'maximize' and 'minimize' inconsistently".to_string())
            }
            (Some(max), _) => max,
            (None, Some(min)) => !min,
            (None, None) => true,
        };
        Ok(Self {
            expression: raw.expression,
            maximize,
        })
    }
}

/// A parsed generic model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericModel {
    /// Variables in declaration order.
    pub variables: Vec<VariableDecl>,
    /// Raw relational constraint expressions, in order.
    #[serde(default)]
    pub constraints: Vec<String>,
    /// Optional objective.
    #[serde(default)]
    pub objective: Option<ObjectiveSpec>,
}

impl GenericModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable declaration.
    pub fn with_variable(mut self, name: impl Into<String>, lower: i64, upper: i64) -> Self {
        self.variables.push(VariableDecl::new(name, lower, upper));
        self
    }

    /// Adds a constraint expression.
    pub fn with_constraint(mut self, expr: impl Into<String>) -> Self {
        self.constraints.push(expr.into());
        self
    }

    /// Sets the objective.
    pub fn with_objective(mut self, objective: ObjectiveSpec) -> Self {
        self.objective = Some(objective);
        self
    }

    /// Number of declared variables.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }
}
