//! Constraint-programming engine.
//!
//! A small CP-SAT style engine: integer variables with interval domains,
//! fixed-duration interval variables, linear relational constraints,
//! precedences and cumulative resources, solved by depth-first
//! branch-and-bound with bounds propagation.
//!
//! # Usage
//!
//! ```
//! use u_cpmodel::engine::{
//!     CpModel, CpSolver, LinearExpr, RelOp, SearchSolver, SolveStatus, SolverConfig,
//!     TypedConstraint,
//! };
//!
//! let mut model = CpModel::new("demo");
//! let x = model.new_int_var(0, 10, "x");
//! model.add(TypedConstraint::new(LinearExpr::var(x), RelOp::Ge, LinearExpr::constant(3)));
//! model.minimize(LinearExpr::var(x));
//!
//! let solution = SearchSolver::new().solve(&model, &SolverConfig::default()).unwrap();
//! assert_eq!(solution.status, SolveStatus::Optimal);
//! assert_eq!(solution.value(x), Some(3));
//! ```
//!
//! The engine sits behind the [`CpSolver`] trait so sessions can be run
//! against another backend.

mod linear;
mod model;
mod propagate;
mod solver;
mod variables;

pub use linear::{LinearExpr, RelOp, TypedConstraint};
pub use model::{CpConstraint, CpModel, Objective, Sense};
pub use solver::{
    seconds_to_duration, CpSolution, CpSolver, SearchSolver, SolveStatus, SolverConfig,
    PARAM_LOG_PROGRESS, PARAM_MAX_TIME, PARAM_RANDOM_SEED,
};
pub use variables::{IntVar, IntervalId, IntervalVar, VarId};
