//! Constraint-model translation server.
//!
//! Accepts optimization models as JSON, translates them into a
//! constraint-programming model and solves them. Two model kinds are
//! understood:
//!
//! - **Generic**: named integer variables with domains, relational
//!   constraints written as text (`"x + 2*y <= 10"`), and an optional linear
//!   objective.
//! - **RCPSP**: tasks with durations, predecessors and per-resource demands
//!   against renewable resource capacities, minimizing the makespan.
//!
//! A client drives a [`SolvingSession`] through the [`Dispatcher`], which
//! speaks a length-prefixed JSON command protocol over stdio.
//!
//! # Modules
//!
//! - **`models`**: Data types for both model kinds, schedules and solution
//!   snapshots
//! - **`parser`**: JSON model text into model definitions
//! - **`validation`**: Input integrity checks (domains, names, resource
//!   vectors, predecessor references, DAG cycles)
//! - **`expr`**: Expression grammar and the symbol resolver that lowers
//!   text constraints into linear form
//! - **`engine`**: The CP engine (variables, linear constraints, cumulative
//!   resources, branch-and-bound search)
//! - **`cp`**: Builders that translate model definitions into engine models
//! - **`session`**: Model lifecycle, parameters and cached results
//! - **`protocol`**: Commands, responses, framing and the serve loop
//! - **`config`**, **`telemetry`**: Server settings and tracing setup
//!
//! # References
//!
//! - Kolisch & Sprecher (1997), "PSPLIB - A project scheduling problem library"
//! - Baptiste, Le Pape & Nuijten (2001), "Constraint-Based Scheduling"
//! - Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming"

pub mod config;
pub mod cp;
pub mod engine;
pub mod error;
pub mod expr;
pub mod models;
pub mod parser;
pub mod protocol;
pub mod session;
pub mod telemetry;
pub mod validation;

pub use error::{CommandError, ExprError, ModelError, SolverError};
pub use protocol::Dispatcher;
pub use session::SolvingSession;
