//! Model definitions and solution records.
//!
//! Provides the data types exchanged with clients: the two accepted model
//! kinds, the decoded schedule of an RCPSP solve, and the solution snapshot
//! returned by `solve_model`.
//!
//! # Model Kinds
//!
//! | Kind | JSON discriminator | Built by |
//! |------|--------------------|----------|
//! | Generic | `variables` | `cp::GenericCpBuilder` |
//! | RCPSP | `tasks` | `cp::RcpspCpBuilder` |

mod generic;
mod schedule;
mod solution;
mod task;

pub use generic::{GenericModel, ObjectiveSpec, VariableDecl};
pub use schedule::{Schedule, TaskSlot, Violation, ViolationType};
pub use solution::SolutionSnapshot;
pub use task::{RcpspModel, TaskRecord};
