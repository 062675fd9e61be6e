//! CP formulations.
//!
//! Bridges parsed model definitions to the constraint engine. Each builder
//! validates its input, adds variables and constraints to a [`CpModel`],
//! and returns the handles needed to read a solution back.
//!
//! | Builder | Input | Objective |
//! |---------|-------|-----------|
//! | [`GenericCpBuilder`] | variables, constraint strings | as declared |
//! | [`RcpspCpBuilder`] | tasks, capacities | minimize end of last task |
//!
//! # Reference
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"
//!
//! [`CpModel`]: crate::engine::CpModel

mod generic;
mod rcpsp;

pub use generic::{GenericCpBuilder, GenericVariables};
pub use rcpsp::{RcpspCpBuilder, RcpspVariables, MAKESPAN};
