//! RCPSP formulation.

use crate::engine::{CpModel, CpSolution, IntervalId, LinearExpr, VarId};
use crate::error::ModelError;
use crate::models::{RcpspModel, Schedule, TaskSlot};
use crate::validation::{
    detect_cycles, first_violation, validate_rcpsp, ValidationError, ValidationErrorKind,
};

/// Name of the makespan entry in solution snapshots.
pub const MAKESPAN: &str = "makespan";

/// Handles created by [`RcpspCpBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcpspVariables {
    /// Start variable per task.
    pub starts: Vec<VarId>,
    /// End variable per task.
    pub ends: Vec<VarId>,
    /// Interval per task.
    pub intervals: Vec<IntervalId>,
    /// The minimized variable (end of the last task in input order).
    pub makespan: VarId,
    /// Upper bound of every start/end domain.
    pub horizon: i64,
}

impl RcpspVariables {
    /// Variables reported in solution snapshots: `start_<i>`, `end_<i>`
    /// per task, then `makespan`.
    pub fn outputs(&self) -> Vec<(String, VarId)> {
        let mut out = Vec::with_capacity(self.starts.len() * 2 + 1);
        for (i, (&start, &end)) in self.starts.iter().zip(&self.ends).enumerate() {
            out.push((format!("start_{i}"), start));
            out.push((format!("end_{i}"), end));
        }
        out.push((MAKESPAN.to_string(), self.makespan));
        out
    }
}

/// Builds a CP model from an RCPSP project.
///
/// # Example
/// ```
/// use u_cpmodel::cp::RcpspCpBuilder;
/// use u_cpmodel::engine::CpModel;
/// use u_cpmodel::models::{RcpspModel, TaskRecord};
///
/// let project = RcpspModel::new()
///     .with_task(TaskRecord::new(2).with_demands(vec![1]))
///     .with_task(TaskRecord::new(3).with_predecessor(0).with_demands(vec![1]))
///     .with_capacities(vec![1]);
///
/// let mut model = CpModel::new("rcpsp");
/// let vars = RcpspCpBuilder::new(&project).build(&mut model).unwrap();
/// assert_eq!(vars.horizon, 5);
/// assert_eq!(model.interval_count(), 2);
/// ```
pub struct RcpspCpBuilder<'a> {
    project: &'a RcpspModel,
}

impl<'a> RcpspCpBuilder<'a> {
    /// Creates a new builder.
    pub fn new(project: &'a RcpspModel) -> Self {
        Self { project }
    }

    /// Adds the project to `model`.
    ///
    /// Creates:
    /// - `start_i`, `end_i` over `[0, horizon]` and an interval of exactly
    ///   `duration` per task
    /// - `end(pred) <= start(task)` per predecessor, in task order
    /// - One cumulative constraint per resource
    /// - Objective: minimize `end` of the last task
    ///
    /// The horizon is the sum of all durations. Validation runs before
    /// anything is added, so on error `model` is untouched.
    pub fn build(&self, model: &mut CpModel) -> Result<RcpspVariables, ModelError> {
        first_violation(validate_rcpsp(self.project))?;

        if let Some(cycle) = detect_cycles(&self.project.tasks) {
            tracing::warn!(reason = %cycle, "precedence graph is cyclic; model will be infeasible");
        }

        let horizon = self.project.horizon().ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::HorizonOverflow,
                "sum of task durations overflows",
            )
        })?;

        let task_count = self.project.task_count();
        let mut starts = Vec::with_capacity(task_count);
        let mut ends = Vec::with_capacity(task_count);
        let mut intervals = Vec::with_capacity(task_count);

        for (i, task) in self.project.tasks.iter().enumerate() {
            let start = model.new_int_var(0, horizon, format!("start_{i}"));
            let end = model.new_int_var(0, horizon, format!("end_{i}"));
            let interval = model.new_interval_var(start, task.duration, end, format!("interval_{i}"));
            starts.push(start);
            ends.push(end);
            intervals.push(interval);
        }

        for (i, task) in self.project.tasks.iter().enumerate() {
            for &pred in &task.predecessors {
                // Indices were range-checked by validation.
                if let Some(&pred_end) = usize::try_from(pred).ok().and_then(|p| ends.get(p)) {
                    model.add_precedence(pred_end, starts[i]);
                }
            }
        }

        for (r, &capacity) in self.project.resource_capacities.iter().enumerate() {
            let demands = self.project.tasks.iter().map(|t| t.demand(r)).collect();
            model.add_cumulative(intervals.clone(), demands, capacity);
        }

        // Last task in input order; validation guarantees one exists.
        let makespan = *ends.last().ok_or_else(|| {
            ValidationError::new(ValidationErrorKind::EmptyModel, "project has no tasks")
        })?;
        model.minimize(LinearExpr::var(makespan));

        tracing::debug!(
            tasks = task_count,
            resources = self.project.resource_count(),
            horizon,
            constraints = model.constraint_count(),
            "rcpsp model built"
        );

        Ok(RcpspVariables {
            starts,
            ends,
            intervals,
            makespan,
            horizon,
        })
    }

    /// Decodes a solution into a checked [`Schedule`].
    ///
    /// Returns an empty schedule when the solution carries no values.
    pub fn decode_schedule(&self, vars: &RcpspVariables, solution: &CpSolution) -> Schedule {
        let mut schedule = Schedule::new();

        if !solution.is_solution_found() {
            return schedule;
        }

        for (i, (&start, &end)) in vars.starts.iter().zip(&vars.ends).enumerate() {
            if let (Some(s), Some(e)) = (solution.value(start), solution.value(end)) {
                schedule.add_slot(TaskSlot::new(i, s, e));
            }
        }

        if !schedule.check(self.project) {
            tracing::error!(
                violations = schedule.violations.len(),
                "decoded schedule violates the project"
            );
        }
        schedule
    }
}
