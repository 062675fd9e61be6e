//! RCPSP task and project models.
//!
//! A project is a list of non-preemptive tasks and a vector of renewable
//! resource capacities. Tasks are identified by their position in the list.
//!
//! # Reference
//! Kolisch & Sprecher (1997), "PSPLIB - A project scheduling problem library"

use serde::{Deserialize, Serialize};

/// A task of an RCPSP project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Processing time.
    pub duration: i64,
    /// Indices of tasks that must finish before this one starts.
    pub predecessors: Vec<i64>,
    /// Demand on each resource, aligned with the capacity vector.
    pub resources: Vec<i64>,
}

impl TaskRecord {
    /// Creates a task with no predecessors and no demands.
    pub fn new(duration: i64) -> Self {
        Self {
            duration,
            predecessors: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Adds a predecessor index.
    pub fn with_predecessor(mut self, index: i64) -> Self {
        self.predecessors.push(index);
        self
    }

    /// Sets the demand vector.
    pub fn with_demands(mut self, demands: Vec<i64>) -> Self {
        self.resources = demands;
        self
    }

    /// Demand on resource `r` (0 if the vector is short).
    pub fn demand(&self, r: usize) -> i64 {
        self.resources.get(r).copied().unwrap_or(0)
    }
}

/// A resource-constrained project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RcpspModel {
    /// Tasks in input order.
    pub tasks: Vec<TaskRecord>,
    /// Capacity of each renewable resource.
    pub resource_capacities: Vec<i64>,
}

impl RcpspModel {
    /// Creates an empty project.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task.
    pub fn with_task(mut self, task: TaskRecord) -> Self {
        self.tasks.push(task);
        self
    }

    /// Sets the capacity vector.
    pub fn with_capacities(mut self, capacities: Vec<i64>) -> Self {
        self.resource_capacities = capacities;
        self
    }

    /// Number of tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Number of resources.
    pub fn resource_count(&self) -> usize {
        self.resource_capacities.len()
    }

    /// Scheduling horizon: the sum of all durations.
    ///
    /// Running every task back to back is always precedence-feasible
    /// (when the graph is acyclic) and never overloads a resource whose
    /// capacity covers each single demand, so no optimal schedule ends later.
    /// Returns `None` on overflow.
    pub fn horizon(&self) -> Option<i64> {
        self.tasks
            .iter()
            .try_fold(0i64, |acc, t| acc.checked_add(t.duration))
    }
}
