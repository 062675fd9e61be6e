//! Schedule (decoded RCPSP solution).
//!
//! A schedule fixes a start and end time for every task. It may carry
//! violations when checked against a project it does not satisfy.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use serde::{Deserialize, Serialize};

use super::RcpspModel;

/// A complete schedule: one time slot per task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Task slots, indexed by task.
    pub slots: Vec<TaskSlot>,
    /// Constraint violations detected in this schedule.
    pub violations: Vec<Violation>,
}

/// Execution window `[start, end)` of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSlot {
    /// Task index.
    pub task: usize,
    /// Start time.
    pub start: i64,
    /// End time (exclusive).
    pub end: i64,
}

/// A constraint violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related entity (`task_<i>` or `resource_<r>`).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of constraint violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Resource allocated beyond its capacity.
    CapacityExceeded,
    /// Task started before a predecessor finished.
    PrecedenceViolation,
    /// Task window does not match its duration.
    DurationMismatch,
}

impl TaskSlot {
    /// Creates a slot.
    pub fn new(task: usize, start: i64, end: i64) -> Self {
        Self { task, start, end }
    }

    /// Length of the slot.
    #[inline]
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// Whether the task runs at instant `t`.
    #[inline]
    pub fn covers(&self, t: i64) -> bool {
        self.start <= t && t < self.end
    }
}

impl Violation {
    /// Creates a capacity exceeded violation.
    pub fn capacity_exceeded(resource: usize, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::CapacityExceeded,
            entity_id: format!("resource_{resource}"),
            message: message.into(),
            severity: 90,
        }
    }

    /// Creates a precedence violation.
    pub fn precedence_violation(task: usize, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::PrecedenceViolation,
            entity_id: format!("task_{task}"),
            message: message.into(),
            severity: 95,
        }
    }

    /// Creates a duration mismatch violation.
    pub fn duration_mismatch(task: usize, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::DurationMismatch,
            entity_id: format!("task_{task}"),
            message: message.into(),
            severity: 100,
        }
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a slot.
    pub fn add_slot(&mut self, slot: TaskSlot) {
        self.slots.push(slot);
    }

    /// Adds a violation.
    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Whether the schedule has no violations.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Makespan: latest end time across all slots.
    pub fn makespan(&self) -> i64 {
        self.slots.iter().map(|s| s.end).max().unwrap_or(0)
    }

    /// Slot of a given task.
    pub fn slot(&self, task: usize) -> Option<&TaskSlot> {
        self.slots.iter().find(|s| s.task == task)
    }

    /// Load on resource `r` at instant `t`.
    pub fn load_at(&self, project: &RcpspModel, r: usize, t: i64) -> i64 {
        self.slots
            .iter()
            .filter(|s| s.covers(t))
            .filter_map(|s| project.tasks.get(s.task))
            .map(|task| task.demand(r))
            .sum()
    }

    /// Peak load on resource `r` over the whole schedule.
    ///
    /// Load only changes at slot starts, so those are the only instants
    /// that need checking.
    pub fn peak_usage(&self, project: &RcpspModel, r: usize) -> i64 {
        self.slots
            .iter()
            .map(|s| self.load_at(project, r, s.start))
            .max()
            .unwrap_or(0)
    }

    /// Re-derives the violations of this schedule against `project`.
    ///
    /// Checks durations, precedences and resource capacities. Returns
    /// whether the schedule is valid.
    pub fn check(&mut self, project: &RcpspModel) -> bool {
        self.violations.clear();

        for (i, task) in project.tasks.iter().enumerate() {
            let Some(slot) = self.slot(i).copied() else {
                continue;
            };
            if slot.duration() != task.duration {
                self.add_violation(Violation::duration_mismatch(
                    i,
                    format!(
                        "task {i} spans {} but has duration {}",
                        slot.duration(),
                        task.duration
                    ),
                ));
            }
            for &pred in &task.predecessors {
                let pred_end = usize::try_from(pred)
                    .ok()
                    .and_then(|p| self.slot(p))
                    .map(|s| s.end);
                if let Some(end) = pred_end.filter(|&end| end > slot.start) {
                    self.add_violation(Violation::precedence_violation(
                        i,
                        format!("task {i} starts at {} before task {pred} ends at {end}", slot.start),
                    ));
                }
            }
        }

        for (r, &capacity) in project.resource_capacities.iter().enumerate() {
            let peak = self.peak_usage(project, r);
            if peak > capacity {
                self.add_violation(Violation::capacity_exceeded(
                    r,
                    format!("resource {r} peak usage {peak} exceeds capacity {capacity}"),
                ));
            }
        }

        self.is_valid()
    }

    /// Number of slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}
