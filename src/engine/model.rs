//! Constraint model container.

use serde::{Deserialize, Serialize};

use super::{IntVar, IntervalId, IntervalVar, LinearExpr, TypedConstraint, VarId};

/// A constraint posted to a [`CpModel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpConstraint {
    /// Relational constraint between two linear expressions.
    Linear(TypedConstraint),

    /// `before + min_delay <= after`.
    Precedence {
        before: VarId,
        after: VarId,
        min_delay: i64,
    },

    /// At every instant, the demands of the intervals executing at that
    /// instant sum to at most `capacity`.
    Cumulative {
        intervals: Vec<IntervalId>,
        demands: Vec<i64>,
        capacity: i64,
    },
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// Objective function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    /// Expression to optimize.
    pub expr: LinearExpr,
    /// Direction.
    pub sense: Sense,
}

/// A constraint model: variables, intervals, constraints and an optional
/// objective.
///
/// Models are append-only. Replacing a model means building a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpModel {
    name: String,
    vars: Vec<IntVar>,
    intervals: Vec<IntervalVar>,
    constraints: Vec<CpConstraint>,
    objective: Option<Objective>,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates an integer variable over `[min, max]`.
    pub fn new_int_var(&mut self, min: i64, max: i64, name: impl Into<String>) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(IntVar::new(name, min, max));
        id
    }

    /// Creates a fixed-duration interval linking `start` and `end`
    /// (`end = start + duration`).
    pub fn new_interval_var(
        &mut self,
        start: VarId,
        duration: i64,
        end: VarId,
        name: impl Into<String>,
    ) -> IntervalId {
        let id = IntervalId(self.intervals.len());
        self.intervals.push(IntervalVar {
            name: name.into(),
            start,
            end,
            duration,
        });
        id
    }

    /// Adds a relational constraint.
    pub fn add(&mut self, constraint: TypedConstraint) {
        self.constraints.push(CpConstraint::Linear(constraint));
    }

    /// Adds `before <= after`.
    pub fn add_precedence(&mut self, before: VarId, after: VarId) {
        self.add_precedence_with_delay(before, after, 0);
    }

    /// Adds `before + min_delay <= after`.
    pub fn add_precedence_with_delay(&mut self, before: VarId, after: VarId, min_delay: i64) {
        self.constraints.push(CpConstraint::Precedence {
            before,
            after,
            min_delay,
        });
    }

    /// Adds a cumulative resource constraint.
    pub fn add_cumulative(&mut self, intervals: Vec<IntervalId>, demands: Vec<i64>, capacity: i64) {
        self.constraints.push(CpConstraint::Cumulative {
            intervals,
            demands,
            capacity,
        });
    }

    /// Sets the objective to minimize `expr`, replacing any previous one.
    pub fn minimize(&mut self, expr: LinearExpr) {
        self.objective = Some(Objective {
            expr,
            sense: Sense::Minimize,
        });
    }

    /// Sets the objective to maximize `expr`, replacing any previous one.
    pub fn maximize(&mut self, expr: LinearExpr) {
        self.objective = Some(Objective {
            expr,
            sense: Sense::Maximize,
        });
    }

    /// Variable by handle.
    pub fn var(&self, id: VarId) -> Option<&IntVar> {
        self.vars.get(id.0)
    }

    /// Interval by handle.
    pub fn interval(&self, id: IntervalId) -> Option<&IntervalVar> {
        self.intervals.get(id.0)
    }

    /// All variables in creation order.
    pub fn vars(&self) -> &[IntVar] {
        &self.vars
    }

    /// All intervals in creation order.
    pub fn intervals(&self) -> &[IntervalVar] {
        &self.intervals
    }

    /// All constraints in posting order.
    pub fn constraints(&self) -> &[CpConstraint] {
        &self.constraints
    }

    /// The objective, if any.
    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// Number of integer variables.
    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// Number of interval variables.
    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    /// Number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Checks structural well-formedness.
    ///
    /// Returns the first problem found. A model that fails this check is
    /// reported as `MODEL_INVALID` by the solver rather than searched.
    pub fn validate(&self) -> Result<(), String> {
        for var in &self.vars {
            if var.min > var.max {
                return Err(format!(
                    "variable '{}' has empty domain [{}, {}]",
                    var.name, var.min, var.max
                ));
            }
        }

        for interval in &self.intervals {
            if interval.duration < 0 {
                return Err(format!(
                    "interval '{}' has negative duration {}",
                    interval.name, interval.duration
                ));
            }
            self.check_var(interval.start, &interval.name)?;
            self.check_var(interval.end, &interval.name)?;
        }

        for constraint in &self.constraints {
            match constraint {
                CpConstraint::Linear(c) => {
                    for (var, _) in c.lhs.terms().chain(c.rhs.terms()) {
                        self.check_var(var, "linear constraint")?;
                    }
                }
                CpConstraint::Precedence { before, after, .. } => {
                    self.check_var(*before, "precedence")?;
                    self.check_var(*after, "precedence")?;
                }
                CpConstraint::Cumulative {
                    intervals,
                    demands,
                    capacity,
                } => {
                    if intervals.len() != demands.len() {
                        return Err(format!(
                            "cumulative has {} intervals but {} demands",
                            intervals.len(),
                            demands.len()
                        ));
                    }
                    if *capacity < 0 {
                        return Err(format!("cumulative has negative capacity {capacity}"));
                    }
                    if let Some(d) = demands.iter().find(|d| **d < 0) {
                        return Err(format!("cumulative has negative demand {d}"));
                    }
                    if let Some(i) = intervals.iter().find(|i| i.0 >= self.intervals.len()) {
                        return Err(format!("cumulative references unknown interval {}", i.0));
                    }
                }
            }
        }

        if let Some(objective) = &self.objective {
            for (var, _) in objective.expr.terms() {
                self.check_var(var, "objective")?;
            }
        }

        Ok(())
    }

    /// Checks a full assignment (one value per variable, in creation
    /// order) against every domain, interval and constraint.
    pub fn check_assignment(&self, values: &[i64]) -> Result<(), String> {
        if values.len() != self.vars.len() {
            return Err(format!(
                "expected {} values, got {}",
                self.vars.len(),
                values.len()
            ));
        }
        for (var, &value) in self.vars.iter().zip(values) {
            if value < var.min || value > var.max {
                return Err(format!(
                    "variable '{}' = {value} outside [{}, {}]",
                    var.name, var.min, var.max
                ));
            }
        }
        for interval in &self.intervals {
            let start = values[interval.start.0] as i128;
            let end = values[interval.end.0] as i128;
            if start + interval.duration as i128 != end {
                return Err(format!(
                    "interval '{}' spans [{start}, {end}) but has duration {}",
                    interval.name, interval.duration
                ));
            }
        }
        for constraint in &self.constraints {
            match constraint {
                CpConstraint::Linear(c) => {
                    if !c.is_satisfied(values) {
                        return Err(format!("violated: {c}"));
                    }
                }
                CpConstraint::Precedence {
                    before,
                    after,
                    min_delay,
                } => {
                    let lhs = values[before.0] as i128 + *min_delay as i128;
                    if lhs > values[after.0] as i128 {
                        return Err(format!("violated precedence {before} -> {after}"));
                    }
                }
                CpConstraint::Cumulative {
                    intervals,
                    demands,
                    capacity,
                } => {
                    let mut events: Vec<(i64, i64)> = Vec::new();
                    for (id, &demand) in intervals.iter().zip(demands) {
                        let iv = &self.intervals[id.0];
                        if iv.duration > 0 && demand > 0 {
                            events.push((values[iv.start.0], demand));
                            events.push((values[iv.end.0], -demand));
                        }
                    }
                    // Releases sort before acquisitions at the same instant.
                    events.sort();
                    let mut load = 0i128;
                    for (time, delta) in events {
                        load += delta as i128;
                        if load > *capacity as i128 {
                            return Err(format!(
                                "cumulative load {load} exceeds capacity {capacity} at t={time}"
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn check_var(&self, var: VarId, owner: &str) -> Result<(), String> {
        if var.0 < self.vars.len() {
            Ok(())
        } else {
            Err(format!("{owner} references unknown variable {var}"))
        }
    }
}
