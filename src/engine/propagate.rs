//! Bounds propagation.
//!
//! Every constraint of a [`CpModel`] is compiled into one or more
//! propagators over integer bounds:
//!
//! - `Σ aᵢxᵢ + c ≤ 0` (linear, also used for precedences and interval links)
//! - `Σ aᵢxᵢ + c ≠ 0` (pruned only when a single variable is left unfixed)
//! - cumulative, by time-tabling over compulsory parts
//!
//! Propagation runs to a fixpoint (or a round cap) and reports a
//! [`Conflict`] when a domain becomes empty. Arithmetic is carried out in
//! `i128` so intermediate sums of `i64` bounds cannot wrap.
//!
//! # Reference
//! Baptiste et al. (2001), "Constraint-Based Scheduling", Ch. 2-3
//! (time-table cumulative reasoning)

use std::collections::BTreeMap;

use super::{CpConstraint, CpModel, LinearExpr, RelOp, TypedConstraint};

/// Maximum fixpoint rounds per call. Stopping early only weakens pruning;
/// fully fixed assignments are always checked exactly.
const MAX_ROUNDS: usize = 512;

/// Propagation failure: some variable has an empty domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Conflict;

/// Current bounds of every model variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Domains {
    lo: Vec<i64>,
    hi: Vec<i64>,
}

impl Domains {
    pub(crate) fn from_model(model: &CpModel) -> Self {
        Self {
            lo: model.vars().iter().map(|v| v.min).collect(),
            hi: model.vars().iter().map(|v| v.max).collect(),
        }
    }

    #[inline]
    pub(crate) fn lo(&self, var: usize) -> i64 {
        self.lo[var]
    }

    #[inline]
    pub(crate) fn hi(&self, var: usize) -> i64 {
        self.hi[var]
    }

    pub(crate) fn len(&self) -> usize {
        self.lo.len()
    }

    #[inline]
    pub(crate) fn is_fixed(&self, var: usize) -> bool {
        self.lo[var] == self.hi[var]
    }

    /// Lower bounds, which equal the values once every variable is fixed.
    pub(crate) fn values(&self) -> Vec<i64> {
        self.lo.clone()
    }

    /// Raises the lower bound. Returns whether the domain changed.
    pub(crate) fn tighten_lo(&mut self, var: usize, value: i128) -> Result<bool, Conflict> {
        if value <= self.lo[var] as i128 {
            return Ok(false);
        }
        if value > self.hi[var] as i128 {
            return Err(Conflict);
        }
        self.lo[var] = value as i64;
        Ok(true)
    }

    /// Lowers the upper bound. Returns whether the domain changed.
    pub(crate) fn tighten_hi(&mut self, var: usize, value: i128) -> Result<bool, Conflict> {
        if value >= self.hi[var] as i128 {
            return Ok(false);
        }
        if value < self.lo[var] as i128 {
            return Err(Conflict);
        }
        self.hi[var] = value as i64;
        Ok(true)
    }
}

/// `Σ aᵢxᵢ + c ≤ 0`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LinearLe {
    terms: Vec<(usize, i128)>,
    constant: i128,
}

impl LinearLe {
    /// `expr ≤ 0`.
    fn from_expr(expr: &Difference) -> Self {
        Self {
            terms: expr.terms.iter().map(|(&v, &c)| (v, c)).collect(),
            constant: expr.constant,
        }
    }

    /// `expr ≤ bound`, used for the objective cut.
    pub(crate) fn at_most(expr: &LinearExpr, bound: i128) -> Self {
        Self {
            terms: expr.terms().map(|(v, c)| (v.index(), c as i128)).collect(),
            constant: expr.constant_term() as i128 - bound,
        }
    }

    fn propagate(&self, domains: &mut Domains) -> Result<bool, Conflict> {
        let min_term = |d: &Domains, var: usize, coef: i128| -> i128 {
            if coef > 0 {
                coef.saturating_mul(d.lo(var) as i128)
            } else {
                coef.saturating_mul(d.hi(var) as i128)
            }
        };

        let mut min_sum = self.constant;
        for &(var, coef) in &self.terms {
            min_sum = min_sum.saturating_add(min_term(domains, var, coef));
        }
        if min_sum > 0 {
            return Err(Conflict);
        }

        // Tightening hi of a positive term or lo of a negative term leaves
        // that term's minimum, and therefore `min_sum`, unchanged.
        let mut changed = false;
        for &(var, coef) in &self.terms {
            let slack = min_term(domains, var, coef).saturating_sub(min_sum);
            if coef > 0 {
                changed |= domains.tighten_hi(var, floor_div(slack, coef))?;
            } else {
                changed |= domains.tighten_lo(var, ceil_div(slack, coef))?;
            }
        }
        Ok(changed)
    }
}

/// `Σ aᵢxᵢ + c ≠ 0`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LinearNe {
    terms: Vec<(usize, i128)>,
    constant: i128,
}

impl LinearNe {
    fn propagate(&self, domains: &mut Domains) -> Result<bool, Conflict> {
        let mut rest = self.constant;
        let mut unfixed = None;
        for &(var, coef) in &self.terms {
            if domains.is_fixed(var) {
                rest = rest.saturating_add(coef.saturating_mul(domains.lo(var) as i128));
            } else if unfixed.is_some() {
                return Ok(false);
            } else {
                unfixed = Some((var, coef));
            }
        }

        match unfixed {
            None if rest == 0 => Err(Conflict),
            None => Ok(false),
            Some((var, coef)) => {
                if rest % coef != 0 {
                    return Ok(false);
                }
                let forbidden = -rest / coef;
                if forbidden == domains.lo(var) as i128 {
                    domains.tighten_lo(var, forbidden + 1)
                } else if forbidden == domains.hi(var) as i128 {
                    domains.tighten_hi(var, forbidden - 1)
                } else {
                    Ok(false)
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CumulativeTask {
    start: usize,
    duration: i64,
    demand: i64,
}

/// An elementary time segment `[start, end)` of the resource profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    start: i64,
    end: i64,
    height: i64,
}

/// Time-table cumulative propagator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Cumulative {
    tasks: Vec<CumulativeTask>,
    capacity: i64,
}

impl Cumulative {
    /// Compulsory part `[lst, ect)` of a task, if non-empty.
    fn compulsory_part(task: &CumulativeTask, domains: &Domains) -> Option<(i64, i64)> {
        if task.demand == 0 || task.duration == 0 {
            return None;
        }
        let lst = domains.hi(task.start);
        let ect = domains.lo(task.start).saturating_add(task.duration);
        (lst < ect).then_some((lst, ect))
    }

    /// Elementary segments of positive height, sorted by time.
    fn profile(&self, parts: &[Option<(i64, i64)>]) -> Vec<Segment> {
        let mut events: BTreeMap<i64, i64> = BTreeMap::new();
        for (task, part) in self.tasks.iter().zip(parts) {
            if let Some((a, b)) = part {
                *events.entry(*a).or_insert(0) += task.demand;
                *events.entry(*b).or_insert(0) -= task.demand;
            }
        }

        let mut segments = Vec::new();
        let mut height = 0i64;
        let mut iter = events.iter().peekable();
        while let Some((&time, &delta)) = iter.next() {
            height = height.saturating_add(delta);
            if let Some((&next, _)) = iter.peek() {
                if height > 0 {
                    segments.push(Segment {
                        start: time,
                        end: next,
                        height,
                    });
                }
            }
        }
        segments
    }

    fn propagate(&self, domains: &mut Domains) -> Result<bool, Conflict> {
        let parts: Vec<Option<(i64, i64)>> = self
            .tasks
            .iter()
            .map(|t| Self::compulsory_part(t, domains))
            .collect();
        let profile = self.profile(&parts);

        if profile.iter().any(|s| s.height > self.capacity) {
            return Err(Conflict);
        }

        let mut changed = false;
        for (task, part) in self.tasks.iter().zip(&parts) {
            if task.demand == 0 || task.duration == 0 {
                continue;
            }
            // Segments are elementary, so the task's own compulsory part
            // either covers a segment entirely or not at all.
            let others = |seg: &Segment| match part {
                Some((a, b)) if *a <= seg.start && seg.end <= *b => seg.height - task.demand,
                _ => seg.height,
            };
            // The task overlaps `[seg.start, seg.end)` iff
            // `seg.start - duration < s < seg.end`.
            let overlaps = |s: i64, seg: &Segment| {
                s > seg.start.saturating_sub(task.duration) && s < seg.end
            };

            let mut lo = domains.lo(task.start);
            for seg in &profile {
                if others(seg).saturating_add(task.demand) > self.capacity && overlaps(lo, seg) {
                    lo = seg.end;
                }
            }
            changed |= domains.tighten_lo(task.start, lo as i128)?;

            let mut hi = domains.hi(task.start);
            for seg in profile.iter().rev() {
                if others(seg).saturating_add(task.demand) > self.capacity && overlaps(hi, seg) {
                    hi = seg.start.saturating_sub(task.duration);
                }
            }
            changed |= domains.tighten_hi(task.start, hi as i128)?;
        }
        Ok(changed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Propagator {
    Le(LinearLe),
    Ne(LinearNe),
    Cumulative(Cumulative),
}

impl Propagator {
    fn propagate(&self, domains: &mut Domains) -> Result<bool, Conflict> {
        match self {
            Propagator::Le(p) => p.propagate(domains),
            Propagator::Ne(p) => p.propagate(domains),
            Propagator::Cumulative(p) => p.propagate(domains),
        }
    }
}

/// `lhs - rhs` accumulated in `i128`.
#[derive(Debug, Clone, Default)]
struct Difference {
    terms: BTreeMap<usize, i128>,
    constant: i128,
}

impl Difference {
    fn of(constraint: &TypedConstraint) -> Self {
        let mut diff = Difference::default();
        diff.add(&constraint.lhs, 1);
        diff.add(&constraint.rhs, -1);
        diff
    }

    fn add(&mut self, expr: &LinearExpr, sign: i128) {
        self.constant += sign * expr.constant_term() as i128;
        for (var, coef) in expr.terms() {
            self.add_term(var.index(), sign * coef as i128);
        }
    }

    fn add_term(&mut self, var: usize, coef: i128) {
        let entry = self.terms.entry(var).or_insert(0);
        *entry += coef;
        if *entry == 0 {
            self.terms.remove(&var);
        }
    }

    fn negated(&self) -> Self {
        Self {
            terms: self.terms.iter().map(|(&v, &c)| (v, -c)).collect(),
            constant: -self.constant,
        }
    }

    fn shifted(mut self, delta: i128) -> Self {
        self.constant += delta;
        self
    }
}

/// Compiled propagators of a model.
#[derive(Debug, Clone, Default)]
pub(crate) struct PropagatorSet {
    propagators: Vec<Propagator>,
}

impl PropagatorSet {
    pub(crate) fn compile(model: &CpModel) -> Self {
        let mut propagators = Vec::new();

        for interval in model.intervals() {
            // start + duration - end == 0
            let mut link = Difference::default();
            link.add_term(interval.start.index(), 1);
            link.add_term(interval.end.index(), -1);
            link.constant = interval.duration as i128;
            propagators.push(Propagator::Le(LinearLe::from_expr(&link)));
            propagators.push(Propagator::Le(LinearLe::from_expr(&link.negated())));
        }

        for constraint in model.constraints() {
            match constraint {
                CpConstraint::Linear(c) => {
                    let diff = Difference::of(c);
                    match c.op {
                        RelOp::Le => {
                            propagators.push(Propagator::Le(LinearLe::from_expr(&diff)));
                        }
                        RelOp::Lt => {
                            let strict = diff.shifted(1);
                            propagators.push(Propagator::Le(LinearLe::from_expr(&strict)));
                        }
                        RelOp::Ge => {
                            propagators.push(Propagator::Le(LinearLe::from_expr(&diff.negated())));
                        }
                        RelOp::Gt => {
                            let strict = diff.negated().shifted(1);
                            propagators.push(Propagator::Le(LinearLe::from_expr(&strict)));
                        }
                        RelOp::Eq => {
                            propagators.push(Propagator::Le(LinearLe::from_expr(&diff)));
                            propagators.push(Propagator::Le(LinearLe::from_expr(&diff.negated())));
                        }
                        RelOp::Ne => propagators.push(Propagator::Ne(LinearNe {
                            terms: diff.terms.iter().map(|(&v, &c)| (v, c)).collect(),
                            constant: diff.constant,
                        })),
                    }
                }
                CpConstraint::Precedence {
                    before,
                    after,
                    min_delay,
                } => {
                    let mut diff = Difference::default();
                    diff.add_term(before.index(), 1);
                    diff.add_term(after.index(), -1);
                    diff.constant = *min_delay as i128;
                    propagators.push(Propagator::Le(LinearLe::from_expr(&diff)));
                }
                CpConstraint::Cumulative {
                    intervals,
                    demands,
                    capacity,
                } => {
                    let tasks = intervals
                        .iter()
                        .zip(demands)
                        .filter_map(|(id, &demand)| {
                            model.interval(*id).map(|iv| CumulativeTask {
                                start: iv.start.index(),
                                duration: iv.duration,
                                demand,
                            })
                        })
                        .collect();
                    propagators.push(Propagator::Cumulative(Cumulative {
                        tasks,
                        capacity: *capacity,
                    }));
                }
            }
        }

        Self { propagators }
    }

    pub(crate) fn len(&self) -> usize {
        self.propagators.len()
    }

    /// Propagates to a fixpoint. `cut` is an extra `≤ 0` row (the
    /// objective bound during branch-and-bound).
    pub(crate) fn propagate(
        &self,
        domains: &mut Domains,
        cut: Option<&LinearLe>,
    ) -> Result<(), Conflict> {
        for _ in 0..MAX_ROUNDS {
            let mut changed = false;
            if let Some(cut) = cut {
                changed |= cut.propagate(domains)?;
            }
            for propagator in &self.propagators {
                changed |= propagator.propagate(domains)?;
            }
            if !changed {
                break;
            }
        }
        Ok(())
    }
}

/// Floor division for `i128` with a non-zero divisor.
fn floor_div(n: i128, d: i128) -> i128 {
    let q = n / d;
    if n % d != 0 && ((n < 0) != (d < 0)) {
        q - 1
    } else {
        q
    }
}

/// Ceiling division for `i128` with a non-zero divisor.
fn ceil_div(n: i128, d: i128) -> i128 {
    let q = n / d;
    if n % d != 0 && ((n < 0) == (d < 0)) {
        q + 1
    } else {
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LinearExpr;

    fn le(lhs: LinearExpr, rhs: LinearExpr) -> TypedConstraint {
        TypedConstraint::new(lhs, RelOp::Le, rhs)
    }

    #[test]
    fn test_division_rounding() {
        assert_eq!(floor_div(7, 2), 3);
        assert_eq!(floor_div(-7, 2), -4);
        assert_eq!(floor_div(7, -2), -4);
        assert_eq!(ceil_div(7, 2), 4);
        assert_eq!(ceil_div(-7, 2), -3);
        assert_eq!(ceil_div(7, -2), -3);
        assert_eq!(ceil_div(-7, -2), 4);
        assert_eq!(floor_div(6, 3), 2);
    }

    #[test]
    fn test_linear_bounds() {
        // x + y <= 5, x, y in [2, 10]  →  x, y in [2, 3]
        let mut model = CpModel::new("t");
        let x = model.new_int_var(2, 10, "x");
        let y = model.new_int_var(2, 10, "y");
        let sum = LinearExpr::var(x).checked_add(&LinearExpr::var(y)).unwrap();
        model.add(le(sum, LinearExpr::constant(5)));

        let props = PropagatorSet::compile(&model);
        let mut d = Domains::from_model(&model);
        props.propagate(&mut d, None).unwrap();
        assert_eq!((d.lo(0), d.hi(0)), (2, 3));
        assert_eq!((d.lo(1), d.hi(1)), (2, 3));
    }

    #[test]
    fn test_strict_and_negative_coefficients() {
        // 2x > 3y with y in [2, 2] → x >= 4
        let mut model = CpModel::new("t");
        let x = model.new_int_var(0, 10, "x");
        let y = model.new_int_var(2, 2, "y");
        model.add(TypedConstraint::new(
            LinearExpr::var(x).checked_scale(2).unwrap(),
            RelOp::Gt,
            LinearExpr::var(y).checked_scale(3).unwrap(),
        ));

        let props = PropagatorSet::compile(&model);
        let mut d = Domains::from_model(&model);
        props.propagate(&mut d, None).unwrap();
        assert_eq!(d.lo(x.index()), 4);
        assert_eq!(d.hi(x.index()), 10);
    }

    #[test]
    fn test_equality_fixes() {
        let mut model = CpModel::new("t");
        let x = model.new_int_var(0, 10, "x");
        model.add(TypedConstraint::new(
            LinearExpr::var(x),
            RelOp::Eq,
            LinearExpr::constant(7),
        ));
        let props = PropagatorSet::compile(&model);
        let mut d = Domains::from_model(&model);
        props.propagate(&mut d, None).unwrap();
        assert!(d.is_fixed(0));
        assert_eq!(d.lo(0), 7);
    }

    #[test]
    fn test_not_equal_prunes_bound() {
        let mut model = CpModel::new("t");
        let x = model.new_int_var(0, 3, "x");
        model.add(TypedConstraint::new(
            LinearExpr::var(x),
            RelOp::Ne,
            LinearExpr::constant(0),
        ));
        let props = PropagatorSet::compile(&model);
        let mut d = Domains::from_model(&model);
        props.propagate(&mut d, None).unwrap();
        assert_eq!(d.lo(0), 1);
    }

    #[test]
    fn test_not_equal_conflict_when_fixed() {
        let mut model = CpModel::new("t");
        let x = model.new_int_var(2, 2, "x");
        model.add(TypedConstraint::new(
            LinearExpr::var(x),
            RelOp::Ne,
            LinearExpr::constant(2),
        ));
        let props = PropagatorSet::compile(&model);
        let mut d = Domains::from_model(&model);
        assert_eq!(props.propagate(&mut d, None), Err(Conflict));
    }

    #[test]
    fn test_infeasible_linear() {
        let mut model = CpModel::new("t");
        let x = model.new_int_var(0, 3, "x");
        model.add(le(LinearExpr::constant(5), LinearExpr::var(x)));
        let props = PropagatorSet::compile(&model);
        let mut d = Domains::from_model(&model);
        assert_eq!(props.propagate(&mut d, None), Err(Conflict));
    }

    #[test]
    fn test_interval_link_and_precedence() {
        let mut model = CpModel::new("t");
        let s0 = model.new_int_var(0, 10, "s0");
        let e0 = model.new_int_var(0, 10, "e0");
        let s1 = model.new_int_var(0, 10, "s1");
        let e1 = model.new_int_var(0, 10, "e1");
        model.new_interval_var(s0, 4, e0, "i0");
        model.new_interval_var(s1, 3, e1, "i1");
        model.add_precedence(e0, s1);

        let props = PropagatorSet::compile(&model);
        let mut d = Domains::from_model(&model);
        props.propagate(&mut d, None).unwrap();
        assert_eq!(d.lo(s1.index()), 4);
        assert_eq!(d.lo(e1.index()), 7);
        assert_eq!(d.hi(s0.index()), 3);
        assert_eq!(d.hi(e0.index()), 7);
    }

    #[test]
    fn test_cumulative_pushes_start() {
        // Task A fixed at [0, 4), capacity 1: task B cannot start before 4.
        let mut model = CpModel::new("t");
        let sa = model.new_int_var(0, 0, "sa");
        let ea = model.new_int_var(0, 20, "ea");
        let sb = model.new_int_var(0, 20, "sb");
        let eb = model.new_int_var(0, 20, "eb");
        let a = model.new_interval_var(sa, 4, ea, "a");
        let b = model.new_interval_var(sb, 2, eb, "b");
        model.add_cumulative(vec![a, b], vec![1, 1], 1);

        let props = PropagatorSet::compile(&model);
        let mut d = Domains::from_model(&model);
        props.propagate(&mut d, None).unwrap();
        assert_eq!(d.lo(sb.index()), 4);
        assert_eq!(d.lo(eb.index()), 6);
    }

    #[test]
    fn test_cumulative_respects_capacity_two() {
        let mut model = CpModel::new("t");
        let sa = model.new_int_var(0, 0, "sa");
        let ea = model.new_int_var(0, 20, "ea");
        let sb = model.new_int_var(0, 20, "sb");
        let eb = model.new_int_var(0, 20, "eb");
        let a = model.new_interval_var(sa, 4, ea, "a");
        let b = model.new_interval_var(sb, 2, eb, "b");
        model.add_cumulative(vec![a, b], vec![1, 1], 2);

        let props = PropagatorSet::compile(&model);
        let mut d = Domains::from_model(&model);
        props.propagate(&mut d, None).unwrap();
        assert_eq!(d.lo(sb.index()), 0);
    }

    #[test]
    fn test_cumulative_overload_conflict() {
        let mut model = CpModel::new("t");
        let sa = model.new_int_var(0, 0, "sa");
        let ea = model.new_int_var(0, 20, "ea");
        let sb = model.new_int_var(1, 1, "sb");
        let eb = model.new_int_var(0, 20, "eb");
        let a = model.new_interval_var(sa, 4, ea, "a");
        let b = model.new_interval_var(sb, 2, eb, "b");
        model.add_cumulative(vec![a, b], vec![1, 1], 1);

        let props = PropagatorSet::compile(&model);
        let mut d = Domains::from_model(&model);
        assert_eq!(props.propagate(&mut d, None), Err(Conflict));
    }

    #[test]
    fn test_objective_cut() {
        let mut model = CpModel::new("t");
        let x = model.new_int_var(0, 10, "x");
        let props = PropagatorSet::compile(&model);
        let mut d = Domains::from_model(&model);
        let cut = LinearLe::at_most(&LinearExpr::var(x), 4);
        props.propagate(&mut d, Some(&cut)).unwrap();
        assert_eq!(d.hi(0), 4);
        assert_eq!(props.len(), 0);
    }
}
