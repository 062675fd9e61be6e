//! Solver interface and the built-in branch-and-bound search.
//!
//! # Algorithm
//!
//! Depth-first search over bounds with propagation at every node:
//!
//! 1. Propagate the node (constraints plus the current objective cut).
//! 2. If every variable is fixed, check the assignment and record it as the
//!    incumbent; tighten the cut to `objective ≤ best - 1` (minimization form).
//! 3. Otherwise pick the unfixed variable with the smallest lower bound
//!    (ties: smallest domain, then rank) and branch `x = lo` / `x ≥ lo + 1`.
//!    A variable whose objective coefficient is negative (minimization
//!    form) branches the other way, `x = hi` / `x ≤ hi - 1`.
//!
//! Choosing the earliest variable first builds schedules left to right,
//! which finds good makespans early. Trying the improving bound first
//! means the first solution already holds every objective variable at
//! its best propagated value.
//!
//! # Reference
//! Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::propagate::{Domains, LinearLe, PropagatorSet};
use super::{CpModel, Sense, VarId};
use crate::error::SolverError;

/// Parameter name for the time limit in seconds.
pub const PARAM_MAX_TIME: &str = "max_time_in_seconds";
/// Parameter name for the search tie-breaking seed.
pub const PARAM_RANDOM_SEED: &str = "random_seed";
/// Parameter name for logging every improving solution at `info`.
pub const PARAM_LOG_PROGRESS: &str = "log_search_progress";

/// Outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// Best solution proven (or first solution of a model without objective).
    Optimal,
    /// A solution was found but the search was cut short.
    Feasible,
    /// The search proved that no solution exists.
    Infeasible,
    /// The search was cut short before any solution was found.
    Unknown,
    /// The model is structurally invalid and was not searched.
    ModelInvalid,
}

impl SolveStatus {
    /// Whether values are available.
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

/// Solver configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverConfig {
    /// Wall-clock limit. `None` = search until proven.
    pub time_limit: Option<Duration>,
    /// Seed for randomized tie-breaking. `None` = creation order.
    pub random_seed: Option<u64>,
    /// Log improving solutions at `info` instead of `debug`.
    pub log_search_progress: bool,
}

impl SolverConfig {
    /// Builds a configuration from named parameters.
    ///
    /// Recognised names are validated; anything else is ignored here and
    /// reported by [`SolverConfig::unrecognized`].
    pub fn from_parameters(params: &BTreeMap<String, Value>) -> Result<Self, SolverError> {
        let mut config = SolverConfig::default();

        if let Some(value) = params.get(PARAM_MAX_TIME) {
            let secs = value
                .as_f64()
                .ok_or_else(|| SolverError::invalid_parameter(PARAM_MAX_TIME, "expected a number"))?;
            config.time_limit = Some(seconds_to_duration(PARAM_MAX_TIME, secs)?);
        }

        if let Some(value) = params.get(PARAM_RANDOM_SEED) {
            let seed = value.as_u64().ok_or_else(|| {
                SolverError::invalid_parameter(PARAM_RANDOM_SEED, "expected a non-negative integer")
            })?;
            config.random_seed = Some(seed);
        }

        if let Some(value) = params.get(PARAM_LOG_PROGRESS) {
            config.log_search_progress = value.as_bool().ok_or_else(|| {
                SolverError::invalid_parameter(PARAM_LOG_PROGRESS, "expected a boolean")
            })?;
        }

        Ok(config)
    }

    /// Parameter names that the solver does not understand.
    pub fn unrecognized(params: &BTreeMap<String, Value>) -> Vec<&str> {
        params
            .keys()
            .map(String::as_str)
            .filter(|k| ![PARAM_MAX_TIME, PARAM_RANDOM_SEED, PARAM_LOG_PROGRESS].contains(k))
            .collect()
    }

    /// Sets the time limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Sets the tie-breaking seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
}

/// Converts a positive, finite number of seconds into a [`Duration`].
pub fn seconds_to_duration(name: &str, secs: f64) -> Result<Duration, SolverError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(SolverError::invalid_parameter(
            name,
            format!("expected a positive number of seconds, got {secs}"),
        ));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| SolverError::invalid_parameter(name, e.to_string()))
}

/// Result of a solve.
#[derive(Debug, Clone, PartialEq)]
pub struct CpSolution {
    /// Outcome.
    pub status: SolveStatus,
    /// One value per model variable (empty unless a solution was found).
    pub values: Vec<i64>,
    /// Objective value of the reported solution.
    pub objective_value: Option<i64>,
    /// Wall-clock time spent.
    pub wall_time: Duration,
    /// Search nodes visited.
    pub branches: u64,
    /// Number of improving solutions found.
    pub solutions: u32,
}

impl CpSolution {
    fn without_values(status: SolveStatus, wall_time: Duration, branches: u64) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: None,
            wall_time,
            branches,
            solutions: 0,
        }
    }

    /// Whether a solution was found.
    pub fn is_solution_found(&self) -> bool {
        self.status.has_solution()
    }

    /// Value of a variable in the reported solution.
    pub fn value(&self, var: VarId) -> Option<i64> {
        self.values.get(var.index()).copied()
    }
}

/// A constraint-programming solving engine.
pub trait CpSolver {
    /// Solves `model` under `config`.
    ///
    /// Infeasibility and time-outs are reported through
    /// [`CpSolution::status`]; `Err` is reserved for engine failures.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> Result<CpSolution, SolverError>;

    /// Engine name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Built-in depth-first branch-and-bound solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchSolver;

impl SearchSolver {
    /// Creates a solver.
    pub fn new() -> Self {
        Self
    }
}

struct Incumbent {
    values: Vec<i64>,
    /// Objective in minimization form.
    score: i128,
}

impl CpSolver for SearchSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> Result<CpSolution, SolverError> {
        let started = Instant::now();

        if let Err(reason) = model.validate() {
            tracing::warn!(model = model.name(), %reason, "model rejected by solver");
            return Ok(CpSolution::without_values(
                SolveStatus::ModelInvalid,
                started.elapsed(),
                0,
            ));
        }

        let propagators = PropagatorSet::compile(model);
        let deadline = config.time_limit.map(|limit| started + limit);

        // Minimization form of the objective: `score = ±expr`.
        let objective = match model.objective() {
            Some(obj) => {
                let expr = match obj.sense {
                    Sense::Minimize => Some(obj.expr.clone()),
                    Sense::Maximize => obj.expr.checked_scale(-1),
                };
                Some(expr.ok_or_else(|| {
                    SolverError::Engine("objective coefficients overflow".to_string())
                })?)
            }
            None => None,
        };

        // Variables that improve the objective by growing.
        let mut prefer_high = vec![false; model.var_count()];
        if let Some(expr) = &objective {
            for (var, coef) in expr.terms() {
                prefer_high[var.index()] = coef < 0;
            }
        }

        let mut ranks: Vec<usize> = (0..model.var_count()).collect();
        if let Some(seed) = config.random_seed {
            ranks.shuffle(&mut StdRng::seed_from_u64(seed));
        }

        tracing::debug!(
            model = model.name(),
            vars = model.var_count(),
            propagators = propagators.len(),
            "search started"
        );

        let mut stack = vec![Domains::from_model(model)];
        let mut incumbent: Option<Incumbent> = None;
        let mut solutions = 0u32;
        let mut branches = 0u64;
        let mut timed_out = false;

        while let Some(mut domains) = stack.pop() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                timed_out = true;
                break;
            }
            branches += 1;

            let cut = match (&objective, &incumbent) {
                (Some(expr), Some(best)) => Some(LinearLe::at_most(expr, best.score - 1)),
                _ => None,
            };
            if propagators.propagate(&mut domains, cut.as_ref()).is_err() {
                continue;
            }

            match select_var(&domains, &ranks) {
                Some(var) => {
                    let mut rest = domains.clone();
                    // `var` is unfixed, so both branches are non-empty.
                    if prefer_high[var] {
                        let hi = domains.hi(var) as i128;
                        let _ = rest.tighten_hi(var, hi - 1);
                        let _ = domains.tighten_lo(var, hi);
                    } else {
                        let lo = domains.lo(var) as i128;
                        let _ = rest.tighten_lo(var, lo + 1);
                        let _ = domains.tighten_hi(var, lo);
                    }
                    stack.push(rest);
                    stack.push(domains);
                }
                None => {
                    let values = domains.values();
                    if let Err(reason) = model.check_assignment(&values) {
                        tracing::error!(%reason, "propagation accepted an invalid assignment");
                        continue;
                    }
                    let score = objective
                        .as_ref()
                        .map(|expr| {
                            expr.terms()
                                .map(|(v, c)| c as i128 * values[v.index()] as i128)
                                .sum::<i128>()
                                + expr.constant_term() as i128
                        })
                        .unwrap_or(0);
                    solutions += 1;
                    if config.log_search_progress {
                        tracing::info!(score, branches, elapsed = ?started.elapsed(), "improving solution");
                    } else {
                        tracing::debug!(score, branches, "improving solution");
                    }
                    incumbent = Some(Incumbent { values, score });
                    if objective.is_none() {
                        break;
                    }
                }
            }
        }

        let status = match (&incumbent, timed_out, objective.is_some()) {
            (Some(_), _, false) => SolveStatus::Optimal,
            (Some(_), false, true) => SolveStatus::Optimal,
            (Some(_), true, true) => SolveStatus::Feasible,
            (None, true, _) => SolveStatus::Unknown,
            (None, false, _) => SolveStatus::Infeasible,
        };

        let wall_time = started.elapsed();
        tracing::debug!(?status, branches, solutions, ?wall_time, "search finished");

        match incumbent {
            Some(best) => {
                let objective_value = match model.objective() {
                    Some(obj) => Some(obj.expr.evaluate(&best.values).ok_or_else(|| {
                        SolverError::Engine("objective value overflows i64".to_string())
                    })?),
                    None => None,
                };
                Ok(CpSolution {
                    status,
                    values: best.values,
                    objective_value,
                    wall_time,
                    branches,
                    solutions,
                })
            }
            None => Ok(CpSolution::without_values(status, wall_time, branches)),
        }
    }

    fn name(&self) -> &'static str {
        "search"
    }
}

/// Unfixed variable with the smallest lower bound, then smallest domain,
/// then smallest rank.
fn select_var(domains: &Domains, ranks: &[usize]) -> Option<usize> {
    (0..domains.len())
        .filter(|&v| !domains.is_fixed(v))
        .min_by_key(|&v| {
            let size = domains.hi(v) as i128 - domains.lo(v) as i128;
            (domains.lo(v), size, ranks[v])
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{LinearExpr, RelOp, TypedConstraint};

    fn sum(a: VarId, b: VarId) -> LinearExpr {
        LinearExpr::var(a).checked_add(&LinearExpr::var(b)).unwrap()
    }

    #[test]
    fn test_maximize_linear() {
        // max x + y s.t. x + y <= 7, x <= 5, x, y in [0, 10]
        let mut model = CpModel::new("max");
        let x = model.new_int_var(0, 10, "x");
        let y = model.new_int_var(0, 10, "y");
        model.add(TypedConstraint::new(sum(x, y), RelOp::Le, LinearExpr::constant(7)));
        model.add(TypedConstraint::new(LinearExpr::var(x), RelOp::Le, LinearExpr::constant(5)));
        model.maximize(sum(x, y));

        let solution = SearchSolver::new().solve(&model, &SolverConfig::default()).unwrap();
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.objective_value, Some(7));
        assert!(solution.value(x).unwrap() <= 5);
        assert!(model.check_assignment(&solution.values).is_ok());
    }

    #[test]
    fn test_satisfaction_stops_at_first_solution() {
        let mut model = CpModel::new("sat");
        let x = model.new_int_var(0, 10, "x");
        model.add(TypedConstraint::new(LinearExpr::var(x), RelOp::Gt, LinearExpr::constant(3)));

        let solution = SearchSolver::new().solve(&model, &SolverConfig::default()).unwrap();
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.value(x), Some(4));
        assert_eq!(solution.objective_value, None);
        assert_eq!(solution.solutions, 1);
    }

    #[test]
    fn test_infeasible() {
        let mut model = CpModel::new("infeasible");
        let x = model.new_int_var(0, 3, "x");
        let y = model.new_int_var(0, 3, "y");
        model.add(TypedConstraint::new(sum(x, y), RelOp::Ge, LinearExpr::constant(7)));
        model.minimize(LinearExpr::var(x));

        let solution = SearchSolver::new().solve(&model, &SolverConfig::default()).unwrap();
        assert_eq!(solution.status, SolveStatus::Infeasible);
        assert!(solution.values.is_empty());
        assert!(!solution.is_solution_found());
    }

    #[test]
    fn test_not_equal_search() {
        // x != y, x == y is forced out by search
        let mut model = CpModel::new("ne");
        let x = model.new_int_var(0, 1, "x");
        let y = model.new_int_var(0, 1, "y");
        model.add(TypedConstraint::new(LinearExpr::var(x), RelOp::Ne, LinearExpr::var(y)));
        model.minimize(sum(x, y));

        let solution = SearchSolver::new().solve(&model, &SolverConfig::default()).unwrap();
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.objective_value, Some(1));
        assert_ne!(solution.value(x), solution.value(y));
    }

    #[test]
    fn test_invalid_model_status() {
        let mut model = CpModel::new("invalid");
        model.new_int_var(3, 1, "x");
        let solution = SearchSolver::new().solve(&model, &SolverConfig::default()).unwrap();
        assert_eq!(solution.status, SolveStatus::ModelInvalid);
    }

    #[test]
    fn test_empty_model_is_optimal() {
        let model = CpModel::new("empty");
        let solution = SearchSolver::new().solve(&model, &SolverConfig::default()).unwrap();
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_seed_does_not_change_optimum() {
        let mut model = CpModel::new("seeded");
        let x = model.new_int_var(0, 9, "x");
        let y = model.new_int_var(0, 9, "y");
        model.add(TypedConstraint::new(sum(x, y), RelOp::Eq, LinearExpr::constant(9)));
        model.minimize(
            LinearExpr::var(x)
                .checked_scale(2)
                .unwrap()
                .checked_add(&LinearExpr::var(y))
                .unwrap(),
        );

        let config = SolverConfig::default().with_random_seed(42);
        let solution = SearchSolver::new().solve(&model, &config).unwrap();
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.objective_value, Some(9));
        assert_eq!(solution.value(x), Some(0));
    }

    #[test]
    fn test_maximize_tries_upper_bound_first() {
        let mut model = CpModel::new("wide");
        let x = model.new_int_var(0, 1_000_000_000, "x");
        model.maximize(LinearExpr::var(x));

        let config = SolverConfig::default().with_time_limit(Duration::from_secs(10));
        let solution = SearchSolver::new().solve(&model, &config).unwrap();
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.objective_value, Some(1_000_000_000));
        assert_eq!(solution.solutions, 1);
    }

    #[test]
    fn test_minimize_negative_coefficient() {
        // min 5 - y over a wide domain: y goes to its upper bound at once
        let mut model = CpModel::new("wide-min");
        let y = model.new_int_var(-1_000_000_000, 1_000_000_000, "y");
        model.minimize(
            LinearExpr::constant(5)
                .checked_sub(&LinearExpr::var(y))
                .unwrap(),
        );

        let config = SolverConfig::default().with_time_limit(Duration::from_secs(10));
        let solution = SearchSolver::new().solve(&model, &config).unwrap();
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.value(y), Some(1_000_000_000));
        assert_eq!(solution.solutions, 1);
    }

    /// `max x` with `x <= 2y`: the search fixes `y` low first, so each
    /// improving solution raises `x` by at most two.
    fn slow_to_prove() -> (CpModel, VarId) {
        let mut model = CpModel::new("slow");
        let x = model.new_int_var(0, 2_000_000_000, "x");
        let y = model.new_int_var(0, 1_000_000_000, "y");
        let two_y = LinearExpr::var(y).checked_scale(2).unwrap();
        model.add(TypedConstraint::new(LinearExpr::var(x), RelOp::Le, two_y));
        model.maximize(LinearExpr::var(x));
        (model, x)
    }

    /// Thirteen pairwise-distinct variables over twelve values.
    fn pigeonhole() -> CpModel {
        let mut model = CpModel::new("pigeonhole");
        let vars: Vec<VarId> = (0..13)
            .map(|i| model.new_int_var(0, 11, format!("p{i}")))
            .collect();
        for (i, &a) in vars.iter().enumerate() {
            for &b in &vars[i + 1..] {
                model.add(TypedConstraint::new(LinearExpr::var(a), RelOp::Ne, LinearExpr::var(b)));
            }
        }
        model
    }

    #[test]
    fn test_time_limit_with_incumbent_is_feasible() {
        let (model, x) = slow_to_prove();
        let config = SolverConfig::default().with_time_limit(Duration::from_millis(200));
        let solution = SearchSolver::new().solve(&model, &config).unwrap();

        assert_eq!(solution.status, SolveStatus::Feasible);
        assert!(solution.is_solution_found());
        assert!(solution.solutions >= 1);
        assert_eq!(solution.objective_value, solution.value(x));
        assert!(model.check_assignment(&solution.values).is_ok());
    }

    #[test]
    fn test_time_limit_without_solution_is_unknown() {
        let model = pigeonhole();
        let config = SolverConfig::default().with_time_limit(Duration::from_millis(50));
        let solution = SearchSolver::new().solve(&model, &config).unwrap();

        assert_eq!(solution.status, SolveStatus::Unknown);
        assert!(solution.values.is_empty());
        assert_eq!(solution.objective_value, None);
        assert!(solution.wall_time >= Duration::from_millis(50));
    }

    #[test]
    fn test_config_from_parameters() {
        let mut params = BTreeMap::new();
        params.insert(PARAM_MAX_TIME.to_string(), Value::from(2.5));
        params.insert(PARAM_RANDOM_SEED.to_string(), Value::from(7));
        params.insert(PARAM_LOG_PROGRESS.to_string(), Value::from(true));
        params.insert("num_workers".to_string(), Value::from(8));

        let config = SolverConfig::from_parameters(&params).unwrap();
        assert_eq!(config.time_limit, Some(Duration::from_millis(2500)));
        assert_eq!(config.random_seed, Some(7));
        assert!(config.log_search_progress);
        assert_eq!(SolverConfig::unrecognized(&params), vec!["num_workers"]);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let mut params = BTreeMap::new();
        params.insert(PARAM_MAX_TIME.to_string(), Value::from("soon"));
        assert!(matches!(
            SolverConfig::from_parameters(&params),
            Err(SolverError::InvalidParameter { .. })
        ));

        params.insert(PARAM_MAX_TIME.to_string(), Value::from(-1.0));
        assert!(SolverConfig::from_parameters(&params).is_err());

        let mut params = BTreeMap::new();
        params.insert(PARAM_RANDOM_SEED.to_string(), Value::from(-3));
        assert!(SolverConfig::from_parameters(&params).is_err());
    }
}
