//! Solving session.
//!
//! A session owns at most one active constraint model, the solver
//! parameters, and the snapshot of the last solve. Submitting a model
//! replaces the previous one wholesale.
//!
//! # Lifecycle
//!
//! ```text
//! submit ──parse ok──▶ clear ──▶ build ──ok──▶ active model
//!    │                             └──err──▶ no model
//!    └──parse err──▶ previous model and snapshot untouched
//!
//! solve ──▶ snapshot cached until the next solve or submit
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

use crate::cp::{GenericCpBuilder, RcpspCpBuilder, RcpspVariables};
use crate::engine::{
    seconds_to_duration, CpModel, CpSolution, CpSolver, SearchSolver, SolverConfig, VarId,
};
use crate::error::{ModelError, SolverError};
use crate::models::{RcpspModel, Schedule, SolutionSnapshot};
use crate::parser::{parse_model, parse_model_value, ModelDefinition};

/// What was built for the active model.
enum Formulation {
    Generic,
    Rcpsp {
        project: RcpspModel,
        vars: RcpspVariables,
    },
}

struct ActiveModel {
    model: CpModel,
    outputs: Vec<(String, VarId)>,
    formulation: Formulation,
}

/// A single-model solving session.
pub struct SolvingSession<S: CpSolver = SearchSolver> {
    solver: S,
    active: Option<ActiveModel>,
    parameters: BTreeMap<String, Value>,
    default_time_limit: Option<Duration>,
    last_solution: Option<SolutionSnapshot>,
    last_raw: Option<CpSolution>,
}

impl Default for SolvingSession<SearchSolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl SolvingSession<SearchSolver> {
    /// Creates a session backed by the built-in search solver.
    pub fn new() -> Self {
        Self::with_solver(SearchSolver::new())
    }
}

impl<S: CpSolver> SolvingSession<S> {
    /// Creates a session backed by `solver`.
    pub fn with_solver(solver: S) -> Self {
        Self {
            solver,
            active: None,
            parameters: BTreeMap::new(),
            default_time_limit: None,
            last_solution: None,
            last_raw: None,
        }
    }

    /// Sets the time limit used when neither the request nor the
    /// `max_time_in_seconds` parameter gives one.
    pub fn with_default_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.default_time_limit = limit;
        self
    }

    /// The solving engine.
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Submits model text of either kind.
    ///
    /// A parse failure leaves the session untouched. Once parsing
    /// succeeds the session is cleared; a build failure then leaves it
    /// with no active model.
    pub fn submit(&mut self, text: &str) -> Result<(), ModelError> {
        let definition = parse_model(text)?;
        self.install(definition)
    }

    /// Submits an already-decoded model.
    pub fn submit_value(&mut self, value: Value) -> Result<(), ModelError> {
        let definition = parse_model_value(value)?;
        self.install(definition)
    }

    fn install(&mut self, definition: ModelDefinition) -> Result<(), ModelError> {
        self.clear();

        let kind = definition.kind();
        let mut model = CpModel::new(kind);
        let (outputs, formulation) = match definition {
            ModelDefinition::Generic(def) => {
                let vars = GenericCpBuilder::new(&def).build(&mut model)?;
                (vars.outputs(), Formulation::Generic)
            }
            ModelDefinition::Rcpsp(project) => {
                let vars = RcpspCpBuilder::new(&project).build(&mut model)?;
                (vars.outputs(), Formulation::Rcpsp { project, vars })
            }
        };

        tracing::info!(
            kind,
            variables = model.var_count(),
            intervals = model.interval_count(),
            constraints = model.constraint_count(),
            "model submitted"
        );

        self.active = Some(ActiveModel {
            model,
            outputs,
            formulation,
        });
        Ok(())
    }

    /// Drops the active model and the cached solution. Parameters are kept.
    pub fn clear(&mut self) {
        self.active = None;
        self.last_solution = None;
        self.last_raw = None;
    }

    /// Whether a model is loaded.
    pub fn has_model(&self) -> bool {
        self.active.is_some()
    }

    /// The active constraint model.
    pub fn model(&self) -> Option<&CpModel> {
        self.active.as_ref().map(|a| &a.model)
    }

    /// Sets a solver parameter.
    ///
    /// Recognised parameters are validated here; unrecognised names are
    /// stored and reported when solving.
    pub fn set_parameter(&mut self, name: &str, value: Value) -> Result<(), SolverError> {
        let mut candidate = self.parameters.clone();
        candidate.insert(name.to_string(), value);
        SolverConfig::from_parameters(&candidate)?;
        self.parameters = candidate;
        Ok(())
    }

    /// Current parameters.
    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    /// Solves the active model.
    ///
    /// `timeout` (seconds) overrides the `max_time_in_seconds` parameter,
    /// which overrides the session default.
    pub fn solve(&mut self, timeout: Option<f64>) -> Result<SolutionSnapshot, SolverError> {
        let active = self.active.as_ref().ok_or(SolverError::NoModel)?;
        let config = self.solver_config(timeout)?;

        for name in SolverConfig::unrecognized(&self.parameters) {
            tracing::warn!(parameter = name, "ignoring unrecognized solver parameter");
        }

        tracing::debug!(
            solver = self.solver.name(),
            time_limit = ?config.time_limit,
            seed = ?config.random_seed,
            "solving"
        );
        let solution = self.solver.solve(&active.model, &config)?;
        let solve_time = solution.wall_time.as_secs_f64();

        let snapshot = if solution.is_solution_found() {
            let mut snapshot = SolutionSnapshot::empty(solution.status, solve_time);
            for (name, var) in &active.outputs {
                if let Some(value) = solution.value(*var) {
                    snapshot.variables.insert(name.clone(), value);
                }
            }
            snapshot.objective_value = solution.objective_value;
            snapshot
        } else {
            SolutionSnapshot::empty(solution.status, solve_time)
        };

        tracing::info!(
            status = ?snapshot.status,
            objective = ?snapshot.objective_value,
            solve_time,
            branches = solution.branches,
            "solve finished"
        );

        self.last_raw = Some(solution);
        self.last_solution = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Solver configuration for a solve with the given request timeout.
    pub(crate) fn solver_config(&self, timeout: Option<f64>) -> Result<SolverConfig, SolverError> {
        let mut config = SolverConfig::from_parameters(&self.parameters)?;
        if let Some(secs) = timeout {
            config.time_limit = Some(seconds_to_duration("timeout", secs)?);
        } else if config.time_limit.is_none() {
            config.time_limit = self.default_time_limit;
        }
        Ok(config)
    }

    /// Snapshot of the last solve.
    pub fn last_solution(&self) -> Option<&SolutionSnapshot> {
        self.last_solution.as_ref()
    }

    /// Decoded schedule of the last solve, for RCPSP models.
    pub fn schedule(&self) -> Option<Schedule> {
        let active = self.active.as_ref()?;
        let raw = self.last_raw.as_ref()?;
        match &active.formulation {
            Formulation::Rcpsp { project, vars } => {
                Some(RcpspCpBuilder::new(project).decode_schedule(vars, raw))
            }
            Formulation::Generic => None,
        }
    }
}
