//! Input validation for parsed models.
//!
//! Checks structural integrity before anything is added to a constraint
//! model. Detects:
//! - Empty projects
//! - Demand vectors that do not match the capacity vector
//! - Out-of-range predecessor references
//! - Negative durations or demands, non-positive capacities
//! - Horizon overflow
//! - Empty domains, duplicate or non-identifier variable names
//!
//! Precedence cycles are reported separately by [`detect_cycles`]: a cyclic
//! project is still a well-formed model, just an infeasible one.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use crate::models::{GenericModel, RcpspModel, TaskRecord};
use std::collections::HashSet;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The project has no tasks.
    EmptyModel,
    /// A demand vector length differs from the capacity vector length.
    ResourceVectorLength,
    /// A predecessor index is outside the task list.
    InvalidPredecessor,
    /// A task has a negative duration.
    NegativeDuration,
    /// A task has a negative resource demand.
    NegativeDemand,
    /// A resource capacity is zero or negative.
    NonPositiveCapacity,
    /// The sum of durations does not fit in `i64`.
    HorizonOverflow,
    /// A variable domain has `lower > upper`.
    InvalidDomain,
    /// Two variables share a name.
    DuplicateVariable,
    /// A variable name is not an identifier token.
    InvalidVariableName,
    /// Precedence graph contains a cycle.
    CyclicDependency,
}

impl ValidationError {
    /// Creates an error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Collapses a result to its first error.
pub fn first_violation(result: ValidationResult) -> Result<(), ValidationError> {
    match result {
        Ok(()) => Ok(()),
        Err(errors) => match errors.into_iter().next() {
            Some(first) => Err(first),
            None => Ok(()),
        },
    }
}

/// Validates an RCPSP project.
///
/// Checks:
/// 1. At least one task
/// 2. All capacities positive
/// 3. Every demand vector has one entry per resource, all non-negative
/// 4. All durations non-negative
/// 5. All predecessor indices in `[0, tasks.len())`
/// 6. The horizon (sum of durations) does not overflow
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues in
/// task order.
pub fn validate_rcpsp(model: &RcpspModel) -> ValidationResult {
    let mut errors = Vec::new();

    if model.tasks.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyModel,
            "project has no tasks",
        ));
    }

    for (r, &capacity) in model.resource_capacities.iter().enumerate() {
        if capacity <= 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveCapacity,
                format!("resource {r} has non-positive capacity {capacity}"),
            ));
        }
    }

    let resource_count = model.resource_count();
    let task_count = model.task_count();

    for (i, task) in model.tasks.iter().enumerate() {
        if task.duration < 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NegativeDuration,
                format!("task {i} has negative duration {}", task.duration),
            ));
        }

        if task.resources.len() != resource_count {
            errors.push(ValidationError::new(
                ValidationErrorKind::ResourceVectorLength,
                format!(
                    "task {i} has {} resource demands but there are {resource_count} resources",
                    task.resources.len()
                ),
            ));
        }

        if let Some(d) = task.resources.iter().find(|d| **d < 0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::NegativeDemand,
                format!("task {i} has negative resource demand {d}"),
            ));
        }

        for &pred in &task.predecessors {
            if usize::try_from(pred).map_or(true, |p| p >= task_count) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidPredecessor,
                    format!("task {i} references unknown predecessor {pred}"),
                ));
            }
        }
    }

    if model.horizon().is_none() {
        errors.push(ValidationError::new(
            ValidationErrorKind::HorizonOverflow,
            "sum of task durations overflows",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a generic model's variable declarations.
///
/// Checks:
/// 1. Every name is an identifier (`[A-Za-z_][A-Za-z0-9_]*`)
/// 2. No duplicate names
/// 3. Every domain has `lower <= upper`
///
/// Constraint and objective text is checked when it is resolved.
pub fn validate_generic(model: &GenericModel) -> ValidationResult {
    let mut errors = Vec::new();
    let mut names = HashSet::new();

    for decl in &model.variables {
        if !is_identifier(&decl.name) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidVariableName,
                format!("variable name '{}' is not an identifier", decl.name),
            ));
        }

        if !names.insert(decl.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateVariable,
                format!("duplicate variable name: {}", decl.name),
            ));
        }

        if decl.lower() > decl.upper() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDomain,
                format!(
                    "variable '{}' has empty domain [{}, {}]",
                    decl.name,
                    decl.lower(),
                    decl.upper()
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Whether `name` is a single identifier token.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Detects cycles in the precedence graph using DFS.
///
/// Out-of-range predecessor indices are ignored.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently on the DFS path), a cycle exists. The path is kept on an
/// explicit stack, so chain length is not bounded by the call stack.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
pub fn detect_cycles(tasks: &[TaskRecord]) -> Option<ValidationError> {
    // Build adjacency list: task → successors
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    for (i, task) in tasks.iter().enumerate() {
        for &pred in &task.predecessors {
            if let Ok(p) = usize::try_from(pred) {
                if p < tasks.len() {
                    adj[p].push(i);
                }
            }
        }
    }

    let mut state = vec![Mark::Unvisited; tasks.len()];
    for root in 0..tasks.len() {
        if state[root] != Mark::Unvisited {
            continue;
        }
        if let Some(node) = find_back_edge(root, &adj, &mut state) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("circular dependency detected involving task {node}"),
            ));
        }
    }

    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Walks everything reachable from `root`. Returns a node on the first
/// cycle found.
fn find_back_edge(root: usize, adj: &[Vec<usize>], state: &mut [Mark]) -> Option<usize> {
    // (node, index of the next successor to visit)
    let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
    state[root] = Mark::OnPath;

    while let Some((node, cursor)) = stack.last_mut() {
        let node = *node;
        match adj[node].get(*cursor) {
            Some(&next) => {
                *cursor += 1;
                match state[next] {
                    Mark::OnPath => return Some(next), // Back edge → cycle
                    Mark::Unvisited => {
                        state[next] = Mark::OnPath;
                        stack.push((next, 0));
                    }
                    Mark::Done => {}
                }
            }
            None => {
                state[node] = Mark::Done;
                stack.pop();
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_project() -> RcpspModel {
        RcpspModel::new()
            .with_task(TaskRecord::new(3).with_demands(vec![1, 0]))
            .with_task(TaskRecord::new(2).with_predecessor(0).with_demands(vec![0, 2]))
            .with_task(TaskRecord::new(4).with_predecessor(1).with_demands(vec![1, 1]))
            .with_capacities(vec![1, 2])
    }

    fn kinds(result: ValidationResult) -> Vec<ValidationErrorKind> {
        result.unwrap_err().into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_valid_project() {
        assert!(validate_rcpsp(&sample_project()).is_ok());
    }

    #[test]
    fn test_empty_project() {
        let model = RcpspModel::new();
        assert_eq!(kinds(validate_rcpsp(&model)), vec![ValidationErrorKind::EmptyModel]);
    }

    #[test]
    fn test_no_resources_is_valid() {
        let model = RcpspModel::new()
            .with_task(TaskRecord::new(1))
            .with_task(TaskRecord::new(2).with_predecessor(0));
        assert!(validate_rcpsp(&model).is_ok());
    }

    #[test]
    fn test_resource_vector_length() {
        let model = sample_project().with_task(TaskRecord::new(1).with_demands(vec![1]));
        assert!(kinds(validate_rcpsp(&model)).contains(&ValidationErrorKind::ResourceVectorLength));
    }

    #[test]
    fn test_invalid_predecessor() {
        let model = sample_project()
            .with_task(TaskRecord::new(1).with_predecessor(7).with_demands(vec![0, 0]))
            .with_task(TaskRecord::new(1).with_predecessor(-1).with_demands(vec![0, 0]));
        let errors = validate_rcpsp(&model).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::InvalidPredecessor));
        assert!(errors[0].message.contains("task 3"));
    }

    #[test]
    fn test_negative_values() {
        let model = RcpspModel::new()
            .with_task(TaskRecord::new(-1).with_demands(vec![-2]))
            .with_capacities(vec![0]);
        let found = kinds(validate_rcpsp(&model));
        assert!(found.contains(&ValidationErrorKind::NegativeDuration));
        assert!(found.contains(&ValidationErrorKind::NegativeDemand));
        assert!(found.contains(&ValidationErrorKind::NonPositiveCapacity));
    }

    #[test]
    fn test_horizon_overflow() {
        let model = RcpspModel::new()
            .with_task(TaskRecord::new(i64::MAX))
            .with_task(TaskRecord::new(i64::MAX));
        assert!(kinds(validate_rcpsp(&model)).contains(&ValidationErrorKind::HorizonOverflow));
    }

    #[test]
    fn test_first_violation() {
        let model = RcpspModel::new()
            .with_task(TaskRecord::new(-1))
            .with_task(TaskRecord::new(1).with_predecessor(5));
        let err = first_violation(validate_rcpsp(&model)).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::NegativeDuration);
        assert!(first_violation(Ok(())).is_ok());
    }

    #[test]
    fn test_generic_valid() {
        let model = GenericModel::new()
            .with_variable("x", 0, 10)
            .with_variable("_y2", -3, -3);
        assert!(validate_generic(&model).is_ok());
    }

    #[test]
    fn test_generic_duplicate_and_domain() {
        let model = GenericModel::new()
            .with_variable("x", 0, 10)
            .with_variable("x", 5, 1);
        let found = kinds(validate_generic(&model));
        assert!(found.contains(&ValidationErrorKind::DuplicateVariable));
        assert!(found.contains(&ValidationErrorKind::InvalidDomain));
    }

    #[test]
    fn test_generic_invalid_names() {
        for name in ["", "1x", "x-y", "a b", "x.y"] {
            let model = GenericModel::new().with_variable(name, 0, 1);
            assert_eq!(
                kinds(validate_generic(&model)),
                vec![ValidationErrorKind::InvalidVariableName],
                "name {name:?}"
            );
        }
    }

    #[test]
    fn test_cyclic_dependency() {
        // 0 → 1 → 2 → 0 (cycle)
        let tasks = vec![
            TaskRecord::new(1).with_predecessor(2),
            TaskRecord::new(1).with_predecessor(0),
            TaskRecord::new(1).with_predecessor(1),
        ];
        let err = detect_cycles(&tasks).unwrap();
        assert_eq!(err.kind, ValidationErrorKind::CyclicDependency);
    }

    #[test]
    fn test_self_loop_is_cycle() {
        let tasks = vec![TaskRecord::new(1).with_predecessor(0)];
        assert!(detect_cycles(&tasks).is_some());
    }

    #[test]
    fn test_no_cycle_in_chain() {
        assert!(detect_cycles(&sample_project().tasks).is_none());
    }

    #[test]
    fn test_long_chain() {
        let n = 200_000;
        let mut tasks: Vec<TaskRecord> = (0..n)
            .map(|i| {
                let task = TaskRecord::new(1);
                if i == 0 { task } else { task.with_predecessor(i as i64 - 1) }
            })
            .collect();
        assert!(detect_cycles(&tasks).is_none());

        // Closing the chain makes it one long cycle.
        tasks[0] = TaskRecord::new(1).with_predecessor(n as i64 - 1);
        let err = detect_cycles(&tasks).unwrap();
        assert_eq!(err.kind, ValidationErrorKind::CyclicDependency);
    }

    #[test]
    fn test_diamond_is_acyclic() {
        // 0 → {1, 2} → 3
        let tasks = vec![
            TaskRecord::new(1),
            TaskRecord::new(1).with_predecessor(0),
            TaskRecord::new(1).with_predecessor(0),
            TaskRecord::new(1).with_predecessor(1).with_predecessor(2),
        ];
        assert!(detect_cycles(&tasks).is_none());
    }
}
