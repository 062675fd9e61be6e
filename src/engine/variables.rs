//! CP variable types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to an integer variable inside a [`CpModel`](super::CpModel).
///
/// Handles are dense indices; they are only meaningful for the model
/// that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Position of the variable in its model.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Handle to an interval variable inside a [`CpModel`](super::CpModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IntervalId(pub(crate) usize);

impl IntervalId {
    /// Position of the interval in its model.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// An integer variable with a domain [min, max].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntVar {
    /// Variable name (diagnostics only; uniqueness is not enforced here).
    pub name: String,
    /// Minimum value.
    pub min: i64,
    /// Maximum value.
    pub max: i64,
}

impl IntVar {
    /// Creates a new integer variable with the given bounds.
    pub fn new(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }

    /// Whether this variable is fixed to a single value.
    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    /// Domain size (max - min + 1), saturating on huge domains.
    pub fn domain_size(&self) -> u64 {
        (self.max as i128 - self.min as i128 + 1).clamp(0, u64::MAX as i128) as u64
    }
}

/// An interval variable representing an activity with start, end, and duration.
///
/// The invariant `end = start + duration` is enforced by the solver.
/// Intervals here are always present and have a fixed duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalVar {
    /// Interval name.
    pub name: String,
    /// Start time variable.
    pub start: VarId,
    /// End time variable.
    pub end: VarId,
    /// Fixed duration.
    pub duration: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_var() {
        let v = IntVar::new("x", 0, 10);
        assert_eq!(v.domain_size(), 11);
        assert!(!v.is_fixed());

        let f = IntVar::new("y", 5, 5);
        assert!(f.is_fixed());
        assert_eq!(f.domain_size(), 1);
    }

    #[test]
    fn test_empty_domain_size() {
        let v = IntVar::new("bad", 3, 1);
        assert_eq!(v.domain_size(), 0);
    }

    #[test]
    fn test_huge_domain_saturates() {
        let v = IntVar::new("wide", i64::MIN, i64::MAX);
        assert_eq!(v.domain_size(), u64::MAX);
    }

    #[test]
    fn test_var_id_display() {
        assert_eq!(VarId(3).to_string(), "v3");
        assert_eq!(VarId(3).index(), 3);
    }
}
