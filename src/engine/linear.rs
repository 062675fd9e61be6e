//! Linear expressions and relational constraints.
//!
//! A [`LinearExpr`] is `Σ coef·var + constant` over model variables. All
//! arithmetic is checked: combining expressions returns `None` on `i64`
//! overflow instead of wrapping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::VarId;

/// A linear combination of integer variables plus a constant.
///
/// Terms with a zero coefficient are never stored, so two expressions that
/// denote the same function compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearExpr {
    terms: BTreeMap<VarId, i64>,
    constant: i64,
}

impl LinearExpr {
    /// The zero expression.
    pub fn zero() -> Self {
        Self::default()
    }

    /// A constant expression.
    pub fn constant(value: i64) -> Self {
        Self {
            terms: BTreeMap::new(),
            constant: value,
        }
    }

    /// A single variable with coefficient 1.
    pub fn var(var: VarId) -> Self {
        let mut terms = BTreeMap::new();
        terms.insert(var, 1);
        Self { terms, constant: 0 }
    }

    /// The constant part.
    pub fn constant_term(&self) -> i64 {
        self.constant
    }

    /// Coefficient of `var` (0 if absent).
    pub fn coefficient(&self, var: VarId) -> i64 {
        self.terms.get(&var).copied().unwrap_or(0)
    }

    /// Non-zero terms in variable order.
    pub fn terms(&self) -> impl Iterator<Item = (VarId, i64)> + '_ {
        self.terms.iter().map(|(&v, &c)| (v, c))
    }

    /// Number of non-zero terms.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Whether the expression has no variable terms.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// `self + other`.
    pub fn checked_add(&self, other: &LinearExpr) -> Option<LinearExpr> {
        let mut out = self.clone();
        out.accumulate(other, 1)?;
        Some(out)
    }

    /// `self += factor · other`, in place.
    ///
    /// On overflow returns `None` and leaves `self` partially updated.
    pub fn accumulate(&mut self, other: &LinearExpr, factor: i64) -> Option<()> {
        let scaled = other.constant.checked_mul(factor)?;
        self.constant = self.constant.checked_add(scaled)?;
        for (&var, &coef) in &other.terms {
            let merged = self.coefficient(var).checked_add(coef.checked_mul(factor)?)?;
            if merged == 0 {
                self.terms.remove(&var);
            } else {
                self.terms.insert(var, merged);
            }
        }
        Some(())
    }

    /// `self - other`.
    pub fn checked_sub(&self, other: &LinearExpr) -> Option<LinearExpr> {
        self.checked_add(&other.checked_scale(-1)?)
    }

    /// `factor · self`.
    pub fn checked_scale(&self, factor: i64) -> Option<LinearExpr> {
        if factor == 0 {
            return Some(LinearExpr::zero());
        }
        let mut terms = BTreeMap::new();
        for (&var, &coef) in &self.terms {
            terms.insert(var, coef.checked_mul(factor)?);
        }
        Some(LinearExpr {
            terms,
            constant: self.constant.checked_mul(factor)?,
        })
    }

    /// Evaluates the expression given a value per model variable.
    ///
    /// Returns `None` on overflow or when a referenced variable has no value.
    pub fn evaluate(&self, values: &[i64]) -> Option<i64> {
        let mut total = self.constant as i128;
        for (var, coef) in self.terms() {
            total += coef as i128 * *values.get(var.index())? as i128;
        }
        i64::try_from(total).ok()
    }
}

impl fmt::Display for LinearExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (var, coef) in self.terms() {
            let (sign, abs) = if coef < 0 { ("-", -(coef as i128)) } else { ("+", coef as i128) };
            match (first, abs) {
                (true, 1) if sign == "-" => write!(f, "-{var}")?,
                (true, 1) => write!(f, "{var}")?,
                (true, _) => write!(f, "{coef}*{var}")?,
                (false, 1) => write!(f, " {sign} {var}")?,
                (false, _) => write!(f, " {sign} {abs}*{var}")?,
            }
            first = false;
        }
        if first {
            write!(f, "{}", self.constant)
        } else if self.constant != 0 {
            let sign = if self.constant < 0 { "-" } else { "+" };
            write!(f, " {sign} {}", (self.constant as i128).abs())
        } else {
            Ok(())
        }
    }
}

/// Relational operator of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelOp {
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
}

impl RelOp {
    /// Operators in the order they are searched for when splitting text.
    ///
    /// Two-character operators come first so `<=` is never read as `<`.
    pub const PRIORITY: [RelOp; 6] = [
        RelOp::Le,
        RelOp::Ge,
        RelOp::Eq,
        RelOp::Ne,
        RelOp::Lt,
        RelOp::Gt,
    ];

    /// Textual symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            RelOp::Le => "<=",
            RelOp::Ge => ">=",
            RelOp::Eq => "==",
            RelOp::Ne => "!=",
            RelOp::Lt => "<",
            RelOp::Gt => ">",
        }
    }

    /// Whether `lhs op rhs` holds.
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            RelOp::Le => lhs <= rhs,
            RelOp::Ge => lhs >= rhs,
            RelOp::Eq => lhs == rhs,
            RelOp::Ne => lhs != rhs,
            RelOp::Lt => lhs < rhs,
            RelOp::Gt => lhs > rhs,
        }
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A relational constraint `lhs op rhs` between two linear expressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedConstraint {
    /// Left operand.
    pub lhs: LinearExpr,
    /// Relation.
    pub op: RelOp,
    /// Right operand.
    pub rhs: LinearExpr,
}

impl TypedConstraint {
    /// Creates a constraint.
    pub fn new(lhs: LinearExpr, op: RelOp, rhs: LinearExpr) -> Self {
        Self { lhs, op, rhs }
    }

    /// Whether the constraint is satisfied by a full assignment.
    pub fn is_satisfied(&self, values: &[i64]) -> bool {
        match (self.lhs.evaluate(values), self.rhs.evaluate(values)) {
            (Some(l), Some(r)) => self.op.holds(l, r),
            _ => false,
        }
    }
}

impl fmt::Display for TypedConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op, self.rhs)
    }
}
