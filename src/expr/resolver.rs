//! Expression resolution against a symbol table.
//!
//! Turns constraint and objective text into engine types:
//!
//! 1. [`split_relation`] finds the relational operator.
//! 2. Each operand is parsed into an [`Expr`] tree.
//! 3. The tree is lowered into a [`LinearExpr`], mapping each identifier
//!    token to its variable handle.
//!
//! Identifiers are resolved as whole tokens, never by text substitution.

use std::collections::HashMap;

use super::ast::Expr;
use super::parser::parse_expr;
use crate::engine::{LinearExpr, RelOp, TypedConstraint, VarId};
use crate::error::ExprError;

/// Variable name → engine handle.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, VarId>,
}

impl SymbolTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`. Returns the previous handle if the name was bound.
    pub fn insert(&mut self, name: impl Into<String>, var: VarId) -> Option<VarId> {
        self.symbols.insert(name.into(), var)
    }

    /// Handle bound to `name`.
    pub fn get(&self, name: &str) -> Option<VarId> {
        self.symbols.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Splits `expr` into `(lhs, op, rhs)`.
///
/// Operators are tried in [`RelOp::PRIORITY`] order and the first one that
/// occurs is used. It must occur exactly once and leave two non-empty
/// operands.
pub fn split_relation(expr: &str) -> Result<(&str, RelOp, &str), ExprError> {
    for op in RelOp::PRIORITY {
        let symbol = op.symbol();
        if !expr.contains(symbol) {
            continue;
        }
        if expr.matches(symbol).count() != 1 {
            return Err(ExprError::syntax(
                expr,
                format!("operator '{symbol}' appears more than once"),
            ));
        }
        let Some((lhs, rhs)) = expr.split_once(symbol) else {
            continue;
        };
        let (lhs, rhs) = (lhs.trim(), rhs.trim());
        if lhs.is_empty() || rhs.is_empty() {
            return Err(ExprError::syntax(
                expr,
                format!("operator '{symbol}' needs an operand on each side"),
            ));
        }
        return Ok((lhs, op, rhs));
    }
    Err(ExprError::syntax(expr, "no relational operator found"))
}

/// Resolves a relational constraint such as `"2*x + y <= 10"`.
pub fn resolve_constraint(
    expr: &str,
    symbols: &SymbolTable,
) -> Result<TypedConstraint, ExprError> {
    let (lhs, op, rhs) = split_relation(expr)?;
    let lhs = resolve_arithmetic(lhs, symbols)?;
    let rhs = resolve_arithmetic(rhs, symbols)?;
    Ok(TypedConstraint::new(lhs, op, rhs))
}

/// Resolves an arithmetic operand into a linear expression.
pub fn resolve_arithmetic(operand: &str, symbols: &SymbolTable) -> Result<LinearExpr, ExprError> {
    let text = operand.trim();
    if text.is_empty() {
        return Err(ExprError::syntax(operand, "empty expression"));
    }
    let tree = parse_expr(text).map_err(|reason| ExprError::syntax(text, reason))?;
    lower(&tree, symbols, text)
}

/// Resolves an objective expression.
pub fn resolve_objective(expr: &str, symbols: &SymbolTable) -> Result<LinearExpr, ExprError> {
    resolve_arithmetic(expr, symbols)
}

fn lower(tree: &Expr, symbols: &SymbolTable, text: &str) -> Result<LinearExpr, ExprError> {
    let overflow = || ExprError::type_error(text, "arithmetic overflow");

    match tree {
        Expr::Number(literal) => {
            if literal.contains('.') {
                return Err(ExprError::type_error(
                    text,
                    format!("non-integer literal {literal}"),
                ));
            }
            let value = literal.parse::<i64>().map_err(|_| {
                ExprError::type_error(text, format!("literal {literal} is out of range"))
            })?;
            Ok(LinearExpr::constant(value))
        }
        Expr::Ident(name) => symbols
            .get(name)
            .map(LinearExpr::var)
            .ok_or_else(|| ExprError::UnknownVariable { name: name.clone() }),
        Expr::Neg(inner) => lower(inner, symbols, text)?
            .checked_scale(-1)
            .ok_or_else(overflow),
        Expr::Sum(terms) => {
            let mut acc = LinearExpr::zero();
            for (sign, term) in terms {
                acc.accumulate(&lower(term, symbols, text)?, sign.factor())
                    .ok_or_else(overflow)?;
            }
            Ok(acc)
        }
        Expr::Product(factors) => {
            let mut factors = factors.iter();
            let mut acc = match factors.next() {
                Some(first) => lower(first, symbols, text)?,
                None => LinearExpr::constant(1),
            };
            for factor in factors {
                let rhs = lower(factor, symbols, text)?;
                let product = if acc.is_constant() {
                    rhs.checked_scale(acc.constant_term())
                } else if rhs.is_constant() {
                    acc.checked_scale(rhs.constant_term())
                } else {
                    return Err(ExprError::type_error(
                        text,
                        "product of two variable terms is not linear",
                    ));
                };
                acc = product.ok_or_else(overflow)?;
            }
            Ok(acc)
        }
    }
}
