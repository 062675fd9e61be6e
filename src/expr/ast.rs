//! Arithmetic expression tree.
//!
//! Chains of `+`/`-` and of `*` are stored flat, so a long operand nests
//! only as deep as its parentheses and unary signs.

use std::fmt;

/// Sign of a term in a [`Expr::Sum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    /// Coefficient applied to the term.
    pub fn factor(self) -> i64 {
        match self {
            Sign::Plus => 1,
            Sign::Minus => -1,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Sign::Plus => "+",
            Sign::Minus => "-",
        }
    }
}

/// An arithmetic expression over integer literals and identifiers.
///
/// Literals keep their source text so range and integrality are checked
/// during lowering, where the error can name the offending literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Numeric literal, as written (`"42"`, `"2.5"`).
    Number(String),
    /// Identifier token.
    Ident(String),
    /// Unary minus.
    Neg(Box<Expr>),
    /// `t0 ± t1 ± ...`. The first term is always [`Sign::Plus`].
    Sum(Vec<(Sign, Expr)>),
    /// `f0 * f1 * ...`
    Product(Vec<Expr>),
}

impl Expr {
    pub fn number(text: impl Into<String>) -> Self {
        Expr::Number(text.into())
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn neg(inner: Expr) -> Self {
        Expr::Neg(Box::new(inner))
    }

    /// `lhs + rhs`, extending `lhs` when it is already a sum.
    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Self::push_term(lhs, Sign::Plus, rhs)
    }

    /// `lhs - rhs`, extending `lhs` when it is already a sum.
    pub fn sub(lhs: Expr, rhs: Expr) -> Self {
        Self::push_term(lhs, Sign::Minus, rhs)
    }

    /// `lhs * rhs`, extending `lhs` when it is already a product.
    pub fn mul(lhs: Expr, rhs: Expr) -> Self {
        match lhs {
            Expr::Product(mut factors) => {
                factors.push(rhs);
                Expr::Product(factors)
            }
            lhs => Expr::Product(vec![lhs, rhs]),
        }
    }

    fn push_term(lhs: Expr, sign: Sign, rhs: Expr) -> Self {
        match lhs {
            Expr::Sum(mut terms) => {
                terms.push((sign, rhs));
                Expr::Sum(terms)
            }
            lhs => Expr::Sum(vec![(Sign::Plus, lhs), (sign, rhs)]),
        }
    }

    /// Identifiers in left-to-right order (with repeats).
    pub fn identifiers(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Ident(name) => out.push(name),
            Expr::Neg(inner) => inner.collect_identifiers(out),
            Expr::Sum(terms) => {
                for (_, term) in terms {
                    term.collect_identifiers(out);
                }
            }
            Expr::Product(factors) => {
                for factor in factors {
                    factor.collect_identifiers(out);
                }
            }
        }
    }
}

/// Fully parenthesized rendering.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(text) => f.write_str(text),
            Expr::Ident(name) => f.write_str(name),
            Expr::Neg(inner) => write!(f, "(-{inner})"),
            Expr::Sum(terms) => {
                f.write_str("(")?;
                for (i, (sign, term)) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", sign.symbol())?;
                    }
                    write!(f, "{term}")?;
                }
                f.write_str(")")
            }
            Expr::Product(factors) => {
                f.write_str("(")?;
                for (i, factor) in factors.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" * ")?;
                    }
                    write!(f, "{factor}")?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parenthesizes() {
        let e = Expr::sub(
            Expr::add(Expr::ident("x"), Expr::mul(Expr::number("2"), Expr::ident("y"))),
            Expr::neg(Expr::number("3")),
        );
        assert_eq!(e.to_string(), "(x + (2 * y) - (-3))");
    }

    #[test]
    fn test_chains_stay_flat() {
        let e = Expr::sub(Expr::add(Expr::ident("a"), Expr::ident("b")), Expr::ident("c"));
        match &e {
            Expr::Sum(terms) => {
                let signs: Vec<Sign> = terms.iter().map(|(s, _)| *s).collect();
                assert_eq!(signs, vec![Sign::Plus, Sign::Plus, Sign::Minus]);
            }
            other => panic!("expected a sum, got {other:?}"),
        }

        let p = Expr::mul(Expr::mul(Expr::number("2"), Expr::ident("x")), Expr::number("3"));
        assert!(matches!(&p, Expr::Product(f) if f.len() == 3));
    }

    #[test]
    fn test_identifiers() {
        let e = Expr::add(Expr::ident("x10"), Expr::mul(Expr::ident("x1"), Expr::ident("x10")));
        assert_eq!(e.identifiers(), vec!["x10", "x1", "x10"]);
    }
}
