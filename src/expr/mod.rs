//! Expression resolver.
//!
//! Constraint and objective strings are tokenized and parsed into a typed
//! [`Expr`] tree, then lowered to engine expressions over the variables in a
//! [`SymbolTable`]. Supported: integer literals, identifiers, unary `+`/`-`,
//! binary `+`, `-`, `*` (one side constant) and parentheses.

mod ast;
mod parser;
mod resolver;

pub use ast::{Expr, Sign};
pub use parser::{parse_expr, MAX_NESTING};
pub use resolver::{
    resolve_arithmetic, resolve_constraint, resolve_objective, split_relation, SymbolTable,
};
