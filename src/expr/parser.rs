//! Arithmetic expression grammar.
//!
//! ```text
//! sum     := product (('+' | '-') product)*
//! product := unary ('*' unary)*
//! unary   := '-' unary | '+' unary | atom
//! atom    := number | identifier | '(' sum ')'
//! ```
//!
//! Identifiers are maximal `[A-Za-z_][A-Za-z0-9_]*` tokens, so `x10` is
//! always one token and never `x1` followed by `0`.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0, one_of},
    combinator::{all_consuming, map, opt, recognize},
    error::{context, ContextError, ParseError as NomParseError, VerboseError},
    multi::{fold_many0, many0_count},
    sequence::{delimited, pair, preceded},
    IResult,
};

use super::ast::Expr;

/// Maximum combined depth of parentheses and unary signs.
pub const MAX_NESTING: usize = 64;

// ============================================================================
// Public API
// ============================================================================

/// Parses a complete arithmetic expression.
///
/// Returns a short description of the first problem on failure.
pub fn parse_expr(input: &str) -> Result<Expr, String> {
    check_nesting(input)?;
    match all_consuming(delimited(
        multispace0::<_, VerboseError<&str>>,
        sum,
        multispace0,
    ))(input)
    {
        Ok((_, expr)) => Ok(expr),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(describe(input, &e)),
        Err(nom::Err::Incomplete(_)) => Err("incomplete expression".to_string()),
    }
}

/// Rejects input nested deeper than [`MAX_NESTING`] before recursing.
fn check_nesting(input: &str) -> Result<(), String> {
    // Unary signs pending at each open parenthesis.
    let mut open: Vec<usize> = Vec::new();
    let mut stacked = 0usize;
    let mut pending = 0usize;

    for c in input.chars() {
        match c {
            '(' => {
                open.push(pending);
                stacked += pending;
                pending = 0;
            }
            ')' => {
                stacked -= open.pop().unwrap_or(0);
                pending = 0;
            }
            '+' | '-' => pending += 1,
            c if c.is_whitespace() => {}
            _ => pending = 0,
        }
        if open.len() + stacked + pending > MAX_NESTING {
            return Err(format!("expression nested deeper than {MAX_NESTING} levels"));
        }
    }
    Ok(())
}

fn describe(input: &str, err: &VerboseError<&str>) -> String {
    match err.errors.first() {
        Some((rest, _)) => {
            let offset = input.len() - rest.len();
            match rest.trim_start().chars().next() {
                Some(c) => format!("unexpected '{c}' at offset {offset}"),
                None => "unexpected end of expression".to_string(),
            }
        }
        None => "invalid expression".to_string(),
    }
}

// ============================================================================
// Grammar
// ============================================================================

fn ws<'a, O, E, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where
    E: NomParseError<&'a str>,
    F: FnMut(&'a str) -> IResult<&'a str, O, E>,
{
    delimited(multispace0, inner, multispace0)
}

fn sum<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Expr, E> {
    let (input, first) = product(input)?;
    fold_many0(
        pair(ws(one_of("+-")), product),
        move || first.clone(),
        |acc, (op, rhs)| match op {
            '+' => Expr::add(acc, rhs),
            _ => Expr::sub(acc, rhs),
        },
    )(input)
}

fn product<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Expr, E> {
    let (input, first) = unary(input)?;
    fold_many0(
        preceded(ws(char('*')), unary),
        move || first.clone(),
        Expr::mul,
    )(input)
}

fn unary<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Expr, E> {
    let (input, _) = multispace0(input)?;
    alt((
        map(preceded(char('-'), unary), Expr::neg),
        preceded(char('+'), unary),
        atom,
    ))(input)
}

fn atom<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Expr, E> {
    context(
        "operand",
        alt((
            map(number, Expr::number),
            map(identifier, Expr::ident),
            delimited(char('('), ws(sum), char(')')),
        )),
    )(input)
}

fn number<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(pair(digit1, opt(pair(char('.'), digit1))))(input)
}

fn identifier<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_")))),
    ))(input)
}
