//! Reads trees written in the expression grammar:
//!
//! ```text
//! Expr       ::= Identifier ( '(' ExprList ')' )?  |  '_'
//! ExprList   ::= Expr (',' Expr)*
//! Identifier ::= one or more alphabetic characters
//! ```
//!
//! Whitespace is insignificant and is stripped before parsing, so error
//! offsets count characters of the stripped text.
use crate::{Error, Result, Tree};
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::char,
    combinator::{all_consuming, cut, map, opt},
    multi::separated_list1,
    sequence::delimited,
    Err as NomErr, IResult,
};
use std::str::FromStr;

/// Parse one expression. A bare `_` is accepted here; whether a wildcard is
/// allowed at the root is up to the caller.
pub fn parse(input: &str) -> Result<Tree> {
    let stripped: String = input.chars().filter(|c| !c.is_whitespace()).collect();

    let result = match all_consuming(parse_expr)(stripped.as_str()) {
        Ok((_, tree)) => Ok(tree),
        Err(NomErr::Error(e) | NomErr::Failure(e)) => Err(syntax_error(&stripped, e.input)),
        Err(NomErr::Incomplete(_)) => Err(syntax_error(&stripped, "")),
    };
    result
}

fn syntax_error(source: &str, rest: &str) -> Error {
    let consumed = &source[..source.len() - rest.len()];
    let offset = consumed.chars().count();
    match rest.chars().next() {
        None => Error::syntax(offset, "unexpected end of input"),
        Some(c) => Error::syntax(offset, format!("unexpected character '{}'", c)),
    }
}

fn parse_expr(s: &str) -> IResult<&str, Tree> {
    alt((parse_wildcard, parse_node))(s)
}

fn parse_wildcard(s: &str) -> IResult<&str, Tree> {
    map(char('_'), |_| Tree::wildcard())(s)
}

fn parse_identifier(s: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphabetic())(s)
}

fn parse_node(s: &str) -> IResult<&str, Tree> {
    let (s, label) = parse_identifier(s)?;
    // Once a '(' is seen the list is mandatory, so failures past it are cut
    let (s, children) = opt(delimited(
        char('('),
        cut(separated_list1(char(','), parse_expr)),
        cut(char(')')),
    ))(s)?;
    Ok((s, Tree::node(label, children.unwrap_or_default())))
}

impl FromStr for Tree {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}
