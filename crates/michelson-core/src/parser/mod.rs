//! Michelson parser: scanner, AST types, and recursive descent grammar
//!
//! Converts contract source text into an Abstract Syntax Tree (AST).
//! Each entry point skips leading space and comments, parses one item and
//! requires end of input.
//!
//! # Errors
//! A failed parse reports the furthest position any alternative reached and
//! what was expected there. There is no partial result.

pub mod ast;
mod annotation;
mod data;
mod instr;
mod macros;
mod scanner;
mod types;

use log::{debug, trace};

use crate::config::ParseOptions;
use crate::{Contract, Result};
use annotation::{permute, Perm};
use ast::{Data, Op, Type};
use scanner::{PResult, Scanner};

/// Parse contract source into a Contract AST
///
/// # Guarantees
/// - Deterministic: same input always produces same AST
/// - `parameter`, `storage` and `code` sections may appear in any order
///
/// # Example
/// ```
/// let contract = michelson_core::parse_contract(
///     "parameter unit; storage unit; code { CDR ; NIL operation ; PAIR };",
/// ).unwrap();
/// assert_eq!(contract.code.len(), 3);
/// ```
pub fn parse_contract(input: &str) -> Result<Contract> {
    parse_contract_with(input, &ParseOptions::default())
}

/// Parse contract source with explicit options
pub fn parse_contract_with(input: &str, options: &ParseOptions) -> Result<Contract> {
    let result = run(input, options, contract_body);
    match &result {
        Ok(contract) => debug!("Parsed contract with {} top-level ops", contract.code.len()),
        Err(err) => debug!("Contract rejected: {}", err),
    }
    result
}

/// Parse a standalone type expression
pub fn parse_type(input: &str) -> Result<Type> {
    run(input, &ParseOptions::default(), types::type_expr)
}

/// Parse a standalone data literal
pub fn parse_value(input: &str) -> Result<Data> {
    run(input, &ParseOptions::default(), data::value)
}

/// Parse a standalone `{ ... }` instruction block
pub fn parse_code(input: &str) -> Result<Vec<Op>> {
    run(input, &ParseOptions::default(), instr::ops)
}

fn run<'a, T>(
    input: &'a str,
    options: &ParseOptions,
    rule: impl FnOnce(&mut Scanner<'a>) -> PResult<T>,
) -> Result<T> {
    let mut s = Scanner::new(input, options);
    match whole(&mut s, rule) {
        Ok(value) => Ok(value),
        Err(failure) => Err(s.into_error(failure)),
    }
}

fn whole<'a, T>(
    s: &mut Scanner<'a>,
    rule: impl FnOnce(&mut Scanner<'a>) -> PResult<T>,
) -> PResult<T> {
    s.skip_space()?;
    let value = rule(s)?;
    s.eof()?;
    Ok(value)
}

/// `name <item> ;`
fn section<'a, T>(
    s: &mut Scanner<'a>,
    name: &str,
    item: impl FnOnce(&mut Scanner<'a>) -> PResult<T>,
) -> PResult<T> {
    s.keyword(name)?;
    trace!("{} section at {}", name, s.span());
    let value = item(s)?;
    s.symbol(";")?;
    Ok(value)
}

/// `parameter <type> ;`, `storage <type> ;` and `code <block> ;?` in any order
pub(crate) fn contract_body(s: &mut Scanner<'_>) -> PResult<Contract> {
    let mut parameter = Perm::required("`parameter`", |s: &mut Scanner<'_>| {
        section(s, "parameter", types::type_expr)
    });
    let mut storage = Perm::required("`storage`", |s: &mut Scanner<'_>| {
        section(s, "storage", types::type_expr)
    });
    let mut code = Perm::required("`code`", |s: &mut Scanner<'_>| {
        s.keyword("code")?;
        trace!("code section at {}", s.span());
        let ops = instr::ops(s)?;
        s.optional(|s| s.symbol(";"))?;
        Ok(ops)
    });
    permute(s, &mut [&mut parameter, &mut storage, &mut code])?;

    Ok(Contract {
        parameter: parameter.finish(s)?,
        storage: storage.finish(s)?,
        code: code.finish(s)?,
    })
}
