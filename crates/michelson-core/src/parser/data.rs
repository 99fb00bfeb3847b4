//! Literal data grammar
//!
//! Alternatives, in order: integer, string, bytes, nullary keywords,
//! constructors, `{ Elt .. }` map, `{ .. }` sequence, then a code block.
//! A whole literal may be wrapped in parentheses.

use std::str::FromStr;

use num_bigint::BigInt;

use super::ast::{Data, Elt};
use super::instr::ops;
use super::scanner::{is_word_char, Failure, PResult, Scanner};
use crate::error::{Error, Span};

/// One literal value
pub(crate) fn value(s: &mut Scanner<'_>) -> PResult<Data> {
    s.nested(|s| {
        s.attempt(|s| {
            if s.peek() == Some('(') {
                s.symbol("(")?;
                let inner = value(s)?;
                s.symbol(")")?;
                return Ok(inner);
            }
            data_inner(s)
        })
    })
}

fn data_inner(s: &mut Scanner<'_>) -> PResult<Data> {
    let literals: [fn(&mut Scanner<'_>) -> PResult<Data>; 6] = [
        int_literal,
        string_literal,
        bytes_literal,
        constructor,
        map_literal,
        seq_literal,
    ];
    for literal in literals {
        if let Some(data) = s.optional(literal)? {
            return Ok(data);
        }
    }
    ops(s).map(Data::InstructionBlock)
}

fn ends_word(rest: &str) -> bool {
    !rest.starts_with(is_word_char)
}

/// `-?[0-9]+`, unbounded precision
fn int_literal(s: &mut Scanner<'_>) -> PResult<Data> {
    let rest = s.rest();
    let sign = usize::from(rest.starts_with('-'));
    let digits = rest[sign..].bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || !ends_word(&rest[sign + digits..]) {
        return Err(s.fail("integer literal"));
    }
    let text = &rest[..sign + digits];
    let span = s.span();
    let n = BigInt::from_str(text).map_err(|e| literal_error(span, e.to_string()))?;
    s.lexeme(|s| {
        s.consume(text);
        Ok(Data::Int(n))
    })
}

/// `0x` followed by an even number of hex digits
fn bytes_literal(s: &mut Scanner<'_>) -> PResult<Data> {
    let rest = s.rest();
    if !rest.starts_with("0x") {
        return Err(s.fail("bytes literal"));
    }
    let digits = rest[2..].bytes().take_while(u8::is_ascii_hexdigit).count();
    if !ends_word(&rest[2 + digits..]) {
        return Err(s.fail("bytes literal"));
    }
    let text = &rest[..2 + digits];
    let span = s.span();
    let bytes = hex::decode(&text[2..]).map_err(|e| match e {
        hex::FromHexError::OddLength => literal_error(
            span,
            format!("bytes literal `{}` has an odd number of hex digits", text),
        ),
        other => literal_error(span, other.to_string()),
    })?;
    s.lexeme(|s| {
        s.consume(text);
        Ok(Data::Bytes(bytes))
    })
}

fn literal_error(span: Span, message: String) -> Failure {
    Failure::Fatal(Error::LiteralFormatError { span, message })
}

fn lex_error(span: Span, message: String) -> Failure {
    Failure::Fatal(Error::LexError { span, message })
}

/// `"..."` with backslash escapes
fn string_literal(s: &mut Scanner<'_>) -> PResult<Data> {
    let start = s.span();
    if s.peek() != Some('"') {
        return Err(s.fail("string literal"));
    }
    s.bump();

    s.lexeme(|s| {
        let mut text = String::new();
        loop {
            match s.bump() {
                None => return Err(lex_error(start, "unterminated string literal".to_string())),
                Some('"') => return Ok(Data::String(text)),
                Some('\\') => text.push(escape(s)?),
                Some(ch) => text.push(ch),
            }
        }
    })
}

/// Decode one escape; the backslash is already consumed
fn escape(s: &mut Scanner<'_>) -> PResult<char> {
    let span = s.span();
    let decoded = match s.bump() {
        Some('n') => '\n',
        Some('t') => '\t',
        Some('r') => '\r',
        Some('b') => '\u{8}',
        Some('f') => '\u{c}',
        Some('v') => '\u{b}',
        Some('a') => '\u{7}',
        Some('\\') => '\\',
        Some('"') => '"',
        Some('\'') => '\'',
        Some('x') => numeric_escape(s, span, 16)?,
        Some('o') => numeric_escape(s, span, 8)?,
        Some(d) if d.is_ascii_digit() => {
            let mut code = d.to_digit(10).unwrap_or_default();
            while let Some(digit) = s.peek().and_then(|c| c.to_digit(10)) {
                s.bump();
                code = code.saturating_mul(10).saturating_add(digit);
            }
            char::from_u32(code)
                .ok_or_else(|| lex_error(span, format!("invalid character code {}", code)))?
        }
        Some(other) => return Err(lex_error(span, format!("invalid escape sequence '\\{}'", other))),
        None => return Err(lex_error(span, "unterminated escape sequence".to_string())),
    };
    Ok(decoded)
}

fn numeric_escape(s: &mut Scanner<'_>, span: Span, radix: u32) -> PResult<char> {
    let mut code: u32 = 0;
    let mut digits = 0;
    while let Some(digit) = s.peek().and_then(|c| c.to_digit(radix)) {
        s.bump();
        code = code.saturating_mul(radix).saturating_add(digit);
        digits += 1;
    }
    if digits == 0 {
        return Err(lex_error(span, "numeric escape without digits".to_string()));
    }
    char::from_u32(code).ok_or_else(|| lex_error(span, format!("invalid character code {}", code)))
}

/// `Unit`, `True`, `False`, `None`, `Some v`, `Left v`, `Right v`, `Pair a b`
fn constructor(s: &mut Scanner<'_>) -> PResult<Data> {
    let word = match s.peek_word() {
        Some(w @ ("Unit" | "True" | "False" | "None" | "Some" | "Left" | "Right" | "Pair")) => w,
        _ => return Err(s.fail("data constructor")),
    };
    s.lexeme(|s| {
        s.consume(word);
        Ok(())
    })?;
    let data = match word {
        "Unit" => Data::Unit,
        "True" => Data::True,
        "False" => Data::False,
        "None" => Data::None,
        "Some" => Data::Some(Box::new(value(s)?)),
        "Left" => Data::Left(Box::new(value(s)?)),
        "Right" => Data::Right(Box::new(value(s)?)),
        _ => {
            let left = value(s)?;
            let right = value(s)?;
            Data::Pair(Box::new(left), Box::new(right))
        }
    };
    Ok(data)
}

fn elt(s: &mut Scanner<'_>) -> PResult<Elt> {
    s.keyword("Elt")?;
    let key = value(s)?;
    let value = value(s)?;
    Ok(Elt { key, value })
}

/// `{ Elt k v ; ... }` with at least one entry
fn map_literal(s: &mut Scanner<'_>) -> PResult<Data> {
    let entries = s.braced_list(elt)?;
    if entries.is_empty() {
        return Err(Failure::Backtrack);
    }
    Ok(Data::Map(entries))
}

fn seq_literal(s: &mut Scanner<'_>) -> PResult<Data> {
    s.braced_list(value).map(Data::Seq)
}
