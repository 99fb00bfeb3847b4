//! Type grammar
//!
//! `type` is a keyword, the node's own notes, then 0–2 sub-types.
//! Inside `option`, `pair` and `or` each sub-type may carry a field note,
//! which is stored on the parent node. Parentheses are transparent.

use super::annotation::{field_note, permute, type_note, type_note_def, Perm};
use super::ast::{Comparable, ComparableBase, FieldNote, Type, TypeKind, TypeNote};
use super::scanner::{PResult, Scanner};

const CONSTRUCTORS: &[&str] = &[
    "key",
    "unit",
    "signature",
    "option",
    "list",
    "set",
    "operation",
    "contract",
    "pair",
    "or",
    "lambda",
    "map",
    "big_map",
];

/// A type in a position that takes no field note
pub(crate) fn type_expr(s: &mut Scanner<'_>) -> PResult<Type> {
    type_inner(s, false).map(|(_, ty)| ty)
}

/// A type in a position that may carry a field note
pub(crate) fn field(s: &mut Scanner<'_>) -> PResult<(FieldNote, Type)> {
    type_inner(s, true)
}

/// The node's own `(field?, type-note?)` notes, in either order
fn node_notes(s: &mut Scanner<'_>, with_field: bool) -> PResult<(FieldNote, TypeNote)> {
    if !with_field {
        return Ok((FieldNote::none(), type_note_def(s)?));
    }
    let mut f = Perm::optional("field annotation", FieldNote::none(), field_note);
    let mut t = Perm::optional("type annotation", TypeNote::none(), type_note);
    permute(s, &mut [&mut f, &mut t])?;
    Ok((f.finish(s)?, t.finish(s)?))
}

fn type_inner(s: &mut Scanner<'_>, with_field: bool) -> PResult<(FieldNote, Type)> {
    s.nested(|s| {
        s.attempt(|s| {
            if s.peek() == Some('(') {
                s.symbol("(")?;
                let inner = type_inner(s, with_field)?;
                s.symbol(")")?;
                return Ok(inner);
            }

            let word = match s.peek_word() {
                Some(w) if CONSTRUCTORS.contains(&w) || ComparableBase::from_keyword(w).is_some() => w,
                _ => return Err(s.fail("type")),
            };
            s.lexeme(|s| {
                s.consume(word);
                Ok(())
            })?;
            let (own_field, note) = node_notes(s, with_field)?;

            let kind = match word {
                "key" => TypeKind::Key,
                "unit" => TypeKind::Unit,
                "signature" => TypeKind::Signature,
                "operation" => TypeKind::Operation,
                "option" => {
                    let (f, inner) = field(s)?;
                    TypeKind::Option(f, Box::new(inner))
                }
                "list" => TypeKind::List(Box::new(type_expr(s)?)),
                "set" => TypeKind::Set(comparable(s)?),
                "contract" => TypeKind::Contract(Box::new(type_expr(s)?)),
                "pair" => {
                    let (lf, left) = field(s)?;
                    let (rf, right) = field(s)?;
                    TypeKind::Pair(lf, rf, Box::new(left), Box::new(right))
                }
                "or" => {
                    let (lf, left) = field(s)?;
                    let (rf, right) = field(s)?;
                    TypeKind::Or(lf, rf, Box::new(left), Box::new(right))
                }
                "lambda" => {
                    let domain = type_expr(s)?;
                    let codomain = type_expr(s)?;
                    TypeKind::Lambda(Box::new(domain), Box::new(codomain))
                }
                "map" => {
                    let key = comparable(s)?;
                    TypeKind::Map(key, Box::new(type_expr(s)?))
                }
                "big_map" => {
                    let key = comparable(s)?;
                    TypeKind::BigMap(key, Box::new(type_expr(s)?))
                }
                base => match ComparableBase::from_keyword(base) {
                    Some(base) => TypeKind::Comparable(base),
                    None => return Err(s.fail("type")),
                },
            };
            Ok((own_field, Type { kind, note }))
        })
    })
}

/// Comparable key or element type, optionally annotated and parenthesized
pub(crate) fn comparable(s: &mut Scanner<'_>) -> PResult<Comparable> {
    s.nested(|s| {
        s.attempt(|s| {
            if s.peek() == Some('(') {
                s.symbol("(")?;
                let inner = comparable(s)?;
                s.symbol(")")?;
                return Ok(inner);
            }
            let found = s
                .peek_word()
                .and_then(|w| ComparableBase::from_keyword(w).map(|base| (w, base)));
            let Some((word, base)) = found else {
                return Err(s.fail("comparable type"));
            };
            s.lexeme(|s| {
                s.consume(word);
                Ok(())
            })?;
            let note = type_note_def(s)?;
            Ok(Comparable { base, note })
        })
    })
}
