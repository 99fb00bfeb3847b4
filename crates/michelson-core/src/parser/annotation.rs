//! Annotations and order-independent groups
//!
//! `:t`, `@v` and `%f` notes may follow a type or instruction in any order.
//! `permute` tries every unsatisfied member of a group at the current
//! position, takes the first one that consumes input, and repeats until no
//! member advances. Members that never matched take their default, or fail
//! if they are required.

use super::ast::{FieldNote, TypeNote, VarNote};
use super::scanner::{Failure, PResult, Scanner};

fn is_body_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '\\')
}

fn may_follow_note(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, ';' | '{' | '}' | '(' | ')' | '#' | '/' | '@' | '%' | ':')
}

/// `sigil [@ | %% | %]? body*`, returning the text after the sigil
fn note(s: &mut Scanner<'_>, sigil: char) -> PResult<String> {
    s.attempt(|s| {
        if s.peek() != Some(sigil) {
            return Err(s.fail(format!("`{}` annotation", sigil)));
        }
        s.bump();

        let mut text = String::new();
        if s.eat("%%") {
            text.push_str("%%");
        } else if let Some(marker @ ('@' | '%')) = s.peek() {
            s.bump();
            text.push(marker);
        }
        while let Some(ch) = s.peek().filter(|c| is_body_char(*c)) {
            s.bump();
            text.push(ch);
        }

        if s.peek().is_some_and(|c| !may_follow_note(c)) {
            return Err(s.fail_annotation());
        }
        s.skip_space()?;
        Ok(text)
    })
}

pub(crate) fn type_note(s: &mut Scanner<'_>) -> PResult<TypeNote> {
    note(s, ':').map(TypeNote::new)
}

pub(crate) fn var_note(s: &mut Scanner<'_>) -> PResult<VarNote> {
    note(s, '@').map(VarNote::new)
}

pub(crate) fn field_note(s: &mut Scanner<'_>) -> PResult<FieldNote> {
    note(s, '%').map(FieldNote::new)
}

pub(crate) fn type_note_def(s: &mut Scanner<'_>) -> PResult<TypeNote> {
    Ok(s.optional(type_note)?.unwrap_or_default())
}

pub(crate) fn var_note_def(s: &mut Scanner<'_>) -> PResult<VarNote> {
    Ok(s.optional(var_note)?.unwrap_or_default())
}

// ── Order-independent groups ──────────────────────────────

/// One member of an order-independent group
pub(crate) struct Perm<'p, 'a, T> {
    label: &'static str,
    parse: Box<dyn FnMut(&mut Scanner<'a>) -> PResult<T> + 'p>,
    default: Option<T>,
    value: Option<T>,
}

impl<'p, 'a, T> Perm<'p, 'a, T> {
    /// Member that falls back to `default` when absent
    pub fn optional(
        label: &'static str,
        default: T,
        parse: impl FnMut(&mut Scanner<'a>) -> PResult<T> + 'p,
    ) -> Self {
        Perm {
            label,
            parse: Box::new(parse),
            default: Some(default),
            value: None,
        }
    }

    /// Member that must appear exactly once
    pub fn required(
        label: &'static str,
        parse: impl FnMut(&mut Scanner<'a>) -> PResult<T> + 'p,
    ) -> Self {
        Perm {
            label,
            parse: Box::new(parse),
            default: None,
            value: None,
        }
    }

    /// The parsed value, the default, or a failure naming the missing member
    pub fn finish(self, s: &mut Scanner<'a>) -> PResult<T> {
        match self.value.or(self.default) {
            Some(value) => Ok(value),
            None => Err(s.fail(self.label)),
        }
    }
}

pub(crate) trait Member<'a> {
    fn satisfied(&self) -> bool;

    /// Try to parse this member here; `Ok(true)` only if input was consumed
    fn advance(&mut self, s: &mut Scanner<'a>) -> PResult<bool>;
}

impl<'p, 'a, T> Member<'a> for Perm<'p, 'a, T> {
    fn satisfied(&self) -> bool {
        self.value.is_some()
    }

    fn advance(&mut self, s: &mut Scanner<'a>) -> PResult<bool> {
        let start = s.checkpoint();
        let parse = &mut self.parse;
        match s.attempt(|s| parse(s)) {
            Ok(value) if s.span().offset > start.offset => {
                self.value = Some(value);
                Ok(true)
            }
            Ok(_) => {
                s.restore(start);
                Ok(false)
            }
            Err(Failure::Backtrack) => Ok(false),
            Err(fatal) => Err(fatal),
        }
    }
}

/// Parse the members of a group in any order, each at most once
pub(crate) fn permute<'a>(s: &mut Scanner<'a>, members: &mut [&mut dyn Member<'a>]) -> PResult<()> {
    loop {
        let mut advanced = false;
        for member in members.iter_mut() {
            if member.satisfied() {
                continue;
            }
            if member.advance(s)? {
                advanced = true;
                break;
            }
        }
        if !advanced {
            return Ok(());
        }
    }
}

// ── Instruction note shapes ───────────────────────────────

pub(crate) fn notes_tvf(s: &mut Scanner<'_>) -> PResult<(TypeNote, VarNote, FieldNote)> {
    let mut t = Perm::optional("type annotation", TypeNote::none(), type_note);
    let mut v = Perm::optional("variable annotation", VarNote::none(), var_note);
    let mut f = Perm::optional("field annotation", FieldNote::none(), field_note);
    permute(s, &mut [&mut t, &mut v, &mut f])?;
    Ok((t.finish(s)?, v.finish(s)?, f.finish(s)?))
}

pub(crate) fn notes_tv(s: &mut Scanner<'_>) -> PResult<(TypeNote, VarNote)> {
    let mut t = Perm::optional("type annotation", TypeNote::none(), type_note);
    let mut v = Perm::optional("variable annotation", VarNote::none(), var_note);
    permute(s, &mut [&mut t, &mut v])?;
    Ok((t.finish(s)?, v.finish(s)?))
}

pub(crate) fn notes_vf(s: &mut Scanner<'_>) -> PResult<(VarNote, FieldNote)> {
    let mut v = Perm::optional("variable annotation", VarNote::none(), var_note);
    let mut f = Perm::optional("field annotation", FieldNote::none(), field_note);
    permute(s, &mut [&mut v, &mut f])?;
    Ok((v.finish(s)?, f.finish(s)?))
}

/// Type note, var note and up to two field notes; the first field note
/// in the source is the left one
pub(crate) fn notes_tvf2(
    s: &mut Scanner<'_>,
) -> PResult<(TypeNote, VarNote, FieldNote, FieldNote)> {
    let mut t = Perm::optional("type annotation", TypeNote::none(), type_note);
    let mut v = Perm::optional("variable annotation", VarNote::none(), var_note);
    let mut fl = Perm::optional("field annotation", FieldNote::none(), field_note);
    let mut fr = Perm::optional("field annotation", FieldNote::none(), field_note);
    permute(s, &mut [&mut t, &mut v, &mut fl, &mut fr])?;
    Ok((t.finish(s)?, v.finish(s)?, fl.finish(s)?, fr.finish(s)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseOptions;

    fn scanner(input: &str) -> Scanner<'_> {
        Scanner::new(input, &ParseOptions::default())
    }

    #[test]
    fn test_note_bodies() {
        assert_eq!(var_note(&mut scanner("@total")).unwrap(), VarNote::new("total"));
        assert_eq!(field_note(&mut scanner("%a.b_c")).unwrap(), FieldNote::new("a.b_c"));
        assert_eq!(type_note(&mut scanner(":T1")).unwrap(), TypeNote::new("T1"));
    }

    #[test]
    fn test_bare_sigil_is_empty_note() {
        let mut s = scanner("@ DROP");
        assert_eq!(var_note(&mut s).unwrap(), VarNote::new(""));
        assert_eq!(s.rest(), "DROP");
    }

    #[test]
    fn test_special_markers() {
        assert_eq!(var_note(&mut scanner("@%%")).unwrap(), VarNote::new("%%"));
        assert_eq!(var_note(&mut scanner("@%")).unwrap(), VarNote::new("%"));
        assert_eq!(field_note(&mut scanner("%@")).unwrap(), FieldNote::new("@"));
        assert_eq!(field_note(&mut scanner("%%")).unwrap(), FieldNote::new("%"));
    }

    #[test]
    fn test_wrong_sigil_backtracks() {
        let mut s = scanner("%f");
        assert_eq!(var_note(&mut s), Err(Failure::Backtrack));
        assert_eq!(s.span().offset, 0);
    }

    #[test]
    fn test_malformed_body_is_annotation_error() {
        let mut s = scanner("@bad-name");
        assert_eq!(var_note(&mut s), Err(Failure::Backtrack));
        assert_eq!(s.span().offset, 0);
        let err = s.into_error(Failure::Backtrack);
        assert_eq!(err.kind_name(), "annotation");
        assert_eq!(err.span().map(|sp| sp.offset), Some(4));
    }

    #[test]
    fn test_absent_notes_take_defaults() {
        let mut s = scanner("DROP");
        let notes = notes_tvf(&mut s).unwrap();
        assert_eq!(notes, (TypeNote::none(), VarNote::none(), FieldNote::none()));
        assert_eq!(s.rest(), "DROP");
    }

    #[test]
    fn test_notes_any_order() {
        let expected = (TypeNote::new("t"), VarNote::new("v"), FieldNote::new("f"));
        for text in [":t @v %f", ":t %f @v", "@v :t %f", "@v %f :t", "%f :t @v", "%f @v :t"] {
            let mut s = scanner(text);
            assert_eq!(notes_tvf(&mut s).unwrap(), expected, "order {:?}", text);
            assert!(s.is_at_end());
        }
    }

    #[test]
    fn test_each_note_kind_at_most_once() {
        let mut s = scanner("@a @b");
        let (v, f) = notes_vf(&mut s).unwrap();
        assert_eq!(v, VarNote::new("a"));
        assert_eq!(f, FieldNote::none());
        assert_eq!(s.rest(), "@b");
    }

    #[test]
    fn test_two_field_notes() {
        let mut s = scanner("%l %r @p :t");
        let notes = notes_tvf2(&mut s).unwrap();
        assert_eq!(notes.0, TypeNote::new("t"));
        assert_eq!(notes.1, VarNote::new("p"));
        assert_eq!(notes.2, FieldNote::new("l"));
        assert_eq!(notes.3, FieldNote::new("r"));
        assert!(s.is_at_end());
    }

    #[test]
    fn test_field_notes_may_be_split() {
        for text in ["%l @p %r", "%l :t %r", ":t %l @p %r"] {
            let mut s = scanner(text);
            let notes = notes_tvf2(&mut s).unwrap();
            assert_eq!(notes.2, FieldNote::new("l"), "{:?}", text);
            assert_eq!(notes.3, FieldNote::new("r"), "{:?}", text);
            assert!(s.is_at_end());
        }
    }

    #[test]
    fn test_single_field_note_is_left() {
        let mut s = scanner("@p %l");
        let notes = notes_tvf2(&mut s).unwrap();
        assert_eq!(notes.2, FieldNote::new("l"));
        assert_eq!(notes.3, FieldNote::none());
    }

    #[test]
    fn test_third_field_note_is_left_over() {
        let mut s = scanner("%a %b %c");
        let notes = notes_tvf2(&mut s).unwrap();
        assert_eq!((notes.2, notes.3), (FieldNote::new("a"), FieldNote::new("b")));
        assert_eq!(s.rest(), "%c");
    }

    #[test]
    fn test_body_may_start_with_digit_or_underscore() {
        assert_eq!(var_note(&mut scanner("@1x")).unwrap(), VarNote::new("1x"));
        assert_eq!(var_note(&mut scanner("@_x")).unwrap(), VarNote::new("_x"));
        assert_eq!(field_note(&mut scanner("%0")).unwrap(), FieldNote::new("0"));
    }

    #[test]
    fn test_required_member_missing() {
        let mut s = scanner("x");
        let mut a = Perm::required("`a`", |s: &mut Scanner<'_>| s.keyword("a"));
        permute(&mut s, &mut [&mut a]).unwrap();
        assert_eq!(a.finish(&mut s), Err(Failure::Backtrack));
    }
}
