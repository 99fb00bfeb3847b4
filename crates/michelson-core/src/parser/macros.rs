//! Macro grammar
//!
//! Macro names are decoded character by character. Most names are a fixed
//! prefix plus a comparison suffix. Two families encode structure in the
//! name itself:
//! - `P (A | P..) (I | P..) R` builds a `PairStruct` for `PAPAIR`/`UNPAIR`
//! - `C [AD]+ R` builds a projection path for `CADR`, `SET_CADR`, `MAP_CADR`
//!
//! Name decoding never records failures; a macro that does not match is
//! reported once, as "macro", at the start of the word.

use log::trace;

use super::annotation::{field_note, notes_vf, permute, type_note, var_note, var_note_def, Perm};
use super::ast::{CadrStep, CmpOp, FieldNote, Macro, Op, PairStruct, TypeNote, VarNote};
use super::instr::ops;
use super::scanner::{Failure, PResult, Scanner};

fn no_match<T>() -> PResult<T> {
    Err(Failure::Backtrack)
}

/// Consume `prefix` or backtrack
fn prefix(s: &mut Scanner<'_>, prefix: &str) -> PResult<()> {
    if s.eat(prefix) {
        Ok(())
    } else {
        no_match()
    }
}

/// The macro name must stop here
fn name_end(s: &mut Scanner<'_>) -> PResult<()> {
    if !s.at_word_end() {
        return no_match();
    }
    s.skip_space()
}

fn cmp_op(s: &mut Scanner<'_>) -> PResult<CmpOp> {
    for op in CmpOp::ALL {
        if s.eat(op.mnemonic()) {
            return Ok(op);
        }
    }
    no_match()
}

fn branches(s: &mut Scanner<'_>) -> PResult<(Vec<Op>, Vec<Op>)> {
    let then_branch = ops(s)?;
    let else_branch = ops(s)?;
    Ok((then_branch, else_branch))
}

/// Any macro
pub(crate) fn macro_op(s: &mut Scanner<'_>) -> PResult<Macro> {
    let alternatives: [fn(&mut Scanner<'_>) -> PResult<Macro>; 16] = [
        cmp,
        if_some,
        if_cmp,
        if_x,
        fail,
        assert_cmp,
        assert_named,
        assert_x,
        assert,
        diip,
        duup,
        unpair,
        papair,
        cadr,
        set_cadr,
        map_cadr,
    ];
    let start = s.span();
    for alternative in alternatives {
        if let Some(mac) = s.optional(alternative)? {
            trace!("macro at {}: {:?}", start, mac);
            return Ok(mac);
        }
    }
    Err(s.fail("macro"))
}

// ── Comparison families ───────────────────────────────────

/// `CMPop @v`
fn cmp(s: &mut Scanner<'_>) -> PResult<Macro> {
    prefix(s, "CMP")?;
    let op = cmp_op(s)?;
    name_end(s)?;
    Ok(Macro::Cmp(op, var_note_def(s)?))
}

/// `IFop { .. } { .. }`
fn if_x(s: &mut Scanner<'_>) -> PResult<Macro> {
    prefix(s, "IF")?;
    let op = cmp_op(s)?;
    name_end(s)?;
    let (bt, bf) = branches(s)?;
    Ok(Macro::IfX(op, bt, bf))
}

/// `IFCMPop @v { .. } { .. }`
fn if_cmp(s: &mut Scanner<'_>) -> PResult<Macro> {
    prefix(s, "IFCMP")?;
    let op = cmp_op(s)?;
    name_end(s)?;
    let v = var_note_def(s)?;
    let (bt, bf) = branches(s)?;
    Ok(Macro::IfCmp(op, v, bt, bf))
}

fn if_some(s: &mut Scanner<'_>) -> PResult<Macro> {
    prefix(s, "IF_SOME")?;
    name_end(s)?;
    let (bt, bf) = branches(s)?;
    Ok(Macro::IfSome(bt, bf))
}

fn fail(s: &mut Scanner<'_>) -> PResult<Macro> {
    prefix(s, "FAIL")?;
    name_end(s)?;
    Ok(Macro::Fail)
}

// ── Assertions ────────────────────────────────────────────

fn assert(s: &mut Scanner<'_>) -> PResult<Macro> {
    prefix(s, "ASSERT")?;
    name_end(s)?;
    Ok(Macro::Assert)
}

/// `ASSERT_op`
fn assert_x(s: &mut Scanner<'_>) -> PResult<Macro> {
    prefix(s, "ASSERT_")?;
    let op = cmp_op(s)?;
    name_end(s)?;
    Ok(Macro::AssertX(op))
}

/// `ASSERT_CMPop`
fn assert_cmp(s: &mut Scanner<'_>) -> PResult<Macro> {
    prefix(s, "ASSERT_CMP")?;
    let op = cmp_op(s)?;
    name_end(s)?;
    Ok(Macro::AssertCmp(op))
}

fn assert_named(s: &mut Scanner<'_>) -> PResult<Macro> {
    prefix(s, "ASSERT_")?;
    let named = [
        ("NONE", Macro::AssertNone),
        ("SOME", Macro::AssertSome),
        ("LEFT", Macro::AssertLeft),
        ("RIGHT", Macro::AssertRight),
    ];
    for (suffix, mac) in named {
        if s.eat(suffix) {
            name_end(s)?;
            return Ok(mac);
        }
    }
    no_match()
}

// ── Stack depth ───────────────────────────────────────────

/// Count of `letter` repeated at the cursor
fn repeated(s: &mut Scanner<'_>, letter: char) -> u32 {
    let mut count = 0;
    while s.peek() == Some(letter) {
        s.bump();
        count += 1;
    }
    count
}

/// `DI..IP { .. }`, depth = number of `I`
fn diip(s: &mut Scanner<'_>) -> PResult<Macro> {
    prefix(s, "D")?;
    let depth = repeated(s, 'I');
    if depth < 2 {
        return no_match();
    }
    prefix(s, "P")?;
    name_end(s)?;
    Ok(Macro::Diip(depth, ops(s)?))
}

/// `DU..UP @v`, depth = number of `U`
fn duup(s: &mut Scanner<'_>) -> PResult<Macro> {
    prefix(s, "D")?;
    let depth = repeated(s, 'U');
    if depth < 2 {
        return no_match();
    }
    prefix(s, "P")?;
    name_end(s)?;
    Ok(Macro::Duup(depth, var_note_def(s)?))
}

// ── Pair structures ───────────────────────────────────────

/// `P (A | <pair>) (I | <pair>)`
pub(crate) fn pair_struct(s: &mut Scanner<'_>) -> PResult<PairStruct> {
    s.nested(|s| {
        prefix(s, "P")?;
        let left = if s.eat("A") {
            PairStruct::leaf()
        } else {
            pair_struct(s)?
        };
        let right = if s.eat("I") {
            PairStruct::leaf()
        } else {
            pair_struct(s)?
        };
        Ok(PairStruct::node(left, right))
    })
}

/// `<pair>R :t @v %f*`, field notes go to the leaves left to right
fn papair(s: &mut Scanner<'_>) -> PResult<Macro> {
    let shape = pair_struct(s)?;
    prefix(s, "R")?;
    name_end(s)?;

    let mut t = Perm::optional("type annotation", TypeNote::none(), type_note);
    let mut v = Perm::optional("variable annotation", VarNote::none(), var_note);
    let mut fields = Perm::optional("field annotation", Vec::new(), |s: &mut Scanner<'_>| {
        s.many1(field_note)
    });
    permute(s, &mut [&mut t, &mut v, &mut fields])?;
    let (t, v, fields) = (t.finish(s)?, v.finish(s)?, fields.finish(s)?);

    let shape = shape.with_leaf_notes(fields.into_iter().map(|f| (VarNote::none(), f)));
    Ok(Macro::Papair(shape, t, v))
}

/// `UN<pair>R @v* %f*`, var and field notes are zipped then given to the leaves
fn unpair(s: &mut Scanner<'_>) -> PResult<Macro> {
    prefix(s, "UN")?;
    let shape = pair_struct(s)?;
    prefix(s, "R")?;
    name_end(s)?;

    let mut vars = Perm::optional("variable annotation", Vec::new(), |s: &mut Scanner<'_>| {
        s.many1(var_note)
    });
    let mut fields = Perm::optional("field annotation", Vec::new(), |s: &mut Scanner<'_>| {
        s.many1(field_note)
    });
    permute(s, &mut [&mut vars, &mut fields])?;
    let vars: Vec<VarNote> = vars.finish(s)?;
    let fields: Vec<FieldNote> = fields.finish(s)?;

    Ok(Macro::Unpair(shape.with_leaf_notes(vars.into_iter().zip(fields))))
}

// ── Projection paths ──────────────────────────────────────

/// `[AD]+R` with at least `min` steps; the terminal `R` is consumed
fn cadr_path(s: &mut Scanner<'_>, min: usize) -> PResult<Vec<CadrStep>> {
    let mut path = Vec::new();
    loop {
        let step = match s.peek() {
            Some('A') => CadrStep::A,
            Some('D') => CadrStep::D,
            _ => break,
        };
        s.bump();
        path.push(step);
    }
    if path.len() < min {
        return no_match();
    }
    prefix(s, "R")?;
    name_end(s)?;
    Ok(path)
}

/// `C[AD][AD]+R @v %f`
fn cadr(s: &mut Scanner<'_>) -> PResult<Macro> {
    prefix(s, "C")?;
    let path = cadr_path(s, 2)?;
    let (v, f) = notes_vf(s)?;
    Ok(Macro::Cadr(path, v, f))
}

/// `SET_C[AD]+R @v %f`
fn set_cadr(s: &mut Scanner<'_>) -> PResult<Macro> {
    prefix(s, "SET_C")?;
    let path = cadr_path(s, 1)?;
    let (v, f) = notes_vf(s)?;
    Ok(Macro::SetCadr(path, v, f))
}

/// `MAP_C[AD]+R @v %f { .. }`
fn map_cadr(s: &mut Scanner<'_>) -> PResult<Macro> {
    prefix(s, "MAP_C")?;
    let path = cadr_path(s, 1)?;
    let (v, f) = notes_vf(s)?;
    Ok(Macro::MapCadr(path, v, f, ops(s)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseOptions;
    use crate::parser::ast::Instr;

    fn parse(input: &str) -> Macro {
        let mut s = Scanner::new(input, &ParseOptions::default());
        let mac = macro_op(&mut s).unwrap();
        assert!(s.is_at_end(), "trailing input: {:?}", s.rest());
        mac
    }

    fn rejected(input: &str) -> bool {
        let mut s = Scanner::new(input, &ParseOptions::default());
        let result = macro_op(&mut s);
        result == Err(Failure::Backtrack) && s.span().offset == 0
    }

    fn leaf(var: Option<&str>, field: Option<&str>) -> PairStruct {
        PairStruct::Leaf {
            var: VarNote(var.map(String::from)),
            field: FieldNote(field.map(String::from)),
        }
    }

    // ── Pair structures ────────────────────────────────

    #[test]
    fn test_pair_struct_shapes() {
        let mut s = Scanner::new("PAIR", &ParseOptions::default());
        assert_eq!(
            pair_struct(&mut s).unwrap(),
            PairStruct::node(PairStruct::leaf(), PairStruct::leaf())
        );
        assert_eq!(s.rest(), "R");

        let mut s = Scanner::new("PPAIIR", &ParseOptions::default());
        assert_eq!(
            pair_struct(&mut s).unwrap(),
            PairStruct::node(
                PairStruct::node(PairStruct::leaf(), PairStruct::leaf()),
                PairStruct::leaf()
            )
        );
    }

    #[test]
    fn test_papair_shape() {
        assert_eq!(
            parse("PAPAIR"),
            Macro::Papair(
                PairStruct::node(
                    PairStruct::leaf(),
                    PairStruct::node(PairStruct::leaf(), PairStruct::leaf())
                ),
                TypeNote::none(),
                VarNote::none()
            )
        );
    }

    #[test]
    fn test_papair_field_notes_fill_leaves_left_to_right() {
        assert_eq!(
            parse("PAPAIR %a %b :t @p"),
            Macro::Papair(
                PairStruct::node(
                    leaf(None, Some("a")),
                    PairStruct::node(leaf(None, Some("b")), PairStruct::leaf())
                ),
                TypeNote::new("t"),
                VarNote::new("p")
            )
        );
    }

    #[test]
    fn test_papair_extra_field_notes_are_dropped() {
        assert_eq!(
            parse("PAPAIR %a %b %c %d"),
            Macro::Papair(
                PairStruct::node(
                    leaf(None, Some("a")),
                    PairStruct::node(leaf(None, Some("b")), leaf(None, Some("c")))
                ),
                TypeNote::none(),
                VarNote::none()
            )
        );
    }

    #[test]
    fn test_papair_field_notes_one_run() {
        assert_eq!(
            parse("PAPAIR @p %a %b %c"),
            Macro::Papair(
                PairStruct::node(
                    leaf(None, Some("a")),
                    PairStruct::node(leaf(None, Some("b")), leaf(None, Some("c")))
                ),
                TypeNote::none(),
                VarNote::new("p")
            )
        );
    }

    #[test]
    fn test_unpair_zips_notes() {
        assert_eq!(
            parse("UNPAPAIR %x %y @a @b @c"),
            Macro::Unpair(PairStruct::node(
                leaf(Some("a"), Some("x")),
                PairStruct::node(leaf(Some("b"), Some("y")), PairStruct::leaf())
            ))
        );
    }

    #[test]
    fn test_unpair_without_notes() {
        assert_eq!(
            parse("UNPAIR"),
            Macro::Unpair(PairStruct::node(PairStruct::leaf(), PairStruct::leaf()))
        );
    }

    #[test]
    fn test_unpair_with_one_note_kind_assigns_nothing() {
        assert_eq!(
            parse("UNPAIR @a @b"),
            Macro::Unpair(PairStruct::node(PairStruct::leaf(), PairStruct::leaf()))
        );
    }

    #[test]
    fn test_malformed_pair_names() {
        assert!(rejected("PAPAI"));
        assert!(rejected("PAPAIRX"));
        assert!(rejected("PAAR"));
    }

    // ── Projection paths ───────────────────────────────

    #[test]
    fn test_cadr_paths() {
        assert_eq!(
            parse("CAAR"),
            Macro::Cadr(vec![CadrStep::A, CadrStep::A], VarNote::none(), FieldNote::none())
        );
        assert_eq!(
            parse("CDDR @x %f"),
            Macro::Cadr(vec![CadrStep::D, CadrStep::D], VarNote::new("x"), FieldNote::new("f"))
        );
        assert_eq!(
            parse("CADAR"),
            Macro::Cadr(
                vec![CadrStep::A, CadrStep::D, CadrStep::A],
                VarNote::none(),
                FieldNote::none()
            )
        );
    }

    #[test]
    fn test_single_step_cadr_is_not_a_macro() {
        assert!(rejected("CAR"));
        assert!(rejected("CDR"));
        assert!(rejected("CR"));
    }

    #[test]
    fn test_set_and_map_cadr() {
        assert_eq!(
            parse("SET_CAR %f"),
            Macro::SetCadr(vec![CadrStep::A], VarNote::none(), FieldNote::new("f"))
        );
        assert_eq!(
            parse("MAP_CDAR { DROP }"),
            Macro::MapCadr(
                vec![CadrStep::D, CadrStep::A],
                VarNote::none(),
                FieldNote::none(),
                vec![Op::Prim(Instr::Drop)]
            )
        );
    }

    // ── Comparisons and assertions ─────────────────────

    #[test]
    fn test_all_comparison_kinds() {
        for op in CmpOp::ALL {
            assert_eq!(parse(&format!("CMP{}", op.mnemonic())), Macro::Cmp(op, VarNote::none()));
            assert_eq!(parse(&format!("ASSERT_{}", op.mnemonic())), Macro::AssertX(op));
            assert_eq!(parse(&format!("ASSERT_CMP{}", op.mnemonic())), Macro::AssertCmp(op));
        }
    }

    #[test]
    fn test_conditionals() {
        assert_eq!(parse("IFNEQ {} { FAIL }"), Macro::IfX(CmpOp::Neq, vec![], vec![Op::Mac(Macro::Fail)]));
        assert_eq!(
            parse("IFCMPGE @c {} {}"),
            Macro::IfCmp(CmpOp::Ge, VarNote::new("c"), vec![], vec![])
        );
        assert_eq!(parse("IF_SOME {} {}"), Macro::IfSome(vec![], vec![]));
    }

    #[test]
    fn test_named_asserts() {
        assert_eq!(parse("ASSERT"), Macro::Assert);
        assert_eq!(parse("ASSERT_NONE"), Macro::AssertNone);
        assert_eq!(parse("ASSERT_SOME"), Macro::AssertSome);
        assert_eq!(parse("ASSERT_LEFT"), Macro::AssertLeft);
        assert_eq!(parse("ASSERT_RIGHT"), Macro::AssertRight);
        assert!(rejected("ASSERT_FOO"));
    }

    #[test]
    fn test_comparison_needs_word_end() {
        assert!(rejected("CMPEQX"));
        assert!(rejected("FAILS"));
    }

    // ── Depth macros ───────────────────────────────────

    #[test]
    fn test_diip_and_duup_depth() {
        assert_eq!(parse("DIIP { DROP }"), Macro::Diip(2, vec![Op::Prim(Instr::Drop)]));
        assert_eq!(parse("DIIIP {}"), Macro::Diip(3, vec![]));
        assert_eq!(parse("DUUP"), Macro::Duup(2, VarNote::none()));
        assert_eq!(parse("DUUUP @x"), Macro::Duup(3, VarNote::new("x")));
        assert!(rejected("DUP"));
    }
}
