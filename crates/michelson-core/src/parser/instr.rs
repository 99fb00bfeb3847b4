//! Instruction grammar
//!
//! `op` is a primitive instruction, a macro, or a nested `{ ... }` block.
//! Each primitive is keyed by its mnemonic and reads a fixed annotation
//! shape, then its arguments and bodies.

use log::trace;

use super::annotation::{notes_tv, notes_tvf, notes_tvf2, notes_vf, var_note_def};
use super::ast::{Instr, Op};
use super::data::value;
use super::macros::macro_op;
use super::scanner::{PResult, Scanner};
use super::types::{comparable, type_expr};

/// `{ op (; op)* ;? }`
pub(crate) fn ops(s: &mut Scanner<'_>) -> PResult<Vec<Op>> {
    s.nested(|s| {
        trace!("block at {}", s.span());
        s.braced_list(op)
    })
}

pub(crate) fn op(s: &mut Scanner<'_>) -> PResult<Op> {
    s.nested(|s| {
        if let Some(instr) = s.optional(instr)? {
            return Ok(Op::Prim(instr));
        }
        if let Some(mac) = s.optional(macro_op)? {
            return Ok(Op::Mac(mac));
        }
        ops(s).map(Op::Seq)
    })
}

/// Two consecutive blocks, e.g. the branches of `IF`
fn branches(s: &mut Scanner<'_>) -> PResult<(Vec<Op>, Vec<Op>)> {
    let then_branch = ops(s)?;
    let else_branch = ops(s)?;
    Ok((then_branch, else_branch))
}

/// Primitive instruction
pub(crate) fn instr(s: &mut Scanner<'_>) -> PResult<Instr> {
    s.attempt(|s| {
        let start = s.checkpoint();
        let Some(word) = s.peek_word() else {
            return Err(s.fail("instruction"));
        };
        s.lexeme(|s| {
            s.consume(word);
            Ok(())
        })?;

        let instr = match word {
            "DROP" => Instr::Drop,
            "DUP" => Instr::Dup(var_note_def(s)?),
            "SWAP" => Instr::Swap,
            "PUSH" => {
                let v = var_note_def(s)?;
                let ty = type_expr(s)?;
                let data = value(s)?;
                Instr::Push(v, ty, data)
            }
            "SOME" => {
                let (t, v, f) = notes_tvf(s)?;
                Instr::Some(t, v, f)
            }
            "NONE" => {
                let (t, v, f) = notes_tvf(s)?;
                Instr::None(t, v, f, type_expr(s)?)
            }
            "UNIT" => {
                let (t, v) = notes_tv(s)?;
                Instr::Unit(t, v)
            }
            "IF_NONE" => {
                let (l, r) = branches(s)?;
                Instr::IfNone(l, r)
            }
            "PAIR" => {
                let (t, v, fl, fr) = notes_tvf2(s)?;
                Instr::Pair(t, v, fl, fr)
            }
            "CAR" => {
                let (v, f) = notes_vf(s)?;
                Instr::Car(v, f)
            }
            "CDR" => {
                let (v, f) = notes_vf(s)?;
                Instr::Cdr(v, f)
            }
            "LEFT" => {
                let (t, v, fl, fr) = notes_tvf2(s)?;
                Instr::Left(t, v, fl, fr, type_expr(s)?)
            }
            "RIGHT" => {
                let (t, v, fl, fr) = notes_tvf2(s)?;
                Instr::Right(t, v, fl, fr, type_expr(s)?)
            }
            "IF_LEFT" => {
                let (l, r) = branches(s)?;
                Instr::IfLeft(l, r)
            }
            "IF_RIGHT" => {
                let (l, r) = branches(s)?;
                Instr::IfRight(l, r)
            }
            "NIL" => {
                let (t, v) = notes_tv(s)?;
                Instr::Nil(t, v, type_expr(s)?)
            }
            "CONS" => Instr::Cons(var_note_def(s)?),
            "IF_CONS" => {
                let (l, r) = branches(s)?;
                Instr::IfCons(l, r)
            }
            "SIZE" => Instr::Size(var_note_def(s)?),
            "EMPTY_SET" => {
                let (t, v) = notes_tv(s)?;
                Instr::EmptySet(t, v, comparable(s)?)
            }
            "EMPTY_MAP" => {
                let (t, v) = notes_tv(s)?;
                let key = comparable(s)?;
                Instr::EmptyMap(t, v, key, type_expr(s)?)
            }
            "MAP" => {
                let v = var_note_def(s)?;
                Instr::Map(v, ops(s)?)
            }
            "ITER" => {
                let v = var_note_def(s)?;
                Instr::Iter(v, ops(s)?)
            }
            "MEM" => Instr::Mem(var_note_def(s)?),
            "GET" => Instr::Get(var_note_def(s)?),
            "UPDATE" => Instr::Update,
            "IF" => {
                let (l, r) = branches(s)?;
                Instr::If(l, r)
            }
            "LOOP" => Instr::Loop(ops(s)?),
            "LOOP_LEFT" => Instr::LoopLeft(ops(s)?),
            "LAMBDA" => {
                let v = var_note_def(s)?;
                let arg = type_expr(s)?;
                let ret = type_expr(s)?;
                Instr::Lambda(v, arg, ret, ops(s)?)
            }
            "EXEC" => Instr::Exec(var_note_def(s)?),
            "DIP" => Instr::Dip(ops(s)?),
            "FAILWITH" => Instr::Failwith,
            "CAST" => {
                let v = var_note_def(s)?;
                Instr::Cast(v, type_expr(s)?)
            }
            "RENAME" => Instr::Rename(var_note_def(s)?),
            "PACK" => Instr::Pack(var_note_def(s)?),
            "UNPACK" => {
                let v = var_note_def(s)?;
                Instr::Unpack(v, type_expr(s)?)
            }
            "CONCAT" => Instr::Concat(var_note_def(s)?),
            "SLICE" => Instr::Slice(var_note_def(s)?),
            "ISNAT" => Instr::IsNat,
            "ADD" => Instr::Add(var_note_def(s)?),
            "SUB" => Instr::Sub(var_note_def(s)?),
            "MUL" => Instr::Mul(var_note_def(s)?),
            "EDIV" => Instr::Ediv(var_note_def(s)?),
            "ABS" => Instr::Abs(var_note_def(s)?),
            "NEG" => Instr::Neg,
            "MOD" => Instr::Mod,
            "LSL" => Instr::Lsl(var_note_def(s)?),
            "LSR" => Instr::Lsr(var_note_def(s)?),
            "OR" => Instr::Or(var_note_def(s)?),
            "AND" => Instr::And(var_note_def(s)?),
            "XOR" => Instr::Xor(var_note_def(s)?),
            "NOT" => Instr::Not(var_note_def(s)?),
            "COMPARE" => Instr::Compare(var_note_def(s)?),
            "EQ" => Instr::Eq(var_note_def(s)?),
            "NEQ" => Instr::Neq(var_note_def(s)?),
            "LT" => Instr::Lt(var_note_def(s)?),
            "GT" => Instr::Gt(var_note_def(s)?),
            "LE" => Instr::Le(var_note_def(s)?),
            "GE" => Instr::Ge(var_note_def(s)?),
            "INT" => Instr::Int(var_note_def(s)?),
            "SELF" => Instr::SelfContract(var_note_def(s)?),
            "CONTRACT" => {
                let v = var_note_def(s)?;
                Instr::Contract(v, type_expr(s)?)
            }
            "TRANSFER_TOKENS" => Instr::TransferTokens(var_note_def(s)?),
            "SET_DELEGATE" => Instr::SetDelegate,
            "CREATE_ACCOUNT" => {
                let v1 = var_note_def(s)?;
                let v2 = var_note_def(s)?;
                Instr::CreateAccount(v1, v2)
            }
            "CREATE_CONTRACT" => {
                let v1 = var_note_def(s)?;
                let v2 = var_note_def(s)?;
                let body = s.optional(|s| {
                    s.symbol("{")?;
                    let contract = super::contract_body(s)?;
                    s.symbol("}")?;
                    Ok(contract)
                })?;
                match body {
                    Some(contract) => Instr::CreateContract2(v1, v2, Box::new(contract)),
                    None => Instr::CreateContract(v1, v2),
                }
            }
            "IMPLICIT_ACCOUNT" => Instr::ImplicitAccount(var_note_def(s)?),
            "NOW" => Instr::Now(var_note_def(s)?),
            "AMOUNT" => Instr::Amount(var_note_def(s)?),
            "BALANCE" => Instr::Balance(var_note_def(s)?),
            "CHECK_SIGNATURE" => Instr::CheckSignature(var_note_def(s)?),
            "SHA256" => Instr::Sha256(var_note_def(s)?),
            "SHA512" => Instr::Sha512(var_note_def(s)?),
            "BLAKE2B" => Instr::Blake2b(var_note_def(s)?),
            "HASH_KEY" => Instr::HashKey(var_note_def(s)?),
            "STEPS_TO_QUOTA" => Instr::StepsToQuota(var_note_def(s)?),
            "SOURCE" => Instr::Source(var_note_def(s)?),
            "SENDER" => Instr::Sender(var_note_def(s)?),
            "ADDRESS" => Instr::Address(var_note_def(s)?),
            _ => {
                s.restore(start);
                return Err(s.fail("instruction"));
            }
        };
        Ok(instr)
    })
}
