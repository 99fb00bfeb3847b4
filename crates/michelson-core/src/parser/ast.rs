//! Michelson AST node definitions
//!
//! These types represent the parsed structure of a contract: types, literal
//! data, primitive instructions and unexpanded macros.
//!
//! All AST types are immutable after construction, strictly tree-owned and
//! derive: Debug, Clone, PartialEq, Eq, Serialize, Deserialize

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::Contract;

// ── Annotations ───────────────────────────────────────────

macro_rules! note_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Option<String>);

        impl $name {
            /// An absent annotation
            pub fn none() -> Self {
                $name(None)
            }

            pub fn new(text: impl Into<String>) -> Self {
                $name(Some(text.into()))
            }

            /// Annotation body without its sigil
            pub fn text(&self) -> Option<&str> {
                self.0.as_deref()
            }

            pub fn is_present(&self) -> bool {
                self.0.is_some()
            }
        }
    };
}

note_type!(
    /// `:name`, type annotation
    TypeNote
);
note_type!(
    /// `@name`, variable annotation
    VarNote
);
note_type!(
    /// `%name`, field annotation
    FieldNote
);

// ── Types ─────────────────────────────────────────────────

/// Base types usable as set elements and map keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparableBase {
    Int,
    Nat,
    String,
    Bytes,
    Mutez,
    Bool,
    KeyHash,
    Timestamp,
    Address,
}

impl ComparableBase {
    pub fn from_keyword(word: &str) -> Option<Self> {
        let base = match word {
            "int" => ComparableBase::Int,
            "nat" => ComparableBase::Nat,
            "string" => ComparableBase::String,
            "bytes" => ComparableBase::Bytes,
            "mutez" => ComparableBase::Mutez,
            "bool" => ComparableBase::Bool,
            "key_hash" => ComparableBase::KeyHash,
            "timestamp" => ComparableBase::Timestamp,
            "address" => ComparableBase::Address,
            _ => return None,
        };
        Some(base)
    }
}

/// A comparable type with its optional type annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparable {
    pub base: ComparableBase,
    pub note: TypeNote,
}

impl Comparable {
    pub fn new(base: ComparableBase) -> Self {
        Comparable {
            base,
            note: TypeNote::none(),
        }
    }
}

/// A type node; every node carries at most one type annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    pub kind: TypeKind,
    pub note: TypeNote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Comparable(ComparableBase),
    Key,
    Unit,
    Signature,
    Option(FieldNote, Box<Type>),
    List(Box<Type>),
    Set(Comparable),
    Operation,
    Contract(Box<Type>),
    Pair(FieldNote, FieldNote, Box<Type>, Box<Type>),
    Or(FieldNote, FieldNote, Box<Type>, Box<Type>),
    Lambda(Box<Type>, Box<Type>),
    Map(Comparable, Box<Type>),
    BigMap(Comparable, Box<Type>),
}

impl Type {
    /// A type without annotation
    pub fn bare(kind: TypeKind) -> Self {
        Type {
            kind,
            note: TypeNote::none(),
        }
    }

    pub fn unit() -> Self {
        Type::bare(TypeKind::Unit)
    }

    pub fn comparable(base: ComparableBase) -> Self {
        Type::bare(TypeKind::Comparable(base))
    }
}

// ── Literal data ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Data {
    Int(BigInt),
    String(String),
    Bytes(Vec<u8>),
    Unit,
    True,
    False,
    Pair(Box<Data>, Box<Data>),
    Left(Box<Data>),
    Right(Box<Data>),
    Some(Box<Data>),
    None,
    Seq(Vec<Data>),
    Map(Vec<Elt>),
    /// Executable code used as a value, e.g. a lambda body
    InstructionBlock(Vec<Op>),
}

/// One `Elt key value` entry of a map literal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elt {
    pub key: Data,
    pub value: Data,
}

// ── Code ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Prim(Instr),
    Mac(Macro),
    /// A bare nested `{ ... }` block
    Seq(Vec<Op>),
}

/// Primitive instructions with their annotation slots and bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instr {
    Drop,
    Dup(VarNote),
    Swap,
    Push(VarNote, Type, Data),
    Some(TypeNote, VarNote, FieldNote),
    None(TypeNote, VarNote, FieldNote, Type),
    Unit(TypeNote, VarNote),
    IfNone(Vec<Op>, Vec<Op>),
    Pair(TypeNote, VarNote, FieldNote, FieldNote),
    Car(VarNote, FieldNote),
    Cdr(VarNote, FieldNote),
    Left(TypeNote, VarNote, FieldNote, FieldNote, Type),
    Right(TypeNote, VarNote, FieldNote, FieldNote, Type),
    IfLeft(Vec<Op>, Vec<Op>),
    IfRight(Vec<Op>, Vec<Op>),
    Nil(TypeNote, VarNote, Type),
    Cons(VarNote),
    IfCons(Vec<Op>, Vec<Op>),
    Size(VarNote),
    EmptySet(TypeNote, VarNote, Comparable),
    EmptyMap(TypeNote, VarNote, Comparable, Type),
    Map(VarNote, Vec<Op>),
    Iter(VarNote, Vec<Op>),
    Mem(VarNote),
    Get(VarNote),
    Update,
    If(Vec<Op>, Vec<Op>),
    Loop(Vec<Op>),
    LoopLeft(Vec<Op>),
    Lambda(VarNote, Type, Type, Vec<Op>),
    Exec(VarNote),
    Dip(Vec<Op>),
    Failwith,
    Cast(VarNote, Type),
    Rename(VarNote),
    Pack(VarNote),
    Unpack(VarNote, Type),
    Concat(VarNote),
    Slice(VarNote),
    IsNat,
    Add(VarNote),
    Sub(VarNote),
    Mul(VarNote),
    Ediv(VarNote),
    Abs(VarNote),
    Neg,
    Mod,
    Lsl(VarNote),
    Lsr(VarNote),
    Or(VarNote),
    And(VarNote),
    Xor(VarNote),
    Not(VarNote),
    Compare(VarNote),
    Eq(VarNote),
    Neq(VarNote),
    Lt(VarNote),
    Gt(VarNote),
    Le(VarNote),
    Ge(VarNote),
    Int(VarNote),
    SelfContract(VarNote),
    Contract(VarNote, Type),
    TransferTokens(VarNote),
    SetDelegate,
    CreateAccount(VarNote, VarNote),
    CreateContract(VarNote, VarNote),
    CreateContract2(VarNote, VarNote, Box<Contract>),
    ImplicitAccount(VarNote),
    Now(VarNote),
    Amount(VarNote),
    Balance(VarNote),
    CheckSignature(VarNote),
    Sha256(VarNote),
    Sha512(VarNote),
    Blake2b(VarNote),
    HashKey(VarNote),
    StepsToQuota(VarNote),
    Source(VarNote),
    Sender(VarNote),
    Address(VarNote),
}

// ── Macros ────────────────────────────────────────────────

/// Comparison kind encoded in `CMP*`, `IF*`, `IFCMP*` and `ASSERT_*` names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CmpOp {
    pub const ALL: [CmpOp; 6] = [
        CmpOp::Eq,
        CmpOp::Neq,
        CmpOp::Lt,
        CmpOp::Gt,
        CmpOp::Le,
        CmpOp::Ge,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            CmpOp::Eq => "EQ",
            CmpOp::Neq => "NEQ",
            CmpOp::Lt => "LT",
            CmpOp::Gt => "GT",
            CmpOp::Le => "LE",
            CmpOp::Ge => "GE",
        }
    }
}

/// One projection step of a `C[AD]+R` path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CadrStep {
    /// Project the left element
    A,
    /// Project the right element
    D,
}

/// Pairing shape decoded from a `PAPAIR`/`UNPAIR` name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairStruct {
    Leaf { var: VarNote, field: FieldNote },
    Node(Box<PairStruct>, Box<PairStruct>),
}

impl PairStruct {
    /// Leaf without annotations
    pub fn leaf() -> Self {
        PairStruct::Leaf {
            var: VarNote::none(),
            field: FieldNote::none(),
        }
    }

    pub fn node(left: PairStruct, right: PairStruct) -> Self {
        PairStruct::Node(Box::new(left), Box::new(right))
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            PairStruct::Leaf { .. } => 1,
            PairStruct::Node(l, r) => l.leaf_count() + r.leaf_count(),
        }
    }

    /// Assign notes to leaves left-to-right; leaves past the end keep theirs
    /// and notes past the last leaf are dropped
    pub fn with_leaf_notes<I>(self, notes: I) -> Self
    where
        I: IntoIterator<Item = (VarNote, FieldNote)>,
    {
        let mut notes = notes.into_iter();
        self.assign_leaves(&mut notes)
    }

    fn assign_leaves(self, notes: &mut impl Iterator<Item = (VarNote, FieldNote)>) -> Self {
        match self {
            PairStruct::Node(l, r) => {
                let l = l.assign_leaves(notes);
                let r = r.assign_leaves(notes);
                PairStruct::node(l, r)
            }
            leaf @ PairStruct::Leaf { .. } => match notes.next() {
                Some((var, field)) => PairStruct::Leaf { var, field },
                None => leaf,
            },
        }
    }
}

/// Unexpanded macro; expansion into primitives happens downstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Macro {
    Cmp(CmpOp, VarNote),
    IfX(CmpOp, Vec<Op>, Vec<Op>),
    IfCmp(CmpOp, VarNote, Vec<Op>, Vec<Op>),
    Fail,
    Papair(PairStruct, TypeNote, VarNote),
    Unpair(PairStruct),
    Cadr(Vec<CadrStep>, VarNote, FieldNote),
    SetCadr(Vec<CadrStep>, VarNote, FieldNote),
    MapCadr(Vec<CadrStep>, VarNote, FieldNote, Vec<Op>),
    Diip(u32, Vec<Op>),
    Duup(u32, VarNote),
    Assert,
    AssertX(CmpOp),
    AssertCmp(CmpOp),
    AssertNone,
    AssertSome,
    AssertLeft,
    AssertRight,
    IfSome(Vec<Op>, Vec<Op>),
}
