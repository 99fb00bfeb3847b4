//! Michelson Core - parser for Michelson smart-contract source
//!
//! Turns contract text into a typed AST for type-checkers, interpreters,
//! IDE tooling and deployers. The CLI and the Go and JavaScript bindings
//! all compile this same core.
//!
//! # Architecture
//!
//! ```text
//! Source Text → Scanner → Annotation / Type / Data / Instruction / Macro grammars
//!                                          ↓
//!                                    Contract AST → Digest (canonical JSON + SHA-256)
//! ```
//!
//! # Guarantees
//!
//! - **Deterministic**: Same input always produces identical output
//! - **Total**: Every input yields a `Contract` or a positioned `Error`, never a panic
//! - **Faithful**: Macros are kept unexpanded with their annotations in place
//! - **Bounded**: `ParseOptions::max_depth` caps nesting for untrusted input

pub mod config;
pub mod digest;
pub mod error;
pub mod parser;
pub mod report;

pub use config::ParseOptions;
pub use error::{Error, Result, Span, SyntaxErrorKind};
pub use parser::ast::*;
pub use parser::{parse_code, parse_contract, parse_contract_with, parse_type, parse_value};

use serde::{Deserialize, Serialize};

/// Version of this crate, reported by the CLI and the bindings
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Top-level unit: a parameter type, a storage type and the code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub parameter: Type,
    pub storage: Type,
    pub code: Vec<Op>,
}
