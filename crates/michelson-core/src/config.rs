//! Parse options
//!
//! The grammar itself never limits nesting. Callers that parse untrusted
//! input set `max_depth` so a deeply nested contract fails with
//! `DepthLimitExceeded` instead of exhausting the call stack.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Options accepted by `parser::parse_contract_with` and friends
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Maximum nesting of types, values, blocks and instructions
    pub max_depth: Option<usize>,
}

impl ParseOptions {
    pub fn with_max_depth(limit: usize) -> Self {
        ParseOptions {
            max_depth: Some(limit),
        }
    }

    /// Load options from a JSON document, e.g. `{"max_depth": 256}`
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::ConfigError(e.to_string()))
    }
}
