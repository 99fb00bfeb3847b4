//! Machine-readable validity reports
//!
//! Shared by the CLI `check --json` command and the language bindings so
//! every front end emits the same document:
//!
//! ```json
//! { "valid": false, "error": { "kind": "syntax", "line": 3, "column": 14, "message": "..." } }
//! ```

use serde::{Deserialize, Serialize};

use crate::{Contract, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// `Error::kind_name`
    pub kind: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub message: String,
}

impl From<&Error> for ErrorReport {
    fn from(err: &Error) -> Self {
        let span = err.span();
        ErrorReport {
            kind: err.kind_name().to_string(),
            line: span.map(|s| s.line),
            column: span.map(|s| s.column),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub valid: bool,
    pub error: Option<ErrorReport>,
}

impl CheckReport {
    pub fn from_result(result: &Result<Contract>) -> Self {
        match result {
            Ok(_) => CheckReport {
                valid: true,
                error: None,
            },
            Err(err) => CheckReport {
                valid: false,
                error: Some(ErrorReport::from(err)),
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::SerializationError(e.to_string()))
    }
}
