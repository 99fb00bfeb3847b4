//! Content addressing for parsed contracts
//!
//! The canonical form of a contract is the compact JSON encoding of its AST.
//! Source layout (whitespace, comments, section order, annotation order and
//! parentheses) does not survive parsing, so two sources that differ only in
//! layout share one hash.

use sha2::{Digest, Sha256};

use crate::{Contract, Error, Result};

/// Compact JSON encoding of the AST
pub fn canonical_json(contract: &Contract) -> Result<String> {
    serde_json::to_string(contract).map_err(|e| Error::SerializationError(e.to_string()))
}

/// Lowercase hex SHA-256 of the canonical form
pub fn semantic_hash(contract: &Contract) -> Result<String> {
    let canonical = canonical_json(contract)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_contract;

    fn hash(text: &str) -> String {
        semantic_hash(&parse_contract(text).unwrap()).unwrap()
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let h = hash("parameter unit; storage unit; code {}");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_layout_does_not_change_hash() {
        let a = hash("parameter unit; storage (pair int nat); code { PAIR %l %r @p ; DROP }");
        let b = hash(
            "# reordered\ncode { PAIR @p %l %r ; DROP ; };\nstorage (pair (int) nat);\nparameter unit;",
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_code_changes_hash() {
        let a = hash("parameter unit; storage unit; code { DROP }");
        let b = hash("parameter unit; storage unit; code { SWAP }");
        assert_ne!(a, b);
    }

    #[test]
    fn test_canonical_json_round_trips() {
        let contract = parse_contract("parameter nat; storage (list string); code { PUSH nat 1 }").unwrap();
        let json = canonical_json(&contract).unwrap();
        let back: Contract = serde_json::from_str(&json).unwrap();
        assert_eq!(back, contract);
    }
}
