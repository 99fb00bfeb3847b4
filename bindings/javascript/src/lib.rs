//! JavaScript/TypeScript bindings for the Michelson parser
//!
//! Thin wrapper around `michelson-core` compiled to WebAssembly.
//! ZERO logic here. All behavior lives in `michelson-core`.

use wasm_bindgen::prelude::*;

use michelson_core::report::CheckReport;

fn js_error(err: michelson_core::Error) -> JsError {
    JsError::new(&err.to_string())
}

/// Parse contract text and return a JSON string of the parsed Contract.
///
/// @param text - contract source text
/// @returns JSON string representation of the parsed Contract
/// @throws Error if the contract text does not parse
#[wasm_bindgen(js_name = "parseContract")]
pub fn parse_contract(text: &str) -> Result<String, JsError> {
    let contract = michelson_core::parse_contract(text).map_err(js_error)?;

    serde_json::to_string_pretty(&contract)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Check contract text without throwing on invalid input.
///
/// @param text - contract source text
/// @returns JSON string: { valid: boolean, error: null | { kind, line, column, message } }
#[wasm_bindgen]
pub fn check(text: &str) -> Result<String, JsError> {
    CheckReport::from_result(&michelson_core::parse_contract(text))
        .to_json()
        .map_err(js_error)
}

/// Compute the SHA-256 semantic hash of a contract.
///
/// Layout, comments, section order and annotation order do not affect it.
///
/// @param text - contract source text
/// @returns Hex-encoded SHA-256 hash string
/// @throws Error if the contract text does not parse
#[wasm_bindgen(js_name = "semanticHash")]
pub fn semantic_hash(text: &str) -> Result<String, JsError> {
    let contract = michelson_core::parse_contract(text).map_err(js_error)?;
    michelson_core::digest::semantic_hash(&contract).map_err(js_error)
}
