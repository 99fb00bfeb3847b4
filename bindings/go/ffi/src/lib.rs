//! C-FFI layer for the Michelson parser, used by Go (cgo) and other FFI consumers.
//!
//! ZERO logic here. All calls delegate to `michelson-core`.
//!
//! # Memory Contract
//!
//! All functions that return `*mut c_char` allocate via `CString`.
//! The caller MUST free the returned string by calling `michelson_free_string()`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use michelson_core::report::CheckReport;

/// Result from a Michelson FFI call.
/// If `error` is null, the call succeeded and `result` contains the output.
/// If `error` is non-null, the call failed and `error` contains the error message.
/// The caller MUST free both `result` and `error` with `michelson_free_string()`.
#[repr(C)]
pub struct MichelsonResult {
    pub result: *mut c_char,
    pub error: *mut c_char,
}

/// Interior NUL bytes cannot cross the C boundary
fn to_c_string(text: String) -> CString {
    CString::new(text.replace('\0', "")).unwrap_or_default()
}

impl MichelsonResult {
    fn ok(value: String) -> Self {
        MichelsonResult {
            result: to_c_string(value).into_raw(),
            error: std::ptr::null_mut(),
        }
    }

    fn err(msg: String) -> Self {
        MichelsonResult {
            result: std::ptr::null_mut(),
            error: to_c_string(msg).into_raw(),
        }
    }
}

impl From<michelson_core::Result<String>> for MichelsonResult {
    fn from(result: michelson_core::Result<String>) -> Self {
        match result {
            Ok(value) => MichelsonResult::ok(value),
            Err(e) => MichelsonResult::err(e.to_string()),
        }
    }
}

/// Helper: convert a C string pointer to a Rust &str.
/// Returns None if the pointer is null or not valid UTF-8.
unsafe fn cstr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Parse contract text and return a JSON string of the parsed Contract.
///
/// # Safety
/// `text` must be a valid null-terminated UTF-8 C string.
/// The caller must free the returned strings with `michelson_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn michelson_parse_contract(text: *const c_char) -> MichelsonResult {
    let text = match cstr_to_str(text) {
        Some(s) => s,
        None => return MichelsonResult::err("null or invalid UTF-8 input".into()),
    };

    match michelson_core::parse_contract(text) {
        Ok(contract) => match serde_json::to_string_pretty(&contract) {
            Ok(json) => MichelsonResult::ok(json),
            Err(e) => MichelsonResult::err(format!("Serialization error: {}", e)),
        },
        Err(e) => MichelsonResult::err(e.to_string()),
    }
}

/// Check contract text.
/// Returns JSON: { "valid": bool, "error": null | { "kind", "line", "column", "message" } }
///
/// An invalid contract is still a successful call; `error` is only set when
/// the input pointer is unusable.
///
/// # Safety
/// `text` must be a valid null-terminated UTF-8 C string.
/// The caller must free the returned strings with `michelson_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn michelson_check(text: *const c_char) -> MichelsonResult {
    let text = match cstr_to_str(text) {
        Some(s) => s,
        None => return MichelsonResult::err("null or invalid UTF-8 input".into()),
    };

    CheckReport::from_result(&michelson_core::parse_contract(text))
        .to_json()
        .into()
}

/// Compute the SHA-256 semantic hash of a contract.
///
/// # Safety
/// `text` must be a valid null-terminated UTF-8 C string.
/// The caller must free the returned strings with `michelson_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn michelson_semantic_hash(text: *const c_char) -> MichelsonResult {
    let text = match cstr_to_str(text) {
        Some(s) => s,
        None => return MichelsonResult::err("null or invalid UTF-8 input".into()),
    };

    michelson_core::parse_contract(text)
        .and_then(|contract| michelson_core::digest::semantic_hash(&contract))
        .into()
}

/// Free a string previously returned by a Michelson FFI function.
///
/// # Safety
/// `ptr` must be a pointer previously returned by a Michelson FFI function,
/// or null (in which case this is a no-op).
#[no_mangle]
pub unsafe extern "C" fn michelson_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}
