//! Application wire shapes recognized by the interceptor.
//!
//! Everything outside this narrow vocabulary passes through untouched.
//!
//! # Shapes
//!
//! | Shape | Direction | Recognized by |
//! |-------|-----------|---------------|
//! | `{Action, path, action}` envelope | App → Server | [`envelope`] |
//! | `[{Act, Fn, Pars}, ...]` command array | Server → App | [`command`] |
//! | `mtempPrt(...)` call expression in `Pars[0]` | Server → App | [`call`] |
//!
//! Field names are matched exactly and case-sensitively.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// Submodules
// ============================================================================

/// Embedded `mtempPrt(...)` call grammar and download parameters.
pub mod call;

/// Inbound command array elements.
pub mod command;

/// Outbound user action envelopes.
pub mod envelope;

// ============================================================================
// Re-exports
// ============================================================================

pub use call::{DownloadParams, parse_call};
pub use command::{ACT_DO, FN_FILE_FAST_SAVE, file_fast_save_pars};
pub use envelope::{
    ACTION_USER_ACTION, PATH_WRITE_FILE_END, clear_success_action, is_write_file_end,
};

// ============================================================================
// JSON Helpers
// ============================================================================

/// Returns whether a JSON value would be truthy in the hosting page.
///
/// `null`, `false`, `0`, `NaN` and `""` are falsy; every object and array is
/// truthy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Converts a JSON value to the string the page would see, mapping falsy
/// values to `""`.
#[must_use]
pub fn to_display_string(value: &Value) -> String {
    if !is_truthy(value) {
        return String::new();
    }

    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
