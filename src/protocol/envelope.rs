//! Outbound user action envelopes.
//!
//! # Format
//!
//! ```json
//! {
//!   "Action": "useraction",
//!   "path": "_Writefileend",
//!   "action": "{\"SuccessAction\":\"notify\"}"
//! }
//! ```
//!
//! `action` is itself a JSON document encoded as a string.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value};

use crate::error::{Error, Result};

use super::is_truthy;

// ============================================================================
// Constants
// ============================================================================

/// `Action` value of user action envelopes.
pub const ACTION_USER_ACTION: &str = "useraction";

/// `path` value sent once a file write has finished.
pub const PATH_WRITE_FILE_END: &str = "_Writefileend";

/// Field inside the nested action that triggers the post-write callback.
const SUCCESS_ACTION: &str = "SuccessAction";

// ============================================================================
// Matching
// ============================================================================

/// Returns `true` for `{"Action":"useraction","path":"_Writefileend",...}`.
#[must_use]
pub fn is_write_file_end(value: &Value) -> bool {
    value.get("Action").and_then(Value::as_str) == Some(ACTION_USER_ACTION)
        && value.get("path").and_then(Value::as_str) == Some(PATH_WRITE_FILE_END)
}

fn user_action(envelope: &mut Value) -> Result<&mut Map<String, Value>> {
    let object = envelope
        .as_object_mut()
        .ok_or_else(|| Error::shape("envelope is not an object"))?;

    if object.get("Action").and_then(Value::as_str) != Some(ACTION_USER_ACTION) {
        return Err(Error::shape("envelope is not a user action"));
    }

    Ok(object)
}

// ============================================================================
// Rewrite
// ============================================================================

/// Clears `SuccessAction` in the nested action of a write-end envelope.
///
/// Returns `Ok(true)` when the envelope was modified and `Ok(false)` when it
/// matched but `SuccessAction` was already falsy.
///
/// # Errors
///
/// - [`Error::Shape`] if the envelope is not a user action, `action` is not
///   a string, or `path` is not `_Writefileend`
/// - [`Error::Json`] if `action` is not valid JSON
pub fn clear_success_action(envelope: &mut Value) -> Result<bool> {
    let object = user_action(envelope)?;

    let action = object
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::shape("`action` is not a string"))?;

    let mut inner: Value = serde_json::from_str(action)?;

    if object.get("path").and_then(Value::as_str) != Some(PATH_WRITE_FILE_END) {
        return Err(Error::shape("user action is not a write-end notification"));
    }

    let Some(inner_object) = inner.as_object_mut() else {
        return Ok(false);
    };

    let Some(success) = inner_object.get_mut(SUCCESS_ACTION) else {
        return Ok(false);
    };
    if !is_truthy(success) {
        return Ok(false);
    }
    *success = Value::String(String::new());

    let encoded = serde_json::to_string(&inner)?;
    object.insert("action".to_string(), Value::String(encoded));

    Ok(true)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn envelope(path: &str, action: &str) -> Value {
        json!({ "Action": "useraction", "path": path, "action": action })
    }

    #[test]
    fn test_clears_truthy_success_action() {
        let mut value = envelope("_Writefileend", r#"{"SuccessAction":"notify","Id":3}"#);

        assert!(clear_success_action(&mut value).expect("matches"));
        assert_eq!(value["action"], r#"{"SuccessAction":"","Id":3}"#);
        assert_eq!(value["path"], "_Writefileend");
    }

    #[test]
    fn test_falsy_success_action_is_left_alone() {
        let mut value = envelope("_Writefileend", r#"{"SuccessAction":""}"#);
        assert!(!clear_success_action(&mut value).expect("matches"));

        let mut value = envelope("_Writefileend", r#"{"Other":1}"#);
        assert!(!clear_success_action(&mut value).expect("matches"));

        let mut value = envelope("_Writefileend", r#"["SuccessAction"]"#);
        assert!(!clear_success_action(&mut value).expect("matches"));
    }

    #[test]
    fn test_other_path_is_shape_mismatch() {
        let mut value = envelope("_Open", r#"{"SuccessAction":"notify"}"#);
        let err = clear_success_action(&mut value).unwrap_err();
        assert!(matches!(err, Error::Shape { .. }));
    }

    #[test]
    fn test_non_user_action_is_shape_mismatch() {
        let mut value = json!({ "Action": "ping", "path": "_Writefileend", "action": "{}" });
        assert!(matches!(clear_success_action(&mut value), Err(Error::Shape { .. })));

        let mut value = json!([1, 2, 3]);
        assert!(matches!(clear_success_action(&mut value), Err(Error::Shape { .. })));

        let mut value = json!({ "Action": "useraction", "path": "_Writefileend", "action": 5 });
        assert!(matches!(clear_success_action(&mut value), Err(Error::Shape { .. })));
    }

    #[test]
    fn test_nested_parse_failure() {
        let mut value = envelope("_Writefileend", "{not json");
        assert!(matches!(clear_success_action(&mut value), Err(Error::Json(_))));
    }

    #[test]
    fn test_is_write_file_end() {
        assert!(is_write_file_end(&envelope("_Writefileend", "{}")));
        assert!(!is_write_file_end(&envelope("_Other", "{}")));
        assert!(!is_write_file_end(&json!("useraction")));
    }
}
