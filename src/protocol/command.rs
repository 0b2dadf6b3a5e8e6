//! Inbound command array elements.
//!
//! The server delivers a JSON array of commands. Only save commands are of
//! interest:
//!
//! ```json
//! [{ "Act": "DO", "Fn": "FileFastSave", "Pars": ["mtempPrt(...)", "C:\\out\\a.pdf"] }]
//! ```
//!
//! `Pars[0]` may carry an embedded call expression, `Pars[1]` is the
//! destination path.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// `Act` value of invoked commands.
pub const ACT_DO: &str = "DO";

/// `Fn` value of the save command.
pub const FN_FILE_FAST_SAVE: &str = "FileFastSave";

/// Position of the embedded call expression in `Pars`.
pub const PARAM_CALL: usize = 0;

/// Position of the destination path in `Pars`.
pub const PARAM_PATH: usize = 1;

// ============================================================================
// Matching
// ============================================================================

/// Returns the non-empty `Pars` list of a `DO`/`FileFastSave` command.
///
/// # Errors
///
/// Returns [`Error::Shape`] for any other element.
pub fn file_fast_save_pars(item: &mut Value) -> Result<&mut Vec<Value>> {
    let object = item
        .as_object_mut()
        .ok_or_else(|| Error::shape("command is not an object"))?;

    if object.get("Act").and_then(Value::as_str) != Some(ACT_DO)
        || object.get("Fn").and_then(Value::as_str) != Some(FN_FILE_FAST_SAVE)
    {
        return Err(Error::shape("command is not a FileFastSave call"));
    }

    match object.get_mut("Pars") {
        Some(Value::Array(pars)) if !pars.is_empty() => Ok(pars),
        _ => Err(Error::shape("`Pars` is missing or empty")),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_matches_file_fast_save() {
        let mut item = json!({ "Act": "DO", "Fn": "FileFastSave", "Pars": ["x", "C:\\a.pdf"] });
        let pars = file_fast_save_pars(&mut item).expect("matches");
        assert_eq!(pars.len(), 2);
        assert_eq!(pars[PARAM_PATH], "C:\\a.pdf");
    }

    #[test]
    fn test_rejects_other_commands() {
        let mut item = json!({ "Act": "DO", "Fn": "ShowForm", "Pars": ["x"] });
        assert!(file_fast_save_pars(&mut item).is_err());

        let mut item = json!({ "Act": "do", "Fn": "FileFastSave", "Pars": ["x"] });
        assert!(file_fast_save_pars(&mut item).is_err());

        let mut item = json!("FileFastSave");
        assert!(file_fast_save_pars(&mut item).is_err());
    }

    #[test]
    fn test_rejects_missing_or_empty_pars() {
        let mut item = json!({ "Act": "DO", "Fn": "FileFastSave" });
        assert!(file_fast_save_pars(&mut item).is_err());

        let mut item = json!({ "Act": "DO", "Fn": "FileFastSave", "Pars": [] });
        assert!(file_fast_save_pars(&mut item).is_err());

        let mut item = json!({ "Act": "DO", "Fn": "FileFastSave", "Pars": "x" });
        assert!(file_fast_save_pars(&mut item).is_err());
    }
}
