//! Inbound rewriting.
//!
//! Each element of an inbound command array is inspected on its own;
//! element order and non-matching elements are never altered. The array is
//! re-encoded only when at least one destination path actually changed.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::{trace, warn};

use crate::config::{DEFAULT_FILENAME, RewriteConfig, RewritePolicy};
use crate::protocol::command::{PARAM_CALL, PARAM_PATH};
use crate::protocol::{
    DownloadParams, file_fast_save_pars, is_write_file_end, parse_call, to_display_string,
};

// ============================================================================
// Constants
// ============================================================================

/// Separator used when joining the download directory and filename.
pub const PATH_SEPARATOR: char = '\\';

// ============================================================================
// InboundOutcome
// ============================================================================

/// Result of inspecting one inbound text message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundOutcome {
    /// Re-encoded array, present only if a path was rewritten.
    pub rewritten: Option<String>,

    /// Parameters extracted from save commands, in array order.
    pub extracted: Vec<DownloadParams>,

    /// The message is a write-end notification.
    pub write_file_end: bool,
}

// ============================================================================
// Rewrite
// ============================================================================

/// Inspects inbound text under `config`.
#[must_use]
pub fn rewrite_inbound(config: &RewriteConfig, text: &str) -> InboundOutcome {
    let mut parsed: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            trace!(error = %e, "Inbound data is not JSON");
            return InboundOutcome::default();
        }
    };

    let write_file_end = is_write_file_end(&parsed);

    let Value::Array(items) = &mut parsed else {
        trace!("Inbound data is not a command array");
        return InboundOutcome {
            write_file_end,
            ..InboundOutcome::default()
        };
    };

    let mut changed = false;
    let mut extracted = Vec::new();

    for item in items.iter_mut() {
        let Ok(pars) = file_fast_save_pars(item) else {
            continue;
        };

        match parse_call(&to_display_string(&pars[PARAM_CALL])) {
            Ok(params) => extracted.push(params),
            Err(e) if e.is_recoverable() => {
                trace!(error = %e, "Save command carries no report call");
            }
            Err(e) => warn!(error = %e, "Report call extraction failed"),
        }

        if let Some(path) = pars.get_mut(PARAM_PATH)
            && let Some(destination) = resolve_destination(config, path)
            && path.as_str() != Some(destination.as_str())
        {
            // Only a differing path re-encodes; see DESIGN.md decision 4.
            *path = Value::String(destination);
            changed = true;
        }
    }

    let rewritten = if changed {
        serde_json::to_string(&parsed)
            .inspect_err(|e| trace!(error = %e, "Failed to re-encode command array"))
            .ok()
    } else {
        None
    };

    InboundOutcome {
        rewritten,
        extracted,
        write_file_end,
    }
}

// ============================================================================
// Destination Resolution
// ============================================================================

/// Computes the replacement for a save command's destination path.
///
/// Returns `None` under [`RewritePolicy::Passthrough`].
#[must_use]
pub fn resolve_destination(config: &RewriteConfig, original: &Value) -> Option<String> {
    match config.policy {
        RewritePolicy::Passthrough => None,
        RewritePolicy::Blackhole => Some(config.blackhole_path().to_string()),
        RewritePolicy::Redirect => {
            let original = to_display_string(original);
            let filename = config
                .filename_override()
                .unwrap_or_else(|| basename(&original));

            let destination = match config.download_dir() {
                // No directory configured: keep the original one.
                "" => {
                    let prefix = original.rfind(['\\', '/']).map_or(0, |i| i + 1);
                    format!("{}{filename}", &original[..prefix])
                }
                dir => join_path(dir, filename),
            };

            Some(destination)
        }
    }
}

/// Returns the last segment of a `\` or `/` separated path, or
/// [`DEFAULT_FILENAME`] if it is empty.
#[must_use]
pub fn basename(path: &str) -> &str {
    match path.rsplit(['\\', '/']).next() {
        Some(last) if !last.is_empty() => last,
        _ => DEFAULT_FILENAME,
    }
}

/// Joins `filename` onto `dir` with a single [`PATH_SEPARATOR`].
#[must_use]
pub fn join_path(dir: &str, filename: &str) -> String {
    let filename = if filename.is_empty() {
        DEFAULT_FILENAME
    } else {
        filename
    };

    format!(
        "{}{PATH_SEPARATOR}{filename}",
        dir.trim_end_matches(PATH_SEPARATOR)
    )
}

// ============================================================================
// Tests
// ============================================================================
