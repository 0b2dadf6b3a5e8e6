//! Outbound rewriting.
//!
//! Pipeline: decode → block check → parse → shape match → clear
//! `SuccessAction` → re-encode. The first failing stage short-circuits to
//! [`OutboundAction::Forward`].

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::{trace, warn};

use crate::channel::Payload;
use crate::config::RewriteConfig;
use crate::error::Result;
use crate::protocol::{clear_success_action, is_write_file_end};

// ============================================================================
// OutboundAction
// ============================================================================

/// What to do with an outbound payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundAction {
    /// Send the original payload unchanged.
    Forward,

    /// Send this payload instead; retry with the original if it fails.
    Rewrite(Payload),

    /// Drop the payload and close the channel.
    Block {
        /// The configured pattern found in the payload.
        pattern: String,
    },
}

/// Result of inspecting one outbound payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundOutcome {
    /// Decision for the payload.
    pub action: OutboundAction,

    /// The payload is a write-end notification.
    pub write_file_end: bool,
}

impl OutboundOutcome {
    const fn forward() -> Self {
        Self {
            action: OutboundAction::Forward,
            write_file_end: false,
        }
    }
}

// ============================================================================
// Rewrite
// ============================================================================

/// Inspects an outbound payload under `config`.
#[must_use]
pub fn rewrite_outbound(config: &RewriteConfig, payload: &Payload) -> OutboundOutcome {
    let text = match payload.as_text() {
        Ok(text) => text,
        Err(e) => {
            trace!(error = %e, "Outbound payload is not text");
            return OutboundOutcome::forward();
        }
    };

    if let Some(pattern) = config.blocking_pattern(text) {
        return OutboundOutcome {
            action: OutboundAction::Block {
                pattern: pattern.to_string(),
            },
            write_file_end: false,
        };
    }

    let mut envelope: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            trace!(error = %e, "Outbound payload is not JSON");
            return OutboundOutcome::forward();
        }
    };

    let write_file_end = is_write_file_end(&envelope);

    let action = match encode_cleared(&mut envelope) {
        Ok(Some(rewritten)) => OutboundAction::Rewrite(payload.with_text(rewritten)),
        Ok(None) => OutboundAction::Forward,
        Err(e) if e.is_recoverable() => {
            trace!(error = %e, "Outbound envelope passed through");
            OutboundAction::Forward
        }
        Err(e) => {
            warn!(error = %e, "Outbound envelope could not be rewritten");
            OutboundAction::Forward
        }
    };

    OutboundOutcome {
        action,
        write_file_end,
    }
}

fn encode_cleared(envelope: &mut Value) -> Result<Option<String>> {
    if !clear_success_action(envelope)? {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(envelope)?))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    const WRITE_END: &str = r#"{"Action":"useraction","path":"_Writefileend","action":"{\"SuccessAction\":\"notify\"}"}"#;

    fn rewritten_text(outcome: OutboundOutcome) -> String {
        match outcome.action {
            OutboundAction::Rewrite(payload) => payload.as_text().expect("text").to_string(),
            other => panic!("expected rewrite, got {other:?}"),
        }
    }

    #[test]
    fn test_clears_success_action() {
        let outcome = rewrite_outbound(&RewriteConfig::default(), &Payload::from(WRITE_END));
        assert!(outcome.write_file_end);

        let text = rewritten_text(outcome);
        let envelope: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(envelope["Action"], "useraction");
        assert_eq!(envelope["path"], "_Writefileend");

        let inner: Value = serde_json::from_str(envelope["action"].as_str().expect("string"))
            .expect("nested json");
        assert_eq!(inner, serde_json::json!({ "SuccessAction": "" }));
    }

    #[test]
    fn test_key_order_is_preserved() {
        let text = rewritten_text(rewrite_outbound(
            &RewriteConfig::default(),
            &Payload::from(WRITE_END),
        ));
        assert_eq!(
            text,
            r#"{"Action":"useraction","path":"_Writefileend","action":"{\"SuccessAction\":\"\"}"}"#
        );
    }

    #[test]
    fn test_binary_stays_binary() {
        let payload = Payload::Binary(WRITE_END.as_bytes().to_vec());
        let outcome = rewrite_outbound(&RewriteConfig::default(), &payload);
        assert!(matches!(outcome.action, OutboundAction::Rewrite(Payload::Binary(_))));
    }

    #[test]
    fn test_other_path_is_forwarded() {
        let payload = Payload::from(
            r#"{"Action":"useraction","path":"_Open","action":"{\"SuccessAction\":\"notify\"}"}"#,
        );
        let outcome = rewrite_outbound(&RewriteConfig::default(), &payload);
        assert_eq!(outcome.action, OutboundAction::Forward);
        assert!(!outcome.write_file_end);
    }

    #[test]
    fn test_malformed_nested_action_is_forwarded() {
        let mut envelope: Value = serde_json::from_str(
            r#"{"Action":"useraction","path":"_Writefileend","action":"{broken"}"#,
        )
        .expect("json");

        let err = encode_cleared(&mut envelope).unwrap_err();
        assert!(err.is_recoverable());

        let payload = Payload::from(envelope.to_string());
        let outcome = rewrite_outbound(&RewriteConfig::default(), &payload);
        assert_eq!(outcome.action, OutboundAction::Forward);
        assert!(outcome.write_file_end);
    }

    #[test]
    fn test_non_json_and_invalid_utf8_are_forwarded() {
        let config = RewriteConfig::default();
        assert_eq!(
            rewrite_outbound(&config, &Payload::from("ping")).action,
            OutboundAction::Forward
        );
        assert_eq!(
            rewrite_outbound(&config, &Payload::Binary(vec![0xff, 0x00])).action,
            OutboundAction::Forward
        );
    }

    #[test]
    fn test_block_pattern() {
        let config = RewriteConfig::default().with_block_pattern("_Logout");
        let payload = Payload::from(r#"{"Action":"useraction","path":"_Logout"}"#);

        assert_eq!(
            rewrite_outbound(&config, &payload).action,
            OutboundAction::Block {
                pattern: "_Logout".into()
            }
        );
    }

    proptest! {
        #[test]
        fn prop_non_envelopes_are_forwarded(text in "[^\\{]*") {
            let outcome = rewrite_outbound(&RewriteConfig::default(), &Payload::Text(text));
            prop_assert_eq!(outcome.action, OutboundAction::Forward);
        }

        #[test]
        fn prop_arbitrary_bytes_never_rewrite_unless_envelope(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let outcome = rewrite_outbound(&RewriteConfig::default(), &Payload::Binary(bytes));
            prop_assert_eq!(outcome.action, OutboundAction::Forward);
        }
    }
}
