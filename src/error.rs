//! Error types for the interception engine.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Rewriting never fails from the caller's point of view: every pipeline
//! stage (decode, parse, shape match, grammar) reports its failure as an
//! [`Error`], and the engine turns that failure into pass-through. The only
//! errors surfaced by [`Channel::send`](crate::channel::Channel::send) are
//! downstream transport failures.
//!
//! ```ignore
//! use ws_interceptor::{Result, Error};
//!
//! fn forward(channel: &impl Channel, payload: Payload) -> Result<()> {
//!     channel.send(payload)?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Pipeline | [`Error::Decode`], [`Error::Json`], [`Error::Shape`], [`Error::Pattern`] |
//! | Configuration | [`Error::Config`] |
//! | Transport | [`Error::Send`], [`Error::ConnectionClosed`], [`Error::WebSocket`] |
//! | External | [`Error::Io`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;
use std::str::Utf8Error;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Pipeline Errors
    // ========================================================================
    /// Payload bytes are not valid UTF-8.
    #[error("Decode error: {0}")]
    Decode(#[from] Utf8Error),

    /// Payload or nested field is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON with a structure the engine does not handle.
    #[error("Shape mismatch: {message}")]
    Shape {
        /// What was expected.
        message: String,
    },

    /// Embedded call expression does not follow the `mtempPrt(...)` grammar.
    #[error("Pattern error at offset {offset}: {message}")]
    Pattern {
        /// Byte offset into the parameter string.
        offset: usize,
        /// Description of the grammar violation.
        message: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when a rewrite configuration cannot be loaded.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Downstream send failed.
    ///
    /// This is the only error an intercepted `send` propagates.
    #[error("Send failed: {message}")]
    Send {
        /// Description of the send failure.
        message: String,
    },

    /// Channel closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a shape mismatch error.
    #[inline]
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape {
            message: message.into(),
        }
    }

    /// Creates a grammar error at `offset`.
    #[inline]
    pub fn pattern(offset: usize, message: impl Into<String>) -> Self {
        Self::Pattern {
            offset,
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a send error.
    #[inline]
    pub fn send(message: impl Into<String>) -> Self {
        Self::Send {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the engine recovers from this error by passing the
    /// message through unmodified.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Decode(_) | Self::Json(_) | Self::Shape { .. } | Self::Pattern { .. }
        )
    }

    /// Returns `true` if this error came from the underlying transport.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Send { .. } | Self::ConnectionClosed | Self::WebSocket(_) | Self::Io(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::shape("expected array");
        assert_eq!(err.to_string(), "Shape mismatch: expected array");

        let err = Error::pattern(9, "expected ','");
        assert_eq!(err.to_string(), "Pattern error at offset 9: expected ','");
    }

    #[test]
    fn test_pipeline_errors_are_recoverable() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let utf8_err = std::str::from_utf8(&[0xff, 0xfe]).unwrap_err();

        assert!(Error::from(json_err).is_recoverable());
        assert!(Error::from(utf8_err).is_recoverable());
        assert!(Error::shape("x").is_recoverable());
        assert!(Error::pattern(0, "x").is_recoverable());
        assert!(!Error::send("boom").is_recoverable());
    }

    #[test]
    fn test_is_transport_error() {
        assert!(Error::send("boom").is_transport_error());
        assert!(Error::ConnectionClosed.is_transport_error());
        assert!(!Error::config("bad").is_transport_error());
        assert!(!Error::shape("x").is_transport_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
