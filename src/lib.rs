//! WebSocket interceptor - transparent in-flight message rewriting.
//!
//! This library wraps a bidirectional message channel and rewrites a narrow
//! vocabulary of JSON messages on their way through, leaving every other
//! frame untouched.
//!
//! # Architecture
//!
//! One engine, three interception points:
//!
//! - **Outbound send**: write-end envelopes get their `SuccessAction`
//!   cleared so the post-write callback never fires
//! - **Message listeners** and the **message handler slot**: `FileFastSave`
//!   commands get their destination path redirected or sunk, and the
//!   embedded report call is extracted
//!
//! Key design principles:
//!
//! - Fail open: any decode, parse, shape or grammar failure delivers the
//!   original message
//! - Configuration is injected and only read, never written
//! - Extracted parameters leave through an explicit slot and observer
//!
//! # Quick Start
//!
//! ```no_run
//! use ws_interceptor::{Interceptor, RewriteConfig, Result};
//! use ws_interceptor::transport::connect;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let interceptor = Interceptor::builder()
//!         .config(RewriteConfig::redirect(r"D:\reports"))
//!         .build();
//!
//!     // Every frame on this stream now passes through the engine
//!     let stream = connect("ws://127.0.0.1:9000/socket", &interceptor).await?;
//!
//!     if let Some(params) = interceptor.params().latest() {
//!         println!("report {} requested", params.report_id);
//!     }
//!     # drop(stream);
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`channel`] | [`Channel`] trait, [`InterceptedChannel`], [`MemoryChannel`] |
//! | [`config`] | [`RewriteConfig`] and [`SharedConfig`] |
//! | [`engine`] | [`Interceptor`] and the rewriters |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Recognized wire shapes |
//! | [`transport`] | tungstenite `Stream`/`Sink` adapter |

// ============================================================================
// Modules
// ============================================================================

/// Channel abstraction and interception decorator.
pub mod channel;

/// Rewrite configuration.
pub mod config;

/// Interception engine.
///
/// Use [`Interceptor::builder()`] to create a configured engine.
pub mod engine;

/// Error types and result aliases.
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Recognized application wire shapes.
pub mod protocol;

/// WebSocket transport adapter.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Channel types
pub use channel::{
    Channel, ChannelEvent, EventKind, InterceptedChannel, Listener, MemoryChannel, Payload,
    ReadyState,
};

// Config types
pub use config::{RewriteConfig, RewritePolicy, SharedConfig};

// Engine types
pub use engine::{
    Direction, InterceptEvent, Interceptor, InterceptorBuilder, Observer, OutboundAction,
    ParamsSlot,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::ChannelId;

// Protocol types
pub use protocol::DownloadParams;

// Transport types
pub use transport::InterceptedStream;
