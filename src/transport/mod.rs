//! WebSocket transport adapter.
//!
//! Applies the interception engine to real tungstenite streams.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐      InterceptedStream      ┌─────────────────┐
//! │  Application    │ ──start_send──► rewrite ──► │  WebSocket      │
//! │                 │ ◄──poll_next─── rewrite ◄── │  Stream         │
//! └─────────────────┘                             └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `stream` | `Stream`/`Sink` adapter and connect/accept helpers |

// ============================================================================
// Submodules
// ============================================================================

/// Intercepting stream adapter.
pub mod stream;

// ============================================================================
// Re-exports
// ============================================================================

pub use stream::{ClientStream, InterceptedStream, ServerStream, accept, connect};
