//! Channel abstraction and the interception decorator.
//!
//! A [`Channel`] exposes the three points through which an application
//! talks to its transport:
//!
//! | Point | Method |
//! |-------|--------|
//! | Outbound send | [`Channel::send`] |
//! | Listener registration | [`Channel::add_event_listener`] |
//! | Single handler slot | [`Channel::set_onmessage`] |
//!
//! [`InterceptedChannel`] wraps any channel and rewrites traffic at all three
//! points; everything else (`close`, `ready_state`, non-message listeners)
//! is forwarded as is.
//!
//! # Example
//!
//! ```ignore
//! use ws_interceptor::{Interceptor, MemoryChannel, RewriteConfig};
//!
//! let interceptor = Interceptor::new(RewriteConfig::redirect(r"D:\out"));
//! let channel = interceptor.wrap(MemoryChannel::new());
//!
//! channel.set_onmessage(Some(Arc::new(|event| println!("{:?}", event.text()))));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// Payload and event types.
pub mod event;

/// Intercepting decorator.
pub mod intercepted;

/// In-process loopback channel.
pub mod memory;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{ChannelEvent, EventKind, Payload};
pub use intercepted::InterceptedChannel;
pub use memory::MemoryChannel;

// ============================================================================
// Types
// ============================================================================

/// Listener callback type.
///
/// Called with each event of the kind it was registered for.
pub type Listener = Arc<dyn Fn(&ChannelEvent) + Send + Sync>;

/// Connection state of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadyState {
    /// Not yet open.
    Connecting,
    /// Open and able to send.
    Open,
    /// Close initiated.
    Closing,
    /// Closed.
    Closed,
}

// ============================================================================
// Channel
// ============================================================================

/// A bidirectional message channel.
///
/// Methods take `&self`; implementations use interior mutability so a
/// channel can be shared with the listeners it dispatches to.
pub trait Channel: Send + Sync {
    /// Sends a payload.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the payload could not be sent.
    fn send(&self, payload: Payload) -> Result<()>;

    /// Registers a listener for `kind` events.
    fn add_event_listener(&self, kind: EventKind, listener: Listener);

    /// Sets or clears the single message handler.
    fn set_onmessage(&self, handler: Option<Listener>);

    /// Closes the channel.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the close could not be initiated.
    fn close(&self) -> Result<()>;

    /// Returns the current connection state.
    fn ready_state(&self) -> ReadyState;
}
