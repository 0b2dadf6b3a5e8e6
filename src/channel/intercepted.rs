//! Intercepting channel decorator.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::engine::{Interceptor, OutboundAction};
use crate::error::Result;
use crate::identifiers::ChannelId;

use super::{Channel, ChannelEvent, EventKind, Listener, Payload, ReadyState};

// ============================================================================
// InterceptedChannel
// ============================================================================

/// A channel whose send path, message listeners and message handler all
/// pass through an [`Interceptor`].
///
/// Wrap each channel once; wrapping an already intercepted channel rewrites
/// twice.
pub struct InterceptedChannel<C> {
    /// Wrapped channel.
    inner: C,
    /// Shared engine.
    interceptor: Interceptor,
    /// Log correlation ID.
    id: ChannelId,
}

impl<C: Channel> InterceptedChannel<C> {
    /// Wraps `inner`.
    pub fn new(inner: C, interceptor: Interceptor) -> Self {
        let id = ChannelId::generate();
        info!(channel_id = %id, "Channel intercepted");

        Self {
            inner,
            interceptor,
            id,
        }
    }

    /// Returns the channel ID used in log records.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ChannelId {
        self.id
    }

    /// Returns the wrapped channel.
    #[inline]
    #[must_use]
    pub const fn inner(&self) -> &C {
        &self.inner
    }

    /// Returns the engine.
    #[inline]
    #[must_use]
    pub const fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    /// Unwraps the decorator.
    #[must_use]
    pub fn into_inner(self) -> C {
        self.inner
    }

    fn wrap_listener(&self, listener: Listener) -> Listener {
        let interceptor = self.interceptor.clone();
        let id = self.id;

        Arc::new(move |event: &ChannelEvent| {
            match interceptor.process_inbound(id, event) {
                Some(rewritten) => listener(&rewritten),
                None => listener(event),
            }
        })
    }
}

// ============================================================================
// Channel Implementation
// ============================================================================

impl<C: Channel> Channel for InterceptedChannel<C> {
    fn send(&self, payload: Payload) -> Result<()> {
        match self.interceptor.process_outbound(self.id, &payload) {
            OutboundAction::Forward => self.inner.send(payload),

            OutboundAction::Rewrite(rewritten) => match self.inner.send(rewritten) {
                Ok(()) => Ok(()),
                Err(e) => {
                    warn!(
                        channel_id = %self.id,
                        error = %e,
                        transport = e.is_transport_error(),
                        "Rewritten send failed, sending original"
                    );
                    // The first failure is the one reported.
                    self.inner.send(payload).map_err(|_| e)
                }
            },

            OutboundAction::Block { .. } => {
                if let Err(e) = self.inner.close() {
                    warn!(channel_id = %self.id, error = %e, "Failed to close blocked channel");
                }
                Ok(())
            }
        }
    }

    fn add_event_listener(&self, kind: EventKind, listener: Listener) {
        let listener = if kind == EventKind::Message {
            self.wrap_listener(listener)
        } else {
            listener
        };

        self.inner.add_event_listener(kind, listener);
    }

    fn set_onmessage(&self, handler: Option<Listener>) {
        let handler = handler.map(|handler| self.wrap_listener(handler));
        self.inner.set_onmessage(handler);
    }

    fn close(&self) -> Result<()> {
        self.inner.close()
    }

    fn ready_state(&self) -> ReadyState {
        self.inner.ready_state()
    }
}

impl<C: fmt::Debug> fmt::Debug for InterceptedChannel<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptedChannel")
            .field("id", &self.id)
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
