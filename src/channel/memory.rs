//! In-process loopback channel.
//!
//! Records every sent payload and lets the host dispatch inbound events
//! itself. Used by hosts that own the event loop, and throughout the tests.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::{Error, Result};

use super::{Channel, ChannelEvent, EventKind, Listener, Payload, ReadyState};

// ============================================================================
// MemoryChannel
// ============================================================================

/// A channel that keeps sent payloads in memory.
///
/// Clones share the same state.
#[derive(Clone)]
pub struct MemoryChannel {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    sent: Mutex<Vec<Payload>>,
    listeners: Mutex<Vec<(EventKind, Listener)>>,
    onmessage: Mutex<Option<Listener>>,
    state: Mutex<ReadyState>,
    rejected_sends: Mutex<usize>,
}

impl MemoryChannel {
    /// Creates an open channel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                sent: Mutex::new(Vec::new()),
                listeners: Mutex::new(Vec::new()),
                onmessage: Mutex::new(None),
                state: Mutex::new(ReadyState::Open),
                rejected_sends: Mutex::new(0),
            }),
        }
    }

    /// Returns a copy of every payload sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Payload> {
        self.inner.sent.lock().clone()
    }

    /// Removes and returns every payload sent so far.
    pub fn take_sent(&self) -> Vec<Payload> {
        std::mem::take(&mut *self.inner.sent.lock())
    }

    /// Makes the next `count` sends fail with [`Error::Send`].
    pub fn reject_next_sends(&self, count: usize) {
        *self.inner.rejected_sends.lock() = count;
    }

    /// Returns the number of registered listeners, including the handler.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        let handler = usize::from(self.inner.onmessage.lock().is_some());
        self.inner.listeners.lock().len() + handler
    }

    /// Delivers `event` to every listener registered for its kind, then to
    /// the message handler for message events.
    ///
    /// Returns the number of callbacks invoked.
    pub fn dispatch(&self, event: &ChannelEvent) -> usize {
        // Callbacks run without the locks held so they may re-enter.
        let mut targets: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .iter()
            .filter(|(kind, _)| *kind == event.kind)
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        if event.kind == EventKind::Message
            && let Some(handler) = self.inner.onmessage.lock().as_ref()
        {
            targets.push(Arc::clone(handler));
        }

        for target in &targets {
            target(event);
        }

        trace!(kind = ?event.kind, count = targets.len(), "Event dispatched");
        targets.len()
    }
}

impl Default for MemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryChannel")
            .field("sent", &self.inner.sent.lock().len())
            .field("listeners", &self.listener_count())
            .field("state", &*self.inner.state.lock())
            .finish()
    }
}

// ============================================================================
// Channel Implementation
// ============================================================================

impl Channel for MemoryChannel {
    fn send(&self, payload: Payload) -> Result<()> {
        if *self.inner.state.lock() != ReadyState::Open {
            return Err(Error::ConnectionClosed);
        }

        {
            let mut rejected = self.inner.rejected_sends.lock();
            if *rejected > 0 {
                *rejected -= 1;
                return Err(Error::send("send rejected by memory channel"));
            }
        }

        self.inner.sent.lock().push(payload);
        Ok(())
    }

    fn add_event_listener(&self, kind: EventKind, listener: Listener) {
        self.inner.listeners.lock().push((kind, listener));
    }

    fn set_onmessage(&self, handler: Option<Listener>) {
        *self.inner.onmessage.lock() = handler;
    }

    fn close(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if *state == ReadyState::Closed {
                return Ok(());
            }
            *state = ReadyState::Closed;
        }

        self.dispatch(&ChannelEvent::signal(EventKind::Close));
        Ok(())
    }

    fn ready_state(&self) -> ReadyState {
        *self.inner.state.lock()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_send_records_payloads() {
        let channel = MemoryChannel::new();
        channel.send("a".into()).expect("send");
        channel.send(vec![1u8, 2].into()).expect("send");

        assert_eq!(
            channel.take_sent(),
            vec![Payload::Text("a".into()), Payload::Binary(vec![1, 2])]
        );
        assert!(channel.sent().is_empty());
    }

    #[test]
    fn test_reject_next_sends() {
        let channel = MemoryChannel::new();
        channel.reject_next_sends(1);

        assert!(matches!(channel.send("a".into()), Err(Error::Send { .. })));
        channel.send("b".into()).expect("second send succeeds");
        assert_eq!(channel.sent(), vec![Payload::Text("b".into())]);
    }

    #[test]
    fn test_dispatch_routes_by_kind() {
        let channel = MemoryChannel::new();
        let messages = Arc::new(AtomicUsize::new(0));
        let closes = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&messages);
        channel.add_event_listener(
            EventKind::Message,
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let counter = Arc::clone(&messages);
        channel.set_onmessage(Some(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })));
        let counter = Arc::clone(&closes);
        channel.add_event_listener(
            EventKind::Close,
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(channel.dispatch(&ChannelEvent::message("x")), 2);
        assert_eq!(messages.load(Ordering::SeqCst), 2);
        assert_eq!(closes.load(Ordering::SeqCst), 0);

        channel.close().expect("close");
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_send_after_close_fails() {
        let channel = MemoryChannel::new();
        channel.close().expect("close");

        assert_eq!(channel.ready_state(), ReadyState::Closed);
        assert!(matches!(channel.send("a".into()), Err(Error::ConnectionClosed)));
    }
}
