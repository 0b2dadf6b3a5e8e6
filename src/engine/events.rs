//! Side channel for extracted parameters and engine notifications.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;

use crate::protocol::DownloadParams;

// ============================================================================
// Direction
// ============================================================================

/// Direction of a frame relative to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Application to server.
    Outbound,
    /// Server to application.
    Inbound,
}

// ============================================================================
// InterceptEvent
// ============================================================================

/// Notification emitted to the observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptEvent {
    /// Report parameters were extracted from a save command.
    ParamsExtracted(DownloadParams),

    /// A write-end notification passed through.
    WriteFileEnd {
        /// Direction the frame travelled.
        direction: Direction,
        /// Original frame text.
        text: String,
    },

    /// An outbound frame matched a block pattern and was dropped.
    FrameBlocked {
        /// The matching pattern.
        pattern: String,
    },
}

/// Observer callback type.
pub type Observer = Arc<dyn Fn(&InterceptEvent) + Send + Sync>;

// ============================================================================
// ParamsSlot
// ============================================================================

/// Last-write-wins slot holding the most recently extracted parameters.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct ParamsSlot {
    inner: Arc<Mutex<Option<DownloadParams>>>,
}

impl ParamsSlot {
    /// Creates an empty slot.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored parameters.
    pub fn store(&self, params: DownloadParams) {
        *self.inner.lock() = Some(params);
    }

    /// Returns a copy of the stored parameters.
    #[must_use]
    pub fn latest(&self) -> Option<DownloadParams> {
        self.inner.lock().clone()
    }

    /// Removes and returns the stored parameters.
    pub fn take(&self) -> Option<DownloadParams> {
        self.inner.lock().take()
    }

    /// Empties the slot.
    pub fn clear(&self) {
        *self.inner.lock() = None;
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_none()
    }
}

// ============================================================================
// Tests
// ============================================================================
