//! Interception engine.
//!
//! The [`Interceptor`] owns nothing but handles: a read-only
//! [`SharedConfig`], the [`ParamsSlot`] side channel and an optional
//! observer. It is cheap to clone; every wrapped channel or stream holds its
//! own clone and is handled independently.
//!
//! # Flow
//!
//! ```text
//! app ──send──► InterceptedChannel ──process_outbound──► inner.send
//! app ◄─listener── wrapped listener ◄──process_inbound── inner dispatch
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `outbound` | Write-end envelope rewriting |
//! | `inbound` | Save command destination rewriting |
//! | `events` | Params slot and observer events |
//! | `builder` | Fluent construction |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tracing::{debug, warn};

use crate::channel::{Channel, ChannelEvent, EventKind, InterceptedChannel, Payload};
use crate::config::SharedConfig;
use crate::identifiers::ChannelId;
use crate::transport::InterceptedStream;

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder.
pub mod builder;

/// Params slot and observer events.
pub mod events;

/// Inbound rewriting.
pub mod inbound;

/// Outbound rewriting.
pub mod outbound;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::InterceptorBuilder;
pub use events::{Direction, InterceptEvent, Observer, ParamsSlot};
pub use inbound::{InboundOutcome, rewrite_inbound};
pub use outbound::{OutboundAction, OutboundOutcome, rewrite_outbound};

// ============================================================================
// Interceptor
// ============================================================================

/// The rewrite engine shared by every wrapped channel.
#[derive(Clone)]
pub struct Interceptor {
    /// Externally owned configuration.
    config: SharedConfig,
    /// Last extracted download parameters.
    params: ParamsSlot,
    /// Optional event observer.
    observer: Option<Observer>,
}

impl Interceptor {
    /// Creates an interceptor with no observer.
    #[must_use]
    pub fn new(config: impl Into<SharedConfig>) -> Self {
        Self::from_parts(config.into(), ParamsSlot::new(), None)
    }

    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> InterceptorBuilder {
        InterceptorBuilder::new()
    }

    pub(crate) fn from_parts(
        config: SharedConfig,
        params: ParamsSlot,
        observer: Option<Observer>,
    ) -> Self {
        Self {
            config,
            params,
            observer,
        }
    }

    /// Returns the configuration handle.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Returns the parameter slot.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &ParamsSlot {
        &self.params
    }

    /// Wraps a channel so its traffic passes through this engine.
    #[must_use]
    pub fn wrap<C: Channel>(&self, channel: C) -> InterceptedChannel<C> {
        InterceptedChannel::new(channel, self.clone())
    }

    /// Wraps a WebSocket stream so its traffic passes through this engine.
    #[must_use]
    pub fn wrap_stream<S>(&self, stream: S) -> InterceptedStream<S> {
        InterceptedStream::new(stream, self.clone())
    }
}

// ============================================================================
// Processing
// ============================================================================

impl Interceptor {
    /// Decides what to send in place of an outbound payload.
    pub fn process_outbound(&self, channel_id: ChannelId, payload: &Payload) -> OutboundAction {
        let outcome = self.config.with(|config| rewrite_outbound(config, payload));

        if outcome.write_file_end
            && let Ok(text) = payload.as_text()
        {
            self.emit(InterceptEvent::WriteFileEnd {
                direction: Direction::Outbound,
                text: text.to_string(),
            });
        }

        match &outcome.action {
            OutboundAction::Forward => {}
            OutboundAction::Rewrite(rewritten) => {
                debug!(
                    %channel_id,
                    len = rewritten.len(),
                    "Cleared SuccessAction on write-end envelope"
                );
            }
            OutboundAction::Block { pattern } => {
                warn!(%channel_id, %pattern, "Outbound frame blocked");
                self.emit(InterceptEvent::FrameBlocked {
                    pattern: pattern.clone(),
                });
            }
        }

        outcome.action
    }

    /// Rewrites inbound text, returning the replacement if anything changed.
    ///
    /// Extracted parameters are stored in the slot and reported to the
    /// observer even when the text itself is left unchanged.
    pub fn process_inbound_text(&self, channel_id: ChannelId, text: &str) -> Option<String> {
        let (outcome, policy) = self
            .config
            .with(|config| (rewrite_inbound(config, text), config.policy));

        for params in outcome.extracted {
            debug!(
                %channel_id,
                report_id = params.report_id,
                report_type = %params.report_type,
                mode = params.mode,
                "Download params extracted"
            );
            self.params.store(params.clone());
            self.emit(InterceptEvent::ParamsExtracted(params));
        }

        if outcome.write_file_end {
            self.emit(InterceptEvent::WriteFileEnd {
                direction: Direction::Inbound,
                text: text.to_string(),
            });
        }

        if outcome.rewritten.is_some() {
            debug!(%channel_id, %policy, "Save destination rewritten");
        }

        outcome.rewritten
    }

    /// Returns a replacement for an inbound message event, or `None` to
    /// deliver the original.
    pub fn process_inbound(
        &self,
        channel_id: ChannelId,
        event: &ChannelEvent,
    ) -> Option<ChannelEvent> {
        if event.kind != EventKind::Message {
            return None;
        }

        let text = event.text()?;
        self.process_inbound_text(channel_id, text)
            .map(ChannelEvent::message)
    }

    fn emit(&self, event: InterceptEvent) {
        if let Some(observer) = &self.observer {
            observer(&event);
        }
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("config", &self.config)
            .field("params", &self.params)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
