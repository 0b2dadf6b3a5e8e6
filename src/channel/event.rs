//! Payloads and events carried by a channel.

// ============================================================================
// Imports
// ============================================================================

use std::str;

use crate::error::Result;

// ============================================================================
// Payload
// ============================================================================

/// A message payload as handed to `send` or carried by a message event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Text frame.
    Text(String),

    /// Binary frame.
    Binary(Vec<u8>),
}

impl Payload {
    /// Returns the payload as text, decoding binary frames as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`](crate::Error::Decode) if a binary payload
    /// is not valid UTF-8.
    pub fn as_text(&self) -> Result<&str> {
        match self {
            Self::Text(text) => Ok(text.as_str()),
            Self::Binary(bytes) => Ok(str::from_utf8(bytes)?),
        }
    }

    /// Returns a payload of the same frame kind carrying `text`.
    #[must_use]
    pub fn with_text(&self, text: String) -> Self {
        match self {
            Self::Text(_) => Self::Text(text),
            Self::Binary(_) => Self::Binary(text.into_bytes()),
        }
    }

    /// Returns `true` for binary payloads.
    #[inline]
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    /// Returns the payload length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    /// Returns `true` if the payload is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

// ============================================================================
// EventKind
// ============================================================================

/// Event types a listener can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Channel opened.
    Open,
    /// Inbound message.
    Message,
    /// Transport error.
    Error,
    /// Channel closed.
    Close,
}

// ============================================================================
// ChannelEvent
// ============================================================================

/// An event delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    /// Event type.
    pub kind: EventKind,

    /// Message data; `None` for non-message events.
    pub data: Option<Payload>,
}

impl ChannelEvent {
    /// Creates a message event.
    #[inline]
    #[must_use]
    pub fn message(data: impl Into<Payload>) -> Self {
        Self {
            kind: EventKind::Message,
            data: Some(data.into()),
        }
    }

    /// Creates a data-less event of `kind`.
    #[inline]
    #[must_use]
    pub const fn signal(kind: EventKind) -> Self {
        Self { kind, data: None }
    }

    /// Returns the text data of a text message event.
    #[inline]
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.data {
            Some(Payload::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_text_decodes_binary() {
        let payload = Payload::Binary(b"[1,2]".to_vec());
        assert_eq!(payload.as_text().expect("utf-8"), "[1,2]");

        let payload = Payload::Binary(vec![0xc3, 0x28]);
        assert!(payload.as_text().is_err());
    }

    #[test]
    fn test_with_text_keeps_frame_kind() {
        let binary = Payload::Binary(b"a".to_vec());
        assert_eq!(binary.with_text("b".into()), Payload::Binary(b"b".to_vec()));

        let text = Payload::from("a");
        assert_eq!(text.with_text("b".into()), Payload::Text("b".into()));
    }

    #[test]
    fn test_event_text() {
        assert_eq!(ChannelEvent::message("hi").text(), Some("hi"));
        assert_eq!(ChannelEvent::message(vec![1u8]).text(), None);
        assert_eq!(ChannelEvent::signal(EventKind::Close).text(), None);
    }
}
