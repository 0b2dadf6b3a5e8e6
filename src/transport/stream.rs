//! Intercepting WebSocket stream adapter.
//!
//! [`InterceptedStream`] sits between an application and any
//! `Stream + Sink` of tungstenite [`Message`]s, applying the same rewrites as
//! [`InterceptedChannel`](crate::channel::InterceptedChannel):
//!
//! - `start_send`: outbound rewrite, retrying the original frame if the
//!   rewritten one is rejected
//! - `poll_next`: inbound rewrite of text frames
//!
//! Ping, Pong, Close and raw frames pass through untouched.

// ============================================================================
// Imports
// ============================================================================

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures_util::{Sink, Stream};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::channel::Payload;
use crate::engine::{Interceptor, OutboundAction};
use crate::error::Result;
use crate::identifiers::ChannelId;

// ============================================================================
// InterceptedStream
// ============================================================================

/// A WebSocket stream whose frames pass through an [`Interceptor`].
#[derive(Debug)]
pub struct InterceptedStream<S> {
    /// Wrapped stream.
    inner: S,
    /// Shared engine.
    interceptor: Interceptor,
    /// Log correlation ID.
    id: ChannelId,
}

impl<S> InterceptedStream<S> {
    /// Wraps `inner`.
    pub fn new(inner: S, interceptor: Interceptor) -> Self {
        Self {
            inner,
            interceptor,
            id: ChannelId::generate(),
        }
    }

    /// Returns the stream ID used in log records.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ChannelId {
        self.id
    }

    /// Returns the wrapped stream.
    #[inline]
    #[must_use]
    pub const fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Returns the wrapped stream mutably.
    #[inline]
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Unwraps the adapter.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn rewrite_inbound(&self, message: Message) -> Message {
        match message {
            Message::Text(text) => match self
                .interceptor
                .process_inbound_text(self.id, text.as_str())
            {
                Some(rewritten) => Message::Text(rewritten.into()),
                None => Message::Text(text),
            },
            other => other,
        }
    }
}

fn to_payload(message: &Message) -> Option<Payload> {
    match message {
        Message::Text(text) => Some(Payload::Text(text.as_str().to_owned())),
        Message::Binary(bytes) => Some(Payload::Binary(bytes.to_vec())),
        _ => None,
    }
}

fn into_message(payload: Payload) -> Message {
    match payload {
        Payload::Text(text) => Message::Text(text.into()),
        Payload::Binary(bytes) => Message::Binary(bytes.into()),
    }
}

// ============================================================================
// Stream Implementation
// ============================================================================

impl<S> Stream for InterceptedStream<S>
where
    S: Stream<Item = std::result::Result<Message, WsError>> + Unpin,
{
    type Item = std::result::Result<Message, WsError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let item = ready!(Pin::new(&mut this.inner).poll_next(cx));

        Poll::Ready(item.map(|result| result.map(|message| this.rewrite_inbound(message))))
    }
}

// ============================================================================
// Sink Implementation
// ============================================================================

impl<S> Sink<Message> for InterceptedStream<S>
where
    S: Sink<Message, Error = WsError> + Unpin,
{
    type Error = WsError;

    fn poll_ready(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<std::result::Result<(), WsError>> {
        Pin::new(&mut self.get_mut().inner).poll_ready(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: Message) -> std::result::Result<(), WsError> {
        let this = self.get_mut();

        let Some(payload) = to_payload(&item) else {
            return Pin::new(&mut this.inner).start_send(item);
        };

        match this.interceptor.process_outbound(this.id, &payload) {
            OutboundAction::Forward => Pin::new(&mut this.inner).start_send(item),

            OutboundAction::Rewrite(rewritten) => {
                match Pin::new(&mut this.inner).start_send(into_message(rewritten)) {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        warn!(
                            channel_id = %this.id,
                            error = %e,
                            "Rewritten frame rejected, sending original"
                        );
                        Pin::new(&mut this.inner).start_send(item).map_err(|_| e)
                    }
                }
            }

            // The blocked frame is replaced by a close frame.
            OutboundAction::Block { .. } => {
                Pin::new(&mut this.inner).start_send(Message::Close(None))
            }
        }
    }

    fn poll_flush(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<std::result::Result<(), WsError>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_close(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<std::result::Result<(), WsError>> {
        Pin::new(&mut self.get_mut().inner).poll_close(cx)
    }
}

// ============================================================================
// Connection Helpers
// ============================================================================

/// Client stream type returned by [`connect`].
pub type ClientStream = InterceptedStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Server stream type returned by [`accept`].
pub type ServerStream = InterceptedStream<WebSocketStream<TcpStream>>;

/// Connects to `url` and wraps the resulting stream.
///
/// # Errors
///
/// Returns [`Error::WebSocket`](crate::Error::WebSocket) if the connection
/// or handshake fails.
pub async fn connect(url: &str, interceptor: &Interceptor) -> Result<ClientStream> {
    let (ws_stream, response) = tokio_tungstenite::connect_async(url).await?;

    debug!(%url, status = %response.status(), "WebSocket connected");

    Ok(interceptor.wrap_stream(ws_stream))
}

/// Completes the server-side handshake on `stream` and wraps it.
///
/// # Errors
///
/// Returns [`Error::WebSocket`](crate::Error::WebSocket) if the upgrade fails.
pub async fn accept(stream: TcpStream, interceptor: &Interceptor) -> Result<ServerStream> {
    let peer = stream.peer_addr()?;
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;

    debug!(?peer, "WebSocket accepted");

    Ok(interceptor.wrap_stream(ws_stream))
}

// ============================================================================
// Tests
// ============================================================================
