//! The event channel trait and its error type.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use crate::connection::ConnectionState;

/// Handler invoked for each inbound event payload. Handlers run on the
/// channel's read task and must not block; hand work off through a
/// `tokio::sync` primitive instead.
pub type EventHandler = Box<dyn Fn(Value) + Send + Sync>;

/// Errors raised by channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The channel has no live connection.
    #[error("channel is not connected")]
    NotConnected,

    /// All connection attempts were exhausted.
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    /// The outbound half of the channel has shut down.
    #[error("channel is closed")]
    Closed,

    /// A payload could not be encoded for the wire.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Bidirectional, event-based realtime connection to one analyzer device.
///
/// Sends are fire-and-forget: a successful `emit` means the message was
/// handed to the connection, not that the device received it. Subscription
/// is replace-not-append: at most one handler is active per event name, and
/// registering a new one silently replaces the old. This is not a broadcast
/// bus.
#[async_trait]
pub trait EventChannel: Send + Sync {
    /// Device address this channel is bound to.
    fn address(&self) -> &str;

    /// Send a named event, fire-and-forget.
    async fn emit(&self, event: &str, payload: Option<Value>) -> Result<(), ChannelError>;

    /// Register `handler` for `event`, replacing any prior handler.
    fn subscribe(&self, event: &str, handler: EventHandler);

    /// Remove the handler for `event`, if any.
    fn unsubscribe(&self, event: &str);

    /// Whether a connection is currently live.
    fn is_connected(&self) -> bool;

    /// Observe connection state changes (e.g. to detect a drop while
    /// awaiting an event).
    fn watch_state(&self) -> watch::Receiver<ConnectionState>;

    /// Ask the device to power off. Fire-and-forget with no acknowledgment:
    /// the device may be gone before a reply could be written, so none is
    /// awaited and local connection state is left untouched.
    async fn shutdown_remote(&self) -> Result<(), ChannelError> {
        self.emit(urc_proto::events::SHUTDOWN_PI, None).await
    }
}
