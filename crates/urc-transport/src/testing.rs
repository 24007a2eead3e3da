//! Scriptable channel doubles for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;

use crate::connection::{ConnectionMonitor, ConnectionState};
use crate::traits::{ChannelError, EventChannel, EventHandler};

/// Mock event channel.
///
/// Records every emitted event and can be scripted to answer an outbound
/// event with an inbound one (`with_reply`) or to drop the link the moment
/// a given event goes out (`with_drop_on`). Starts connected.
pub struct MockChannel {
    address: String,
    handlers: Arc<Mutex<HashMap<String, EventHandler>>>,
    monitor: Arc<ConnectionMonitor>,
    emitted: Mutex<Vec<(String, Value)>>,
    replies: Mutex<HashMap<String, (String, Value)>>,
    drop_on: Mutex<HashSet<String>>,
}

impl MockChannel {
    /// Create a connected mock bound to `address`.
    pub fn new(address: impl Into<String>) -> Self {
        let monitor = ConnectionMonitor::new();
        monitor.transition(ConnectionState::Connected);
        Self {
            address: address.into(),
            handlers: Arc::new(Mutex::new(HashMap::new())),
            monitor: Arc::new(monitor),
            emitted: Mutex::new(Vec::new()),
            replies: Mutex::new(HashMap::new()),
            drop_on: Mutex::new(HashSet::new()),
        }
    }

    /// When `trigger` is emitted, deliver `reply_event` with `payload`.
    pub fn with_reply(
        self,
        trigger: &str,
        reply_event: &str,
        payload: Value,
    ) -> Self {
        self.replies
            .lock()
            .insert(trigger.to_string(), (reply_event.to_string(), payload));
        self
    }

    /// When `trigger` is emitted, drop the link immediately afterwards.
    pub fn with_drop_on(self, trigger: &str) -> Self {
        self.drop_on.lock().insert(trigger.to_string());
        self
    }

    /// Deliver an inbound event to the registered handler, if any.
    pub fn inject(&self, event: &str, data: Value) {
        let handlers = self.handlers.lock();
        if let Some(handler) = handlers.get(event) {
            handler(data);
        }
    }

    /// Simulate a link loss.
    pub fn disconnect(&self) {
        self.monitor.transition(ConnectionState::Disconnected);
    }

    /// Simulate the link coming back.
    pub fn reconnect(&self) {
        self.monitor.transition(ConnectionState::Connected);
    }

    /// Everything emitted so far, in order.
    pub fn emitted(&self) -> Vec<(String, Value)> {
        self.emitted.lock().clone()
    }

    /// How many times `event` has been emitted.
    pub fn emitted_count(&self, event: &str) -> usize {
        self.emitted
            .lock()
            .iter()
            .filter(|(name, _)| name == event)
            .count()
    }

    /// Whether a handler is currently registered for `event`.
    pub fn has_handler(&self, event: &str) -> bool {
        self.handlers.lock().contains_key(event)
    }
}

#[async_trait]
impl EventChannel for MockChannel {
    fn address(&self) -> &str {
        &self.address
    }

    async fn emit(&self, event: &str, payload: Option<Value>) -> Result<(), ChannelError> {
        if !self.is_connected() {
            return Err(ChannelError::NotConnected);
        }

        self.emitted
            .lock()
            .push((event.to_string(), payload.unwrap_or(Value::Null)));

        if self.drop_on.lock().contains(event) {
            // The send itself goes out; the link dies right after.
            self.disconnect();
            return Ok(());
        }

        let reply = self.replies.lock().get(event).cloned();
        if let Some((reply_event, data)) = reply {
            self.inject(&reply_event, data);
        }

        Ok(())
    }

    fn subscribe(&self, event: &str, handler: EventHandler) {
        self.handlers.lock().insert(event.to_string(), handler);
    }

    fn unsubscribe(&self, event: &str) {
        self.handlers.lock().remove(event);
    }

    fn is_connected(&self) -> bool {
        self.monitor.state().is_connected()
    }

    fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.monitor.subscribe()
    }
}
