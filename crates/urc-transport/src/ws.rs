//! WebSocket implementation of the event channel.
//!
//! The device exposes a WebSocket endpoint at `ws://<address>:5000/ws`.
//! Events travel as JSON text frames in the
//! [`EventFrame`](urc_proto::EventFrame) envelope.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use urc_proto::{EventFrame, DEVICE_PORT};

use crate::connection::{ConnectionMonitor, ConnectionState, ReconnectPolicy};
use crate::traits::{ChannelError, EventChannel, EventHandler};

/// WebSocket event channel bound to one device address.
pub struct WsChannel {
    address: String,
    url: String,
    handlers: Arc<Mutex<HashMap<String, EventHandler>>>,
    monitor: Arc<ConnectionMonitor>,
    policy: ReconnectPolicy,
    connect_timeout: Duration,
    outbound: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl WsChannel {
    /// Create a channel for `address`. No I/O happens until
    /// [`connect`](Self::connect).
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        let url = format!("ws://{address}:{DEVICE_PORT}/ws");
        Self {
            address,
            url,
            handlers: Arc::new(Mutex::new(HashMap::new())),
            monitor: Arc::new(ConnectionMonitor::new()),
            policy: ReconnectPolicy::default(),
            connect_timeout: Duration::from_secs(10),
            outbound: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Override the reconnection policy.
    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the per-attempt connect timeout.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Establish the connection, making up to `max_attempts` tries with
    /// backoff in between. Resolves with an error only once every attempt
    /// has failed.
    pub async fn connect(&self) -> Result<(), ChannelError> {
        self.monitor.transition(ConnectionState::Connecting);
        let mut last_err = String::from("no attempts made");

        for attempt in 0..self.policy.max_attempts {
            if attempt > 0 {
                self.monitor.transition(ConnectionState::Reconnecting);
                tokio::time::sleep(self.policy.backoff(attempt)).await;
            }

            match timeout(
                self.connect_timeout,
                tokio_tungstenite::connect_async(self.url.as_str()),
            )
            .await
            {
                Ok(Ok((stream, _response))) => {
                    self.spawn_io(stream);
                    self.monitor.transition(ConnectionState::Connected);
                    tracing::info!(address = %self.address, attempt, "channel connected");
                    return Ok(());
                }
                Ok(Err(e)) => {
                    tracing::warn!(address = %self.address, attempt, error = %e, "connect attempt failed");
                    last_err = e.to_string();
                }
                Err(_) => {
                    tracing::warn!(address = %self.address, attempt, "connect attempt timed out");
                    last_err = "connection attempt timed out".to_string();
                }
            }
        }

        self.monitor.transition(ConnectionState::Failed);
        Err(ChannelError::ConnectFailed(last_err))
    }

    /// Tear the connection down and discard pending outbound messages.
    pub fn close(&self) {
        self.outbound.lock().take();
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.monitor.transition(ConnectionState::Disconnected);
    }

    fn spawn_io(
        &self,
        stream: tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    ) {
        let (mut sink, mut source) = stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        *self.outbound.lock() = Some(tx);

        let writer = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if sink.send(message).await.is_err() {
                    break;
                }
            }
        });

        let handlers = Arc::clone(&self.handlers);
        let monitor = Arc::clone(&self.monitor);
        let address = self.address.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => dispatch(&handlers, &text),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(address = %address, error = %e, "read error, dropping link");
                        break;
                    }
                }
            }
            monitor.transition(ConnectionState::Disconnected);
        });

        let mut tasks = self.tasks.lock();
        tasks.push(writer);
        tasks.push(reader);
    }
}

/// Decode a text frame and hand the payload to the registered handler.
fn dispatch(handlers: &Mutex<HashMap<String, EventHandler>>, text: &str) {
    let frame: EventFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(error = %e, "discarding undecodable frame");
            return;
        }
    };

    let handlers = handlers.lock();
    match handlers.get(&frame.event) {
        Some(handler) => handler(frame.data),
        None => tracing::debug!(event = %frame.event, "no handler registered"),
    }
}

#[async_trait]
impl EventChannel for WsChannel {
    fn address(&self) -> &str {
        &self.address
    }

    async fn emit(&self, event: &str, payload: Option<Value>) -> Result<(), ChannelError> {
        if !self.is_connected() {
            return Err(ChannelError::NotConnected);
        }
        let text = serde_json::to_string(&EventFrame::new(event, payload))?;
        let outbound = self.outbound.lock();
        match outbound.as_ref() {
            Some(tx) => tx
                .send(Message::Text(text))
                .map_err(|_| ChannelError::Closed),
            None => Err(ChannelError::NotConnected),
        }
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

impl Drop for WsChannel {
    fn drop(&mut self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}
