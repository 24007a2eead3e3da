//! Realtime transport for the URC system.
//!
//! This crate provides the event-based channel to one analyzer device:
//! a trait for pluggable channel implementations, connection state tracking
//! with bounded reconnection, the WebSocket implementation used in
//! production, and scriptable test doubles.
//!
//! One channel is bound to one device address for its whole lifetime. An
//! address change means tearing the channel down and creating a new one;
//! handles are owned by the surrounding application and passed in
//! explicitly, never reached through a global.

#![forbid(unsafe_code)]

pub mod connection;
pub mod testing;
pub mod traits;
pub mod ws;

pub use connection::{ConnectionMonitor, ConnectionState, ReconnectPolicy};
pub use traits::{ChannelError, EventChannel, EventHandler};
pub use ws::WsChannel;
