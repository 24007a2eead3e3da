//! Connection state tracking and bounded reconnection.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::sync::watch;

/// Connection state of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

impl ConnectionState {
    /// Whether traffic can flow in this state.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Tracks a channel's connection state and publishes transitions to any
/// number of observers. The watch channel lets a session await a drop
/// concurrently with awaiting an event.
pub struct ConnectionMonitor {
    tx: watch::Sender<ConnectionState>,
    reconnect_attempts: AtomicU32,
}

impl ConnectionMonitor {
    /// Create a monitor in the `Disconnected` state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectionState::Disconnected);
        Self {
            tx,
            reconnect_attempts: AtomicU32::new(0),
        }
    }

    /// Transition to `next`, returning the previous state.
    pub fn transition(&self, next: ConnectionState) -> ConnectionState {
        let prev = *self.tx.borrow();
        if next == ConnectionState::Reconnecting {
            self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
        }
        self.tx.send_replace(next);
        prev
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }

    /// Number of reconnection attempts made so far.
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.load(Ordering::Relaxed)
    }
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded reconnection with exponential backoff. Once the attempts are
/// exhausted the channel reports failure; retry policy beyond this bound
/// belongs to no one else in the system.
#[derive(Clone, Copy, Debug)]
pub struct ReconnectPolicy {
    /// Total connection attempts, first try included.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Cap on the backoff delay.
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl ReconnectPolicy {
    /// Backoff delay before attempt number `attempt` (zero-based; attempt 0
    /// runs immediately).
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let delay = self.base_delay.as_secs_f64() * 2.0_f64.powi(attempt as i32 - 1);
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_starts_disconnected() {
        let monitor = ConnectionMonitor::new();
        assert_eq!(monitor.state(), ConnectionState::Disconnected);
        assert!(!monitor.state().is_connected());
    }

    #[test]
    fn transition_returns_previous_state() {
        let monitor = ConnectionMonitor::new();
        let prev = monitor.transition(ConnectionState::Connecting);
        assert_eq!(prev, ConnectionState::Disconnected);
        assert_eq!(monitor.state(), ConnectionState::Connecting);
    }

    #[test]
    fn reconnecting_increments_attempt_count() {
        let monitor = ConnectionMonitor::new();
        monitor.transition(ConnectionState::Reconnecting);
        monitor.transition(ConnectionState::Reconnecting);
        assert_eq!(monitor.reconnect_attempts(), 2);
    }

    #[tokio::test]
    async fn observers_see_transitions() {
        let monitor = ConnectionMonitor::new();
        let mut rx = monitor.subscribe();
        monitor.transition(ConnectionState::Connected);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ConnectionState::Connected);
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.backoff(0), Duration::ZERO);
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_secs(1));
        assert_eq!(policy.backoff(20), policy.max_delay);
    }
}
