//! Hardware capability probing.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, watch};

use urc_proto::events::{CHECK_HARDWARE, HARDWARE_STATUS};
use urc_proto::HardwareStatus;
use urc_transport::{ConnectionState, EventChannel};

use crate::errors::SessionError;

/// Resolves once the watched link is no longer connected.
pub(crate) async fn link_lost(state: &mut watch::Receiver<ConnectionState>) {
    loop {
        if !state.borrow().is_connected() {
            return;
        }
        if state.changed().await.is_err() {
            return;
        }
    }
}

/// Asks the device whether it has a camera module attached.
///
/// One `CHECK_HARDWARE` request, exactly one `HARDWARE_STATUS` answer. The
/// caller is suspended until the answer arrives, the timeout elapses, or
/// the link drops.
pub struct HardwareProber {
    timeout: Duration,
}

impl Default for HardwareProber {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl HardwareProber {
    /// Create a prober with the given answer timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run the probe over `channel`. Fails immediately with
    /// [`SessionError::NotConnected`] if the channel has no live link
    /// rather than waiting out the timeout.
    pub async fn probe(&self, channel: &dyn EventChannel) -> Result<bool, SessionError> {
        if !channel.is_connected() {
            return Err(SessionError::NotConnected);
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
        channel.subscribe(
            HARDWARE_STATUS,
            Box::new(move |data| {
                let _ = tx.send(data);
            }),
        );

        let outcome = self.await_status(channel, &mut rx).await;
        channel.unsubscribe(HARDWARE_STATUS);
        outcome
    }

    async fn await_status(
        &self,
        channel: &dyn EventChannel,
        rx: &mut mpsc::UnboundedReceiver<Value>,
    ) -> Result<bool, SessionError> {
        if channel.emit(CHECK_HARDWARE, None).await.is_err() {
            // The link passed the entry check and died before the send.
            return Err(SessionError::Disconnected);
        }

        let mut state = channel.watch_state();
        tokio::select! {
            data = rx.recv() => {
                let data = data.ok_or(SessionError::Disconnected)?;
                let status: HardwareStatus = serde_json::from_value(data)
                    .map_err(|e| SessionError::InvalidPayload(e.to_string()))?;
                tracing::debug!(camera_detected = status.camera_detected, "capability answer");
                Ok(status.camera_detected)
            }
            _ = link_lost(&mut state) => Err(SessionError::Disconnected),
            _ = tokio::time::sleep(self.timeout) => Err(SessionError::HardwareProbeTimeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use urc_transport::testing::MockChannel;

    #[tokio::test]
    async fn probe_reports_camera_presence() {
        let channel = MockChannel::new("192.168.4.1").with_reply(
            CHECK_HARDWARE,
            HARDWARE_STATUS,
            json!({ "camera_detected": true }),
        );

        let present = HardwareProber::default().probe(&channel).await.unwrap();
        assert!(present);
        assert_eq!(channel.emitted_count(CHECK_HARDWARE), 1);
    }

    #[tokio::test]
    async fn probe_reports_camera_absence() {
        let channel = MockChannel::new("192.168.4.1").with_reply(
            CHECK_HARDWARE,
            HARDWARE_STATUS,
            json!({ "camera_detected": false }),
        );

        let present = HardwareProber::default().probe(&channel).await.unwrap();
        assert!(!present);
    }

    #[tokio::test]
    async fn probe_without_link_fails_immediately() {
        let channel = MockChannel::new("192.168.4.1");
        channel.disconnect();

        let result = HardwareProber::default().probe(&channel).await;
        assert_eq!(result, Err(SessionError::NotConnected));
        assert_eq!(channel.emitted_count(CHECK_HARDWARE), 0);
    }

    #[tokio::test]
    async fn unanswered_probe_times_out() {
        let channel = MockChannel::new("192.168.4.1");
        let prober = HardwareProber::new(Duration::from_millis(20));

        let result = prober.probe(&channel).await;
        assert_eq!(result, Err(SessionError::HardwareProbeTimeout));
    }

    #[tokio::test]
    async fn link_drop_during_probe_is_reported() {
        let channel = MockChannel::new("192.168.4.1").with_drop_on(CHECK_HARDWARE);
        let prober = HardwareProber::new(Duration::from_secs(5));

        let result = prober.probe(&channel).await;
        assert_eq!(result, Err(SessionError::Disconnected));
    }

    #[tokio::test]
    async fn malformed_capability_answer_is_rejected() {
        let channel = MockChannel::new("192.168.4.1").with_reply(
            CHECK_HARDWARE,
            HARDWARE_STATUS,
            json!({ "camera_detected": "maybe" }),
        );

        let result = HardwareProber::default().probe(&channel).await;
        assert!(matches!(result, Err(SessionError::InvalidPayload(_))));
    }

    #[tokio::test]
    async fn probe_unsubscribes_after_completion() {
        let channel = MockChannel::new("192.168.4.1").with_reply(
            CHECK_HARDWARE,
            HARDWARE_STATUS,
            json!({ "camera_detected": true }),
        );

        HardwareProber::default().probe(&channel).await.unwrap();
        assert!(!channel.has_handler(HARDWARE_STATUS));
    }
}
