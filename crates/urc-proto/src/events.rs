//! Realtime event identifiers and payload shapes.
//!
//! Event names are exact wire identifiers; the device matches on them
//! byte-for-byte. Payloads ride as JSON inside an [`EventFrame`] envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client -> device: ask whether a device-side camera module is attached.
/// No payload. Answered by exactly one [`HARDWARE_STATUS`] event.
pub const CHECK_HARDWARE: &str = "CHECK_HARDWARE";

/// Device -> client: capability answer, payload is [`HardwareStatus`].
pub const HARDWARE_STATUS: &str = "HARDWARE_STATUS";

/// Client -> device: fire the device camera and analyze the frame.
/// No payload. Completion arrives as [`ANALYSIS_COMPLETE`].
pub const TRIGGER_CAPTURE: &str = "TRIGGER_CAPTURE";

/// Device -> client: analysis finished, payload is an
/// [`AnalysisResult`](crate::AnalysisResult)-shaped object.
pub const ANALYSIS_COMPLETE: &str = "ANALYSIS_COMPLETE";

/// Client -> device: power the device off. Fire-and-forget; the device may
/// be gone before any acknowledgment could be written, so none is defined.
pub const SHUTDOWN_PI: &str = "SHUTDOWN_PI";

/// Capability answer for [`CHECK_HARDWARE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareStatus {
    /// Whether a camera module is attached to the device.
    pub camera_detected: bool,
}

/// Framing envelope for the realtime channel: one JSON text message per
/// event, `data` omitted or null for payload-less events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    /// Wire event identifier.
    pub event: String,
    /// Event payload; `Value::Null` when the event carries none.
    #[serde(default)]
    pub data: Value,
}

impl EventFrame {
    /// Build a frame for `event` with an optional payload.
    pub fn new(event: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            event: event.into(),
            data: data.unwrap_or(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn frame_without_payload_roundtrips() {
        let frame = EventFrame::new(CHECK_HARDWARE, None);
        let text = serde_json::to_string(&frame).unwrap();
        let back: EventFrame = serde_json::from_str(&text).unwrap();
        assert_eq!(back.event, CHECK_HARDWARE);
        assert!(back.data.is_null());
    }

    #[test]
    fn frame_missing_data_field_parses_as_null() {
        let back: EventFrame = serde_json::from_str(r#"{"event":"TRIGGER_CAPTURE"}"#).unwrap();
        assert_eq!(back.event, TRIGGER_CAPTURE);
        assert!(back.data.is_null());
    }

    #[test]
    fn hardware_status_parses_from_frame_data() {
        let frame = EventFrame::new(HARDWARE_STATUS, Some(json!({ "camera_detected": true })));
        let status: HardwareStatus = serde_json::from_value(frame.data).unwrap();
        assert!(status.camera_detected);
    }
}
