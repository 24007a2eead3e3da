//! Capture strategy selection.

use serde::{Deserialize, Serialize};

/// How the sample image will be acquired. Decided once per session, at the
/// moment the capability answer arrives, and never re-decided mid-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureMode {
    /// The device camera captures; the trigger and result travel over the
    /// realtime channel.
    #[serde(rename = "REMOTE")]
    Remote,
    /// The handheld captures; the image is pushed over the REST upload
    /// fallback.
    #[serde(rename = "LOCAL")]
    Local,
}

impl std::fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureMode::Remote => f.write_str("REMOTE"),
            CaptureMode::Local => f.write_str("LOCAL"),
        }
    }
}

/// Pick the capture strategy from the capability answer. A present device
/// camera always wins; there is no user override and no third outcome.
pub fn select_capture_mode(remote_camera_present: bool) -> CaptureMode {
    if remote_camera_present {
        CaptureMode::Remote
    } else {
        CaptureMode::Local
    }
}
