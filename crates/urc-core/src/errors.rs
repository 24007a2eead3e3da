//! Error types for the acquisition session.

use thiserror::Error;

/// Errors that terminate a session in the failed state.
///
/// Every variant carries enough detail to surface to the initiating caller.
/// Transport success and semantic success are independent: `SemanticError`
/// means the device answered normally but flagged the diagnosis itself as
/// an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// No realtime link at a point where one is required.
    #[error("no realtime link to the device")]
    NotConnected,

    /// The device did not answer the capability check in time.
    #[error("device did not report its hardware capabilities in time")]
    HardwareProbeTimeout,

    /// The device did not deliver an analysis result in time.
    #[error("device did not deliver an analysis result in time")]
    CaptureTimeout,

    /// The realtime link dropped while a session was in flight.
    #[error("realtime link dropped mid-session")]
    Disconnected,

    /// The REST upload fallback failed (network, status, or device-reported
    /// error).
    #[error("upload failed: {0}")]
    UploadFailed(String),

    /// The result payload is structurally malformed.
    #[error("invalid analysis payload: {0}")]
    InvalidPayload(String),

    /// The device answered successfully but marked the diagnosis itself as
    /// an error.
    #[error("device reported an analysis error: {0}")]
    SemanticError(String),

    /// An operation was invoked in a state that does not allow it.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// A save failure after a successful analysis. Non-fatal: the session stays
/// succeeded and the result remains displayable; this rides alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceWarning(pub String);

impl std::fmt::Display for PersistenceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "result could not be saved: {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_carry_readable_detail() {
        let err = SessionError::UploadFailed("sensor fault".into());
        assert_eq!(err.to_string(), "upload failed: sensor fault");

        let err = SessionError::SemanticError("Error: strip not found".into());
        assert!(err.to_string().contains("Error: strip not found"));
    }

    #[test]
    fn warning_display_includes_cause() {
        let warning = PersistenceWarning("network error".into());
        assert_eq!(
            warning.to_string(),
            "result could not be saved: network error"
        );
    }
}
