//! URC Controller - CLI for driving a strip analyzer device
//!
//! This crate provides a command-line interface for:
//! - Running a capture-and-analyze session (device camera or handheld
//!   image upload, decided by the device's capabilities)
//! - Browsing stored results
//! - Showing and updating the device-held profile
//! - Powering the device off

pub mod capture;
pub mod cli;
pub mod config;
pub mod device;
pub mod history;
pub mod output;
pub mod profile;

pub use cli::Cli;
pub use config::{CliOverrides, Config};
pub use output::{JsonResponse, OutputFormat, OutputFormatter};

use urc_core::{GatewayError, SessionError};

/// Exit codes for CLI operations
///
/// Exit codes provide machine-readable status for scripting:
/// - 0: Success - operation completed successfully
/// - 1: General error - unspecified error occurred
/// - 2: Connection failed - could not reach the device
/// - 3: Timeout - the device did not answer in time
/// - 4: Invalid input - bad arguments or data provided
/// - 5: Analysis failed - the capture ran but produced no valid result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully (exit code 0)
    Success = 0,
    /// General error (exit code 1)
    GeneralError = 1,
    /// Could not reach the device (exit code 2)
    ConnectionFailed = 2,
    /// Operation timed out (exit code 3)
    Timeout = 3,
    /// Invalid input provided (exit code 4)
    InvalidInput = 4,
    /// The analysis itself failed (exit code 5)
    AnalysisFailed = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Convert to process exit code
    pub fn to_exit_code(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self as u8)
    }

    /// Map a session failure to the exit code it should produce.
    pub fn from_session_error(e: &SessionError) -> Self {
        match e {
            SessionError::NotConnected | SessionError::Disconnected => ExitCode::ConnectionFailed,
            SessionError::HardwareProbeTimeout | SessionError::CaptureTimeout => ExitCode::Timeout,
            SessionError::InvalidState(_) => ExitCode::GeneralError,
            SessionError::UploadFailed(_)
            | SessionError::InvalidPayload(_)
            | SessionError::SemanticError(_) => ExitCode::AnalysisFailed,
        }
    }

    /// Map a gateway failure to the exit code it should produce.
    pub fn from_gateway_error(e: &GatewayError) -> Self {
        match e {
            GatewayError::Network(_) => ExitCode::ConnectionFailed,
            GatewayError::Status { .. } | GatewayError::BadResponse(_) | GatewayError::Rejected(_) => {
                ExitCode::GeneralError
            }
        }
    }

    /// Get the exit code name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::GeneralError => "GENERAL_ERROR",
            ExitCode::ConnectionFailed => "CONNECTION_FAILED",
            ExitCode::Timeout => "TIMEOUT",
            ExitCode::InvalidInput => "INVALID_INPUT",
            ExitCode::AnalysisFailed => "ANALYSIS_FAILED",
        }
    }
}

#[cfg(test)]
mod exit_code_tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success as i32, 0);
        assert_eq!(ExitCode::GeneralError as i32, 1);
        assert_eq!(ExitCode::ConnectionFailed as i32, 2);
        assert_eq!(ExitCode::Timeout as i32, 3);
        assert_eq!(ExitCode::InvalidInput as i32, 4);
        assert_eq!(ExitCode::AnalysisFailed as i32, 5);
    }

    #[test]
    fn test_session_error_mapping() {
        assert_eq!(
            ExitCode::from_session_error(&SessionError::NotConnected),
            ExitCode::ConnectionFailed
        );
        assert_eq!(
            ExitCode::from_session_error(&SessionError::HardwareProbeTimeout),
            ExitCode::Timeout
        );
        assert_eq!(
            ExitCode::from_session_error(&SessionError::SemanticError("Error".into())),
            ExitCode::AnalysisFailed
        );
        assert_eq!(
            ExitCode::from_session_error(&SessionError::UploadFailed("sensor fault".into())),
            ExitCode::AnalysisFailed
        );
    }

    #[test]
    fn test_exit_code_names() {
        assert_eq!(ExitCode::Success.name(), "SUCCESS");
        assert_eq!(ExitCode::AnalysisFailed.name(), "ANALYSIS_FAILED");
    }
}
