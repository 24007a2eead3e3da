//! URC Core - Business logic for UriStrip Remote Capture.
//!
//! This crate implements:
//! - The acquisition session state machine (one capture attempt at a time)
//! - Hardware capability probing over the realtime channel
//! - Capture strategy selection (device camera vs. handheld camera + upload)
//! - Result normalization and semantic-error detection
//! - The REST upload fallback for locally captured images
//! - The persistence gateway (save, history, profile)

#![forbid(unsafe_code)]

// The session state machine and its collaborators
pub mod probe;
pub mod select;
pub mod session;

// Result shaping
pub mod normalize;

// REST paths to the device
pub mod gateway;
pub mod upload;

// Supporting modules
pub mod errors;
pub mod harness;

pub use errors::{PersistenceWarning, SessionError};
pub use gateway::{GatewayError, InMemoryGateway, PersistenceGateway, RestGateway};
pub use normalize::normalize;
pub use probe::HardwareProber;
pub use select::{select_capture_mode, CaptureMode};
pub use session::{CaptureOutcome, Session, SessionController, SessionState};
pub use upload::{RestUploadChannel, UploadChannel, UploadError};
