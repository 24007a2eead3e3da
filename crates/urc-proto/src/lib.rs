//! URC Proto - Wire contract for UriStrip Remote Capture.
//!
//! This crate defines everything that crosses the wire between the handheld
//! client and the analyzer device:
//! - Realtime event identifiers and their payload shapes
//! - The canonical analysis result entity
//! - REST payload types for persistence and profile operations
//! - Image reference resolution (inline payload vs. server-side filename)

#![forbid(unsafe_code)]

pub mod events;
pub mod image;
pub mod profile;
pub mod result;

pub use events::{EventFrame, HardwareStatus};
pub use image::{resolve_image_reference, ImageKind, ImageRef};
pub use profile::{Profile, ProfileUpdate, ProfileUpdateOutcome};
pub use result::{AnalysisResult, Diagnosis, Role, ANALYTES, NOT_DETECTED};

/// TCP port the analyzer device listens on, for both the realtime channel
/// and the REST service.
pub const DEVICE_PORT: u16 = 5000;
