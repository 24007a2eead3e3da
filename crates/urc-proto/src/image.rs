//! Image reference resolution.
//!
//! `image` and `reference_chart` carry either an inline text-encoded payload
//! or a server-side filename, and the wire format does not tag which. The
//! content-sniffing rule below is inherited from the device firmware and is
//! kept for wire compatibility; this function is its only implementation.

use crate::DEVICE_PORT;

/// Values longer than this are taken to be inline payloads. Filenames
/// emitted by the device are short tokens; encoded images are kilobytes.
/// TODO: tighten once the device firmware documents a filename length cap.
pub const INLINE_LENGTH_THRESHOLD: usize = 500;

const DATA_URI_PREFIX: &str = "data:";

/// How an image value should be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// The value itself contains the image bytes (text-encoded).
    Inline,
    /// The value names a file served by the device.
    RemoteFile,
}

/// A resolved image reference: the kind plus a URI a renderer can load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub kind: ImageKind,
    pub uri: String,
}

/// Resolve a raw `image`/`reference_chart` value against the device that
/// produced it. Returns `None` for an empty value (the device sends an
/// empty string when the requesting role is not granted the chart).
pub fn resolve_image_reference(value: &str, device_address: &str) -> Option<ImageRef> {
    if value.is_empty() {
        return None;
    }

    if value.starts_with(DATA_URI_PREFIX) {
        return Some(ImageRef {
            kind: ImageKind::Inline,
            uri: value.to_string(),
        });
    }

    if value.len() > INLINE_LENGTH_THRESHOLD {
        // Bare base64 from a local capture; synthesize the data URI the
        // renderer expects.
        return Some(ImageRef {
            kind: ImageKind::Inline,
            uri: format!("data:image/jpeg;base64,{value}"),
        });
    }

    Some(ImageRef {
        kind: ImageKind::RemoteFile,
        uri: format!("http://{device_address}:{DEVICE_PORT}/uploads/{value}"),
    })
}
