//! REST upload fallback for locally captured images.

use async_trait::async_trait;
use serde_json::{json, Value};

use urc_proto::DEVICE_PORT;

use crate::errors::SessionError;

/// Errors raised by the upload path.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The request never completed.
    #[error("network error: {0}")]
    Network(String),

    /// The device answered with a non-success status.
    #[error("device returned status {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The device answered 200 but embedded an error in the body.
    #[error("{0}")]
    DeviceRejected(String),

    /// The response body could not be decoded.
    #[error("unreadable response: {0}")]
    BadResponse(String),
}

impl From<UploadError> for SessionError {
    fn from(e: UploadError) -> Self {
        match e {
            // Keep the device's own wording as the failure detail.
            UploadError::DeviceRejected(detail) => SessionError::UploadFailed(detail),
            other => SessionError::UploadFailed(other.to_string()),
        }
    }
}

/// One-shot request/response path for pushing a handheld-captured image to
/// the device for analysis.
#[async_trait]
pub trait UploadChannel: Send + Sync {
    /// Submit a text-encoded image and return the raw analysis payload.
    /// The payload is unvalidated; normalization happens downstream.
    async fn analyze(&self, image: &str) -> Result<Value, UploadError>;
}

/// `POST /analyze_external` against the device's REST service.
#[derive(Clone)]
pub struct RestUploadChannel {
    base_url: String,
    client: reqwest::Client,
}

impl RestUploadChannel {
    /// Create an upload channel for the device at `address`.
    pub fn new(address: &str) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| UploadError::Network(e.to_string()))?;
        Ok(Self {
            base_url: format!("http://{address}:{DEVICE_PORT}"),
            client,
        })
    }
}

#[async_trait]
impl UploadChannel for RestUploadChannel {
    async fn analyze(&self, image: &str) -> Result<Value, UploadError> {
        let url = format!("{}/analyze_external", self.base_url);
        let resp = self
            .client
            .post(url)
            .json(&json!({ "image": image }))
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(UploadError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let value: Value = resp
            .json()
            .await
            .map_err(|e| UploadError::BadResponse(e.to_string()))?;

        if let Some(detail) = value.get("error").and_then(Value::as_str) {
            return Err(UploadError::DeviceRejected(detail.to_string()));
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_rejection_detail_survives_conversion() {
        let err = SessionError::from(UploadError::DeviceRejected("sensor fault".into()));
        assert_eq!(err, SessionError::UploadFailed("sensor fault".into()));
    }

    #[test]
    fn status_errors_mention_the_code() {
        let err = SessionError::from(UploadError::Status {
            status: 503,
            detail: "busy".into(),
        });
        match err {
            SessionError::UploadFailed(detail) => {
                assert!(detail.contains("503"));
                assert!(detail.contains("busy"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn base_url_targets_the_fixed_port() {
        let upload = RestUploadChannel::new("192.168.4.1").unwrap();
        assert_eq!(upload.base_url, "http://192.168.4.1:5000");
    }
}
