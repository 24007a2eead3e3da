//! Persistence gateway: the device's REST record store.
//!
//! The session controller makes exactly one non-blocking save attempt per
//! successful analysis; everything else here (history, profile) is used by
//! surrounding surfaces, not by the controller.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use urc_proto::{AnalysisResult, Profile, ProfileUpdate, ProfileUpdateOutcome, Role, DEVICE_PORT};

/// Errors raised by gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request never completed.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("service returned status {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The response body could not be decoded.
    #[error("unreadable response: {0}")]
    BadResponse(String),

    /// The service answered but refused the operation.
    #[error("{0}")]
    Rejected(String),
}

/// Record store on the device.
///
/// History is ordered most-recent-first and every returned element carries
/// a timestamp; both are service guarantees, not re-checked here.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Store a result, tagged with the requesting role.
    async fn save(&self, result: &AnalysisResult, role: Role) -> Result<(), GatewayError>;

    /// Fetch stored results for a role, most recent first.
    async fn fetch_history(&self, role: Role) -> Result<Vec<AnalysisResult>, GatewayError>;

    /// Fetch the stored user profile.
    async fn get_profile(&self) -> Result<Profile, GatewayError>;

    /// Update the profile (and optionally the device's Wi-Fi credentials).
    async fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<ProfileUpdateOutcome, GatewayError>;
}

#[derive(Serialize)]
struct SaveRecordRequest<'a> {
    #[serde(flatten)]
    result: &'a AnalysisResult,
    role: Role,
}

/// REST gateway against the device at `http://<address>:5000`.
#[derive(Clone)]
pub struct RestGateway {
    base_url: String,
    client: reqwest::Client,
}

impl RestGateway {
    /// Create a gateway for the device at `address`.
    pub fn new(address: &str) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Ok(Self {
            base_url: format!("http://{address}:{DEVICE_PORT}"),
            client,
        })
    }

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let detail = resp.text().await.unwrap_or_default();
        Err(GatewayError::Status {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl PersistenceGateway for RestGateway {
    async fn save(&self, result: &AnalysisResult, role: Role) -> Result<(), GatewayError> {
        let url = format!("{}/save_record", self.base_url);
        let resp = self
            .client
            .post(url)
            .json(&SaveRecordRequest { result, role })
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Self::check_status(resp).await?;
        tracing::debug!(role = %role, "record saved");
        Ok(())
    }

    async fn fetch_history(&self, role: Role) -> Result<Vec<AnalysisResult>, GatewayError> {
        let url = format!("{}/get_history/{}", self.base_url, role);
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Self::check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::BadResponse(e.to_string()))
    }

    async fn get_profile(&self) -> Result<Profile, GatewayError> {
        let url = format!("{}/get_profile", self.base_url);
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Self::check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::BadResponse(e.to_string()))
    }

    async fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<ProfileUpdateOutcome, GatewayError> {
        let url = format!("{}/update_profile", self.base_url);
        let resp = self
            .client
            .post(url)
            .json(update)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        let value: Value = Self::check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::BadResponse(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| GatewayError::BadResponse(e.to_string()))
    }
}

/// In-memory gateway for tests: assigns ids and timestamps the way the
/// device does, keeps records per role, and can be told to fail saves.
pub struct InMemoryGateway {
    records: Mutex<Vec<(Role, AnalysisResult)>>,
    profile: Mutex<Profile>,
    fail_saves: AtomicBool,
    next_id: AtomicI64,
}

impl InMemoryGateway {
    /// Create an empty gateway.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            profile: Mutex::new(Profile {
                name: "User".to_string(),
                avatar: None,
            }),
            fail_saves: AtomicBool::new(false),
            next_id: AtomicI64::new(1),
        }
    }

    /// Make every subsequent save fail with a network error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Records saved so far, oldest first.
    pub fn saved(&self) -> Vec<(Role, AnalysisResult)> {
        self.records.lock().clone()
    }
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn save(&self, result: &AnalysisResult, role: Role) -> Result<(), GatewayError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("injected save failure".into()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut stored = result.clone();
        stored.id = Some(id);
        stored.timestamp = Some(format!("2025-06-01T12:00:{:02}Z", id % 60));
        self.records.lock().push((role, stored));
        Ok(())
    }

    async fn fetch_history(&self, role: Role) -> Result<Vec<AnalysisResult>, GatewayError> {
        let records = self.records.lock();
        Ok(records
            .iter()
            .rev()
            .filter(|(r, _)| *r == role)
            .map(|(_, result)| result.clone())
            .collect())
    }

    async fn get_profile(&self) -> Result<Profile, GatewayError> {
        Ok(self.profile.lock().clone())
    }

    async fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<ProfileUpdateOutcome, GatewayError> {
        let mut profile = self.profile.lock();
        profile.name = update.name.clone();
        if update.image.is_some() {
            profile.avatar = update.image.clone();
        }
        Ok(ProfileUpdateOutcome {
            success: true,
            avatar: profile.avatar.clone(),
            wifi_updated: Some(update.wifi_ssid.is_some()),
        })
    }
}
