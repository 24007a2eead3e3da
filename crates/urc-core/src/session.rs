//! The acquisition session state machine.
//!
//! One session drives one capture attempt:
//!
//! ```text
//! IDLE -> PROBING -> {REMOTE_READY | LOCAL_READY} -> CAPTURING
//!      -> VALIDATING -> {SUCCEEDED | FAILED}
//! ```
//!
//! `SUCCEEDED` and `FAILED` are terminal; a new attempt starts from `IDLE`
//! after an explicit reset. There are no automatic retries anywhere in the
//! controller; the only retry policy in the system is the channel's own
//! bounded reconnection, which is exhausted before the controller ever
//! sees a connection error.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use urc_proto::events::{ANALYSIS_COMPLETE, TRIGGER_CAPTURE};
use urc_proto::{AnalysisResult, Role};
use urc_transport::EventChannel;

use crate::errors::{PersistenceWarning, SessionError};
use crate::gateway::PersistenceGateway;
use crate::normalize::normalize;
use crate::probe::{link_lost, HardwareProber};
use crate::select::{select_capture_mode, CaptureMode};
use crate::upload::UploadChannel;

/// States of one acquisition session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Ready to start; nothing in flight.
    Idle,
    /// Capability request sent, awaiting the answer.
    Probing,
    /// Device camera available; waiting for an explicit capture call.
    RemoteReady,
    /// No device camera; waiting for a handheld image to upload.
    LocalReady,
    /// A capture is in flight on one of the two paths.
    Capturing,
    /// Raw payload received, normalization running.
    Validating,
    /// Terminal: a validated result was produced.
    Succeeded,
    /// Terminal: the session failed with a [`SessionError`].
    Failed,
}

impl SessionState {
    /// Whether this state ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Succeeded | SessionState::Failed)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Idle => "IDLE",
            SessionState::Probing => "PROBING",
            SessionState::RemoteReady => "REMOTE_READY",
            SessionState::LocalReady => "LOCAL_READY",
            SessionState::Capturing => "CAPTURING",
            SessionState::Validating => "VALIDATING",
            SessionState::Succeeded => "SUCCEEDED",
            SessionState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Transient per-attempt state. Never persisted; discarded once the result
/// has been handed off.
#[derive(Clone, Debug)]
pub struct Session {
    /// Role the result will be tagged with on save.
    pub role: Role,
    /// Address of the device this session targets.
    pub device_address: String,
    /// Current state.
    pub state: SessionState,
    /// Capture strategy; decided exactly once, when the capability answer
    /// arrives, and fixed for the rest of the session.
    pub capture_mode: Option<CaptureMode>,
}

/// Product of a successful session: the validated result plus an optional
/// save warning. A warning never invalidates the result.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureOutcome {
    pub result: AnalysisResult,
    pub warning: Option<PersistenceWarning>,
}

/// Orchestrates one capture attempt over an explicitly owned channel.
///
/// The channel, upload path, and gateway are shared collaborators owned by
/// the surrounding application; the controller owns only the session. The
/// controller is not reentrant: a second capture call while one is in
/// flight is rejected by the state guard (and emits nothing). The internal
/// lock is never held across an await and plays no part in that rule.
pub struct SessionController {
    channel: Arc<dyn EventChannel>,
    upload: Arc<dyn UploadChannel>,
    gateway: Arc<dyn PersistenceGateway>,
    session: Mutex<Session>,
    prober: HardwareProber,
    capture_timeout: Duration,
}

impl SessionController {
    /// Create a controller for one device. The session binds to the
    /// address the channel was created for, so a stale handle cannot be
    /// paired with a fresh address.
    pub fn new(
        channel: Arc<dyn EventChannel>,
        upload: Arc<dyn UploadChannel>,
        gateway: Arc<dyn PersistenceGateway>,
        role: Role,
    ) -> Self {
        let device_address = channel.address().to_string();
        Self {
            channel,
            upload,
            gateway,
            session: Mutex::new(Session {
                role,
                device_address,
                state: SessionState::Idle,
                capture_mode: None,
            }),
            prober: HardwareProber::default(),
            capture_timeout: Duration::from_secs(90),
        }
    }

    /// Override the capability-answer timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.prober = HardwareProber::new(timeout);
        self
    }

    /// Override the analysis-result timeout.
    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = timeout;
        self
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.session.lock().state
    }

    /// Capture strategy, once decided.
    pub fn capture_mode(&self) -> Option<CaptureMode> {
        self.session.lock().capture_mode
    }

    /// Snapshot of the session.
    pub fn session(&self) -> Session {
        self.session.lock().clone()
    }

    /// Return to `IDLE` for a fresh attempt. The capture mode is cleared:
    /// the next session re-probes and re-decides.
    pub fn reset(&self) {
        let mut session = self.session.lock();
        session.state = SessionState::Idle;
        session.capture_mode = None;
    }

    /// Start a session: probe the device's capabilities and settle the
    /// capture strategy. Suspends until the capability answer arrives or
    /// the probe times out.
    pub async fn start(&self) -> Result<CaptureMode, SessionError> {
        {
            let mut session = self.session.lock();
            match session.state {
                SessionState::Idle => session.state = SessionState::Probing,
                other => {
                    return Err(SessionError::InvalidState(format!(
                        "cannot start a session from {other}"
                    )))
                }
            }
        }

        match self.prober.probe(self.channel.as_ref()).await {
            Ok(camera_present) => {
                let mode = select_capture_mode(camera_present);
                let mut session = self.session.lock();
                session.capture_mode = Some(mode);
                session.state = match mode {
                    CaptureMode::Remote => SessionState::RemoteReady,
                    CaptureMode::Local => SessionState::LocalReady,
                };
                tracing::info!(mode = %mode, address = %session.device_address, "session ready");
                Ok(mode)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Trigger the device camera and await the analysis result. Only valid
    /// in `REMOTE_READY`; a call while a capture is in flight is rejected
    /// without emitting a second trigger.
    pub async fn capture_remote(&self) -> Result<CaptureOutcome, SessionError> {
        self.enter_capturing(SessionState::RemoteReady)?;

        let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
        self.channel.subscribe(
            ANALYSIS_COMPLETE,
            Box::new(move |data| {
                let _ = tx.send(data);
            }),
        );

        let raw = self.await_remote_result(&mut rx).await;
        self.channel.unsubscribe(ANALYSIS_COMPLETE);

        match raw {
            Ok(raw) => self.validate(raw).await,
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Upload a handheld-captured, text-encoded image for analysis. Only
    /// valid in `LOCAL_READY`; same in-flight rejection rule as
    /// [`capture_remote`](Self::capture_remote).
    pub async fn capture_local(&self, image: &str) -> Result<CaptureOutcome, SessionError> {
        self.enter_capturing(SessionState::LocalReady)?;

        match self.upload.analyze(image).await {
            Ok(raw) => self.validate(raw).await,
            Err(e) => {
                let e = SessionError::from(e);
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Guarded `-> CAPTURING` transition shared by both capture paths.
    fn enter_capturing(&self, required: SessionState) -> Result<(), SessionError> {
        let mut session = self.session.lock();
        match session.state {
            state if state == required => {
                session.state = SessionState::Capturing;
                Ok(())
            }
            SessionState::Capturing => Err(SessionError::InvalidState(
                "a capture is already in flight".into(),
            )),
            other => Err(SessionError::InvalidState(format!(
                "cannot capture from {other}"
            ))),
        }
    }

    async fn await_remote_result(
        &self,
        rx: &mut mpsc::UnboundedReceiver<Value>,
    ) -> Result<Value, SessionError> {
        if self.channel.emit(TRIGGER_CAPTURE, None).await.is_err() {
            return Err(SessionError::Disconnected);
        }

        let mut state = self.channel.watch_state();
        tokio::select! {
            data = rx.recv() => data.ok_or(SessionError::Disconnected),
            _ = link_lost(&mut state) => Err(SessionError::Disconnected),
            _ = tokio::time::sleep(self.capture_timeout) => Err(SessionError::CaptureTimeout),
        }
    }

    /// Normalize the raw payload and hand the result to persistence. The
    /// session is marked succeeded before the save attempt: a save failure
    /// is a warning riding alongside a valid, displayable result.
    async fn validate(&self, raw: Value) -> Result<CaptureOutcome, SessionError> {
        self.session.lock().state = SessionState::Validating;

        let result = match normalize(raw) {
            Ok(result) => result,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        let role = {
            let mut session = self.session.lock();
            session.state = SessionState::Succeeded;
            session.role
        };

        let warning = match self.gateway.save(&result, role).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = %e, "save failed after successful analysis");
                Some(PersistenceWarning(e.to_string()))
            }
        };

        Ok(CaptureOutcome { result, warning })
    }

    fn fail(&self, e: &SessionError) {
        tracing::warn!(error = %e, "session failed");
        self.session.lock().state = SessionState::Failed;
    }
}
