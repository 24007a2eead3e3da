//! Test fixtures shared by unit and integration tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};

use urc_proto::{AnalysisResult, Diagnosis};

use crate::upload::{UploadChannel, UploadError};

/// A healthy analysis payload, as the device emits it.
pub fn normal_payload() -> Value {
    json!({
        "diagnosis": {
            "leukocytes": "negative",
            "nitrites": "negative",
            "advice_medical": "WNL",
            "advice_layman": "All normal"
        },
        "image": "strip_0042.jpg",
        "full_results": { "pH": "6.5", "Glucose": "negative" },
        "reference_chart": ""
    })
}

/// The normalized form of [`normal_payload`].
pub fn normal_result() -> AnalysisResult {
    AnalysisResult {
        diagnosis: Diagnosis {
            leukocytes: "negative".into(),
            nitrites: "negative".into(),
            advice_medical: "WNL".into(),
            advice_layman: "All normal".into(),
        },
        image: "strip_0042.jpg".into(),
        full_results: BTreeMap::from([
            ("pH".to_string(), "6.5".to_string()),
            ("Glucose".to_string(), "negative".to_string()),
        ]),
        reference_chart: String::new(),
        timestamp: None,
        id: None,
    }
}

/// A bare text-encoded image payload of the given length.
pub fn inline_payload(len: usize) -> String {
    "A".repeat(len)
}

enum UploadScript {
    Succeed(Value),
    Reject(String),
    NetworkFail(String),
}

/// Upload channel double that answers every call from a fixed script and
/// counts invocations.
pub struct ScriptedUpload {
    script: UploadScript,
    calls: AtomicUsize,
}

impl ScriptedUpload {
    /// Answer every upload with `payload`.
    pub fn succeed(payload: Value) -> Self {
        Self {
            script: UploadScript::Succeed(payload),
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer every upload with a device-embedded error.
    pub fn reject(detail: &str) -> Self {
        Self {
            script: UploadScript::Reject(detail.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail every upload at the network layer.
    pub fn network_fail(detail: &str) -> Self {
        Self {
            script: UploadScript::NetworkFail(detail.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of uploads attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UploadChannel for ScriptedUpload {
    async fn analyze(&self, _image: &str) -> Result<Value, UploadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            UploadScript::Succeed(payload) => Ok(payload.clone()),
            UploadScript::Reject(detail) => Err(UploadError::DeviceRejected(detail.clone())),
            UploadScript::NetworkFail(detail) => Err(UploadError::Network(detail.clone())),
        }
    }
}
