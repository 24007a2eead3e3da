//! The canonical analysis result entity and the requesting-role tag.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Analyte names measured by a test strip, in display order. Storage is
/// order-independent; only rendering uses this sequence.
pub const ANALYTES: [&str; 10] = [
    "Leukocytes",
    "Nitrites",
    "Urobilinogen",
    "Protein",
    "pH",
    "Blood",
    "SpecificGravity",
    "Ketone",
    "Bilirubin",
    "Glucose",
];

/// Display value for an analyte the device did not report. Applied only at
/// the consumption boundary; the stored mapping stays sparse.
pub const NOT_DETECTED: &str = "not detected";

/// Role of the requesting user. Governs which advice text and charts the
/// device exposes; results are tagged with it on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Elevated role: clinical advice text plus the reference chart.
    #[serde(rename = "MEDICAL")]
    Medical,
    /// Base role: plain-language advice only.
    #[serde(rename = "LAYMAN")]
    Layman,
}

impl Role {
    /// Whether this role is granted the reference chart and clinical text.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::Medical)
    }

    /// Wire form of the role, as used in URLs and request bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Medical => "MEDICAL",
            Role::Layman => "LAYMAN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "MEDICAL" => Ok(Role::Medical),
            "LAYMAN" => Ok(Role::Layman),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Diagnosis block of an analysis result. The advice fields are always
/// present on a valid result; a missing clinical explanation is encoded as
/// text by the device, never as an absent field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Leukocyte reading echoed into the diagnosis block.
    #[serde(default)]
    pub leukocytes: String,
    /// Nitrite reading echoed into the diagnosis block.
    #[serde(default)]
    pub nitrites: String,
    /// Clinical advice text (elevated role).
    pub advice_medical: String,
    /// Plain-language advice text (base role).
    pub advice_layman: String,
}

/// Canonical result of one capture-and-analyze cycle.
///
/// `image` and `reference_chart` are dual-representation: either an inline
/// text-encoded payload (local capture) or a server-side filename (device
/// capture / history). Use
/// [`resolve_image_reference`](crate::resolve_image_reference) to
/// disambiguate; nothing else in the codebase may re-implement that check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Diagnosis block; advice fields are validated non-empty.
    pub diagnosis: Diagnosis,
    /// Captured sample image, inline payload or filename.
    #[serde(default)]
    pub image: String,
    /// Sparse analyte -> measured-value mapping. A missing key means "not
    /// detected", never an error.
    #[serde(default)]
    pub full_results: BTreeMap<String, String>,
    /// Reference chart, inline payload or filename; empty unless the
    /// requesting role was elevated.
    #[serde(default)]
    pub reference_chart: String,
    /// Creation time assigned by the persistence service; absent until the
    /// result has been saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Persistence identity; present only after a successful save.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl AnalysisResult {
    /// Advice text appropriate for `role`.
    pub fn advice_for(&self, role: Role) -> &str {
        match role {
            Role::Medical => &self.diagnosis.advice_medical,
            Role::Layman => &self.diagnosis.advice_layman,
        }
    }

    /// The full ten-analyte display mapping, in display order, with missing
    /// keys rendered as [`NOT_DETECTED`]. The stored mapping is untouched.
    pub fn display_results(&self) -> Vec<(&'static str, String)> {
        ANALYTES
            .iter()
            .map(|name| {
                let value = self
                    .full_results
                    .get(*name)
                    .cloned()
                    .unwrap_or_else(|| NOT_DETECTED.to_string());
                (*name, value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnalysisResult {
        AnalysisResult {
            diagnosis: Diagnosis {
                leukocytes: "negative".into(),
                nitrites: "negative".into(),
                advice_medical: "WNL".into(),
                advice_layman: "All normal".into(),
            },
            image: "strip_0042.jpg".into(),
            full_results: BTreeMap::from([("pH".to_string(), "6.5".to_string())]),
            reference_chart: String::new(),
            timestamp: None,
            id: None,
        }
    }

    #[test]
    fn role_wire_form_roundtrips() {
        assert_eq!(Role::Medical.to_string(), "MEDICAL");
        assert_eq!("layman".parse::<Role>().unwrap(), Role::Layman);
        assert!("ADMIN".parse::<Role>().is_err());

        let json = serde_json::to_string(&Role::Medical).unwrap();
        assert_eq!(json, r#""MEDICAL""#);
    }

    #[test]
    fn display_results_fills_missing_analytes() {
        let rows = sample().display_results();
        assert_eq!(rows.len(), ANALYTES.len());
        assert_eq!(rows[4], ("pH", "6.5".to_string()));
        for (name, value) in rows {
            if name != "pH" {
                assert_eq!(value, NOT_DETECTED, "{name} should default");
            }
        }
    }

    #[test]
    fn display_mapping_leaves_storage_sparse() {
        let result = sample();
        let _ = result.display_results();
        assert_eq!(result.full_results.len(), 1);
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let value = serde_json::to_value(sample()).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("timestamp"));
        assert!(!obj.contains_key("id"));
    }

    #[test]
    fn advice_selection_follows_role() {
        let result = sample();
        assert_eq!(result.advice_for(Role::Medical), "WNL");
        assert_eq!(result.advice_for(Role::Layman), "All normal");
    }
}
