//! Result normalization.
//!
//! Raw payloads arrive from two paths (realtime event or REST upload) and
//! are shaped into the canonical [`AnalysisResult`] here, in one place.
//! This is also where transport success and semantic success are told
//! apart: a payload can arrive over a perfectly healthy connection and
//! still describe a failed analysis.

use serde_json::Value;

use urc_proto::AnalysisResult;

use crate::errors::SessionError;

/// Substring the device plants in `advice_layman` when the analysis itself
/// failed despite a successful transport round-trip.
pub const SEMANTIC_ERROR_MARKER: &str = "Error";

/// Validate and shape a raw payload into the canonical result.
///
/// Structural problems (missing or non-string advice fields, wrong shapes)
/// yield [`SessionError::InvalidPayload`]; a device-flagged analysis error
/// yields [`SessionError::SemanticError`] carrying the device's own text.
/// Missing analyte keys are left missing; the mapping stays sparse in
/// storage and is defaulted only at the display boundary.
///
/// Normalization is idempotent: feeding a normalized result back through
/// produces an identical result.
pub fn normalize(raw: Value) -> Result<AnalysisResult, SessionError> {
    let mut raw = raw;
    stringify_full_results(&mut raw);

    let result: AnalysisResult =
        serde_json::from_value(raw).map_err(|e| SessionError::InvalidPayload(e.to_string()))?;

    if result.diagnosis.advice_layman.trim().is_empty()
        || result.diagnosis.advice_medical.trim().is_empty()
    {
        return Err(SessionError::InvalidPayload(
            "advice text must be non-empty".into(),
        ));
    }

    if result.diagnosis.advice_layman.contains(SEMANTIC_ERROR_MARKER) {
        return Err(SessionError::SemanticError(
            result.diagnosis.advice_layman.clone(),
        ));
    }

    Ok(result)
}

/// Older device firmware emits bare numbers for some analytes. Coerce them
/// to the string form the rest of the system stores; null entries mean the
/// analyte was not reported and are dropped.
fn stringify_full_results(raw: &mut Value) {
    let Some(map) = raw.get_mut("full_results").and_then(Value::as_object_mut) else {
        return;
    };
    map.retain(|_, value| !value.is_null());
    for value in map.values_mut() {
        if !value.is_string() {
            *value = Value::String(value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use urc_proto::{ANALYTES, NOT_DETECTED};

    fn normal_payload() -> Value {
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

    #[test]
    fn normal_payload_is_accepted() {
        let result = normalize(normal_payload()).unwrap();
        assert_eq!(result.diagnosis.advice_layman, "All normal");
        assert_eq!(result.full_results.len(), 2);
        assert!(result.timestamp.is_none());
    }

    #[test]
    fn missing_advice_field_is_structural() {
        let payload = json!({
            "diagnosis": { "advice_layman": "All normal" },
            "image": "x.jpg"
        });
        assert!(matches!(
            normalize(payload),
            Err(SessionError::InvalidPayload(_))
        ));
    }

    #[test]
    fn empty_advice_is_structural() {
        let mut payload = normal_payload();
        payload["diagnosis"]["advice_medical"] = json!("  ");
        assert!(matches!(
            normalize(payload),
            Err(SessionError::InvalidPayload(_))
        ));
    }

    #[test]
    fn non_string_advice_is_structural() {
        let mut payload = normal_payload();
        payload["diagnosis"]["advice_layman"] = json!(42);
        assert!(matches!(
            normalize(payload),
            Err(SessionError::InvalidPayload(_))
        ));
    }

    #[test]
    fn error_marker_in_layman_advice_is_semantic() {
        let mut payload = normal_payload();
        payload["diagnosis"]["advice_layman"] = json!("Error: strip not detected");
        match normalize(payload) {
            Err(SessionError::SemanticError(detail)) => {
                assert_eq!(detail, "Error: strip not detected");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn error_marker_in_medical_advice_alone_is_not_semantic() {
        // Only the layman field carries the sentinel contract.
        let mut payload = normal_payload();
        payload["diagnosis"]["advice_medical"] = json!("Erroneous leukocyte esterase trace");
        payload["diagnosis"]["advice_layman"] = json!("Slight trace, likely fine");
        assert!(normalize(payload).is_ok());
    }

    #[test]
    fn numeric_analyte_values_are_stringified() {
        let mut payload = normal_payload();
        payload["full_results"] = json!({ "pH": 6.5, "Blood": null, "Ketone": "trace" });
        let result = normalize(payload).unwrap();
        assert_eq!(result.full_results.get("pH").unwrap(), "6.5");
        assert_eq!(result.full_results.get("Ketone").unwrap(), "trace");
        assert!(!result.full_results.contains_key("Blood"));
    }

    #[test]
    fn missing_analytes_stay_missing_in_storage() {
        let mut payload = normal_payload();
        payload["full_results"] = json!({});
        let result = normalize(payload).unwrap();
        assert!(result.full_results.is_empty());

        // Defaulting happens only at the display boundary.
        let rows = result.display_results();
        assert_eq!(rows.len(), ANALYTES.len());
        assert!(rows.iter().all(|(_, value)| value == NOT_DETECTED));
    }

    #[test]
    fn normalization_is_idempotent() {
        let first = normalize(normal_payload()).unwrap();
        let second = normalize(serde_json::to_value(&first).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn persisted_fields_survive_normalization() {
        let mut payload = normal_payload();
        payload["timestamp"] = json!("2025-06-01T12:00:00Z");
        payload["id"] = json!(7);
        let result = normalize(payload).unwrap();
        assert_eq!(result.timestamp.as_deref(), Some("2025-06-01T12:00:00Z"));
        assert_eq!(result.id, Some(7));
    }
}
