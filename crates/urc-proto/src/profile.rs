//! Profile wire types for the device's REST service.

use serde::{Deserialize, Serialize};

/// Stored user profile, as returned by `GET /get_profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Display name.
    pub name: String,
    /// Avatar image reference (filename or inline payload), if one is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Request body for `POST /update_profile`. The Wi-Fi fields reconfigure
/// the device's own network; field names are the exact wire identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New display name.
    pub name: String,
    /// New avatar, text-encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// New Wi-Fi network name for the device to join.
    #[serde(rename = "wifiSSID", skip_serializing_if = "Option::is_none")]
    pub wifi_ssid: Option<String>,
    /// Password for the new Wi-Fi network.
    #[serde(rename = "wifiPass", skip_serializing_if = "Option::is_none")]
    pub wifi_pass: Option<String>,
}

/// Response body for `POST /update_profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdateOutcome {
    /// Whether the update was accepted.
    pub success: bool,
    /// Avatar reference after the update, if one is stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Whether the device accepted new Wi-Fi credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wifi_updated: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wifi_fields_use_wire_names() {
        let update = ProfileUpdate {
            name: "Pat".into(),
            image: None,
            wifi_ssid: Some("clinic-net".into()),
            wifi_pass: Some("hunter2".into()),
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["wifiSSID"], "clinic-net");
        assert_eq!(value["wifiPass"], "hunter2");
        assert!(value.get("image").is_none());
    }

    #[test]
    fn outcome_parses_with_optional_fields_absent() {
        let outcome: ProfileUpdateOutcome =
            serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(outcome.success);
        assert!(outcome.avatar.is_none());
        assert!(outcome.wifi_updated.is_none());
    }
}
