//! Output formatting for CLI results
//!
//! This module provides consistent output formatting across all CLI
//! commands. It supports three output formats:
//! - Table: Human-readable tables (default)
//! - JSON: Structured JSON for scripting and automation
//! - Quiet: Minimal output, exit codes only

use std::str::FromStr;

use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use urc_core::PersistenceWarning;
use urc_proto::{resolve_image_reference, AnalysisResult, Profile, ProfileUpdateOutcome, Role};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for scripting
    Json,
    /// Minimal output - exit codes only
    Quiet,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "quiet" => Ok(Self::Quiet),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Quiet => write!(f, "quiet"),
        }
    }
}

/// Standard JSON response wrapper for consistent schema
#[derive(Serialize)]
pub struct JsonResponse<T: Serialize> {
    /// Whether the operation was successful
    pub success: bool,
    /// The response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// ISO 8601 timestamp
    pub timestamp: String,
}

impl<T: Serialize> JsonResponse<T> {
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl JsonResponse<()> {
    /// Create an error response
    pub fn error(message: &str) -> JsonResponse<()> {
        JsonResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// JSON payload for a finished capture session.
#[derive(Serialize)]
struct CaptureOutput<'a> {
    result: &'a AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

/// Formats output for different modes
pub struct OutputFormatter {
    format: OutputFormat,
    verbose: bool,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.format == OutputFormat::Quiet
    }

    /// Format a finished capture session
    pub fn format_capture(
        &self,
        result: &AnalysisResult,
        warning: Option<&PersistenceWarning>,
        role: Role,
        device_address: &str,
    ) -> String {
        match self.format {
            OutputFormat::Table => {
                let mut out = String::new();
                out.push_str(&format!("Diagnosis: {}\n", result.advice_for(role)));
                if let Some(timestamp) = &result.timestamp {
                    out.push_str(&format!("Recorded:  {timestamp}\n"));
                }
                if let Some(image) = resolve_image_reference(&result.image, device_address) {
                    out.push_str(&format!("Sample:    {}\n", describe_image(&image.uri)));
                }
                if role.is_elevated() {
                    if let Some(chart) =
                        resolve_image_reference(&result.reference_chart, device_address)
                    {
                        out.push_str(&format!("Chart:     {}\n", describe_image(&chart.uri)));
                    }
                }
                out.push('\n');
                out.push_str(&analyte_table(result).to_string());
                out.push('\n');
                if let Some(warning) = warning {
                    out.push_str(&format!("\nWarning: {warning}\n"));
                }
                out
            }
            OutputFormat::Json => self.to_json(&CaptureOutput {
                result,
                warning: warning.map(|w| w.to_string()),
            }),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format a history listing, most recent first
    pub fn format_history(&self, history: &[AnalysisResult], role: Role) -> String {
        match self.format {
            OutputFormat::Table => {
                if history.is_empty() {
                    return "No records found on the device.\n".to_string();
                }
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(vec!["#", "Recorded", "Diagnosis"]);
                for item in history {
                    let id = item
                        .id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    let recorded = item.timestamp.clone().unwrap_or_else(|| "-".to_string());
                    table.add_row(vec![id, recorded, excerpt(item.advice_for(role), 40)]);
                }
                format!("{table}\n")
            }
            OutputFormat::Json => self.to_json(&history),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format the stored profile
    pub fn format_profile(&self, profile: &Profile, device_address: &str) -> String {
        match self.format {
            OutputFormat::Table => {
                let mut out = format!("Name:   {}\n", profile.name);
                let avatar = profile
                    .avatar
                    .as_deref()
                    .and_then(|value| resolve_image_reference(value, device_address));
                match avatar {
                    Some(avatar) => out.push_str(&format!("Avatar: {}\n", describe_image(&avatar.uri))),
                    None => out.push_str("Avatar: (none)\n"),
                }
                out
            }
            OutputFormat::Json => self.to_json(profile),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format a profile update outcome
    pub fn format_profile_update(&self, outcome: &ProfileUpdateOutcome) -> String {
        match self.format {
            OutputFormat::Table => {
                let mut out = if outcome.success {
                    "Profile updated.\n".to_string()
                } else {
                    "Profile update was refused by the device.\n".to_string()
                };
                if outcome.wifi_updated == Some(true) {
                    out.push_str("Device Wi-Fi credentials updated; it may rejoin on the new network.\n");
                }
                out
            }
            OutputFormat::Json => self.to_json(outcome),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format a plain confirmation message
    pub fn format_message(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Table => format!("{message}\n"),
            OutputFormat::Json => self.to_json(&serde_json::json!({ "message": message })),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Print an error in the current format
    pub fn emit_error(&self, message: &str) {
        match self.format {
            OutputFormat::Table => eprintln!("Error: {message}"),
            OutputFormat::Json => {
                if let Ok(text) = serde_json::to_string_pretty(&JsonResponse::<()>::error(message))
                {
                    println!("{text}");
                }
            }
            OutputFormat::Quiet => {}
        }
    }

    fn to_json<T: Serialize>(&self, data: &T) -> String {
        serde_json::to_string_pretty(&JsonResponse::success(data))
            .map(|text| format!("{text}\n"))
            .unwrap_or_default()
    }
}

/// Ten-row analyte table with missing values display-mapped.
fn analyte_table(result: &AnalysisResult) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Analyte", "Value"]);
    for (name, value) in result.display_results() {
        table.add_row(vec![name.to_string(), value]);
    }
    table
}

/// Keep inline payload URIs out of terminal output.
fn describe_image(uri: &str) -> String {
    if uri.starts_with("data:") {
        format!("(inline image, {} chars)", uri.len())
    } else {
        uri.to_string()
    }
}

/// Shorten advice text for list rows.
fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use urc_proto::Diagnosis;

    fn sample() -> AnalysisResult {
        AnalysisResult {
            diagnosis: Diagnosis {
                leukocytes: String::new(),
                nitrites: String::new(),
                advice_medical: "WNL".into(),
                advice_layman: "All normal".into(),
            },
            image: "strip_0042.jpg".into(),
            full_results: BTreeMap::new(),
            reference_chart: "chart_0042.jpg".into(),
            timestamp: Some("2025-06-01T12:00:01Z".into()),
            id: Some(1),
        }
    }

    #[test]
    fn output_format_parses_known_values() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn capture_table_shows_role_appropriate_advice() {
        let formatter = OutputFormatter::new(OutputFormat::Table, false);
        let text = formatter.format_capture(&sample(), None, Role::Layman, "192.168.4.1");
        assert!(text.contains("All normal"));
        assert!(!text.contains("WNL"));
        // Base role never sees the chart.
        assert!(!text.contains("chart_0042.jpg"));
    }

    #[test]
    fn elevated_role_sees_chart_and_clinical_text() {
        let formatter = OutputFormatter::new(OutputFormat::Table, false);
        let text = formatter.format_capture(&sample(), None, Role::Medical, "192.168.4.1");
        assert!(text.contains("WNL"));
        assert!(text.contains("http://192.168.4.1:5000/uploads/chart_0042.jpg"));
    }

    #[test]
    fn capture_table_lists_all_analytes() {
        let formatter = OutputFormatter::new(OutputFormat::Table, false);
        let text = formatter.format_capture(&sample(), None, Role::Layman, "192.168.4.1");
        for analyte in urc_proto::ANALYTES {
            assert!(text.contains(analyte), "missing {analyte}");
        }
        assert!(text.contains(urc_proto::NOT_DETECTED));
    }

    #[test]
    fn warning_is_rendered_alongside_the_result() {
        let formatter = OutputFormatter::new(OutputFormat::Table, false);
        let warning = PersistenceWarning("network error".into());
        let text = formatter.format_capture(&sample(), Some(&warning), Role::Layman, "192.168.4.1");
        assert!(text.contains("could not be saved"));
    }

    #[test]
    fn quiet_mode_prints_nothing() {
        let formatter = OutputFormatter::new(OutputFormat::Quiet, false);
        assert!(formatter
            .format_capture(&sample(), None, Role::Layman, "192.168.4.1")
            .is_empty());
        assert!(formatter.format_history(&[sample()], Role::Layman).is_empty());
    }

    #[test]
    fn json_capture_is_a_success_envelope() {
        let formatter = OutputFormatter::new(OutputFormat::Json, false);
        let text = formatter.format_capture(&sample(), None, Role::Layman, "192.168.4.1");
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["result"]["diagnosis"]["advice_layman"], "All normal");
    }

    #[test]
    fn history_table_handles_empty_lists() {
        let formatter = OutputFormatter::new(OutputFormat::Table, false);
        let text = formatter.format_history(&[], Role::Layman);
        assert!(text.contains("No records"));
    }

    #[test]
    fn excerpt_truncates_long_text() {
        assert_eq!(excerpt("short", 40), "short");
        let long = "x".repeat(60);
        let cut = excerpt(&long, 40);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 43);
    }

    #[test]
    fn inline_images_are_not_dumped_to_the_terminal() {
        let described = describe_image("data:image/jpeg;base64,AAAA");
        assert!(described.contains("inline image"));
        assert!(!described.contains("AAAA"));
    }
}
