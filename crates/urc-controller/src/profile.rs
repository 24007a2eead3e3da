//! The profile command: show or update the device-held profile.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::Parser;

use urc_core::{PersistenceGateway, RestGateway};
use urc_proto::ProfileUpdate;

use crate::cli::ResolvedTarget;
use crate::output::{OutputFormat, OutputFormatter};
use crate::ExitCode;

/// Arguments for the profile command. With no flags the stored profile is
/// shown; any flag switches to an update.
#[derive(Parser, Debug)]
pub struct ProfileArgs {
    /// New display name
    #[arg(long)]
    pub name: Option<String>,

    /// Avatar image file to upload
    #[arg(long)]
    pub avatar: Option<PathBuf>,

    /// New Wi-Fi network for the device to join
    #[arg(long = "wifi-ssid")]
    pub wifi_ssid: Option<String>,

    /// Password for the new Wi-Fi network
    #[arg(long = "wifi-pass")]
    pub wifi_pass: Option<String>,
}

impl ProfileArgs {
    fn is_update(&self) -> bool {
        self.name.is_some()
            || self.avatar.is_some()
            || self.wifi_ssid.is_some()
            || self.wifi_pass.is_some()
    }

    /// Execute the profile command
    pub async fn execute(
        &self,
        output: &OutputFormat,
        verbose: bool,
        target: &ResolvedTarget,
    ) -> anyhow::Result<ExitCode> {
        let formatter = OutputFormatter::new(*output, verbose);
        let gateway = RestGateway::new(&target.address)?;

        if !self.is_update() {
            return match gateway.get_profile().await {
                Ok(profile) => {
                    print!("{}", formatter.format_profile(&profile, &target.address));
                    Ok(ExitCode::Success)
                }
                Err(e) => {
                    formatter.emit_error(&e.to_string());
                    Ok(ExitCode::from_gateway_error(&e))
                }
            };
        }

        if self.wifi_pass.is_some() && self.wifi_ssid.is_none() {
            formatter.emit_error("--wifi-pass requires --wifi-ssid");
            return Ok(ExitCode::InvalidInput);
        }

        // The update body always carries a name; fall back to the stored one.
        let name = match &self.name {
            Some(name) => name.clone(),
            None => match gateway.get_profile().await {
                Ok(profile) => profile.name,
                Err(e) => {
                    formatter.emit_error(&e.to_string());
                    return Ok(ExitCode::from_gateway_error(&e));
                }
            },
        };

        let image = match &self.avatar {
            Some(path) => match tokio::fs::read(path).await {
                Ok(bytes) => Some(BASE64.encode(&bytes)),
                Err(e) => {
                    formatter.emit_error(&format!("could not read {}: {e}", path.display()));
                    return Ok(ExitCode::InvalidInput);
                }
            },
            None => None,
        };

        let update = ProfileUpdate {
            name,
            image,
            wifi_ssid: self.wifi_ssid.clone(),
            wifi_pass: self.wifi_pass.clone(),
        };

        match gateway.update_profile(&update).await {
            Ok(outcome) => {
                let code = if outcome.success {
                    ExitCode::Success
                } else {
                    ExitCode::GeneralError
                };
                print!("{}", formatter.format_profile_update(&outcome));
                Ok(code)
            }
            Err(e) => {
                formatter.emit_error(&e.to_string());
                Ok(ExitCode::from_gateway_error(&e))
            }
        }
    }
}
