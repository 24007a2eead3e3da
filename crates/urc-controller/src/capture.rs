//! The capture command: one full acquisition session.

use std::path::PathBuf;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::Parser;

use urc_core::{
    CaptureMode, CaptureOutcome, PersistenceGateway, RestGateway, RestUploadChannel,
    SessionController, UploadChannel,
};
use urc_transport::{EventChannel, WsChannel};

use crate::cli::ResolvedTarget;
use crate::output::{OutputFormat, OutputFormatter};
use crate::ExitCode;

/// Arguments for the capture command
#[derive(Parser, Debug)]
pub struct CaptureArgs {
    /// Image file to upload when the device has no camera of its own
    #[arg(long)]
    pub image: Option<PathBuf>,
}

impl CaptureArgs {
    /// Execute the capture command
    pub async fn execute(
        &self,
        output: &OutputFormat,
        verbose: bool,
        target: &ResolvedTarget,
    ) -> anyhow::Result<ExitCode> {
        let formatter = OutputFormatter::new(*output, verbose);
        tracing::info!(address = %target.address, role = %target.role, "starting capture session");

        let channel = Arc::new(WsChannel::new(target.address.clone()));
        if let Err(e) = channel.connect().await {
            formatter.emit_error(&format!("could not reach {}: {e}", target.address));
            return Ok(ExitCode::ConnectionFailed);
        }

        let upload = Arc::new(RestUploadChannel::new(&target.address)?);
        let gateway = Arc::new(RestGateway::new(&target.address)?);
        let controller = SessionController::new(
            Arc::clone(&channel) as Arc<dyn EventChannel>,
            upload as Arc<dyn UploadChannel>,
            gateway as Arc<dyn PersistenceGateway>,
            target.role,
        )
        .with_probe_timeout(target.probe_timeout)
        .with_capture_timeout(target.capture_timeout);

        let outcome = self.run_session(&controller, &formatter).await;
        channel.close();

        match outcome {
            Ok(outcome) => {
                print!(
                    "{}",
                    formatter.format_capture(
                        &outcome.result,
                        outcome.warning.as_ref(),
                        target.role,
                        &target.address,
                    )
                );
                Ok(ExitCode::Success)
            }
            Err(code) => Ok(code),
        }
    }

    async fn run_session(
        &self,
        controller: &SessionController,
        formatter: &OutputFormatter,
    ) -> Result<CaptureOutcome, ExitCode> {
        let mode = controller.start().await.map_err(|e| {
            formatter.emit_error(&e.to_string());
            ExitCode::from_session_error(&e)
        })?;

        let outcome = match mode {
            CaptureMode::Remote => {
                if formatter.is_verbose() {
                    eprintln!("Device camera detected; capturing on the device.");
                }
                controller.capture_remote().await
            }
            CaptureMode::Local => {
                let Some(path) = &self.image else {
                    formatter.emit_error(
                        "the device has no camera; capture the strip with the handheld and pass --image <path>",
                    );
                    return Err(ExitCode::InvalidInput);
                };
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    formatter.emit_error(&format!("could not read {}: {e}", path.display()));
                    ExitCode::InvalidInput
                })?;
                controller.capture_local(&BASE64.encode(&bytes)).await
            }
        };

        outcome.map_err(|e| {
            formatter.emit_error(&e.to_string());
            ExitCode::from_session_error(&e)
        })
    }
}
