//! The shutdown command: power the device off.

use std::time::Duration;

use clap::Parser;

use urc_transport::{EventChannel, WsChannel};

use crate::cli::ResolvedTarget;
use crate::output::{OutputFormat, OutputFormatter};
use crate::ExitCode;

/// Arguments for the shutdown command
#[derive(Parser, Debug)]
pub struct ShutdownArgs {}

impl ShutdownArgs {
    /// Execute the shutdown command. The power-off request is
    /// fire-and-forget: no acknowledgment exists, because the device may be
    /// gone before it could send one.
    pub async fn execute(
        &self,
        output: &OutputFormat,
        verbose: bool,
        target: &ResolvedTarget,
    ) -> anyhow::Result<ExitCode> {
        let formatter = OutputFormatter::new(*output, verbose);

        let channel = WsChannel::new(target.address.clone());
        if let Err(e) = channel.connect().await {
            formatter.emit_error(&format!("could not reach {}: {e}", target.address));
            return Ok(ExitCode::ConnectionFailed);
        }

        if let Err(e) = channel.shutdown_remote().await {
            formatter.emit_error(&e.to_string());
            channel.close();
            return Ok(ExitCode::ConnectionFailed);
        }

        // Let the writer drain before teardown; we neither get nor wait for
        // an acknowledgment.
        tokio::time::sleep(Duration::from_millis(200)).await;
        channel.close();

        print!(
            "{}",
            formatter.format_message("Shutdown signal sent; the device is powering off.")
        );
        Ok(ExitCode::Success)
    }
}
