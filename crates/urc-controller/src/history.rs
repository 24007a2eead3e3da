//! The history command: list results stored on the device.

use clap::Parser;

use urc_core::{PersistenceGateway, RestGateway};

use crate::cli::ResolvedTarget;
use crate::output::{OutputFormat, OutputFormatter};
use crate::ExitCode;

/// Arguments for the history command
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Maximum number of records to show
    #[arg(long)]
    pub limit: Option<usize>,
}

impl HistoryArgs {
    /// Execute the history command
    pub async fn execute(
        &self,
        output: &OutputFormat,
        verbose: bool,
        target: &ResolvedTarget,
    ) -> anyhow::Result<ExitCode> {
        let formatter = OutputFormatter::new(*output, verbose);
        let gateway = RestGateway::new(&target.address)?;

        match gateway.fetch_history(target.role).await {
            Ok(mut history) => {
                if let Some(limit) = self.limit {
                    history.truncate(limit);
                }
                print!("{}", formatter.format_history(&history, target.role));
                Ok(ExitCode::Success)
            }
            Err(e) => {
                formatter.emit_error(&e.to_string());
                Ok(ExitCode::from_gateway_error(&e))
            }
        }
    }
}
