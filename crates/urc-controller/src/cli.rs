//! CLI command definitions and argument parsing

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use urc_proto::Role;

use crate::capture::CaptureArgs;
use crate::config::Config;
use crate::device::ShutdownArgs;
use crate::history::HistoryArgs;
use crate::output::OutputFormat;
use crate::profile::ProfileArgs;
use crate::ExitCode;

/// URC Controller CLI - drive a strip analyzer device
#[derive(Parser, Debug)]
#[command(name = "urc-controller")]
#[command(version, about = "URC Controller CLI - drive a strip analyzer device")]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug mode (protocol-level tracing)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Device address (overrides the configured one)
    #[arg(long, global = true)]
    pub device: Option<String>,

    /// Requesting role: LAYMAN or MEDICAL (overrides the configured one)
    #[arg(long, global = true)]
    pub role: Option<Role>,
}

/// Device target resolved from config and CLI overrides
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// Device address
    pub address: String,
    /// Requesting role
    pub role: Role,
    /// Capability-answer timeout
    pub probe_timeout: Duration,
    /// Analysis-result timeout
    pub capture_timeout: Duration,
}

impl ResolvedTarget {
    /// Build the target from an already-overridden config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            address: config.device.address.clone(),
            role: config.role(),
            probe_timeout: config.probe_timeout(),
            capture_timeout: config.capture_timeout(),
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> anyhow::Result<ExitCode> {
        let config = Config::load_default().unwrap_or_default();
        self.execute_with_config(config).await
    }

    /// Execute the CLI command with a pre-loaded configuration
    pub async fn execute_with_config(self, config: Config) -> anyhow::Result<ExitCode> {
        let target = ResolvedTarget::from_config(&config);

        match self.command {
            Commands::Capture(args) => args.execute(&self.output, self.verbose, &target).await,
            Commands::History(args) => args.execute(&self.output, self.verbose, &target).await,
            Commands::Profile(args) => args.execute(&self.output, self.verbose, &target).await,
            Commands::Shutdown(args) => args.execute(&self.output, self.verbose, &target).await,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a capture-and-analyze session
    Capture(CaptureArgs),
    /// List results stored on the device
    History(HistoryArgs),
    /// Show or update the device-held profile
    Profile(ProfileArgs),
    /// Power the device off
    Shutdown(ShutdownArgs),
}
