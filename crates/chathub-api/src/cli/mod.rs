//! CLI command definitions for the `chathub` binary.

pub mod check_config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Chat backend with pluggable storage, OCR and a WebSocket relay hub.
#[derive(Parser)]
#[command(name = "chathub", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (TOML). A missing file means all defaults.
    #[arg(
        long,
        global = true,
        env = "CHATHUB_CONFIG",
        default_value = chathub_infra::config::DEFAULT_CONFIG_PATH
    )]
    pub config: PathBuf,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP and WebSocket server.
    Serve {
        /// Listen address; overrides `service.host`.
        #[arg(long)]
        host: Option<String>,

        /// Listen port; overrides `service.port`.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Load and validate the configuration, then print it with secrets redacted.
    CheckConfig,
}
