//! CLI command definitions for the `soma` binary.
//!
//! `serve` runs the HTTP API; the remaining commands inspect and maintain
//! the durable memory store directly.

pub mod export;
pub mod identity;
pub mod maintenance;
pub mod message;
pub mod stats;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Memory core for the Soma desktop assistant.
#[derive(Parser)]
#[command(name = "soma", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default tracing filter for the verbosity flags.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "warn",
            1 => "info,soma_core=debug,soma_infra=debug,soma_api=debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server.
    Serve {
        /// Port to listen on (default from config.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (default from config.toml).
        #[arg(long)]
        host: Option<String>,

        /// Emit logs as JSON lines.
        #[arg(long)]
        log_json: bool,

        /// Export spans to stdout via OpenTelemetry.
        #[arg(long)]
        otel: bool,
    },

    /// Show database statistics.
    Stats,

    /// Delete conversation rows older than the retention period.
    Cleanup {
        /// Retention period in days (default from config.toml).
        #[arg(long)]
        days: Option<u32>,
    },

    /// Export conversations, identities and facts to JSON files.
    Export {
        /// Output directory (default: {data_dir}/exports).
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Most recent messages to export.
        #[arg(long, default_value = "1000")]
        limit: usize,
    },

    /// List known identity bindings.
    Identities,

    /// Search the conversation log.
    Search {
        /// Substring to look for.
        query: String,

        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Match case exactly.
        #[arg(long)]
        case_sensitive: bool,
    },

    /// Show the recent history of a session.
    History {
        session_id: String,

        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Delete ALL durable memory.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
