//! Command-line interface definition.

use crate::core::config::HandlerConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Faultline: unified error interception and reporting
#[derive(Parser, Debug)]
#[command(name = "faultline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON-lines file for structured log entries (default: faults.jsonl
    /// in the data directory)
    #[arg(long, global = true)]
    pub sink: Option<PathBuf>,

    /// Force silent mode for this run
    #[arg(long, global = true)]
    pub silent: bool,

    /// Type exempt from halting in silent mode (repeatable)
    #[arg(long = "ignore", global = true)]
    pub ignore: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Raise a recoverable signal through the pipeline
    Trigger {
        /// Severity name (e.g. E_WARNING) or raw numeric code
        #[arg(short, long, default_value = "E_USER_ERROR")]
        severity: String,

        /// Message carried by the signal
        #[arg(short, long)]
        message: String,
    },

    /// Panic and let the exception hook capture it
    Panic {
        /// Panic payload
        #[arg(short, long, default_value = "demonstration panic")]
        message: String,
    },

    /// Record a fatal condition reported by the exit inspection
    Fatal {
        /// Fault description
        #[arg(short, long, default_value = "simulated fatal condition")]
        message: String,
    },

    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show handler information
    Info,
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Open configuration file location
    Path,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Sink file for structured entries: the explicit flag, else the
    /// data directory default.
    pub fn sink_path(&self) -> PathBuf {
        self.sink
            .clone()
            .unwrap_or_else(HandlerConfig::default_sink_path)
    }
}
