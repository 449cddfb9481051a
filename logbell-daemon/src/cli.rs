//! CLI argument definitions for logbell.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use logbell_core::config::LogbellConfig;

/// Log file monitor that forwards matching lines to a Telegram chat.
///
/// Tails a single log file, matches each new line against the configured
/// regex filters, and delivers matches in batches.
#[derive(Parser, Debug)]
#[command(name = "logbell")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to the configuration file (YAML, or TOML with a `.toml` extension).
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration, compile filters, print a summary, and exit.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply CLI overrides on top of a loaded configuration.
    ///
    /// Callers must re-run [`LogbellConfig::validate`] afterwards.
    pub fn apply_overrides(&self, config: &mut LogbellConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
    }
}
