//! CLI argument parsing for collectors.

use std::path::PathBuf;

use clap::Parser;

/// Common CLI arguments for all collectors.
#[derive(Parser, Debug, Clone)]
#[command(about = "FortiPoll metrics collector", version)]
pub struct CollectorArgs {
    /// Path to configuration file (JSON5).
    #[arg(short, long)]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the recognized collector settings and exit.
    #[arg(long)]
    pub describe_config: bool,
}

impl CollectorArgs {
    /// Parse CLI arguments, falling back to `default_config` when `--config` is absent.
    pub fn parse_with_default(default_config: &'static str) -> Self {
        let matches = <Self as clap::CommandFactory>::command()
            .mut_arg("config", |arg| arg.default_value(default_config))
            .get_matches();

        <Self as clap::FromArgMatches>::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }
}
