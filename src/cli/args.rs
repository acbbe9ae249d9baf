//! CLI argument definitions using clap

use clap::Parser;
use std::path::PathBuf;

use crate::engine::RunMode;

/// quorum-guard - allow unattended maintenance reboots only while the
/// cluster keeps quorum
#[derive(Parser, Debug)]
#[command(name = "quorum-guard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Decide and report, but leave the policy flag, the service and the
    /// rescan trigger untouched
    #[arg(long)]
    pub dry_run: bool,

    /// Path to configuration file (defaults are used when omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    pub fn mode(&self) -> RunMode {
        if self.dry_run {
            RunMode::Simulate
        } else {
            RunMode::Apply
        }
    }
}
