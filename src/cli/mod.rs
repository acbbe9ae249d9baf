//! Command-line entry controller
//!
//! `quorum-guard [--dry-run] [--config <path>]`
//!
//! Loads configuration, builds the directory, applier and audit sink, runs
//! exactly one reconciliation pass and prints the outcome as JSON. There is
//! no retry loop and no daemon mode; scheduling is external.

mod args;
mod commands;
mod errors;
mod io;

pub use args::Cli;
pub use commands::{open_audit_sink, reconcile_once, report_outcome, run, run_to, run_with};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_response_to;
