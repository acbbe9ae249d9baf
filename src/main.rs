//! quorum-guard CLI entry point
//!
//! Runs one pass via `cli::run`. Exit status:
//! - 0: the pass completed, whatever its individual steps did
//! - 1: the pass could not start (configuration, audit channel)
//! - 2: unexpected panic, logged as FATAL before exit

use std::panic;

use quorum_guard::cli;
use quorum_guard::observability::{Event, Logger};

fn main() {
    match panic::catch_unwind(cli::run) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Logger::fatal(Event::UnexpectedFailure.as_str(), &[("error", reason.as_str())]);
            std::process::exit(2);
        }
    }
}
