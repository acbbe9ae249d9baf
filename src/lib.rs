//! quorum-guard - quorum-aware gate for unattended maintenance reboots
//!
//! Each invocation counts the reachable members of a cluster and, when
//! fewer than the configured floor are online, blocks unattended reboots
//! and stops the maintenance service. With enough members online it lifts
//! the block, starts the service and triggers a rescan for pending work.

pub mod applier;
pub mod cli;
pub mod config;
pub mod directory;
pub mod engine;
pub mod exec;
pub mod observability;
