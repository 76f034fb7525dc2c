//! Container telemetry retention and export.
//!
//! `statkeep` keeps a bounded history of resource-usage observations per
//! container: a ring of the most recent stats plus a uniform sample drawn
//! from a sliding window of recent sequence numbers. Observations can also be
//! forwarded to a storage driver, either in-process or through an
//! out-of-process plugin that speaks newline-delimited JSON over a Unix
//! socket. The `statkeep` binary wires these pieces into `ingest` and
//! `serve-plugin` commands.
pub mod args;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod plugin;
pub mod sampling;
pub mod shutdown;
pub mod storage;

#[cfg(feature = "fuzzing")]
pub mod fuzzing;
