//! CLI argument types and parsing helpers.
mod cli;
pub(crate) mod parsers;

#[cfg(test)]
mod tests;

pub use cli::{BackendArgs, CacheArgs, Cli, Command, IngestArgs, ServePluginArgs};
pub use parsers::{parse_param, parse_percentile, parse_positive_usize};
