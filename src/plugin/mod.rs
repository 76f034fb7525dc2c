//! Out-of-process storage drivers.
//!
//! A [`PluginServer`] hosts any [`crate::storage::StorageDriver`] behind a
//! Unix-domain socket; a [`PluginClient`] connects to it and is itself a
//! `StorageDriver`, so a plugin can be selected through the registry like any
//! in-process backend.

mod client;
mod driver;
mod protocol;
mod server;


pub use client::{ClientOptions, ClientState, PluginClient};
pub use driver::{PLUGIN_ENGINE, PluginDriverFactory};
pub use server::{PluginServer, ServerOptions};

/// Feeds one raw line to the wire decoder.
#[cfg(feature = "fuzzing")]
pub(crate) fn fuzz_decode_line(line: &[u8]) {
    drop(protocol::decode_envelope(line));
}

/// Version both ends must report exactly.
pub const PROTOCOL_VERSION: &str = "1.0.0";

pub const DEFAULT_SOCKET_PATH: &str = "/tmp/statkeep/storage-plugin.sock";
