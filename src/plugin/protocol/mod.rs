mod io;
mod types;

#[cfg(feature = "fuzzing")]
pub(in crate::plugin) use io::decode_envelope;
pub(in crate::plugin) use io::{read_message, send_message};
pub(in crate::plugin) use types::{
    AckMessage, AddStatsMessage, Envelope, ErrorMessage, VersionMessage, VersionReplyMessage,
    WireMessage,
};
