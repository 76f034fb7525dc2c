use serde::{Deserialize, Serialize};

use crate::domain::ContainerInfo;
use crate::error::PluginError;

/// One line on the wire: a request or the reply carrying the same `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(in crate::plugin) struct Envelope {
    pub(in crate::plugin) id: u64,
    pub(in crate::plugin) message: WireMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(in crate::plugin) enum WireMessage {
    Version(VersionMessage),
    VersionReply(VersionReplyMessage),
    AddStats(Box<AddStatsMessage>),
    Ack(AckMessage),
    Error(ErrorMessage),
}

impl WireMessage {
    pub(in crate::plugin) const fn name(&self) -> &'static str {
        match self {
            Self::Version(_) => "version",
            Self::VersionReply(_) => "version_reply",
            Self::AddStats(_) => "add_stats",
            Self::Ack(_) => "ack",
            Self::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(in crate::plugin) struct VersionMessage {
    #[serde(default)]
    pub(in crate::plugin) unused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(in crate::plugin) struct VersionReplyMessage {
    pub(in crate::plugin) version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(in crate::plugin) struct AddStatsMessage {
    pub(in crate::plugin) info: Option<ContainerInfo>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(in crate::plugin) struct AckMessage {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(in crate::plugin) struct ErrorMessage {
    pub(in crate::plugin) kind: String,
    pub(in crate::plugin) message: String,
}

impl ErrorMessage {
    pub(in crate::plugin) fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_owned(),
            message: message.into(),
        }
    }
}

impl From<&PluginError> for ErrorMessage {
    fn from(err: &PluginError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}
