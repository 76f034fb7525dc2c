use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};

use crate::error::PluginError;

use super::types::Envelope;

const MAX_MESSAGE_BYTES: usize = 4 * 1024 * 1024;

pub(in crate::plugin) async fn read_message(
    reader: &mut BufReader<OwnedReadHalf>,
) -> Result<Envelope, PluginError> {
    let mut buffer: Vec<u8> = Vec::with_capacity(1024);
    let bytes = reader
        .read_until(b'\n', &mut buffer)
        .await
        .map_err(|err| PluginError::Io {
            context: "read wire message",
            source: err,
        })?;
    if bytes == 0 {
        return Err(PluginError::ConnectionClosed);
    }
    decode_envelope(&buffer)
}

/// Decodes one line, with or without its trailing newline.
///
/// # Errors
///
/// Returns an error when the line is oversized, not UTF-8, or not a valid
/// envelope.
pub(in crate::plugin) fn decode_envelope(line: &[u8]) -> Result<Envelope, PluginError> {
    if line.len() > MAX_MESSAGE_BYTES {
        return Err(PluginError::WireMessageTooLarge {
            max_bytes: MAX_MESSAGE_BYTES,
        });
    }
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let line = std::str::from_utf8(line)
        .map_err(|err| PluginError::WireMessageInvalidUtf8 { source: err })?;
    serde_json::from_str::<Envelope>(line).map_err(|err| PluginError::Deserialize {
        context: "wire message",
        source: err,
    })
}

pub(in crate::plugin) async fn send_message(
    writer: &mut OwnedWriteHalf,
    envelope: &Envelope,
) -> Result<(), PluginError> {
    let mut payload = serde_json::to_string(envelope).map_err(|err| PluginError::Serialize {
        context: "wire message",
        source: err,
    })?;
    if payload.len() >= MAX_MESSAGE_BYTES {
        return Err(PluginError::WireMessageTooLarge {
            max_bytes: MAX_MESSAGE_BYTES,
        });
    }
    payload.push('\n');
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|err| PluginError::Io {
            context: "send wire message",
            source: err,
        })
}
