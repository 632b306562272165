//! JSON-lines event feed: one inbound chat event per line.

use crate::error::EventError;
use crate::types::{Identity, IncomingMessage};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_stream::wrappers::SplitStream;

/// Raw newline-delimited segments. Lines are decoded individually so one
/// undecodable line can be skipped without ending the feed.
pub type EventLines = SplitStream<BufReader<Box<dyn AsyncRead + Send + Unpin>>>;

#[derive(Debug, Deserialize)]
struct RawEvent {
    channel_id: Option<String>,
    content: Option<String>,
    sender_name: Option<String>,
    sender_id: Option<RawId>,
    message_id: Option<RawId>,
    self_name: Option<String>,
    self_id: Option<RawId>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    fn into_text(self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s.trim().to_string(),
        }
    }
}

/// Opens the event source: the file at `path`, or stdin.
pub async fn open(path: Option<&Path>) -> Result<EventLines> {
    let reader: Box<dyn AsyncRead + Send + Unpin> = match path {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open event feed: {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };
    Ok(SplitStream::new(BufReader::new(reader).split(b'\n')))
}

/// Decodes and parses one raw feed segment.
pub fn parse_segment(bytes: &[u8]) -> Result<Option<IncomingMessage>, EventError> {
    let line = std::str::from_utf8(bytes)?;
    parse_line(line)
}

/// Parses one feed line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<IncomingMessage>, EventError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let raw: RawEvent = serde_json::from_str(trimmed)?;
    validate(raw).map(Some)
}

fn validate(raw: RawEvent) -> Result<IncomingMessage, EventError> {
    let channel_id = required_text(raw.channel_id, "channel_id")?;
    let content = raw.content.ok_or(EventError::MissingField("content"))?;
    let sender_name = raw.sender_name.ok_or(EventError::MissingField("sender_name"))?;
    let sender_id = required_text(raw.sender_id.map(RawId::into_text), "sender_id")?;

    let message_id = match raw.message_id.ok_or(EventError::MissingField("message_id"))? {
        RawId::Number(n) => n,
        RawId::Text(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|_| EventError::InvalidMessageId(text.clone()))?,
    };

    let responder = match (raw.self_name, raw.self_id.map(RawId::into_text)) {
        (Some(name), Some(id)) if !id.is_empty() => Some(Identity { name, id }),
        _ => None,
    };

    Ok(IncomingMessage {
        channel_id,
        content,
        sender: Identity {
            name: sender_name,
            id: sender_id,
        },
        message_id,
        responder,
    })
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, EventError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(EventError::MissingField(field)),
    }
}
