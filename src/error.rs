//! Typed errors for the collector components.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while appending a record to a channel's output file.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path} as JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} does not contain a JSON array")]
    NotAnArray { path: PathBuf },

    #[error("failed to encode records: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure to resolve a mentioned user to a display name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("unknown user: {0}")]
    UnknownUser(String),
}

/// Problems with an inbound event at the feed boundary.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("event line is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed event json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("event field `{0}` is required")]
    MissingField(&'static str),

    #[error("message id is not numeric: {0}")]
    InvalidMessageId(String),
}
