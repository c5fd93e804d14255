use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Query parameters forwarded to a provider, kept in insertion order.
pub type QueryParams = IndexMap<String, String>;

/// GIF search backends known to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GifSource {
    Giphy,
    Tenor,
}

impl fmt::Display for GifSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GifSource::Giphy => write!(f, "giphy"),
            GifSource::Tenor => write!(f, "tenor"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GifPreview {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// A search hit normalized across providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GifResult {
    pub preview: GifPreview,
    pub url: String,
    pub source: GifSource,
}

/// Why an upstream call failed, with the transport's own message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Not an http(s) URL.
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: u64 },
    UnsupportedContentType { content_type: String },
    /// The body was not valid JSON.
    InvalidJson,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => f.write_str("not an http(s) url"),
            FailureKind::HttpStatus(code) => write!(f, "upstream answered {code}"),
            FailureKind::Timeout => f.write_str("timed out"),
            FailureKind::RedirectLimitExceeded => f.write_str("too many redirects"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "body of {actual} bytes exceeds {max_bytes}")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "expected json, got {content_type}")
            }
            FailureKind::InvalidJson => f.write_str("malformed json"),
            FailureKind::Network => f.write_str("network failure"),
        }
    }
}
