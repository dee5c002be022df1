//! Stalwart management API error type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorised management-API error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StalwartError {
    pub kind: StalwartErrorKind,
    pub message: String,
    /// HTTP status that triggered the error, if any.
    pub status: Option<u16>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StalwartErrorKind {
    /// DNS / TCP / TLS failure before a response arrived.
    ConnectionFailed,
    /// Request exceeded the configured timeout.
    Timeout,
    /// Server answered with an error status; the message carries the
    /// server's detail text.
    Api,
    /// Response body could not be decoded.
    Decode,
    /// Local file read/write failure.
    Io,
    /// Payload does not look like an email message.
    InvalidMessage,
    /// Operation requires a live server but only an offline source is
    /// configured.
    Offline,
    /// Config / parameter validation error.
    InvalidConfig,
}

pub type StalwartResult<T> = Result<T, StalwartError>;

// ── Construction helpers ─────────────────────────────────────────────

impl StalwartError {
    pub fn new(kind: StalwartErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::new(StalwartErrorKind::ConnectionFailed, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(StalwartErrorKind::Timeout, msg)
    }

    pub fn api(status: u16, msg: impl Into<String>) -> Self {
        Self::new(StalwartErrorKind::Api, msg).with_status(status)
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::new(StalwartErrorKind::Decode, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(StalwartErrorKind::Io, msg)
    }

    pub fn invalid_message(msg: impl Into<String>) -> Self {
        Self::new(StalwartErrorKind::InvalidMessage, msg)
    }

    pub fn offline(msg: impl Into<String>) -> Self {
        Self::new(StalwartErrorKind::Offline, msg)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(StalwartErrorKind::InvalidConfig, msg)
    }
}

impl fmt::Display for StalwartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(status) = self.status {
            write!(f, "[stalwart {:?} {}] {}", self.kind, status, self.message)
        } else {
            write!(f, "[stalwart {:?}] {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for StalwartError {}

impl From<std::io::Error> for StalwartError {
    fn from(e: std::io::Error) -> Self {
        Self::io(e.to_string())
    }
}

impl From<serde_json::Error> for StalwartError {
    fn from(e: serde_json::Error) -> Self {
        Self::decode(e.to_string())
    }
}

impl From<reqwest::Error> for StalwartError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout(e.to_string())
        } else if e.is_connect() {
            Self::connection_failed(e.to_string())
        } else if e.is_decode() {
            Self::decode(e.to_string())
        } else {
            let err = Self::new(StalwartErrorKind::Api, e.to_string());
            match e.status() {
                Some(status) => err.with_status(status.as_u16()),
                None => err,
            }
        }
    }
}
