//! Rspamd controller error type.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RspamdError {
    pub kind: RspamdErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RspamdErrorKind {
    /// DNS / TCP / TLS failure before a response arrived.
    ConnectionFailed,
    /// Request exceeded the configured timeout.
    Timeout,
    /// Controller answered with an error status or a failure body.
    Api,
    /// Response body could not be decoded.
    Decode,
    /// Local file or state-file failure.
    Io,
    /// Payload does not look like an email message.
    InvalidMessage,
    /// Config / parameter validation error.
    InvalidConfig,
}

pub type RspamdResult<T> = Result<T, RspamdError>;

impl RspamdError {
    pub fn new(kind: RspamdErrorKind, msg: impl Into<String>) -> Self {
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
        Self::new(RspamdErrorKind::ConnectionFailed, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(RspamdErrorKind::Timeout, msg)
    }

    pub fn api(msg: impl Into<String>) -> Self {
        Self::new(RspamdErrorKind::Api, msg)
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::new(RspamdErrorKind::Decode, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(RspamdErrorKind::Io, msg)
    }

    pub fn invalid_message(msg: impl Into<String>) -> Self {
        Self::new(RspamdErrorKind::InvalidMessage, msg)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(RspamdErrorKind::InvalidConfig, msg)
    }
}

impl fmt::Display for RspamdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(status) = self.status {
            write!(f, "[rspamd {:?} {}] {}", self.kind, status, self.message)
        } else {
            write!(f, "[rspamd {:?}] {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for RspamdError {}

impl From<std::io::Error> for RspamdError {
    fn from(e: std::io::Error) -> Self {
        Self::io(e.to_string())
    }
}

impl From<serde_json::Error> for RspamdError {
    fn from(e: serde_json::Error) -> Self {
        Self::decode(e.to_string())
    }
}

impl From<reqwest::Error> for RspamdError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout(e.to_string())
        } else if e.is_connect() {
            Self::connection_failed(e.to_string())
        } else if e.is_decode() {
            Self::decode(e.to_string())
        } else {
            let err = Self::api(e.to_string());
            match e.status() {
                Some(status) => err.with_status(status.as_u16()),
                None => err,
            }
        }
    }
}
