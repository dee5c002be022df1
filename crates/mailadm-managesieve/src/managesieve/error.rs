//! ManageSieve-specific error type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorised ManageSieve error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SieveError {
    pub kind: SieveErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SieveErrorKind {
    /// DNS resolution or TCP connect failure.
    ConnectionFailed,
    /// TLS handshake or certificate failure.
    TlsFailed,
    /// Rejected credentials or a malformed AUTHENTICATE exchange.
    AuthFailed,
    /// Server answered a command with NO; the message is the reason.
    Rejected,
    /// Server is terminating the connection (BYE); no further commands
    /// are possible on this session.
    ServerBye,
    /// Server sent something outside the response grammar.
    Protocol,
    /// Peer closed the connection mid-read.
    ConnectionClosed,
    /// Read/write failure at the byte level.
    Io,
    /// Read or write exceeded the configured timeout.
    Timeout,
    /// Command attempted in the wrong lifecycle phase.
    InvalidState,
    /// Script or account name the encoder cannot represent safely.
    InvalidName,
    /// Config / parameter validation error.
    InvalidConfig,
}

pub type SieveResult<T> = Result<T, SieveError>;

// ── Construction helpers ─────────────────────────────────────────────

impl SieveError {
    pub fn new(kind: SieveErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
        }
    }

    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::new(SieveErrorKind::ConnectionFailed, msg)
    }

    pub fn tls_failed(msg: impl Into<String>) -> Self {
        Self::new(SieveErrorKind::TlsFailed, msg)
    }

    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::new(SieveErrorKind::AuthFailed, msg)
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::new(SieveErrorKind::Rejected, msg)
    }

    pub fn server_bye(msg: impl Into<String>) -> Self {
        Self::new(SieveErrorKind::ServerBye, msg)
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::new(SieveErrorKind::Protocol, msg)
    }

    pub fn connection_closed(msg: impl Into<String>) -> Self {
        Self::new(SieveErrorKind::ConnectionClosed, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(SieveErrorKind::Io, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(SieveErrorKind::Timeout, msg)
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::new(SieveErrorKind::InvalidState, msg)
    }

    pub fn invalid_name(msg: impl Into<String>) -> Self {
        Self::new(SieveErrorKind::InvalidName, msg)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(SieveErrorKind::InvalidConfig, msg)
    }

    /// Whether the message carries text the server itself produced
    /// (suitable for verbatim display to an operator).
    pub fn is_server_reported(&self) -> bool {
        matches!(
            self.kind,
            SieveErrorKind::Rejected | SieveErrorKind::ServerBye
        )
    }
}

impl fmt::Display for SieveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[managesieve {:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for SieveError {}

impl From<std::io::Error> for SieveError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::TimedOut => Self::timeout(format!("I/O timeout: {}", e)),
            std::io::ErrorKind::UnexpectedEof => {
                Self::connection_closed("Server closed connection")
            }
            _ => Self::io(e.to_string()),
        }
    }
}

impl From<SieveError> for String {
    fn from(e: SieveError) -> String {
        e.message
    }
}
