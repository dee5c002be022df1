//! Shared types for the ManageSieve crate.

use serde::{Deserialize, Serialize};

// ─── Connection / Session ────────────────────────────────────────────

/// Security mode for the connection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SieveSecurityMode {
    /// Plain-text ManageSieve (trusted lab networks only).
    None,
    /// Start plain, then upgrade via STARTTLS before authenticating.
    StartTls,
    /// TLS from the first byte.
    Implicit,
}

impl Default for SieveSecurityMode {
    fn default() -> Self {
        Self::Implicit
    }
}

/// Configuration for a single ManageSieve connection.
///
/// Immutable once a session has been started from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SieveConnectionConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub security: SieveSecurityMode,
    /// Accept self-signed / untrusted certificates.
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// Connect, read, and write timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 {
    4190
}
fn default_timeout() -> u64 {
    10
}

impl Default for SieveConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
            security: SieveSecurityMode::Implicit,
            accept_invalid_certs: false,
            timeout_secs: default_timeout(),
        }
    }
}

/// Lifecycle phase of a [`crate::managesieve::client::SieveClient`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    /// No transport yet.
    Idle,
    /// Transport open, greeting consumed, not encrypted.
    Connected,
    /// Transport open and ciphered (implicit TLS or after STARTTLS).
    Encrypted,
    /// SASL PLAIN exchange completed.
    Authenticated,
    /// Terminal; transport released.
    Closed,
}

// ─── Server responses ────────────────────────────────────────────────

/// Terminal status of a server response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    Ok,
    No,
    Bye,
}

/// One logical server response: zero or more data lines followed by
/// exactly one status line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SieveResponse {
    pub status: ResponseStatus,
    /// Free text after the status keyword, if any.
    pub text: String,
    /// Raw data lines preceding the status line.
    pub data: Vec<String>,
}

impl SieveResponse {
    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }
}

// ─── Script directory ────────────────────────────────────────────────

/// One entry from a LISTSCRIPTS response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScriptEntry {
    pub name: String,
    /// Whether the server reported this script as the active one. The
    /// server is the source of truth; at most one entry per listing
    /// carries the marker.
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SieveConnectionConfig::default();
        assert_eq!(config.port, 4190);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.security, SieveSecurityMode::Implicit);
        assert!(!config.accept_invalid_certs);
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: SieveConnectionConfig = serde_json::from_str(
            r#"{"host":"mail.example.org","username":"jd","password":"secret"}"#,
        )
        .unwrap();
        assert_eq!(config.port, 4190);
        assert_eq!(config.security, SieveSecurityMode::Implicit);
    }
}
