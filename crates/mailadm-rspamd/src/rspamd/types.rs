//! Shared types for the Rspamd crate.

use serde::{Deserialize, Serialize};

/// Bayes needs at least this many messages of each class before the
/// classifier activates.
pub const BAYES_MIN_MESSAGES: usize = 200;

/// Connection parameters for the Rspamd controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RspamdConfig {
    #[serde(default = "default_url")]
    pub url: String,
    /// Controller password, sent as the `Password` header when set.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "http://localhost:11334".to_string()
}
fn default_timeout() -> u64 {
    10
}

impl Default for RspamdConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            password: None,
            timeout_secs: default_timeout(),
        }
    }
}

/// Message classification being trained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LearnClass {
    Spam,
    Ham,
}

impl LearnClass {
    /// Controller endpoint for this class.
    pub fn endpoint(&self) -> &'static str {
        match self {
            LearnClass::Spam => "learnspam",
            LearnClass::Ham => "learnham",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LearnClass::Spam => "spam",
            LearnClass::Ham => "ham",
        }
    }
}

/// What happened to one submitted message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LearnOutcome {
    /// Newly learned.
    Trained,
    /// The controller had already learned this message (HTTP 208).
    AlreadyKnown,
}

/// Outcome of one batch training run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnReport {
    pub total: usize,
    pub trained: usize,
    /// Skipped because the state file already records the digest.
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}
