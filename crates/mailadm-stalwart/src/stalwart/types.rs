//! Shared types for the Stalwart management crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─── Configuration ───────────────────────────────────────────────────

/// Connection parameters for the management API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StalwartConfig {
    /// Base URL; a bare host is promoted to `https://host`.
    pub server: String,
    /// Bearer token; takes precedence over basic auth.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Path prefix for management endpoints.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_true")]
    pub verify_tls: bool,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_prefix() -> String {
    "/api".to_string()
}
fn default_true() -> bool {
    true
}
fn default_timeout() -> u64 {
    30
}

impl Default for StalwartConfig {
    fn default() -> Self {
        Self {
            server: "http://127.0.0.1:8080".to_string(),
            token: None,
            username: None,
            password: None,
            api_prefix: default_api_prefix(),
            verify_tls: true,
            timeout_secs: default_timeout(),
        }
    }
}

// ─── Spam rules ──────────────────────────────────────────────────────

/// One `if`/`then` row of a rule's condition list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConditionItem {
    #[serde(rename = "if")]
    pub expr: String,
    #[serde(rename = "then")]
    pub result: String,
}

/// Conditions of a rule: ordered `if`/`then` rows plus an optional
/// fallback result.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuleConditions {
    #[serde(rename = "if", default)]
    pub items: Vec<ConditionItem>,
    #[serde(rename = "else", default)]
    pub default: Option<String>,
}

/// A spam-filter rule reconstructed from `spam-filter.rule.<id>.*` keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    pub id: String,
    pub enabled: bool,
    pub priority: i64,
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub conditions: RuleConditions,
    /// Attributes that are not part of the fixed schema, preserved
    /// verbatim for round-tripping.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, String>,
    /// Tag symbols referenced by the rule's results (derived, informative).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Interpretation of one `spam-filter.list.scores.<SYMBOL>` value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ScoreAction {
    /// Numeric score added to the message total.
    Allow,
    Reject,
    Discard,
    /// Something else; the raw value is preserved.
    Custom,
}

/// A score entry keyed by tag symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub id: String,
    pub action: ScoreAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub raw: String,
}

// ─── Export bundle ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub exported_at: String,
    pub source: String,
    pub rule_count: usize,
    pub score_count: usize,
}

/// The JSON bundle written by `export` and read back by `import`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleExport {
    pub metadata: ExportMetadata,
    pub rules: Vec<RuleRecord>,
    pub scores: Vec<ScoreEntry>,
}

// ─── Bayes training ──────────────────────────────────────────────────

/// Classification a message is trained as.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TrainClass {
    Spam,
    Ham,
}

impl TrainClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainClass::Spam => "spam",
            TrainClass::Ham => "ham",
        }
    }
}

/// One failed message within a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainFailure {
    pub source: String,
    pub reason: String,
}

/// Outcome of a batch training run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<TrainFailure>,
}
