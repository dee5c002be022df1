//! Settings ⇄ ruleset conversion.
//!
//! Rules live in the settings store as flat dotted keys:
//!
//! ```text
//! spam-filter.rule.<id>.enable = "true"
//! spam-filter.rule.<id>.priority = "20"
//! spam-filter.rule.<id>.condition.0000.if = "..."
//! spam-filter.rule.<id>.condition.0000.then = "'TAG'"
//! spam-filter.list.scores.<SYMBOL> = "1.25" | "reject" | "discard"
//! ```

use crate::stalwart::types::*;
use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

pub const RULE_PREFIX: &str = "spam-filter.rule.";
pub const SCORE_PREFIX: &str = "spam-filter.list.scores.";

lazy_static! {
    /// Tag symbols referenced inside condition results: `'DKIM_FAIL'`.
    static ref TAG_RE: Regex = Regex::new(r"'([A-Z0-9_]{2,})'").unwrap();
}

/// The full spam ruleset: rules sorted by (priority, id) plus the score
/// table.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub rules: Vec<RuleRecord>,
    pub scores: BTreeMap<String, ScoreEntry>,
}

impl RuleSet {
    /// Reconstruct the ruleset from flat settings.
    pub fn from_settings(settings: &BTreeMap<String, String>, include_disabled: bool) -> Self {
        let mut raw_rules: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for (key, value) in settings {
            if let Some(remainder) = key.strip_prefix(RULE_PREFIX) {
                if let Some((rule_id, attr)) = remainder.split_once('.') {
                    raw_rules
                        .entry(rule_id.to_string())
                        .or_default()
                        .insert(attr.to_string(), value.clone());
                }
            }
        }

        let mut rules = Vec::new();
        for (rule_id, attrs) in raw_rules {
            let enabled = parse_bool(attrs.get("enable"), true);
            if !enabled && !include_disabled {
                continue;
            }

            let mut conditions = RuleConditions::default();
            let mut grouped: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
            for (attr, value) in &attrs {
                if let Some(entry) = attr.strip_prefix("condition.") {
                    if let Some((idx, suffix)) = entry.split_once('.') {
                        grouped
                            .entry(idx.to_string())
                            .or_default()
                            .insert(suffix.to_string(), value.clone());
                    }
                }
            }
            for row in grouped.values() {
                if let (Some(expr), Some(result)) = (row.get("if"), row.get("then")) {
                    conditions.items.push(ConditionItem {
                        expr: expr.clone(),
                        result: result.clone(),
                    });
                }
                if let Some(default) = row.get("else") {
                    conditions.default = Some(default.clone());
                }
            }

            let mut extras = BTreeMap::new();
            for (attr, value) in &attrs {
                let fixed = matches!(
                    attr.as_str(),
                    "enable" | "priority" | "scope" | "description"
                );
                if !fixed && !attr.starts_with("condition.") {
                    extras.insert(attr.clone(), value.clone());
                }
            }

            let mut record = RuleRecord {
                id: rule_id,
                enabled,
                priority: parse_int(attrs.get("priority"), 0),
                scope: attrs.get("scope").cloned().unwrap_or_else(|| "any".into()),
                description: attrs.get("description").cloned(),
                conditions,
                extras,
                tags: Vec::new(),
            };
            record.tags = rule_tags(&record);
            rules.push(record);
        }

        rules.sort_by(|a, b| (a.priority, &a.id).cmp(&(b.priority, &b.id)));

        let mut scores = BTreeMap::new();
        for (key, value) in settings {
            if let Some(symbol) = key.strip_prefix(SCORE_PREFIX) {
                scores.insert(symbol.to_string(), parse_score_entry(symbol, value));
            }
        }

        Self { rules, scores }
    }

    /// Table rows for the `list` view: id, scope, priority, enabled,
    /// condition/tag summary.
    pub fn summary_rows(&self, max_tags: usize) -> Vec<[String; 5]> {
        self.rules
            .iter()
            .map(|record| {
                let mut tag_strings: Vec<String> = record
                    .tags
                    .iter()
                    .take(max_tags)
                    .map(|tag| format!("{}{}", tag, self.score_hint(tag)))
                    .collect();
                if record.tags.len() > max_tags {
                    tag_strings.push("…".to_string());
                }
                let tags = if tag_strings.is_empty() {
                    "-".to_string()
                } else {
                    tag_strings.join(", ")
                };
                [
                    record.id.clone(),
                    record.scope.clone(),
                    record.priority.to_string(),
                    if record.enabled { "yes" } else { "no" }.to_string(),
                    format!("{} cond / tags: {}", record.conditions.items.len(), tags),
                ]
            })
            .collect()
    }

    fn score_hint(&self, tag: &str) -> String {
        match self.scores.get(tag) {
            Some(entry) => match entry.action {
                ScoreAction::Reject => " (reject)".to_string(),
                ScoreAction::Discard => " (discard)".to_string(),
                _ => match entry.value {
                    Some(score) => format!(" ({:+.2})", score),
                    None => String::new(),
                },
            },
            None => String::new(),
        }
    }

    /// Build the JSON export bundle.
    pub fn to_export(&self, source_label: &str) -> RuleExport {
        RuleExport {
            metadata: ExportMetadata {
                exported_at: Utc::now().to_rfc3339(),
                source: source_label.to_string(),
                rule_count: self.rules.len(),
                score_count: self.scores.len(),
            },
            rules: self.rules.clone(),
            scores: self.scores.values().cloned().collect(),
        }
    }
}

/// Tags referenced by a rule's condition results and fallback.
pub fn rule_tags(record: &RuleRecord) -> Vec<String> {
    let mut tags = Vec::new();
    let mut push_from = |text: &str| {
        for capture in TAG_RE.captures_iter(text) {
            let tag = capture[1].to_string();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    };
    for item in &record.conditions.items {
        push_from(&item.result);
    }
    if let Some(default) = &record.conditions.default {
        push_from(default);
    }
    tags
}

/// Interpret one score value.
pub fn parse_score_entry(symbol: &str, raw: &str) -> ScoreEntry {
    let lowered = raw.trim().to_lowercase();
    let (action, value) = match lowered.as_str() {
        "reject" => (ScoreAction::Reject, None),
        "discard" => (ScoreAction::Discard, None),
        _ => match raw.trim().parse::<f64>() {
            Ok(score) => (ScoreAction::Allow, Some(score)),
            Err(_) => (ScoreAction::Custom, None),
        },
    };
    ScoreEntry {
        id: symbol.to_string(),
        action,
        value,
        raw: raw.to_string(),
    }
}

/// Build the settings operations that re-import an export bundle:
/// one insert per rule plus a single batch for the score table.
pub fn build_import_payload(
    export: &RuleExport,
) -> (Vec<serde_json::Value>, Vec<(String, String)>) {
    let mut operations = Vec::new();
    for rule in &export.rules {
        let mut values: Vec<(String, String)> = Vec::new();
        values.push(("enable".into(), rule.enabled.to_string()));
        values.push(("priority".into(), rule.priority.to_string()));
        values.push(("scope".into(), rule.scope.clone()));
        if let Some(description) = &rule.description {
            values.push(("description".into(), description.clone()));
        }
        for (key, value) in &rule.extras {
            values.push((key.clone(), value.clone()));
        }
        for (idx, condition) in rule.conditions.items.iter().enumerate() {
            let slot = zero_index(idx);
            values.push((format!("condition.{}.if", slot), condition.expr.clone()));
            values.push((format!("condition.{}.then", slot), condition.result.clone()));
        }
        if let Some(default) = &rule.conditions.default {
            let slot = zero_index(rule.conditions.items.len());
            values.push((format!("condition.{}.else", slot), default.clone()));
        }

        operations.push(serde_json::json!({
            "type": "insert",
            "prefix": format!("{}{}", RULE_PREFIX, rule.id),
            "values": values,
            "assertEmpty": false,
        }));
    }

    let score_values: Vec<(String, String)> = export
        .scores
        .iter()
        .map(|entry| {
            let raw = if entry.raw.is_empty() {
                match entry.action {
                    ScoreAction::Reject => "reject".to_string(),
                    ScoreAction::Discard => "discard".to_string(),
                    _ => entry.value.unwrap_or(0.0).to_string(),
                }
            } else {
                entry.raw.clone()
            };
            (entry.id.clone(), raw)
        })
        .collect();

    (operations, score_values)
}

/// The operation that inserts the score batch, appended after the rule
/// inserts when any scores exist.
pub fn score_batch_operation(score_values: &[(String, String)]) -> serde_json::Value {
    serde_json::json!({
        "type": "insert",
        "prefix": SCORE_PREFIX.trim_end_matches('.'),
        "values": score_values,
        "assertEmpty": false,
    })
}

fn zero_index(idx: usize) -> String {
    format!("{:04}", idx)
}

pub fn parse_bool(value: Option<&String>, default: bool) -> bool {
    match value {
        None => default,
        Some(v) => matches!(
            v.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
    }
}

pub fn parse_int(value: Option<&String>, default: i64) -> i64 {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_settings() -> BTreeMap<String, String> {
        let mut s = BTreeMap::new();
        let pairs = [
            ("spam-filter.rule.dmarc.enable", "true"),
            ("spam-filter.rule.dmarc.priority", "20"),
            ("spam-filter.rule.dmarc.scope", "any"),
            ("spam-filter.rule.dmarc.description", "DMARC verification"),
            (
                "spam-filter.rule.dmarc.condition.0000.if",
                "dmarc_result()",
            ),
            ("spam-filter.rule.dmarc.condition.0000.then", "'DMARC_PASS'"),
            ("spam-filter.rule.dmarc.condition.0001.else", "'DMARC_FAIL'"),
            ("spam-filter.rule.old.enable", "false"),
            ("spam-filter.rule.old.priority", "10"),
            ("spam-filter.list.scores.DMARC_PASS", "-0.5"),
            ("spam-filter.list.scores.DMARC_FAIL", "reject"),
            ("server.hostname", "mx"),
        ];
        for (k, v) in pairs {
            s.insert(k.to_string(), v.to_string());
        }
        s
    }

    #[test]
    fn test_from_settings_builds_rules_and_scores() {
        let rule_set = RuleSet::from_settings(&sample_settings(), true);
        assert_eq!(rule_set.rules.len(), 2);
        // Sorted by (priority, id): "old" (10) before "dmarc" (20).
        assert_eq!(rule_set.rules[0].id, "old");
        assert!(!rule_set.rules[0].enabled);

        let dmarc = &rule_set.rules[1];
        assert_eq!(dmarc.priority, 20);
        assert_eq!(dmarc.conditions.items.len(), 1);
        assert_eq!(dmarc.conditions.items[0].expr, "dmarc_result()");
        assert_eq!(dmarc.conditions.default.as_deref(), Some("'DMARC_FAIL'"));
        assert_eq!(dmarc.tags, vec!["DMARC_PASS", "DMARC_FAIL"]);

        assert_eq!(rule_set.scores.len(), 2);
        assert_eq!(
            rule_set.scores.get("DMARC_FAIL").unwrap().action,
            ScoreAction::Reject
        );
        assert_eq!(
            rule_set.scores.get("DMARC_PASS").unwrap().value,
            Some(-0.5)
        );
    }

    #[test]
    fn test_disabled_rules_can_be_excluded() {
        let rule_set = RuleSet::from_settings(&sample_settings(), false);
        assert_eq!(rule_set.rules.len(), 1);
        assert_eq!(rule_set.rules[0].id, "dmarc");
    }

    #[test]
    fn test_summary_rows_carry_score_hints() {
        let rule_set = RuleSet::from_settings(&sample_settings(), true);
        let rows = rule_set.summary_rows(3);
        assert_eq!(rows.len(), 2);
        let dmarc_row = &rows[1];
        assert_eq!(dmarc_row[0], "dmarc");
        assert_eq!(dmarc_row[3], "yes");
        assert!(dmarc_row[4].contains("DMARC_PASS (-0.50)"));
        assert!(dmarc_row[4].contains("DMARC_FAIL (reject)"));
    }

    #[test]
    fn test_import_payload_round_trip() {
        let rule_set = RuleSet::from_settings(&sample_settings(), true);
        let export = rule_set.to_export("test");
        let (operations, score_values) = build_import_payload(&export);

        assert_eq!(operations.len(), 2);
        let dmarc_op = operations
            .iter()
            .find(|op| op["prefix"] == "spam-filter.rule.dmarc")
            .unwrap();
        assert_eq!(dmarc_op["type"], "insert");
        assert_eq!(dmarc_op["assertEmpty"], false);
        let values = dmarc_op["values"].as_array().unwrap();
        assert!(values
            .iter()
            .any(|v| v[0] == "condition.0000.if" && v[1] == "dmarc_result()"));
        assert!(values.iter().any(|v| v[0] == "condition.0001.else"));

        assert_eq!(score_values.len(), 2);
        assert!(score_values
            .iter()
            .any(|(k, v)| k == "DMARC_FAIL" && v == "reject"));

        let batch = score_batch_operation(&score_values);
        assert_eq!(batch["prefix"], "spam-filter.list.scores");
    }

    #[test]
    fn test_parse_bool_and_int() {
        assert!(parse_bool(Some(&"Yes".to_string()), false));
        assert!(!parse_bool(Some(&"off".to_string()), true));
        assert!(parse_bool(None, true));
        assert_eq!(parse_int(Some(&" 42 ".to_string()), 0), 42);
        assert_eq!(parse_int(Some(&"nan".to_string()), 7), 7);
    }

    #[test]
    fn test_score_entry_variants() {
        assert_eq!(parse_score_entry("X", "1.5").action, ScoreAction::Allow);
        assert_eq!(parse_score_entry("X", "Reject").action, ScoreAction::Reject);
        assert_eq!(
            parse_score_entry("X", "weird()").action,
            ScoreAction::Custom
        );
    }
}
