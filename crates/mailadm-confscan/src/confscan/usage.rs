//! Runtime accessor-pattern scan.
//!
//! Reconstructs configuration keys from call sites such as:
//!
//! ```text
//! config.property(("queue", "tls", "dane"))
//! config.value_require("server.hostname")
//! config.sub_keys("server.listener", ".protocol")
//! config.iterate_prefix("directory")
//! settings.property_or_default::<Option<u32>>(("session", id, "limit"))
//! ```
//!
//! Dynamic segments (loop variables like `id`) collapse to an `<id>`
//! placeholder.

use crate::confscan::types::{ContextKind, KeyContext, KeyTree};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

const ACCESSORS: &str = "property|value|value_require|value_require_non_empty|property_require|property_or_default|property_or_else|value_or_else|properties";

lazy_static! {
    /// Tuple-form access, tolerating turbofish, nested call parens in
    /// arguments, and trailing default arguments.
    static ref TUPLE_RE: Regex = Regex::new(&format!(
        r"(?:config\.|\.)(?:{})\s*(?:::<[^(]+)?\s*\(\s*\(((?:[^()]|\([^()]*\))+)\)\s*[\),]",
        ACCESSORS
    ))
    .unwrap();

    /// String-form access with optional turbofish and extra arguments.
    static ref SIMPLE_RE: Regex = Regex::new(&format!(
        r#"(?:config\.|\.)(?:{})\s*(?:::<[^(]+)?\s*\(\s*"([^"]+)"[^)]*\)"#,
        ACCESSORS
    ))
    .unwrap();

    static ref SUB_KEYS_RE: Regex =
        Regex::new(r#"config\.sub_keys\s*\(\s*"([^"]+)"(?:\s*,\s*"([^"]+)")?\s*\)"#).unwrap();

    static ref SUB_KEYS_SUFFIXES_RE: Regex =
        Regex::new(r#"(?s)config\.sub_keys_with_suffixes\s*\(\s*"([^"]+)"\s*,\s*&\[(.*?)\]"#)
            .unwrap();

    static ref SUFFIX_ITEM_RE: Regex = Regex::new(r#""\.?([^"]+)""#).unwrap();

    static ref VALUES_RE: Regex =
        Regex::new(r#"(?:config\.|\.)(?:values|values_or_else)\s*\(\s*"([^"]+)"[^)]*\)"#).unwrap();

    static ref ITERATE_PREFIX_RE: Regex =
        Regex::new(r#"config\.iterate_prefix\s*\(\s*"([^"]+)"\s*\)"#).unwrap();

    static ref QUOTED_RE: Regex = Regex::new(r#"["']([^"']+)["']"#).unwrap();
    static ref IDENT_RE: Regex = Regex::new(r"^([a-zA-Z_][a-zA-Z0-9_]*)").unwrap();
}

/// Variable names that stand for a dynamic key segment.
const PLACEHOLDER_VARS: [&str; 6] = ["id", "prefix", "key", "name", "ip", "option"];

/// Result of scanning a source tree for accessor calls.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageScan {
    /// Key → every context it was seen in. Sorted by key.
    pub keys: BTreeMap<String, Vec<KeyContext>>,
}

impl UsageScan {
    /// Scan all `*.rs` files under `root`, skipping test code.
    pub fn scan_dir(root: &Path) -> std::io::Result<Self> {
        let mut scan = Self::default();
        let pattern = format!("{}/**/*.rs", root.display());
        let paths = glob::glob(&pattern)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

        let mut file_count = 0usize;
        for path in paths.flatten() {
            let rel = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .display()
                .to_string();
            if rel.split('/').any(|seg| seg == "tests") || rel.ends_with("_test.rs") {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(&path) else {
                log::warn!("[confscan] unreadable file skipped: {}", path.display());
                continue;
            };
            scan.scan_source(&content, &rel);
            file_count += 1;
        }
        log::info!(
            "[confscan] scanned {} files, found {} unique keys",
            file_count,
            scan.keys.len()
        );
        Ok(scan)
    }

    /// Extract keys from one file's content.
    pub fn scan_source(&mut self, content: &str, file: &str) {
        for caps in TUPLE_RE.captures_iter(content) {
            if let Some(key) = key_from_tuple(&caps[1]) {
                self.add(key, file, ContextKind::Tuple);
            }
        }
        for caps in SIMPLE_RE.captures_iter(content) {
            let key = caps[1].trim();
            if !key.is_empty() && !key.starts_with('&') {
                self.add(key.to_string(), file, ContextKind::String);
            }
        }
        for caps in SUB_KEYS_RE.captures_iter(content) {
            let base = caps[1].trim().to_string();
            self.add(base.clone(), file, ContextKind::SubKeys);
            if let Some(suffix) = caps.get(2) {
                let suffix = suffix.as_str().trim_matches('.');
                self.add(
                    format!("{}.<id>.{}", base, suffix),
                    file,
                    ContextKind::SubKeysTemplate,
                );
            }
        }
        for caps in SUB_KEYS_SUFFIXES_RE.captures_iter(content) {
            let base = caps[1].trim().to_string();
            self.add(base.clone(), file, ContextKind::SubKeys);
            for item in SUFFIX_ITEM_RE.captures_iter(&caps[2]) {
                self.add(
                    format!("{}.<id>.{}", base, &item[1]),
                    file,
                    ContextKind::SubKeysTemplate,
                );
            }
        }
        for caps in VALUES_RE.captures_iter(content) {
            let key = caps[1].trim();
            if !key.is_empty() {
                self.add(key.to_string(), file, ContextKind::Values);
            }
        }
        for caps in ITERATE_PREFIX_RE.captures_iter(content) {
            let prefix = caps[1].trim();
            if !prefix.is_empty() {
                self.add(prefix.to_string(), file, ContextKind::IteratePrefix);
                self.add(
                    format!("{}.<id>.<key>", prefix),
                    file,
                    ContextKind::IteratePrefixTemplate,
                );
            }
        }
    }

    fn add(&mut self, key: String, file: &str, kind: ContextKind) {
        self.keys.entry(key).or_default().push(KeyContext {
            file: file.to_string(),
            kind,
        });
    }

    /// Keep only keys under `prefix`.
    pub fn filter_prefix(&mut self, prefix: &str) {
        self.keys.retain(|key, _| key.starts_with(prefix));
    }

    /// Flat sorted key list.
    pub fn flat(&self) -> Vec<&str> {
        self.keys.keys().map(|k| k.as_str()).collect()
    }

    /// Key hierarchy for tree rendering.
    pub fn hierarchy(&self) -> KeyTree {
        let mut tree = KeyTree::default();
        for key in self.keys.keys() {
            tree.insert(key);
        }
        tree
    }

    /// JSON export: keys, hierarchy, and per-key contexts.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "keys": self.flat(),
            "hierarchy": self.hierarchy(),
            "contexts": self.keys,
        })
    }
}

/// Extract a dotted key from the inside of a tuple argument, e.g.
/// `"queue", id, "timeout"` → `queue.<id>.timeout`.
fn key_from_tuple(tuple: &str) -> Option<String> {
    let tuple = tuple.trim();
    let tuple = tuple
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(tuple);

    let mut parts = Vec::new();
    for part in tuple.split(',') {
        let part = part.trim();
        if let Some(caps) = QUOTED_RE.captures(part) {
            parts.push(caps[1].to_string());
        } else if let Some(caps) = IDENT_RE.captures(part) {
            if PLACEHOLDER_VARS.contains(&&caps[1]) {
                parts.push("<id>".to_string());
            }
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    }
}
