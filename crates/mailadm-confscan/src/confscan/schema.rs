//! Serde-struct schema scan.
//!
//! Collects `pub struct` definitions and their `pub` fields (honouring
//! `#[serde(rename)]` and `#[serde(flatten)]`), then expands the structs
//! that are actually handed to a config parser into nested dotted keys.

use crate::confscan::types::SchemaField;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

lazy_static! {
    static ref STRUCT_HEADER_RE: Regex = Regex::new(r"^\s*pub\s+struct\s+(\w+)\s*\{").unwrap();
    static ref FIELD_RE: Regex = Regex::new(r"^\s*pub\s+(\w+)\s*:\s*([A-Za-z0-9_<>\[\]]+)").unwrap();
    static ref RENAME_RE: Regex = Regex::new(r#"#\[serde\(rename\s*=\s*"([^"]+)"\)\]"#).unwrap();
    static ref FLATTEN_RE: Regex = Regex::new(r"#\[serde\(flatten\)\]").unwrap();

    /// Call sites that mark a struct as a config parsing root.
    static ref ROOT_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(\w+)::parse\s*\(").unwrap(),
        Regex::new(r"from_str::<(\w+)>").unwrap(),
        Regex::new(r"deserialize.*?<(\w+)>").unwrap(),
    ];
}

/// One collected struct field, before expansion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructField {
    /// Key segment: the field name, or its serde rename.
    pub key: String,
    pub rust_type: String,
    pub file: String,
    pub line: usize,
    pub flatten: bool,
}

/// Result of scanning a source tree for config structs.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaScan {
    pub structs: BTreeMap<String, Vec<StructField>>,
    /// Structs seen at a parsing call site.
    pub roots: BTreeSet<String>,
    /// Whether the roots fell back to the `*Config` name heuristic.
    pub roots_from_heuristic: bool,
}

impl SchemaScan {
    /// Scan all `*.rs` files under `root`.
    pub fn scan_dir(root: &Path) -> std::io::Result<Self> {
        let mut scan = Self::default();
        let pattern = format!("{}/**/*.rs", root.display());
        let paths = glob::glob(&pattern)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
        for path in paths.flatten() {
            let rel = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .display()
                .to_string();
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            scan.collect_source(&content, &rel);
        }
        scan.detect_roots();
        Ok(scan)
    }

    /// Collect struct definitions from one file.
    pub fn collect_source(&mut self, content: &str, file: &str) {
        let mut current_struct: Option<String> = None;
        let mut pending_rename: Option<String> = None;
        let mut pending_flatten = false;

        for (line_no, line) in content.lines().enumerate() {
            if let Some(caps) = STRUCT_HEADER_RE.captures(line) {
                current_struct = Some(caps[1].to_string());
                pending_rename = None;
                pending_flatten = false;
                continue;
            }

            if line.trim_start().starts_with("#[serde") {
                if let Some(caps) = RENAME_RE.captures(line) {
                    pending_rename = Some(caps[1].to_string());
                } else if FLATTEN_RE.is_match(line) {
                    pending_flatten = true;
                }
                continue;
            }

            if let Some(struct_name) = &current_struct {
                if let Some(caps) = FIELD_RE.captures(line) {
                    let field = caps[1].to_string();
                    let rust_type = caps[2].to_string();
                    self.structs
                        .entry(struct_name.clone())
                        .or_default()
                        .push(StructField {
                            key: pending_rename.take().unwrap_or(field),
                            rust_type,
                            file: file.to_string(),
                            line: line_no + 1,
                            flatten: std::mem::take(&mut pending_flatten),
                        });
                } else if line.trim_start().starts_with('}') {
                    current_struct = None;
                }
            }
        }
        self.root_candidates(content);
    }

    fn root_candidates(&mut self, content: &str) {
        for pattern in ROOT_PATTERNS.iter() {
            for caps in pattern.captures_iter(content) {
                self.roots.insert(caps[1].to_string());
            }
        }
    }

    /// Keep only roots that are known structs; fall back to the
    /// `*Config` name heuristic when no parse site matched.
    pub fn detect_roots(&mut self) {
        let known: BTreeSet<String> = self
            .roots
            .iter()
            .filter(|name| self.structs.contains_key(*name))
            .cloned()
            .collect();
        if known.is_empty() {
            self.roots = self
                .structs
                .keys()
                .filter(|name| name.to_lowercase().ends_with("config"))
                .cloned()
                .collect();
            self.roots_from_heuristic = true;
        } else {
            self.roots = known;
            self.roots_from_heuristic = false;
        }
    }

    /// Expand every root into dotted keys, depth-first, deduplicated.
    pub fn expand_all(&self) -> Vec<SchemaField> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for root in &self.roots {
            let mut stack = vec![root.clone()];
            self.expand_struct(root, "", &mut seen, &mut out, &mut stack);
        }
        out
    }

    fn expand_struct(
        &self,
        struct_name: &str,
        prefix: &str,
        seen: &mut BTreeSet<String>,
        out: &mut Vec<SchemaField>,
        stack: &mut Vec<String>,
    ) {
        let Some(fields) = self.structs.get(struct_name) else {
            return;
        };
        for field in fields {
            let full_key = if prefix.is_empty() {
                field.key.clone()
            } else {
                format!("{}.{}", prefix, field.key)
            };
            if seen.insert(full_key.clone()) {
                out.push(SchemaField {
                    key: full_key.clone(),
                    rust_type: field.rust_type.clone(),
                    file: field.file.clone(),
                    line: field.line,
                });
            }

            let sub_type = unwrap_type(&field.rust_type);
            if !self.structs.contains_key(sub_type) || stack.iter().any(|s| s.as_str() == sub_type)
            {
                continue;
            }
            stack.push(sub_type.to_string());
            if field.flatten {
                // Flatten merges subfields into the same prefix.
                self.expand_struct(sub_type, prefix, seen, out, stack);
            } else {
                self.expand_struct(sub_type, &full_key, seen, out, stack);
            }
            stack.pop();
        }
    }

    /// Render the expanded keys as a markdown table.
    pub fn render_markdown(&self) -> String {
        let keys = self.expand_all();
        let mut out = String::new();
        out.push_str("# Configuration Keys (Schema-based Extraction)\n\n");
        out.push_str("Extracted via serde struct parsing. Complementary to the accessor scan;\n");
        out.push_str("keys accessed dynamically may not appear with `<id>` placeholders.\n\n");
        out.push_str(&format!(
            "**Total Keys:** {} | **Structs Analyzed:** {} | **Root Configs:** {}\n\n",
            keys.len(),
            self.structs.len(),
            self.roots.len()
        ));
        out.push_str("| Config Key | Type | Source |\n");
        out.push_str("|------------|------|--------|\n");
        for field in &keys {
            out.push_str(&format!(
                "| `{}` | `{}` | `{}:{}` |\n",
                field.key, field.rust_type, field.file, field.line
            ));
        }
        out
    }

    /// JSON export of the expanded schema.
    pub fn to_json(&self) -> serde_json::Value {
        let keys = self.expand_all();
        serde_json::json!({
            "extractionMethod": "serde-schema",
            "totalKeys": keys.len(),
            "totalStructs": self.structs.len(),
            "rootStructs": self.roots,
            "keys": keys,
        })
    }
}

/// Strip `Option<` / `Vec<` wrappers down to the inner type name.
fn unwrap_type(rust_type: &str) -> &str {
    let mut t = rust_type;
    loop {
        if let Some(inner) = t.strip_prefix("Option<") {
            t = inner;
        } else if let Some(inner) = t.strip_prefix("Vec<") {
            t = inner;
        } else {
            break;
        }
    }
    t.trim_end_matches('>')
}
