//! Shared types for the confscan crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where and how a configuration key was seen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeyContext {
    /// Source file, relative to the scanned root.
    pub file: String,
    /// Accessor kind: `tuple`, `string`, `subKeys`, `values`, …
    pub kind: ContextKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ContextKind {
    Tuple,
    String,
    SubKeys,
    SubKeysTemplate,
    Values,
    IteratePrefix,
    IteratePrefixTemplate,
}

/// One expanded key from the schema scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    pub key: String,
    pub rust_type: String,
    pub file: String,
    pub line: usize,
}

/// A nested key hierarchy, one node per dotted segment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyTree {
    #[serde(default)]
    pub children: BTreeMap<String, KeyTree>,
}

impl KeyTree {
    /// Insert a dotted key, creating intermediate nodes.
    pub fn insert(&mut self, key: &str) {
        let mut node = self;
        for part in key.split('.') {
            node = node.children.entry(part.to_string()).or_default();
        }
    }

    /// Render the hierarchy with box-drawing connectors.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, "");
        out
    }

    fn render_into(&self, out: &mut String, prefix: &str) {
        let count = self.children.len();
        for (i, (part, child)) in self.children.iter().enumerate() {
            let last = i + 1 == count;
            let connector = if last { "└── " } else { "├── " };
            out.push_str(prefix);
            out.push_str(connector);
            out.push_str(part);
            out.push('\n');
            let extension = if last { "    " } else { "│   " };
            child.render_into(out, &format!("{}{}", prefix, extension));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_insert_and_render() {
        let mut tree = KeyTree::default();
        tree.insert("server.listener.http");
        tree.insert("server.listener.smtp");
        tree.insert("queue.retry");
        let rendered = tree.render();
        assert!(rendered.contains("├── queue\n"));
        assert!(rendered.contains("└── server\n"));
        assert!(rendered.contains("    └── listener\n"));
        assert!(rendered.contains("        ├── http\n"));
        assert!(rendered.contains("        └── smtp\n"));
    }
}
