//! Offline settings sources.
//!
//! Three on-disk forms feed the ruleset tooling without server access:
//! - a flattened config file (`key = "value"` lines)
//! - a `Key:` / `Value:` dump (ANSI escapes tolerated)
//! - the pipe-table output of `stalwart-cli server list-config`, which
//!   converts into the dump form

use crate::stalwart::error::StalwartResult;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;

lazy_static! {
    static ref ANSI_RE: Regex = Regex::new(r"\x1b\[[0-9;]*m").unwrap();
    static ref TABLE_ROW_RE: Regex = Regex::new(r"^\|\s*(.*?)\s*\|\s*(.*?)\s*\|$").unwrap();
}

pub fn strip_ansi(value: &str) -> String {
    ANSI_RE.replace_all(value, "").to_string()
}

// ─── Flat config ─────────────────────────────────────────────────────

/// Parse a flattened config file: one `key = value` per line, `#`
/// comments, surrounding quotes on values stripped.
pub fn parse_flat_config(text: &str) -> BTreeMap<String, String> {
    let mut settings = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let mut value = value.trim();
        if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
            value = &value[1..value.len() - 1];
        }
        settings.insert(key.to_string(), value.to_string());
    }
    settings
}

pub fn load_flat_config(path: &Path) -> StalwartResult<BTreeMap<String, String>> {
    Ok(parse_flat_config(&std::fs::read_to_string(path)?))
}

// ─── Key dump ────────────────────────────────────────────────────────

/// Parse a `Key:` / `Value:` dump. `<no value>` maps to the empty
/// string.
pub fn parse_key_dump(text: &str) -> BTreeMap<String, String> {
    let mut settings = BTreeMap::new();
    let mut key: Option<String> = None;
    for raw_line in text.lines() {
        let line = strip_ansi(raw_line);
        let line = line.trim();
        if let Some(rest) = line.split_once("Key:").map(|(_, rest)| rest) {
            key = Some(rest.trim().to_string());
        } else if let Some(rest) = line.split_once("Value:").map(|(_, rest)| rest) {
            if let Some(key) = key.take() {
                let value = rest.trim();
                let value = if value == "<no value>" { "" } else { value };
                settings.insert(key, value.to_string());
            }
        }
    }
    settings
}

pub fn load_key_dump(path: &Path) -> StalwartResult<BTreeMap<String, String>> {
    Ok(parse_key_dump(&std::fs::read_to_string(path)?))
}

// ─── CLI table ───────────────────────────────────────────────────────

/// Parse the pipe-table that `stalwart-cli server list-config` prints.
/// Continuation rows (empty key cell) extend the previous record's value
/// across lines.
pub fn parse_cli_table(text: &str) -> Vec<(String, String)> {
    let mut records: Vec<(String, String)> = Vec::new();
    let mut current_key: Option<String> = None;
    let mut current_value: Vec<String> = Vec::new();

    let mut flush = |key: &mut Option<String>, value: &mut Vec<String>, out: &mut Vec<_>| {
        if let Some(key) = key.take() {
            out.push((key, value.join("\n").trim().to_string()));
        }
        value.clear();
    };

    for line in text.lines() {
        if line.starts_with("+--") {
            continue;
        }
        let Some(caps) = TABLE_ROW_RE.captures(line.trim_end()) else {
            continue;
        };
        let key_part = caps[1].to_string();
        let value_part = caps[2].to_string();

        if !key_part.is_empty() {
            flush(&mut current_key, &mut current_value, &mut records);
            current_key = Some(key_part);
            current_value.push(value_part);
        } else if current_key.is_some() {
            current_value.push(value_part);
        }
    }
    flush(&mut current_key, &mut current_value, &mut records);
    records
}

/// Render records in the `Key:` / `Value:` dump form that
/// [`parse_key_dump`] reads back.
pub fn render_key_dump(records: &[(String, String)]) -> String {
    let mut out = String::new();
    for (key, value) in records {
        let value = if value.is_empty() { "<no value>" } else { value };
        out.push_str(&format!("Key:   {}\nValue: {}\n\n", key, value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_config_parsing() {
        let text = "# comment\n\nserver.hostname = \"mx.example.org\"\nqueue.retry = 5\nbroken line\n";
        let settings = parse_flat_config(text);
        assert_eq!(settings.len(), 2);
        assert_eq!(settings["server.hostname"], "mx.example.org");
        assert_eq!(settings["queue.retry"], "5");
    }

    #[test]
    fn test_key_dump_parsing_strips_ansi() {
        let text = "\x1b[1mKey:\x1b[0m   spam-filter.rule.x.enable\n\x1b[1mValue:\x1b[0m true\n\n\x1b[1mKey:\x1b[0m   empty.key\n\x1b[1mValue:\x1b[0m <no value>\n";
        let settings = parse_key_dump(text);
        assert_eq!(settings["spam-filter.rule.x.enable"], "true");
        assert_eq!(settings["empty.key"], "");
    }

    #[test]
    fn test_cli_table_with_continuations() {
        let text = "+----------------+-------+\n\
| Key            | Value |\n\
+----------------+-------+\n\
| server.name    | mx    |\n\
| long.value     | part1 |\n\
|                | part2 |\n\
+----------------+-------+\n";
        let records = parse_cli_table(text);
        // The header row parses as a record too, as in the original tool.
        assert!(records.iter().any(|(k, _)| k == "server.name"));
        let long = records.iter().find(|(k, _)| k == "long.value").unwrap();
        assert_eq!(long.1, "part1\npart2");
    }

    #[test]
    fn test_dump_round_trip() {
        let records = vec![
            ("a.b".to_string(), "value".to_string()),
            ("c.d".to_string(), String::new()),
        ];
        let rendered = render_key_dump(&records);
        let parsed = parse_key_dump(&rendered);
        assert_eq!(parsed["a.b"], "value");
        assert_eq!(parsed["c.d"], "");
    }
}
