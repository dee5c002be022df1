//! LISTSCRIPTS response parsing and name validation.

use crate::managesieve::error::{SieveError, SieveResult};
use crate::managesieve::types::ScriptEntry;

const ACTIVE_MARKER: &str = "ACTIVE";

/// Parse the data lines of a LISTSCRIPTS response.
pub fn parse_listing(lines: &[String]) -> SieveResult<Vec<ScriptEntry>> {
    lines.iter().map(|line| parse_script_line(line)).collect()
}

/// Parse one listing line: a quoted script name optionally followed by
/// whitespace and the active marker. Anything else is outside the
/// protocol grammar.
pub fn parse_script_line(line: &str) -> SieveResult<ScriptEntry> {
    let trimmed = line.trim();
    let rest = trimmed
        .strip_prefix('"')
        .ok_or_else(|| SieveError::protocol(format!("Unparseable listing line: '{}'", line)))?;
    let close = rest
        .find('"')
        .ok_or_else(|| SieveError::protocol(format!("Unterminated name in listing: '{}'", line)))?;
    let name = &rest[..close];
    let tail = rest[close + 1..].trim();

    let active = match tail {
        "" => false,
        ACTIVE_MARKER => true,
        _ => {
            return Err(SieveError::protocol(format!(
                "Unexpected trailing token in listing: '{}'",
                line
            )))
        }
    };

    Ok(ScriptEntry {
        name: name.to_string(),
        active,
    })
}

/// Validate a script or account name before it is embedded in a command
/// line. The encoder performs no escaping, so names that cannot be
/// represented are refused outright rather than sent malformed.
pub fn validate_script_name(name: &str) -> SieveResult<()> {
    if name.is_empty() {
        return Err(SieveError::invalid_name("Script name must not be empty"));
    }
    if name.contains('"') || name.contains('\\') {
        return Err(SieveError::invalid_name(format!(
            "Script name '{}' contains a quote or backslash",
            name
        )));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(SieveError::invalid_name(
            "Script name contains control characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_entry() {
        let entry = parse_script_line("\"vacation\"").unwrap();
        assert_eq!(entry.name, "vacation");
        assert!(!entry.active);
    }

    #[test]
    fn test_active_entry() {
        let entry = parse_script_line("\"default\" ACTIVE").unwrap();
        assert_eq!(entry.name, "default");
        assert!(entry.active);
    }

    #[test]
    fn test_name_with_spaces() {
        let entry = parse_script_line("\"simple script\" ACTIVE").unwrap();
        assert_eq!(entry.name, "simple script");
        assert!(entry.active);
    }

    #[test]
    fn test_unquoted_line_rejected() {
        assert!(parse_script_line("vacation ACTIVE").is_err());
    }

    #[test]
    fn test_unterminated_quote_rejected() {
        assert!(parse_script_line("\"vacation").is_err());
    }

    #[test]
    fn test_unknown_marker_rejected() {
        assert!(parse_script_line("\"vacation\" ENABLED").is_err());
    }

    #[test]
    fn test_listing_order_preserved() {
        let lines = vec![
            "\"b\"".to_string(),
            "\"a\" ACTIVE".to_string(),
            "\"c\"".to_string(),
        ];
        let entries = parse_listing(&lines).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].name, "a");
        assert!(entries[1].active);
        assert_eq!(entries.iter().filter(|e| e.active).count(), 1);
    }

    #[test]
    fn test_name_validation() {
        assert!(validate_script_name("vacation").is_ok());
        assert!(validate_script_name("with spaces").is_ok());
        assert!(validate_script_name("").is_err());
        assert!(validate_script_name("has\"quote").is_err());
        assert!(validate_script_name("has\\slash").is_err());
        assert!(validate_script_name("line\nbreak").is_err());
    }
}
