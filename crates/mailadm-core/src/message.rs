//! Cheap shape checks for email messages.

/// Whether `data` looks like an RFC 822 message: at least one
/// `Name: value` header among the first few lines. Trainers refuse
/// payloads that fail this check instead of shipping junk to the server.
pub fn looks_like_message(data: &[u8]) -> bool {
    let text = String::from_utf8_lossy(data);
    for line in text.split('\n').take(10) {
        if line.starts_with(' ') || line.starts_with('\t') {
            continue;
        }
        if let Some((name, _)) = line.split_once(':') {
            if !name.is_empty() && name.chars().all(|c| c.is_ascii_graphic()) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_header_shape() {
        assert!(looks_like_message(b"Subject: hello\nFrom: a@b\n\nbody\n"));
    }

    #[test]
    fn test_rejects_plain_text() {
        assert!(!looks_like_message(b"just some text\nwithout headers\n"));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(!looks_like_message(b""));
    }

    #[test]
    fn test_continuation_lines_are_skipped() {
        assert!(!looks_like_message(b" folded: not a header\n"));
    }

    #[test]
    fn test_header_past_first_lines_is_found() {
        let msg = b"line\nline\nSubject: late\n";
        // A header within the first ten lines still counts.
        assert!(looks_like_message(msg));
    }
}
