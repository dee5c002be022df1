//! Splitting mbox archives into individual messages.
//!
//! Messages are delimited by `From ` separator lines at the start of the
//! file or following a blank line. The separator itself is not part of
//! the message; mboxrd-style `>From ` escaping is undone by dropping one
//! `>`.

/// Split raw mbox content into individual message bodies.
///
/// Content that does not start with a `From ` separator is treated as a
/// single message.
pub fn split_mbox(raw: &[u8]) -> Vec<Vec<u8>> {
    let mut messages: Vec<Vec<u8>> = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut in_message = false;
    let mut prev_blank = true;

    for line in split_lines(raw) {
        if prev_blank && line_starts_with(line, b"From ") {
            if in_message {
                messages.push(finish_message(current));
                current = Vec::new();
            }
            in_message = true;
        } else if in_message {
            current.extend_from_slice(unescape_from(line));
        } else {
            // No leading separator: the whole input is one message.
            in_message = true;
            current.extend_from_slice(unescape_from(line));
        }
        prev_blank = is_blank(line);
    }

    if in_message && !current.iter().all(|&b| b == b'\n' || b == b'\r') {
        messages.push(finish_message(current));
    }
    messages
}

/// Iterate lines including their terminators.
fn split_lines(raw: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut rest = raw;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let end = rest
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(rest.len());
        let (line, tail) = rest.split_at(end);
        rest = tail;
        Some(line)
    })
}

fn line_starts_with(line: &[u8], prefix: &[u8]) -> bool {
    line.len() >= prefix.len() && &line[..prefix.len()] == prefix
}

fn is_blank(line: &[u8]) -> bool {
    matches!(line, b"\n" | b"\r\n")
}

/// Undo mboxrd escaping: `>From ` (with any number of leading `>`)
/// loses one `>`.
fn unescape_from(line: &[u8]) -> &[u8] {
    let gt = line.iter().take_while(|&&b| b == b'>').count();
    if gt > 0 && line_starts_with(&line[gt..], b"From ") {
        &line[1..]
    } else {
        line
    }
}

fn finish_message(mut msg: Vec<u8>) -> Vec<u8> {
    // Drop the blank separator line preceding the next `From `.
    while msg.ends_with(b"\r\n") {
        msg.truncate(msg.len() - 2);
    }
    while msg.ends_with(b"\n") {
        msg.truncate(msg.len() - 1);
    }
    msg.push(b'\n');
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"From alice@example.org Mon Jan  5 10:00:00 2026\n\
Subject: first\n\
\n\
hello\n\
\n\
From bob@example.org Mon Jan  5 11:00:00 2026\n\
Subject: second\n\
\n\
world\n";

    #[test]
    fn test_two_messages() {
        let messages = split_mbox(SAMPLE);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], b"Subject: first\n\nhello\n");
        assert_eq!(messages[1], b"Subject: second\n\nworld\n");
    }

    #[test]
    fn test_from_inside_body_is_not_a_separator() {
        let raw = b"From a@b Mon Jan  5 10:00:00 2026\n\
Subject: x\n\
\n\
line one\n\
From the body, not a separator? No: preceded by text line.\n";
        // "From " here follows a non-blank line, so it stays in the body.
        let raw2 = b"From a@b Mon Jan  5 10:00:00 2026\nSubject: x\n\nbody\nFrom here\n";
        assert_eq!(split_mbox(raw).len(), 1);
        assert_eq!(split_mbox(raw2).len(), 1);
    }

    #[test]
    fn test_mboxrd_unescaping() {
        let raw = b"From a@b Mon Jan  5 10:00:00 2026\n\
Subject: x\n\
\n\
>From quoted\n\
>>From doubly quoted\n";
        let messages = split_mbox(raw);
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0],
            b"Subject: x\n\nFrom quoted\n>From doubly quoted\n"
        );
    }

    #[test]
    fn test_headerless_input_is_single_message() {
        let messages = split_mbox(b"Subject: solo\n\nbody\n");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0], b"Subject: solo\n\nbody\n");
    }

    #[test]
    fn test_empty_input() {
        assert!(split_mbox(b"").is_empty());
    }
}
