/// Marker that starts a labeled event line.
pub const EVENT_PREFIX: &str = "data:";
/// Labeled payload that ends the stream gracefully.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Wire format of one complete, non-blank line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `data: <payload>`.
    Labeled(&'a str),
    /// A bare JSON value (starts with `{` or `[`).
    Structured(&'a str),
    /// Anything else.
    PlainText(&'a str),
    /// `data: [DONE]`.
    Done,
}

/// Classifies a raw line. Returns `None` for blank lines, which carry no event.
///
/// Surrounding whitespace (including the `\r` of CRLF streams) is trimmed
/// before the prefix checks.
pub fn classify_line(line: &str) -> Option<LineKind<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(rest) = line.strip_prefix(EVENT_PREFIX) {
        // SSE allows `data:` without the space; the admin server always sends
        // `data: `, so `data:foo` is taken as the payload `foo`, not as text.
        let payload = rest.strip_prefix(' ').unwrap_or(rest);
        if payload.trim() == DONE_SENTINEL {
            return Some(LineKind::Done);
        }
        return Some(LineKind::Labeled(payload));
    }
    if looks_structured(line) {
        return Some(LineKind::Structured(line));
    }
    Some(LineKind::PlainText(line))
}

pub(crate) fn looks_structured(text: &str) -> bool {
    text.starts_with('{') || text.starts_with('[')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_discarded() {
        assert_eq!(classify_line(""), None);
        assert_eq!(classify_line("   \r"), None);
    }

    #[test]
    fn labeled_prefix_takes_priority() {
        assert_eq!(
            classify_line("data: {\"type\":\"ai\"}"),
            Some(LineKind::Labeled("{\"type\":\"ai\"}"))
        );
        assert_eq!(classify_line("data:hello"), Some(LineKind::Labeled("hello")));
        assert_eq!(classify_line("data:  two"), Some(LineKind::Labeled(" two")));
    }

    #[test]
    fn done_sentinel_is_terminal() {
        assert_eq!(classify_line("data: [DONE]"), Some(LineKind::Done));
        assert_eq!(classify_line("data: [DONE]\r"), Some(LineKind::Done));
        assert_eq!(classify_line("data:[DONE]"), Some(LineKind::Done));
        assert_eq!(classify_line("[DONE]"), Some(LineKind::Structured("[DONE]")));
    }

    #[test]
    fn bare_json_and_plain_text() {
        assert_eq!(
            classify_line("{\"content\":\"x\"}\r"),
            Some(LineKind::Structured("{\"content\":\"x\"}"))
        );
        assert_eq!(classify_line("[1,2]"), Some(LineKind::Structured("[1,2]")));
        assert_eq!(
            classify_line("not json at all"),
            Some(LineKind::PlainText("not json at all"))
        );
        assert_eq!(
            classify_line(": keep-alive"),
            Some(LineKind::PlainText(": keep-alive"))
        );
    }
}
