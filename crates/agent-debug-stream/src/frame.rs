//! Chunk-to-line framing.
//!
//! Bytes arrive with no boundary semantics. [`LineSplitter`] decodes them as
//! UTF-8 across chunk boundaries and hands back only complete lines.

/// Stateful UTF-8 decoder that holds back an incomplete trailing sequence
/// until the next chunk completes it.
#[derive(Debug, Default)]
pub(crate) struct Utf8Stream {
    pending: Vec<u8>,
}

impl Utf8Stream {
    /// Decodes `chunk` and appends the text to `out`. Invalid sequences are
    /// replaced with U+FFFD.
    pub fn decode(&mut self, chunk: &[u8], out: &mut String) {
        self.pending.extend_from_slice(chunk);
        let mut consumed = 0;
        while consumed < self.pending.len() {
            match std::str::from_utf8(&self.pending[consumed..]) {
                Ok(text) => {
                    out.push_str(text);
                    consumed = self.pending.len();
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(
                        &self.pending[consumed..consumed + valid],
                    ));
                    consumed += valid;
                    match err.error_len() {
                        Some(invalid) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            consumed += invalid;
                        }
                        // Truncated sequence at the end: wait for more bytes.
                        None => break,
                    }
                }
            }
        }
        self.pending.drain(..consumed);
    }

    /// Flushes a truncated trailing sequence as U+FFFD.
    pub fn finish(&mut self, out: &mut String) {
        if !self.pending.is_empty() {
            out.push(char::REPLACEMENT_CHARACTER);
            self.pending.clear();
        }
    }
}

/// Accumulates chunks and splits them on `\n`.
///
/// Between calls the buffer holds exactly the received text that is not yet
/// part of a complete line.
#[derive(Debug, Default)]
pub struct LineSplitter {
    utf8: Utf8Stream,
    buffer: String,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every line it completed, in order.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        // Text before `start` was already searched and holds no newline.
        let start = self.buffer.len();
        self.utf8.decode(chunk, &mut self.buffer);
        let Some(last_newline) = self.buffer[start..].rfind('\n').map(|at| start + at) else {
            return Vec::new();
        };
        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);
        complete[..last_newline]
            .split('\n')
            .map(str::to_owned)
            .collect()
    }

    /// Ends the stream, returning the unterminated final line if there is one.
    pub fn finish(&mut self) -> Option<String> {
        self.utf8.finish(&mut self.buffer);
        let rest = std::mem::take(&mut self.buffer);
        (!rest.is_empty()).then_some(rest)
    }

    /// Text received but not yet part of a complete line.
    pub fn remainder(&self) -> &str {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_without_newline_yields_no_lines() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push_chunk(b"data: {\"type\"").is_empty());
        assert_eq!(splitter.remainder(), "data: {\"type\"");
    }

    #[test]
    fn one_chunk_may_hold_many_lines_and_a_partial_tail() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push_chunk(b"a\nb\n\nc");
        assert_eq!(lines, vec!["a", "b", ""]);
        assert_eq!(splitter.remainder(), "c");

        let lines = splitter.push_chunk(b"d\n");
        assert_eq!(lines, vec!["cd"]);
        assert_eq!(splitter.remainder(), "");
    }

    #[test]
    fn long_line_in_small_chunks_completes_once() {
        let mut splitter = LineSplitter::new();
        let output = "x".repeat(5000);
        let payload = format!("data: {{\"type\":\"node\",\"output\":\"{output}\"}}");
        let mut lines = Vec::new();
        for piece in payload.as_bytes().chunks(7) {
            lines.extend(splitter.push_chunk(piece));
        }
        assert!(lines.is_empty());
        assert_eq!(splitter.remainder().len(), payload.len());

        lines.extend(splitter.push_chunk(b"\nnext"));
        assert_eq!(lines, vec![payload]);
        assert_eq!(splitter.remainder(), "next");
    }

    #[test]
    fn newline_at_chunk_start_closes_buffered_line() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push_chunk(b"abc").is_empty());
        assert_eq!(splitter.push_chunk(b"\n\nd"), vec!["abc", ""]);
        assert_eq!(splitter.remainder(), "d");
    }

    #[test]
    fn multibyte_character_split_across_chunks_is_preserved() {
        let text = "héllo 世界\n".as_bytes();
        for offset in 0..text.len() {
            let mut splitter = LineSplitter::new();
            let mut lines = splitter.push_chunk(&text[..offset]);
            lines.extend(splitter.push_chunk(&text[offset..]));
            assert_eq!(lines, vec!["héllo 世界"], "split at byte {offset}");
        }
    }

    #[test]
    fn invalid_bytes_become_replacement_characters() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push_chunk(b"ok\xff\xfeok\n");
        assert_eq!(lines, vec!["ok\u{FFFD}\u{FFFD}ok"]);
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push_chunk(b"tail without newline").is_empty());
        assert_eq!(splitter.finish().as_deref(), Some("tail without newline"));
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn finish_replaces_truncated_sequence() {
        let mut splitter = LineSplitter::new();
        let euro = "€".as_bytes();
        assert!(splitter.push_chunk(&euro[..2]).is_empty());
        assert_eq!(splitter.finish().as_deref(), Some("\u{FFFD}"));
    }
}
