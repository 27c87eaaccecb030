use tracing::{debug, warn};

use crate::classify::{LineKind, classify_line};
use crate::event::Emission;
use crate::frame::LineSplitter;
use crate::normalize::{Normalized, normalize};

/// Counters kept for one decode session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DecodeStats {
    /// Complete lines seen, blank ones included.
    pub lines: u64,
    pub blank_lines: u64,
    pub debug_events: u64,
    pub text_messages: u64,
    /// Payloads that looked structured but failed to decode.
    pub malformed: u64,
    /// Parsed payloads with neither a known kind nor content.
    pub empty: u64,
}

impl DecodeStats {
    /// Total emissions handed to the sink.
    pub fn emissions(&self) -> u64 {
        self.debug_events + self.text_messages
    }
}

/// One step of decoder output.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    Emit(Emission),
    /// The termination sentinel was seen; nothing after it is decoded.
    Terminated,
}

/// Synchronous chunk-in, emissions-out decoder.
///
/// Composes framing, classification, and normalization. The read loop in
/// [`crate::StreamSession`] drives it; tests can drive it directly.
#[derive(Debug, Default)]
pub struct LineDecoder {
    splitter: LineSplitter,
    stats: DecodeStats,
    terminated: bool,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns what it completed, in arrival order.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<Decoded> {
        if self.terminated {
            return Vec::new();
        }
        let lines = self.splitter.push_chunk(chunk);
        self.decode_lines(lines)
    }

    /// Flushes the unterminated final line at end-of-stream.
    pub fn finish(&mut self) -> Vec<Decoded> {
        if self.terminated {
            return Vec::new();
        }
        match self.splitter.finish() {
            Some(rest) => {
                debug!(len = rest.len(), "flushing unterminated final line");
                self.decode_lines(vec![rest])
            }
            None => Vec::new(),
        }
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Whether the termination sentinel has been seen.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn decode_lines(&mut self, lines: Vec<String>) -> Vec<Decoded> {
        let mut out = Vec::with_capacity(lines.len());
        for line in lines {
            self.stats.lines += 1;
            let Some(kind) = classify_line(&line) else {
                self.stats.blank_lines += 1;
                continue;
            };
            if kind == LineKind::Done {
                self.terminated = true;
                out.push(Decoded::Terminated);
                break;
            }
            match normalize(kind) {
                Normalized::Emit(emission) => {
                    match &emission {
                        Emission::Debug(_) => self.stats.debug_events += 1,
                        Emission::Text(_) => self.stats.text_messages += 1,
                    }
                    out.push(Decoded::Emit(emission));
                }
                Normalized::Empty => self.stats.empty += 1,
                Normalized::Malformed { reason } => {
                    self.stats.malformed += 1;
                    warn!(%reason, line = %line.trim(), "dropping malformed stream payload");
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DebugEventKind;

    fn decode_all(chunks: &[&[u8]]) -> (Vec<Decoded>, DecodeStats) {
        let mut decoder = LineDecoder::new();
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(decoder.push_chunk(chunk));
        }
        out.extend(decoder.finish());
        (out, decoder.stats())
    }

    #[test]
    fn token_split_across_chunks_decodes_once() {
        let (out, stats) = decode_all(&[
            b"data: {\"type\":\"ai\",\"content\":\"hel",
            b"lo\"}\n",
            b"data: [DONE]\n",
        ]);
        assert_eq!(out.len(), 2);
        let Decoded::Emit(Emission::Debug(event)) = &out[0] else {
            panic!("expected debug event first");
        };
        assert_eq!(event.kind, DebugEventKind::Ai);
        assert_eq!(event.content.as_deref(), Some("hello"));
        assert_eq!(out[1], Decoded::Terminated);
        assert_eq!(stats.debug_events, 1);
    }

    #[test]
    fn lines_after_sentinel_in_same_chunk_are_ignored() {
        let (out, stats) = decode_all(&[b"a\ndata: [DONE]\nb\nc\n", b"d\n"]);
        assert_eq!(
            out,
            vec![
                Decoded::Emit(Emission::Text("a".into())),
                Decoded::Terminated
            ]
        );
        assert_eq!(stats.lines, 2);
    }

    #[test]
    fn malformed_payload_is_counted_and_skipped() {
        let (out, stats) = decode_all(&[b"data: {bad json\ndata: {\"content\":\"next\"}\n"]);
        assert_eq!(out, vec![Decoded::Emit(Emission::Text("next".into()))]);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.text_messages, 1);
    }

    #[test]
    fn known_kinds_with_loose_field_shapes_are_not_dropped() {
        let (out, stats) = decode_all(&[concat!(
            "data: {\"type\":\"tool_result\",\"name\":\"sql\",\"tool_output\":{\"rows\":3}}\n",
            "data: {\"type\":\"ai\",\"content\":true}\n",
        )
        .as_bytes()]);
        let kinds: Vec<DebugEventKind> = out
            .iter()
            .filter_map(|item| match item {
                Decoded::Emit(Emission::Debug(event)) => Some(event.kind),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![DebugEventKind::ToolResult, DebugEventKind::Ai]);
        assert_eq!(stats.debug_events, 2);
        assert_eq!(stats.malformed, 0);
    }

    #[test]
    fn blank_and_empty_lines_are_counted() {
        let (out, stats) = decode_all(&[b"\n\r\ndata: {\"ping\":true}\n"]);
        assert!(out.is_empty());
        assert_eq!(stats.blank_lines, 2);
        assert_eq!(stats.empty, 1);
        assert_eq!(stats.emissions(), 0);
    }

    #[test]
    fn unterminated_final_line_is_flushed() {
        let (out, _) = decode_all(&[b"first\nsecond"]);
        assert_eq!(
            out,
            vec![
                Decoded::Emit(Emission::Text("first".into())),
                Decoded::Emit(Emission::Text("second".into())),
            ]
        );
    }

    #[test]
    fn every_split_offset_gives_the_same_emissions() {
        let text = "data: {\"type\":\"node\",\"node_name\":\"检索\"}\n{\"content\":\"plain answer\"}\r\nnot json at all\ndata: {bad\ndata: ok\n";
        let bytes = text.as_bytes();
        let (expected, _) = decode_all(&[bytes]);
        assert_eq!(expected.len(), 4);
        for offset in 0..=bytes.len() {
            let (got, _) = decode_all(&[&bytes[..offset], &bytes[offset..]]);
            assert_eq!(got, expected, "split at byte {offset}");
        }
    }

    #[test]
    fn byte_at_a_time_matches_single_chunk() {
        let text = "x\ndata: {\"type\":\"tool_result\",\"tool_output\":\"42\"}\ny\n";
        let bytes = text.as_bytes();
        let (expected, _) = decode_all(&[bytes]);
        let chunks: Vec<&[u8]> = bytes.chunks(1).collect();
        let (got, _) = decode_all(&chunks);
        assert_eq!(got, expected);
    }
}
