use agent_debug_stream::{DebugEvent, Emission};

const SUMMARY_WIDTH: usize = 120;

/// Turns emissions into stdout lines.
#[derive(Clone, Copy, Debug, Default)]
pub struct Printer {
    json: bool,
}

impl Printer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// `--json` prints the wire form. Otherwise text is printed as-is and
    /// debug events as one-line summaries.
    pub fn render(&self, emission: &Emission) -> anyhow::Result<String> {
        if self.json {
            return Ok(emission.to_wire()?);
        }
        Ok(match emission {
            Emission::Text(text) => text.clone(),
            Emission::Debug(event) => summarize(event),
        })
    }
}

fn summarize(event: &DebugEvent) -> String {
    let mut line = format!("[{}]", event.kind);
    let label = event
        .name
        .as_deref()
        .or(event.node_name.as_deref())
        .or_else(|| event.next.as_ref().and_then(|next| next.as_str()));
    if let Some(label) = label {
        line.push(' ');
        line.push_str(label);
    }
    let detail = event
        .content
        .as_deref()
        .or(event.tool_output.as_deref())
        .filter(|text| !text.is_empty());
    if let Some(detail) = detail {
        line.push_str(": ");
        line.push_str(&truncate(&detail.replace('\n', " "), SUMMARY_WIDTH));
    }
    line
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use agent_debug_stream::DebugEventKind;

    use super::*;

    #[test]
    fn text_is_printed_verbatim() {
        let printer = Printer::new(false);
        let line = printer.render(&Emission::Text("step done".into())).expect("render");
        assert_eq!(line, "step done");
    }

    #[test]
    fn debug_event_summary_names_kind_label_and_content() {
        let mut event = DebugEvent::new(DebugEventKind::ToolResult).with_content("two\nlines");
        event.name = Some("search".into());
        let line = Printer::new(false)
            .render(&Emission::Debug(event))
            .expect("render");
        assert_eq!(line, "[tool_result] search: two lines");
    }

    #[test]
    fn long_content_is_cut_on_a_char_boundary() {
        let text = "é".repeat(SUMMARY_WIDTH + 5);
        let cut = truncate(&text, SUMMARY_WIDTH);
        assert_eq!(cut.chars().count(), SUMMARY_WIDTH + 3);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn json_mode_prints_wire_envelope() {
        let event = DebugEvent::new(DebugEventKind::Ai).with_content("hi");
        let line = Printer::new(true)
            .render(&Emission::Debug(event))
            .expect("render");
        let value: serde_json::Value = serde_json::from_str(&line).expect("json");
        assert_eq!(value["type"], "debug_data");
        assert_eq!(value["data"]["content"], "hi");
    }
}
