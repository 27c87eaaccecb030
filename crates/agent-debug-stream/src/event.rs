use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Closed vocabulary of debug event kinds produced by agent and workflow runs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugEventKind {
    /// Model token output.
    Ai,
    /// The agent selected a tool.
    ToolChoose,
    /// Tool parameters await confirmation.
    ParamsConfirm,
    /// A tool returned its output.
    ToolResult,
    /// Hand-off to another sub-agent.
    TransferTo,
    /// Workflow node transition.
    Node,
    /// Final answer of a workflow.
    WorkflowAnswer,
    /// Execution error reported by the run itself.
    Error,
    /// Planner output.
    Plan,
    /// Actor output.
    Act,
}

impl DebugEventKind {
    /// Every recognized kind, in wire-vocabulary order.
    pub const ALL: [DebugEventKind; 10] = [
        Self::Ai,
        Self::ToolChoose,
        Self::ParamsConfirm,
        Self::ToolResult,
        Self::TransferTo,
        Self::Node,
        Self::WorkflowAnswer,
        Self::Error,
        Self::Plan,
        Self::Act,
    ];

    /// Wire name of the kind (the `type` field value).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::ToolChoose => "tool_choose",
            Self::ParamsConfirm => "params_confirm",
            Self::ToolResult => "tool_result",
            Self::TransferTo => "transfer_to",
            Self::Node => "node",
            Self::WorkflowAnswer => "workflow_answer",
            Self::Error => "error",
            Self::Plan => "plan",
            Self::Act => "act",
        }
    }

    /// Looks up a kind by its wire name.
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for DebugEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correlation ids attached to an event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugMetadata {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub thread_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub transaction_id: Option<String>,
    /// Any further metadata keys, kept as sent.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One structured occurrence in an agent or workflow execution trace.
///
/// Fields the decoder does not model are kept in `extra`, so serializing an
/// event gives back every key the server sent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DebugEvent {
    #[serde(rename = "type")]
    pub kind: DebugEventKind,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imgdata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<serde_json::Value>>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub tool_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<serde_json::Value>,

    // Workflow node fields.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub node_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub node_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub node_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DebugMetadata>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DebugEvent {
    /// Creates an event of the given kind with every optional field unset.
    pub fn new(kind: DebugEventKind) -> Self {
        Self {
            kind,
            id: None,
            name: None,
            content: None,
            imgdata: None,
            tool_calls: None,
            tool_output: None,
            documents: None,
            next: None,
            node_id: None,
            node_name: None,
            node_type: None,
            start_time: None,
            end_time: None,
            input: None,
            output: None,
            metadata: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Builds an event from a parsed payload already known to be of `kind`.
    ///
    /// Never fails. A modeled field whose value has an unexpected shape (an
    /// object `tool_output`, a boolean `content`, ...) is not typed; it stays
    /// in `extra` under its own key, so re-serializing gives back the payload.
    pub fn from_object(
        kind: DebugEventKind,
        mut object: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        let misfit_keys: Vec<String> = object
            .iter()
            .filter(|(key, value)| !field_fits(key, value))
            .map(|(key, _)| key.clone())
            .collect();
        let mut misfits = serde_json::Map::new();
        for key in misfit_keys {
            if let Some(value) = object.remove(&key) {
                misfits.insert(key, value);
            }
        }
        object.insert(
            "type".to_string(),
            serde_json::Value::String(kind.as_str().to_string()),
        );

        let value = serde_json::Value::Object(object);
        let mut event = match Self::deserialize(&value) {
            Ok(event) => event,
            Err(_) => {
                let mut event = Self::new(kind);
                if let serde_json::Value::Object(mut rest) = value {
                    rest.remove("type");
                    event.extra = rest;
                }
                event
            }
        };
        event.extra.extend(misfits);
        event
    }

    /// Sets the text content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Thread id from the correlation metadata, if present.
    pub fn thread_id(&self) -> Option<&str> {
        self.metadata.as_ref()?.thread_id.as_deref()
    }

    /// Transaction id from the correlation metadata, if present.
    pub fn transaction_id(&self) -> Option<&str> {
        self.metadata.as_ref()?.transaction_id.as_deref()
    }
}

/// One decoded output item, delivered to the sink in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub enum Emission {
    /// A recognized debug event.
    Debug(DebugEvent),
    /// Free text (plain lines, or `content` of an unrecognized payload).
    Text(String),
}

#[derive(Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
enum WireEnvelope<'a> {
    DebugData(&'a DebugEvent),
}

impl Emission {
    /// Renders the emission the way UI consumers expect it: debug events as
    /// `{"type":"debug_data","data":{...}}`, text as-is.
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Debug(event) => serde_json::to_string(&WireEnvelope::DebugData(event)),
            Self::Text(text) => Ok(text.clone()),
        }
    }

    /// Returns the debug event, if this is one.
    pub fn as_debug(&self) -> Option<&DebugEvent> {
        match self {
            Self::Debug(event) => Some(event),
            Self::Text(_) => None,
        }
    }

    /// Returns the text, if this is a text emission.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Debug(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

/// Whether `value` can be typed as the modeled field `key`. Unmodeled keys
/// always fit, they land in `extra` anyway.
fn field_fits(key: &str, value: &serde_json::Value) -> bool {
    match key {
        "id" | "name" | "content" | "tool_output" | "node_id" | "node_name" | "node_type"
        | "start_time" | "end_time" => is_scalar_text(value),
        "tool_calls" => value.is_null() || value.is_array(),
        "metadata" => match value {
            serde_json::Value::Null => true,
            serde_json::Value::Object(meta) => ["thread_id", "transaction_id"]
                .iter()
                .all(|id| meta.get(*id).is_none_or(is_scalar_text)),
            _ => false,
        },
        _ => true,
    }
}

fn is_scalar_text(value: &serde_json::Value) -> bool {
    matches!(
        value,
        serde_json::Value::Null | serde_json::Value::String(_) | serde_json::Value::Number(_)
    )
}

/// Accepts strings and numbers; servers are not consistent about id types.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(value)) => Ok(Some(value)),
        Some(serde_json::Value::Number(value)) => Ok(Some(value.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_wire_names_round_trip_through_serde() {
        for kind in DebugEventKind::ALL {
            let json = serde_json::to_string(&kind).expect("serialize kind");
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(DebugEventKind::from_wire(kind.as_str()), Some(kind));
        }
        assert_eq!(DebugEventKind::from_wire("message"), None);
    }

    #[test]
    fn node_event_keeps_workflow_fields_and_unknown_keys() {
        let event: DebugEvent = serde_json::from_value(serde_json::json!({
            "type": "node",
            "node_id": "n-1",
            "node_name": "Retrieve",
            "node_type": "rag",
            "start_time": "2024-05-01T10:00:00Z",
            "end_time": "2024-05-01T10:00:02Z",
            "input": {"query": "q"},
            "output": ["doc"],
            "metadata": {"thread_id": "t-1", "transaction_id": 42, "span": "s"},
            "latency_ms": 2000
        }))
        .expect("node event");

        assert_eq!(event.kind, DebugEventKind::Node);
        assert_eq!(event.node_name.as_deref(), Some("Retrieve"));
        assert_eq!(event.thread_id(), Some("t-1"));
        assert_eq!(event.transaction_id(), Some("42"));
        assert_eq!(
            event.extra.get("latency_ms"),
            Some(&serde_json::json!(2000))
        );

        let back = serde_json::to_value(&event).expect("serialize");
        assert_eq!(back["latency_ms"], serde_json::json!(2000));
        assert_eq!(back["metadata"]["span"], serde_json::json!("s"));
    }

    #[test]
    fn null_content_is_absent() {
        let event: DebugEvent = serde_json::from_str(
            r#"{"type":"tool_choose","id":7,"content":null,"tool_calls":[{"name":"search"}]}"#,
        )
        .expect("tool event");
        assert_eq!(event.id.as_deref(), Some("7"));
        assert_eq!(event.content, None);
        assert_eq!(event.tool_calls.map(|calls| calls.len()), Some(1));
    }

    #[test]
    fn unexpected_field_shapes_are_kept_in_extra() {
        let payload = serde_json::json!({
            "type": "tool_result",
            "name": "sql",
            "content": true,
            "tool_output": {"rows": 3},
            "tool_calls": {"id": "c1"},
            "metadata": {"thread_id": ["t"]},
            "node_id": 12
        });
        let serde_json::Value::Object(object) = payload.clone() else {
            panic!("object payload");
        };
        let event = DebugEvent::from_object(DebugEventKind::ToolResult, object);

        assert_eq!(event.kind, DebugEventKind::ToolResult);
        assert_eq!(event.name.as_deref(), Some("sql"));
        assert_eq!(event.node_id.as_deref(), Some("12"));
        assert_eq!(event.content, None);
        assert_eq!(event.tool_output, None);
        assert_eq!(event.tool_calls, None);
        assert_eq!(event.metadata, None);
        assert_eq!(event.extra.get("tool_output"), Some(&serde_json::json!({"rows": 3})));

        let mut back = serde_json::to_value(&event).expect("serialize");
        back["node_id"] = serde_json::json!(12);
        assert_eq!(back, payload);
    }

    #[test]
    fn well_formed_object_matches_plain_deserialize() {
        let payload = serde_json::json!({
            "type": "ai",
            "id": "m-1",
            "content": "hello",
            "metadata": {"thread_id": "t-1"},
            "score": 0.5
        });
        let serde_json::Value::Object(object) = payload.clone() else {
            panic!("object payload");
        };
        let built = DebugEvent::from_object(DebugEventKind::Ai, object);
        let parsed: DebugEvent = serde_json::from_value(payload).expect("parse");
        assert_eq!(built, parsed);
    }

    #[test]
    fn debug_emission_wire_form_is_tagged_envelope() {
        let emission = Emission::Debug(DebugEvent::new(DebugEventKind::Ai).with_content("hi"));
        let wire = emission.to_wire().expect("wire");
        let value: serde_json::Value = serde_json::from_str(&wire).expect("json");
        assert_eq!(
            value,
            serde_json::json!({"type": "debug_data", "data": {"type": "ai", "content": "hi"}})
        );
    }

    #[test]
    fn text_emission_wire_form_is_raw() {
        let emission = Emission::Text("{not json".into());
        assert_eq!(emission.to_wire().expect("wire"), "{not json");
        assert_eq!(emission.as_text(), Some("{not json"));
        assert!(emission.as_debug().is_none());
    }
}
