use crate::classify::{LineKind, looks_structured};
use crate::event::{DebugEvent, DebugEventKind, Emission};

/// Result of normalizing one classified line.
#[derive(Clone, Debug, PartialEq)]
pub enum Normalized {
    /// Deliver this emission to the sink.
    Emit(Emission),
    /// The payload parsed but carried neither a known kind nor content.
    Empty,
    /// The payload looked structured but could not be decoded.
    Malformed { reason: String },
}

/// Maps a classified payload to the canonical emission.
///
/// `Done` never reaches this function in practice; it normalizes to `Empty`.
pub fn normalize(line: LineKind<'_>) -> Normalized {
    match line {
        LineKind::Labeled(payload) => match serde_json::from_str(payload) {
            Ok(value) => normalize_value(value),
            Err(err) if looks_structured(payload.trim_start()) => Normalized::Malformed {
                reason: err.to_string(),
            },
            Err(_) => Normalized::Emit(Emission::Text(payload.to_owned())),
        },
        LineKind::Structured(payload) => match serde_json::from_str(payload) {
            Ok(value) => normalize_value(value),
            Err(_) => Normalized::Emit(Emission::Text(payload.to_owned())),
        },
        LineKind::PlainText(payload) => Normalized::Emit(Emission::Text(payload.to_owned())),
        LineKind::Done => Normalized::Empty,
    }
}

/// Normalizes an already-parsed JSON payload.
pub fn normalize_value(value: serde_json::Value) -> Normalized {
    let object = match value {
        serde_json::Value::Object(object) => object,
        serde_json::Value::String(text) if !text.is_empty() => {
            return Normalized::Emit(Emission::Text(text));
        }
        _ => return Normalized::Empty,
    };

    let kind = object
        .get("type")
        .and_then(|v| v.as_str())
        .and_then(DebugEventKind::from_wire);
    if let Some(kind) = kind {
        return Normalized::Emit(Emission::Debug(DebugEvent::from_object(kind, object)));
    }

    match object.get("content").and_then(truthy_text) {
        Some(text) => Normalized::Emit(Emission::Text(text)),
        None => Normalized::Empty,
    }
}

fn truthy_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) if !text.is_empty() => Some(text.clone()),
        serde_json::Value::Number(number) if number.as_f64() != Some(0.0) => {
            Some(number.to_string())
        }
        serde_json::Value::Bool(true) => Some("true".to_string()),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Some(value.to_string()),
        _ => None,
    }
}
