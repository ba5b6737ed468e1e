use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Map;
use serde_json::Value;

pub const EXAMPLE_MARKER: &str = "Example: ";
pub const INTERNAL_FIELD: &str = "api_name";

const MATCH_COUNT_PATTERN: &str = r"Found ([0-9\-]+)";

// Always rendered as a numbered list, whatever its length.
const ALWAYS_LISTED_FIELDS: &[&str] = &["Walking Instructions"];

static MATCH_COUNT: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("no `Example: ` marker in message")]
    MissingMarker,
    #[error("example is not valid json: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("example is json but not an object")]
    NotAnObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::List(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadField {
    pub name: String,
    pub value: FieldValue,
}

/// Structured view of a knowledge base reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedPayload {
    /// In the order the knowledge base sent them.
    pub fields: Vec<PayloadField>,
    /// Raw capture of `Found <N>`; may be a range such as `3-5`.
    pub match_count: Option<String>,
    /// The JSON text that parsed, echoed back when the wizard selects the entry.
    pub example: String,
}

impl DecodedPayload {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }
}

/// Soft variant of [`decode_strict`]: plain text yields `None` silently, a
/// broken example yields `None` and a warning so the caller shows raw text.
pub fn decode(text: &str) -> Option<DecodedPayload> {
    match decode_strict(text) {
        Ok(payload) => Some(payload),
        Err(PayloadError::MissingMarker) => None,
        Err(err) => {
            tracing::warn!(error = %err, "failed to parse knowledge base example");
            None
        }
    }
}

pub fn decode_strict(text: &str) -> Result<DecodedPayload, PayloadError> {
    let Some(position) = text.find(EXAMPLE_MARKER) else {
        return Err(PayloadError::MissingMarker);
    };
    let remainder = &text[position + EXAMPLE_MARKER.len()..];
    let (example, object) = parse_example(remainder)?;

    let fields = object
        .into_iter()
        .filter(|(name, _)| name != INTERNAL_FIELD)
        .map(|(name, value)| {
            let value = field_value(name.as_str(), value);
            PayloadField { name, value }
        })
        .collect();

    Ok(DecodedPayload {
        fields,
        match_count: match_count(text),
        example,
    })
}

pub fn match_count(text: &str) -> Option<String> {
    MATCH_COUNT
        .get_or_init(|| Regex::new(MATCH_COUNT_PATTERN).expect("match count pattern compiles"))
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|group| group.as_str().to_string())
}

// The backend appends one character after the object (`... Example: {...}.`).
// Strip it first; fall back to the untouched remainder for senders that omit it.
fn parse_example(remainder: &str) -> Result<(String, Map<String, Value>), PayloadError> {
    let stripped = match remainder.char_indices().last() {
        Some((last, _)) => &remainder[..last],
        None => remainder,
    };

    let mut first_error = None;
    for candidate in [stripped, remainder] {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(object)) => return Ok((candidate.to_string(), object)),
            Ok(_) => return Err(PayloadError::NotAnObject),
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(PayloadError::Malformed(err)),
        None => Err(PayloadError::NotAnObject),
    }
}

fn field_value(name: &str, value: Value) -> FieldValue {
    match value {
        Value::Array(items) if items.len() > 2 || ALWAYS_LISTED_FIELDS.contains(&name) => {
            FieldValue::List(
                items
                    .iter()
                    .map(|item| scalar_text(item).trim().to_string())
                    .collect(),
            )
        }
        Value::Array(items) => FieldValue::Text(
            items
                .iter()
                .map(scalar_text)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => FieldValue::Text(scalar_text(&other)),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Number(number) => number.to_string(),
        nested => nested.to_string(),
    }
}
