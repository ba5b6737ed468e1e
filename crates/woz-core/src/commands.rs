use serde::{Deserialize, Serialize};
use serde_json::Map;
use serde_json::Value;

use super::config::ProtocolConfig;
use super::selection::EntryToggle;
use super::selection::ENTRY_DELIMITER;

pub const DISCONNECT_TEXT: &str = "[DISCONNECT]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAnswer {
    pub key: String,
    pub answer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub field: String,
    pub expression: String,
}

/// Body of a `? ` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Absent in the older bare-array form.
    pub db: Option<String>,
    pub constraints: Vec<Constraint>,
}

/// A worker's control message with its parameters pulled out of `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkerCommand {
    Complete,
    Done {
        answers: Vec<ReviewAnswer>,
    },
    Query {
        raw: String,
        request: Option<QueryRequest>,
    },
    Disconnect,
    Select {
        message_id: String,
        example: String,
    },
    SelectReference {
        message_id: String,
        example: String,
    },
    RequestSuggestions {
        text: String,
    },
    PickSuggestion {
        text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    Primary,
    Reference,
}

/// `None` means the text is an ordinary utterance.
pub fn parse_worker_command(text: &str, protocol: &ProtocolConfig) -> Option<WorkerCommand> {
    let prefixes = &protocol.front_to_back;

    if text.starts_with(prefixes.complete_prefix.as_str()) {
        return Some(WorkerCommand::Complete);
    }
    if let Some(rest) = text.strip_prefix(prefixes.done_prefix.as_str()) {
        return Some(WorkerCommand::Done {
            answers: parse_done_answers(rest.trim()),
        });
    }
    if let Some(rest) = text.strip_prefix(prefixes.query_prefix.as_str()) {
        let raw = rest.trim().to_string();
        let request = parse_query(&raw);
        return Some(WorkerCommand::Query { raw, request });
    }
    if text == DISCONNECT_TEXT {
        return Some(WorkerCommand::Disconnect);
    }
    if let Some(rest) = text.strip_prefix(prefixes.select_kb_entry_prefix.as_str()) {
        let (message_id, example) = split_entry(rest)?;
        return Some(WorkerCommand::Select {
            message_id,
            example,
        });
    }
    if let Some(rest) = text.strip_prefix(prefixes.select_reference_kb_entry_prefix.as_str()) {
        let (message_id, example) = split_entry(rest)?;
        return Some(WorkerCommand::SelectReference {
            message_id,
            example,
        });
    }
    if let Some(rest) = text.strip_prefix(prefixes.request_suggestions_prefix.as_str()) {
        return Some(WorkerCommand::RequestSuggestions {
            text: rest.trim().to_string(),
        });
    }
    if let Some(rest) = text.strip_prefix(prefixes.pick_suggestion_prefix.as_str()) {
        return Some(WorkerCommand::PickSuggestion {
            text: rest.trim().to_string(),
        });
    }
    None
}

fn split_entry(rest: &str) -> Option<(String, String)> {
    let Some((message_id, example)) = rest.split_once(ENTRY_DELIMITER) else {
        tracing::debug!(text = rest, "selection command without delimiter");
        return None;
    };
    let message_id = message_id.trim();
    if message_id.is_empty() {
        return None;
    }
    Some((message_id.to_string(), example.trim().to_string()))
}

pub fn parse_done_answers(params: &str) -> Vec<ReviewAnswer> {
    if params.is_empty() {
        return Vec::new();
    }
    let object = match serde_json::from_str::<Map<String, Value>>(params) {
        Ok(object) => object,
        Err(err) => {
            tracing::warn!(error = %err, "unparseable review answers");
            return Vec::new();
        }
    };
    object
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Bool(answer) => Some(ReviewAnswer { key, answer }),
            other => {
                tracing::debug!(key = %key, value = %other, "skipping non-boolean review answer");
                None
            }
        })
        .collect()
}

pub fn parse_query(params: &str) -> Option<QueryRequest> {
    let value = match serde_json::from_str::<Value>(params) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "unparseable query");
            return None;
        }
    };
    match value {
        Value::Object(mut object) => {
            let db = match object.remove("db") {
                Some(Value::String(db)) => Some(db),
                _ => None,
            };
            let constraints = match object.remove("constraints") {
                Some(Value::Array(items)) => constraints_from(items),
                _ => Vec::new(),
            };
            Some(QueryRequest { db, constraints })
        }
        Value::Array(items) => Some(QueryRequest {
            db: None,
            constraints: constraints_from(items),
        }),
        _ => None,
    }
}

fn constraints_from(items: Vec<Value>) -> Vec<Constraint> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(object) => Some(object),
            _ => None,
        })
        .flat_map(|object| object.into_iter())
        .map(|(field, expression)| Constraint {
            field,
            expression: match expression {
                Value::String(text) => text,
                other => other.to_string(),
            },
        })
        .collect()
}

/// Candidate replies carried by a `supply_suggestions[...]` command. The
/// backend writes the list as a Python literal, so single-quoted strings are
/// accepted too.
pub fn parse_suggestions(command: &str, protocol: &ProtocolConfig) -> Vec<String> {
    let Some(literal) = command.strip_prefix(protocol.back_to_front.command_supply_suggestions.as_str())
    else {
        return Vec::new();
    };
    if let Ok(items) = serde_json::from_str::<Vec<String>>(literal) {
        return items;
    }
    match parse_string_list_literal(literal) {
        Some(items) => items,
        None => {
            tracing::warn!(command = %command, "unparseable suggestion list");
            Vec::new()
        }
    }
}

fn parse_string_list_literal(raw: &str) -> Option<Vec<String>> {
    let inner = raw.trim().strip_prefix('[')?.strip_suffix(']')?;
    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let quote = match chars.next() {
            None => break,
            Some(quote @ ('\'' | '"')) => quote,
            Some(_) => return None,
        };
        let mut item = String::new();
        loop {
            match chars.next()? {
                '\\' => item.push(match chars.next()? {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                }),
                c if c == quote => break,
                c => item.push(c),
            }
        }
        items.push(item);
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => break,
            Some(',') => {}
            Some(_) => return None,
        }
    }
    Some(items)
}

pub fn encode_complete(protocol: &ProtocolConfig) -> String {
    protocol.front_to_back.complete_prefix.clone()
}

pub fn encode_done(answers: &[ReviewAnswer], protocol: &ProtocolConfig) -> String {
    let object: Map<String, Value> = answers
        .iter()
        .map(|answer| (answer.key.clone(), Value::Bool(answer.answer)))
        .collect();
    format!(
        "{} {}",
        protocol.front_to_back.done_prefix,
        Value::Object(object)
    )
}

pub fn encode_selection(
    kind: SelectionKind,
    message_id: &str,
    example: &str,
    protocol: &ProtocolConfig,
) -> String {
    let prefix = match kind {
        SelectionKind::Primary => &protocol.front_to_back.select_kb_entry_prefix,
        SelectionKind::Reference => &protocol.front_to_back.select_reference_kb_entry_prefix,
    };
    format!("{prefix} {message_id}{ENTRY_DELIMITER}{example}")
}

/// Message to send when the wizard flips an entry's toggle. The
/// `not selected` position is display-only.
pub fn selection_request(
    choice: EntryToggle,
    message_id: &str,
    example: &str,
    protocol: &ProtocolConfig,
) -> Option<String> {
    let kind = match choice {
        EntryToggle::Selected => SelectionKind::Primary,
        EntryToggle::CompareTo => SelectionKind::Reference,
        EntryToggle::NotSelected => return None,
    };
    Some(encode_selection(kind, message_id, example, protocol))
}

pub fn encode_request_suggestions(text: &str, protocol: &ProtocolConfig) -> String {
    format!("{}{text}", protocol.front_to_back.request_suggestions_prefix)
}

pub fn encode_pick_suggestion(text: &str, protocol: &ProtocolConfig) -> String {
    format!("{}{text}", protocol.front_to_back.pick_suggestion_prefix)
}
