use std::sync::OnceLock;

use chrono::TimeDelta;
use regex::Regex;
use serde::Serialize;

use super::config::ProtocolConfig;
use super::message::Message;
use super::selection::EntryToggle;

pub const WIZARD_DISPLAY_NAME: &str = "AI Assistant";
pub const PRIVATE_NOTE: &str = " (Only visible to you)";

fn camel_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid camel-case regex"))
}

/// `"WalkingInstructions"` -> `"Walking Instructions"`.
pub fn split_camel_case(key: &str) -> String {
    camel_boundary().replace_all(key, "$1 $2").into_owned()
}

pub fn sender_label<'a>(sender: &'a str, protocol: &ProtocolConfig) -> &'a str {
    if sender == protocol.agent_ids.wizard_id {
        WIZARD_DISPLAY_NAME
    } else {
        sender
    }
}

/// Knowledge base and system messages are only rendered to the wizard side.
pub fn is_private_to_viewer(message: &Message, protocol: &ProtocolConfig) -> bool {
    message.sent_by(&protocol.agent_ids.knowledgebase_id)
        || message.sent_by(&protocol.agent_ids.system_id)
}

pub fn format_duration(millis: u64) -> String {
    let Some(delta) = i64::try_from(millis)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
    else {
        return String::new();
    };
    let minutes = delta.num_minutes();
    let seconds = delta.num_seconds() % 60;

    let mut parts = Vec::new();
    if minutes > 0 {
        parts.push(format!("{minutes} min"));
    }
    if seconds > 0 {
        parts.push(format!("{seconds} sec"));
    }
    parts.join(" ")
}

pub fn match_summary(match_count: Option<&str>) -> Option<String> {
    let count: i64 = match_count?.parse().ok()?;
    if count > 1 {
        Some(format!("This and {} matches exist:", count - 1))
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleOption {
    pub value: EntryToggle,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

/// The three-way toggle under a knowledge base reply. `not selected` is
/// never clickable; an entry leaves the selection when another takes over.
pub fn toggle_options(current: EntryToggle) -> [ToggleOption; 3] {
    let selected = current == EntryToggle::Selected;
    [
        ToggleOption {
            value: EntryToggle::Selected,
            enabled: true,
            hint: None,
        },
        ToggleOption {
            value: EntryToggle::CompareTo,
            enabled: !selected,
            hint: selected.then_some("Cannot compare to this message because it's already selected."),
        },
        ToggleOption {
            value: EntryToggle::NotSelected,
            enabled: false,
            hint: Some("Deselect this entry by selecting another knowledge base item."),
        },
    ]
}
