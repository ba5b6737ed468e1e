use serde::{Deserialize, Serialize};

use super::classify::classify;
use super::classify::Tag;
use super::commands::encode_request_suggestions;
use super::commands::parse_suggestions;
use super::config::ProtocolConfig;
use super::form::FormDescription;
use super::message::Message;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupInfo {
    pub message_id: String,
    pub task_description: Option<String>,
    pub completion_requirements: Vec<String>,
    pub completion_questions: Vec<String>,
    pub forms: Vec<(String, FormDescription)>,
    pub min_user_turns: u32,
}

impl SetupInfo {
    pub fn api_names(&self) -> Vec<&str> {
        self.forms.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn form(&self, api_name: &str) -> Option<&FormDescription> {
        self.forms
            .iter()
            .find(|(name, _)| name == api_name)
            .map(|(_, form)| form)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SetupView {
    Waiting,
    Ready(SetupInfo),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldState {
    Onboarding,
    Task,
    Review,
}

/// Most recent `setup` command carrying form descriptions.
pub fn latest_setup(messages: &[Message], protocol: &ProtocolConfig) -> SetupView {
    let setup = messages.iter().rev().find(|message| {
        message.command.as_deref() == Some(protocol.back_to_front.command_setup.as_str())
            && message.form_description.is_some()
    });
    let Some(setup) = setup else {
        return SetupView::Waiting;
    };

    let mut forms = Vec::new();
    if let Some(descriptions) = setup.form_description.as_ref() {
        for (api_name, raw) in descriptions {
            match serde_json::from_value::<FormDescription>(raw.clone()) {
                Ok(form) => forms.push((api_name.clone(), form)),
                Err(err) => {
                    tracing::warn!(api_name = %api_name, error = %err, "skipping unreadable form description");
                }
            }
        }
    }

    SetupView::Ready(SetupInfo {
        message_id: setup.message_id.clone(),
        task_description: setup.task_description.clone(),
        completion_requirements: setup.completion_requirements.clone().unwrap_or_default(),
        completion_questions: setup.completion_questions.clone().unwrap_or_default(),
        forms,
        min_user_turns: setup.min_user_turns.unwrap_or(0),
    })
}

pub fn is_in_review(messages: &[Message], protocol: &ProtocolConfig) -> bool {
    messages.iter().any(|message| {
        message.command.as_deref() == Some(protocol.back_to_front.command_review.as_str())
    })
}

pub fn has_reviewed(messages: &[Message], agent_id: &str, protocol: &ProtocolConfig) -> bool {
    messages.iter().any(|message| {
        message.sent_by(agent_id)
            && message
                .text
                .starts_with(protocol.front_to_back.done_prefix.as_str())
    })
}

/// Chat turns written by the user, ignoring commands and control tokens.
pub fn user_turn_count(messages: &[Message], protocol: &ProtocolConfig) -> usize {
    messages
        .iter()
        .filter(|message| {
            message.sent_by(&protocol.agent_ids.user_id)
                && message.command.is_none()
                && !message.text.is_empty()
                && !message.text.starts_with('<')
        })
        .count()
}

/// Whether `agent_id` may send `<complete>` right now.
pub fn can_complete(
    messages: &[Message],
    agent_id: &str,
    chat_ready: bool,
    protocol: &ProtocolConfig,
) -> bool {
    if agent_id != protocol.agent_ids.user_id || !chat_ready {
        return false;
    }
    let min_user_turns = match latest_setup(messages, protocol) {
        SetupView::Ready(setup) => setup.min_user_turns,
        SetupView::Waiting => 0,
    };
    user_turn_count(messages, protocol) >= min_user_turns as usize
}

pub fn should_request_suggestions(
    agent_id: &str,
    world_state: WorldState,
    protocol: &ProtocolConfig,
) -> bool {
    agent_id == protocol.agent_ids.wizard_id && world_state != WorldState::Onboarding
}

/// Text the wizard's input box actually sends. Queries are never wrapped.
pub fn outgoing_wizard_text(text: &str, should_suggest: bool, protocol: &ProtocolConfig) -> String {
    if should_suggest && !text.starts_with('?') {
        encode_request_suggestions(text, protocol)
    } else {
        text.to_string()
    }
}

/// Suggestions on offer, only while the supply command is the newest message.
pub fn latest_suggestions(messages: &[Message], protocol: &ProtocolConfig) -> Vec<String> {
    let Some(last) = messages.last() else {
        return Vec::new();
    };
    if classify(last, protocol) != Tag::SuggestionSupply {
        return Vec::new();
    }
    last.command
        .as_deref()
        .map(|command| parse_suggestions(command, protocol))
        .unwrap_or_default()
}

pub fn should_focus_input(was_active: bool, is_active: bool) -> bool {
    is_active && !was_active
}
