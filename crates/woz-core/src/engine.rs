use serde::{Deserialize, Serialize};

use super::classify::classify;
use super::classify::visibility;
use super::classify::Tag;
use super::config::ProtocolConfig;
use super::message::Message;
use super::payload::decode;
use super::payload::match_count;
use super::payload::DecodedPayload;
use super::selection::fold_selection;
use super::selection::EntryToggle;
use super::selection::Selection;

/// Everything the UI needs to render one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageView {
    pub message_id: String,
    pub sender: String,
    pub tag: Tag,
    pub visible: bool,
    pub invisible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<DecodedPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_count: Option<String>,
    /// Set on knowledge base replies only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggle: Option<EntryToggle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub per_message: Vec<MessageView>,
    pub selection: Selection,
}

impl Snapshot {
    pub fn visible(&self) -> impl Iterator<Item = &MessageView> {
        self.per_message.iter().filter(|view| view.visible)
    }

    pub fn view(&self, message_id: &str) -> Option<&MessageView> {
        self.per_message
            .iter()
            .find(|view| view.message_id == message_id)
    }
}

/// Single pass over the ordered history. Pure: same input, same snapshot.
pub fn process(messages: &[Message], protocol: &ProtocolConfig) -> Snapshot {
    let tags: Vec<Tag> = messages
        .iter()
        .map(|message| classify(message, protocol))
        .collect();
    let selection = fold_selection(messages.iter().zip(tags.iter().copied()), protocol);

    let last_index = messages.len().checked_sub(1);
    let per_message = messages
        .iter()
        .zip(tags)
        .enumerate()
        .map(|(index, (message, tag))| {
            let seen = visibility(tag, Some(index) == last_index, protocol);
            let is_kb = message.id == protocol.agent_ids.knowledgebase_id;
            let (payload, count, toggle) = if is_kb {
                (
                    decode(&message.text),
                    match_count(&message.text),
                    Some(selection.toggle_for(&message.message_id)),
                )
            } else {
                (None, None, None)
            };
            MessageView {
                message_id: message.message_id.clone(),
                sender: message.id.clone(),
                tag,
                visible: seen.visible,
                invisible: seen.invisible,
                payload,
                match_count: count,
                toggle,
            }
        })
        .collect();

    tracing::trace!(messages = messages.len(), "processed message history");

    Snapshot {
        per_message,
        selection,
    }
}

/// Caches the last snapshot. The history is append-only, so the length and the
/// newest `message_id` identify a list; any other list recomputes.
#[derive(Debug, Clone)]
pub struct Engine {
    protocol: ProtocolConfig,
    cached: Option<(CacheKey, Snapshot)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    len: usize,
    last_message_id: Option<String>,
}

impl CacheKey {
    fn of(messages: &[Message]) -> Self {
        Self {
            len: messages.len(),
            last_message_id: messages.last().map(|message| message.message_id.clone()),
        }
    }
}

impl Engine {
    pub fn new(protocol: ProtocolConfig) -> Self {
        Self {
            protocol,
            cached: None,
        }
    }

    pub fn protocol(&self) -> &ProtocolConfig {
        &self.protocol
    }

    pub fn process(&mut self, messages: &[Message]) -> &Snapshot {
        let key = CacheKey::of(messages);
        if self.cached.as_ref().map(|(cached_key, _)| cached_key) != Some(&key) {
            self.cached = None;
        }
        let protocol = &self.protocol;
        let (_, snapshot) = self
            .cached
            .get_or_insert_with(|| (key, process(messages, protocol)));
        snapshot
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(ProtocolConfig::default())
    }
}

#[cfg(test)]
mod tests;
