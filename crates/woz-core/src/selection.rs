use serde::{Deserialize, Serialize};

use super::classify::classify;
use super::classify::Tag;
use super::config::ImplicitSelection;
use super::config::ProtocolConfig;
use super::message::Message;

pub const ENTRY_DELIMITER: char = '|';

/// Which knowledge base replies currently hold the `selected` and
/// `compare to` roles. Both ids are `message_id`s of earlier replies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub selected: Option<String>,
    pub compare_to: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryToggle {
    Selected,
    CompareTo,
    NotSelected,
}

impl EntryToggle {
    pub fn label(self) -> &'static str {
        match self {
            Self::Selected => "selected",
            Self::CompareTo => "compare to",
            Self::NotSelected => "not selected",
        }
    }
}

impl Selection {
    pub fn toggle_for(&self, message_id: &str) -> EntryToggle {
        if self.selected.as_deref() == Some(message_id) {
            EntryToggle::Selected
        } else if self.compare_to.as_deref() == Some(message_id) {
            EntryToggle::CompareTo
        } else {
            EntryToggle::NotSelected
        }
    }

    /// Applies one message. Callers feed the history oldest first.
    pub fn apply(&mut self, message: &Message, tag: Tag, protocol: &ProtocolConfig) {
        match tag {
            Tag::SelectEntry => {
                let prefix = protocol.front_to_back.select_kb_entry_prefix.as_str();
                let Some(entry) = extract_entry_id(&message.text, prefix) else {
                    tracing::debug!(message_id = %message.message_id, "selection without entry id");
                    return;
                };
                self.selected = Some(entry.to_string());
                if self.selected == self.compare_to {
                    self.compare_to = None;
                }
            }
            Tag::SelectReferenceEntry => {
                let prefix = protocol
                    .front_to_back
                    .select_reference_kb_entry_prefix
                    .as_str();
                let Some(entry) = extract_entry_id(&message.text, prefix) else {
                    tracing::debug!(message_id = %message.message_id, "comparison without entry id");
                    return;
                };
                self.compare_to = Some(entry.to_string());
                if self.compare_to == self.selected {
                    self.selected = None;
                }
            }
            _ if message.id == protocol.agent_ids.knowledgebase_id => {
                let takes_over = match protocol.selection.implicit {
                    ImplicitSelection::WhenUnset => self.selected.is_none(),
                    ImplicitSelection::MostRecent => true,
                };
                if takes_over {
                    self.selected = Some(message.message_id.clone());
                }
            }
            _ => {}
        }
    }
}

pub fn compute_selection(messages: &[Message], protocol: &ProtocolConfig) -> Selection {
    fold_selection(
        messages
            .iter()
            .map(|message| (message, classify(message, protocol))),
        protocol,
    )
}

pub(crate) fn fold_selection<'a>(
    tagged: impl IntoIterator<Item = (&'a Message, Tag)>,
    protocol: &ProtocolConfig,
) -> Selection {
    let mut selection = Selection::default();
    for (message, tag) in tagged {
        selection.apply(message, tag, protocol);
    }
    selection
}

/// `"<prefix> <message_id>|<example>"` -> `message_id`.
pub fn extract_entry_id<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(prefix)?;
    let (entry, _) = rest.split_once(ENTRY_DELIMITER)?;
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }
    Some(entry)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn extract_entry_id_reads_token_before_delimiter() {
        let prefix = "<select_knowledge_base_entry>";
        assert_eq!(
            extract_entry_id("<select_knowledge_base_entry> m-7|{\"a\": 1}", prefix),
            Some("m-7")
        );
        assert_eq!(
            extract_entry_id("<select_knowledge_base_entry>m-7|", prefix),
            Some("m-7")
        );
        assert_eq!(extract_entry_id("<select_knowledge_base_entry> m-7", prefix), None);
        assert_eq!(extract_entry_id("<select_knowledge_base_entry>  |{}", prefix), None);
        assert_eq!(extract_entry_id("m-7|{}", prefix), None);
    }

    #[test]
    fn toggle_reflects_roles() {
        let selection = Selection {
            selected: Some("a".to_string()),
            compare_to: Some("b".to_string()),
        };
        assert_eq!(selection.toggle_for("a"), EntryToggle::Selected);
        assert_eq!(selection.toggle_for("b"), EntryToggle::CompareTo);
        assert_eq!(selection.toggle_for("c"), EntryToggle::NotSelected);
    }
}
