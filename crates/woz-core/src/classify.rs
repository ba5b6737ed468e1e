use serde::{Deserialize, Serialize};

use super::config::ProtocolConfig;
use super::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    PlainChat,
    Query,
    Command,
    SuggestionSupply,
    SuggestionPick,
    SelectEntry,
    SelectReferenceEntry,
    Done,
    Complete,
    /// Any other `<...>` token, e.g. `<request_suggestions>`.
    Control,
    System,
}

impl Tag {
    pub fn label(self) -> &'static str {
        match self {
            Self::PlainChat => "plain-chat",
            Self::Query => "query",
            Self::Command => "command",
            Self::SuggestionSupply => "suggestion-supply",
            Self::SuggestionPick => "suggestion-pick",
            Self::SelectEntry => "select-entry",
            Self::SelectReferenceEntry => "select-reference-entry",
            Self::Done => "done",
            Self::Complete => "complete",
            Self::Control => "control",
            Self::System => "system",
        }
    }

    pub fn is_chat(self) -> bool {
        matches!(self, Self::PlainChat | Self::System)
    }
}

/// Ordered rule chain; the first matching rule decides the tag.
pub fn classify(message: &Message, protocol: &ProtocolConfig) -> Tag {
    let prefixes = &protocol.front_to_back;
    let text = message.text.as_str();

    if let Some(command) = message.command.as_deref() {
        if command.starts_with(protocol.back_to_front.command_supply_suggestions.as_str()) {
            return Tag::SuggestionSupply;
        }
        return Tag::Command;
    }
    if text.starts_with(prefixes.query_prefix.as_str()) {
        return Tag::Query;
    }
    if text.starts_with(prefixes.select_kb_entry_prefix.as_str()) {
        return Tag::SelectEntry;
    }
    if text.starts_with(prefixes.select_reference_kb_entry_prefix.as_str()) {
        return Tag::SelectReferenceEntry;
    }
    if text.starts_with(prefixes.pick_suggestion_prefix.as_str()) {
        return Tag::SuggestionPick;
    }
    if is_bracketed_token(text) {
        if text.starts_with(prefixes.done_prefix.as_str()) {
            return Tag::Done;
        }
        if text.starts_with(prefixes.complete_prefix.as_str()) {
            return Tag::Complete;
        }
        return Tag::Control;
    }
    if message.id == protocol.agent_ids.system_id {
        return Tag::System;
    }
    Tag::PlainChat
}

fn is_bracketed_token(text: &str) -> bool {
    text.strip_prefix('<')
        .is_some_and(|rest| rest.contains('>'))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    /// The UI should emit this message at all.
    pub visible: bool,
    /// Protocol-only message; only emitted when the debug flag forces it.
    pub invisible: bool,
}

/// `is_last` must be true only for the final message of the list. A
/// suggestion prompt is stale as soon as anything follows it.
pub fn visibility(tag: Tag, is_last: bool, protocol: &ProtocolConfig) -> Visibility {
    let shown = tag.is_chat() || (tag == Tag::SuggestionSupply && is_last);
    if shown {
        return Visibility {
            visible: true,
            invisible: false,
        };
    }
    Visibility {
        visible: protocol.debug.render_invisible_messages,
        invisible: true,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn msg(id: &str, text: &str) -> Message {
        Message::new(id, "m-1", text)
    }

    #[test]
    fn command_field_wins_over_text_prefixes() {
        let protocol = ProtocolConfig::default();
        for command in ["setup", "review", "anything-else", ""] {
            let message = msg("Wizard", "? {\"db\": \"x\"}").with_command(command);
            assert_eq!(classify(&message, &protocol), Tag::Command, "{command}");
        }
        let message = msg("Wizard", "").with_command("supply_suggestions['a', 'b']");
        assert_eq!(classify(&message, &protocol), Tag::SuggestionSupply);
    }

    #[test]
    fn text_prefixes_follow_rule_order() {
        let protocol = ProtocolConfig::default();
        let cases = [
            ("? {\"db\": \"apartment\"}", Tag::Query),
            ("<select_knowledge_base_entry> m-3|{}", Tag::SelectEntry),
            (
                "<select_reference_knowledge_base_entry> m-3|{}",
                Tag::SelectReferenceEntry,
            ),
            ("<pick_suggestion>Sure, booked.", Tag::SuggestionPick),
            ("<done> {\"ch_0\": true}", Tag::Done),
            ("<complete>", Tag::Complete),
            ("<request_suggestions>hello there", Tag::Control),
            ("<select_topic> 1", Tag::Control),
            ("hello there", Tag::PlainChat),
            ("?no space is chat", Tag::PlainChat),
            ("< not closed", Tag::PlainChat),
            ("1 < 2 and 3 > 2", Tag::PlainChat),
        ];
        for (text, expected) in cases {
            assert_eq!(classify(&msg("User", text), &protocol), expected, "{text}");
        }
    }

    #[test]
    fn system_sender_only_applies_to_unprefixed_text() {
        let protocol = ProtocolConfig::default();
        assert_eq!(
            classify(&msg("MTurk System", "Please wait."), &protocol),
            Tag::System
        );
        assert_eq!(
            classify(&msg("MTurk System", "<complete>"), &protocol),
            Tag::Complete
        );
    }

    #[test]
    fn command_messages_are_never_chat_visible() {
        let protocol = ProtocolConfig::default();
        let message = msg("Wizard", "").with_command("review");
        let tag = classify(&message, &protocol);
        for is_last in [true, false] {
            let seen = visibility(tag, is_last, &protocol);
            assert!(!seen.visible);
            assert!(seen.invisible);
        }
    }

    #[test]
    fn suggestion_supply_is_visible_only_when_last() {
        let protocol = ProtocolConfig::default();
        assert_eq!(
            visibility(Tag::SuggestionSupply, true, &protocol),
            Visibility {
                visible: true,
                invisible: false
            }
        );
        assert_eq!(
            visibility(Tag::SuggestionSupply, false, &protocol),
            Visibility {
                visible: false,
                invisible: true
            }
        );
    }

    #[test]
    fn debug_flag_shows_hidden_messages_flagged_invisible() {
        let mut protocol = ProtocolConfig::default();
        protocol.debug.render_invisible_messages = true;
        assert_eq!(
            visibility(Tag::Query, false, &protocol),
            Visibility {
                visible: true,
                invisible: true
            }
        );
        assert_eq!(
            visibility(Tag::PlainChat, false, &protocol),
            Visibility {
                visible: true,
                invisible: false
            }
        );
    }
}
