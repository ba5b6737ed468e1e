use pretty_assertions::assert_eq;

pub(super) use super::process;
pub(super) use super::Engine;
pub(super) use super::MessageView;
pub(super) use super::Snapshot;
pub(super) use crate::classify::Tag;
pub(super) use crate::config::ImplicitSelection;
pub(super) use crate::config::ProtocolConfig;
pub(super) use crate::message::Message;
pub(super) use crate::selection::compute_selection;
pub(super) use crate::selection::EntryToggle;
pub(super) use crate::selection::Selection;

mod selection_rules;

fn protocol() -> ProtocolConfig {
    ProtocolConfig::default()
}

fn chat(sender: &str, message_id: &str, text: &str) -> Message {
    Message::new(sender, message_id, text)
}

fn kb(message_id: &str, text: &str) -> Message {
    Message::new("KnowledgeBase", message_id, text)
}

fn kb_result(message_id: &str, name: &str) -> Message {
    kb(
        message_id,
        &format!(r#"Found 2 apartments. Example: {{"Name": "{name}", "api_name": "apartment_search"}}."#),
    )
}

fn select(message_id: &str, entry: &str) -> Message {
    Message::new(
        "Wizard",
        message_id,
        format!("<select_knowledge_base_entry> {entry}|{{\"Name\": \"x\"}}"),
    )
}

fn select_reference(message_id: &str, entry: &str) -> Message {
    Message::new(
        "Wizard",
        message_id,
        format!("<select_reference_knowledge_base_entry> {entry}|{{\"Name\": \"x\"}}"),
    )
}

fn suggestions(message_id: &str) -> Message {
    Message::new("Wizard", message_id, "")
        .with_command("supply_suggestions['Sure, it is free.', 'No, sorry.']")
}

fn view<'a>(snapshot: &'a Snapshot, message_id: &str) -> &'a MessageView {
    snapshot
        .view(message_id)
        .unwrap_or_else(|| panic!("no view for {message_id}"))
}

fn assert_selection(snapshot: &Snapshot, selected: Option<&str>, compare_to: Option<&str>) {
    assert_eq!(snapshot.selection.selected.as_deref(), selected);
    assert_eq!(snapshot.selection.compare_to.as_deref(), compare_to);
}

fn conversation() -> Vec<Message> {
    vec![
        Message::new("Wizard", "m-0", "").with_command("setup"),
        chat("MTurk System", "m-1", "Please greet the user."),
        chat("User", "m-2", "I need a flat with a balcony."),
        chat("Wizard", "m-3", "? {\"db\": \"apartment\", \"constraints\": []}"),
        kb_result("m-4", "Shadyside"),
        chat("Wizard", "m-5", "? {\"db\": \"apartment\", \"constraints\": []}"),
        kb_result("m-6", "Oakland"),
        select_reference("m-7", "m-4"),
        select("m-8", "m-6"),
        chat("Wizard", "m-9", "<request_suggestions>Oakland has one."),
        suggestions("m-10"),
        chat("Wizard", "m-11", "<pick_suggestion>Sure, it is free."),
        chat("Wizard", "m-12", "Sure, it is free."),
        chat("User", "m-13", "<complete>"),
        Message::new("Wizard", "m-14", "").with_command("review"),
        chat("User", "m-15", "<done> {\"ch_0\": true}"),
    ]
}
