use super::*;
use pretty_assertions::assert_eq;

#[test]
fn selecting_compared_entry_clears_compare_to() {
    let messages = vec![
        kb("A", "Example: {\"x\":1}"),
        select_reference("m-1", "A"),
        select("m-2", "A"),
    ];
    let snapshot = process(&messages, &protocol());
    assert_selection(&snapshot, Some("A"), None);
    assert_eq!(view(&snapshot, "A").toggle, Some(EntryToggle::Selected));
}

#[test]
fn comparing_selected_entry_clears_selected() {
    let messages = vec![
        kb_result("A", "Shadyside"),
        kb_result("B", "Oakland"),
        select("m-1", "B"),
        select_reference("m-2", "B"),
    ];
    let snapshot = process(&messages, &protocol());
    assert_selection(&snapshot, None, Some("B"));
    assert_eq!(view(&snapshot, "A").toggle, Some(EntryToggle::NotSelected));
    assert_eq!(view(&snapshot, "B").toggle, Some(EntryToggle::CompareTo));
}

#[test]
fn newest_reply_is_selected_implicitly() {
    let messages = vec![kb_result("A", "Shadyside"), kb_result("B", "Oakland")];
    let snapshot = process(&messages, &protocol());
    assert_selection(&snapshot, Some("B"), None);
    assert_eq!(view(&snapshot, "A").toggle, Some(EntryToggle::NotSelected));
}

#[test]
fn new_query_result_replaces_explicit_selection() {
    let messages = vec![
        kb_result("A", "Shadyside"),
        select("m-1", "A"),
        chat("Wizard", "m-2", "? {\"db\": \"apartment\", \"constraints\": []}"),
        kb_result("B", "Oakland"),
    ];
    let snapshot = process(&messages, &protocol());
    assert_selection(&snapshot, Some("B"), None);
    assert_eq!(view(&snapshot, "A").toggle, Some(EntryToggle::NotSelected));
    assert_eq!(view(&snapshot, "B").toggle, Some(EntryToggle::Selected));
}

#[test]
fn when_unset_policy_keeps_existing_selection() {
    let mut protocol = protocol();
    protocol.selection.implicit = ImplicitSelection::WhenUnset;
    let messages = vec![kb_result("A", "Shadyside"), kb_result("B", "Oakland")];
    let snapshot = process(&messages, &protocol);
    assert_selection(&snapshot, Some("A"), None);

    let messages = vec![
        kb_result("A", "Shadyside"),
        select("m-1", "A"),
        kb_result("B", "Oakland"),
    ];
    let snapshot = process(&messages, &protocol);
    assert_selection(&snapshot, Some("A"), None);
}

#[test]
fn fresh_reply_fills_slot_freed_by_comparison() {
    let messages = vec![
        kb_result("A", "Shadyside"),
        select_reference("m-1", "A"),
        kb_result("B", "Oakland"),
    ];
    let snapshot = process(&messages, &protocol());
    assert_selection(&snapshot, Some("B"), Some("A"));
}

#[test]
fn explicit_selection_overrides_implicit_default() {
    let snapshot = process(&conversation(), &protocol());
    assert_selection(&snapshot, Some("m-6"), Some("m-4"));
    assert_eq!(view(&snapshot, "m-4").toggle, Some(EntryToggle::CompareTo));
    assert_eq!(view(&snapshot, "m-6").toggle, Some(EntryToggle::Selected));
    assert_eq!(view(&snapshot, "m-2").toggle, None);
}

#[test]
fn malformed_selection_leaves_state_unchanged() {
    let messages = vec![
        kb_result("A", "Shadyside"),
        chat("Wizard", "m-1", "<select_knowledge_base_entry> B"),
        chat("Wizard", "m-2", "<select_reference_knowledge_base_entry>   |{}"),
    ];
    let snapshot = process(&messages, &protocol());
    assert_eq!(snapshot.per_message[1].tag, Tag::SelectEntry);
    assert_selection(&snapshot, Some("A"), None);
}

#[test]
fn selection_never_looks_ahead() {
    let messages = conversation();
    let protocol = protocol();
    let mut running = Selection::default();
    for k in 0..=messages.len() {
        let prefix = &messages[..k];
        let snapshot = process(prefix, &protocol);
        assert_eq!(snapshot.selection, compute_selection(prefix, &protocol), "prefix {k}");
        assert_eq!(snapshot.selection, running, "prefix {k}");
        if let Some(message) = messages.get(k) {
            let tag = crate::classify::classify(message, &protocol);
            running.apply(message, tag, &protocol);
        }
    }
}
