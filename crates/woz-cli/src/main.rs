use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use woz_core::classify::classify;
use woz_core::classify::visibility;
use woz_core::classify::Tag;
use woz_core::commands::parse_worker_command;
use woz_core::commands::WorkerCommand;
use woz_core::config::ProtocolConfig;
use woz_core::display::format_duration;
use woz_core::display::is_private_to_viewer;
use woz_core::display::match_summary;
use woz_core::display::sender_label;
use woz_core::display::split_camel_case;
use woz_core::display::toggle_options;
use woz_core::display::ToggleOption;
use woz_core::engine::Engine;
use woz_core::engine::MessageView;
use woz_core::message::Message;
use woz_core::payload::decode_strict;
use woz_core::payload::FieldValue;
use woz_core::selection::EntryToggle;
use woz_core::selection::Selection;
use woz_core::session::can_complete;
use woz_core::session::has_reviewed;
use woz_core::session::is_in_review;
use woz_core::session::latest_setup;
use woz_core::session::latest_suggestions;
use woz_core::session::user_turn_count;
use woz_core::session::SetupView;
use woz_core::transcript::load_transcript;

mod cli;
mod logging;

use cli::Args;
use cli::Command;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    logging::setup_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let args = Args::parse();
    let mut protocol = resolve_config(args.config.as_deref())?;

    let output = match args.command {
        Command::Process {
            transcript,
            debug_invisible,
            visible_only,
        } => {
            if debug_invisible {
                protocol.debug.render_invisible_messages = true;
            }
            let messages = load_transcript(&transcript)?;
            serde_json::to_value(process_report(&messages, protocol, visible_only))?
        }
        Command::Classify {
            text,
            sender,
            command,
        } => serde_json::to_value(classify_report(&text, &sender, command, &protocol))?,
        Command::Decode { text } => serde_json::to_value(decode_report(&text)?)?,
        Command::Session {
            transcript,
            agent,
            input_blocked,
        } => {
            let messages = load_transcript(&transcript)?;
            serde_json::to_value(session_report(&messages, &agent, !input_blocked, &protocol))?
        }
    };

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");
    Ok(())
}

fn resolve_config(explicit: Option<&Path>) -> CliResult<ProtocolConfig> {
    if let Some(path) = explicit {
        return Ok(ProtocolConfig::load(path)?);
    }
    match default_config_path() {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "loading protocol config");
            Ok(ProtocolConfig::load(path)?)
        }
        _ => Ok(ProtocolConfig::default()),
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("woz").join("config.toml"))
}

#[derive(Debug, Serialize)]
struct ProcessRow {
    #[serde(flatten)]
    view: MessageView,
    label: String,
    only_visible_to_you: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProcessReport {
    messages: Vec<ProcessRow>,
    selection: Selection,
}

fn process_report(messages: &[Message], protocol: ProtocolConfig, visible_only: bool) -> ProcessReport {
    let mut engine = Engine::new(protocol);
    let snapshot = engine.process(messages).clone();
    let protocol = engine.protocol();
    let in_review = is_in_review(messages, protocol);

    let rows = messages
        .iter()
        .zip(snapshot.per_message)
        .filter(|(_, view)| !visible_only || view.visible)
        .map(|(message, view)| ProcessRow {
            label: sender_label(&message.id, protocol).to_string(),
            only_visible_to_you: is_private_to_viewer(message, protocol),
            duration: message
                .duration
                .filter(|_| in_review)
                .map(format_duration),
            view,
        })
        .collect();

    ProcessReport {
        messages: rows,
        selection: snapshot.selection,
    }
}

#[derive(Debug, Serialize)]
struct ClassifyReport {
    tag: Tag,
    shown_when_last: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<WorkerCommand>,
}

fn classify_report(
    text: &str,
    sender: &str,
    command: Option<String>,
    protocol: &ProtocolConfig,
) -> ClassifyReport {
    let mut message = Message::new(sender, "cli", text);
    message.command = command;
    let tag = classify(&message, protocol);
    ClassifyReport {
        tag,
        shown_when_last: !visibility(tag, true, protocol).invisible,
        command: parse_worker_command(text, protocol),
    }
}

#[derive(Debug, Serialize)]
struct DecodedRow {
    label: String,
    name: String,
    value: FieldValue,
}

#[derive(Debug, Serialize)]
struct DecodeReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    match_count: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    fields: Vec<DecodedRow>,
    toggle: [ToggleOption; 3],
}

fn decode_report(text: &str) -> CliResult<DecodeReport> {
    let payload = decode_strict(text)?;
    let count = payload.match_count;
    let fields = payload
        .fields
        .into_iter()
        .map(|field| DecodedRow {
            label: split_camel_case(&field.name),
            name: field.name,
            value: field.value,
        })
        .collect();
    Ok(DecodeReport {
        summary: match_summary(count.as_deref()),
        match_count: count,
        fields,
        toggle: toggle_options(EntryToggle::NotSelected),
    })
}

#[derive(Debug, Serialize)]
struct SessionReport {
    setup: SetupView,
    in_review: bool,
    has_reviewed: bool,
    user_turns: usize,
    can_complete: bool,
    suggestions: Vec<String>,
}

fn session_report(
    messages: &[Message],
    agent: &str,
    chat_ready: bool,
    protocol: &ProtocolConfig,
) -> SessionReport {
    SessionReport {
        setup: latest_setup(messages, protocol),
        in_review: is_in_review(messages, protocol),
        has_reviewed: has_reviewed(messages, agent, protocol),
        user_turns: user_turn_count(messages, protocol),
        can_complete: can_complete(messages, agent, chat_ready, protocol),
        suggestions: latest_suggestions(messages, protocol),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn transcript() -> Vec<Message> {
        vec![
            Message::new("User", "m-0", "Is the flat free?"),
            Message::new("Wizard", "m-1", "? {\"db\": \"apartment\", \"constraints\": []}"),
            Message::new(
                "KnowledgeBase",
                "m-2",
                r#"Found 3 apartments. Example: {"Name": "Shadyside", "api_name": "apartment"}."#,
            ),
            Message::new("Wizard", "m-3", "Yes, it is."),
        ]
    }

    #[test]
    fn process_hides_protocol_messages() {
        let report = process_report(&transcript(), ProtocolConfig::default(), true);
        let ids: Vec<&str> = report
            .messages
            .iter()
            .map(|row| row.view.message_id.as_str())
            .collect();
        assert_eq!(ids, vec!["m-0", "m-2", "m-3"]);
        assert_eq!(report.messages[2].label, "AI Assistant");
        assert!(report.messages[1].only_visible_to_you);
        assert_eq!(report.selection.selected.as_deref(), Some("m-2"));
    }

    #[test]
    fn debug_flag_keeps_everything() {
        let mut protocol = ProtocolConfig::default();
        protocol.debug.render_invisible_messages = true;
        let report = process_report(&transcript(), protocol, true);
        assert_eq!(report.messages.len(), 4);
        assert!(report.messages[1].view.invisible);
    }

    #[test]
    fn classify_reports_worker_command() {
        let report = classify_report(
            "<select_knowledge_base_entry> m-2|{}",
            "Wizard",
            None,
            &ProtocolConfig::default(),
        );
        assert_eq!(report.tag, Tag::SelectEntry);
        assert!(!report.shown_when_last);
        assert!(matches!(
            report.command,
            Some(WorkerCommand::Select { ref message_id, .. }) if message_id == "m-2"
        ));
    }

    #[test]
    fn decode_labels_fields() {
        let report = decode_report(
            r#"Found 3 apartments. Example: {"HasBalcony": true, "api_name": "apartment"}."#,
        )
        .expect("decode");
        assert_eq!(report.summary.as_deref(), Some("This and 2 matches exist:"));
        assert_eq!(report.fields.len(), 1);
        assert_eq!(report.fields[0].label, "Has Balcony");
        assert!(decode_report("no marker here").is_err());
    }

    #[test]
    fn session_counts_user_turns() {
        let report = session_report(&transcript(), "User", true, &ProtocolConfig::default());
        assert_eq!(report.setup, SetupView::Waiting);
        assert_eq!(report.user_turns, 1);
        assert!(report.can_complete);
        assert!(!report.in_review);
    }

    #[test]
    fn explicit_config_is_loaded() {
        let dir = tempdir().expect("tmpdir");
        let path = dir.path().join("woz.toml");
        std::fs::write(&path, "[agent_ids]\nwizard_id = \"Operator\"\n").expect("write");
        let protocol = resolve_config(Some(path.as_path())).expect("config");
        assert_eq!(protocol.agent_ids.wizard_id, "Operator");
        assert_eq!(protocol.agent_ids.user_id, "User");

        assert!(resolve_config(Some(dir.path().join("woz.ini").as_path())).is_err());
    }
}
