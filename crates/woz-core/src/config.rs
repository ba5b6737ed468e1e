use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::WozError;

/// Wire constants shared by the chat frontend and the task backend.
///
/// The layout matches the `constants.json` file both sides load, so an existing
/// file deserialises directly. Missing sections fall back to the defaults.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ProtocolConfig {
    pub front_to_back: FrontToBack,
    pub back_to_front: BackToFront,
    pub agent_ids: AgentIds,
    pub debug: DebugFlags,
    pub selection: SelectionConfig,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            front_to_back: FrontToBack::default(),
            back_to_front: BackToFront::default(),
            agent_ids: AgentIds::default(),
            debug: DebugFlags::default(),
            selection: SelectionConfig::default(),
        }
    }
}

impl ProtocolConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WozError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| WozError::io(path, err))?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self::parse(&raw, extension.as_str())
    }

    pub fn parse(raw: &str, format: &str) -> Result<Self, WozError> {
        let config = match format {
            "toml" => toml::from_str(raw)?,
            "yaml" | "yml" => serde_yaml::from_str(raw)?,
            "json" => serde_json::from_str(raw)?,
            other => return Err(WozError::UnsupportedFormat(other.to_string())),
        };
        Ok(config)
    }
}

/// Text prefixes the workers' browsers put in front of control messages.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct FrontToBack {
    pub complete_prefix: String,
    pub done_prefix: String,
    pub query_prefix: String,
    pub select_kb_entry_prefix: String,
    pub select_reference_kb_entry_prefix: String,
    pub request_suggestions_prefix: String,
    pub pick_suggestion_prefix: String,
}

impl Default for FrontToBack {
    fn default() -> Self {
        Self {
            complete_prefix: "<complete>".to_string(),
            done_prefix: "<done>".to_string(),
            query_prefix: "? ".to_string(),
            select_kb_entry_prefix: "<select_knowledge_base_entry>".to_string(),
            select_reference_kb_entry_prefix: "<select_reference_knowledge_base_entry>"
                .to_string(),
            request_suggestions_prefix: "<request_suggestions>".to_string(),
            pick_suggestion_prefix: "<pick_suggestion>".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BackToFront {
    pub command_setup: String,
    pub command_review: String,
    pub command_supply_suggestions: String,
}

impl Default for BackToFront {
    fn default() -> Self {
        Self {
            command_setup: "setup".to_string(),
            command_review: "review".to_string(),
            command_supply_suggestions: "supply_suggestions".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AgentIds {
    pub system_id: String,
    pub wizard_id: String,
    pub user_id: String,
    pub knowledgebase_id: String,
    pub onboarding_wizard_id: String,
    pub onboarding_user_id: String,
}

impl Default for AgentIds {
    fn default() -> Self {
        Self {
            system_id: "MTurk System".to_string(),
            wizard_id: "Wizard".to_string(),
            user_id: "User".to_string(),
            knowledgebase_id: "KnowledgeBase".to_string(),
            onboarding_wizard_id: "onboarding".to_string(),
            onboarding_user_id: "onboarding".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DebugFlags {
    /// Emit protocol-only messages too, flagged `invisible`.
    pub render_invisible_messages: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImplicitSelection {
    /// Every new knowledge base reply takes over the selected slot.
    #[default]
    MostRecent,
    /// A knowledge base reply becomes the selected entry only while nothing is selected.
    WhenUnset,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SelectionConfig {
    pub implicit: ImplicitSelection,
}
