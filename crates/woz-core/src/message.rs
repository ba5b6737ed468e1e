use serde::{Deserialize, Serialize};
use serde_json::Map;
use serde_json::Value;

/// One entry of the conversation as delivered by the crowd-work platform.
///
/// Messages are never edited after they are appended; everything this crate
/// derives is recomputed from the ordered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default)]
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_description: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_requirements: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_questions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_user_turns: Option<u32>,
    /// Milliseconds, only attached while reviewing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn new(
        id: impl Into<String>,
        message_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            command: None,
            message_id: message_id.into(),
            task_data: None,
            form_description: None,
            task_description: None,
            completion_requirements: None,
            completion_questions: None,
            min_user_turns: None,
            duration: None,
            extra: Map::new(),
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn sent_by(&self, agent_id: &str) -> bool {
        self.id == agent_id
    }
}
