//! Story templates shared by every session.
//!
//! A [`StoryBook`] is loaded once at startup. Each new session builds its
//! own [`Progress`](crate::Progress) from it, so templates are never
//! mutated after loading.

use std::collections::BTreeSet;

use realm_types::ProgressEventKind;
use serde::Deserialize;

use crate::error::StoryError;

/// An event a condition waits for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConditionTemplate {
    /// Event kind.
    #[serde(rename = "type")]
    pub kind: ProgressEventKind,
    /// Event value that satisfies the condition.
    pub target: String,
    /// Text shown in the quest log.
    #[serde(default)]
    pub text: String,
}

/// One stage of a quest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StageTemplate {
    /// Stage key, unique within its quest.
    pub key: String,
    /// Stage description.
    #[serde(default)]
    pub text: String,
    /// Conditions that complete the stage.
    #[serde(default)]
    pub conditions: Vec<ConditionTemplate>,
}

/// A quest and its ordered stages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuestTemplate {
    /// Quest key.
    pub key: String,
    /// Quest title.
    pub title: String,
    /// Quest description.
    #[serde(default)]
    pub text: String,
    /// Stages in reveal order. The first is shown from the start.
    pub stages: Vec<StageTemplate>,
}

/// A message revealed once all its conditions are met.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageTemplate {
    /// Message key.
    pub key: String,
    /// Dialog title.
    pub title: String,
    /// Dialog text.
    pub text: String,
    /// Conditions that reveal the message.
    pub conditions: Vec<ConditionTemplate>,
}

/// Every message and quest template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StoryBook {
    /// Message templates.
    #[serde(default)]
    pub messages: Vec<MessageTemplate>,
    /// Quest templates.
    #[serde(default)]
    pub quests: Vec<QuestTemplate>,
}

impl StoryBook {
    /// Parse and validate a YAML story document.
    pub fn from_yaml_str(source: &str) -> Result<Self, StoryError> {
        let book: Self = serde_yml::from_str(source)?;
        book.validate()?;
        Ok(book)
    }

    /// Check structural rules the progress engine relies on.
    pub fn validate(&self) -> Result<(), StoryError> {
        let mut message_keys = BTreeSet::new();
        for message in &self.messages {
            if !message_keys.insert(message.key.as_str()) {
                return Err(StoryError::DuplicateKey(message.key.clone()));
            }
            if message.conditions.is_empty() {
                return Err(StoryError::UnconditionalMessage(message.key.clone()));
            }
        }

        let mut quest_keys = BTreeSet::new();
        for quest in &self.quests {
            if !quest_keys.insert(quest.key.as_str()) {
                return Err(StoryError::DuplicateKey(quest.key.clone()));
            }
            if quest.stages.is_empty() {
                return Err(StoryError::EmptyQuest(quest.key.clone()));
            }
            let mut stage_keys = BTreeSet::new();
            for stage in &quest.stages {
                if !stage_keys.insert(stage.key.as_str()) {
                    return Err(StoryError::DuplicateKey(format!("{}/{}", quest.key, stage.key)));
                }
            }
        }
        Ok(())
    }
}
