//! Error types for the `realm-progress` crate.

/// Errors raised while loading or validating story content.
#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    /// The story document could not be parsed.
    #[error("story parse error: {0}")]
    Parse(#[from] serde_yml::Error),

    /// A quest has no stages.
    #[error("quest {0} has no stages")]
    EmptyQuest(String),

    /// A message has no conditions and could never be shown.
    #[error("message {0} has no conditions")]
    UnconditionalMessage(String),

    /// Two quests, two messages or two stages of one quest share a key.
    #[error("duplicate story key: {0}")]
    DuplicateKey(String),
}
