//! Quest and message progress for the Realm simulation core.
//!
//! World events (entering an area, talking, attacking, killing,
//! configuring, picking a dialog option) are published into a session's
//! [`Progress`]. Conditions waiting for a matching event complete exactly
//! once, unsubscribing as they do, and completion cascades into stage
//! reveals, quest completion and one-shot messages. The resulting
//! `dialog`/`logUpdate` messages are returned to the caller for delivery.
//!
//! # Modules
//!
//! - [`bus`] -- Publish/subscribe registry keyed by event kind
//! - [`condition`] -- Single event-triggered conditions
//! - [`quest`] -- Quests and their ordered stages
//! - [`message`] -- One-shot messages
//! - [`progress`] -- The per-session aggregate
//! - [`story`] -- Story templates loaded at startup
//! - [`error`] -- Story loading errors

pub mod bus;
pub mod condition;
pub mod error;
pub mod message;
pub mod progress;
pub mod quest;
pub mod story;

pub use bus::{EventBus, SubscriptionHandle};
pub use condition::ProgressCondition;
pub use error::StoryError;
pub use message::Message;
pub use progress::Progress;
pub use quest::{Quest, QuestStage};
pub use story::{ConditionTemplate, MessageTemplate, QuestTemplate, StageTemplate, StoryBook};
