//! One-shot messages revealed when all their conditions are met.

use realm_types::{LogItem, MessageView, ServerMessage};
use tracing::debug;

use crate::bus::EventBus;
use crate::condition::ProgressCondition;
use crate::progress::ConditionRef;
use crate::story::MessageTemplate;

/// A message tracked for one session. Invisible until every condition has
/// fired, then visible for the rest of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    key: String,
    title: String,
    text: String,
    conditions: Vec<ProgressCondition>,
    show: bool,
}

impl Message {
    pub(crate) fn new(template: &MessageTemplate, message: usize, bus: &mut EventBus<ConditionRef>) -> Self {
        let conditions = template
            .conditions
            .iter()
            .enumerate()
            .map(|(condition, c)| ProgressCondition::subscribe(c, bus, ConditionRef::Message { message, condition }))
            .collect();
        Self {
            key: template.key.clone(),
            title: template.title.clone(),
            text: template.text.clone(),
            conditions,
            show: false,
        }
    }

    /// Message key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the message has been revealed.
    pub const fn is_shown(&self) -> bool {
        self.show
    }

    pub(crate) fn condition_mut(&mut self, condition: usize) -> Option<&mut ProgressCondition> {
        self.conditions.get_mut(condition)
    }

    /// React to condition `condition` having been met. Partial progress is
    /// not reported; the message stays invisible until complete.
    pub(crate) fn condition_done(&mut self, condition: usize, bus: &mut EventBus<ConditionRef>) -> Vec<ServerMessage> {
        if let Some(met) = self.conditions.get_mut(condition) {
            met.dispose(bus);
        }
        if self.show || !self.conditions.iter().all(ProgressCondition::is_done) {
            return Vec::new();
        }

        self.show = true;
        debug!(message = %self.key, "message revealed");
        vec![
            ServerMessage::Dialog {
                title: Some(self.title.clone()),
                text: self.text.clone(),
            },
            ServerMessage::LogUpdate {
                item: LogItem::Message(self.view()),
            },
        ]
    }

    pub(crate) fn dispose(&mut self, bus: &mut EventBus<ConditionRef>) -> usize {
        let mut released = 0_usize;
        for condition in &mut self.conditions {
            if condition.dispose(bus) {
                released = released.saturating_add(1);
            }
        }
        released
    }

    /// Client-visible form.
    pub fn view(&self) -> MessageView {
        MessageView {
            key: self.key.clone(),
            title: self.title.clone(),
            text: self.text.clone(),
        }
    }
}
