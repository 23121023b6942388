//! Per-session progress: every message and quest built from the story book.
//!
//! A [`Progress`] owns its own [`EventBus`]. World events reach it through
//! [`Progress::handle_event`], which returns the messages the owning
//! connection should receive. Disposing releases every remaining
//! subscription and may safely happen more than once.

use realm_types::{LogItem, ProgressEventKind, ServerMessage};
use tracing::debug;

use crate::bus::EventBus;
use crate::message::Message;
use crate::quest::Quest;
use crate::story::StoryBook;

/// Where a subscribed condition lives inside a [`Progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConditionRef {
    Message {
        message: usize,
        condition: usize,
    },
    Stage {
        quest: usize,
        stage: usize,
        condition: usize,
    },
}

/// A session's story progress.
#[derive(Debug, Clone)]
pub struct Progress {
    bus: EventBus<ConditionRef>,
    messages: Vec<Message>,
    quests: Vec<Quest>,
    disposed: bool,
}

impl Progress {
    /// Instantiate fresh progress from the shared story templates.
    pub fn new(story: &StoryBook) -> Self {
        let mut bus = EventBus::new();
        let messages = story
            .messages
            .iter()
            .enumerate()
            .map(|(index, template)| Message::new(template, index, &mut bus))
            .collect();
        let quests = story
            .quests
            .iter()
            .enumerate()
            .map(|(index, template)| Quest::new(template, index, &mut bus))
            .collect();
        Self {
            bus,
            messages,
            quests,
            disposed: false,
        }
    }

    /// Feed a world event into every condition waiting for `kind`.
    ///
    /// Returns the `dialog` and `logUpdate` messages to send to the owning
    /// connection, in the order they were produced.
    pub fn handle_event(&mut self, kind: ProgressEventKind, value: &str) -> Vec<ServerMessage> {
        let mut outbound = Vec::new();

        for (_, address) in self.bus.publish(kind) {
            match address {
                ConditionRef::Message { message, condition } => {
                    let Some(item) = self.messages.get_mut(message) else {
                        continue;
                    };
                    let Some(met) = item.condition_mut(condition) else {
                        continue;
                    };
                    if !met.matches(value) || !met.complete(&mut self.bus) {
                        continue;
                    }
                    outbound.extend(item.condition_done(condition, &mut self.bus));
                }
                ConditionRef::Stage {
                    quest,
                    stage,
                    condition,
                } => {
                    let Some(item) = self.quests.get_mut(quest) else {
                        continue;
                    };
                    let Some(met) = item.condition_mut(stage, condition) else {
                        continue;
                    };
                    if !met.matches(value) || !met.complete(&mut self.bus) {
                        continue;
                    }
                    outbound.extend(item.condition_done(stage));
                }
            }
        }

        if !outbound.is_empty() {
            debug!(event = ?kind, value, messages = outbound.len(), "progress updated");
        }
        outbound
    }

    /// All quests.
    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    /// Messages that have been revealed.
    pub fn visible_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.is_shown())
    }

    /// The `logData` payload sent when a session becomes ready.
    pub fn log_data(&self) -> ServerMessage {
        ServerMessage::LogData {
            quests: self
                .quests
                .iter()
                .map(|q| LogItem::Quest(q.view()))
                .collect(),
            messages: self
                .visible_messages()
                .map(|m| LogItem::Message(m.view()))
                .collect(),
        }
    }

    /// Number of conditions still waiting for an event.
    pub fn live_subscriptions(&self) -> usize {
        self.bus.len()
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Unsubscribe every remaining condition. Returns how many were
    /// released; a second call releases nothing.
    pub fn dispose(&mut self) -> usize {
        let mut released = 0_usize;
        for message in &mut self.messages {
            released = released.saturating_add(message.dispose(&mut self.bus));
        }
        for quest in &mut self.quests {
            released = released.saturating_add(quest.dispose(&mut self.bus));
        }
        self.disposed = true;
        released
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const STORY: &str = r"
messages:
  - key: explorer
    title: Explorer
    text: You have seen both halls.
    conditions:
      - { type: enterArea, target: east }
      - { type: enterArea, target: west }
quests:
  - key: wolves
    title: Wolf trouble
    text: The village has a wolf problem.
    stages:
      - key: requirements
        text: Find the elder
        conditions:
          - { type: talk, target: Elder, text: Talk to the elder }
      - key: hunt
        text: Deal with the wolves
        conditions:
          - { type: kill, target: Wolf, text: Kill the wolf }
          - { type: kill, target: Alpha, text: Kill the alpha }
";

    fn progress() -> Progress {
        Progress::new(&StoryBook::from_yaml_str(STORY).unwrap())
    }

    fn quest_view(message: &ServerMessage) -> realm_types::QuestView {
        match message {
            ServerMessage::LogUpdate {
                item: LogItem::Quest(view),
            } => view.clone(),
            other => panic!("expected quest log update, got {other:?}"),
        }
    }

    #[test]
    fn quest_stages_reveal_in_order() {
        let mut p = progress();
        assert_eq!(p.quests()[0].view().stages.len(), 1);

        let out = p.handle_event(ProgressEventKind::Talk, "Elder");
        assert_eq!(out.len(), 1);
        let view = quest_view(&out[0]);
        assert_eq!(view.stages.len(), 2);
        assert!(view.stages[0].conditions[0].done);

        let out = p.handle_event(ProgressEventKind::Kill, "Wolf");
        assert_eq!(out.len(), 1);
        let view = quest_view(&out[0]);
        assert!(!view.completed);
        assert!(!p.quests()[0].stages()[1].is_done());

        let out = p.handle_event(ProgressEventKind::Kill, "Alpha");
        assert_eq!(out.len(), 1);
        assert!(quest_view(&out[0]).completed);
        assert!(p.quests()[0].stages()[1].is_done());
        assert_eq!(p.live_subscriptions(), 2);
    }

    #[test]
    fn same_event_does_not_complete_a_condition_twice() {
        let mut p = progress();
        assert_eq!(p.handle_event(ProgressEventKind::Talk, "Elder").len(), 1);
        assert!(p.handle_event(ProgressEventKind::Talk, "Elder").is_empty());
    }

    #[test]
    fn hidden_stage_met_early_completes_on_reveal() {
        let mut p = progress();
        assert!(p.handle_event(ProgressEventKind::Kill, "Wolf").is_empty());
        assert!(p.handle_event(ProgressEventKind::Kill, "Alpha").is_empty());
        assert!(!p.quests()[0].is_completed());

        let out = p.handle_event(ProgressEventKind::Talk, "Elder");
        assert_eq!(out.len(), 1);
        let view = quest_view(&out[0]);
        assert!(view.completed);
        assert_eq!(view.stages.len(), 2);
    }

    #[test]
    fn message_is_revealed_once_all_conditions_fire() {
        let mut p = progress();
        assert!(p.handle_event(ProgressEventKind::EnterArea, "east").is_empty());
        assert_eq!(p.visible_messages().count(), 0);

        let out = p.handle_event(ProgressEventKind::EnterArea, "west");
        assert_eq!(out.len(), 2);
        assert!(matches!(&out[0], ServerMessage::Dialog { title: Some(t), .. } if t == "Explorer"));
        assert!(matches!(&out[1], ServerMessage::LogUpdate { item: LogItem::Message(m) } if m.key == "explorer"));

        assert!(p.handle_event(ProgressEventKind::EnterArea, "west").is_empty());
        assert!(p.handle_event(ProgressEventKind::EnterArea, "east").is_empty());
        assert_eq!(p.visible_messages().count(), 1);
    }

    #[test]
    fn log_data_hides_unrevealed_messages() {
        let mut p = progress();
        let ServerMessage::LogData { quests, messages } = p.log_data() else {
            panic!("expected log data");
        };
        assert_eq!(quests.len(), 1);
        assert!(messages.is_empty());

        p.handle_event(ProgressEventKind::EnterArea, "east");
        p.handle_event(ProgressEventKind::EnterArea, "west");
        let ServerMessage::LogData { messages, .. } = p.log_data() else {
            panic!("expected log data");
        };
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut p = progress();
        p.handle_event(ProgressEventKind::EnterArea, "east");
        assert_eq!(p.live_subscriptions(), 4);

        assert_eq!(p.dispose(), 4);
        assert_eq!(p.dispose(), 0);
        assert!(p.is_disposed());
        assert_eq!(p.live_subscriptions(), 0);
        assert!(p.handle_event(ProgressEventKind::Talk, "Elder").is_empty());
    }
}
