//! Quests and their stages.
//!
//! Stages are revealed in order. The first stage is shown from the start;
//! each later stage is shown once its predecessor completes. Conditions of
//! hidden stages stay subscribed and may be met early; such a stage
//! completes the moment it is revealed.

use realm_types::{LogItem, QuestStageView, QuestView, ServerMessage};
use tracing::debug;

use crate::bus::EventBus;
use crate::condition::ProgressCondition;
use crate::progress::ConditionRef;
use crate::story::{QuestTemplate, StageTemplate};

/// One stage of a quest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestStage {
    key: String,
    text: String,
    conditions: Vec<ProgressCondition>,
    show: bool,
    done: bool,
}

impl QuestStage {
    fn new(template: &StageTemplate, quest: usize, stage: usize, bus: &mut EventBus<ConditionRef>) -> Self {
        let conditions = template
            .conditions
            .iter()
            .enumerate()
            .map(|(condition, c)| {
                ProgressCondition::subscribe(c, bus, ConditionRef::Stage { quest, stage, condition })
            })
            .collect();
        Self {
            key: template.key.clone(),
            text: template.text.clone(),
            conditions,
            show: stage == 0,
            done: false,
        }
    }

    /// Stage key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the stage is visible in the log.
    pub const fn is_shown(&self) -> bool {
        self.show
    }

    /// Whether the stage has completed.
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// The stage's conditions.
    pub fn conditions(&self) -> &[ProgressCondition] {
        &self.conditions
    }

    fn all_conditions_done(&self) -> bool {
        self.conditions.iter().all(ProgressCondition::is_done)
    }

    /// Client-visible form.
    pub fn view(&self) -> QuestStageView {
        QuestStageView {
            key: self.key.clone(),
            text: self.text.clone(),
            conditions: self.conditions.iter().map(ProgressCondition::view).collect(),
        }
    }
}

/// A quest tracked for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quest {
    key: String,
    title: String,
    text: String,
    stages: Vec<QuestStage>,
    completed: bool,
}

impl Quest {
    pub(crate) fn new(template: &QuestTemplate, quest: usize, bus: &mut EventBus<ConditionRef>) -> Self {
        let stages = template
            .stages
            .iter()
            .enumerate()
            .map(|(stage, s)| QuestStage::new(s, quest, stage, bus))
            .collect();
        let mut quest = Self {
            key: template.key.clone(),
            title: template.title.clone(),
            text: template.text.clone(),
            stages,
            completed: false,
        };
        // A first stage without conditions is complete from the start.
        quest.advance();
        quest
    }

    /// Quest key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the last stage has completed.
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// All stages, shown or not.
    pub fn stages(&self) -> &[QuestStage] {
        &self.stages
    }

    pub(crate) fn condition_mut(&mut self, stage: usize, condition: usize) -> Option<&mut ProgressCondition> {
        self.stages
            .get_mut(stage)
            .and_then(|s| s.conditions.get_mut(condition))
    }

    /// React to a condition of `stage` having been met.
    pub(crate) fn condition_done(&mut self, stage: usize) -> Vec<ServerMessage> {
        let Some(current) = self.stages.get(stage) else {
            return Vec::new();
        };
        if !current.show {
            // Met ahead of time; takes effect when the stage is revealed.
            return Vec::new();
        }
        if current.all_conditions_done() {
            let key = current.key.clone();
            self.stage_done(&key);
        }
        vec![self.log_update()]
    }

    /// Complete the stage with `key` and cascade through any following
    /// stages whose conditions were already met.
    fn stage_done(&mut self, key: &str) {
        let Some(index) = self.stages.iter().position(|s| s.key == key) else {
            return;
        };
        if let Some(stage) = self.stages.get_mut(index) {
            stage.done = true;
        }
        debug!(quest = %self.key, stage = %key, "quest stage done");
        match self.stages.get_mut(index.saturating_add(1)) {
            Some(next) => next.show = true,
            None => {
                self.completed = true;
                debug!(quest = %self.key, "quest completed");
            }
        }
        self.advance();
    }

    fn advance(&mut self) {
        let ready = self
            .stages
            .iter()
            .find(|s| s.show && !s.done && s.all_conditions_done())
            .map(|s| s.key.clone());
        if let Some(key) = ready {
            self.stage_done(&key);
        }
    }

    pub(crate) fn dispose(&mut self, bus: &mut EventBus<ConditionRef>) -> usize {
        let mut released = 0_usize;
        for condition in self.stages.iter_mut().flat_map(|s| s.conditions.iter_mut()) {
            if condition.dispose(bus) {
                released = released.saturating_add(1);
            }
        }
        released
    }

    /// Client-visible form, listing only shown stages.
    pub fn view(&self) -> QuestView {
        QuestView {
            key: self.key.clone(),
            title: self.title.clone(),
            text: self.text.clone(),
            stages: self
                .stages
                .iter()
                .filter(|s| s.show)
                .map(QuestStage::view)
                .collect(),
            completed: self.completed,
        }
    }

    fn log_update(&self) -> ServerMessage {
        ServerMessage::LogUpdate {
            item: LogItem::Quest(self.view()),
        }
    }
}
