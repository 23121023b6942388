//! Event-triggered conditions gating progress items.
//!
//! A condition is live (subscribed) exactly while it is not done. The
//! transition to done happens once: the condition unsubscribes first and
//! only then reports, so the same event cannot complete it twice.

use realm_types::{ConditionView, ProgressEventKind};

use crate::bus::{EventBus, SubscriptionHandle};
use crate::story::ConditionTemplate;

/// A single `(event kind, expected value)` predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressCondition {
    kind: ProgressEventKind,
    target: String,
    text: String,
    done: bool,
    subscription: Option<SubscriptionHandle>,
}

impl ProgressCondition {
    /// Build a condition from its template and subscribe it on `bus`.
    pub fn subscribe<T: Clone>(template: &ConditionTemplate, bus: &mut EventBus<T>, address: T) -> Self {
        let subscription = bus.subscribe(template.kind, address);
        Self {
            kind: template.kind,
            target: template.target.clone(),
            text: template.text.clone(),
            done: false,
            subscription: Some(subscription),
        }
    }

    /// The event kind this condition waits for.
    pub const fn kind(&self) -> ProgressEventKind {
        self.kind
    }

    /// Whether the condition has been met.
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Whether the condition still holds a subscription.
    pub const fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Whether an event value satisfies this condition.
    pub fn matches(&self, value: &str) -> bool {
        !self.done && self.target == value
    }

    /// Mark the condition done, unsubscribing it first. Returns `false` if
    /// it was already done, in which case nothing changes.
    pub fn complete<T: Clone>(&mut self, bus: &mut EventBus<T>) -> bool {
        if self.done {
            return false;
        }
        self.dispose(bus);
        self.done = true;
        true
    }

    /// Drop the subscription. Returns whether a subscription was dropped;
    /// calling it again is a no-op.
    pub fn dispose<T: Clone>(&mut self, bus: &mut EventBus<T>) -> bool {
        self.subscription
            .take()
            .is_some_and(|handle| bus.unsubscribe(handle))
    }

    /// Client-visible form.
    pub fn view(&self) -> ConditionView {
        ConditionView {
            text: self.text.clone(),
            done: self.done,
        }
    }
}
