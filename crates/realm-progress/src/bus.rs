//! Publish/subscribe registry keyed by progress event kind.
//!
//! Each live condition holds exactly one [`SubscriptionHandle`]. Unsubscribing
//! is idempotent: a second call with the same handle is a no-op that
//! returns `false`.

use std::collections::BTreeMap;

use realm_types::ProgressEventKind;

/// Identifies one subscription on an [`EventBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionHandle {
    kind: ProgressEventKind,
    id: u64,
}

impl SubscriptionHandle {
    /// The event kind this subscription listens to.
    pub const fn kind(self) -> ProgressEventKind {
        self.kind
    }
}

/// Subscribers grouped by the event kind they listen to.
///
/// `T` is whatever the subscriber needs to be found again when an event is
/// published, typically an address into the owner's data.
#[derive(Debug, Clone)]
pub struct EventBus<T> {
    next_id: u64,
    subscribers: BTreeMap<ProgressEventKind, Vec<(u64, T)>>,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            subscribers: BTreeMap::new(),
        }
    }
}

impl<T: Clone> EventBus<T> {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `subscriber` to events of `kind`.
    pub fn subscribe(&mut self, kind: ProgressEventKind, subscriber: T) -> SubscriptionHandle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.subscribers.entry(kind).or_default().push((id, subscriber));
        SubscriptionHandle { kind, id }
    }

    /// Remove a subscription. Returns whether it was still registered.
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        let Some(list) = self.subscribers.get_mut(&handle.kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(id, _)| *id != handle.id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.subscribers.remove(&handle.kind);
        }
        removed
    }

    /// Snapshot of the subscribers for `kind`, in subscription order.
    ///
    /// The snapshot is detached from the bus, so subscribers may
    /// unsubscribe while it is being walked.
    pub fn publish(&self, kind: ProgressEventKind) -> Vec<(SubscriptionHandle, T)> {
        self.subscribers
            .get(&kind)
            .map(|list| {
                list.iter()
                    .map(|(id, subscriber)| (SubscriptionHandle { kind, id: *id }, subscriber.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether a subscription is still registered.
    pub fn is_subscribed(&self, handle: SubscriptionHandle) -> bool {
        self.subscribers
            .get(&handle.kind)
            .is_some_and(|list| list.iter().any(|(id, _)| *id == handle.id))
    }

    /// Total number of live subscriptions.
    pub fn len(&self) -> usize {
        self.subscribers.values().map(Vec::len).sum()
    }

    /// Whether no subscriptions remain.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
