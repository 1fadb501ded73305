//! Subscriptions to list events.
//!
//! A subscriber either hears every event or only events of one
//! [`EventKind`]. Callbacks run synchronously, in subscription order.

use crate::event::ListEvent;
use std::collections::BTreeMap;

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback type for list events.
pub type EventCallback = Box<dyn Fn(&ListEvent)>;

/// The kinds of [`ListEvent`], for selective subscriptions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Records,
    Selection,
    Filter,
    Sorter,
    Warning,
}

impl EventKind {
    pub fn of(event: &ListEvent) -> Self {
        match event {
            ListEvent::RecordsChanged { .. } => EventKind::Records,
            ListEvent::SelectionChanged { .. } => EventKind::Selection,
            ListEvent::FilterChanged { .. } => EventKind::Filter,
            ListEvent::SorterChanged { .. } => EventKind::Sorter,
            ListEvent::Warning(_) => EventKind::Warning,
        }
    }
}

/// One subscriber.
pub struct Subscription {
    id: SubscriptionId,
    kind: Option<EventKind>,
    callback: EventCallback,
    active: bool,
}

impl Subscription {
    /// Creates a subscription to every event, or to one kind.
    pub fn new<F>(id: SubscriptionId, kind: Option<EventKind>, callback: F) -> Self
    where
        F: Fn(&ListEvent) + 'static,
    {
        Self {
            id,
            kind,
            callback: Box::new(callback),
            active: true,
        }
    }

    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Stops delivery without removing the subscription.
    #[inline]
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Returns true if this subscription wants `event`.
    pub fn wants(&self, event: &ListEvent) -> bool {
        self.active && self.kind.map_or(true, |kind| kind == EventKind::of(event))
    }

    /// Delivers `event` if wanted.
    pub fn notify(&self, event: &ListEvent) {
        if self.wants(event) {
            (self.callback)(event);
        }
    }
}

/// Subscribers of one list.
pub struct SubscriptionManager {
    subscriptions: BTreeMap<SubscriptionId, Subscription>,
    next_id: SubscriptionId,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self {
            subscriptions: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Subscribes to every event.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&ListEvent) + 'static,
    {
        self.insert(None, callback)
    }

    /// Subscribes to events of one kind.
    pub fn subscribe_to<F>(&mut self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&ListEvent) + 'static,
    {
        self.insert(Some(kind), callback)
    }

    fn insert<F>(&mut self, kind: Option<EventKind>, callback: F) -> SubscriptionId
    where
        F: Fn(&ListEvent) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.subscriptions.insert(id, Subscription::new(id, kind, callback));
        id
    }

    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Pauses or resumes one subscription.
    pub fn set_active(&mut self, id: SubscriptionId, active: bool) -> bool {
        match self.subscriptions.get_mut(&id) {
            Some(sub) => {
                sub.active = active;
                true
            }
            None => false,
        }
    }

    /// Delivers `event` to every interested subscriber.
    pub fn notify_all(&self, event: &ListEvent) {
        for sub in self.subscriptions.values() {
            sub.notify(event);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn selection(object: u64) -> ListEvent {
        ListEvent::SelectionChanged {
            index: Some(0),
            object: Some(object),
        }
    }

    #[test]
    fn test_subscription_manager_subscribe() {
        let mut manager = SubscriptionManager::new();
        assert_eq!(manager.subscribe(|_| {}), 1);
        assert_eq!(manager.subscribe_to(EventKind::Records, |_| {}), 2);
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_subscription_manager_unsubscribe() {
        let mut manager = SubscriptionManager::new();
        let id = manager.subscribe(|_| {});
        assert!(manager.unsubscribe(id));
        assert!(!manager.unsubscribe(id));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_subscription_kind_filter() {
        let mut manager = SubscriptionManager::new();
        let all = Rc::new(RefCell::new(0));
        let filtered = Rc::new(RefCell::new(0));
        let all_clone = all.clone();
        let filtered_clone = filtered.clone();

        manager.subscribe(move |_| *all_clone.borrow_mut() += 1);
        manager.subscribe_to(EventKind::Filter, move |_| *filtered_clone.borrow_mut() += 1);

        manager.notify_all(&selection(7));
        manager.notify_all(&ListEvent::FilterChanged { description: None });

        assert_eq!(*all.borrow(), 2);
        assert_eq!(*filtered.borrow(), 1);
    }

    #[test]
    fn test_subscription_paused() {
        let mut manager = SubscriptionManager::new();
        let count = Rc::new(RefCell::new(0));
        let count_clone = count.clone();
        let id = manager.subscribe(move |_| *count_clone.borrow_mut() += 1);

        assert!(manager.set_active(id, false));
        manager.notify_all(&selection(1));
        assert!(manager.set_active(id, true));
        manager.notify_all(&selection(1));

        assert_eq!(*count.borrow(), 1);
        assert!(!manager.set_active(99, true));
    }

    #[test]
    fn test_event_kind_of() {
        assert_eq!(EventKind::of(&selection(1)), EventKind::Selection);
        assert_eq!(
            EventKind::of(&ListEvent::SorterChanged { name: None }),
            EventKind::Sorter
        );
    }
}
