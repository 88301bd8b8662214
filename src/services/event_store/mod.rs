// Event store
// In-memory cache of the displayed week's events, rebuilt on every week load

use serde_json::Value;
use std::collections::HashMap;

use crate::models::event::{EventDto, ViewerContext};

/// What changed in the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    Replaced { count: usize },
    Upserted(i64),
    Removed(i64),
    CurrentChanged(Option<i64>),
}

pub type SubscriptionId = u64;

type Subscriber = Box<dyn Fn(&StoreChange)>;

pub struct EventStore {
    events: HashMap<i64, EventDto>,
    current_event: Option<EventDto>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: SubscriptionId,
    viewer: ViewerContext,
}

impl EventStore {
    pub fn new(viewer: ViewerContext) -> Self {
        Self {
            events: HashMap::new(),
            current_event: None,
            subscribers: Vec::new(),
            next_subscription: 1,
            viewer,
        }
    }

    pub fn viewer(&self) -> ViewerContext {
        self.viewer
    }

    /// Normalize a raw server record against the current viewer.
    pub fn normalize(&self, raw: &Value) -> EventDto {
        EventDto::from_value(raw, self.viewer, None)
    }

    /// Replace the whole cache.
    pub fn set_events(&mut self, events: Vec<EventDto>) {
        self.events.clear();
        for event in events {
            match event.id {
                Some(id) => {
                    self.events.insert(id, event);
                }
                None => log::warn!("Skipping event without id on {} {}", event.date, event.time),
            }
        }

        let change = StoreChange::Replaced {
            count: self.events.len(),
        };
        self.notify(&change);
    }

    /// Insert or replace a single event. Events without an id are not cached.
    pub fn set_event(&mut self, event: EventDto) -> Option<i64> {
        let id = event.id?;
        self.events.insert(id, event);
        self.notify(&StoreChange::Upserted(id));
        Some(id)
    }

    pub fn remove_event(&mut self, id: i64) -> Option<EventDto> {
        let removed = self.events.remove(&id);

        if self.current_event.as_ref().and_then(|e| e.id) == Some(id) {
            self.current_event = None;
            self.notify(&StoreChange::CurrentChanged(None));
        }

        self.notify(&StoreChange::Removed(id));
        removed
    }

    /// Event being edited or viewed; stored as a copy.
    pub fn set_current_event(&mut self, event: Option<&EventDto>) {
        self.current_event = event.cloned();
        let id = self.current_event.as_ref().and_then(|e| e.id);
        self.notify(&StoreChange::CurrentChanged(id));
    }

    pub fn current_event(&self) -> Option<&EventDto> {
        self.current_event.as_ref()
    }

    pub fn get_event(&self, id: i64) -> Option<&EventDto> {
        self.events.get(&id)
    }

    /// All cached events ordered by date, then time.
    pub fn all_events(&self) -> Vec<&EventDto> {
        let mut events: Vec<&EventDto> = self.events.values().collect();
        events.sort_by(|a, b| {
            (a.date.as_str(), a.hours(), a.minutes(), a.id).cmp(&(b.date.as_str(), b.hours(), b.minutes(), b.id))
        });
        events
    }

    pub fn events_by_series(&self, series_id: &str) -> Vec<&EventDto> {
        self.all_events()
            .into_iter()
            .filter(|event| event.series_id.as_deref() == Some(series_id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn subscribe(&mut self, callback: impl Fn(&StoreChange) + 'static) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    fn notify(&self, change: &StoreChange) {
        for (_, callback) in &self.subscribers {
            callback(change);
        }
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(ViewerContext::default())
    }
}
