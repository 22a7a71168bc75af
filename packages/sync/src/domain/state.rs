//! Per-feed state: the bounded collection and the connection phase.

use super::{event::LiveEvent, item::FeedItem};

/// Connection phase of a subscription's stream.
///
/// `Idle -> Connecting -> Connected -> Disconnected`, with
/// `Connecting -> Disconnected` on a failed open. `Disconnected` is terminal;
/// reconnecting means subscribing again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionPhase {
    #[default]
    Idle,
    Connecting,
    Connected,
    Disconnected,
}

/// Bounded, most-recent-first collection of one feed plus its connectivity.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState<T> {
    items: Vec<T>,
    capacity: usize,
    phase: ConnectionPhase,
    last_error: Option<String>,
    last_updated: Option<i64>,
}

impl<T: FeedItem> FeedState<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
            phase: ConnectionPhase::Idle,
            last_error: None,
            last_updated: None,
        }
    }

    /// Items, most recent first
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// True exactly while the stream is open
    pub fn is_connected(&self) -> bool {
        self.phase == ConnectionPhase::Connected
    }

    /// Message of the most recent failed snapshot fetch, cleared by the next
    /// successful one
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Time of the last applied snapshot (Unix ms)
    pub fn last_updated(&self) -> Option<i64> {
        self.last_updated
    }

    /// `Idle -> Connecting`. Returns whether the transition happened.
    pub fn begin_connect(&mut self) -> bool {
        self.transition(ConnectionPhase::Idle, ConnectionPhase::Connecting)
    }

    /// `Connecting -> Connected`. Returns whether the transition happened.
    pub fn mark_open(&mut self) -> bool {
        self.transition(ConnectionPhase::Connecting, ConnectionPhase::Connected)
    }

    /// `Connecting | Connected -> Disconnected`. Returns whether the
    /// transition happened.
    pub fn mark_closed(&mut self) -> bool {
        match self.phase {
            ConnectionPhase::Connecting | ConnectionPhase::Connected => {
                self.phase = ConnectionPhase::Disconnected;
                true
            }
            ConnectionPhase::Idle | ConnectionPhase::Disconnected => false,
        }
    }

    fn transition(&mut self, from: ConnectionPhase, to: ConnectionPhase) -> bool {
        if self.phase != from {
            return false;
        }
        self.phase = to;
        true
    }

    /// Replace the collection with a fetched snapshot, whatever the phase.
    pub fn replace_snapshot(&mut self, mut items: Vec<T>, now_millis: i64) {
        items.truncate(self.capacity);
        self.items = items;
        self.last_error = None;
        self.last_updated = Some(now_millis);
    }

    /// Remember a failed snapshot fetch. Items are kept.
    pub fn record_fetch_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    /// Apply a live event. Ignored unless the stream is open.
    ///
    /// Returns whether the collection changed.
    pub fn apply(&mut self, event: LiveEvent<T>) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.apply_event(event)
    }

    fn apply_event(&mut self, event: LiveEvent<T>) -> bool {
        match event {
            LiveEvent::Item(item) => {
                self.prepend(vec![item]);
                true
            }
            LiveEvent::Batch(items) => {
                if items.is_empty() {
                    return false;
                }
                self.prepend(items);
                true
            }
            LiveEvent::Remove(probe) => {
                match self.items.iter().position(|i| i.matches_removal(&probe)) {
                    Some(index) => {
                        self.items.remove(index);
                        true
                    }
                    None => false,
                }
            }
            LiveEvent::Sequence(events) => events
                .into_iter()
                .fold(false, |changed, e| self.apply_event(e) || changed),
        }
    }

    fn prepend(&mut self, items: Vec<T>) {
        self.items.splice(0..0, items);
        self.items.truncate(self.capacity);
    }
}
