//! Broadcast event channels for discovery and enumeration notifications.
//!
//! Every observable signal in this crate (device discovered, device updated,
//! name resolved, device expired, enumeration refreshed) is its own
//! independently subscribable channel, so a consumer interested only in
//! expirations never sees discovery traffic.

use tokio::sync::broadcast;

/// Default buffered capacity of an event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Receiver half of an event channel.
pub type EventReceiver<T> = broadcast::Receiver<T>;

/// Fan-out channel for one kind of event.
///
/// Cloning the channel clones the sending half; all clones feed the same
/// subscribers. Dropping a receiver unsubscribes it. A subscriber that
/// falls more than the channel capacity behind misses the oldest events.
#[derive(Debug)]
pub struct EventChannel<T> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone> EventChannel<T> {
    /// Create a new event channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events sent from this point on.
    pub fn subscribe(&self) -> EventReceiver<T> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers.
    pub fn send(&self, event: T) {
        // Ignore error if no receivers
        let _ = self.sender.send(event);
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone> Clone for EventChannel<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: Clone> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
