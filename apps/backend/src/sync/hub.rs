//! In-process fan-out of session events.
//!
//! One broadcast channel per session. Publishing to a session nobody
//! listens to is a no-op; slow receivers see `Lagged` and must resync from
//! a snapshot, which they do anyway on every event.

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::sync::events::SyncEvent;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct SyncHub {
    channels: DashMap<String, broadcast::Sender<SyncEvent>>,
    capacity: usize,
}

impl SyncHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe(&self, session_id: &str) -> broadcast::Receiver<SyncEvent> {
        let sender = self
            .channels
            .entry(session_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        debug!(session_id, receivers = sender.receiver_count() + 1, "sync_subscribe");
        sender.subscribe()
    }

    /// Deliver `event` to the session's subscribers. Returns how many
    /// receivers got it.
    pub fn publish(&self, event: SyncEvent) -> usize {
        let Some(sender) = self.channels.get(event.session_id()) else {
            trace!(session_id = event.session_id(), "sync_publish_no_subscribers");
            return 0;
        };
        match sender.send(event) {
            Ok(n) => n,
            Err(_) => 0,
        }
    }

    pub fn subscriber_count(&self, session_id: &str) -> usize {
        self.channels
            .get(session_id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    /// Sessions with an open channel.
    pub fn session_count(&self) -> usize {
        self.channels.len()
    }

    /// Drop channels whose receivers are all gone.
    pub fn prune(&self) {
        self.channels.retain(|_, sender| sender.receiver_count() > 0);
    }
}

impl Default for SyncHub {
    fn default() -> Self {
        Self::new()
    }
}
