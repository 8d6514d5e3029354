//! In-process sync channel transport.

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use super::{SyncChannel, SyncError, SyncMessage, SyncSubscription};

/// Frames buffered per channel before old messages are dropped.
///
/// Small on purpose: the protocol is at-most-once and a lagging viewer is
/// expected to lose messages, matching the behavior of the browser-style
/// transports this bus stands in for.
const CHANNEL_CAPACITY: usize = 16;

/// In-process [`SyncChannel`] over per-name broadcast senders.
///
/// Controller and viewers in the same process share one bus instance;
/// each name maps to an independent broadcast channel. Frames are
/// JSON-encoded exactly as a cross-process transport would carry them.
pub struct LocalSyncBus {
    channels: DashMap<String, broadcast::Sender<String>>,
}

impl Default for LocalSyncBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSyncBus {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    fn sender(&self, name: &str) -> broadcast::Sender<String> {
        self.channels
            .entry(name.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl SyncChannel for LocalSyncBus {
    fn publish(&self, name: &str, message: &SyncMessage) -> Result<(), SyncError> {
        let frame = serde_json::to_string(message)?;
        // A send error only means no subscriber is currently listening;
        // at-most-once delivery makes that a non-event.
        if self.sender(name).send(frame).is_err() {
            debug!(channel = name, "Published with no subscribers");
        }
        Ok(())
    }

    fn subscribe(&self, name: &str) -> SyncSubscription {
        SyncSubscription::new(self.sender(name).subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = LocalSyncBus::new();
        let mut subscription = bus.subscribe("storymap-demo");
        bus.publish("storymap-demo", &SyncMessage::play_state(true))
            .unwrap();
        let message = subscription.recv().await.unwrap();
        assert!(matches!(
            message,
            SyncMessage::PlayState {
                is_playing: true,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_succeeds() {
        let bus = LocalSyncBus::new();
        assert!(bus
            .publish("storymap-empty", &SyncMessage::play_state(false))
            .is_ok());
    }

    #[tokio::test]
    async fn test_no_replay_for_late_subscribers() {
        let bus = LocalSyncBus::new();
        bus.publish("storymap-demo", &SyncMessage::play_state(true))
            .unwrap();
        let mut late = bus.subscribe("storymap-demo");
        bus.publish("storymap-demo", &SyncMessage::play_state(false))
            .unwrap();
        // Only the message published after subscription arrives.
        let message = late.recv().await.unwrap();
        assert!(matches!(
            message,
            SyncMessage::PlayState {
                is_playing: false,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_channels_are_isolated_by_name() {
        let bus = LocalSyncBus::new();
        let mut other = bus.subscribe("storymap-other");
        bus.publish("storymap-demo", &SyncMessage::play_state(true))
            .unwrap();
        bus.publish("storymap-other", &SyncMessage::play_state(false))
            .unwrap();
        let message = other.recv().await.unwrap();
        assert!(matches!(
            message,
            SyncMessage::PlayState {
                is_playing: false,
                ..
            }
        ));
    }
}
