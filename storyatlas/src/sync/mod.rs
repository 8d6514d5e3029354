//! Playback state synchronization.
//!
//! A controller broadcasts its playback decisions on a named channel; any
//! number of viewers listening on the same name mirror them. Delivery is
//! at-most-once and unordered: no acknowledgement, no replay for late
//! subscribers. A viewer applies the latest received message as
//! authoritative state and rejects local mutating controls, so the shared
//! viewport has a single writer by construction.
//!
//! Messages are JSON on the wire and carry a protocol version plus a
//! wall-clock timestamp; both exist so a future reconciliation scheme
//! (monotonic sequencing) can be layered on without a wire break.

mod local;
mod viewer;

pub use local::LocalSyncBus;
pub use viewer::ViewerSession;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;

use serde::{Deserialize, Serialize};

use crate::model::Segment;

/// Wire protocol version carried by every message.
pub const PROTOCOL_VERSION: u32 = 1;

/// Channel name for a map identifier.
pub fn channel_name(map_id: &str) -> String {
    format!("storymap-{map_id}")
}

/// Milliseconds since the Unix epoch, for message stamping.
fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A playback event broadcast from controller to viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SyncMessage {
    /// The controller rendered a segment.
    SegmentChange {
        version: u32,
        segment_index: usize,
        segment_id: String,
        /// Full segment payload so a viewer with a stale local copy can
        /// refresh it before rendering.
        segment: Option<Segment>,
        timestamp_ms: i64,
    },
    /// The controller started or paused automatic playback.
    PlayState {
        version: u32,
        is_playing: bool,
        timestamp_ms: i64,
    },
}

impl SyncMessage {
    pub fn segment_change(segment_index: usize, segment: &Segment) -> Self {
        SyncMessage::SegmentChange {
            version: PROTOCOL_VERSION,
            segment_index,
            segment_id: segment.id.clone(),
            segment: Some(segment.clone()),
            timestamp_ms: now_ms(),
        }
    }

    pub fn play_state(is_playing: bool) -> Self {
        SyncMessage::PlayState {
            version: PROTOCOL_VERSION,
            is_playing,
            timestamp_ms: now_ms(),
        }
    }
}

/// Errors from publishing on a sync channel.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The execution context has no usable channel transport. Callers
    /// degrade to standalone playback instead of failing.
    #[error("Sync channel unsupported: {0}")]
    Unsupported(String),

    #[error("Message encoding failed: {0}")]
    Codec(#[from] serde_json::Error),
}

/// A named, at-most-once, unordered publish/subscribe channel.
pub trait SyncChannel: Send + Sync {
    /// Broadcast a message to current subscribers of `name`.
    ///
    /// Publishing with no subscribers succeeds and delivers nothing.
    fn publish(&self, name: &str, message: &SyncMessage) -> Result<(), SyncError>;

    /// Subscribe to `name`. Messages published before this call are never
    /// replayed.
    fn subscribe(&self, name: &str) -> SyncSubscription;
}

/// Receiving end of a sync channel subscription.
///
/// Backed by a broadcast receiver of wire-encoded frames; a transport that
/// spans processes forwards its frames into the same shape.
pub struct SyncSubscription {
    inner: broadcast::Receiver<String>,
}

impl SyncSubscription {
    pub(crate) fn new(inner: broadcast::Receiver<String>) -> Self {
        Self { inner }
    }

    /// Next decoded message, or `None` once the channel is gone.
    ///
    /// Lagged frames are dropped (at-most-once delivery); undecodable
    /// frames are skipped with a warning.
    pub async fn recv(&mut self) -> Option<SyncMessage> {
        loop {
            match self.inner.recv().await {
                Ok(frame) => match serde_json::from_str(&frame) {
                    Ok(message) => return Some(message),
                    Err(e) => {
                        warn!(error = %e, "Dropping undecodable sync frame");
                    }
                },
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Sync subscriber lagged; messages lost");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
