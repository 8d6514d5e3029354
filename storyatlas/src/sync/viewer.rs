//! Viewer-side mirroring.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::playback::PlaybackHandle;

use super::{channel_name, SyncChannel, SyncMessage};

/// A task that drives a viewer-role playback daemon from received sync
/// messages.
///
/// The latest received message is authoritative: a `segment-change`
/// arriving while the viewer's own camera animation is mid-flight cancels
/// that motion and restarts toward the received state (a jump-cut, by
/// decision, rather than coalescing the two targets). Races between
/// unordered `play-state` and `segment-change` messages resolve to
/// whichever arrives last.
pub struct ViewerSession {
    task: JoinHandle<()>,
}

impl ViewerSession {
    /// Subscribe to the map's channel and start applying messages onto
    /// `playback` (which must have been spawned with the viewer role).
    pub fn attach(
        playback: PlaybackHandle,
        channel: Arc<dyn SyncChannel>,
        map_id: &str,
    ) -> Self {
        let name = channel_name(map_id);
        let mut subscription = channel.subscribe(&name);
        debug!(channel = %name, "Viewer session attached");

        let task = tokio::spawn(async move {
            while let Some(message) = subscription.recv().await {
                let applied = match message {
                    SyncMessage::SegmentChange {
                        segment_index,
                        segment,
                        ..
                    } => playback.apply_remote_segment(segment_index, segment).await,
                    SyncMessage::PlayState { is_playing, .. } => {
                        playback.apply_remote_play_state(is_playing).await
                    }
                };
                if let Err(e) = applied {
                    warn!(error = %e, "Failed to apply remote playback state");
                }
            }
            debug!("Viewer session channel closed");
        });

        Self { task }
    }

    /// Stop mirroring. The viewer keeps whatever state it last applied.
    pub fn detach(self) {
        self.task.abort();
    }
}
