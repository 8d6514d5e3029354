//! Playback state machine types, commands, and status snapshots.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::model::{Segment, StoryMapDocument};

/// Which entity is allowed to mutate playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackRole {
    /// Local control, no broadcasting.
    Standalone,
    /// Local control; every decision is published on the sync channel.
    Controller,
    /// No local control; state is driven by received sync messages only.
    Viewer,
}

/// The playback state machine.
///
/// The active index is always in `[0, segment_count)` while a segment is on
/// screen; `Stopped` is the special no-index state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    /// A segment is on screen and automatic advance is armed (or, for a
    /// viewer, mirrored as running).
    Playing { index: usize },
    /// A segment is on screen and advance is gated on
    /// `continue_after_user_action`.
    WaitingForUserAction { index: usize },
    /// A segment is on screen with no automatic advance (user-stepped).
    Paused { index: usize },
}

impl PlaybackState {
    /// Index of the segment on screen, `None` when stopped.
    pub fn index(&self) -> Option<usize> {
        match self {
            PlaybackState::Stopped => None,
            PlaybackState::Playing { index }
            | PlaybackState::WaitingForUserAction { index }
            | PlaybackState::Paused { index } => Some(*index),
        }
    }

    /// Whether automatic playback is running.
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing { .. })
    }
}

/// Point-in-time snapshot published on the status watch channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub segment_count: usize,
    /// Monotonic segment-activation counter; bumps on every index change.
    pub epoch: u64,
    /// Whether a routes-only demonstration is suspending automatic advance.
    pub routes_only_active: bool,
}

impl PlaybackStatus {
    pub fn active_index(&self) -> Option<usize> {
        self.state.index()
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self {
            state: PlaybackState::Stopped,
            segment_count: 0,
            epoch: 0,
            routes_only_active: false,
        }
    }
}

/// Errors surfaced to callers of the playback handle.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Local playback controls are disabled while under remote control")]
    ViewerControlled,

    #[error("Segment index {index} out of range ({count} segments)")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Unknown segment '{0}'")]
    UnknownSegment(String),

    #[error("Not waiting for a user action")]
    NotWaiting,

    #[error("There are no segments to play")]
    NoSegments,

    #[error("Playback engine has shut down")]
    Closed,
}

/// Commands accepted by the playback daemon.
#[derive(Debug)]
pub(crate) enum Command {
    Start { from_index: Option<usize> },
    Stop,
    GoTo { index: usize },
    ContinueAfterUserAction,
    SetPlaying { playing: bool },
    PlayRoutesOnly { segment_id: String },
    Refresh { document: StoryMapDocument },
    ApplyRemoteSegment { index: usize, segment: Option<Segment> },
    ApplyRemotePlayState { playing: bool },
    /// Internal: a routes-only demonstration finished.
    RoutesOnlyFinished { epoch: u64 },
}

/// A command plus its optional reply slot.
pub(crate) struct Envelope {
    pub command: Command,
    pub reply: Option<oneshot::Sender<Result<(), PlaybackError>>>,
}
