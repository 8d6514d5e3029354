//! Playback control.
//!
//! The playback controller owns the active segment index, the
//! play/pause/waiting state, and the timers that schedule automatic
//! advance. On every segment change it invokes the geometry renderer, the
//! camera controller, and the layer transition manager in a fixed order,
//! and, when this instance holds the controller role, publishes its
//! decisions on the sync channel.
//!
//! # Example
//!
//! ```ignore
//! use storyatlas::playback::{PlaybackDaemon, PlaybackRole};
//!
//! let (playback, _join) = PlaybackDaemon::spawn(
//!     "city-tour",
//!     PlaybackRole::Standalone,
//!     EngineConfig::default(),
//!     source,
//!     surface,
//!     layers,
//!     None,
//! );
//!
//! playback.start(None).await?;
//! playback.go_to(2).await?;
//! playback.stop().await?;
//! ```

mod daemon;
mod state;

pub use daemon::{PlaybackDaemon, PlaybackHandle};
pub use state::{PlaybackError, PlaybackRole, PlaybackState, PlaybackStatus};
