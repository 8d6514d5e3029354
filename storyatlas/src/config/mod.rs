//! Engine configuration.
//!
//! `EngineConfig` combines the tunables of every playback component. Each
//! component config carries documented defaults and builder-style setters;
//! [`ConfigFile`](crate::config::ConfigFile) can override them from an INI
//! file in the platform config directory.

mod file;

pub use file::ConfigFile;

use std::time::Duration;

/// Default cross-fade duration when no transition record supplies one.
pub const DEFAULT_CROSSFADE_MS: u64 = 800;

/// Duration of the shortened fade applied to same-segment data refreshes.
pub const DEFAULT_QUICK_UPDATE_MS: u64 = 150;

/// Opacity/route tick interval. 33 ms ≈ 30 frames per second, smooth enough
/// for fades while keeping timer churn low on the cooperative scheduler.
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 33;

/// Delay before retrying a due advance when the map surface is not attached.
pub const DEFAULT_SURFACE_RETRY_MS: u64 = 250;

/// Zoom delta beyond which a fly motion becomes two-phase.
pub const DEFAULT_FLY_ZOOM_THRESHOLD: f64 = 2.0;

/// Zoom levels to rise above the lower of current/target during phase 1.
pub const DEFAULT_FLY_RISE: f64 = 2.0;

/// Configuration for the playback controller daemon.
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Retry delay when an advance is due but the surface is not ready.
    pub surface_retry: Duration,
    /// Command channel capacity.
    pub channel_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            surface_retry: Duration::from_millis(DEFAULT_SURFACE_RETRY_MS),
            channel_capacity: 64,
        }
    }
}

impl PlaybackConfig {
    /// Set the surface-not-ready retry delay.
    pub fn with_surface_retry(mut self, retry: Duration) -> Self {
        self.surface_retry = retry;
        self
    }
}

/// Configuration for layer cross-fades.
#[derive(Debug, Clone)]
pub struct FadeConfig {
    /// Full cross-fade duration when the transition record has none.
    pub crossfade: Duration,
    /// Shortened duration for same-segment quick updates.
    pub quick_update: Duration,
    /// Opacity tick interval.
    pub frame_interval: Duration,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            crossfade: Duration::from_millis(DEFAULT_CROSSFADE_MS),
            quick_update: Duration::from_millis(DEFAULT_QUICK_UPDATE_MS),
            frame_interval: Duration::from_millis(DEFAULT_FRAME_INTERVAL_MS),
        }
    }
}

impl FadeConfig {
    /// Set the full cross-fade duration.
    pub fn with_crossfade(mut self, duration: Duration) -> Self {
        self.crossfade = duration;
        self
    }

    /// Set the quick-update duration.
    pub fn with_quick_update(mut self, duration: Duration) -> Self {
        self.quick_update = duration;
        self
    }
}

/// Configuration for camera motion.
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Zoom delta beyond which a fly motion uses two phases.
    pub fly_zoom_threshold: f64,
    /// Zoom levels risen above `min(current, target)` during phase 1.
    pub fly_rise: f64,
    /// Phase-1 (rise) duration.
    pub fly_phase1: Duration,
    /// Phase-2 (descend) duration.
    pub fly_phase2: Duration,
    /// Default single-motion duration when the transition record has none.
    pub ease_duration: Duration,
    /// Padding ratio applied to auto-fit bounds.
    pub fit_padding_ratio: f64,
    /// Zoom ceiling applied to auto-fit.
    pub fit_max_zoom: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fly_zoom_threshold: DEFAULT_FLY_ZOOM_THRESHOLD,
            fly_rise: DEFAULT_FLY_RISE,
            fly_phase1: Duration::from_millis(600),
            fly_phase2: Duration::from_millis(1400),
            ease_duration: Duration::from_millis(1000),
            fit_padding_ratio: 0.15,
            fit_max_zoom: 17.0,
        }
    }
}

impl CameraConfig {
    /// Set the two-phase fly threshold.
    pub fn with_fly_zoom_threshold(mut self, threshold: f64) -> Self {
        self.fly_zoom_threshold = threshold;
        self
    }

    /// Set the auto-fit zoom ceiling.
    pub fn with_fit_max_zoom(mut self, max_zoom: f64) -> Self {
        self.fit_max_zoom = max_zoom;
        self
    }
}

/// Configuration for route draw-in animation.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    /// Path-extension tick interval.
    pub frame_interval: Duration,
    /// Draw-in duration for routes that do not author one.
    pub default_draw_duration: Duration,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(40),
            default_draw_duration: Duration::from_millis(2000),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub playback: PlaybackConfig,
    pub fade: FadeConfig,
    pub camera: CameraConfig,
    pub route: RouteConfig,
}

impl EngineConfig {
    /// Configuration with every component at its documented default.
    pub fn new() -> Self {
        Self::default()
    }
}
