//! Camera motion.
//!
//! Owns viewport movement between poses, never what is drawn. Strategies:
//!
//! - `Instant`: jump, no intermediate frames
//! - `Linear` / `Eased`: one continuous motion over a duration
//! - `Fly`: a two-phase illusion of depth, rising to an intermediate zoom
//!   and then descending to the true target, which disguises content
//!   swapping underneath
//!
//! The fly is an explicit sub-machine (`Rising → Descending → Settled`)
//! guarded by a `CancellationToken` per flight: starting any new motion
//! cancels a pending descent instead of queueing behind it, so restart and
//! stop mid-flight are well-defined.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::CameraConfig;
use crate::geo::{CameraPose, GeoBounds, MIN_ZOOM};
use crate::surface::{FitOptions, MapSurface};

/// How the viewport travels to its target pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraStrategy {
    Instant,
    Linear,
    Eased,
    Fly,
}

impl Default for CameraStrategy {
    fn default() -> Self {
        CameraStrategy::Eased
    }
}

/// Where a fly motion currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlyPhase {
    /// Phase 1: easing out to the intermediate zoom.
    Rising,
    /// Phase 2: easing in to the true target.
    Descending,
    /// Motion complete (or the flight collapsed to a single ease).
    Settled,
}

struct ActiveFlight {
    token: CancellationToken,
    phase: Arc<Mutex<FlyPhase>>,
}

/// Moves the map viewport between poses using a selected strategy.
pub struct CameraController {
    surface: Arc<dyn MapSurface>,
    config: CameraConfig,
    active: Mutex<Option<ActiveFlight>>,
}

impl CameraController {
    pub fn new(surface: Arc<dyn MapSurface>, config: CameraConfig) -> Self {
        Self {
            surface,
            config,
            active: Mutex::new(None),
        }
    }

    /// Move the viewport to `target`.
    ///
    /// `duration` overrides the configured default for the continuous part
    /// of the motion (the descent, for a fly). `has_content` reports whether
    /// the map currently shows rendered drawables; a fly with content always
    /// goes two-phase so the swap underneath is disguised.
    pub fn move_to(
        &self,
        target: CameraPose,
        strategy: CameraStrategy,
        duration: Option<Duration>,
        has_content: bool,
    ) {
        let (token, phase) = self.begin_motion();
        match strategy {
            CameraStrategy::Instant => {
                *phase.lock() = FlyPhase::Settled;
                self.surface.jump_to(target);
            }
            CameraStrategy::Linear | CameraStrategy::Eased => {
                *phase.lock() = FlyPhase::Settled;
                self.surface
                    .ease_to(target, duration.unwrap_or(self.config.ease_duration));
            }
            CameraStrategy::Fly => self.fly(target, duration, has_content, token, phase),
        }
    }

    /// Fit the viewport to rendered bounds when no pose is authored.
    ///
    /// Cancels any in-flight motion. With no bounds either (empty segment)
    /// the viewport stays put; diagnostic only.
    pub fn auto_fit(&self, bounds: Option<GeoBounds>) {
        let (_token, phase) = self.begin_motion();
        *phase.lock() = FlyPhase::Settled;
        match bounds {
            Some(bounds) => self.surface.fit_bounds(
                bounds,
                FitOptions {
                    padding_ratio: self.config.fit_padding_ratio,
                    max_zoom: self.config.fit_max_zoom,
                },
            ),
            None => debug!("No authored pose and no rendered bounds; leaving viewport unchanged"),
        }
    }

    /// Cancel the active motion, if any. A pending fly descent never fires.
    pub fn cancel(&self) {
        if let Some(flight) = self.active.lock().take() {
            flight.token.cancel();
        }
    }

    /// Phase of the most recent motion, for diagnostics and tests.
    pub fn phase(&self) -> Option<FlyPhase> {
        self.active.lock().as_ref().map(|f| *f.phase.lock())
    }

    /// Cancel the previous motion and register a fresh flight slot.
    fn begin_motion(&self) -> (CancellationToken, Arc<Mutex<FlyPhase>>) {
        let token = CancellationToken::new();
        let phase = Arc::new(Mutex::new(FlyPhase::Settled));
        let previous = self.active.lock().replace(ActiveFlight {
            token: token.clone(),
            phase: phase.clone(),
        });
        if let Some(flight) = previous {
            flight.token.cancel();
        }
        (token, phase)
    }

    fn fly(
        &self,
        target: CameraPose,
        duration: Option<Duration>,
        has_content: bool,
        token: CancellationToken,
        phase: Arc<Mutex<FlyPhase>>,
    ) {
        let descend = duration.unwrap_or(self.config.fly_phase2);
        let current = self.surface.current_pose();

        let two_phase = match current {
            Some(pose) => {
                (pose.zoom - target.zoom).abs() > self.config.fly_zoom_threshold || has_content
            }
            None => false,
        };
        if !two_phase {
            *phase.lock() = FlyPhase::Settled;
            self.surface.ease_to(target, descend);
            return;
        }

        let current = current.unwrap_or(target);
        let intermediate_zoom = (current.zoom.min(target.zoom) - self.config.fly_rise).max(MIN_ZOOM);
        let intermediate = CameraPose::new(target.center, intermediate_zoom);
        let rise = self.config.fly_phase1;

        *phase.lock() = FlyPhase::Rising;
        self.surface.ease_to(intermediate, rise);
        debug!(%intermediate, %target, "Fly rising");

        let surface = self.surface.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(rise) => {}
            }
            *phase.lock() = FlyPhase::Descending;
            surface.ease_to(target, descend);
            debug!(%target, "Fly descending");
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(descend) => {}
            }
            *phase.lock() = FlyPhase::Settled;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLng;
    use crate::surface::{RecordingSurface, SurfaceEvent};

    fn controller(surface: &Arc<RecordingSurface>) -> CameraController {
        CameraController::new(surface.clone(), CameraConfig::default())
    }

    fn pose(zoom: f64) -> CameraPose {
        CameraPose::new(LatLng::new(48.85, 2.35), zoom)
    }

    #[tokio::test]
    async fn test_instant_strategy_jumps() {
        let surface = Arc::new(RecordingSurface::new());
        controller(&surface).move_to(pose(10.0), CameraStrategy::Instant, None, false);
        assert!(matches!(
            surface.events().as_slice(),
            [SurfaceEvent::JumpTo { .. }]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fly_over_threshold_produces_two_motions() {
        let surface = Arc::new(RecordingSurface::new());
        let camera = controller(&surface);
        // Starting zoom is 2.0; a zoom-12 target is far over the threshold.
        camera.move_to(pose(12.0), CameraStrategy::Fly, None, false);
        assert_eq!(camera.phase(), Some(FlyPhase::Rising));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(surface.ease_count(), 2);
        assert_eq!(camera.phase(), Some(FlyPhase::Settled));
        assert_eq!(surface.current_pose().unwrap().zoom, 12.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fly_intermediate_zoom_is_below_both() {
        let surface = Arc::new(RecordingSurface::new());
        let camera = controller(&surface);
        camera.move_to(pose(12.0), CameraStrategy::Fly, None, false);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let zooms: Vec<f64> = surface
            .events()
            .iter()
            .filter_map(|e| match e {
                SurfaceEvent::EaseTo { pose, .. } => Some(pose.zoom),
                _ => None,
            })
            .collect();
        // Rise lands below min(current, target) by the configured offset.
        assert_eq!(zooms, vec![0.0, 12.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_motion_cancels_pending_descent() {
        let surface = Arc::new(RecordingSurface::new());
        let camera = controller(&surface);
        camera.move_to(pose(12.0), CameraStrategy::Fly, None, false);

        // Interrupt before phase 1 completes; the descent must never fire.
        tokio::time::sleep(Duration::from_millis(100)).await;
        camera.move_to(pose(5.0), CameraStrategy::Eased, None, false);

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(surface.ease_count(), 2);
        assert_eq!(surface.current_pose().unwrap().zoom, 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_descent_stops_motion_tracking() {
        let surface = Arc::new(RecordingSurface::new());
        let camera = controller(&surface);
        camera.move_to(pose(12.0), CameraStrategy::Fly, None, false);

        // Let phase 2 start, then cancel mid-descent.
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(camera.phase(), Some(FlyPhase::Descending));
        camera.cancel();
        tokio::time::sleep(Duration::from_millis(3000)).await;
        // Both motions were issued, but the flight never settles.
        assert_eq!(surface.ease_count(), 2);
        assert_eq!(camera.phase(), None);
    }

    #[tokio::test]
    async fn test_small_delta_without_content_is_single_motion() {
        let surface = Arc::new(RecordingSurface::new());
        surface.jump_to(pose(11.0));
        surface.clear_events();

        let camera = controller(&surface);
        camera.move_to(pose(12.0), CameraStrategy::Fly, None, false);
        assert_eq!(surface.ease_count(), 1);
    }

    #[tokio::test]
    async fn test_auto_fit_with_no_bounds_moves_nothing() {
        let surface = Arc::new(RecordingSurface::new());
        controller(&surface).auto_fit(None);
        assert!(surface.events().is_empty());
    }

    #[tokio::test]
    async fn test_auto_fit_contains_bounds() {
        let surface = Arc::new(RecordingSurface::new());
        let bounds = GeoBounds {
            south: 53.0,
            west: 9.0,
            north: 54.0,
            east: 10.0,
        };
        controller(&surface).auto_fit(Some(bounds));
        assert!(surface.current_bounds().unwrap().contains_bounds(&bounds));
    }
}
