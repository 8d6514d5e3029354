//! Layer cross-fades.
//!
//! Prevents abrupt pops when a segment's content changes: the incoming
//! drawable set ramps from zero to its base opacity while the outgoing set
//! ramps to zero, concurrently, over one duration. Outgoing drawables are
//! detached only after the fade completes, so new content is visible before
//! old content disappears (no blank frame) and no handle outlives its
//! release.
//!
//! Cancellation jumps straight to the end state rather than abandoning the
//! map mid-fade: incoming at base opacity, outgoing detached.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::FadeConfig;
use crate::render::RenderedDrawable;
use crate::surface::MapSurface;

/// Opacity ramp shape for a cross-fade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeCurve {
    Linear,
    Eased,
}

impl FadeCurve {
    /// Apply the curve to normalized time `t` in [0, 1].
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => t,
            // Smoothstep; gentle at both ends.
            FadeCurve::Eased => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Fades incoming drawables in, outgoing drawables out, then releases the
/// outgoing set.
pub struct LayerTransitionManager {
    surface: Arc<dyn MapSurface>,
    config: FadeConfig,
}

impl LayerTransitionManager {
    pub fn new(surface: Arc<dyn MapSurface>, config: FadeConfig) -> Self {
        Self { surface, config }
    }

    /// The configured full cross-fade duration.
    pub fn crossfade_duration(&self) -> Duration {
        self.config.crossfade
    }

    /// The configured quick-update duration for same-segment refreshes.
    pub fn quick_update_duration(&self) -> Duration {
        self.config.quick_update
    }

    /// Cross-fade from `outgoing` to `incoming` over `duration`.
    ///
    /// `incoming` must already be attached (at zero opacity) by the caller;
    /// this ordering is what guarantees attach-before-detach even when the
    /// duration is zero. Ownership of `outgoing` transfers here; the handles
    /// are detached exactly once, on completion or cancellation.
    pub async fn run(
        &self,
        outgoing: Vec<RenderedDrawable>,
        incoming: Vec<RenderedDrawable>,
        duration: Duration,
        curve: FadeCurve,
        cancel: CancellationToken,
    ) {
        if duration.is_zero() {
            self.finish(&outgoing, &incoming);
            return;
        }

        debug!(
            outgoing = outgoing.len(),
            incoming = incoming.len(),
            ?duration,
            "Cross-fade start"
        );
        let started = tokio::time::Instant::now();
        let mut ticker = tokio::time::interval(self.config.frame_interval);
        // The first tick fires immediately; consume it so elapsed time is
        // measured from the first real frame.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Cross-fade cancelled; jumping to end state");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let t = started.elapsed().as_secs_f64() / duration.as_secs_f64();
            if t >= 1.0 {
                break;
            }
            let level = curve.apply(t);
            for drawable in &incoming {
                self.surface
                    .set_opacity(drawable.handle, drawable.base_opacity * level);
            }
            for drawable in &outgoing {
                self.surface
                    .set_opacity(drawable.handle, drawable.base_opacity * (1.0 - level));
            }
        }

        self.finish(&outgoing, &incoming);
    }

    /// Land on the end state: incoming at base opacity, outgoing released.
    fn finish(&self, outgoing: &[RenderedDrawable], incoming: &[RenderedDrawable]) {
        for drawable in incoming {
            self.surface
                .set_opacity(drawable.handle, drawable.base_opacity);
        }
        for drawable in outgoing {
            self.surface.detach(drawable.handle);
        }
        debug!(released = outgoing.len(), "Cross-fade complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLng;
    use crate::surface::{DrawableSpec, RecordingSurface, SurfaceEvent};

    fn icon(surface: &RecordingSurface, opacity: f64) -> RenderedDrawable {
        let handle = surface.attach(
            DrawableSpec::Icon {
                position: LatLng::new(53.55, 9.99),
                glyph: "marker".to_string(),
                size: 24.0,
                color: "#d33d29".to_string(),
                z_index: 0,
                tooltip: None,
                popup: None,
            },
            opacity,
        );
        RenderedDrawable {
            handle,
            base_opacity: 1.0,
        }
    }

    fn manager(surface: &Arc<RecordingSurface>) -> LayerTransitionManager {
        LayerTransitionManager::new(surface.clone(), FadeConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_fade_detaches_outgoing_only_after_completion() {
        let surface = Arc::new(RecordingSurface::new());
        let old = icon(&surface, 1.0);
        let new = icon(&surface, 0.0);

        manager(&surface)
            .run(
                vec![old],
                vec![new],
                Duration::from_millis(200),
                FadeCurve::Linear,
                CancellationToken::new(),
            )
            .await;

        let events = surface.events();
        let detach_at = events
            .iter()
            .position(|e| matches!(e, SurfaceEvent::Detached { .. }))
            .unwrap();
        let last_opacity_at = events
            .iter()
            .rposition(|e| matches!(e, SurfaceEvent::OpacitySet { .. }))
            .unwrap();
        assert!(
            detach_at > last_opacity_at,
            "outgoing must be released only after the fade"
        );
        assert_eq!(surface.live_ids(), vec![new.handle]);
        assert_eq!(surface.opacity_of(new.handle), Some(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_still_attach_before_detach() {
        let surface = Arc::new(RecordingSurface::new());
        let old = icon(&surface, 1.0);
        let new = icon(&surface, 0.0);

        manager(&surface)
            .run(
                vec![old],
                vec![new],
                Duration::ZERO,
                FadeCurve::Linear,
                CancellationToken::new(),
            )
            .await;

        assert_eq!(surface.live_ids(), vec![new.handle]);
        assert_eq!(surface.opacity_of(new.handle), Some(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_jumps_to_end_state() {
        let surface = Arc::new(RecordingSurface::new());
        let old = icon(&surface, 1.0);
        let new = icon(&surface, 0.0);
        let cancel = CancellationToken::new();

        let fade_manager = manager(&surface);
        let surface_clone = surface.clone();
        let handle = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                fade_manager
                    .run(
                        vec![old],
                        vec![new],
                        Duration::from_millis(10_000),
                        FadeCurve::Eased,
                        cancel,
                    )
                    .await;
            }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(surface_clone.live_ids(), vec![new.handle]);
        assert_eq!(surface_clone.opacity_of(new.handle), Some(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_opacities_move_in_opposite_directions() {
        let surface = Arc::new(RecordingSurface::new());
        let old = icon(&surface, 1.0);
        let new = icon(&surface, 0.0);
        let cancel = CancellationToken::new();

        let fade_manager = manager(&surface);
        let surface_probe = surface.clone();
        let run = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                fade_manager
                    .run(
                        vec![old],
                        vec![new],
                        Duration::from_millis(1000),
                        FadeCurve::Linear,
                        cancel,
                    )
                    .await;
            }
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        let incoming = surface_probe.opacity_of(new.handle).unwrap();
        let outgoing = surface_probe.opacity_of(old.handle).unwrap();
        assert!(incoming > 0.0 && incoming < 1.0, "incoming {}", incoming);
        assert!(outgoing > 0.0 && outgoing < 1.0, "outgoing {}", outgoing);
        assert!((incoming + outgoing - 1.0).abs() < 0.1);

        run.await.unwrap();
    }
}
