//! Route draw-in animation.
//!
//! Advances one or more ordered polyline animations for the active segment
//! as a function of elapsed wall-clock time since the segment became
//! active. Independent of the camera and layer lifecycle: the elapsed-time
//! origin is handed in by the playback controller, which resets it exactly
//! when the active segment index changes and never on a data refresh.
//!
//! Sequencing: routes play in ascending `display_order`; ties resolve by
//! explicit `start_time_ms`, then record order. A route without an explicit
//! start offset begins when its predecessors' draw time has elapsed. A
//! route that has fully elapsed stays fully drawn until the segment
//! changes.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::RouteConfig;
use crate::geo::path_prefix;
use crate::model::RouteAnimation;
use crate::surface::{DrawableId, DrawableSpec, MapSurface};

/// One route scheduled inside a segment's time budget.
#[derive(Debug, Clone)]
pub struct PlannedRoute {
    pub animation: RouteAnimation,
    pub handle: DrawableId,
    /// Offset from the segment origin at which drawing starts.
    pub start_offset: Duration,
    pub draw_duration: Duration,
}

/// The playback sequence for a segment's routes.
#[derive(Debug, Clone, Default)]
pub struct RoutePlan {
    pub routes: Vec<PlannedRoute>,
}

impl RoutePlan {
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Offset at which the last route finishes drawing.
    pub fn total_duration(&self) -> Duration {
        self.routes
            .iter()
            .map(|r| r.start_offset + r.draw_duration)
            .max()
            .unwrap_or(Duration::ZERO)
    }
}

/// Sort animations into playback order.
///
/// Ascending `display_order`; ties broken by explicit `start_time_ms` when
/// both carry one, else record (creation) order via stable sort.
pub fn order_routes(mut routes: Vec<RouteAnimation>) -> Vec<RouteAnimation> {
    routes.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| match (a.start_time_ms, b.start_time_ms) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => Ordering::Equal,
            })
    });
    routes
}

/// Animates route polylines on the map surface.
pub struct RouteAnimator {
    surface: Arc<dyn MapSurface>,
    config: RouteConfig,
}

impl RouteAnimator {
    pub fn new(surface: Arc<dyn MapSurface>, config: RouteConfig) -> Self {
        Self { surface, config }
    }

    /// Attach a segment's routes as empty polylines and build the plan.
    ///
    /// Handles are attached up front so they can join the incoming drawable
    /// set for cross-fading and bulk cleanup; the tick task only ever
    /// extends paths. `initial_opacity` matches the fade-in start level of
    /// the rest of the segment.
    pub fn prepare(&self, routes: Vec<RouteAnimation>, initial_opacity: f64) -> RoutePlan {
        let ordered = order_routes(routes);
        let mut planned = Vec::with_capacity(ordered.len());
        let mut cursor = Duration::ZERO;

        for animation in ordered {
            let draw_duration = animation
                .duration_ms
                .map(Duration::from_millis)
                .unwrap_or(self.config.default_draw_duration);
            let start_offset = animation
                .start_time_ms
                .map(Duration::from_millis)
                .unwrap_or(cursor);
            cursor = start_offset + draw_duration;

            let handle = self.surface.attach(
                DrawableSpec::Route {
                    path: Vec::new(),
                    color: animation.style.color.clone(),
                    width: animation.style.width,
                },
                initial_opacity * animation.style.opacity,
            );
            planned.push(PlannedRoute {
                animation,
                handle,
                start_offset,
                draw_duration,
            });
        }

        RoutePlan { routes: planned }
    }

    /// Drive the plan from `origin` until every route is fully drawn.
    ///
    /// Cancellation leaves paths exactly as last drawn; cleanup of the
    /// drawables belongs to whoever owns the segment's drawable set.
    pub async fn run(&self, plan: RoutePlan, origin: Instant, cancel: CancellationToken) {
        if plan.is_empty() {
            return;
        }
        debug!(routes = plan.routes.len(), "Route animation start");

        let mut done = vec![false; plan.routes.len()];
        let mut ticker = tokio::time::interval(self.config.frame_interval);
        ticker.tick().await;

        while !done.iter().all(|d| *d) {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Route animation cancelled");
                    return;
                }
                _ = ticker.tick() => {}
            }

            let elapsed = origin.elapsed();
            for (index, route) in plan.routes.iter().enumerate() {
                if done[index] || elapsed < route.start_offset {
                    continue;
                }
                let into = elapsed - route.start_offset;
                let fraction = if route.draw_duration.is_zero() {
                    1.0
                } else {
                    into.as_secs_f64() / route.draw_duration.as_secs_f64()
                };
                let prefix = path_prefix(&route.animation.path, fraction);
                self.surface.set_path(route.handle, &prefix);
                if fraction >= 1.0 {
                    done[index] = true;
                }
            }
        }
        debug!("Route animation complete");
    }
}
