//! In-memory map surface.
//!
//! `RecordingSurface` implements [`MapSurface`] against an event journal and
//! a live drawable table instead of a real map widget. The CLI uses it for
//! headless playback; the test suites use it to assert ordering properties
//! (attach-before-detach, exactly-two fly motions) that a real widget could
//! not expose.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::geo::{CameraPose, GeoBounds, LatLng};
use crate::surface::{DrawableId, DrawableSpec, FitOptions, MapSurface};

/// One observed surface mutation, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Attached { id: DrawableId, kind: &'static str },
    Detached { id: DrawableId },
    OpacitySet { id: DrawableId, opacity: f64 },
    PathSet { id: DrawableId, points: usize },
    FitBounds { bounds: GeoBounds },
    JumpTo { pose: CameraPose },
    EaseTo { pose: CameraPose, duration: Duration },
}

#[derive(Debug, Clone)]
struct LiveDrawable {
    spec: DrawableSpec,
    opacity: f64,
    path: Vec<LatLng>,
}

#[derive(Debug)]
struct Viewport {
    pose: CameraPose,
    bounds: Option<GeoBounds>,
}

/// Headless [`MapSurface`] implementation.
pub struct RecordingSurface {
    next_id: AtomicU64,
    ready: AtomicBool,
    journal: RwLock<Vec<SurfaceEvent>>,
    live: RwLock<HashMap<DrawableId, LiveDrawable>>,
    viewport: RwLock<Viewport>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    /// A ready surface with a whole-world starting viewport.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            ready: AtomicBool::new(true),
            journal: RwLock::new(Vec::new()),
            live: RwLock::new(HashMap::new()),
            viewport: RwLock::new(Viewport {
                pose: CameraPose::new(LatLng::new(0.0, 0.0), 2.0),
                bounds: None,
            }),
        }
    }

    /// Toggle readiness, simulating a widget that is not yet attached.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Snapshot of the journal so far.
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.journal.read().clone()
    }

    /// Clear the journal (live drawables are untouched).
    pub fn clear_events(&self) {
        self.journal.write().clear();
    }

    /// Handles currently attached, in ascending order.
    pub fn live_ids(&self) -> Vec<DrawableId> {
        let mut ids: Vec<_> = self.live.read().keys().copied().collect();
        ids.sort();
        ids
    }

    /// Number of currently attached drawables.
    pub fn live_count(&self) -> usize {
        self.live.read().len()
    }

    /// Current opacity of an attached drawable.
    pub fn opacity_of(&self, id: DrawableId) -> Option<f64> {
        self.live.read().get(&id).map(|d| d.opacity)
    }

    /// Spec of an attached drawable.
    pub fn spec_of(&self, id: DrawableId) -> Option<DrawableSpec> {
        self.live.read().get(&id).map(|d| d.spec.clone())
    }

    /// Current path of an attached route drawable.
    pub fn path_of(&self, id: DrawableId) -> Option<Vec<LatLng>> {
        self.live.read().get(&id).map(|d| d.path.clone())
    }

    /// Number of `EaseTo` motions observed.
    pub fn ease_count(&self) -> usize {
        self.journal
            .read()
            .iter()
            .filter(|e| matches!(e, SurfaceEvent::EaseTo { .. }))
            .count()
    }

    fn record(&self, event: SurfaceEvent) {
        self.journal.write().push(event);
    }

    /// Zoom level at which `bounds` fills a nominal viewport.
    ///
    /// Uses the Web Mercator relation between zoom and degree span; close
    /// enough for a headless stand-in.
    fn zoom_for(bounds: &GeoBounds) -> f64 {
        let lat_span = (bounds.north - bounds.south).max(1e-6);
        let lng_span = (bounds.east - bounds.west).max(1e-6);
        let span = lat_span.max(lng_span);
        (360.0 / span).log2().clamp(crate::geo::MIN_ZOOM, crate::geo::MAX_ZOOM)
    }
}

impl MapSurface for RecordingSurface {
    fn attach(&self, spec: DrawableSpec, initial_opacity: f64) -> DrawableId {
        let id = DrawableId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let kind = spec.kind();
        let path = match &spec {
            DrawableSpec::Route { path, .. } => path.clone(),
            _ => Vec::new(),
        };
        self.live.write().insert(
            id,
            LiveDrawable {
                spec,
                opacity: initial_opacity.clamp(0.0, 1.0),
                path,
            },
        );
        self.record(SurfaceEvent::Attached { id, kind });
        id
    }

    fn detach(&self, id: DrawableId) {
        if self.live.write().remove(&id).is_none() {
            warn!(%id, "Detach of unknown drawable handle");
            return;
        }
        self.record(SurfaceEvent::Detached { id });
    }

    fn set_opacity(&self, id: DrawableId, opacity: f64) {
        let opacity = opacity.clamp(0.0, 1.0);
        if let Some(drawable) = self.live.write().get_mut(&id) {
            drawable.opacity = opacity;
            self.record(SurfaceEvent::OpacitySet { id, opacity });
        }
    }

    fn set_path(&self, id: DrawableId, path: &[LatLng]) {
        if let Some(drawable) = self.live.write().get_mut(&id) {
            drawable.path = path.to_vec();
            self.record(SurfaceEvent::PathSet {
                id,
                points: path.len(),
            });
        }
    }

    fn fit_bounds(&self, bounds: GeoBounds, options: FitOptions) {
        let padded = bounds.padded(options.padding_ratio);
        let zoom = Self::zoom_for(&padded).min(options.max_zoom);
        let pose = CameraPose::new(padded.center(), zoom);
        {
            let mut viewport = self.viewport.write();
            viewport.pose = pose;
            viewport.bounds = Some(padded);
        }
        debug!(%bounds, zoom, "Fit viewport to bounds");
        self.record(SurfaceEvent::FitBounds { bounds: padded });
    }

    fn jump_to(&self, pose: CameraPose) {
        {
            let mut viewport = self.viewport.write();
            viewport.pose = pose;
            viewport.bounds = None;
        }
        self.record(SurfaceEvent::JumpTo { pose });
    }

    fn ease_to(&self, pose: CameraPose, duration: Duration) {
        // The headless surface lands instantly; real widgets animate.
        {
            let mut viewport = self.viewport.write();
            viewport.pose = pose;
            viewport.bounds = None;
        }
        self.record(SurfaceEvent::EaseTo { pose, duration });
    }

    fn current_pose(&self) -> Option<CameraPose> {
        if !self.is_ready() {
            return None;
        }
        Some(self.viewport.read().pose)
    }

    fn current_bounds(&self) -> Option<GeoBounds> {
        if !self.is_ready() {
            return None;
        }
        self.viewport.read().bounds
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn icon_spec() -> DrawableSpec {
        DrawableSpec::Icon {
            position: LatLng::new(53.55, 9.99),
            glyph: "marker".to_string(),
            size: 24.0,
            color: "#d33d29".to_string(),
            z_index: 0,
            tooltip: None,
            popup: None,
        }
    }

    #[test]
    fn test_attach_detach_lifecycle() {
        let surface = RecordingSurface::new();
        let id = surface.attach(icon_spec(), 1.0);
        assert_eq!(surface.live_count(), 1);
        surface.detach(id);
        assert_eq!(surface.live_count(), 0);
        assert_eq!(
            surface.events(),
            vec![
                SurfaceEvent::Attached { id, kind: "icon" },
                SurfaceEvent::Detached { id },
            ]
        );
    }

    #[test]
    fn test_detach_unknown_handle_is_ignored() {
        let surface = RecordingSurface::new();
        surface.detach(DrawableId(42));
        assert!(surface.events().is_empty());
    }

    #[test]
    fn test_fit_bounds_contains_input() {
        let surface = RecordingSurface::new();
        let bounds = GeoBounds {
            south: 53.0,
            west: 9.0,
            north: 54.0,
            east: 10.0,
        };
        surface.fit_bounds(
            bounds,
            FitOptions {
                padding_ratio: 0.15,
                max_zoom: 17.0,
            },
        );
        let viewport = surface.current_bounds().unwrap();
        assert!(viewport.contains_bounds(&bounds));
        assert!(surface.current_pose().unwrap().zoom <= 17.0);
    }

    #[test]
    fn test_opacity_clamped() {
        let surface = RecordingSurface::new();
        let id = surface.attach(icon_spec(), 0.0);
        surface.set_opacity(id, 1.7);
        assert_eq!(surface.opacity_of(id), Some(1.0));
    }
}
