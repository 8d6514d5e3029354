//! Map surface abstraction.
//!
//! The engine never draws pixels. It talks to an external rendering widget
//! through the [`MapSurface`] trait: attach/detach drawables, set opacity,
//! extend route paths, and move the viewport. Handles returned by
//! [`MapSurface::attach`] are opaque and exclusively owned by whichever
//! render pass created them; ownership transfers to the layer transition
//! manager for fade-out and release, never shared.
//!
//! # Design Principles
//!
//! - **Minimal interface**: only the primitives playback needs
//! - **Dyn-compatible**: used as `Arc<dyn MapSurface>` across tasks
//! - **Infallible mutations**: a widget that cannot attach reports through
//!   `is_ready`, not through per-call errors

mod recording;

pub use recording::{RecordingSurface, SurfaceEvent};

use std::time::Duration;

use crate::geo::{CameraPose, GeoBounds, LatLng};

/// Opaque handle to a drawable attached to the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawableId(pub u64);

impl std::fmt::Display for DrawableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Description of a drawable handed to the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawableSpec {
    /// A filled/stroked polygon (zone geometry).
    Polygon {
        rings: Vec<Vec<LatLng>>,
        fill_color: String,
        fill_opacity: f64,
        stroke_color: String,
        stroke_width: f64,
    },
    /// A text label anchored at a point.
    Label { position: LatLng, text: String },
    /// A point-of-interest icon.
    Icon {
        position: LatLng,
        glyph: String,
        size: f64,
        color: String,
        z_index: i32,
        tooltip: Option<String>,
        popup: Option<String>,
    },
    /// A route polyline; its path is extended over time by the animator.
    Route {
        path: Vec<LatLng>,
        color: String,
        width: f64,
    },
}

impl DrawableSpec {
    /// Geographic bounds of the drawable, `None` when it has no geometry.
    pub fn bounds(&self) -> Option<GeoBounds> {
        match self {
            DrawableSpec::Polygon { rings, .. } => {
                let mut bounds: Option<GeoBounds> = None;
                for point in rings.iter().flatten() {
                    match bounds.as_mut() {
                        Some(b) => b.extend(*point),
                        None => bounds = Some(GeoBounds::from_point(*point)),
                    }
                }
                bounds
            }
            DrawableSpec::Label { position, .. } | DrawableSpec::Icon { position, .. } => {
                Some(GeoBounds::from_point(*position))
            }
            DrawableSpec::Route { path, .. } => GeoBounds::from_points(path),
        }
    }

    /// Short kind name for logs and journals.
    pub fn kind(&self) -> &'static str {
        match self {
            DrawableSpec::Polygon { .. } => "polygon",
            DrawableSpec::Label { .. } => "label",
            DrawableSpec::Icon { .. } => "icon",
            DrawableSpec::Route { .. } => "route",
        }
    }
}

/// Options for fitting the viewport to bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Padding ratio applied to each edge of the bounds.
    pub padding_ratio: f64,
    /// Ceiling on the zoom chosen by the fit.
    pub max_zoom: f64,
}

/// The external rendering widget, as seen by the engine.
pub trait MapSurface: Send + Sync {
    /// Attach a drawable at the given initial opacity, returning its handle.
    fn attach(&self, spec: DrawableSpec, initial_opacity: f64) -> DrawableId;

    /// Detach and release a drawable. Unknown handles are ignored.
    fn detach(&self, id: DrawableId);

    /// Set a drawable's opacity multiplier in [0, 1].
    fn set_opacity(&self, id: DrawableId, opacity: f64);

    /// Replace a route drawable's path (draw-in primitive).
    fn set_path(&self, id: DrawableId, path: &[LatLng]);

    /// Fit the viewport to bounds with padding and a zoom ceiling.
    fn fit_bounds(&self, bounds: GeoBounds, options: FitOptions);

    /// Jump the viewport to a pose with no intermediate frames.
    fn jump_to(&self, pose: CameraPose);

    /// Animate the viewport to a pose over a duration.
    fn ease_to(&self, pose: CameraPose, duration: Duration);

    /// Current viewport pose, when the widget is attached.
    fn current_pose(&self) -> Option<CameraPose>;

    /// Current viewport bounds, when the widget is attached.
    fn current_bounds(&self) -> Option<GeoBounds>;

    /// Whether the widget is attached and able to render.
    fn is_ready(&self) -> bool;
}
