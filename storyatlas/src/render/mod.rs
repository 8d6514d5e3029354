//! Geometry rendering.
//!
//! Turns a segment's zones, locations, and data layers into attached
//! drawables plus their combined geographic bounds. No timing logic lives
//! here; fading and camera motion are owned by other components.
//!
//! Failure model: one bad zone, location, or layer is skipped with a
//! warning and the rest of the segment renders. The returned set only ever
//! contains fully attached drawables.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use crate::geo::GeoBounds;
use crate::model::{ContentHash, LayerRef, Segment};
use crate::surface::{DrawableId, DrawableSpec, MapSurface};

/// Error from an external data-layer collaborator.
#[derive(Debug, Error)]
pub enum LayerError {
    #[error("Layer '{id}' not found")]
    NotFound { id: String },
    #[error("Layer '{id}' failed to load: {reason}")]
    LoadFailed { id: String, reason: String },
}

/// External collaborator resolving per-map data layers into drawables.
///
/// Dyn-compatible via boxed futures so the renderer can hold it as a trait
/// object across await points.
pub trait LayerProvider: Send + Sync {
    fn load(
        &self,
        map_id: &str,
        layer: &LayerRef,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<DrawableSpec>, LayerError>> + Send + '_>>;
}

/// Provider for maps without data layers.
pub struct NoLayers;

impl LayerProvider for NoLayers {
    fn load(
        &self,
        _map_id: &str,
        layer: &LayerRef,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<DrawableSpec>, LayerError>> + Send + '_>> {
        let id = layer.id.clone();
        Box::pin(async move { Err(LayerError::NotFound { id }) })
    }
}

/// A drawable attached by a render pass, with the opacity a fade ramps to.
#[derive(Debug, Clone, Copy)]
pub struct RenderedDrawable {
    pub handle: DrawableId,
    pub base_opacity: f64,
}

/// Everything one render pass attached for a segment.
#[derive(Debug, Clone)]
pub struct RenderedSet {
    pub drawables: Vec<RenderedDrawable>,
    /// Union bounds of all attached geometry; `None` for an empty segment.
    pub bounds: Option<GeoBounds>,
    /// Hash of the segment content this set was rendered from.
    pub content_hash: ContentHash,
}

impl RenderedSet {
    /// A set with nothing attached.
    pub fn empty(content_hash: ContentHash) -> Self {
        Self {
            drawables: Vec::new(),
            bounds: None,
            content_hash,
        }
    }

    /// Handles of every drawable in the set.
    pub fn handles(&self) -> Vec<DrawableId> {
        self.drawables.iter().map(|d| d.handle).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }
}

/// Renders segment geometry onto the map surface.
pub struct GeometryRenderer {
    surface: Arc<dyn MapSurface>,
    layers: Arc<dyn LayerProvider>,
}

impl GeometryRenderer {
    pub fn new(surface: Arc<dyn MapSurface>, layers: Arc<dyn LayerProvider>) -> Self {
        Self { surface, layers }
    }

    /// Attach a segment's drawables at `initial_opacity` and report the set.
    ///
    /// Output ordering is stable for a given segment content hash: zones in
    /// authored order (polygon, then label), locations in authored order,
    /// then layers in authored order.
    pub async fn render(
        &self,
        map_id: &str,
        segment: &Segment,
        initial_opacity: f64,
    ) -> RenderedSet {
        let mut set = RenderedSet::empty(segment.content_hash());

        for zone in &segment.zones {
            let Some(zone_bounds) = zone.geometry.bounds() else {
                warn!(zone = %zone.id, "Skipping zone without geometry");
                continue;
            };

            let style = &zone.style;
            let spec = DrawableSpec::Polygon {
                rings: zone.geometry.rings().iter().map(|r| r.to_vec()).collect(),
                fill_color: style.fill_color.clone(),
                fill_opacity: if style.fill_enabled {
                    style.fill_opacity
                } else {
                    0.0
                },
                stroke_color: style.boundary_color.clone(),
                stroke_width: if style.boundary_enabled {
                    style.boundary_width
                } else {
                    0.0
                },
            };
            self.push(&mut set, spec, initial_opacity);

            if let Some(text) = zone.label() {
                let anchor = zone.label_anchor.unwrap_or_else(|| zone_bounds.center());
                let spec = DrawableSpec::Label {
                    position: anchor,
                    text: text.to_string(),
                };
                self.push(&mut set, spec, initial_opacity);
            }
        }

        for location in &segment.locations {
            if !location.is_visible {
                debug!(location = %location.id, "Skipping hidden location");
                continue;
            }
            let Some(point) = location.geometry else {
                warn!(location = %location.id, "Skipping location without geometry");
                continue;
            };
            if let Err(e) = point.validate() {
                warn!(location = %location.id, error = %e, "Skipping location with unusable geometry");
                continue;
            }
            let spec = DrawableSpec::Icon {
                position: point,
                glyph: location.icon.glyph.clone(),
                size: location.icon.size,
                color: location.icon.color.clone(),
                z_index: location.z_index,
                tooltip: location.tooltip.clone(),
                popup: location.popup.clone(),
            };
            self.push(&mut set, spec, initial_opacity);
        }

        let loads = segment
            .layers
            .iter()
            .map(|layer| async move { (layer, self.layers.load(map_id, layer).await) });
        for (layer, result) in join_all(loads).await {
            match result {
                Ok(specs) => {
                    for spec in specs {
                        self.push(&mut set, spec, initial_opacity);
                    }
                }
                Err(e) => {
                    warn!(layer = %layer.id, error = %e, "Skipping failed data layer");
                }
            }
        }

        debug!(
            segment = %segment.id,
            drawables = set.drawables.len(),
            hash = %set.content_hash,
            "Rendered segment geometry"
        );
        set
    }

    fn push(&self, set: &mut RenderedSet, spec: DrawableSpec, initial_opacity: f64) {
        let spec_bounds = spec.bounds();
        let handle = self.surface.attach(spec, initial_opacity);
        set.drawables.push(RenderedDrawable {
            handle,
            base_opacity: 1.0,
        });
        if let Some(b) = spec_bounds {
            set.bounds = Some(match set.bounds {
                Some(existing) => existing.union(&b),
                None => b,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLng;
    use crate::model::{IconStyle, Location, ZoneGeometry, ZoneStyle};
    use crate::surface::RecordingSurface;

    fn renderer(surface: &Arc<RecordingSurface>) -> GeometryRenderer {
        GeometryRenderer::new(surface.clone(), Arc::new(NoLayers))
    }

    fn segment_with_zone_and_location() -> Segment {
        Segment {
            id: "s1".to_string(),
            name: "Harbor".to_string(),
            duration_ms: None,
            zones: vec![crate::model::Zone {
                id: "z1".to_string(),
                name: Some("Harbor".to_string()),
                geometry: ZoneGeometry::Polygon {
                    rings: vec![vec![
                        LatLng::new(53.0, 9.0),
                        LatLng::new(53.0, 10.0),
                        LatLng::new(54.0, 10.0),
                    ]],
                },
                style: ZoneStyle {
                    show_label: true,
                    ..ZoneStyle::default()
                },
                label_anchor: None,
            }],
            locations: vec![Location {
                id: "l1".to_string(),
                name: None,
                geometry: Some(LatLng::new(53.55, 9.99)),
                icon: IconStyle::default(),
                z_index: 0,
                tooltip: Some("Port".to_string()),
                popup: None,
                is_visible: true,
            }],
            layers: vec![],
            camera: None,
        }
    }

    #[tokio::test]
    async fn test_render_attaches_polygon_label_icon() {
        let surface = Arc::new(RecordingSurface::new());
        let set = renderer(&surface)
            .render("m1", &segment_with_zone_and_location(), 1.0)
            .await;
        assert_eq!(set.drawables.len(), 3);
        assert_eq!(surface.live_count(), 3);
        let bounds = set.bounds.unwrap();
        assert!(bounds.contains(LatLng::new(53.55, 9.99)));
    }

    #[tokio::test]
    async fn test_hidden_and_geometryless_locations_are_skipped() {
        let mut segment = segment_with_zone_and_location();
        segment.locations[0].is_visible = false;
        segment.locations.push(Location {
            id: "l2".to_string(),
            name: None,
            geometry: None,
            icon: IconStyle::default(),
            z_index: 0,
            tooltip: None,
            popup: None,
            is_visible: true,
        });

        let surface = Arc::new(RecordingSurface::new());
        let set = renderer(&surface).render("m1", &segment, 1.0).await;
        // Polygon + label only.
        assert_eq!(set.drawables.len(), 2);
    }

    #[tokio::test]
    async fn test_disabled_fill_renders_zero_opacity_fill() {
        let mut segment = segment_with_zone_and_location();
        segment.zones[0].style.fill_enabled = false;
        segment.zones[0].style.show_label = false;
        segment.locations.clear();

        let surface = Arc::new(RecordingSurface::new());
        renderer(&surface).render("m1", &segment, 1.0).await;
        let events = surface.events();
        assert_eq!(events.len(), 1);
        // The polygon is attached with a zeroed fill opacity, which the
        // journal cannot see, but the drawable count confirms the zone was
        // not dropped.
        assert_eq!(surface.live_count(), 1);
    }

    #[tokio::test]
    async fn test_layer_failure_does_not_abort_segment() {
        let mut segment = segment_with_zone_and_location();
        segment.layers.push(LayerRef {
            id: "heatmap".to_string(),
            name: None,
        });

        let surface = Arc::new(RecordingSurface::new());
        let set = renderer(&surface).render("m1", &segment, 1.0).await;
        // NoLayers fails the layer; zone, label, icon still render.
        assert_eq!(set.drawables.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_segment_renders_empty_set() {
        let segment = Segment {
            id: "empty".to_string(),
            name: "Empty".to_string(),
            duration_ms: None,
            zones: vec![],
            locations: vec![],
            layers: vec![],
            camera: None,
        };
        let surface = Arc::new(RecordingSurface::new());
        let set = renderer(&surface).render("m1", &segment, 1.0).await;
        assert!(set.is_empty());
        assert!(set.bounds.is_none());
    }
}
