//! Story-map document loading and validation.
//!
//! The document is the load boundary: JSON in, validated records out.
//! Everything downstream (renderer, playback controller, route animator)
//! trusts the records it receives from here.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::GeoError;
use crate::model::segment::{RouteAnimation, Segment};

/// How playback content changes between two segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionStyle {
    Instant,
    Eased,
    Linear,
}

impl Default for TransitionStyle {
    fn default() -> Self {
        TransitionStyle::Eased
    }
}

fn default_transition_duration_ms() -> u64 {
    800
}

fn default_camera_duration_ms() -> u64 {
    1600
}

/// Authored rules governing how playback moves from one segment to the next.
///
/// A directed edge keyed by `(from_segment_id, to_segment_id)`. The content
/// transition (cross-fade) and the camera motion carry independent
/// strategies and durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from_segment_id: String,
    pub to_segment_id: String,
    #[serde(default)]
    pub style: TransitionStyle,
    #[serde(default = "default_transition_duration_ms")]
    pub duration_ms: u64,
    #[serde(default)]
    pub camera: crate::camera::CameraStrategy,
    #[serde(default = "default_camera_duration_ms")]
    pub camera_duration_ms: u64,
    /// Gates automatic advance out of the segment this edge arrives at.
    #[serde(default)]
    pub require_user_action: bool,
}

/// Errors rejected at the document load boundary.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Document has an empty map id")]
    EmptyMapId,

    #[error("Segment at index {index} has an empty id")]
    EmptySegmentId { index: usize },

    #[error("Duplicate segment id '{id}'")]
    DuplicateSegmentId { id: String },

    #[error("Segment '{id}' has a zero duration")]
    ZeroDuration { id: String },

    #[error("Invalid coordinate in {context}: {source}")]
    Coordinate { context: String, source: GeoError },

    #[error("Zone '{id}' has a degenerate ring ({points} points, need 3)")]
    DegenerateRing { id: String, points: usize },

    #[error("Transition references unknown segment '{id}'")]
    UnknownTransitionEndpoint { id: String },

    #[error("Route animation '{id}' references unknown segment '{segment_id}'")]
    UnknownRouteSegment { id: String, segment_id: String },

    #[error("Route animation '{id}' needs at least two path points")]
    ShortRoutePath { id: String },
}

/// A complete authored story map: identity, segments, transitions, routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryMapDocument {
    pub map_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
    #[serde(default)]
    pub route_animations: Vec<RouteAnimation>,
}

impl StoryMapDocument {
    /// Parse and validate a document from JSON.
    ///
    /// Serde applies field defaults; this function then enforces the
    /// structural rules rendering code relies on. A document that passes
    /// here never requires defensive probing downstream.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let document: StoryMapDocument = serde_json::from_str(json)?;
        document.validate()?;
        Ok(document)
    }

    /// Validate an already-deserialized document.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.map_id.trim().is_empty() {
            return Err(ModelError::EmptyMapId);
        }

        let mut seen = HashSet::new();
        for (index, segment) in self.segments.iter().enumerate() {
            if segment.id.trim().is_empty() {
                return Err(ModelError::EmptySegmentId { index });
            }
            if !seen.insert(segment.id.as_str()) {
                return Err(ModelError::DuplicateSegmentId {
                    id: segment.id.clone(),
                });
            }
            if segment.duration_ms == Some(0) {
                return Err(ModelError::ZeroDuration {
                    id: segment.id.clone(),
                });
            }
            if let Some(pose) = &segment.camera {
                pose.validate().map_err(|source| ModelError::Coordinate {
                    context: format!("camera pose of segment '{}'", segment.id),
                    source,
                })?;
            }
            for zone in &segment.zones {
                let min_ring = zone.geometry.min_ring_len();
                if min_ring < 3 {
                    return Err(ModelError::DegenerateRing {
                        id: zone.id.clone(),
                        points: min_ring,
                    });
                }
                zone.geometry
                    .validate()
                    .map_err(|source| ModelError::Coordinate {
                        context: format!("zone '{}'", zone.id),
                        source,
                    })?;
                if let Some(anchor) = &zone.label_anchor {
                    anchor.validate().map_err(|source| ModelError::Coordinate {
                        context: format!("label anchor of zone '{}'", zone.id),
                        source,
                    })?;
                }
            }
            for location in &segment.locations {
                if let Some(point) = &location.geometry {
                    point.validate().map_err(|source| ModelError::Coordinate {
                        context: format!("location '{}'", location.id),
                        source,
                    })?;
                }
            }
        }

        for transition in &self.transitions {
            for endpoint in [&transition.from_segment_id, &transition.to_segment_id] {
                if !seen.contains(endpoint.as_str()) {
                    return Err(ModelError::UnknownTransitionEndpoint {
                        id: endpoint.clone(),
                    });
                }
            }
        }

        for route in &self.route_animations {
            if !seen.contains(route.segment_id.as_str()) {
                return Err(ModelError::UnknownRouteSegment {
                    id: route.id.clone(),
                    segment_id: route.segment_id.clone(),
                });
            }
            if route.path.len() < 2 {
                return Err(ModelError::ShortRoutePath {
                    id: route.id.clone(),
                });
            }
            for point in &route.path {
                point.validate().map_err(|source| ModelError::Coordinate {
                    context: format!("route animation '{}'", route.id),
                    source,
                })?;
            }
        }

        Ok(())
    }

    /// Segment lookup by id.
    pub fn segment(&self, id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// The transition authored for the edge `from → to`, if any.
    pub fn transition(&self, from: &str, to: &str) -> Option<&Transition> {
        self.transitions
            .iter()
            .find(|t| t.from_segment_id == from && t.to_segment_id == to)
    }

    /// Route animations belonging to a segment, in record order.
    pub fn routes_for(&self, segment_id: &str) -> Vec<RouteAnimation> {
        self.route_animations
            .iter()
            .filter(|r| r.segment_id == segment_id)
            .cloned()
            .collect()
    }
}
