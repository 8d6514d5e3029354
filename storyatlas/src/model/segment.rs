//! Segment, zone, location, and route-animation records.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::geo::{CameraPose, LatLng};
use crate::model::geometry::ZoneGeometry;

/// Advance delay applied when a segment does not author its own duration.
pub const DEFAULT_SEGMENT_DURATION_MS: u64 = 5000;

fn default_true() -> bool {
    true
}

fn default_fill_color() -> String {
    "#3388ff".to_string()
}

fn default_fill_opacity() -> f64 {
    0.25
}

fn default_boundary_color() -> String {
    "#3388ff".to_string()
}

fn default_boundary_width() -> f64 {
    2.0
}

fn default_icon_glyph() -> String {
    "marker".to_string()
}

fn default_icon_size() -> f64 {
    24.0
}

fn default_icon_color() -> String {
    "#d33d29".to_string()
}

fn default_route_color() -> String {
    "#e8590c".to_string()
}

fn default_route_width() -> f64 {
    3.0
}

fn default_opacity() -> f64 {
    1.0
}

/// Styling flags for a zone polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneStyle {
    /// Whether the polygon interior is filled.
    #[serde(default = "default_true")]
    pub fill_enabled: bool,
    /// Fill color as a CSS color string.
    #[serde(default = "default_fill_color")]
    pub fill_color: String,
    /// Fill opacity in [0, 1].
    #[serde(default = "default_fill_opacity")]
    pub fill_opacity: f64,
    /// Whether the zone boundary is highlighted.
    #[serde(default)]
    pub boundary_enabled: bool,
    /// Boundary stroke color.
    #[serde(default = "default_boundary_color")]
    pub boundary_color: String,
    /// Boundary stroke width in pixels.
    #[serde(default = "default_boundary_width")]
    pub boundary_width: f64,
    /// Whether a text label is placed on the zone.
    #[serde(default)]
    pub show_label: bool,
    /// Label text override; the zone name is used when absent.
    #[serde(default)]
    pub label_text: Option<String>,
}

impl Default for ZoneStyle {
    fn default() -> Self {
        Self {
            fill_enabled: true,
            fill_color: default_fill_color(),
            fill_opacity: default_fill_opacity(),
            boundary_enabled: false,
            boundary_color: default_boundary_color(),
            boundary_width: default_boundary_width(),
            show_label: false,
            label_text: None,
        }
    }
}

/// A styled polygon area tied to a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub geometry: ZoneGeometry,
    #[serde(default)]
    pub style: ZoneStyle,
    /// Authored label anchor; the bounds centroid is used when absent.
    #[serde(default)]
    pub label_anchor: Option<LatLng>,
}

impl Zone {
    /// Label text for this zone, if labels are enabled.
    pub fn label(&self) -> Option<&str> {
        if !self.style.show_label {
            return None;
        }
        self.style
            .label_text
            .as_deref()
            .or(self.name.as_deref())
            .or(Some(self.id.as_str()))
    }
}

/// Icon styling for a point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconStyle {
    #[serde(default = "default_icon_glyph")]
    pub glyph: String,
    #[serde(default = "default_icon_size")]
    pub size: f64,
    #[serde(default = "default_icon_color")]
    pub color: String,
}

impl Default for IconStyle {
    fn default() -> Self {
        Self {
            glyph: default_icon_glyph(),
            size: default_icon_size(),
            color: default_icon_color(),
        }
    }
}

/// A point annotation tied to a segment.
///
/// Geometry stays optional past validation: a location without a usable
/// point is a per-item render skip, not a document error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub geometry: Option<LatLng>,
    #[serde(default)]
    pub icon: IconStyle,
    /// Stacking order among icons.
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub tooltip: Option<String>,
    /// Click-triggered popup content (HTML or plain text, pass-through).
    #[serde(default)]
    pub popup: Option<String>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
}

/// Reference to a per-map data layer rendered by an external collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Stroke styling for an animated route polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStyle {
    #[serde(default = "default_route_color")]
    pub color: String,
    #[serde(default = "default_route_width")]
    pub width: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

impl Default for RouteStyle {
    fn default() -> Self {
        Self {
            color: default_route_color(),
            width: default_route_width(),
            opacity: default_opacity(),
        }
    }
}

/// An ordered polyline draw-in animation belonging to exactly one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAnimation {
    pub id: String,
    pub segment_id: String,
    /// Playback ordering among a segment's routes (ascending).
    #[serde(default)]
    pub display_order: u32,
    /// Explicit start offset within the segment, overriding sequencing.
    #[serde(default)]
    pub start_time_ms: Option<u64>,
    /// Draw-in duration; a configured default applies when absent.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    pub path: Vec<LatLng>,
    #[serde(default)]
    pub style: RouteStyle,
}

/// One step of a narrated map tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub name: String,
    /// Time on screen before automatic advance; default 5000 ms.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub layers: Vec<LayerRef>,
    /// Authored viewport; auto-fit of rendered bounds applies when absent.
    #[serde(default)]
    pub camera: Option<CameraPose>,
}

impl Segment {
    /// Effective on-screen duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms.unwrap_or(DEFAULT_SEGMENT_DURATION_MS)
    }

    /// Content hash over the canonical JSON encoding of the segment.
    ///
    /// Two segments with equal hashes render identically; the playback
    /// controller uses this to make re-renders idempotent and to detect a
    /// new version of the same segment id arriving mid-session.
    pub fn content_hash(&self) -> ContentHash {
        let mut hasher = Sha256::new();
        match serde_json::to_vec(self) {
            Ok(bytes) => hasher.update(&bytes),
            // Serialization of an already-validated segment cannot fail;
            // hash the identity alone if it somehow does.
            Err(_) => hasher.update(self.id.as_bytes()),
        }
        ContentHash(hasher.finalize().into())
    }
}

/// SHA-256 digest of a segment's canonical encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 8 bytes are plenty for log correlation.
        for byte in &self.0[..8] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(name: &str) -> Segment {
        Segment {
            id: "s1".to_string(),
            name: name.to_string(),
            duration_ms: None,
            zones: vec![],
            locations: vec![],
            layers: vec![],
            camera: None,
        }
    }

    #[test]
    fn test_duration_default_applies() {
        assert_eq!(segment("a").duration_ms(), DEFAULT_SEGMENT_DURATION_MS);
        let mut custom = segment("a");
        custom.duration_ms = Some(2000);
        assert_eq!(custom.duration_ms(), 2000);
    }

    #[test]
    fn test_content_hash_stable_and_sensitive() {
        let a = segment("intro");
        let b = segment("intro");
        let c = segment("renamed");
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn test_zone_label_fallback_chain() {
        let mut zone = Zone {
            id: "z1".to_string(),
            name: Some("Old Town".to_string()),
            geometry: ZoneGeometry::Polygon { rings: vec![] },
            style: ZoneStyle::default(),
            label_anchor: None,
        };
        assert_eq!(zone.label(), None);

        zone.style.show_label = true;
        assert_eq!(zone.label(), Some("Old Town"));

        zone.style.label_text = Some("Altstadt".to_string());
        assert_eq!(zone.label(), Some("Altstadt"));

        zone.name = None;
        zone.style.label_text = None;
        assert_eq!(zone.label(), Some("z1"));
    }
}
