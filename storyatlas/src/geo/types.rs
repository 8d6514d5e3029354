//! Core geographic types for the playback engine.
//!
//! Types here are plain value types: coordinates, bounding boxes, and camera
//! poses. Anything derived (padded fit bounds, interpolated route points) is
//! calculated by the functions in [`crate::geo`], not stored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum supported latitude in degrees.
pub const MIN_LAT: f64 = -90.0;
/// Maximum supported latitude in degrees.
pub const MAX_LAT: f64 = 90.0;
/// Minimum supported longitude in degrees.
pub const MIN_LON: f64 = -180.0;
/// Maximum supported longitude in degrees.
pub const MAX_LON: f64 = 180.0;
/// Minimum supported zoom level.
pub const MIN_ZOOM: f64 = 0.0;
/// Maximum supported zoom level.
pub const MAX_ZOOM: f64 = 22.0;

/// Errors produced when geographic inputs are out of range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoError {
    /// Latitude outside [-90, 90] or not finite.
    InvalidLatitude(f64),
    /// Longitude outside [-180, 180] or not finite.
    InvalidLongitude(f64),
    /// Zoom outside [0, 22] or not finite.
    InvalidZoom(f64),
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::InvalidLatitude(lat) => write!(f, "Invalid latitude: {}", lat),
            GeoError::InvalidLongitude(lng) => write!(f, "Invalid longitude: {}", lng),
            GeoError::InvalidZoom(zoom) => write!(f, "Invalid zoom level: {}", zoom),
        }
    }
}

impl std::error::Error for GeoError {}

/// A geographic coordinate in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees (positive = north).
    pub lat: f64,
    /// Longitude in degrees (positive = east).
    pub lng: f64,
}

impl LatLng {
    /// Create a new coordinate without validation.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validate that the coordinate is finite and in range.
    pub fn validate(&self) -> Result<(), GeoError> {
        if !self.lat.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&self.lat) {
            return Err(GeoError::InvalidLatitude(self.lat));
        }
        if !self.lng.is_finite() || !(MIN_LON..=MAX_LON).contains(&self.lng) {
            return Err(GeoError::InvalidLongitude(self.lng));
        }
        Ok(())
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

/// A geographic bounding box in degrees.
///
/// Always normalized: `south <= north` and `west <= east`. Bounds that
/// cross the antimeridian are not supported; callers author story maps in
/// a single hemisphere span, matching the map surface's fit primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    /// A degenerate bounds covering exactly one point.
    pub fn from_point(point: LatLng) -> Self {
        Self {
            south: point.lat,
            west: point.lng,
            north: point.lat,
            east: point.lng,
        }
    }

    /// Build bounds covering a set of points. Returns `None` for an empty set.
    pub fn from_points(points: &[LatLng]) -> Option<Self> {
        let mut iter = points.iter();
        let first = iter.next()?;
        let mut bounds = Self::from_point(*first);
        for p in iter {
            bounds.extend(*p);
        }
        Some(bounds)
    }

    /// Grow the bounds to include a point.
    pub fn extend(&mut self, point: LatLng) {
        self.south = self.south.min(point.lat);
        self.north = self.north.max(point.lat);
        self.west = self.west.min(point.lng);
        self.east = self.east.max(point.lng);
    }

    /// Union with another bounds.
    pub fn union(&self, other: &GeoBounds) -> GeoBounds {
        GeoBounds {
            south: self.south.min(other.south),
            west: self.west.min(other.west),
            north: self.north.max(other.north),
            east: self.east.max(other.east),
        }
    }

    /// Geographic center of the bounds.
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// Whether a point lies inside (or on the edge of) the bounds.
    pub fn contains(&self, point: LatLng) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lng >= self.west
            && point.lng <= self.east
    }

    /// Whether another bounds lies entirely inside this one.
    pub fn contains_bounds(&self, other: &GeoBounds) -> bool {
        other.south >= self.south
            && other.north <= self.north
            && other.west >= self.west
            && other.east <= self.east
    }

    /// Expand each edge by `ratio` of the corresponding span.
    ///
    /// Degenerate (point) bounds are padded by a small absolute margin so a
    /// single-location segment still produces a usable viewport.
    pub fn padded(&self, ratio: f64) -> GeoBounds {
        const MIN_SPAN_DEG: f64 = 0.002;
        let lat_pad = ((self.north - self.south) * ratio).max(MIN_SPAN_DEG);
        let lng_pad = ((self.east - self.west) * ratio).max(MIN_SPAN_DEG);
        GeoBounds {
            south: (self.south - lat_pad).max(MIN_LAT),
            west: (self.west - lng_pad).max(MIN_LON),
            north: (self.north + lat_pad).min(MAX_LAT),
            east: (self.east + lng_pad).min(MAX_LON),
        }
    }
}

impl fmt::Display for GeoBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.5},{:.5} → {:.5},{:.5}]",
            self.south, self.west, self.north, self.east
        )
    }
}

/// A viewport description: center coordinate plus zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Viewport center.
    pub center: LatLng,
    /// Zoom level (0 = whole world).
    pub zoom: f64,
}

impl CameraPose {
    /// Create a new pose without validation.
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self { center, zoom }
    }

    /// Validate center coordinate and zoom range.
    pub fn validate(&self) -> Result<(), GeoError> {
        self.center.validate()?;
        if !self.zoom.is_finite() || !(MIN_ZOOM..=MAX_ZOOM).contains(&self.zoom) {
            return Err(GeoError::InvalidZoom(self.zoom));
        }
        Ok(())
    }
}

impl fmt::Display for CameraPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ z{:.1}", self.center, self.zoom)
    }
}
