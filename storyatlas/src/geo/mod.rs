//! Geographic math for the playback engine.
//!
//! Provides the coordinate, bounds, and camera-pose types plus the geodesic
//! helpers used by the route animator: path length in meters and fractional
//! interpolation along a polyline for draw-in animation.

mod types;

pub use types::{
    CameraPose, GeoBounds, GeoError, LatLng, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON,
    MIN_ZOOM,
};

use std::f64::consts::PI;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates in meters.
#[inline]
pub fn haversine_m(a: LatLng, b: LatLng) -> f64 {
    let lat_a = a.lat * PI / 180.0;
    let lat_b = b.lat * PI / 180.0;
    let d_lat = (b.lat - a.lat) * PI / 180.0;
    let d_lng = (b.lng - a.lng) * PI / 180.0;

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Total length of a polyline in meters.
#[inline]
pub fn path_length_m(points: &[LatLng]) -> f64 {
    points.windows(2).map(|w| haversine_m(w[0], w[1])).sum()
}

/// Linear interpolation between two coordinates.
///
/// Accurate enough for draw-in animation at route scales; the error versus a
/// true great-circle slerp is far below one pixel at the zoom levels story
/// maps use.
#[inline]
fn lerp(a: LatLng, b: LatLng, t: f64) -> LatLng {
    LatLng::new(a.lat + (b.lat - a.lat) * t, a.lng + (b.lng - a.lng) * t)
}

/// Prefix of a polyline covering `fraction` of its total length.
///
/// Returns the leading vertices plus one interpolated end point, so a route
/// drawable can be extended smoothly as the fraction grows. `fraction` is
/// clamped to [0, 1]; a fraction of 0 (or a path shorter than two points)
/// yields an empty prefix, a fraction of 1 the full path.
pub fn path_prefix(points: &[LatLng], fraction: f64) -> Vec<LatLng> {
    if points.len() < 2 {
        return Vec::new();
    }
    let fraction = fraction.clamp(0.0, 1.0);
    if fraction == 0.0 {
        return Vec::new();
    }
    let total = path_length_m(points);
    if fraction >= 1.0 || total == 0.0 {
        return points.to_vec();
    }

    let target = total * fraction;
    let mut travelled = 0.0;
    let mut prefix = vec![points[0]];
    for w in points.windows(2) {
        let leg = haversine_m(w[0], w[1]);
        if travelled + leg >= target {
            let remainder = target - travelled;
            let t = if leg > 0.0 { remainder / leg } else { 1.0 };
            prefix.push(lerp(w[0], w[1], t));
            return prefix;
        }
        travelled += leg;
        prefix.push(w[1]);
    }
    prefix
}
