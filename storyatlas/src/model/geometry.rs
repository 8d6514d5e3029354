//! Zone geometry: polygons and multipolygons.

use serde::{Deserialize, Serialize};

use crate::geo::{GeoBounds, GeoError, LatLng};

/// Polygon or multipolygon geometry for a zone.
///
/// Rings are authored in outer-first order; inner rings (holes) follow. The
/// engine only needs ring vertices for bounds and label placement, so winding
/// order is not enforced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ZoneGeometry {
    Polygon { rings: Vec<Vec<LatLng>> },
    MultiPolygon { polygons: Vec<Vec<Vec<LatLng>>> },
}

impl ZoneGeometry {
    /// All rings of the geometry, flattened.
    pub fn rings(&self) -> Vec<&[LatLng]> {
        match self {
            ZoneGeometry::Polygon { rings } => rings.iter().map(|r| r.as_slice()).collect(),
            ZoneGeometry::MultiPolygon { polygons } => polygons
                .iter()
                .flat_map(|p| p.iter().map(|r| r.as_slice()))
                .collect(),
        }
    }

    /// Bounding box over all rings. `None` when the geometry has no vertices.
    pub fn bounds(&self) -> Option<GeoBounds> {
        let mut bounds: Option<GeoBounds> = None;
        for ring in self.rings() {
            for point in ring {
                match bounds.as_mut() {
                    Some(b) => b.extend(*point),
                    None => bounds = Some(GeoBounds::from_point(*point)),
                }
            }
        }
        bounds
    }

    /// Number of vertices in the smallest ring, or 0 when there are no rings.
    ///
    /// Used by document validation to reject degenerate polygons.
    pub fn min_ring_len(&self) -> usize {
        self.rings().iter().map(|r| r.len()).min().unwrap_or(0)
    }

    /// Validate every vertex of every ring.
    pub fn validate(&self) -> Result<(), GeoError> {
        for ring in self.rings() {
            for point in ring {
                point.validate()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<LatLng> {
        vec![
            LatLng::new(53.0, 9.0),
            LatLng::new(53.0, 10.0),
            LatLng::new(54.0, 10.0),
            LatLng::new(54.0, 9.0),
        ]
    }

    #[test]
    fn test_polygon_bounds() {
        let geometry = ZoneGeometry::Polygon {
            rings: vec![square()],
        };
        let bounds = geometry.bounds().unwrap();
        assert_eq!(bounds.south, 53.0);
        assert_eq!(bounds.north, 54.0);
        assert_eq!(bounds.west, 9.0);
        assert_eq!(bounds.east, 10.0);
    }

    #[test]
    fn test_multipolygon_bounds_cover_all_parts() {
        let far = vec![
            LatLng::new(40.0, -4.0),
            LatLng::new(40.0, -3.0),
            LatLng::new(41.0, -3.0),
        ];
        let geometry = ZoneGeometry::MultiPolygon {
            polygons: vec![vec![square()], vec![far]],
        };
        let bounds = geometry.bounds().unwrap();
        assert_eq!(bounds.south, 40.0);
        assert_eq!(bounds.north, 54.0);
        assert_eq!(bounds.west, -4.0);
        assert_eq!(bounds.east, 10.0);
    }

    #[test]
    fn test_empty_geometry_has_no_bounds() {
        let geometry = ZoneGeometry::Polygon { rings: vec![] };
        assert!(geometry.bounds().is_none());
        assert_eq!(geometry.min_ring_len(), 0);
    }

    #[test]
    fn test_validate_rejects_bad_vertex() {
        let geometry = ZoneGeometry::Polygon {
            rings: vec![vec![
                LatLng::new(53.0, 9.0),
                LatLng::new(95.0, 10.0),
                LatLng::new(54.0, 10.0),
            ]],
        };
        assert!(geometry.validate().is_err());
    }
}
