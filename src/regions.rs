// 🌍 Regions - country polygons from a GeoJSON FeatureCollection
// name is the join key to Record::country

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// `[lng, lat]` (extra ordinates such as altitude are ignored)
pub type Position = Vec<f64>;
pub type Ring = Vec<Position>;

// ============================================================================
// GEOMETRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

/// Signed shoelace area and area-weighted centroid of one ring.
fn ring_moments(ring: &[Position]) -> (f64, f64, f64) {
    let mut area2 = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;

    for pair in ring.windows(2) {
        let (x0, y0) = (pair[0][0], pair[0][1]);
        let (x1, y1) = (pair[1][0], pair[1][1]);
        let cross = x0 * y1 - x1 * y0;
        area2 += cross;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }

    let area = area2 / 2.0;
    if area.abs() < f64::EPSILON {
        // Degenerate ring: fall back to the vertex mean
        let n = ring.len().max(1) as f64;
        let mx = ring.iter().map(|p| p[0]).sum::<f64>() / n;
        let my = ring.iter().map(|p| p[1]).sum::<f64>() / n;
        return (0.0, mx, my);
    }
    (area, cx / (6.0 * area), cy / (6.0 * area))
}

fn valid_ring(ring: &[Position]) -> bool {
    ring.len() >= 2 && ring.iter().all(|p| p.len() >= 2)
}

/// Planar area (outer ring minus holes) and centroid `(lng, lat)` of a polygon.
fn polygon_moments(rings: &[Ring]) -> (f64, f64, f64) {
    let mut rings = rings.iter().filter(|r| valid_ring(r));
    let Some(outer) = rings.next() else {
        return (0.0, 0.0, 0.0);
    };

    let (outer_area, ox, oy) = ring_moments(outer);
    let mut area = outer_area.abs();
    let mut mx = ox * area;
    let mut my = oy * area;

    for hole in rings {
        let (hole_area, hx, hy) = ring_moments(hole);
        let hole_area = hole_area.abs();
        area -= hole_area;
        mx -= hx * hole_area;
        my -= hy * hole_area;
    }

    if area <= f64::EPSILON {
        return (0.0, ox, oy);
    }
    (area, mx / area, my / area)
}

impl Geometry {
    /// Total planar area in square degrees
    pub fn area(&self) -> f64 {
        match self {
            Geometry::Polygon(rings) => polygon_moments(rings).0,
            Geometry::MultiPolygon(polygons) => {
                polygons.iter().map(|p| polygon_moments(p).0).sum()
            }
        }
    }

    /// Centroid `(lat, lng)` of the largest polygon; for a MultiPolygon this
    /// keeps labels on the mainland instead of between islands.
    pub fn label_centroid(&self) -> (f64, f64) {
        let (_, lng, lat) = match self {
            Geometry::Polygon(rings) => polygon_moments(rings),
            Geometry::MultiPolygon(polygons) => polygons
                .iter()
                .map(|p| polygon_moments(p))
                .fold((f64::NEG_INFINITY, 0.0, 0.0), |best, m| {
                    if m.0 > best.0 {
                        m
                    } else {
                        best
                    }
                }),
        };
        (lat, lng)
    }
}

// ============================================================================
// REGION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub area: f64,
    pub geometry: Geometry,
}

impl Region {
    /// Label size on the globe, grows with sqrt(area)
    pub fn label_size(&self) -> f64 {
        const MIN: f64 = 0.3;
        const MAX: f64 = 3.0;
        MIN + (self.area.sqrt() * (MAX - MIN)) / 60.0
    }

    /// Camera altitude when zooming onto this region
    pub fn focus_altitude(&self) -> f64 {
        0.2 + (self.area.sqrt() * (1.0 - 0.2)) / 60.0
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: FeatureProperties,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    name: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
    #[serde(default)]
    area: Option<f64>,
}

impl From<Feature> for Region {
    fn from(feature: Feature) -> Self {
        let props = feature.properties;
        let (lat, lng) = match (props.lat, props.lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => {
                debug!(region = %props.name, "deriving centroid from geometry");
                feature.geometry.label_centroid()
            }
        };
        let area = props.area.unwrap_or_else(|| feature.geometry.area());

        Region {
            name: props.name,
            lat,
            lng,
            area,
            geometry: feature.geometry,
        }
    }
}

pub fn parse_regions(json: &str) -> Result<Vec<Region>> {
    let collection: FeatureCollection =
        serde_json::from_str(json).context("Failed to parse region FeatureCollection")?;
    Ok(collection.features.into_iter().map(Region::from).collect())
}

pub fn load_regions(path: &Path) -> Result<Vec<Region>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read regions file {}", path.display()))?;
    parse_regions(&content)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(x: f64, y: f64, size: f64) -> Ring {
        vec![
            vec![x, y],
            vec![x + size, y],
            vec![x + size, y + size],
            vec![x, y + size],
            vec![x, y],
        ]
    }

    #[test]
    fn test_polygon_area_and_centroid() {
        let geometry = Geometry::Polygon(vec![square(0.0, 0.0, 2.0)]);
        assert_relative_eq!(geometry.area(), 4.0);
        let (lat, lng) = geometry.label_centroid();
        assert_relative_eq!(lat, 1.0);
        assert_relative_eq!(lng, 1.0);
    }

    #[test]
    fn test_polygon_hole_is_subtracted() {
        let geometry = Geometry::Polygon(vec![square(0.0, 0.0, 4.0), square(1.0, 1.0, 1.0)]);
        assert_relative_eq!(geometry.area(), 15.0);
    }

    #[test]
    fn test_multipolygon_centroid_uses_largest_part() {
        let geometry = Geometry::MultiPolygon(vec![
            vec![square(100.0, 50.0, 1.0)],
            vec![square(10.0, 20.0, 4.0)],
        ]);
        assert_relative_eq!(geometry.area(), 17.0);
        let (lat, lng) = geometry.label_centroid();
        assert_relative_eq!(lat, 22.0);
        assert_relative_eq!(lng, 12.0);
    }

    #[test]
    fn test_parse_feature_collection() {
        let json = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"name":"Fiji","lat":-17.8,"lng":178.0,"area":1},
             "geometry":{"type":"MultiPolygon","coordinates":[[[[180.0,-16.0],[180.0,-17.0],[179.0,-17.0],[180.0,-16.0]]]]},"id":0},
            {"type":"Feature","properties":{"name":"Squareland"},
             "geometry":{"type":"Polygon","coordinates":[[[0,0],[2,0],[2,2],[0,2],[0,0]]]},"id":1}
        ]}"#;

        let regions = parse_regions(json).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].name, "Fiji");
        assert_relative_eq!(regions[0].lat, -17.8);
        assert_relative_eq!(regions[0].area, 1.0);

        // Missing properties are derived from the geometry
        assert_relative_eq!(regions[1].lat, 1.0);
        assert_relative_eq!(regions[1].area, 4.0);
    }

    #[test]
    fn test_label_size_and_focus_altitude() {
        let region = Region {
            name: "X".to_string(),
            lat: 0.0,
            lng: 0.0,
            area: 3600.0,
            geometry: Geometry::Polygon(vec![]),
        };
        assert_relative_eq!(region.label_size(), 3.0);
        assert_relative_eq!(region.focus_altitude(), 1.0);
    }
}
