use geo::{LineString, Polygon};
use serde::{Deserialize, Serialize};

/// A true hazard region as supplied by the input provider.
///
/// Vertices are `(x, y)` pairs; for geographic input that is `(lon, lat)`.
/// Rings may be open or closed, the conversion to `geo` closes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardPolygon {
    pub outer: Vec<(f64, f64)>,
    #[serde(default)]
    pub holes: Vec<Vec<(f64, f64)>>,
}

impl HazardPolygon {
    pub fn new(outer: Vec<(f64, f64)>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(outer: Vec<(f64, f64)>, holes: Vec<Vec<(f64, f64)>>) -> Self {
        Self { outer, holes }
    }

    /// The notched square with a rectangular hole used by the containment figure.
    pub fn demo() -> Self {
        Self::with_holes(
            vec![
                (0.0, 0.0),
                (7.0, 0.0),
                (7.0, 1.5),
                (4.0, 1.5),
                (4.0, 3.5),
                (7.0, 3.5),
                (7.0, 7.0),
                (0.0, 7.0),
            ],
            vec![vec![(1.5, 4.5), (1.5, 6.0), (5.0, 6.0), (5.0, 4.5)]],
        )
    }

    pub fn vertex_count(&self) -> usize {
        self.outer.len() + self.holes.iter().map(|h| h.len()).sum::<usize>()
    }

    pub fn to_geo(&self) -> Polygon<f64> {
        Polygon::new(
            to_line_string(&self.outer),
            self.holes.iter().map(|h| to_line_string(h)).collect(),
        )
    }
}

impl From<&HazardPolygon> for Polygon<f64> {
    fn from(hazard: &HazardPolygon) -> Self {
        hazard.to_geo()
    }
}

fn to_line_string(ring: &[(f64, f64)]) -> LineString<f64> {
    ring.iter().map(|&(x, y)| geo::coord! { x: x, y: y }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    #[test]
    fn test_to_geo_closes_rings() {
        let hazard = HazardPolygon::with_holes(
            vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)],
            vec![vec![(1.0, 1.0), (1.0, 2.0), (2.0, 2.0), (2.0, 1.0)]],
        );
        let poly = hazard.to_geo();
        assert!(poly.exterior().is_closed());
        assert_eq!(poly.exterior().0.len(), 5);
        assert_eq!(poly.interiors().len(), 1);
        assert!((poly.unsigned_area() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_demo_vertex_count() {
        let demo = HazardPolygon::demo();
        assert_eq!(demo.vertex_count(), 12);
        assert!((demo.to_geo().unsigned_area() - (49.0 - 6.0 - 5.25)).abs() < 1e-9);
    }

    #[test]
    fn test_deserialize_without_holes() {
        let hazard: HazardPolygon =
            serde_json::from_str(r#"{"outer": [[0, 0], [1, 0], [1, 1]]}"#).unwrap();
        assert_eq!(hazard.outer.len(), 3);
        assert!(hazard.holes.is_empty());
    }
}
