use geo::{Area, CoordsIter, MultiPolygon, Polygon};
use serde::Serialize;

use crate::geometry::Bounds;

/// The published hazard shape together with the inward-offset shape it was
/// reduced from.
///
/// Every point of `shape` lies inside the source polygon. The shape is a
/// multipolygon because the inward offset may split a polygon at a narrow
/// waist into several parts.
#[derive(Debug, Clone)]
pub struct SimplifiedPolygon {
    shape: MultiPolygon<f64>,
    intermediate: MultiPolygon<f64>,
    epsilon: f64,
}

impl SimplifiedPolygon {
    pub(crate) fn new(
        shape: MultiPolygon<f64>,
        intermediate: MultiPolygon<f64>,
        epsilon: f64,
    ) -> Self {
        Self {
            shape,
            intermediate,
            epsilon,
        }
    }

    /// The shape to publish
    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    /// The true polygon shrunk inward by epsilon, before vertex reduction
    pub fn intermediate(&self) -> &MultiPolygon<f64> {
        &self.intermediate
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn vertex_count(&self) -> usize {
        ring_vertex_count(&self.shape)
    }

    pub fn intermediate_vertex_count(&self) -> usize {
        ring_vertex_count(&self.intermediate)
    }

    pub fn area(&self) -> f64 {
        self.shape.unsigned_area()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_shape(&self.shape)
    }
}

/// Counts distinct ring vertices, i.e. without the repeated closing coordinate.
pub fn ring_vertex_count(shape: &MultiPolygon<f64>) -> usize {
    shape
        .iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
        .map(|ring| ring.coords_count().saturating_sub(1))
        .sum()
}

/// Ring vertex lists of one polygon, outer ring first, as handed to a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RingSet {
    pub outer: Vec<(f64, f64)>,
    pub holes: Vec<Vec<(f64, f64)>>,
}

impl From<&Polygon<f64>> for RingSet {
    fn from(poly: &Polygon<f64>) -> Self {
        let ring = |ls: &geo::LineString<f64>| -> Vec<(f64, f64)> {
            ls.coords().map(|c| (c.x, c.y)).collect()
        };
        Self {
            outer: ring(poly.exterior()),
            holes: poly.interiors().iter().map(ring).collect(),
        }
    }
}

/// A named shape for the rendering collaborator, e.g. "true", "shrunk" or "published".
#[derive(Debug, Clone, Serialize)]
pub struct RenderedShape {
    pub label: String,
    pub polygons: Vec<RingSet>,
}

impl RenderedShape {
    pub fn new(label: impl Into<String>, shape: &MultiPolygon<f64>) -> Self {
        Self {
            label: label.into(),
            polygons: shape.iter().map(RingSet::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_ring_vertex_count_skips_closing_coord() {
        let square = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ];
        let shape = MultiPolygon(vec![square]);
        assert_eq!(ring_vertex_count(&shape), 4);
    }

    #[test]
    fn test_rendered_shape_lists_rings() {
        let poly = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)],
            interiors: [[(x: 1.0, y: 1.0), (x: 1.0, y: 2.0), (x: 2.0, y: 2.0), (x: 2.0, y: 1.0)]]
        );
        let rendered = RenderedShape::new("true", &MultiPolygon(vec![poly]));
        assert_eq!(rendered.polygons.len(), 1);
        assert_eq!(rendered.polygons[0].outer.len(), 5);
        assert_eq!(rendered.polygons[0].holes.len(), 1);

        let json = serde_json::to_value(&rendered).unwrap();
        assert_eq!(json["label"], "true");
        assert_eq!(json["polygons"][0]["outer"][1][0], 4.0);
    }
}
