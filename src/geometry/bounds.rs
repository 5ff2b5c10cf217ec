use geo::{BoundingRect, MultiPolygon};
use serde::Serialize;

/// Axis-aligned bounding box in coordinate units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Bounds of every ring coordinate of a shape, `None` when the shape is empty
    pub fn from_shape(shape: &MultiPolygon<f64>) -> Option<Self> {
        shape.bounding_rect().map(|rect| Self {
            min_x: rect.min().x,
            max_x: rect.max().x,
            min_y: rect.min().y,
            max_y: rect.max().y,
        })
    }

    /// Grow by a margin on every side.
    ///
    /// The margin is a fraction of the larger side, but at least `min_pad`,
    /// so a renderer can frame the shape with some context around it.
    pub fn padded(&self, fraction: f64, min_pad: f64) -> Self {
        let pad = (self.width().max(self.height()) * fraction).max(min_pad);
        Self {
            min_x: self.min_x - pad,
            max_x: self.max_x + pad,
            min_y: self.min_y - pad,
            max_y: self.max_y + pad,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_bounds_empty() {
        assert!(Bounds::from_shape(&MultiPolygon(vec![])).is_none());
    }

    #[test]
    fn test_bounds_from_shape_and_padding() {
        let square = polygon![
            (x: -1.0, y: 2.0),
            (x: 3.0, y: 2.0),
            (x: 3.0, y: 4.0),
            (x: -1.0, y: 4.0),
        ];
        let bounds = Bounds::from_shape(&MultiPolygon(vec![square])).unwrap();
        assert_eq!(bounds.width(), 4.0);
        assert_eq!(bounds.height(), 2.0);

        // 10% of 4.0 is below the minimum pad
        let padded = bounds.padded(0.1, 1.0);
        assert_eq!(padded.min_x, -2.0);
        assert_eq!(padded.max_y, 5.0);
    }
}
