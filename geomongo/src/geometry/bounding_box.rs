use std::fmt::{Display, Formatter};

use crate::geometry::Coordinate;

/// A 2D bounding box represented by minimum and maximum coordinates.
///
/// A box can be empty, which is distinct from a box around a single point:
/// the empty box contains and intersects nothing, and expanding it by another
/// box yields that other box.
///
/// ```rust
/// use geomongo::geometry::BoundingBox;
///
/// let mut bounds = BoundingBox::empty();
/// bounds.expand_to_include(&BoundingBox::new(0.0, 0.0, 1.0, 1.0));
/// bounds.expand_to_include(&BoundingBox::new(2.0, 2.0, 2.0, 2.0));
/// assert_eq!(bounds, BoundingBox::new(0.0, 0.0, 2.0, 2.0));
/// ```
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct BoundingBox {
    /// Minimum X coordinate
    pub min_x: f64,
    /// Minimum Y coordinate
    pub min_y: f64,
    /// Maximum X coordinate
    pub max_x: f64,
    /// Maximum Y coordinate
    pub max_y: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox::empty()
    }
}

impl Display for BoundingBox {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "BoundingBox(EMPTY)")
        } else {
            write!(
                f,
                "BoundingBox({}, {}, {}, {})",
                self.min_x, self.min_y, self.max_x, self.max_y
            )
        }
    }
}

impl BoundingBox {
    /// Creates a new bounding box. The corners are normalized so that the
    /// minimum is always below the maximum.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> BoundingBox {
        BoundingBox {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    /// Creates the empty bounding box.
    pub fn empty() -> BoundingBox {
        BoundingBox {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Creates a degenerate box around a single coordinate.
    pub fn of_coordinate(coordinate: &Coordinate) -> BoundingBox {
        BoundingBox::new(coordinate.x, coordinate.y, coordinate.x, coordinate.y)
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_x - self.min_x
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_y - self.min_y
        }
    }

    /// Grows this box so that it also covers `other`.
    pub fn expand_to_include(&mut self, other: &BoundingBox) {
        if other.is_empty() {
            return;
        }
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Grows this box so that it also covers `coordinate`.
    pub fn expand_to_include_coordinate(&mut self, coordinate: &Coordinate) {
        self.expand_to_include(&BoundingBox::of_coordinate(coordinate));
    }

    /// Checks if the two boxes share at least one point; edges count.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Checks if `other` lies entirely inside this box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        !self.is_empty() && x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_corners() {
        let bbox = BoundingBox::new(2.0, 3.0, 0.0, 1.0);
        assert_eq!(bbox, BoundingBox::new(0.0, 1.0, 2.0, 3.0));
        assert_eq!(bbox.width(), 2.0);
        assert_eq!(bbox.height(), 2.0);
    }

    #[test]
    fn empty_box() {
        let empty = BoundingBox::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.width(), 0.0);
        assert!(!empty.intersects(&BoundingBox::new(0.0, 0.0, 1.0, 1.0)));
        assert!(!empty.contains_point(0.0, 0.0));
        assert_eq!(BoundingBox::default(), empty);
        assert_eq!(empty.to_string(), "BoundingBox(EMPTY)");
    }

    #[test]
    fn point_box_is_not_empty() {
        let bbox = BoundingBox::of_coordinate(&Coordinate::new(1.0, 1.0));
        assert!(!bbox.is_empty());
        assert!(bbox.contains_point(1.0, 1.0));
    }

    #[test]
    fn expand_ignores_empty() {
        let mut bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        bbox.expand_to_include(&BoundingBox::empty());
        assert_eq!(bbox, BoundingBox::new(0.0, 0.0, 1.0, 1.0));

        bbox.expand_to_include_coordinate(&Coordinate::new(-1.0, 5.0));
        assert_eq!(bbox, BoundingBox::new(-1.0, 0.0, 1.0, 5.0));
    }

    #[test]
    fn intersection_includes_edges() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(a.intersects(&BoundingBox::new(1.0, 1.0, 2.0, 2.0)));
        assert!(!a.intersects(&BoundingBox::new(1.5, 1.5, 2.0, 2.0)));
    }

    #[test]
    fn containment() {
        let outer = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(outer.contains(&BoundingBox::new(1.0, 1.0, 2.0, 2.0)));
        assert!(!outer.contains(&BoundingBox::new(9.0, 9.0, 11.0, 11.0)));
        assert!(!outer.contains(&BoundingBox::empty()));
    }
}
