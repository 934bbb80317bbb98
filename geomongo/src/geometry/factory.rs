use crate::errors::GeoMongoResult;
use crate::geometry::{BoundingBox, Coordinate, Geometry, LineString, LinearRing, Point, Polygon};

/// How ordinates are rounded when geometries are built.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PrecisionModel {
    /// Ordinates are kept as read.
    #[default]
    Floating,
    /// Ordinates are rounded to multiples of `1 / scale`; a scale of `1000.0`
    /// keeps three decimal places.
    Fixed { scale: f64 },
}

impl PrecisionModel {
    /// Rounds a single ordinate.
    pub fn make_precise(&self, value: f64) -> f64 {
        match self {
            PrecisionModel::Floating => value,
            PrecisionModel::Fixed { scale } if *scale > 0.0 && value.is_finite() => {
                (value * scale).round() / scale
            }
            PrecisionModel::Fixed { .. } => value,
        }
    }
}

/// Builds geometries with a fixed precision model and spatial reference.
///
/// Every mapper owns one factory, so all geometries decoded from one
/// collection share the same precision and SRID.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometryFactory {
    precision: PrecisionModel,
    srid: Option<i32>,
}

impl GeometryFactory {
    pub fn new(precision: PrecisionModel, srid: Option<i32>) -> Self {
        GeometryFactory { precision, srid }
    }

    /// Factory with a floating precision model for the given SRID.
    pub fn with_srid(srid: i32) -> Self {
        GeometryFactory {
            precision: PrecisionModel::Floating,
            srid: Some(srid),
        }
    }

    pub fn precision(&self) -> PrecisionModel {
        self.precision
    }

    pub fn srid(&self) -> Option<i32> {
        self.srid
    }

    pub fn coordinate(&self, x: f64, y: f64) -> Coordinate {
        Coordinate::new(
            self.precision.make_precise(x),
            self.precision.make_precise(y),
        )
    }

    pub fn point(&self, x: f64, y: f64) -> Geometry {
        Geometry::Point(self.create_point(x, y))
    }

    pub fn create_point(&self, x: f64, y: f64) -> Point {
        Point::from_coordinate(self.coordinate(x, y))
    }

    pub fn line_string(&self, coordinates: Vec<Coordinate>) -> GeoMongoResult<LineString> {
        LineString::new(self.precise_all(coordinates))
    }

    pub fn linear_ring(&self, coordinates: Vec<Coordinate>) -> GeoMongoResult<LinearRing> {
        LinearRing::new(self.precise_all(coordinates))
    }

    /// Builds a line, deciding between ring and line string by shape.
    pub fn line(&self, coordinates: Vec<Coordinate>) -> GeoMongoResult<Geometry> {
        Geometry::line(self.precise_all(coordinates))
    }

    pub fn polygon(&self, shell: LinearRing, holes: Vec<LinearRing>) -> Polygon {
        Polygon::new(shell, holes)
    }

    pub fn envelope(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Geometry {
        let min = self.coordinate(min_x, min_y);
        let max = self.coordinate(max_x, max_y);
        Geometry::Envelope(BoundingBox::new(min.x, min.y, max.x, max.y))
    }

    fn precise_all(&self, coordinates: Vec<Coordinate>) -> Vec<Coordinate> {
        match self.precision {
            PrecisionModel::Floating => coordinates,
            PrecisionModel::Fixed { .. } => coordinates
                .into_iter()
                .map(|c| self.coordinate(c.x, c.y))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floating_keeps_ordinates() {
        let factory = GeometryFactory::default();
        assert_eq!(factory.point(0.123456789, 1.5), Geometry::point(0.123456789, 1.5));
        assert_eq!(factory.srid(), None);
    }

    #[test]
    fn fixed_rounds_ordinates() {
        let factory = GeometryFactory::new(PrecisionModel::Fixed { scale: 100.0 }, Some(4326));
        assert_eq!(factory.point(1.23456, -7.891), Geometry::point(1.23, -7.89));
        assert_eq!(factory.srid(), Some(4326));

        let line = factory
            .line_string(vec![Coordinate::new(0.004, 0.0), Coordinate::new(1.006, 1.0)])
            .unwrap();
        assert_eq!(line.coordinates(), &[Coordinate::new(0.0, 0.0), Coordinate::new(1.01, 1.0)]);
    }

    #[test]
    fn fixed_precision_can_close_a_ring() {
        let factory = GeometryFactory::new(PrecisionModel::Fixed { scale: 10.0 }, None);
        let coordinates = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.001, 0.0),
        ];
        assert_eq!(factory.line(coordinates).unwrap().geometry_type(), "LinearRing");
    }

    #[test]
    fn invalid_scale_is_ignored() {
        let precision = PrecisionModel::Fixed { scale: 0.0 };
        assert_eq!(precision.make_precise(1.2345), 1.2345);
        assert_eq!(PrecisionModel::Fixed { scale: 10.0 }.make_precise(f64::NAN).is_nan(), true);
    }

    #[test]
    fn envelope_is_normalized() {
        let factory = GeometryFactory::with_srid(4326);
        assert_eq!(
            factory.envelope(2.0, 2.0, 0.0, 0.0),
            Geometry::envelope(0.0, 0.0, 2.0, 2.0)
        );
    }
}
