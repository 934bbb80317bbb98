//! Geometry types exposed as feature attributes.
//!
//! The variants follow the GeoJSON geometry model plus two shapes that have
//! no GeoJSON tag of their own: [LinearRing] (a closed line, the building
//! block of polygons) and [Geometry::Envelope] (a query rectangle).

use std::fmt::{self, Display};

use crate::errors::{ErrorKind, GeoMongoError, GeoMongoResult};
use crate::geometry::BoundingBox;

/// A 2D coordinate (x, y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculates the Euclidean distance to another coordinate.
    pub fn distance(&self, other: &Coordinate) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// A 2D point geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    coordinate: Coordinate,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            coordinate: Coordinate::new(x, y),
        }
    }

    pub fn from_coordinate(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }

    pub fn x(&self) -> f64 {
        self.coordinate.x
    }

    pub fn y(&self) -> f64 {
        self.coordinate.y
    }

    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }
}

/// An open sequence of at least two coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct LineString {
    coordinates: Vec<Coordinate>,
}

impl LineString {
    /// Creates a line string.
    ///
    /// # Errors
    ///
    /// Fails with [ErrorKind::InvalidGeometryEncoding] for fewer than two
    /// coordinates.
    pub fn new(coordinates: Vec<Coordinate>) -> GeoMongoResult<Self> {
        if coordinates.len() < 2 {
            log::error!("A line string needs at least 2 points, found {}", coordinates.len());
            return Err(GeoMongoError::new(
                &format!(
                    "A line string needs at least 2 points, found {}",
                    coordinates.len()
                ),
                ErrorKind::InvalidGeometryEncoding,
            ));
        }
        Ok(Self { coordinates })
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    /// Checks if the first and last coordinates are equal.
    pub fn is_closed(&self) -> bool {
        is_closed(&self.coordinates)
    }
}

/// A closed sequence of at least four coordinates whose first equals its last.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRing {
    coordinates: Vec<Coordinate>,
}

impl LinearRing {
    /// Creates a linear ring.
    ///
    /// # Errors
    ///
    /// Fails with [ErrorKind::InvalidGeometryEncoding] when the sequence is
    /// not closed or has fewer than four coordinates.
    pub fn new(coordinates: Vec<Coordinate>) -> GeoMongoResult<Self> {
        if !is_ring(&coordinates) {
            log::error!(
                "A linear ring must be closed and have at least 4 points, found {} points",
                coordinates.len()
            );
            return Err(GeoMongoError::new(
                "A linear ring must be closed and have at least 4 points",
                ErrorKind::InvalidGeometryEncoding,
            ));
        }
        Ok(Self { coordinates })
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }
}

/// A polygon with an exterior shell and optional holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    shell: LinearRing,
    holes: Vec<LinearRing>,
}

impl Polygon {
    pub fn new(shell: LinearRing, holes: Vec<LinearRing>) -> Self {
        Self { shell, holes }
    }

    pub fn shell(&self) -> &LinearRing {
        &self.shell
    }

    pub fn holes(&self) -> &[LinearRing] {
        &self.holes
    }

    /// Shell followed by the holes, in order.
    pub fn rings(&self) -> impl Iterator<Item = &LinearRing> {
        std::iter::once(&self.shell).chain(self.holes.iter())
    }

    /// Ray casting test; a point inside a hole is outside the polygon.
    pub fn contains_coordinate(&self, coordinate: &Coordinate) -> bool {
        point_in_ring(coordinate, self.shell.coordinates())
            && !self
                .holes
                .iter()
                .any(|hole| point_in_ring(coordinate, hole.coordinates()))
    }
}

/// Represents any geometry value of a feature.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    LineString(LineString),
    LinearRing(LinearRing),
    Polygon(Polygon),
    MultiPoint(Vec<Point>),
    MultiLineString(Vec<LineString>),
    MultiPolygon(Vec<Polygon>),
    GeometryCollection(Vec<Geometry>),
    /// A query rectangle; it has no wire encoding.
    Envelope(BoundingBox),
}

impl Geometry {
    /// Creates a point geometry.
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point(Point::new(x, y))
    }

    /// Creates an envelope geometry.
    pub fn envelope(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Geometry::Envelope(BoundingBox::new(min_x, min_y, max_x, max_y))
    }

    /// Builds a line from a coordinate sequence, deciding by shape alone:
    /// closed with at least four points is a [LinearRing], anything else a
    /// [LineString].
    pub fn line(coordinates: Vec<Coordinate>) -> GeoMongoResult<Self> {
        if is_ring(&coordinates) {
            Ok(Geometry::LinearRing(LinearRing::new(coordinates)?))
        } else {
            Ok(Geometry::LineString(LineString::new(coordinates)?))
        }
    }

    /// Name of the geometry type as used in GeoJSON `type` tags.
    pub fn geometry_type(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::LinearRing(_) => "LinearRing",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::MultiPolygon(_) => "MultiPolygon",
            Geometry::GeometryCollection(_) => "GeometryCollection",
            Geometry::Envelope(_) => "Envelope",
        }
    }

    pub fn as_point(&self) -> Option<&Point> {
        match self {
            Geometry::Point(p) => Some(p),
            _ => None,
        }
    }

    /// Every vertex of the geometry in encoding order.
    pub fn coordinates(&self) -> Vec<Coordinate> {
        let mut result = Vec::new();
        self.collect_coordinates(&mut result);
        result
    }

    /// Returns the envelope of the geometry; empty collections give an empty
    /// box.
    pub fn bounding_box(&self) -> BoundingBox {
        if let Geometry::Envelope(bbox) = self {
            return *bbox;
        }

        let mut bbox = BoundingBox::empty();
        for coordinate in self.coordinates() {
            bbox.expand_to_include_coordinate(&coordinate);
        }
        bbox
    }

    /// Checks if the two geometries share at least one point.
    ///
    /// Points, envelopes and polygons are tested exactly; other combinations
    /// fall back to envelope intersection.
    pub fn intersects(&self, other: &Geometry) -> bool {
        if !self.bounding_box().intersects(&other.bounding_box()) {
            return false;
        }

        match (self, other) {
            (Geometry::Point(p1), Geometry::Point(p2)) => p1 == p2,
            (Geometry::Point(p), Geometry::Envelope(bbox))
            | (Geometry::Envelope(bbox), Geometry::Point(p)) => bbox.contains_point(p.x(), p.y()),
            (Geometry::Point(p), Geometry::Polygon(polygon))
            | (Geometry::Polygon(polygon), Geometry::Point(p)) => {
                polygon.contains_coordinate(p.coordinate())
            }
            (Geometry::MultiPoint(points), other) | (other, Geometry::MultiPoint(points)) => points
                .iter()
                .any(|p| Geometry::Point(*p).intersects(other)),
            (Geometry::GeometryCollection(members), other)
            | (other, Geometry::GeometryCollection(members)) => {
                members.iter().any(|m| m.intersects(other))
            }
            _ => true,
        }
    }

    /// Checks if `other` lies entirely inside this geometry. Only envelopes
    /// and polygons have an interior; other shapes compare envelopes.
    pub fn contains(&self, other: &Geometry) -> bool {
        match (self, other) {
            (Geometry::Envelope(bbox), other) => bbox.contains(&other.bounding_box()),
            (Geometry::Polygon(polygon), other) => {
                let coordinates = other.coordinates();
                !coordinates.is_empty()
                    && coordinates.iter().all(|c| polygon.contains_coordinate(c))
            }
            _ => self.bounding_box().contains(&other.bounding_box()),
        }
    }

    fn collect_coordinates(&self, result: &mut Vec<Coordinate>) {
        match self {
            Geometry::Point(p) => result.push(*p.coordinate()),
            Geometry::LineString(line) => result.extend_from_slice(line.coordinates()),
            Geometry::LinearRing(ring) => result.extend_from_slice(ring.coordinates()),
            Geometry::Polygon(polygon) => {
                for ring in polygon.rings() {
                    result.extend_from_slice(ring.coordinates());
                }
            }
            Geometry::MultiPoint(points) => result.extend(points.iter().map(|p| *p.coordinate())),
            Geometry::MultiLineString(lines) => {
                for line in lines {
                    result.extend_from_slice(line.coordinates());
                }
            }
            Geometry::MultiPolygon(polygons) => {
                for polygon in polygons {
                    for ring in polygon.rings() {
                        result.extend_from_slice(ring.coordinates());
                    }
                }
            }
            Geometry::GeometryCollection(members) => {
                for member in members {
                    member.collect_coordinates(result);
                }
            }
            Geometry::Envelope(bbox) => {
                if !bbox.is_empty() {
                    result.push(Coordinate::new(bbox.min_x, bbox.min_y));
                    result.push(Coordinate::new(bbox.max_x, bbox.max_y));
                }
            }
        }
    }
}

impl Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn sequence(coordinates: &[Coordinate]) -> String {
            let parts: Vec<String> = coordinates.iter().map(|c| c.to_string()).collect();
            format!("({})", parts.join(", "))
        }

        fn polygon_body(polygon: &Polygon) -> String {
            let rings: Vec<String> = polygon.rings().map(|r| sequence(r.coordinates())).collect();
            format!("({})", rings.join(", "))
        }

        match self {
            Geometry::Point(p) => write!(f, "POINT ({})", p.coordinate()),
            Geometry::LineString(line) => write!(f, "LINESTRING {}", sequence(line.coordinates())),
            Geometry::LinearRing(ring) => write!(f, "LINEARRING {}", sequence(ring.coordinates())),
            Geometry::Polygon(polygon) => write!(f, "POLYGON {}", polygon_body(polygon)),
            Geometry::MultiPoint(points) => {
                let coords: Vec<Coordinate> = points.iter().map(|p| *p.coordinate()).collect();
                write!(f, "MULTIPOINT {}", sequence(&coords))
            }
            Geometry::MultiLineString(lines) => {
                let parts: Vec<String> = lines.iter().map(|l| sequence(l.coordinates())).collect();
                write!(f, "MULTILINESTRING ({})", parts.join(", "))
            }
            Geometry::MultiPolygon(polygons) => {
                let parts: Vec<String> = polygons.iter().map(polygon_body).collect();
                write!(f, "MULTIPOLYGON ({})", parts.join(", "))
            }
            Geometry::GeometryCollection(members) => {
                let parts: Vec<String> = members.iter().map(|m| m.to_string()).collect();
                write!(f, "GEOMETRYCOLLECTION ({})", parts.join(", "))
            }
            Geometry::Envelope(bbox) => write!(f, "{}", bbox),
        }
    }
}

fn is_closed(coordinates: &[Coordinate]) -> bool {
    match (coordinates.first(), coordinates.last()) {
        (Some(first), Some(last)) => first == last,
        _ => false,
    }
}

fn is_ring(coordinates: &[Coordinate]) -> bool {
    coordinates.len() >= 4 && is_closed(coordinates)
}

fn point_in_ring(point: &Coordinate, ring: &[Coordinate]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let n = ring.len();
    let mut j = n - 1;

    for i in 0..n {
        let xi = ring[i].x;
        let yi = ring[i].y;
        let xj = ring[j].x;
        let yj = ring[j].y;

        if ((yi > point.y) != (yj > point.y))
            && (point.x < (xj - xi) * (point.y - yi) / (yj - yi) + xi)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}
