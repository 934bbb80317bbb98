//! Conversion between geometries and their document encodings.
//!
//! [GeoJsonCodec] handles tagged objects such as
//! `{"type": "Point", "coordinates": [1.0, 2.0]}`. [CoordinateCodec] handles
//! bare coordinate arrays (`[x, y]`, `[[x, y], ...]`, `[[[x, y], ...], ...]`)
//! where the geometry type is decided by nesting depth and shape.

use crate::collection::Document;
use crate::common::{Value, COORDINATES, GEOMETRIES, TYPE};
use crate::errors::{ErrorKind, GeoMongoError, GeoMongoResult};
use crate::geometry::{Coordinate, Geometry, GeometryFactory, LineString, LinearRing, Point, Polygon};

fn invalid<T>(message: String) -> GeoMongoResult<T> {
    log::error!("{}", message);
    Err(GeoMongoError::new(&message, ErrorKind::InvalidGeometryEncoding))
}

fn unsupported<T>(geometry: &Geometry, codec: &str) -> GeoMongoResult<T> {
    log::error!("{} cannot be encoded by the {} codec", geometry.geometry_type(), codec);
    Err(GeoMongoError::new(
        &format!(
            "{} cannot be encoded by the {} codec",
            geometry.geometry_type(),
            codec
        ),
        ErrorKind::UnsupportedGeometryVariant,
    ))
}

/// Decodes one position. Extra ordinates (z, m) are dropped.
fn decode_position(value: &Value, factory: &GeometryFactory) -> GeoMongoResult<Coordinate> {
    let Some(ordinates) = value.as_array() else {
        return invalid(format!("Position must be an array, found {}", value));
    };

    if ordinates.len() < 2 {
        return invalid(format!(
            "Position needs at least 2 ordinates, found {}",
            ordinates.len()
        ));
    }

    match (ordinates[0].as_decimal(), ordinates[1].as_decimal()) {
        (Some(x), Some(y)) => Ok(factory.coordinate(x, y)),
        _ => invalid(format!("Position ordinates must be numbers, found {}", value)),
    }
}

fn decode_positions(value: &Value, factory: &GeometryFactory) -> GeoMongoResult<Vec<Coordinate>> {
    match value.as_array() {
        Some(items) => items.iter().map(|v| decode_position(v, factory)).collect(),
        None => invalid(format!("Expected an array of positions, found {}", value)),
    }
}

fn decode_line_string(value: &Value, factory: &GeometryFactory) -> GeoMongoResult<LineString> {
    LineString::new(decode_positions(value, factory)?)
}

fn decode_ring(value: &Value, factory: &GeometryFactory) -> GeoMongoResult<LinearRing> {
    LinearRing::new(decode_positions(value, factory)?)
}

fn decode_polygon(value: &Value, factory: &GeometryFactory) -> GeoMongoResult<Polygon> {
    let Some(rings) = value.as_array() else {
        return invalid(format!("Polygon must be an array of rings, found {}", value));
    };

    let mut rings = rings.iter();
    let Some(shell) = rings.next() else {
        return invalid("Polygon must have an exterior ring".to_string());
    };

    let shell = decode_ring(shell, factory)?;
    let holes = rings
        .map(|ring| decode_ring(ring, factory))
        .collect::<GeoMongoResult<Vec<_>>>()?;
    Ok(factory.polygon(shell, holes))
}

fn decode_array<T>(
    value: &Value,
    what: &str,
    decode: impl Fn(&Value) -> GeoMongoResult<T>,
) -> GeoMongoResult<Vec<T>> {
    match value.as_array() {
        Some(items) => items.iter().map(decode).collect(),
        None => invalid(format!("{} must be an array, found {}", what, value)),
    }
}

fn encode_position(coordinate: &Coordinate) -> Value {
    Value::Array(vec![Value::F64(coordinate.x), Value::F64(coordinate.y)])
}

fn encode_positions(coordinates: &[Coordinate]) -> Value {
    Value::Array(coordinates.iter().map(encode_position).collect())
}

fn encode_polygon(polygon: &Polygon) -> Value {
    Value::Array(
        polygon
            .rings()
            .map(|ring| encode_positions(ring.coordinates()))
            .collect(),
    )
}

/// Codec for tagged GeoJSON geometry objects.
#[derive(Debug, Clone, Default)]
pub struct GeoJsonCodec {
    factory: GeometryFactory,
}

impl GeoJsonCodec {
    pub fn new(factory: GeometryFactory) -> Self {
        GeoJsonCodec { factory }
    }

    pub fn factory(&self) -> &GeometryFactory {
        &self.factory
    }

    /// Checks if the value looks like a tagged geometry: a document with a
    /// string `type` key.
    pub fn is_tagged(value: &Value) -> bool {
        value
            .as_document()
            .and_then(|doc| doc.get(TYPE))
            .map(Value::is_string)
            .unwrap_or(false)
    }

    /// Decodes a tagged geometry object.
    ///
    /// # Errors
    ///
    /// [ErrorKind::InvalidGeometryEncoding] for an unknown tag, missing or
    /// ill-typed coordinates and wrong arity.
    pub fn decode(&self, value: &Value) -> GeoMongoResult<Geometry> {
        let Some(object) = value.as_document() else {
            return invalid(format!("Geometry must be a document, found {}", value));
        };

        let Some(tag) = object.get(TYPE).and_then(Value::as_string) else {
            return invalid(format!("Geometry has no type tag: {}", object));
        };

        if tag == "GeometryCollection" {
            let Some(members) = object.get(GEOMETRIES) else {
                return invalid("GeometryCollection has no geometries".to_string());
            };
            let members = decode_array(members, "geometries", |m| self.decode(m))?;
            return Ok(Geometry::GeometryCollection(members));
        }

        let Some(coordinates) = object.get(COORDINATES) else {
            return invalid(format!("{} has no coordinates", tag));
        };

        let factory = &self.factory;
        match tag.as_str() {
            "Point" => Ok(Geometry::Point(Point::from_coordinate(decode_position(
                coordinates,
                factory,
            )?))),
            "LineString" => Ok(Geometry::LineString(decode_line_string(coordinates, factory)?)),
            "Polygon" => Ok(Geometry::Polygon(decode_polygon(coordinates, factory)?)),
            "MultiPoint" => Ok(Geometry::MultiPoint(
                decode_positions(coordinates, factory)?
                    .into_iter()
                    .map(Point::from_coordinate)
                    .collect(),
            )),
            "MultiLineString" => Ok(Geometry::MultiLineString(decode_array(
                coordinates,
                "MultiLineString coordinates",
                |line| decode_line_string(line, factory),
            )?)),
            "MultiPolygon" => Ok(Geometry::MultiPolygon(decode_array(
                coordinates,
                "MultiPolygon coordinates",
                |polygon| decode_polygon(polygon, factory),
            )?)),
            other => invalid(format!("Unknown geometry type '{}'", other)),
        }
    }

    /// Encodes a geometry as a tagged object.
    ///
    /// # Errors
    ///
    /// [ErrorKind::UnsupportedGeometryVariant] for [Geometry::LinearRing] and
    /// [Geometry::Envelope], which have no GeoJSON tag.
    pub fn encode(&self, geometry: &Geometry) -> GeoMongoResult<Document> {
        let mut document = Document::new();
        document.put_field(TYPE, geometry.geometry_type());

        match geometry {
            Geometry::Point(p) => document.put_field(COORDINATES, encode_position(p.coordinate())),
            Geometry::LineString(line) => {
                document.put_field(COORDINATES, encode_positions(line.coordinates()))
            }
            Geometry::Polygon(polygon) => document.put_field(COORDINATES, encode_polygon(polygon)),
            Geometry::MultiPoint(points) => document.put_field(
                COORDINATES,
                Value::Array(points.iter().map(|p| encode_position(p.coordinate())).collect()),
            ),
            Geometry::MultiLineString(lines) => document.put_field(
                COORDINATES,
                Value::Array(lines.iter().map(|l| encode_positions(l.coordinates())).collect()),
            ),
            Geometry::MultiPolygon(polygons) => document.put_field(
                COORDINATES,
                Value::Array(polygons.iter().map(encode_polygon).collect()),
            ),
            Geometry::GeometryCollection(members) => {
                let members = members
                    .iter()
                    .map(|m| self.encode(m).map(Value::Document))
                    .collect::<GeoMongoResult<Vec<_>>>()?;
                document.put_field(GEOMETRIES, Value::Array(members));
            }
            Geometry::LinearRing(_) | Geometry::Envelope(_) => {
                return unsupported(geometry, "GeoJSON")
            }
        }

        Ok(document)
    }
}

/// Codec for bare coordinate arrays.
#[derive(Debug, Clone, Default)]
pub struct CoordinateCodec {
    factory: GeometryFactory,
}

impl CoordinateCodec {
    pub fn new(factory: GeometryFactory) -> Self {
        CoordinateCodec { factory }
    }

    pub fn factory(&self) -> &GeometryFactory {
        &self.factory
    }

    /// Checks if the value is a position: an array starting with two numbers.
    pub fn is_position(value: &Value) -> bool {
        match value.as_array() {
            Some(items) => items.len() >= 2 && items[0].is_number() && items[1].is_number(),
            None => false,
        }
    }

    /// Decodes a coordinate array by nesting depth: a position is a point, a
    /// list of positions is a line (a ring when closed with at least four
    /// points) and a list of lists is a polygon.
    pub fn decode(&self, value: &Value) -> GeoMongoResult<Geometry> {
        let Some(items) = value.as_array() else {
            return invalid(format!("Coordinates must be an array, found {}", value));
        };

        match items.first() {
            None => invalid("Coordinates must not be empty".to_string()),
            Some(first) if first.is_number() => Ok(Geometry::Point(Point::from_coordinate(
                decode_position(value, &self.factory)?,
            ))),
            Some(first) if CoordinateCodec::is_position(first) => {
                Geometry::line(decode_positions(value, &self.factory)?)
            }
            Some(first) if first.is_array() => {
                Ok(Geometry::Polygon(decode_polygon(value, &self.factory)?))
            }
            Some(first) => invalid(format!("Unexpected coordinate element {}", first)),
        }
    }

    /// Encodes a point, line, ring or polygon as a coordinate array.
    ///
    /// # Errors
    ///
    /// [ErrorKind::UnsupportedGeometryVariant] for multi geometries,
    /// collections and envelopes.
    pub fn encode(&self, geometry: &Geometry) -> GeoMongoResult<Value> {
        match geometry {
            Geometry::Point(p) => Ok(encode_position(p.coordinate())),
            Geometry::LineString(line) => Ok(encode_positions(line.coordinates())),
            Geometry::LinearRing(ring) => Ok(encode_positions(ring.coordinates())),
            Geometry::Polygon(polygon) => Ok(encode_polygon(polygon)),
            _ => unsupported(geometry, "coordinate"),
        }
    }
}
