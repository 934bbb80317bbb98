use std::sync::Arc;

use crate::collection::Document;
use crate::common::{Value, DEFAULT_GEOMETRY_PATH, DOC_ID};
use crate::errors::{ErrorKind, GeoMongoError, GeoMongoResult};
use crate::feature::{AttributeType, Feature, FeatureValue, Schema};
use crate::geometry::{CoordinateCodec, GeoJsonCodec, Geometry, GeometryFactory};
use crate::mapper::{feature_id, Mapper};

/// How a two-key document such as `{"lng": 1.0, "lat": 2.0}` is read as a
/// point.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CoordinateKeyOrder {
    /// The first key is x, the second is y.
    #[default]
    InsertionOrder,
    /// The keys are looked up by name.
    Named { x: String, y: String },
}

/// Maps collections that keep their geometry at an arbitrary path.
///
/// The geometry field may hold a coordinate array (`[x, y]`, a list of
/// positions or a list of rings), a two-key document of numbers or a tagged
/// GeoJSON geometry. All other top-level keys except `_id` are attributes,
/// addressed by their own names.
#[derive(Debug, Clone)]
pub struct AdHocMapper {
    geometry_path: String,
    key_order: CoordinateKeyOrder,
    coordinate_codec: CoordinateCodec,
    geojson_codec: GeoJsonCodec,
}

impl AdHocMapper {
    pub fn new(geometry_path: &str) -> Self {
        AdHocMapper {
            geometry_path: geometry_path.to_string(),
            key_order: CoordinateKeyOrder::default(),
            coordinate_codec: CoordinateCodec::default(),
            geojson_codec: GeoJsonCodec::default(),
        }
    }

    pub fn with_factory(mut self, factory: GeometryFactory) -> Self {
        self.coordinate_codec = CoordinateCodec::new(factory.clone());
        self.geojson_codec = GeoJsonCodec::new(factory);
        self
    }

    pub fn with_key_order(mut self, key_order: CoordinateKeyOrder) -> Self {
        self.key_order = key_order;
        self
    }

    pub fn key_order(&self) -> &CoordinateKeyOrder {
        &self.key_order
    }

    /// Checks if the document keeps its geometry under a nested path.
    pub fn is_nested(&self) -> bool {
        self.geometry_root() != self.geometry_path
    }

    /// Top-level key that holds (or contains) the geometry.
    fn geometry_root(&self) -> &str {
        self.geometry_path
            .split('.')
            .next()
            .unwrap_or(&self.geometry_path)
    }

    fn decode_pair(&self, pair: &Document) -> GeoMongoResult<Geometry> {
        let (x, y) = match &self.key_order {
            CoordinateKeyOrder::InsertionOrder => {
                if pair.size() != 2 {
                    return ambiguous(&self.geometry_path, pair);
                }
                match (pair.get_index(0), pair.get_index(1)) {
                    (Some((_, x)), Some((_, y))) => (x, y),
                    _ => return ambiguous(&self.geometry_path, pair),
                }
            }
            CoordinateKeyOrder::Named { x, y } => match (pair.get(x), pair.get(y)) {
                (Some(x), Some(y)) => (x, y),
                _ => return ambiguous(&self.geometry_path, pair),
            },
        };

        match (x.as_decimal(), y.as_decimal()) {
            (Some(x), Some(y)) => Ok(self.geometry_factory().point(x, y)),
            _ => ambiguous(&self.geometry_path, pair),
        }
    }
}

impl Default for AdHocMapper {
    fn default() -> Self {
        AdHocMapper::new(DEFAULT_GEOMETRY_PATH)
    }
}

fn ambiguous<T>(path: &str, value: &Document) -> GeoMongoResult<T> {
    log::error!("Cannot read a geometry at '{}' from {}", path, value);
    Err(GeoMongoError::new(
        &format!("Cannot read a geometry at '{}' from a document value", path),
        ErrorKind::AmbiguousGeometryField,
    ))
}

impl Mapper for AdHocMapper {
    fn geometry_path(&self) -> &str {
        &self.geometry_path
    }

    fn geometry_projection_path(&self) -> &str {
        &self.geometry_path
    }

    fn geometry_attribute_name(&self) -> &str {
        &self.geometry_path
    }

    fn property_path(&self, name: &str) -> String {
        name.to_string()
    }

    fn geometry_factory(&self) -> &GeometryFactory {
        self.coordinate_codec.factory()
    }

    fn build_schema(&self, type_name: &str, sample: Option<&Document>) -> GeoMongoResult<Schema> {
        let mut builder =
            Schema::builder(type_name).geometry(&self.geometry_path, self.geometry_factory().srid());

        if let Some(sample) = sample {
            for (name, value) in sample.iter() {
                if name != DOC_ID && name != self.geometry_root() {
                    builder = builder.attribute(name, AttributeType::of_value(value));
                }
            }
        }

        Ok(builder.build())
    }

    fn decode_feature(&self, document: &Document, schema: &Arc<Schema>) -> GeoMongoResult<Feature> {
        let mut builder = Feature::builder(schema.clone());
        builder.set_id(feature_id(document)?);

        for descriptor in schema.attributes() {
            let name = descriptor.name();
            if name == self.geometry_path {
                match self.read_geometry(document)? {
                    Some(geometry) => builder.set_value(name, FeatureValue::Geometry(geometry)),
                    None => {
                        log::error!(
                            "Geometry path '{}' not found in document {}",
                            self.geometry_path,
                            document.get_or_null(DOC_ID)
                        );
                        return Err(GeoMongoError::new(
                            &format!("Geometry path '{}' not found", self.geometry_path),
                            ErrorKind::GeometryPathNotFound,
                        ));
                    }
                }
            } else if let Some(value) = document.get(name) {
                builder.set_value(name, FeatureValue::Value(value.clone()));
            }
        }

        Ok(builder.build())
    }

    /// Points, lines and polygons are stored as coordinate arrays; other
    /// geometries as tagged GeoJSON.
    fn encode_geometry(&self, geometry: &Geometry) -> GeoMongoResult<Value> {
        match geometry {
            Geometry::Point(_)
            | Geometry::LineString(_)
            | Geometry::LinearRing(_)
            | Geometry::Polygon(_) => self.coordinate_codec.encode(geometry),
            _ => Ok(Value::Document(self.geojson_codec.encode(geometry)?)),
        }
    }

    fn read_geometry(&self, document: &Document) -> GeoMongoResult<Option<Geometry>> {
        match document.get(&self.geometry_path) {
            None | Some(Value::Null) => Ok(None),
            Some(value @ Value::Array(_)) => Ok(Some(self.coordinate_codec.decode(value)?)),
            Some(value @ Value::Document(inner)) => {
                if GeoJsonCodec::is_tagged(value) {
                    Ok(Some(self.geojson_codec.decode(value)?))
                } else {
                    Ok(Some(self.decode_pair(inner)?))
                }
            }
            Some(other) => {
                log::error!("'{}' does not hold a geometry: {}", self.geometry_path, other);
                Err(GeoMongoError::new(
                    &format!("'{}' does not hold a geometry", self.geometry_path),
                    ErrorKind::MalformedDocument,
                ))
            }
        }
    }

    fn write_geometry(&self, document: &mut Document, geometry: &Geometry) -> GeoMongoResult<()> {
        let encoded = self.encode_geometry(geometry)?;
        document.put(&self.geometry_path, encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::geometry::Coordinate;

    fn sample(i: i32) -> Document {
        doc! {
            "_id": (format!("ft1.{}", i)),
            loc: [i, i],
            intProperty: i,
            stringProperty: "zero",
        }
    }

    #[test]
    fn paths() {
        let mapper = AdHocMapper::default();
        assert_eq!(mapper.geometry_path(), "loc");
        assert_eq!(mapper.geometry_projection_path(), "loc");
        assert_eq!(mapper.geometry_attribute_name(), "loc");
        assert_eq!(mapper.property_path("intProperty"), "intProperty");
        assert!(!mapper.is_nested());
        assert!(AdHocMapper::new("position.loc").is_nested());
    }

    #[test]
    fn schema_skips_id_and_geometry() {
        let schema = AdHocMapper::default().build_schema("ft1", Some(&sample(0))).unwrap();
        let names: Vec<&str> = schema.attribute_names().collect();
        assert_eq!(names, vec!["loc", "intProperty", "stringProperty"]);
        assert_eq!(schema.default_geometry(), Some("loc"));
    }

    #[test]
    fn decode_point_from_list() {
        let mapper = AdHocMapper::default();
        let schema = Arc::new(mapper.build_schema("ft1", Some(&sample(1))).unwrap());
        let feature = mapper.decode_feature(&sample(1), &schema).unwrap();
        assert_eq!(feature.id(), "ft1.1");
        assert_eq!(feature.default_geometry(), Some(&Geometry::point(1.0, 1.0)));
        assert_eq!(feature.value("stringProperty"), Some(&Value::from("zero")));
    }

    #[test]
    fn decode_pair_in_insertion_order() {
        let mapper = AdHocMapper::default();
        let document = doc! { "_id": 1, loc: { lng: 10.5, lat: 20 } };
        assert_eq!(mapper.read_geometry(&document).unwrap(), Some(Geometry::point(10.5, 20.0)));
    }

    #[test]
    fn decode_pair_by_name() {
        let mapper = AdHocMapper::default().with_key_order(CoordinateKeyOrder::Named {
            x: "lng".to_string(),
            y: "lat".to_string(),
        });
        let document = doc! { loc: { lat: 20, lng: 10 } };
        assert_eq!(mapper.read_geometry(&document).unwrap(), Some(Geometry::point(10.0, 20.0)));

        let document = doc! { loc: { x: 1, y: 2 } };
        let err = mapper.read_geometry(&document).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::AmbiguousGeometryField);
    }

    #[test]
    fn decode_tagged_geometry() {
        let mapper = AdHocMapper::new("geometry");
        let document = doc! {
            geometry: { type: "LineString", coordinates: [[0, 0], [1, 1]] }
        };
        let geometry = mapper.read_geometry(&document).unwrap().unwrap();
        assert_eq!(geometry.geometry_type(), "LineString");
    }

    #[test]
    fn ambiguous_documents() {
        let mapper = AdHocMapper::default();
        for document in [
            doc! { loc: { a: 1, b: 2, c: 3 } },
            doc! { loc: { a: 1, b: "two" } },
            doc! { loc: { a: 1 } },
        ] {
            let err = mapper.read_geometry(&document).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::AmbiguousGeometryField);
        }
    }

    #[test]
    fn scalar_geometry_is_malformed() {
        let err = AdHocMapper::default()
            .read_geometry(&doc! { loc: "here" })
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MalformedDocument);
    }

    #[test]
    fn missing_geometry_path() {
        let mapper = AdHocMapper::default();
        let schema = Arc::new(mapper.build_schema("ft1", None).unwrap());
        let err = mapper
            .decode_feature(&doc! { "_id": "a", other: [1, 1] }, &schema)
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::GeometryPathNotFound);
    }

    #[test]
    fn nested_geometry_path() {
        let mapper = AdHocMapper::new("position.loc");
        let mut document = doc! { "_id": "a", name: "x" };
        mapper.write_geometry(&mut document, &Geometry::point(1.0, 2.0)).unwrap();
        assert_eq!(document.to_json_string(), r#"{"_id":"a","name":"x","position":{"loc":[1.0,2.0]}}"#);
        assert_eq!(mapper.read_geometry(&document).unwrap(), Some(Geometry::point(1.0, 2.0)));
    }

    #[test]
    fn multi_geometries_are_stored_tagged() {
        let mapper = AdHocMapper::default();
        let geometry = Geometry::MultiPoint(vec![
            crate::geometry::Point::from_coordinate(Coordinate::new(0.0, 0.0)),
        ]);
        let mut document = Document::new();
        mapper.write_geometry(&mut document, &geometry).unwrap();
        assert_eq!(document.get("loc.type"), Some(&Value::from("MultiPoint")));
        assert_eq!(mapper.read_geometry(&document).unwrap(), Some(geometry));
    }
}
