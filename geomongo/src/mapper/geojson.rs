use std::sync::Arc;

use crate::collection::Document;
use crate::common::{Value, COORDINATES, FIELD_SEPARATOR, GEOMETRY, PROPERTIES};
use crate::errors::{ErrorKind, GeoMongoError, GeoMongoResult};
use crate::feature::{AttributeType, Feature, FeatureValue, Schema};
use crate::geometry::{GeoJsonCodec, Geometry, GeometryFactory};
use crate::mapper::{feature_id, Mapper};

/// Maps collections whose documents are GeoJSON features:
///
/// ```text
/// {"_id": .., "geometry": {"type": .., "coordinates": ..}, "properties": {..}}
/// ```
///
/// The geometry attribute is named `geometry`; every other attribute lives
/// under `properties`.
#[derive(Debug, Clone)]
pub struct GeoJsonMapper {
    codec: GeoJsonCodec,
    geometry_path: String,
}

impl GeoJsonMapper {
    pub fn new(factory: GeometryFactory) -> Self {
        GeoJsonMapper {
            codec: GeoJsonCodec::new(factory),
            geometry_path: format!("{}{}{}", GEOMETRY, FIELD_SEPARATOR, COORDINATES),
        }
    }

    fn properties<'a>(&self, document: &'a Document) -> GeoMongoResult<Option<&'a Document>> {
        match document.get(PROPERTIES) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Document(properties)) => Ok(Some(properties)),
            Some(other) => {
                log::error!("'{}' must be a document, found {}", PROPERTIES, other);
                Err(GeoMongoError::new(
                    &format!("'{}' must be a document", PROPERTIES),
                    ErrorKind::MalformedDocument,
                ))
            }
        }
    }
}

impl Default for GeoJsonMapper {
    fn default() -> Self {
        GeoJsonMapper::new(GeometryFactory::default())
    }
}

impl Mapper for GeoJsonMapper {
    fn geometry_path(&self) -> &str {
        &self.geometry_path
    }

    fn geometry_projection_path(&self) -> &str {
        GEOMETRY
    }

    fn geometry_attribute_name(&self) -> &str {
        GEOMETRY
    }

    fn property_path(&self, name: &str) -> String {
        format!("{}{}{}", PROPERTIES, FIELD_SEPARATOR, name)
    }

    fn geometry_factory(&self) -> &GeometryFactory {
        self.codec.factory()
    }

    fn build_schema(&self, type_name: &str, sample: Option<&Document>) -> GeoMongoResult<Schema> {
        let mut builder = Schema::builder(type_name).geometry(GEOMETRY, self.geometry_factory().srid());

        if let Some(sample) = sample {
            if let Some(properties) = self.properties(sample)? {
                for (name, value) in properties.iter() {
                    builder = builder.attribute(name, AttributeType::of_value(value));
                }
            }
        }

        Ok(builder.build())
    }

    fn decode_feature(&self, document: &Document, schema: &Arc<Schema>) -> GeoMongoResult<Feature> {
        let mut builder = Feature::builder(schema.clone());
        builder.set_id(feature_id(document)?);

        // reads always project `geometry`, so a row without it is not a feature
        if !document.contains_key(GEOMETRY) {
            log::error!("Document {} has no '{}' field", document, GEOMETRY);
            return Err(GeoMongoError::new(
                &format!("Document has no '{}' field", GEOMETRY),
                ErrorKind::MalformedDocument,
            ));
        }

        let properties = self.properties(document)?;
        for descriptor in schema.attributes() {
            let name = descriptor.name();
            if name == GEOMETRY {
                if let Some(geometry) = self.read_geometry(document)? {
                    builder.set_value(name, FeatureValue::Geometry(geometry));
                }
            } else if let Some(value) = properties.and_then(|p| p.get(name)) {
                builder.set_value(name, FeatureValue::Value(value.clone()));
            }
        }

        Ok(builder.build())
    }

    fn encode_geometry(&self, geometry: &Geometry) -> GeoMongoResult<Value> {
        Ok(Value::Document(self.codec.encode(geometry)?))
    }

    fn read_geometry(&self, document: &Document) -> GeoMongoResult<Option<Geometry>> {
        match document.get(GEOMETRY) {
            None | Some(Value::Null) => Ok(None),
            Some(value @ Value::Document(_)) => Ok(Some(self.codec.decode(value)?)),
            Some(other) => {
                log::error!("'{}' must be a document, found {}", GEOMETRY, other);
                Err(GeoMongoError::new(
                    &format!("'{}' must be a document", GEOMETRY),
                    ErrorKind::MalformedDocument,
                ))
            }
        }
    }

    fn write_geometry(&self, document: &mut Document, geometry: &Geometry) -> GeoMongoResult<()> {
        let encoded = self.encode_geometry(geometry)?;
        document.put(GEOMETRY, encoded)
    }
}
