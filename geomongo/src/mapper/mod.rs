//! Collection mappers translate between raw documents and features.
//!
//! A mapper is chosen once per feature source, either explicitly through
//! [MapperSelection] or by sampling one document with
//! [CollectionMapper::detect], and never changes afterwards.

mod adhoc;
mod detect;
mod geojson;

pub use adhoc::*;
pub use geojson::*;

use std::sync::Arc;

use crate::collection::Document;
use crate::common::Value;
use crate::errors::{ErrorKind, GeoMongoError, GeoMongoResult};
use crate::feature::{Feature, Schema};
use crate::geometry::{Geometry, GeometryFactory};

/// Capabilities every collection mapper provides.
pub trait Mapper {
    /// Dotted path of the raw geometry coordinates inside a document. Spatial
    /// predicates are evaluated against this path.
    fn geometry_path(&self) -> &str;

    /// Path that must be projected for the geometry to be decodable.
    fn geometry_projection_path(&self) -> &str;

    /// Logical name of the geometry attribute.
    fn geometry_attribute_name(&self) -> &str;

    /// Document path of a non-geometry attribute.
    fn property_path(&self, name: &str) -> String;

    fn geometry_factory(&self) -> &GeometryFactory;

    /// Builds the schema of a feature type, optionally from a sample document.
    fn build_schema(&self, type_name: &str, sample: Option<&Document>) -> GeoMongoResult<Schema>;

    /// Decodes one document into a feature of the given schema.
    fn decode_feature(&self, document: &Document, schema: &Arc<Schema>) -> GeoMongoResult<Feature>;

    /// Encodes a geometry the way this mapper stores it.
    fn encode_geometry(&self, geometry: &Geometry) -> GeoMongoResult<Value>;

    /// Reads the geometry of a document; `None` when the document has none.
    fn read_geometry(&self, document: &Document) -> GeoMongoResult<Option<Geometry>>;

    fn write_geometry(&self, document: &mut Document, geometry: &Geometry) -> GeoMongoResult<()>;
}

/// The mapping strategy of one feature source.
#[derive(Debug, Clone)]
pub enum CollectionMapper {
    GeoJson(GeoJsonMapper),
    AdHoc(AdHocMapper),
}

impl CollectionMapper {
    fn inner(&self) -> &dyn Mapper {
        match self {
            CollectionMapper::GeoJson(mapper) => mapper,
            CollectionMapper::AdHoc(mapper) => mapper,
        }
    }

    pub fn is_geojson(&self) -> bool {
        matches!(self, CollectionMapper::GeoJson(_))
    }

    /// Checks if `name` refers to the geometry, either by attribute name or
    /// by geometry path.
    pub fn is_geometry_reference(&self, name: &str) -> bool {
        name == self.geometry_attribute_name() || name == self.geometry_path()
    }
}

impl Mapper for CollectionMapper {
    fn geometry_path(&self) -> &str {
        self.inner().geometry_path()
    }

    fn geometry_projection_path(&self) -> &str {
        self.inner().geometry_projection_path()
    }

    fn geometry_attribute_name(&self) -> &str {
        self.inner().geometry_attribute_name()
    }

    fn property_path(&self, name: &str) -> String {
        self.inner().property_path(name)
    }

    fn geometry_factory(&self) -> &GeometryFactory {
        self.inner().geometry_factory()
    }

    fn build_schema(&self, type_name: &str, sample: Option<&Document>) -> GeoMongoResult<Schema> {
        self.inner().build_schema(type_name, sample)
    }

    fn decode_feature(&self, document: &Document, schema: &Arc<Schema>) -> GeoMongoResult<Feature> {
        self.inner().decode_feature(document, schema)
    }

    fn encode_geometry(&self, geometry: &Geometry) -> GeoMongoResult<Value> {
        self.inner().encode_geometry(geometry)
    }

    fn read_geometry(&self, document: &Document) -> GeoMongoResult<Option<Geometry>> {
        self.inner().read_geometry(document)
    }

    fn write_geometry(&self, document: &mut Document, geometry: &Geometry) -> GeoMongoResult<()> {
        self.inner().write_geometry(document, geometry)
    }
}

/// How the mapper of a feature source is chosen.
#[derive(Debug, Clone, Default)]
pub enum MapperSelection {
    GeoJson,
    AdHoc(AdHocMapper),
    /// Sample one document of the collection and guess.
    #[default]
    AutoDetect,
}

impl MapperSelection {
    /// Resolves the selection into a mapper. `sample` is only consulted for
    /// [MapperSelection::AutoDetect]; without a sample, detection falls back
    /// to the GeoJSON mapper.
    pub fn resolve(
        &self,
        sample: Option<&Document>,
        factory: &GeometryFactory,
    ) -> GeoMongoResult<CollectionMapper> {
        match self {
            MapperSelection::GeoJson => Ok(CollectionMapper::GeoJson(GeoJsonMapper::new(
                factory.clone(),
            ))),
            MapperSelection::AdHoc(mapper) => Ok(CollectionMapper::AdHoc(mapper.clone())),
            MapperSelection::AutoDetect => match sample {
                Some(sample) => CollectionMapper::detect(sample, factory),
                None => {
                    log::warn!("No sample document to detect the mapper from, using GeoJSON");
                    Ok(CollectionMapper::GeoJson(GeoJsonMapper::new(factory.clone())))
                }
            },
        }
    }
}

/// The feature identifier: the string form of the document's `_id`.
pub(crate) fn feature_id(document: &Document) -> GeoMongoResult<String> {
    match document.id() {
        Some(id) if !id.is_null() => Ok(id.to_id_string()),
        _ => {
            log::error!("Document has no identifier: {}", document);
            Err(GeoMongoError::new(
                "Document has no identifier",
                ErrorKind::MalformedDocument,
            ))
        }
    }
}
