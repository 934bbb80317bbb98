use std::sync::Arc;

use crate::collection::Document;
use crate::common::Value;
use crate::errors::{ErrorKind, GeoMongoError, GeoMongoResult};
use crate::feature::FeatureValue;
use crate::geometry::Geometry;
use crate::mapper::{CollectionMapper, Mapper};

/// A mutable feature backed by a document.
///
/// Attribute names are translated through the mapper's property path, so
/// `set_attribute("bom.bam", v)` on a GeoJSON collection writes
/// `{"properties": {"bom": {"bam": v}}}`. The geometry attribute is read and
/// written through the mapper's geometry encoding.
///
/// Positional access (`attribute_at`, `set_attribute_at`) addresses the
/// top-level keys of the backing document in document order.
#[derive(Debug, Clone)]
pub struct WriteFeature {
    document: Document,
    mapper: Arc<CollectionMapper>,
}

impl WriteFeature {
    pub fn new(document: Document, mapper: Arc<CollectionMapper>) -> Self {
        WriteFeature { document, mapper }
    }

    /// The identifier, once the backing document has been saved.
    pub fn id(&self) -> Option<String> {
        self.document.id().map(Value::to_id_string)
    }

    pub fn attribute(&self, name: &str) -> GeoMongoResult<Option<FeatureValue>> {
        if self.is_geometry_attribute(name) {
            return Ok(self.default_geometry()?.map(FeatureValue::Geometry));
        }

        let path = self.mapper.property_path(name);
        Ok(self.document.get(&path).cloned().map(FeatureValue::Value))
    }

    /// Writes an attribute. Geometry values are encoded with the mapper; the
    /// geometry attribute itself goes to the mapper's geometry location.
    pub fn set_attribute<T: Into<FeatureValue>>(&mut self, name: &str, value: T) -> GeoMongoResult<()> {
        let value = value.into();
        if self.is_geometry_attribute(name) {
            return match value {
                FeatureValue::Geometry(geometry) => self.set_default_geometry(&geometry),
                FeatureValue::Value(Value::Null) => {
                    self.document.remove(self.mapper.geometry_projection_path());
                    Ok(())
                }
                FeatureValue::Value(other) => {
                    log::error!("Geometry attribute '{}' cannot hold {}", name, other);
                    Err(GeoMongoError::new(
                        &format!("Geometry attribute '{}' cannot hold a non-geometry value", name),
                        ErrorKind::InvalidDataType,
                    ))
                }
            };
        }

        let path = self.mapper.property_path(name);
        let value = match value {
            FeatureValue::Geometry(geometry) => self.mapper.encode_geometry(&geometry)?,
            FeatureValue::Value(value) => value,
        };
        self.document.put(&path, value)
    }

    /// Returns the value of the top-level key at `index`.
    pub fn attribute_at(&self, index: usize) -> Option<&Value> {
        self.document.get_index(index).map(|(_, value)| value)
    }

    /// Replaces the value of the top-level key at `index`.
    pub fn set_attribute_at<T: Into<Value>>(&mut self, index: usize, value: T) -> GeoMongoResult<()> {
        let size = self.document.size();
        match self.document.get_index_mut(index) {
            Some((_, slot)) => {
                *slot = value.into();
                Ok(())
            }
            None => {
                log::error!("Attribute index {} out of bound {}", index, size);
                Err(GeoMongoError::new(
                    &format!("Attribute index {} out of bound {}", index, size),
                    ErrorKind::ValidationError,
                ))
            }
        }
    }

    pub fn attribute_count(&self) -> usize {
        self.document.size()
    }

    /// Top-level values in document order.
    pub fn attributes(&self) -> Vec<Value> {
        self.document.iter().map(|(_, value)| value.clone()).collect()
    }

    /// Bulk replacement is not supported.
    pub fn set_attributes(&mut self, _values: Vec<Value>) -> GeoMongoResult<()> {
        log::error!("Setting all attributes of a write feature at once is not supported");
        Err(GeoMongoError::new(
            "Setting all attributes of a write feature at once is not supported",
            ErrorKind::UnsupportedOperation,
        ))
    }

    pub fn default_geometry(&self) -> GeoMongoResult<Option<Geometry>> {
        self.mapper.read_geometry(&self.document)
    }

    pub fn set_default_geometry(&mut self, geometry: &Geometry) -> GeoMongoResult<()> {
        self.mapper.write_geometry(&mut self.document, geometry)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    fn is_geometry_attribute(&self, name: &str) -> bool {
        name == self.mapper.geometry_attribute_name() || name == self.mapper.geometry_path()
    }
}
