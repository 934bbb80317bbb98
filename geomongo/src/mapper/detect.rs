use itertools::Itertools;

use crate::collection::Document;
use crate::common::{Value, DOC_ID, GEOMETRY, PROPERTIES};
use crate::errors::{ErrorKind, GeoMongoError, GeoMongoResult};
use crate::geometry::{CoordinateCodec, GeoJsonCodec, GeometryFactory};
use crate::mapper::{AdHocMapper, CollectionMapper, GeoJsonMapper};

/// Checks if a top-level value could be the geometry of an ad-hoc document.
fn is_geometry_candidate(value: &Value) -> bool {
    CoordinateCodec::is_position(value) || GeoJsonCodec::is_tagged(value)
}

impl CollectionMapper {
    /// Guesses the mapper of a collection from one sample document.
    ///
    /// A document with both `geometry` and `properties` keys is a GeoJSON
    /// feature. Otherwise the single top-level field holding a position
    /// (`[x, y]`) or a tagged GeoJSON geometry becomes the geometry path of an
    /// ad-hoc mapper.
    ///
    /// # Errors
    ///
    /// [ErrorKind::AmbiguousGeometryField] when no field or more than one
    /// field qualifies.
    pub fn detect(sample: &Document, factory: &GeometryFactory) -> GeoMongoResult<CollectionMapper> {
        if sample.contains_key(GEOMETRY) && sample.contains_key(PROPERTIES) {
            log::debug!("Detected GeoJSON layout");
            return Ok(CollectionMapper::GeoJson(GeoJsonMapper::new(factory.clone())));
        }

        let candidates = sample
            .iter()
            .filter(|(key, value)| key.as_str() != DOC_ID && is_geometry_candidate(value))
            .map(|(key, _)| key.as_str())
            .collect::<Vec<_>>();

        match candidates.as_slice() {
            [path] => {
                log::debug!("Detected ad-hoc layout with geometry at '{}'", path);
                Ok(CollectionMapper::AdHoc(
                    AdHocMapper::new(path).with_factory(factory.clone()),
                ))
            }
            [] => {
                log::error!("No geometry field found in sample document {}", sample);
                Err(GeoMongoError::new(
                    "No geometry field found in sample document",
                    ErrorKind::AmbiguousGeometryField,
                ))
            }
            many => {
                let fields = many.iter().join(", ");
                log::error!("Several candidate geometry fields: {}", fields);
                Err(GeoMongoError::new(
                    &format!("Several candidate geometry fields: {}", fields),
                    ErrorKind::AmbiguousGeometryField,
                ))
            }
        }
    }
}
