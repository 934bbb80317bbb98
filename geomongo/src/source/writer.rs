use std::sync::Arc;

use crate::collection::Document;
use crate::errors::{ErrorKind, GeoMongoError, GeoMongoResult};
use crate::feature::WriteFeature;
use crate::mapper::{feature_id, CollectionMapper};
use crate::store::DocumentCollection;

/// Writes features to a collection.
///
/// Only appending is supported today.
pub enum FeatureWriter {
    Append(AppendFeatureWriter),
}

impl FeatureWriter {
    /// Checks for an existing feature to update; never the case when
    /// appending.
    pub fn has_next(&self) -> bool {
        match self {
            FeatureWriter::Append(writer) => writer.has_next(),
        }
    }

    pub fn next(&mut self) -> GeoMongoResult<&mut WriteFeature> {
        match self {
            FeatureWriter::Append(writer) => writer.next(),
        }
    }

    pub fn write(&mut self) -> GeoMongoResult<String> {
        match self {
            FeatureWriter::Append(writer) => writer.write(),
        }
    }

    pub fn remove(&mut self) -> GeoMongoResult<()> {
        match self {
            FeatureWriter::Append(writer) => writer.remove(),
        }
    }

    pub fn close(&mut self) -> GeoMongoResult<()> {
        match self {
            FeatureWriter::Append(writer) => writer.close(),
        }
    }
}

/// Appends new features. Each [AppendFeatureWriter::next] starts an empty
/// feature and [AppendFeatureWriter::write] saves it.
pub struct AppendFeatureWriter {
    collection: DocumentCollection,
    mapper: Arc<CollectionMapper>,
    current: Option<WriteFeature>,
    closed: bool,
}

impl AppendFeatureWriter {
    pub fn new(collection: DocumentCollection, mapper: Arc<CollectionMapper>) -> Self {
        AppendFeatureWriter {
            collection,
            mapper,
            current: None,
            closed: false,
        }
    }

    pub fn has_next(&self) -> bool {
        false
    }

    /// Starts a new, empty feature, discarding an unwritten one.
    pub fn next(&mut self) -> GeoMongoResult<&mut WriteFeature> {
        self.ensure_open()?;
        if self.current.is_some() {
            log::warn!("Discarding a feature that was never written");
        }
        Ok(self
            .current
            .insert(WriteFeature::new(Document::new(), self.mapper.clone())))
    }

    /// Saves the current feature and returns its identifier. A failed save
    /// keeps the feature current so it can be written again.
    pub fn write(&mut self) -> GeoMongoResult<String> {
        self.ensure_open()?;
        let mut document = match &self.current {
            Some(feature) => feature.document().clone(),
            None => {
                log::error!("write called without a current feature");
                return Err(GeoMongoError::new(
                    "No current feature, call next first",
                    ErrorKind::NoCurrentFeature,
                ));
            }
        };

        self.collection.save(&mut document)?;
        self.current = None;
        let id = feature_id(&document)?;
        log::debug!("Appended feature {} to {}", id, self.collection.name());
        Ok(id)
    }

    pub fn remove(&mut self) -> GeoMongoResult<()> {
        log::error!("An append writer cannot remove features");
        Err(GeoMongoError::new(
            "An append writer cannot remove features",
            ErrorKind::UnsupportedOperation,
        ))
    }

    pub fn close(&mut self) -> GeoMongoResult<()> {
        self.closed = true;
        self.current = None;
        Ok(())
    }

    fn ensure_open(&self) -> GeoMongoResult<()> {
        if self.closed {
            log::error!("Feature writer is closed");
            return Err(GeoMongoError::new(
                "Feature writer is closed",
                ErrorKind::CursorClosed,
            ));
        }
        Ok(())
    }
}
