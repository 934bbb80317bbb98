use std::sync::Arc;

use crate::errors::GeoMongoResult;
use crate::feature::{Feature, Schema};
use crate::filter::Filter;
use crate::mapper::{CollectionMapper, Mapper};
use crate::store::DocumentCursor;

/// A stage of a feature reader pipeline.
pub trait FeatureStream: Iterator<Item = GeoMongoResult<Feature>> + Send {
    /// Releases whatever the stage holds open, including inner stages.
    fn close(&mut self) -> GeoMongoResult<()>;
}

/// Decodes documents from a store cursor.
pub(crate) struct DecodedStream {
    cursor: DocumentCursor,
    mapper: Arc<CollectionMapper>,
    schema: Arc<Schema>,
}

impl DecodedStream {
    pub(crate) fn new(cursor: DocumentCursor, mapper: Arc<CollectionMapper>, schema: Arc<Schema>) -> Self {
        DecodedStream {
            cursor,
            mapper,
            schema,
        }
    }
}

impl Iterator for DecodedStream {
    type Item = GeoMongoResult<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor.next()? {
            Ok(document) => Some(self.mapper.decode_feature(&document, &self.schema)),
            Err(e) => Some(Err(e)),
        }
    }
}

impl FeatureStream for DecodedStream {
    fn close(&mut self) -> GeoMongoResult<()> {
        self.cursor.close()
    }
}

/// Drops features the residual filter rejects.
pub(crate) struct FilteredStream {
    raw_stream: Box<dyn FeatureStream>,
    filter: Filter,
}

impl FilteredStream {
    pub(crate) fn new(raw_stream: Box<dyn FeatureStream>, filter: Filter) -> Self {
        FilteredStream { raw_stream, filter }
    }
}

impl Iterator for FilteredStream {
    type Item = GeoMongoResult<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.raw_stream.next()? {
                Ok(feature) => match self.filter.evaluate(&feature) {
                    Ok(true) => return Some(Ok(feature)),
                    Ok(false) => continue,
                    Err(e) => return Some(Err(e)),
                },
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl FeatureStream for FilteredStream {
    fn close(&mut self) -> GeoMongoResult<()> {
        self.raw_stream.close()
    }
}

/// Skips `offset` features and stops after `limit`. Errors pass through
/// without counting.
pub(crate) struct WindowedStream {
    raw_stream: Box<dyn FeatureStream>,
    to_skip: u64,
    remaining: Option<u64>,
}

impl WindowedStream {
    pub(crate) fn new(raw_stream: Box<dyn FeatureStream>, offset: Option<u64>, limit: Option<u64>) -> Self {
        WindowedStream {
            raw_stream,
            to_skip: offset.unwrap_or(0),
            remaining: limit,
        }
    }
}

impl Iterator for WindowedStream {
    type Item = GeoMongoResult<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            return None;
        }

        loop {
            match self.raw_stream.next()? {
                Ok(_) if self.to_skip > 0 => {
                    self.to_skip -= 1;
                }
                Ok(feature) => {
                    if let Some(remaining) = self.remaining.as_mut() {
                        *remaining -= 1;
                    }
                    return Some(Ok(feature));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl FeatureStream for WindowedStream {
    fn close(&mut self) -> GeoMongoResult<()> {
        self.raw_stream.close()
    }
}

struct EmptyStream;

impl Iterator for EmptyStream {
    type Item = GeoMongoResult<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        None
    }
}

impl FeatureStream for EmptyStream {
    fn close(&mut self) -> GeoMongoResult<()> {
        Ok(())
    }
}

/// A lazy, forward-only reader over the features of a query.
///
/// Each item is a `Result`: a document that fails to decode yields an `Err`
/// and reading may continue with the next one. The underlying cursor is
/// released by [FeatureReader::close] or when the reader is dropped.
pub struct FeatureReader {
    schema: Arc<Schema>,
    stream: Box<dyn FeatureStream>,
    peeked: Option<GeoMongoResult<Feature>>,
    closed: bool,
}

impl FeatureReader {
    pub(crate) fn new(schema: Arc<Schema>, stream: Box<dyn FeatureStream>) -> Self {
        FeatureReader {
            schema,
            stream,
            peeked: None,
            closed: false,
        }
    }

    /// A reader that yields nothing and holds no cursor.
    pub fn empty(schema: Arc<Schema>) -> Self {
        FeatureReader::new(schema, Box::new(EmptyStream))
    }

    /// The schema of the features this reader yields.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn has_next(&mut self) -> bool {
        if self.closed {
            return false;
        }
        if self.peeked.is_none() {
            self.peeked = self.stream.next();
        }
        self.peeked.is_some()
    }

    pub fn close(&mut self) -> GeoMongoResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.peeked = None;
        self.stream.close()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Iterator for FeatureReader {
    type Item = GeoMongoResult<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        match self.peeked.take() {
            Some(item) => Some(item),
            None => self.stream.next(),
        }
    }
}

impl Drop for FeatureReader {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!("Failed to close feature reader: {}", e);
        }
    }
}
