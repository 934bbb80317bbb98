use std::ops::Deref;
use std::sync::Arc;

use crate::collection::Document;
use crate::common::SortOrder;
use crate::errors::GeoMongoResult;
use crate::store::ConnectionParams;

/// Options of a `find` call besides the query itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    projection: Option<Vec<String>>,
    skip: Option<u64>,
    limit: Option<u64>,
    sort: Vec<(String, SortOrder)>,
}

impl FindOptions {
    pub fn new() -> Self {
        FindOptions::default()
    }

    /// Restricts returned documents to these dotted paths; `_id` is always
    /// returned.
    pub fn projection(mut self, paths: Vec<String>) -> Self {
        self.projection = Some(paths);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort_by(mut self, path: &str, order: SortOrder) -> Self {
        self.sort.push((path.to_string(), order));
        self
    }

    pub fn projection_paths(&self) -> Option<&[String]> {
        self.projection.as_deref()
    }

    pub fn skip_count(&self) -> Option<u64> {
        self.skip
    }

    pub fn limit_count(&self) -> Option<u64> {
        self.limit
    }

    pub fn sort_spec(&self) -> &[(String, SortOrder)] {
        &self.sort
    }

    /// The sort specification in native form, `{path: 1 | -1, ..}`.
    pub fn native_sort(&self) -> Document {
        let mut sort = Document::new();
        for (path, order) in &self.sort {
            sort.put_field(path, order.native());
        }
        sort
    }
}

/// A forward-only stream of documents held open on the store side.
pub trait DocumentCursorProvider: Send {
    /// `None` once the cursor is exhausted or closed.
    fn next_document(&mut self) -> Option<GeoMongoResult<Document>>;

    /// Releases the server side resources. Closing twice is a no-op.
    fn close(&mut self) -> GeoMongoResult<()>;

    fn is_closed(&self) -> bool;
}

/// Owns a store cursor and releases it on [DocumentCursor::close] or when
/// dropped.
pub struct DocumentCursor {
    inner: Box<dyn DocumentCursorProvider>,
}

impl DocumentCursor {
    pub fn new<T: DocumentCursorProvider + 'static>(inner: T) -> Self {
        DocumentCursor {
            inner: Box::new(inner),
        }
    }

    pub fn close(&mut self) -> GeoMongoResult<()> {
        self.inner.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

impl Iterator for DocumentCursor {
    type Item = GeoMongoResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next_document()
    }
}

impl Drop for DocumentCursor {
    fn drop(&mut self) {
        if !self.inner.is_closed() {
            if let Err(e) = self.inner.close() {
                log::error!("Failed to close cursor on drop: {}", e);
            }
        }
    }
}

/// One collection of a document store.
pub trait DocumentCollectionProvider: Send + Sync {
    fn name(&self) -> String;

    /// Opens a cursor over the documents matching a native query.
    fn find(&self, query: &Document, options: &FindOptions) -> GeoMongoResult<DocumentCursor>;

    /// Counts the documents matching a native query.
    fn count(&self, query: &Document) -> GeoMongoResult<u64>;

    /// Inserts or replaces a document by `_id`. A document without `_id` gets
    /// one assigned, written back into `document`.
    fn save(&self, document: &mut Document) -> GeoMongoResult<()>;
}

#[derive(Clone)]
pub struct DocumentCollection {
    inner: Arc<dyn DocumentCollectionProvider>,
}

impl DocumentCollection {
    pub fn new<T: DocumentCollectionProvider + 'static>(inner: T) -> Self {
        DocumentCollection {
            inner: Arc::new(inner),
        }
    }

    /// The first document of the collection in natural order.
    pub fn first(&self) -> GeoMongoResult<Option<Document>> {
        let mut cursor = self.inner.find(&Document::new(), &FindOptions::new().limit(1))?;
        let first = cursor.next().transpose();
        cursor.close()?;
        first
    }
}

impl Deref for DocumentCollection {
    type Target = Arc<dyn DocumentCollectionProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Outbound interface to a document store.
pub trait DocumentStoreProvider: Send + Sync {
    /// Connects and authenticates. Must succeed before any other call.
    fn connect(&self, params: &ConnectionParams) -> GeoMongoResult<()>;

    fn is_connected(&self) -> bool;

    fn collection_names(&self) -> GeoMongoResult<Vec<String>>;

    fn collection(&self, name: &str) -> GeoMongoResult<DocumentCollection>;

    fn close(&self) -> GeoMongoResult<()>;
}

#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<dyn DocumentStoreProvider>,
}

impl DocumentStore {
    pub fn new<T: DocumentStoreProvider + 'static>(inner: T) -> Self {
        DocumentStore {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for DocumentStore {
    type Target = Arc<dyn DocumentStoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
