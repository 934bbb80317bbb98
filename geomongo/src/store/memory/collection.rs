use indexmap::IndexMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::collection::Document;
use crate::common::{atomic, Atomic, ReadExecutor, Value, WriteExecutor};
use crate::errors::GeoMongoResult;
use crate::store::{
    project, sort_documents, DocumentCollectionProvider, DocumentCursor, DocumentCursorProvider,
    FindOptions, QueryMatcher,
};

/// A collection held in memory. Documents are kept in insertion order, which
/// is the natural order of `find`.
#[derive(Clone)]
pub struct InMemoryCollection {
    name: String,
    documents: Atomic<IndexMap<String, Document>>,
    open_cursors: Arc<AtomicUsize>,
}

impl InMemoryCollection {
    pub(crate) fn new(name: &str, open_cursors: Arc<AtomicUsize>) -> Self {
        InMemoryCollection {
            name: name.to_string(),
            documents: atomic(IndexMap::new()),
            open_cursors,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.read_with(|documents| documents.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matching(&self, query: &Document) -> GeoMongoResult<Vec<Document>> {
        let matcher = QueryMatcher::new(query);
        self.documents.read_with(|documents| {
            let mut matched = Vec::new();
            for document in documents.values() {
                if matcher.matches(document)? {
                    matched.push(document.clone());
                }
            }
            Ok(matched)
        })
    }
}

/// Keys distinguish `1` from `"1"`.
fn storage_key(id: &Value) -> String {
    id.to_string()
}

impl DocumentCollectionProvider for InMemoryCollection {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn find(&self, query: &Document, options: &FindOptions) -> GeoMongoResult<DocumentCursor> {
        let mut documents = self.matching(query)?;
        sort_documents(&mut documents, options.sort_spec());

        let skip = options.skip_count().unwrap_or(0) as usize;
        let limit = options.limit_count().map(|l| l as usize).unwrap_or(usize::MAX);
        let documents: Vec<Document> = documents
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|d| match options.projection_paths() {
                Some(paths) => project(&d, paths),
                None => d,
            })
            .collect();

        log::debug!(
            "find on {} with {} returned {} documents",
            self.name,
            query,
            documents.len()
        );
        Ok(DocumentCursor::new(MemoryCursor::new(
            documents,
            self.open_cursors.clone(),
        )))
    }

    fn count(&self, query: &Document) -> GeoMongoResult<u64> {
        Ok(self.matching(query)?.len() as u64)
    }

    fn save(&self, document: &mut Document) -> GeoMongoResult<()> {
        let id = match document.id() {
            Some(id) if !id.is_null() => id.clone(),
            _ => {
                let id = Value::from(uuid::Uuid::new_v4().to_string());
                document.set_id(id.clone());
                id
            }
        };

        let key = storage_key(&id);
        self.documents.write_with(|documents| {
            documents.insert(key, document.clone());
        });
        log::trace!("Saved document {} in {}", id, self.name);
        Ok(())
    }
}

/// A snapshot of the matched documents. Counts itself in the store's open
/// cursor counter until closed.
pub(crate) struct MemoryCursor {
    documents: std::vec::IntoIter<Document>,
    open_cursors: Arc<AtomicUsize>,
    closed: bool,
}

impl MemoryCursor {
    fn new(documents: Vec<Document>, open_cursors: Arc<AtomicUsize>) -> Self {
        open_cursors.fetch_add(1, Ordering::SeqCst);
        MemoryCursor {
            documents: documents.into_iter(),
            open_cursors,
            closed: false,
        }
    }
}

impl DocumentCursorProvider for MemoryCursor {
    fn next_document(&mut self) -> Option<GeoMongoResult<Document>> {
        if self.closed {
            return None;
        }
        self.documents.next().map(Ok)
    }

    fn close(&mut self) -> GeoMongoResult<()> {
        if !self.closed {
            self.closed = true;
            self.open_cursors.fetch_sub(1, Ordering::SeqCst);
            log::trace!("Cursor closed");
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
