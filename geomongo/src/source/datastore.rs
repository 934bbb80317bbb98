use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::common::SYSTEM_COLLECTION_PREFIX;
use crate::errors::{ErrorKind, GeoMongoError, GeoMongoResult};
use crate::feature::Schema;
use crate::geometry::GeometryFactory;
use crate::mapper::MapperSelection;
use crate::source::{AppendFeatureWriter, FeatureReader, FeatureSource, FeatureWriter, Query};
use crate::store::{ConnectionParams, DocumentStore, DocumentStoreProvider};

/// Exposes the collections of a document store as feature types.
///
/// Every collection except `system.*` is a feature type. Each type gets one
/// [FeatureSource], created on first use with the mapper configured for it
/// and cached for the life of the data store.
///
/// ```rust
/// use geomongo::doc;
/// use geomongo::source::{DataStore, Query};
/// use geomongo::store::memory::InMemoryDocumentStore;
/// use geomongo::store::ConnectionParams;
///
/// let store = InMemoryDocumentStore::new();
/// store.create_collection("places");
///
/// let datastore = DataStore::builder()
///     .connection(ConnectionParams::new("test"))
///     .open(store)
///     .unwrap();
/// assert_eq!(datastore.type_names().unwrap(), vec!["places"]);
/// assert_eq!(datastore.feature_source("places").unwrap().count(&Query::new("places")).unwrap(), Some(0));
/// ```
pub struct DataStore {
    store: DocumentStore,
    default_selection: MapperSelection,
    selections: HashMap<String, MapperSelection>,
    factory: GeometryFactory,
    sources: DashMap<String, Arc<FeatureSource>>,
}

impl DataStore {
    pub fn builder() -> DataStoreBuilder {
        DataStoreBuilder::new()
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn geometry_factory(&self) -> &GeometryFactory {
        &self.factory
    }

    /// Names of all feature types, in store order.
    pub fn type_names(&self) -> GeoMongoResult<Vec<String>> {
        Ok(self
            .store
            .collection_names()?
            .into_iter()
            .filter(|name| !name.starts_with(SYSTEM_COLLECTION_PREFIX))
            .collect())
    }

    /// The feature source of a type.
    ///
    /// # Errors
    ///
    /// [ErrorKind::CollectionNotFound] when the type does not exist.
    pub fn feature_source(&self, type_name: &str) -> GeoMongoResult<Arc<FeatureSource>> {
        if let Some(source) = self.sources.get(type_name) {
            return Ok(source.clone());
        }

        if !self.type_names()?.iter().any(|name| name == type_name) {
            log::error!("No feature type named {}", type_name);
            return Err(GeoMongoError::new(
                &format!("No feature type named {}", type_name),
                ErrorKind::CollectionNotFound,
            ));
        }

        let selection = self
            .selections
            .get(type_name)
            .unwrap_or(&self.default_selection);
        let collection = self.store.collection(type_name)?;
        let source = Arc::new(FeatureSource::open(
            type_name,
            collection,
            selection,
            &self.factory,
        )?);

        Ok(self
            .sources
            .entry(type_name.to_string())
            .or_insert(source)
            .clone())
    }

    pub fn schema(&self, type_name: &str) -> GeoMongoResult<Arc<Schema>> {
        self.feature_source(type_name)?.schema()
    }

    /// Opens a reader on the type the query names.
    pub fn feature_reader(&self, query: &Query) -> GeoMongoResult<FeatureReader> {
        self.feature_source(query.type_name())?.reader(query)
    }

    /// Opens an append writer on a type.
    pub fn feature_writer_append(&self, type_name: &str) -> GeoMongoResult<FeatureWriter> {
        let source = self.feature_source(type_name)?;
        Ok(FeatureWriter::Append(AppendFeatureWriter::new(
            source.collection().clone(),
            source.mapper().clone(),
        )))
    }

    pub fn dispose(&self) -> GeoMongoResult<()> {
        self.sources.clear();
        self.store.close()
    }
}

/// Configures and opens a [DataStore]. Errors raised while configuring are
/// kept and reported by [DataStoreBuilder::open].
#[derive(Default)]
pub struct DataStoreBuilder {
    error: Option<GeoMongoError>,
    default_selection: MapperSelection,
    selections: HashMap<String, MapperSelection>,
    factory: GeometryFactory,
    connection: Option<ConnectionParams>,
}

impl DataStoreBuilder {
    pub fn new() -> Self {
        DataStoreBuilder::default()
    }

    /// The mapper used by every type without its own.
    pub fn mapper(mut self, selection: MapperSelection) -> Self {
        self.default_selection = selection;
        self
    }

    /// The mapper of one type.
    pub fn mapper_for(mut self, type_name: &str, selection: MapperSelection) -> Self {
        self.selections.insert(type_name.to_string(), selection);
        self
    }

    pub fn geometry_factory(mut self, factory: GeometryFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn connection(mut self, params: ConnectionParams) -> Self {
        self.connection = Some(params);
        self
    }

    /// Reads the connection from `host`, `port`, `database`, `user` and
    /// `passwd` entries.
    pub fn connection_params(mut self, params: &HashMap<String, String>) -> Self {
        if self.error.is_none() {
            match ConnectionParams::from_params(params) {
                Ok(params) => self.connection = Some(params),
                Err(e) => self.error = Some(e),
            }
        }
        self
    }

    /// Connects to the store and opens the data store.
    pub fn open<T: DocumentStoreProvider + 'static>(self, provider: T) -> GeoMongoResult<DataStore> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let params = match self.connection {
            Some(params) => params,
            None => {
                log::error!("No connection parameters given");
                return Err(GeoMongoError::new(
                    "No connection parameters given",
                    ErrorKind::ValidationError,
                ));
            }
        };

        let store = DocumentStore::new(provider);
        store.connect(&params).map_err(|e| {
            log::error!("Failed to connect to {}: {}", params, e);
            e
        })?;
        log::debug!("Data store opened on {}", params);

        Ok(DataStore {
            store,
            default_selection: self.default_selection,
            selections: self.selections,
            factory: self.factory,
            sources: DashMap::new(),
        })
    }
}
