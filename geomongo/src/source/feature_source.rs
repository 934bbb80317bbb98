use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::collection::Document;
use crate::common::{atomic, Atomic, ReadExecutor, WriteExecutor};
use crate::errors::GeoMongoResult;
use crate::feature::Schema;
use crate::filter::{Filter, FilterCapabilities, FilterSplitter, FilterToNative};
use crate::geometry::{BoundingBox, GeometryFactory};
use crate::mapper::{CollectionMapper, Mapper, MapperSelection};
use crate::source::{
    DecodedStream, FeatureReader, FeatureStream, FilteredStream, Query, WindowedStream,
};
use crate::store::{DocumentCollection, FindOptions};

/// What the planner can do natively for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryCapabilities {
    pub can_filter: bool,
    pub can_sort: bool,
    pub can_offset: bool,
    pub can_limit: bool,
    pub can_retype: bool,
}

/// How a query is executed: the native query and options sent to the store,
/// the residual filter evaluated in-process and the offset/limit applied
/// in-process when they could not be pushed down.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    native_query: Document,
    options: FindOptions,
    post_filter: Filter,
    offset: Option<u64>,
    limit: Option<u64>,
    empty: bool,
}

impl QueryPlan {
    fn empty() -> Self {
        QueryPlan {
            native_query: Document::new(),
            options: FindOptions::new(),
            post_filter: Filter::Exclude,
            offset: None,
            limit: None,
            empty: true,
        }
    }

    pub fn native_query(&self) -> &Document {
        &self.native_query
    }

    pub fn find_options(&self) -> &FindOptions {
        &self.options
    }

    pub fn post_filter(&self) -> &Filter {
        &self.post_filter
    }

    /// Offset applied after the residual filter.
    pub fn residual_offset(&self) -> Option<u64> {
        self.offset
    }

    /// Limit applied after the residual filter.
    pub fn residual_limit(&self) -> Option<u64> {
        self.limit
    }

    /// The query matches nothing and the store is not consulted.
    pub fn is_empty_result(&self) -> bool {
        self.empty
    }
}

impl Display for QueryPlan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.empty {
            return write!(f, "EMPTY");
        }
        write!(f, "find {} then {}", self.native_query, self.post_filter)
    }
}

/// The features of one collection.
///
/// The mapper is chosen when the source is opened and the schema is built
/// on first use; both stay fixed afterwards.
pub struct FeatureSource {
    type_name: String,
    collection: DocumentCollection,
    mapper: Arc<CollectionMapper>,
    splitter: FilterSplitter,
    schema: Atomic<Option<Arc<Schema>>>,
}

impl FeatureSource {
    /// Opens a source, sampling the first document of the collection when the
    /// mapper has to be detected.
    pub fn open(
        type_name: &str,
        collection: DocumentCollection,
        selection: &MapperSelection,
        factory: &GeometryFactory,
    ) -> GeoMongoResult<FeatureSource> {
        let sample = match selection {
            MapperSelection::AutoDetect => collection.first()?,
            _ => None,
        };
        let mapper = selection.resolve(sample.as_ref(), factory)?;
        log::debug!(
            "Opened feature source {} with {} mapper",
            type_name,
            if mapper.is_geojson() { "GeoJSON" } else { "ad-hoc" }
        );
        Ok(FeatureSource::new(type_name, collection, mapper))
    }

    pub fn new(type_name: &str, collection: DocumentCollection, mapper: CollectionMapper) -> Self {
        FeatureSource {
            type_name: type_name.to_string(),
            collection,
            mapper: Arc::new(mapper),
            splitter: FilterSplitter::new(FilterCapabilities::document_store()),
            schema: atomic(None),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn mapper(&self) -> &Arc<CollectionMapper> {
        &self.mapper
    }

    pub fn collection(&self) -> &DocumentCollection {
        &self.collection
    }

    pub fn capabilities(&self) -> QueryCapabilities {
        QueryCapabilities {
            can_filter: true,
            can_sort: true,
            can_offset: true,
            can_limit: true,
            can_retype: true,
        }
    }

    pub fn filter_capabilities(&self) -> &FilterCapabilities {
        self.splitter.capabilities()
    }

    /// The schema, built from the first document on first call.
    pub fn schema(&self) -> GeoMongoResult<Arc<Schema>> {
        if let Some(schema) = self.schema.read_with(|s| s.clone()) {
            return Ok(schema);
        }

        let sample = self.collection.first()?;
        let built = Arc::new(self.mapper.build_schema(&self.type_name, sample.as_ref())?);
        log::debug!("Built schema {}", built);

        // a concurrent first call may have won; keep whichever landed first
        Ok(self.schema.write_with(|s| s.get_or_insert(built).clone()))
    }

    fn path(&self, name: &str) -> String {
        if self.mapper.is_geometry_reference(name) {
            self.mapper.geometry_projection_path().to_string()
        } else {
            self.mapper.property_path(name)
        }
    }

    fn sort_path(&self, name: &str) -> String {
        if self.mapper.is_geometry_reference(name) {
            self.mapper.geometry_path().to_string()
        } else {
            self.mapper.property_path(name)
        }
    }

    /// Plans a query without running it.
    pub fn plan(&self, query: &Query) -> GeoMongoResult<QueryPlan> {
        let filter = query.filter_ref();
        if filter.is_exclude() {
            log::debug!("{} excludes everything", query);
            return Ok(QueryPlan::empty());
        }

        let (pre, post) = self.splitter.split(filter);
        if post.is_exclude() {
            return Ok(QueryPlan::empty());
        }
        let native_query = FilterToNative::new(&self.mapper).translate(&pre)?;

        let mut options = FindOptions::new();
        if let Some(names) = query.property_names() {
            let paths = names
                .iter()
                .map(|n| self.path(n))
                .chain(std::iter::once(
                    self.mapper.geometry_projection_path().to_string(),
                ))
                .chain(post.referenced_properties().iter().map(|n| self.path(n)))
                .unique()
                .collect();
            options = options.projection(paths);
        }

        for sort_by in query.sort_order() {
            options = options.sort_by(&self.sort_path(sort_by.property()), sort_by.order());
        }

        let (offset, limit) = if post.is_include() {
            if let Some(offset) = query.offset_count() {
                options = options.skip(offset);
            }
            if let Some(limit) = query.limit_count() {
                options = options.limit(limit);
            }
            (None, None)
        } else {
            (query.offset_count(), query.limit_count())
        };

        let plan = QueryPlan {
            native_query,
            options,
            post_filter: post,
            offset,
            limit,
            empty: false,
        };
        log::debug!("Planned {} as {}", query, plan);
        Ok(plan)
    }

    /// The schema of features returned for a query: the requested attributes
    /// plus the default geometry and whatever the residual filter reads.
    fn query_schema(&self, query: &Query, plan: &QueryPlan) -> GeoMongoResult<Arc<Schema>> {
        let schema = self.schema()?;
        let names = match query.property_names() {
            Some(names) => names,
            None => return Ok(schema),
        };

        let mut retained: Vec<String> = names.to_vec();
        if let Some(geometry) = schema.default_geometry() {
            retained.push(geometry.to_string());
        }
        retained.extend(
            plan.post_filter()
                .referenced_properties()
                .into_iter()
                .filter(|n| schema.contains(n)),
        );
        let retained: Vec<String> = retained.into_iter().unique().collect();
        Ok(Arc::new(schema.retype(&retained)))
    }

    /// Opens a reader over the features matching a query.
    pub fn reader(&self, query: &Query) -> GeoMongoResult<FeatureReader> {
        let plan = self.plan(query)?;
        let schema = self.query_schema(query, &plan)?;
        if plan.is_empty_result() {
            return Ok(FeatureReader::empty(schema));
        }

        let cursor = self
            .collection
            .find(plan.native_query(), plan.find_options())?;
        let mut stream: Box<dyn FeatureStream> = Box::new(DecodedStream::new(
            cursor,
            self.mapper.clone(),
            schema.clone(),
        ));

        if !plan.post_filter().is_include() {
            stream = Box::new(FilteredStream::new(stream, plan.post_filter().clone()));
        }
        if plan.residual_offset().is_some() || plan.residual_limit().is_some() {
            stream = Box::new(WindowedStream::new(
                stream,
                plan.residual_offset(),
                plan.residual_limit(),
            ));
        }

        Ok(FeatureReader::new(schema, stream))
    }

    /// Counts the features matching a query, or `None` when the count cannot
    /// be known without reading because part of the filter runs in-process.
    pub fn count(&self, query: &Query) -> GeoMongoResult<Option<u64>> {
        let filter = query.filter_ref();
        if filter.is_exclude() {
            return Ok(Some(0));
        }

        let total = if filter.is_include() {
            self.collection.count(&Document::new())?
        } else {
            let (pre, post) = self.splitter.split(filter);
            if post.is_exclude() {
                return Ok(Some(0));
            }
            if !post.is_include() {
                log::debug!("count of {} needs in-process filtering", query);
                return Ok(None);
            }
            let native_query = FilterToNative::new(&self.mapper).translate(&pre)?;
            self.collection.count(&native_query)?
        };

        let mut count = total.saturating_sub(query.offset_count().unwrap_or(0));
        if let Some(limit) = query.limit_count() {
            count = count.min(limit);
        }
        log::debug!("count of {} is {}", query, count);
        Ok(Some(count))
    }

    /// The union of the envelopes of every matching feature's default
    /// geometry; empty when nothing matches.
    pub fn bounds(&self, query: &Query) -> GeoMongoResult<BoundingBox> {
        let mut bounds = BoundingBox::empty();
        for feature in self.reader(query)? {
            if let Some(geometry) = feature?.default_geometry() {
                bounds.expand_to_include(&geometry.bounding_box());
            }
        }
        Ok(bounds)
    }
}
