#![allow(
    dead_code,
    clippy::approx_constant,
)]
//! # geomongo - geospatial features over document collections
//!
//! geomongo exposes the collections of a schemaless, MongoDB-shaped document
//! store as typed, filterable geospatial feature sources.
//!
//! ## Key Features
//!
//! - **Two document layouts**: GeoJSON features (`{geometry, properties}`)
//!   and ad-hoc documents with a coordinate field anywhere in the document
//! - **Layout detection**: the mapper of a collection can be guessed from a
//!   sample document or configured explicitly
//! - **Filter pushdown**: filters are split into a native query the store
//!   evaluates and a residual part evaluated in-process
//! - **Lazy readers**: features are decoded one document at a time from a
//!   store cursor that is always released
//! - **Append writer**: new features are written through the mapper
//! - **Pluggable store**: the store is reached through a small provider
//!   interface; an in-memory implementation is included
//!
//! ## Quick Start
//!
//! ```rust
//! use geomongo::doc;
//! use geomongo::filter::property;
//! use geomongo::source::{DataStore, Query};
//! use geomongo::store::memory::InMemoryDocumentStore;
//! use geomongo::store::{ConnectionParams, DocumentCollectionProvider};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryDocumentStore::new();
//! let places = store.create_collection("places");
//! places.save(&mut doc! {
//!     "_id": "p1",
//!     geometry: { type: "Point", coordinates: [1.5, 2.5] },
//!     properties: { name: "harbour", visitors: 120 }
//! })?;
//!
//! let datastore = DataStore::builder()
//!     .connection(ConnectionParams::new("geo"))
//!     .open(store)?;
//!
//! let query = Query::new("places").filter(property("visitors").gt(100));
//! for feature in datastore.feature_reader(&query)? {
//!     let feature = feature?;
//!     assert_eq!(feature.id(), "p1");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [collection]: documents and the `doc!` macro
//! - [common]: values, constants and shared helpers
//! - [geometry]: geometries, bounding boxes and the GeoJSON/coordinate codecs
//! - [feature]: schemas, features and write features
//! - [mapper]: the GeoJSON and ad-hoc collection mappers
//! - [filter]: filters, capabilities and the native query translator
//! - [store]: the document store interface and the in-memory store
//! - [source]: feature sources, readers, writers and the data store

pub mod collection;
pub mod common;
pub mod errors;
pub mod feature;
pub mod filter;
pub mod geometry;
pub mod mapper;
pub mod source;
pub mod store;
