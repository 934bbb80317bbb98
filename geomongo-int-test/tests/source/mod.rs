//! Feature source integration tests.
//!
//! These run the data store, readers and writers against the in-memory
//! document store.

mod datastore_test;
mod pushdown_test;
mod reader_test;
mod writer_test;
