//! Feature sources: query planning, readers and writers, and the data store
//! that hands them out.

mod datastore;
mod feature_source;
mod query;
mod reader;
mod writer;

pub use datastore::*;
pub use feature_source::*;
pub use query::*;
pub use reader::*;
pub use writer::*;
