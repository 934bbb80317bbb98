//! Feature model: schemas, read-only features and document-backed write
//! features.

#[allow(clippy::module_inception)]
mod feature;
mod schema;
mod write_feature;

pub use feature::*;
pub use schema::*;
pub use write_feature::*;
