//! The in-memory document store.

mod collection;
mod store;

pub use collection::*;
pub use store::*;
