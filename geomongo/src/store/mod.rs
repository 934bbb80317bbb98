//! The outbound document store interface and its in-memory implementation.

mod config;
mod document_store;
mod matcher;
pub mod memory;

pub use config::*;
pub use document_store::*;
pub use matcher::*;
