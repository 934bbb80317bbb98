//! Feature filters, their native translation and the split between what the
//! document store evaluates and what is evaluated in-process.

mod capabilities;
#[allow(clippy::module_inception)]
mod filter;
mod translator;

pub use capabilities::*;
pub use filter::*;
pub use translator::*;
