//! Geometry model, envelopes and the document encodings of geometries.

mod bounding_box;
mod codec;
mod factory;
#[allow(clippy::module_inception)]
mod geometry;

pub use bounding_box::*;
pub use codec::*;
pub use factory::*;
pub use geometry::*;
