// -----------------------------------------------------------------------------
// Modules

mod driver;
mod error_utils;

mod array_visitor;
mod element_seed;
mod enum_visitor;
mod map_visitor;
mod scalar_visitors;
mod set_visitor;
mod struct_visitor;

// -----------------------------------------------------------------------------
// Exports

pub use driver::{DeserializeDriver, PropertyDeserializer, TaggedDeserializeDriver};
