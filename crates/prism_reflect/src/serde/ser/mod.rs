// -----------------------------------------------------------------------------
// Modules

mod driver;
mod error_utils;

mod array_serializer;
mod element_serializer;
mod map_serializer;
mod set_serializer;
mod struct_serializer;

// -----------------------------------------------------------------------------
// Exports

pub use driver::{PropertySerializer, SerializeDriver, TaggedSerializeDriver};
