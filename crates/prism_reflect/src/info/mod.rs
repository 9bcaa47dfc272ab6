//! Runtime type metadata.
//!
//! - [`PropertyDescriptor`]: one field, its offset, fixed array dimension and [`PropertyType`].
//! - [`PropertyType`]: the closed set of value types, carrying nested descriptors.
//! - [`StructDescriptor`]: ordered fields plus layout, optionally with [`StructTextHooks`].
//! - [`EnumDescriptor`]: name and value table with a `_MAX` sentinel.
//!
//! Descriptors are immutable once built and are shared through [`Arc`](alloc::sync::Arc).

// -----------------------------------------------------------------------------
// Modules

mod enum_info;
mod flags;
mod kind;
mod property;
mod struct_info;

// -----------------------------------------------------------------------------
// Exports

pub use enum_info::{EnumDescriptor, EnumEntry};
pub use flags::PropertyFlags;
pub use kind::PropertyKind;
pub use property::{BoolLayout, PropertyDescriptor, PropertyType};
pub use struct_info::{StructBuilder, StructDescriptor, StructTextHooks};

pub(crate) use property::map_layout;
