//! Operations on described memory.
//!
//! Lifecycle (initialize, destroy, copy, identical, hash) is provided as
//! methods on [`PropertyDescriptor`](crate::info::PropertyDescriptor) and
//! [`StructDescriptor`](crate::info::StructDescriptor). Typed access goes
//! through [`StructRef`], [`StructMut`] and the owned [`StructInstance`],
//! checked by [`PropertyStorage`].

// -----------------------------------------------------------------------------
// Modules

mod access;
mod instance;
mod lifecycle;
mod scalar;
mod storage;

// -----------------------------------------------------------------------------
// Exports

pub use access::{AccessError, StructMut, StructRef};
pub use instance::StructInstance;
pub use storage::PropertyStorage;

pub(crate) use lifecycle::{
    copy_element, destroy_element, hash_element, identical_element, initialize_element,
};
pub(crate) use scalar::{integer_bounds, read_bool, read_integer, write_bool, write_integer};
