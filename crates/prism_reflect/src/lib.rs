//! Runtime descriptors of plain data and the conversions they drive.
//!
//! A [`StructDescriptor`](info::StructDescriptor) lists the properties of a
//! memory layout: offsets, fixed array dimensions and kinds. Values of that
//! layout are reached through type-erased pointers and converted by the
//! serde drivers in [`serde`] or the codecs in [`codec`].
//!
//! ## Menu
//!
//! - [`info`]: property, struct and enum descriptors.
//! - [`value`]: the engine value types stored in properties.
//! - [`container`]: views over dynamic arrays, sets and maps.
//! - [`ops`]: field access, lifecycle and owned instances.
//! - [`registry`]: name-keyed descriptor store.
//! - [`serde`]: `Serialize`/`DeserializeSeed` drivers.
//! - [`codec`]: binary archives, JSON and text literals.
//!
//! Conversions that recover from bad input report what they did in
//! [`Diagnostics`].
#![expect(unsafe_code, reason = "values are reached through type-erased pointers")]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod diagnostics;
mod path;

pub mod codec;
pub mod container;
pub mod info;
pub mod ops;
pub mod registry;
pub mod serde;
pub mod value;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use diagnostics::{Diagnostic, Diagnostics, Severity};

#[cfg(feature = "auto_register")]
#[doc(hidden)]
pub mod __macro_exports {
    pub use inventory;
}
