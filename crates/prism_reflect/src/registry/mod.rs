//! Name-keyed store of struct and enum descriptors.
//!
//! ## Menu
//!
//! - [`TypeRegistry`]: owns `Arc`ed descriptors by name, rejects self-containing structs.
//! - [`TypeLookup`]: the lookup seam the tagged codecs take. Implemented by the registry
//!   and by any `Fn(&str) -> Option<Arc<StructDescriptor>>`.
//! - [`RegistrationError`]: why a registration was refused.
//!
//! ## auto_register
//!
//! With the `auto_register` feature, descriptors can be submitted from anywhere in the
//! program with [`auto_register!`](crate::auto_register) and collected by
//! [`TypeRegistry::auto_register`]. We use the [`inventory`] crate, which supports the
//! major platforms; elsewhere collection finds nothing.
//!
//! [`StructDescriptor`]: crate::info::StructDescriptor

// -----------------------------------------------------------------------------
// Modules

mod error;
mod lookup;
mod type_registry;

// -----------------------------------------------------------------------------
// Exports

pub use error::RegistrationError;
pub use lookup::TypeLookup;
pub use type_registry::{AutoRegistration, TypeRegistry};
