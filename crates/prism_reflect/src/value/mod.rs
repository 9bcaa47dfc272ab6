//! Intrinsic value types stored in instance memory.
//!
//! Scalars use Rust primitives directly. The types here cover the kinds that
//! need identity or ownership semantics of their own: interned names,
//! display text and the object reference family.

// -----------------------------------------------------------------------------
// Modules

mod name;
mod object;
mod text;

// -----------------------------------------------------------------------------
// Exports

pub use name::Name;
pub use object::{InterfaceRef, ObjectRef, SoftObjectPath, WeakObjectRef};
pub use text::Text;
