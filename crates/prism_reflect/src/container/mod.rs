//! Type-erased container storage and the views over it.
//!
//! [`ScriptArray`], [`ScriptSet`] and [`ScriptMap`] are the in-memory layout
//! of `Array`, `Set` and `Map` properties. They know element layouts only and
//! never construct or destroy elements.
//!
//! The views pair a container with its element descriptors and own the
//! element lifecycle:
//!
//! | View | Slots | Raw insertion |
//! |---|---|---|
//! | [`ArrayView`] / [`ArrayViewMut`] | dense, `0..len` | `add_default_slot`, `resize` |
//! | [`SetView`] / [`SetViewMut`] | sparse, check `is_valid_slot` | `add_default_slot` then one `rehash` |
//! | [`MapView`] / [`MapViewMut`] | sparse, check `is_valid_slot` | `add_default_slot` then one `rehash` |
//!
//! Out-of-range or hole access panics.

// -----------------------------------------------------------------------------
// Modules

mod script_array;
mod script_map;
mod script_set;

mod array_view;
mod map_view;
mod set_view;

// -----------------------------------------------------------------------------
// Exports

pub use script_array::ScriptArray;
pub use script_map::{MapLayout, ScriptMap};
pub use script_set::ScriptSet;

pub use array_view::{ArrayView, ArrayViewMut};
pub use map_view::{MapView, MapViewMut};
pub use set_view::{SetView, SetViewMut};

pub(crate) use map_view::map_find;
pub(crate) use set_view::set_find;
