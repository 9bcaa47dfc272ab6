//! Re-export [`HashTable`] from [hashbrown] crate.
//!
//! The table stores no hasher; callers pass cached hashes on insertion, which is
//! what sparse slot containers need when the element type is only known at runtime.

use hashbrown::hash_table as hb;

pub use hb::HashTable;

pub use hb::{AbsentEntry, Entry, OccupiedEntry, VacantEntry};
pub use hb::{Iter, IterMut};
