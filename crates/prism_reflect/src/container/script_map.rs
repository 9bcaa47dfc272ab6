use core::alloc::Layout;
use core::fmt;

use prism_ptr::{Ptr, PtrMut};

use super::ScriptSet;

// -----------------------------------------------------------------------------
// MapLayout

/// Placement of key and value inside one map pair.
///
/// The key sits at offset zero; the value follows at its own alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapLayout {
    pair: Layout,
    value_offset: usize,
}

impl MapLayout {
    /// # Panics
    ///
    /// Panics if the pair size overflows `isize`.
    pub fn new(key: Layout, value: Layout) -> Self {
        let Ok((pair, value_offset)) = key.extend(value) else {
            panic!("map pair layout overflows isize");
        };
        Self {
            pair: pair.pad_to_align(),
            value_offset,
        }
    }

    #[inline]
    pub fn pair(&self) -> Layout {
        self.pair
    }

    #[inline]
    pub fn value_offset(&self) -> usize {
        self.value_offset
    }
}

// -----------------------------------------------------------------------------
// ScriptMap

/// A [`ScriptSet`] of key/value pairs, hashed and compared by key only.
///
/// Slot rules are the ones of [`ScriptSet`]: holes, ascending slot iteration
/// and one [`rehash`](Self::rehash) after raw insertions.
pub struct ScriptMap {
    pairs: ScriptSet,
    layout: MapLayout,
}

impl ScriptMap {
    pub fn new(layout: MapLayout) -> Self {
        Self {
            pairs: ScriptSet::new(layout.pair()),
            layout,
        }
    }

    #[inline]
    pub fn layout(&self) -> MapLayout {
        self.layout
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.pairs.capacity()
    }

    #[inline]
    pub fn is_valid_slot(&self, slot: usize) -> bool {
        self.pairs.is_valid_slot(slot)
    }

    #[inline]
    pub fn needs_rehash(&self) -> bool {
        self.pairs.needs_rehash()
    }

    /// Live slots in ascending order.
    #[inline]
    pub fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.pairs.slots()
    }

    #[track_caller]
    pub fn key_ptr(&self, slot: usize) -> Ptr<'_> {
        self.pairs.element_ptr(slot)
    }

    #[track_caller]
    pub fn value_ptr(&self, slot: usize) -> Ptr<'_> {
        let pair = self.pairs.element_ptr(slot);
        // SAFETY: `value_offset` lies inside the pair layout.
        unsafe { pair.byte_add(self.layout.value_offset) }
    }

    #[track_caller]
    pub fn key_ptr_mut(&mut self, slot: usize) -> PtrMut<'_> {
        self.pairs.element_ptr_mut(slot)
    }

    #[track_caller]
    pub fn value_ptr_mut(&mut self, slot: usize) -> PtrMut<'_> {
        let offset = self.layout.value_offset;
        let pair = self.pairs.element_ptr_mut(slot);
        // SAFETY: `value_offset` lies inside the pair layout.
        unsafe { pair.byte_add(offset) }
    }

    /// Allocates a pair slot. Key and value are uninitialized.
    #[inline]
    pub fn add_uninitialized(&mut self) -> usize {
        self.pairs.add_uninitialized()
    }

    /// Frees a pair slot without destroying key or value.
    #[track_caller]
    #[inline]
    pub fn remove_at(&mut self, slot: usize) {
        self.pairs.remove_at(slot);
    }

    /// Rebuilds the key index. For duplicate keys the later pair wins and the
    /// earlier pair is handed to `destroy_pair` as a pointer to the whole pair.
    pub fn rehash(
        &mut self,
        hash_key: impl FnMut(Ptr<'_>) -> u64,
        eq_key: impl FnMut(Ptr<'_>, Ptr<'_>) -> bool,
        destroy_pair: impl FnMut(PtrMut<'_>),
    ) {
        // Keys live at offset zero, so pair pointers are key pointers.
        self.pairs.rehash(hash_key, eq_key, destroy_pair);
    }

    /// Finds the slot whose key satisfies `eq_key`.
    #[track_caller]
    pub fn find(&self, hash: u64, eq_key: impl FnMut(Ptr<'_>) -> bool) -> Option<usize> {
        self.pairs.find(hash, eq_key)
    }

    /// Forgets every pair without destroying them.
    #[inline]
    pub fn clear_raw(&mut self) {
        self.pairs.clear_raw();
    }
}

impl fmt::Debug for ScriptMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptMap")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("layout", &self.layout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use core::alloc::Layout;

    use super::MapLayout;

    #[test]
    fn value_follows_key_alignment() {
        let layout = MapLayout::new(Layout::new::<u8>(), Layout::new::<u64>());
        assert_eq!(layout.value_offset(), 8);
        assert_eq!(layout.pair().size(), 16);

        let layout = MapLayout::new(Layout::new::<u32>(), Layout::new::<u16>());
        assert_eq!(layout.value_offset(), 4);
        assert_eq!(layout.pair().size(), 8);
    }
}
