use core::alloc::Layout;
use core::fmt;

use fixedbitset::FixedBitSet;
use prism_ptr::{Ptr, PtrMut};
use prism_utils::hash::HashTable;

use super::ScriptArray;

/// Sparse slot storage with a hash index, element type known only by layout.
///
/// Slots are allocated from a free list, so removing elements leaves holes
/// and later insertions reuse them. Slot order is therefore storage order,
/// not insertion order. Use [`is_valid_slot`](Self::is_valid_slot) before
/// touching a slot; [`slots`](Self::slots) yields live slots in ascending order.
///
/// Raw insertion via [`add_uninitialized`](Self::add_uninitialized) invalidates
/// the hash index. It is rebuilt by [`rehash`](Self::rehash), which must run once
/// after a batch of insertions and before any lookup.
pub struct ScriptSet {
    slots: ScriptArray,
    allocated: FixedBitSet,
    free_list: Vec<usize>,
    len: usize,
    hashes: Vec<u64>,
    index: HashTable<usize>,
    needs_rehash: bool,
}

impl ScriptSet {
    pub fn new(element: Layout) -> Self {
        Self {
            slots: ScriptArray::new(element),
            allocated: FixedBitSet::new(),
            free_list: Vec::new(),
            len: 0,
            hashes: Vec::new(),
            index: HashTable::new(),
            needs_rehash: false,
        }
    }

    #[inline]
    pub fn element_layout(&self) -> Layout {
        self.slots.element_layout()
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots, holes included.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_valid_slot(&self, slot: usize) -> bool {
        slot < self.slots.len() && self.allocated.contains(slot)
    }

    /// Whether raw insertions happened since the last [`rehash`](Self::rehash).
    #[inline]
    pub fn needs_rehash(&self) -> bool {
        self.needs_rehash
    }

    /// Live slots in ascending order.
    pub fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.allocated.ones()
    }

    #[track_caller]
    pub fn element_ptr(&self, slot: usize) -> Ptr<'_> {
        assert!(self.is_valid_slot(slot), "set slot {slot} is not a live element");
        self.slots.element_ptr(slot)
    }

    #[track_caller]
    pub fn element_ptr_mut(&mut self, slot: usize) -> PtrMut<'_> {
        assert!(self.is_valid_slot(slot), "set slot {slot} is not a live element");
        self.slots.element_ptr_mut(slot)
    }

    /// Allocates a slot and returns it. The slot's memory is uninitialized.
    pub fn add_uninitialized(&mut self) -> usize {
        let slot = match self.free_list.pop() {
            Some(slot) => slot,
            None => {
                let slot = self.slots.add_uninitialized(1);
                self.allocated.grow(slot + 1);
                slot
            }
        };
        self.allocated.insert(slot);
        self.len += 1;
        self.needs_rehash = true;
        slot
    }

    /// Frees a slot without destroying its element.
    #[track_caller]
    pub fn remove_at(&mut self, slot: usize) {
        assert!(self.is_valid_slot(slot), "set slot {slot} is not a live element");
        if !self.needs_rehash {
            let hash = self.hashes[slot];
            if let Ok(entry) = self.index.find_entry(hash, |&s| s == slot) {
                entry.remove();
            }
        }
        self.release_slot(slot);
    }

    fn release_slot(&mut self, slot: usize) {
        self.allocated.set(slot, false);
        self.free_list.push(slot);
        self.len -= 1;
    }

    /// Rebuilds the hash index over all live slots.
    ///
    /// Slots are visited in ascending order. When two slots compare equal the
    /// later one wins: the earlier element is passed to `destroy` and its slot
    /// is freed, so the set never holds duplicates after a rehash.
    pub fn rehash(
        &mut self,
        mut hash: impl FnMut(Ptr<'_>) -> u64,
        mut eq: impl FnMut(Ptr<'_>, Ptr<'_>) -> bool,
        mut destroy: impl FnMut(PtrMut<'_>),
    ) {
        self.index.clear();
        self.hashes.clear();
        self.hashes.resize(self.slots.len(), 0);

        for slot in 0..self.slots.len() {
            if !self.allocated.contains(slot) {
                continue;
            }

            let h = hash(self.slots.element_ptr(slot));
            self.hashes[slot] = h;

            let slots = &self.slots;
            let replaced = self
                .index
                .find_mut(h, |&other| {
                    eq(slots.element_ptr(other), slots.element_ptr(slot))
                })
                .map(|existing| core::mem::replace(existing, slot));

            match replaced {
                Some(old) => {
                    destroy(self.slots.element_ptr_mut(old));
                    self.release_slot(old);
                }
                None => {
                    let hashes = &self.hashes;
                    self.index.insert_unique(h, slot, |&s| hashes[s]);
                }
            }
        }

        self.needs_rehash = false;
    }

    /// Finds the live slot whose element satisfies `eq`.
    ///
    /// # Panics
    ///
    /// Panics if raw insertions are pending a [`rehash`](Self::rehash).
    #[track_caller]
    pub fn find(&self, hash: u64, mut eq: impl FnMut(Ptr<'_>) -> bool) -> Option<usize> {
        assert!(!self.needs_rehash, "set lookup before rehash");
        let slots = &self.slots;
        self.index
            .find(hash, |&slot| eq(slots.element_ptr(slot)))
            .copied()
    }

    /// Forgets every element without destroying them. Capacity is kept.
    pub fn clear_raw(&mut self) {
        // SAFETY: shrinking to zero, the caller destroyed the elements.
        unsafe { self.slots.set_len(0) };
        self.allocated.clear();
        self.free_list.clear();
        self.len = 0;
        self.hashes.clear();
        self.index.clear();
        self.needs_rehash = false;
    }
}

impl fmt::Debug for ScriptSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptSet")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("needs_rehash", &self.needs_rehash)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use core::alloc::Layout;

    use prism_ptr::Ptr;
    use prism_utils::hash::hash_one;

    use super::ScriptSet;

    fn add(set: &mut ScriptSet, value: u32) -> usize {
        let slot = set.add_uninitialized();
        unsafe { set.element_ptr_mut(slot).write(value) };
        slot
    }

    fn rehash(set: &mut ScriptSet) {
        set.rehash(
            |p| hash_one(unsafe { p.as_ref::<u32>() }),
            |a, b| unsafe { a.read::<u32>() == b.read::<u32>() },
            |_| {},
        );
    }

    fn contains(set: &ScriptSet, value: u32) -> bool {
        set.find(hash_one(&value), |p: Ptr<'_>| unsafe { p.read::<u32>() == value })
            .is_some()
    }

    #[test]
    fn holes_are_reused() {
        let mut set = ScriptSet::new(Layout::new::<u32>());
        for v in [10, 20, 30] {
            add(&mut set, v);
        }
        rehash(&mut set);

        set.remove_at(1);
        assert_eq!(set.len(), 2);
        assert_eq!(set.capacity(), 3);
        assert!(!set.is_valid_slot(1));
        assert!(!contains(&set, 20));

        let slot = add(&mut set, 40);
        assert_eq!(slot, 1);
        rehash(&mut set);
        assert_eq!(set.slots().collect::<Vec<_>>(), [0, 1, 2]);
        assert!(contains(&set, 40));
    }

    #[test]
    fn rehash_drops_duplicates() {
        let mut set = ScriptSet::new(Layout::new::<u32>());
        for v in [3, 1, 3, 2] {
            add(&mut set, v);
        }
        assert!(set.needs_rehash());
        rehash(&mut set);
        assert_eq!(set.len(), 3);
        for v in [1, 2, 3] {
            assert!(contains(&set, v));
        }
    }

    #[test]
    #[should_panic(expected = "before rehash")]
    fn lookup_requires_rehash() {
        let mut set = ScriptSet::new(Layout::new::<u32>());
        add(&mut set, 1);
        contains(&set, 1);
    }
}
