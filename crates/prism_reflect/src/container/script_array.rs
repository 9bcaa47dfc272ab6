use alloc::alloc::{alloc, dealloc, handle_alloc_error, realloc};
use core::alloc::Layout;
use core::fmt;
use core::ptr::{self, NonNull};

use prism_ptr::{Ptr, PtrMut};

#[cold]
#[track_caller]
fn capacity_overflow() -> ! {
    panic!("script container capacity overflow");
}

/// A growable array whose element type is only known through its layout.
///
/// The array owns its buffer but never its elements: constructing and
/// destroying elements is the job of the property that describes them, so
/// growing hands out uninitialized slots and shrinking forgets them. Dropping
/// an array with live elements that own resources leaks those resources.
///
/// Index access out of range panics.
pub struct ScriptArray {
    data: NonNull<u8>,
    len: usize,
    capacity: usize,
    element: Layout,
}

impl ScriptArray {
    /// Creates an empty array for elements of `element` layout.
    ///
    /// # Panics
    ///
    /// Panics if the element is zero-sized.
    pub fn new(element: Layout) -> Self {
        let element = element.pad_to_align();
        assert!(
            element.size() > 0,
            "script containers do not support zero-sized elements"
        );
        Self {
            data: NonNull::dangling(),
            len: 0,
            capacity: 0,
            element,
        }
    }

    #[inline]
    pub fn element_layout(&self) -> Layout {
        self.element
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pointer to element `index`.
    ///
    /// The element may be uninitialized if it was just added.
    #[track_caller]
    pub fn element_ptr(&self, index: usize) -> Ptr<'_> {
        assert!(
            index < self.len,
            "array index {index} out of bounds (len {})",
            self.len
        );
        // SAFETY: index < len <= capacity, the offset stays inside the buffer.
        unsafe { Ptr::new(self.data.add(index * self.element.size())) }
    }

    /// Mutable pointer to element `index`.
    #[track_caller]
    pub fn element_ptr_mut(&mut self, index: usize) -> PtrMut<'_> {
        assert!(
            index < self.len,
            "array index {index} out of bounds (len {})",
            self.len
        );
        // SAFETY: index < len <= capacity, the offset stays inside the buffer.
        unsafe { PtrMut::new(self.data.add(index * self.element.size())) }
    }

    fn buffer_layout(&self, capacity: usize) -> Layout {
        let size = self
            .element
            .size()
            .checked_mul(capacity)
            .unwrap_or_else(|| capacity_overflow());
        Layout::from_size_align(size, self.element.align()).unwrap_or_else(|_| capacity_overflow())
    }

    /// Makes room for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) {
        let required = self
            .len
            .checked_add(additional)
            .unwrap_or_else(|| capacity_overflow());
        if required <= self.capacity {
            return;
        }

        let new_capacity = required.max(self.capacity.saturating_mul(2)).max(4);
        let new_layout = self.buffer_layout(new_capacity);

        let raw = if self.capacity == 0 {
            // SAFETY: `new_layout` has a non-zero size.
            unsafe { alloc(new_layout) }
        } else {
            let old_layout = self.buffer_layout(self.capacity);
            // SAFETY: `data` was allocated with `old_layout`, the new size is non-zero
            // and does not overflow `isize` (checked by `buffer_layout`).
            unsafe { realloc(self.data.as_ptr(), old_layout, new_layout.size()) }
        };

        self.data = NonNull::new(raw).unwrap_or_else(|| handle_alloc_error(new_layout));
        self.capacity = new_capacity;
    }

    /// Appends `count` uninitialized elements and returns the index of the first.
    pub fn add_uninitialized(&mut self, count: usize) -> usize {
        self.reserve(count);
        let index = self.len;
        self.len += count;
        index
    }

    /// Inserts `count` uninitialized elements at `index`, shifting the tail up.
    #[track_caller]
    pub fn insert_uninitialized(&mut self, index: usize, count: usize) {
        assert!(
            index <= self.len,
            "insert index {index} out of bounds (len {})",
            self.len
        );
        self.reserve(count);
        let size = self.element.size();
        // SAFETY: both ranges lie inside the buffer after `reserve`.
        unsafe {
            let src = self.data.as_ptr().add(index * size);
            ptr::copy(src, src.add(count * size), (self.len - index) * size);
        }
        self.len += count;
    }

    /// Removes `count` elements starting at `index` without destroying them,
    /// shifting the tail down.
    #[track_caller]
    pub fn remove_at(&mut self, index: usize, count: usize) {
        assert!(
            index <= self.len && count <= self.len - index,
            "remove range {index}..{} out of bounds (len {})",
            index + count,
            self.len
        );
        let size = self.element.size();
        // SAFETY: both ranges lie inside the initialized prefix of the buffer.
        unsafe {
            let dst = self.data.as_ptr().add(index * size);
            ptr::copy(
                dst.add(count * size),
                dst,
                (self.len - index - count) * size,
            );
        }
        self.len -= count;
    }

    /// Sets the length without touching elements.
    ///
    /// # Safety
    ///
    /// - `new_len <= capacity`.
    /// - Elements in `new_len..len` must already be destroyed if they owned resources.
    /// - Elements in `len..new_len` must be initialized before they are read.
    #[inline]
    pub unsafe fn set_len(&mut self, new_len: usize) {
        debug_assert!(new_len <= self.capacity);
        self.len = new_len;
    }
}

impl Drop for ScriptArray {
    fn drop(&mut self) {
        if self.capacity > 0 {
            let layout = self.buffer_layout(self.capacity);
            // SAFETY: `data` was allocated with exactly this layout.
            unsafe { dealloc(self.data.as_ptr(), layout) }
        }
    }
}

impl fmt::Debug for ScriptArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptArray")
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("element", &self.element)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use core::alloc::Layout;

    use super::ScriptArray;

    fn push(array: &mut ScriptArray, value: u32) {
        let index = array.add_uninitialized(1);
        unsafe { array.element_ptr_mut(index).write(value) };
    }

    fn values(array: &ScriptArray) -> Vec<u32> {
        (0..array.len())
            .map(|i| unsafe { array.element_ptr(i).read::<u32>() })
            .collect()
    }

    #[test]
    fn grows_and_keeps_order() {
        let mut array = ScriptArray::new(Layout::new::<u32>());
        for v in 0..10 {
            push(&mut array, v);
        }
        assert_eq!(array.len(), 10);
        assert!(array.capacity() >= 10);
        assert_eq!(values(&array), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn insert_and_remove_shift() {
        let mut array = ScriptArray::new(Layout::new::<u32>());
        for v in [1, 2, 3] {
            push(&mut array, v);
        }
        array.insert_uninitialized(1, 1);
        unsafe { array.element_ptr_mut(1).write(9u32) };
        assert_eq!(values(&array), [1, 9, 2, 3]);

        array.remove_at(0, 2);
        assert_eq!(values(&array), [2, 3]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn out_of_range_is_fatal() {
        let array = ScriptArray::new(Layout::new::<u32>());
        let _ = array.element_ptr(0);
    }
}
