use prism_ptr::{Ptr, PtrMut};

use super::ScriptSet;
use crate::info::{PropertyDescriptor, PropertyType};
use crate::ops::{
    AccessError, PropertyStorage, destroy_element, hash_element, identical_element,
    initialize_element,
};

#[track_caller]
fn element_of(ty: &PropertyType) -> &PropertyDescriptor {
    match ty {
        PropertyType::Set(element) => element,
        other => panic!("expected a Set property, found {}", other.kind()),
    }
}

/// Finds the slot holding a value equal to `*key`.
///
/// Falls back to a linear scan while raw insertions are pending a rehash.
///
/// # Safety
///
/// `set` must hold values of `ty` and `key` must point to one.
pub(crate) unsafe fn set_find(set: &ScriptSet, ty: &PropertyType, key: Ptr<'_>) -> Option<usize> {
    // SAFETY: guaranteed by the caller.
    unsafe {
        if set.needs_rehash() {
            return set
                .slots()
                .find(|&slot| identical_element(ty, set.element_ptr(slot), key));
        }
        set.find(hash_element(ty, key), |other| identical_element(ty, other, key))
    }
}

// -----------------------------------------------------------------------------
// SetView

/// Read access to a set property.
///
/// Slots are sparse: iterate with [`slots`](Self::slots) or check
/// [`is_valid_slot`](Self::is_valid_slot) before touching an index.
#[derive(Clone, Copy, Debug)]
pub struct SetView<'a> {
    element: &'a PropertyDescriptor,
    set: &'a ScriptSet,
}

impl<'a> SetView<'a> {
    /// # Safety
    ///
    /// `value` must point to an initialized set described by `ty`.
    ///
    /// # Panics
    ///
    /// Panics if `ty` is not a `Set`.
    #[track_caller]
    pub unsafe fn new(ty: &'a PropertyType, value: Ptr<'a>) -> Self {
        Self {
            element: element_of(ty),
            // SAFETY: guaranteed by the caller.
            set: unsafe { value.as_ref::<ScriptSet>() },
        }
    }

    #[inline]
    pub fn element(&self) -> &'a PropertyDescriptor {
        self.element
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Number of slots, holes included.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.set.capacity()
    }

    #[inline]
    pub fn is_valid_slot(&self, slot: usize) -> bool {
        self.set.is_valid_slot(slot)
    }

    /// Live slots in ascending order.
    #[inline]
    pub fn slots(&self) -> impl Iterator<Item = usize> + 'a {
        self.set.slots()
    }

    #[track_caller]
    #[inline]
    pub fn element_ptr(&self, slot: usize) -> Ptr<'a> {
        self.set.element_ptr(slot)
    }

    /// Slot of the element equal to `*value`.
    ///
    /// # Safety
    ///
    /// `value` must point to an initialized value of the element type.
    pub unsafe fn find(&self, value: Ptr<'_>) -> Option<usize> {
        // SAFETY: guaranteed by the caller.
        unsafe { set_find(self.set, self.element.ty(), value) }
    }

    /// Typed membership test. Returns `false` on a type mismatch.
    pub fn contains<T: PropertyStorage>(&self, value: &T) -> bool {
        T::matches(self.element.ty())
            // SAFETY: the element type was checked.
            && unsafe { self.find(Ptr::from_ref(value)) }.is_some()
    }
}

// -----------------------------------------------------------------------------
// SetViewMut

/// Mutable access to a set property.
///
/// Raw insertion through [`add_default_slot`](Self::add_default_slot) must be
/// followed by one [`rehash`](Self::rehash) once every new element holds its
/// final value. The typed helpers rehash on their own.
///
/// # Examples
///
/// ```
/// use prism_reflect::info::{PropertyType, StructBuilder};
/// use prism_reflect::ops::StructInstance;
/// use std::sync::Arc;
///
/// let tags = Arc::new(
///     StructBuilder::new("Tags")
///         .field("Ids", PropertyType::set(PropertyType::Int32))
///         .build(),
/// );
/// let mut instance = StructInstance::new(tags);
///
/// let mut ids = instance.set_view_mut("Ids").unwrap();
/// assert_eq!(ids.insert(3i32), Ok(true));
/// assert_eq!(ids.insert(3i32), Ok(false));
/// assert_eq!(ids.insert(1i32), Ok(true));
///
/// let ids = instance.set_view("Ids").unwrap();
/// assert_eq!(ids.len(), 2);
/// assert!(ids.contains(&1i32));
/// ```
#[derive(Debug)]
pub struct SetViewMut<'a> {
    element: &'a PropertyDescriptor,
    set: &'a mut ScriptSet,
}

impl<'a> SetViewMut<'a> {
    /// # Safety
    ///
    /// `value` must point to an initialized set described by `ty`.
    ///
    /// # Panics
    ///
    /// Panics if `ty` is not a `Set`.
    #[track_caller]
    pub unsafe fn new(ty: &'a PropertyType, value: PtrMut<'a>) -> Self {
        Self {
            element: element_of(ty),
            // SAFETY: guaranteed by the caller.
            set: unsafe { value.consume::<ScriptSet>() },
        }
    }

    #[inline]
    pub fn element(&self) -> &'a PropertyDescriptor {
        self.element
    }

    #[inline]
    pub fn as_view(&self) -> SetView<'_> {
        SetView {
            element: self.element,
            set: self.set,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.set.capacity()
    }

    #[inline]
    pub fn is_valid_slot(&self, slot: usize) -> bool {
        self.set.is_valid_slot(slot)
    }

    #[track_caller]
    #[inline]
    pub fn element_ptr(&self, slot: usize) -> Ptr<'_> {
        self.set.element_ptr(slot)
    }

    #[track_caller]
    #[inline]
    pub fn element_ptr_mut(&mut self, slot: usize) -> PtrMut<'_> {
        self.set.element_ptr_mut(slot)
    }

    /// Allocates a slot holding a default element. The set is not usable for
    /// lookups until [`rehash`](Self::rehash).
    pub fn add_default_slot(&mut self) -> usize {
        let slot = self.set.add_uninitialized();
        // SAFETY: the slot is uninitialized storage for one element.
        unsafe { initialize_element(self.element.ty(), self.set.element_ptr_mut(slot)) };
        slot
    }

    /// Destroys the element in `slot` and leaves a hole.
    #[track_caller]
    pub fn remove_slot(&mut self, slot: usize) {
        // SAFETY: `element_ptr_mut` checked that the slot is live.
        unsafe { destroy_element(self.element.ty(), self.set.element_ptr_mut(slot)) };
        self.set.remove_at(slot);
    }

    /// Rebuilds the hash index. Elements equal to a later slot are destroyed.
    pub fn rehash(&mut self) {
        let ty = self.element.ty();
        // SAFETY: every live slot holds an initialized element of `ty`.
        unsafe {
            self.set.rehash(
                |value| hash_element(ty, value),
                |a, b| identical_element(ty, a, b),
                |value| destroy_element(ty, value),
            );
        }
    }

    /// Destroys every element.
    pub fn empty(&mut self) {
        let ty = self.element.ty();
        if ty.needs_destroy() {
            for slot in 0..self.set.capacity() {
                if self.set.is_valid_slot(slot) {
                    // SAFETY: the slot is live, and the storage is forgotten below.
                    unsafe { destroy_element(ty, self.set.element_ptr_mut(slot)) };
                }
            }
        }
        self.set.clear_raw();
    }

    /// # Safety
    ///
    /// `value` must point to an initialized value of the element type.
    pub unsafe fn find(&self, value: Ptr<'_>) -> Option<usize> {
        // SAFETY: guaranteed by the caller.
        unsafe { set_find(self.set, self.element.ty(), value) }
    }

    /// Inserts `value` unless an equal element exists. Returns whether it was
    /// inserted.
    pub fn insert<T: PropertyStorage>(&mut self, value: T) -> Result<bool, AccessError> {
        AccessError::check_type::<T>(self.element)?;
        // SAFETY: the element type was checked.
        if unsafe { self.find(Ptr::from_ref(&value)) }.is_some() {
            return Ok(false);
        }
        let slot = self.add_default_slot();
        // SAFETY: the slot holds a default value of type `T`.
        unsafe { *self.set.element_ptr_mut(slot).consume::<T>() = value };
        self.rehash();
        Ok(true)
    }

    /// Removes the element equal to `value`. Returns whether one was found.
    pub fn remove<T: PropertyStorage>(&mut self, value: &T) -> Result<bool, AccessError> {
        AccessError::check_type::<T>(self.element)?;
        // SAFETY: the element type was checked.
        match unsafe { self.find(Ptr::from_ref(value)) } {
            Some(slot) => {
                self.remove_slot(slot);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use core::alloc::Layout;

    use prism_ptr::{Ptr, PtrMut};

    use super::{SetView, SetViewMut};
    use crate::container::ScriptSet;
    use crate::info::PropertyType;

    #[test]
    fn raw_insertion_then_single_rehash() {
        let ty = PropertyType::set(PropertyType::String);
        let mut set = ScriptSet::new(Layout::new::<String>());
        {
            let mut view = unsafe { SetViewMut::new(&ty, PtrMut::from_mut(&mut set)) };
            for text in ["b", "a", "b", "c"] {
                let slot = view.add_default_slot();
                unsafe { *view.element_ptr_mut(slot).consume::<String>() = text.into() };
            }
            view.rehash();
            assert_eq!(view.len(), 3);
        }

        let view = unsafe { SetView::new(&ty, Ptr::from_ref(&set)) };
        for text in ["a", "b", "c"] {
            assert!(view.contains(&String::from(text)));
        }
        assert!(!view.contains(&String::from("d")));
        assert!(!view.contains(&1i32));

        let mut view = unsafe { SetViewMut::new(&ty, PtrMut::from_mut(&mut set)) };
        assert_eq!(view.remove(&String::from("a")), Ok(true));
        assert_eq!(view.len(), 2);
        view.empty();
    }

    #[test]
    fn lookup_before_rehash_scans() {
        let ty = PropertyType::set(PropertyType::Int32);
        let mut set = ScriptSet::new(Layout::new::<i32>());
        let mut view = unsafe { SetViewMut::new(&ty, PtrMut::from_mut(&mut set)) };
        let slot = view.add_default_slot();
        unsafe { view.element_ptr_mut(slot).write(4i32) };
        assert_eq!(unsafe { view.find(Ptr::from_ref(&4i32)) }, Some(slot));
    }
}
