use prism_ptr::{Ptr, PtrMut};

use super::ScriptArray;
use crate::info::{PropertyDescriptor, PropertyType};
use crate::ops::{AccessError, PropertyStorage, destroy_element, initialize_element};

#[track_caller]
fn element_of(ty: &PropertyType) -> &PropertyDescriptor {
    match ty {
        PropertyType::Array(inner) => inner,
        other => panic!("expected an Array property, found {}", other.kind()),
    }
}

// -----------------------------------------------------------------------------
// ArrayView

/// Read access to a dynamic array property.
///
/// Indices are dense: every index below [`len`](Self::len) is a live element.
#[derive(Clone, Copy, Debug)]
pub struct ArrayView<'a> {
    element: &'a PropertyDescriptor,
    array: &'a ScriptArray,
}

impl<'a> ArrayView<'a> {
    /// # Safety
    ///
    /// `value` must point to an initialized array described by `ty`.
    ///
    /// # Panics
    ///
    /// Panics if `ty` is not an `Array`.
    #[track_caller]
    pub unsafe fn new(ty: &'a PropertyType, value: Ptr<'a>) -> Self {
        Self {
            element: element_of(ty),
            // SAFETY: guaranteed by the caller.
            array: unsafe { value.as_ref::<ScriptArray>() },
        }
    }

    /// Descriptor of one element.
    #[inline]
    pub fn element(&self) -> &'a PropertyDescriptor {
        self.element
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.array.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.array.capacity()
    }

    #[inline]
    pub fn is_valid_slot(&self, index: usize) -> bool {
        index < self.array.len()
    }

    #[track_caller]
    #[inline]
    pub fn element_ptr(&self, index: usize) -> Ptr<'a> {
        self.array.element_ptr(index)
    }

    /// Element pointers in index order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Ptr<'a>> + 'a {
        let array = self.array;
        (0..array.len()).map(move |index| array.element_ptr(index))
    }

    /// Typed element access.
    #[track_caller]
    pub fn get<T: PropertyStorage>(&self, index: usize) -> Result<&'a T, AccessError> {
        AccessError::check_type::<T>(self.element)?;
        AccessError::check_index(self.element, index, self.len())?;
        // SAFETY: the element type was checked.
        Ok(unsafe { self.element_ptr(index).as_ref::<T>() })
    }
}

// -----------------------------------------------------------------------------
// ArrayViewMut

/// Mutable access to a dynamic array property.
///
/// Growing initializes the new elements and shrinking destroys the removed
/// ones, so the array always holds only live values.
///
/// # Examples
///
/// ```
/// use prism_reflect::info::{PropertyType, StructBuilder};
/// use prism_reflect::ops::StructInstance;
/// use std::sync::Arc;
///
/// let inventory = Arc::new(
///     StructBuilder::new("Inventory")
///         .field("Slots", PropertyType::array(PropertyType::Int32))
///         .build(),
/// );
/// let mut instance = StructInstance::new(inventory);
///
/// let mut slots = instance.array_view_mut("Slots").unwrap();
/// slots.push(7i32).unwrap();
/// slots.push(9i32).unwrap();
/// slots.resize(3);
///
/// let slots = instance.array_view("Slots").unwrap();
/// assert_eq!(slots.len(), 3);
/// assert_eq!(*slots.get::<i32>(1).unwrap(), 9);
/// assert_eq!(*slots.get::<i32>(2).unwrap(), 0);
/// ```
#[derive(Debug)]
pub struct ArrayViewMut<'a> {
    element: &'a PropertyDescriptor,
    array: &'a mut ScriptArray,
}

impl<'a> ArrayViewMut<'a> {
    /// # Safety
    ///
    /// `value` must point to an initialized array described by `ty`.
    ///
    /// # Panics
    ///
    /// Panics if `ty` is not an `Array`.
    #[track_caller]
    pub unsafe fn new(ty: &'a PropertyType, value: PtrMut<'a>) -> Self {
        Self {
            element: element_of(ty),
            // SAFETY: guaranteed by the caller.
            array: unsafe { value.consume::<ScriptArray>() },
        }
    }

    #[inline]
    pub fn element(&self) -> &'a PropertyDescriptor {
        self.element
    }

    #[inline]
    pub fn as_view(&self) -> ArrayView<'_> {
        ArrayView {
            element: self.element,
            array: self.array,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.array.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.array.capacity()
    }

    #[inline]
    pub fn is_valid_slot(&self, index: usize) -> bool {
        index < self.array.len()
    }

    #[track_caller]
    #[inline]
    pub fn element_ptr(&self, index: usize) -> Ptr<'_> {
        self.array.element_ptr(index)
    }

    #[track_caller]
    #[inline]
    pub fn element_ptr_mut(&mut self, index: usize) -> PtrMut<'_> {
        self.array.element_ptr_mut(index)
    }

    /// Appends a default element and returns its index.
    pub fn add_default_slot(&mut self) -> usize {
        let index = self.array.add_uninitialized(1);
        // SAFETY: the new slot is uninitialized storage for one element.
        unsafe { initialize_element(self.element.ty(), self.array.element_ptr_mut(index)) };
        index
    }

    /// Inserts a default element at `index`, shifting the tail up.
    #[track_caller]
    pub fn insert_default_slot(&mut self, index: usize) {
        self.array.insert_uninitialized(index, 1);
        // SAFETY: the slot was just opened and holds no value.
        unsafe { initialize_element(self.element.ty(), self.array.element_ptr_mut(index)) };
    }

    /// Destroys and removes the element at `index`, shifting the tail down.
    #[track_caller]
    pub fn remove_slot(&mut self, index: usize) {
        // SAFETY: `element_ptr_mut` checked the index, the element is live.
        unsafe { destroy_element(self.element.ty(), self.array.element_ptr_mut(index)) };
        self.array.remove_at(index, 1);
    }

    /// Grows with default elements or shrinks from the tail.
    pub fn resize(&mut self, len: usize) {
        let old_len = self.array.len();
        if len < old_len {
            if self.element.ty().needs_destroy() {
                for index in len..old_len {
                    // SAFETY: the element is live and is dropped from the array below.
                    unsafe { destroy_element(self.element.ty(), self.array.element_ptr_mut(index)) };
                }
            }
            // SAFETY: the tail was destroyed.
            unsafe { self.array.set_len(len) };
        } else {
            self.array.reserve(len - old_len);
            for _ in old_len..len {
                self.add_default_slot();
            }
        }
    }

    /// Destroys every element.
    #[inline]
    pub fn empty(&mut self) {
        self.resize(0);
    }

    /// Appends `value`.
    pub fn push<T: PropertyStorage>(&mut self, value: T) -> Result<usize, AccessError> {
        AccessError::check_type::<T>(self.element)?;
        let index = self.add_default_slot();
        // SAFETY: the element type was checked and the slot holds a default value.
        unsafe { *self.array.element_ptr_mut(index).consume::<T>() = value };
        Ok(index)
    }

    /// Typed mutable element access.
    pub fn get_mut<T: PropertyStorage>(&mut self, index: usize) -> Result<&mut T, AccessError> {
        AccessError::check_type::<T>(self.element)?;
        AccessError::check_index(self.element, index, self.len())?;
        // SAFETY: the element type and index were checked.
        Ok(unsafe { self.array.element_ptr_mut(index).consume::<T>() })
    }
}

#[cfg(test)]
mod tests {
    use prism_ptr::{Ptr, PtrMut};

    use super::{ArrayView, ArrayViewMut};
    use crate::container::ScriptArray;
    use crate::info::PropertyType;
    use crate::ops::AccessError;

    #[test]
    fn resize_initializes_and_destroys() {
        let ty = PropertyType::array(PropertyType::String);
        let mut array = ScriptArray::new(core::alloc::Layout::new::<String>());

        let mut view = unsafe { ArrayViewMut::new(&ty, PtrMut::from_mut(&mut array)) };
        view.resize(2);
        *view.get_mut::<String>(1).unwrap() = "second".into();
        view.insert_default_slot(0);
        view.remove_slot(1);

        let view = unsafe { ArrayView::new(&ty, Ptr::from_ref(&array)) };
        let values: Vec<&String> = (0..view.len()).map(|i| view.get(i).unwrap()).collect();
        assert_eq!(values, ["", "second"]);

        let mut view = unsafe { ArrayViewMut::new(&ty, PtrMut::from_mut(&mut array)) };
        view.empty();
        assert!(view.is_empty());
    }

    #[test]
    fn typed_access_is_checked() {
        let ty = PropertyType::array(PropertyType::Int32);
        let mut array = ScriptArray::new(core::alloc::Layout::new::<i32>());
        let mut view = unsafe { ArrayViewMut::new(&ty, PtrMut::from_mut(&mut array)) };

        assert!(matches!(view.push(1u64), Err(AccessError::MismatchedType { .. })));
        view.push(5i32).unwrap();
        assert!(matches!(view.get_mut::<i32>(3), Err(AccessError::OutOfBounds { .. })));
    }
}
