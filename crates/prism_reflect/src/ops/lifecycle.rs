use core::hash::{BuildHasher, Hash, Hasher};
use core::ptr::drop_in_place;

use prism_ptr::{Ptr, PtrMut};
use prism_utils::hash::{FixedHashState, FixedHasher};

use super::scalar::{read_bool, read_integer, write_bool};
use crate::container::{
    ArrayViewMut, MapViewMut, ScriptArray, ScriptMap, ScriptSet, SetViewMut, map_find, set_find,
};
use crate::info::{BoolLayout, PropertyDescriptor, PropertyType, StructDescriptor, map_layout};
use crate::value::{InterfaceRef, Name, ObjectRef, SoftObjectPath, Text, WeakObjectRef};

// -----------------------------------------------------------------------------
// Element operations

/// Initializes one element in uninitialized memory.
///
/// # Safety
///
/// `ptr` must be valid for writes of one value of `ty`. Any previous value is
/// overwritten without being destroyed.
pub(crate) unsafe fn initialize_element(ty: &PropertyType, mut ptr: PtrMut<'_>) {
    // SAFETY: guaranteed by the caller.
    unsafe {
        if let PropertyType::Bool(layout @ BoolLayout::Bitfield { .. }) = ty {
            write_bool(*layout, ptr, false);
            return;
        }
        ptr.write_bytes(0, ty.layout().size());
        construct(ty, ptr);
    }
}

/// Writes the non-zero parts of a default value into zeroed memory.
unsafe fn construct(ty: &PropertyType, ptr: PtrMut<'_>) {
    // SAFETY: `ptr` is zeroed storage for `ty`.
    unsafe {
        match ty {
            PropertyType::String => ptr.write(String::new()),
            PropertyType::Text => ptr.write(Text::default()),
            PropertyType::SoftObject => ptr.write(SoftObjectPath::default()),
            PropertyType::Array(inner) => ptr.write(ScriptArray::new(inner.ty().layout())),
            PropertyType::Set(element) => ptr.write(ScriptSet::new(element.ty().layout())),
            PropertyType::Map { key, value } => ptr.write(ScriptMap::new(map_layout(key, value))),
            PropertyType::Struct(descriptor) => construct_fields(descriptor, ptr),
            _ => {}
        }
    }
}

unsafe fn construct_fields(descriptor: &StructDescriptor, mut ptr: PtrMut<'_>) {
    for field in descriptor.fields() {
        for index in 0..field.array_dim() {
            // SAFETY: the field lies inside the zeroed struct.
            unsafe {
                let value = field.value_ptr_mut(ptr.reborrow(), index);
                construct(field.ty(), value);
            }
        }
    }
}

/// Releases the resources owned by one element. The memory is left
/// uninitialized.
///
/// # Safety
///
/// `ptr` must point to an initialized value of `ty`.
pub(crate) unsafe fn destroy_element(ty: &PropertyType, ptr: PtrMut<'_>) {
    // SAFETY: guaranteed by the caller.
    unsafe {
        match ty {
            PropertyType::String => drop_in_place(ptr.as_ptr().cast::<String>()),
            PropertyType::Text => drop_in_place(ptr.as_ptr().cast::<Text>()),
            PropertyType::SoftObject => drop_in_place(ptr.as_ptr().cast::<SoftObjectPath>()),
            PropertyType::Array(inner) => {
                let array = ptr.consume::<ScriptArray>();
                if inner.ty().needs_destroy() {
                    for index in 0..array.len() {
                        destroy_element(inner.ty(), array.element_ptr_mut(index));
                    }
                }
                drop_in_place(array);
            }
            PropertyType::Set(element) => {
                let set = ptr.consume::<ScriptSet>();
                if element.ty().needs_destroy() {
                    for slot in 0..set.capacity() {
                        if set.is_valid_slot(slot) {
                            destroy_element(element.ty(), set.element_ptr_mut(slot));
                        }
                    }
                }
                drop_in_place(set);
            }
            PropertyType::Map { key, value } => {
                let map = ptr.consume::<ScriptMap>();
                for slot in 0..map.capacity() {
                    if map.is_valid_slot(slot) {
                        destroy_element(key.ty(), map.key_ptr_mut(slot));
                        destroy_element(value.ty(), map.value_ptr_mut(slot));
                    }
                }
                drop_in_place(map);
            }
            PropertyType::Struct(descriptor) => destroy_fields(descriptor, ptr),
            _ => {}
        }
    }
}

unsafe fn destroy_fields(descriptor: &StructDescriptor, mut ptr: PtrMut<'_>) {
    for field in descriptor.fields() {
        if !field.ty().needs_destroy() {
            continue;
        }
        for index in 0..field.array_dim() {
            // SAFETY: the field lies inside the initialized struct.
            unsafe { destroy_element(field.ty(), field.value_ptr_mut(ptr.reborrow(), index)) };
        }
    }
}

/// Assigns `src` to the initialized element `dst`.
///
/// # Safety
///
/// Both pointers must point to initialized, non-overlapping values of `ty`.
pub(crate) unsafe fn copy_element(ty: &PropertyType, mut dst: PtrMut<'_>, src: Ptr<'_>) {
    // SAFETY: guaranteed by the caller.
    unsafe {
        match ty {
            PropertyType::Bool(layout) => write_bool(*layout, dst, read_bool(*layout, src)),
            PropertyType::String => dst.as_mut::<String>().clone_from(src.as_ref::<String>()),
            PropertyType::Text => dst.as_mut::<Text>().clone_from(src.as_ref::<Text>()),
            PropertyType::SoftObject => dst
                .as_mut::<SoftObjectPath>()
                .clone_from(src.as_ref::<SoftObjectPath>()),
            PropertyType::Array(_) => {
                let source = src.as_ref::<ScriptArray>();
                let mut target = ArrayViewMut::new(ty, dst);
                let inner = target.element().ty();
                target.resize(source.len());
                for index in 0..source.len() {
                    copy_element(inner, target.element_ptr_mut(index), source.element_ptr(index));
                }
            }
            PropertyType::Set(_) => {
                let source = src.as_ref::<ScriptSet>();
                let mut target = SetViewMut::new(ty, dst);
                let element = target.element().ty();
                target.empty();
                for slot in source.slots() {
                    let new_slot = target.add_default_slot();
                    copy_element(element, target.element_ptr_mut(new_slot), source.element_ptr(slot));
                }
                target.rehash();
            }
            PropertyType::Map { .. } => {
                let source = src.as_ref::<ScriptMap>();
                let mut target = MapViewMut::new(ty, dst);
                let (key, value) = (target.key().ty(), target.value().ty());
                target.empty();
                for slot in source.slots() {
                    let new_slot = target.add_default_slot();
                    copy_element(key, target.key_ptr_mut(new_slot), source.key_ptr(slot));
                    copy_element(value, target.value_ptr_mut(new_slot), source.value_ptr(slot));
                }
                target.rehash();
            }
            PropertyType::Struct(descriptor) => {
                for field in descriptor.fields() {
                    for index in 0..field.array_dim() {
                        copy_element(
                            field.ty(),
                            field.value_ptr_mut(dst.reborrow(), index),
                            field.value_ptr(src, index),
                        );
                    }
                }
            }
            // Plain data.
            _ => dst.copy_from(src, ty.layout().size()),
        }
    }
}

/// Value equality. Names compare case-insensitively, sets and maps by
/// membership.
///
/// # Safety
///
/// Both pointers must point to initialized values of `ty`.
pub(crate) unsafe fn identical_element(ty: &PropertyType, a: Ptr<'_>, b: Ptr<'_>) -> bool {
    // SAFETY: guaranteed by the caller.
    unsafe {
        match ty {
            PropertyType::Bool(layout) => read_bool(*layout, a) == read_bool(*layout, b),
            PropertyType::Byte(_)
            | PropertyType::Int8
            | PropertyType::Int16
            | PropertyType::Int32
            | PropertyType::Int64
            | PropertyType::UInt16
            | PropertyType::UInt32
            | PropertyType::UInt64
            | PropertyType::Enum { .. } => read_integer(ty, a) == read_integer(ty, b),
            PropertyType::Float => a.read::<f32>() == b.read::<f32>(),
            PropertyType::Double => a.read::<f64>() == b.read::<f64>(),
            PropertyType::Name => a.read::<Name>() == b.read::<Name>(),
            PropertyType::String => a.as_ref::<String>() == b.as_ref::<String>(),
            PropertyType::Text => a.as_ref::<Text>() == b.as_ref::<Text>(),
            PropertyType::SoftObject => a.as_ref::<SoftObjectPath>() == b.as_ref::<SoftObjectPath>(),
            PropertyType::Object => a.read::<ObjectRef>() == b.read::<ObjectRef>(),
            PropertyType::WeakObject => a.read::<WeakObjectRef>() == b.read::<WeakObjectRef>(),
            PropertyType::Interface => a.read::<InterfaceRef>() == b.read::<InterfaceRef>(),
            PropertyType::Struct(descriptor) => descriptor.fields().iter().all(|field| {
                (0..field.array_dim()).all(|index| {
                    identical_element(
                        field.ty(),
                        field.value_ptr(a, index),
                        field.value_ptr(b, index),
                    )
                })
            }),
            PropertyType::Array(inner) => {
                let (a, b) = (a.as_ref::<ScriptArray>(), b.as_ref::<ScriptArray>());
                a.len() == b.len()
                    && (0..a.len()).all(|index| {
                        identical_element(inner.ty(), a.element_ptr(index), b.element_ptr(index))
                    })
            }
            PropertyType::Set(element) => {
                let (a, b) = (a.as_ref::<ScriptSet>(), b.as_ref::<ScriptSet>());
                a.len() == b.len()
                    && a.slots()
                        .all(|slot| set_find(b, element.ty(), a.element_ptr(slot)).is_some())
            }
            PropertyType::Map { key, value } => {
                let (a, b) = (a.as_ref::<ScriptMap>(), b.as_ref::<ScriptMap>());
                a.len() == b.len()
                    && a.slots().all(|slot| {
                        map_find(b, key.ty(), a.key_ptr(slot)).is_some_and(|other| {
                            identical_element(value.ty(), a.value_ptr(slot), b.value_ptr(other))
                        })
                    })
            }
        }
    }
}

/// Hash consistent with [`identical_element`].
///
/// # Safety
///
/// `ptr` must point to an initialized value of `ty`.
pub(crate) unsafe fn hash_element(ty: &PropertyType, ptr: Ptr<'_>) -> u64 {
    let mut hasher = FixedHashState.build_hasher();
    // SAFETY: guaranteed by the caller.
    unsafe { hash_into(ty, ptr, &mut hasher) };
    hasher.finish()
}

unsafe fn hash_into(ty: &PropertyType, ptr: Ptr<'_>, state: &mut FixedHasher) {
    // SAFETY: `ptr` points to an initialized value of `ty`.
    unsafe {
        match ty {
            PropertyType::Bool(layout) => read_bool(*layout, ptr).hash(state),
            PropertyType::Byte(_)
            | PropertyType::Int8
            | PropertyType::Int16
            | PropertyType::Int32
            | PropertyType::Int64
            | PropertyType::UInt16
            | PropertyType::UInt32
            | PropertyType::UInt64
            | PropertyType::Enum { .. } => read_integer(ty, ptr).hash(state),
            // `-0.0 == 0.0`, so both must hash alike.
            PropertyType::Float => {
                let value = ptr.read::<f32>();
                let value = if value == 0.0 { 0.0f32 } else { value };
                value.to_bits().hash(state);
            }
            PropertyType::Double => {
                let value = ptr.read::<f64>();
                let value = if value == 0.0 { 0.0f64 } else { value };
                value.to_bits().hash(state);
            }
            PropertyType::Name => ptr.read::<Name>().hash(state),
            PropertyType::String => ptr.as_ref::<String>().hash(state),
            PropertyType::Text => ptr.as_ref::<Text>().hash(state),
            PropertyType::SoftObject => ptr.as_ref::<SoftObjectPath>().hash(state),
            PropertyType::Object => ptr.read::<ObjectRef>().hash(state),
            PropertyType::WeakObject => ptr.read::<WeakObjectRef>().hash(state),
            PropertyType::Interface => ptr.read::<InterfaceRef>().hash(state),
            PropertyType::Struct(descriptor) => {
                for field in descriptor.fields() {
                    for index in 0..field.array_dim() {
                        hash_into(field.ty(), field.value_ptr(ptr, index), state);
                    }
                }
            }
            PropertyType::Array(inner) => {
                let array = ptr.as_ref::<ScriptArray>();
                array.len().hash(state);
                for index in 0..array.len() {
                    hash_into(inner.ty(), array.element_ptr(index), state);
                }
            }
            // Slot order is storage order, so combine element hashes commutatively.
            PropertyType::Set(element) => {
                let set = ptr.as_ref::<ScriptSet>();
                let sum = set.slots().fold(0u64, |sum, slot| {
                    sum.wrapping_add(hash_element(element.ty(), set.element_ptr(slot)))
                });
                set.len().hash(state);
                sum.hash(state);
            }
            PropertyType::Map { key, value } => {
                let map = ptr.as_ref::<ScriptMap>();
                let sum = map.slots().fold(0u64, |sum, slot| {
                    let pair = hash_element(key.ty(), map.key_ptr(slot)).wrapping_mul(31)
                        ^ hash_element(value.ty(), map.value_ptr(slot));
                    sum.wrapping_add(pair)
                });
                map.len().hash(state);
                sum.hash(state);
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Property operations

/// Lifecycle of a property's value inside its owning instance.
///
/// All operations cover the whole fixed array, `array_dim` elements starting
/// at the property's offset. The pointers are instance pointers, not value
/// pointers.
impl PropertyDescriptor {
    /// Writes the default value into uninitialized storage.
    ///
    /// # Safety
    ///
    /// `container` must point to the owning instance, with this property's
    /// bytes writable and not holding a live value.
    pub unsafe fn initialize_value(&self, mut container: PtrMut<'_>) {
        for index in 0..self.array_dim() {
            // SAFETY: guaranteed by the caller.
            unsafe { initialize_element(self.ty(), self.value_ptr_mut(container.reborrow(), index)) };
        }
    }

    /// Releases owned resources. The storage is left uninitialized.
    ///
    /// # Safety
    ///
    /// `container` must point to an initialized owning instance.
    pub unsafe fn destroy_value(&self, mut container: PtrMut<'_>) {
        if !self.ty().needs_destroy() {
            return;
        }
        for index in 0..self.array_dim() {
            // SAFETY: guaranteed by the caller.
            unsafe { destroy_element(self.ty(), self.value_ptr_mut(container.reborrow(), index)) };
        }
    }

    /// Resets the value to its default.
    ///
    /// # Safety
    ///
    /// `container` must point to an initialized owning instance.
    pub unsafe fn clear_value(&self, mut container: PtrMut<'_>) {
        for index in 0..self.array_dim() {
            // SAFETY: guaranteed by the caller.
            unsafe {
                let mut value = self.value_ptr_mut(container.reborrow(), index);
                destroy_element(self.ty(), value.reborrow());
                initialize_element(self.ty(), value);
            }
        }
    }

    /// Deep-copies the value from `src` into `dst`.
    ///
    /// # Safety
    ///
    /// Both pointers must point to distinct initialized owning instances.
    pub unsafe fn copy_value(&self, mut dst: PtrMut<'_>, src: Ptr<'_>) {
        for index in 0..self.array_dim() {
            // SAFETY: guaranteed by the caller.
            unsafe {
                copy_element(
                    self.ty(),
                    self.value_ptr_mut(dst.reborrow(), index),
                    self.value_ptr(src, index),
                );
            }
        }
    }

    /// Returns `true` if the two values are equal.
    ///
    /// # Safety
    ///
    /// Both pointers must point to initialized owning instances.
    pub unsafe fn identical(&self, a: Ptr<'_>, b: Ptr<'_>) -> bool {
        // SAFETY: guaranteed by the caller.
        (0..self.array_dim()).all(|index| unsafe {
            identical_element(self.ty(), self.value_ptr(a, index), self.value_ptr(b, index))
        })
    }

    /// Hash of the value, consistent with [`identical`](Self::identical).
    ///
    /// # Safety
    ///
    /// `container` must point to an initialized owning instance.
    pub unsafe fn hash_value(&self, container: Ptr<'_>) -> u64 {
        if self.array_dim() == 1 {
            // SAFETY: guaranteed by the caller.
            return unsafe { hash_element(self.ty(), self.value_ptr(container, 0)) };
        }
        let mut hasher = FixedHashState.build_hasher();
        for index in 0..self.array_dim() {
            // SAFETY: guaranteed by the caller.
            unsafe { hash_into(self.ty(), self.value_ptr(container, index), &mut hasher) };
        }
        hasher.finish()
    }
}

/// Whole-instance lifecycle, used by [`StructInstance`](super::StructInstance).
impl StructDescriptor {
    /// # Safety
    ///
    /// `ptr` must be valid for writes of this struct's layout.
    pub unsafe fn initialize(&self, mut ptr: PtrMut<'_>) {
        // SAFETY: guaranteed by the caller.
        unsafe {
            ptr.write_bytes(0, self.size());
            construct_fields(self, ptr);
        }
    }

    /// # Safety
    ///
    /// `ptr` must point to an initialized instance of this struct.
    pub unsafe fn destroy(&self, ptr: PtrMut<'_>) {
        // SAFETY: guaranteed by the caller.
        unsafe { destroy_fields(self, ptr) };
    }

    /// # Safety
    ///
    /// Both pointers must point to distinct initialized instances of this struct.
    pub unsafe fn copy(&self, mut dst: PtrMut<'_>, src: Ptr<'_>) {
        for field in self.fields() {
            // SAFETY: guaranteed by the caller.
            unsafe { field.copy_value(dst.reborrow(), src) };
        }
    }

    /// # Safety
    ///
    /// Both pointers must point to initialized instances of this struct.
    pub unsafe fn identical(&self, a: Ptr<'_>, b: Ptr<'_>) -> bool {
        // SAFETY: guaranteed by the caller.
        self.fields().iter().all(|field| unsafe { field.identical(a, b) })
    }
}

#[cfg(test)]
mod tests {
    use prism_ptr::{Ptr, PtrMut};

    use super::{hash_element, identical_element};
    use crate::info::{PropertyDescriptor, PropertyType};
    use crate::value::Name;

    #[test]
    fn float_zero_signs_hash_alike() {
        let (pos, neg) = (0.0f32, -0.0f32);
        unsafe {
            let (a, b) = (Ptr::from_ref(&pos), Ptr::from_ref(&neg));
            assert!(identical_element(&PropertyType::Float, a, b));
            assert_eq!(
                hash_element(&PropertyType::Float, a),
                hash_element(&PropertyType::Float, b)
            );
        }
    }

    #[test]
    fn names_compare_without_case() {
        let (a, b) = (Name::new("Door"), Name::new("DOOR"));
        unsafe {
            assert!(identical_element(&PropertyType::Name, Ptr::from_ref(&a), Ptr::from_ref(&b)));
        }
    }

    #[test]
    fn fixed_array_lifecycle() {
        let prop = PropertyDescriptor::new("Tags", PropertyType::String).with_array_dim(2);
        let mut src = [String::from("a"), String::from("b")];
        let mut dst = [String::new(), String::new()];
        unsafe {
            prop.copy_value(PtrMut::from_mut(&mut dst), Ptr::from_ref(&src));
            assert_eq!(dst, ["a", "b"]);
            assert!(prop.identical(Ptr::from_ref(&src), Ptr::from_ref(&dst)));

            prop.clear_value(PtrMut::from_mut(&mut src));
        }
        assert_eq!(src, ["", ""]);
    }
}
