use alloc::alloc::{alloc, dealloc, handle_alloc_error};
use alloc::sync::Arc;
use core::fmt;
use core::ptr::NonNull;

use prism_ptr::{Ptr, PtrMut};

use super::{AccessError, PropertyStorage, StructMut, StructRef};
use crate::codec::text::{TextOptions, export_struct};
use crate::container::{ArrayView, ArrayViewMut, MapView, MapViewMut, SetView, SetViewMut};
use crate::info::{PropertyDescriptor, PropertyKind, StructDescriptor};

/// A heap-allocated, owned instance of a described struct.
///
/// The memory is initialized to the descriptor's defaults on creation and
/// destroyed on drop. Cloning deep-copies every field, equality compares
/// field by field.
///
/// # Examples
///
/// ```
/// use prism_reflect::info::{PropertyType, StructBuilder};
/// use prism_reflect::ops::StructInstance;
/// use std::sync::Arc;
///
/// let player = Arc::new(
///     StructBuilder::new("Player")
///         .field("Health", PropertyType::Int32)
///         .field("Nick", PropertyType::String)
///         .build(),
/// );
///
/// let mut a = StructInstance::new(player);
/// a.set("Health", 42i32).unwrap();
/// a.set("Nick", String::from("ada")).unwrap();
///
/// let b = a.clone();
/// assert_eq!(a, b);
/// assert_eq!(b.get::<i32>("Health"), Ok(&42));
/// assert!(b.get::<u32>("Health").is_err());
/// ```
pub struct StructInstance {
    descriptor: Arc<StructDescriptor>,
    data: NonNull<u8>,
}

// SAFETY: property values are plain data owned by the instance.
unsafe impl Send for StructInstance {}
// SAFETY: shared access never mutates.
unsafe impl Sync for StructInstance {}

impl StructInstance {
    /// Allocates an instance holding default values.
    pub fn new(descriptor: Arc<StructDescriptor>) -> Self {
        let layout = descriptor.layout();
        // SAFETY: descriptors never have a zero-sized layout.
        let raw = unsafe { alloc(layout) };
        let Some(data) = NonNull::new(raw) else {
            handle_alloc_error(layout);
        };
        // SAFETY: freshly allocated memory of the descriptor's layout.
        unsafe { descriptor.initialize(PtrMut::new(data)) };
        Self { descriptor, data }
    }

    #[inline]
    pub fn descriptor(&self) -> &Arc<StructDescriptor> {
        &self.descriptor
    }

    #[inline]
    pub fn as_ptr(&self) -> Ptr<'_> {
        // SAFETY: the allocation lives as long as `self`.
        unsafe { Ptr::new(self.data) }
    }

    #[inline]
    pub fn as_ptr_mut(&mut self) -> PtrMut<'_> {
        // SAFETY: the allocation lives as long as `self`, borrowed uniquely.
        unsafe { PtrMut::new(self.data) }
    }

    #[inline]
    pub fn view(&self) -> StructRef<'_> {
        // SAFETY: the memory holds an initialized instance of the descriptor.
        unsafe { StructRef::new(&self.descriptor, self.as_ptr()) }
    }

    #[inline]
    pub fn view_mut(&mut self) -> StructMut<'_> {
        // SAFETY: the memory holds an initialized instance of the descriptor.
        unsafe { StructMut::new(&self.descriptor, PtrMut::new(self.data)) }
    }

    /// Restores every field to its default value.
    pub fn reset(&mut self) {
        let data = self.data;
        // SAFETY: destroy leaves uninitialized memory that initialize refills.
        unsafe {
            self.descriptor.destroy(PtrMut::new(data));
            self.descriptor.initialize(PtrMut::new(data));
        }
    }

    #[inline]
    pub fn get<T: PropertyStorage>(&self, name: &str) -> Result<&T, AccessError> {
        self.view().get(name)
    }

    #[inline]
    pub fn get_at<T: PropertyStorage>(&self, name: &str, index: usize) -> Result<&T, AccessError> {
        self.view().get_at(name, index)
    }

    pub fn get_mut<T: PropertyStorage>(&mut self, name: &str) -> Result<&mut T, AccessError> {
        let (field, ptr) = self.field_ptr_mut(name)?;
        AccessError::check_type::<T>(field)?;
        // SAFETY: the storage type was checked.
        Ok(unsafe { ptr.consume::<T>() })
    }

    #[inline]
    pub fn set<T: PropertyStorage>(&mut self, name: &str, value: T) -> Result<(), AccessError> {
        self.view_mut().set(name, value)
    }

    #[inline]
    pub fn set_at<T: PropertyStorage>(
        &mut self,
        name: &str,
        index: usize,
        value: T,
    ) -> Result<(), AccessError> {
        self.view_mut().set_at(name, index, value)
    }

    #[inline]
    pub fn get_bool(&self, name: &str) -> Result<bool, AccessError> {
        self.view().get_bool(name)
    }

    #[inline]
    pub fn set_bool(&mut self, name: &str, value: bool) -> Result<(), AccessError> {
        self.view_mut().set_bool(name, value)
    }

    #[inline]
    pub fn get_enum(&self, name: &str) -> Result<Option<&str>, AccessError> {
        self.view().get_enum(name)
    }

    #[inline]
    pub fn set_enum(&mut self, name: &str, entry: &str) -> Result<(), AccessError> {
        self.view_mut().set_enum(name, entry)
    }

    #[inline]
    pub fn array_view(&self, name: &str) -> Result<ArrayView<'_>, AccessError> {
        self.view().array_view(name)
    }

    #[inline]
    pub fn set_view(&self, name: &str) -> Result<SetView<'_>, AccessError> {
        self.view().set_view(name)
    }

    #[inline]
    pub fn map_view(&self, name: &str) -> Result<MapView<'_>, AccessError> {
        self.view().map_view(name)
    }

    pub fn array_view_mut(&mut self, name: &str) -> Result<ArrayViewMut<'_>, AccessError> {
        let (field, ptr) = self.field_ptr_mut(name)?;
        if field.kind() != PropertyKind::Array {
            return Err(mismatched(field, "array"));
        }
        // SAFETY: the pointer holds an array of this type.
        Ok(unsafe { ArrayViewMut::new(field.ty(), ptr) })
    }

    pub fn set_view_mut(&mut self, name: &str) -> Result<SetViewMut<'_>, AccessError> {
        let (field, ptr) = self.field_ptr_mut(name)?;
        if field.kind() != PropertyKind::Set {
            return Err(mismatched(field, "set"));
        }
        // SAFETY: the pointer holds a set of this type.
        Ok(unsafe { SetViewMut::new(field.ty(), ptr) })
    }

    pub fn map_view_mut(&mut self, name: &str) -> Result<MapViewMut<'_>, AccessError> {
        let (field, ptr) = self.field_ptr_mut(name)?;
        if field.kind() != PropertyKind::Map {
            return Err(mismatched(field, "map"));
        }
        // SAFETY: the pointer holds a map of this type.
        Ok(unsafe { MapViewMut::new(field.ty(), ptr) })
    }

    fn field_ptr_mut(
        &mut self,
        name: &str,
    ) -> Result<(&PropertyDescriptor, PtrMut<'_>), AccessError> {
        let descriptor: &StructDescriptor = &self.descriptor;
        let field = descriptor.field(name).ok_or_else(|| AccessError::MissingField {
            structure: descriptor.name().into(),
            field: name.into(),
        })?;
        // SAFETY: the field belongs to this instance.
        let ptr = unsafe { field.value_ptr_mut(PtrMut::new(self.data), 0) };
        Ok((field, ptr))
    }
}

fn mismatched(field: &PropertyDescriptor, requested: &'static str) -> AccessError {
    AccessError::MismatchedType {
        property: field.name().into(),
        kind: field.kind(),
        requested,
    }
}

impl Drop for StructInstance {
    fn drop(&mut self) {
        let layout = self.descriptor.layout();
        // SAFETY: the memory holds an initialized instance allocated with `layout`.
        unsafe {
            self.descriptor.destroy(PtrMut::new(self.data));
            dealloc(self.data.as_ptr(), layout);
        }
    }
}

impl Clone for StructInstance {
    fn clone(&self) -> Self {
        let mut copy = StructInstance::new(self.descriptor.clone());
        // SAFETY: two distinct initialized instances of the same descriptor.
        unsafe { self.descriptor.copy(copy.as_ptr_mut(), self.as_ptr()) };
        copy
    }
}

impl PartialEq for StructInstance {
    fn eq(&self, other: &Self) -> bool {
        // SAFETY: both instances are initialized for their own descriptor.
        Arc::ptr_eq(&self.descriptor, &other.descriptor)
            && unsafe { self.descriptor.identical(self.as_ptr(), other.as_ptr()) }
    }
}

impl fmt::Debug for StructInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: the memory holds an initialized instance of the descriptor.
        let text = unsafe { export_struct(&self.descriptor, self.as_ptr(), &TextOptions::default()) };
        write!(f, "{}{}", self.descriptor.name(), text)
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use super::StructInstance;
    use crate::info::{EnumDescriptor, PropertyType, StructBuilder, StructDescriptor};

    fn player() -> Arc<StructDescriptor> {
        let state = Arc::new(EnumDescriptor::from_names("EMoveState", ["Idle", "Run"]));
        Arc::new(
            StructBuilder::new("Player")
                .field("Health", PropertyType::Int32)
                .field("State", PropertyType::byte_enum(state))
                .field("Alive", PropertyType::bool())
                .build(),
        )
    }

    #[test]
    fn equality_needs_the_same_descriptor() {
        let descriptor = player();
        let mut a = StructInstance::new(descriptor.clone());
        let mut b = StructInstance::new(descriptor);
        a.set("Health", 7i32).unwrap();
        b.set("Health", 7i32).unwrap();
        assert_eq!(a, b);

        b.set("Health", 8i32).unwrap();
        assert_ne!(a, b);

        // Same layout and values, separately built descriptor.
        let mut other = StructInstance::new(player());
        other.set("Health", 7i32).unwrap();
        assert_ne!(a, other);
        assert_eq!(StructInstance::new(a.descriptor().clone()), StructInstance::new(a.descriptor().clone()));
    }

    #[test]
    fn enum_by_name() {
        let mut instance = StructInstance::new(player());
        assert_eq!(instance.get_enum("State"), Ok(Some("Idle")));
        instance.set_enum("State", "EMoveState::Run").unwrap();
        assert_eq!(instance.get::<u8>("State"), Ok(&1));
        assert!(instance.set_enum("State", "Fly").is_err());
    }

    #[test]
    fn reset_restores_defaults() {
        let mut instance = StructInstance::new(player());
        instance.set("Health", 7i32).unwrap();
        instance.set_bool("Alive", true).unwrap();
        *instance.get_mut::<i32>("Health").unwrap() += 1;
        assert_eq!(instance.get::<i32>("Health"), Ok(&8));

        instance.reset();
        assert_eq!(instance, StructInstance::new(instance.descriptor().clone()));
        assert_eq!(instance.get_bool("Alive"), Ok(false));
    }

    #[test]
    fn debug_uses_text_form() {
        let mut instance = StructInstance::new(player());
        instance.set("Health", 3i32).unwrap();
        assert_eq!(
            format!("{instance:?}"),
            "Player(Health=3,State=Idle,Alive=False)"
        );
    }
}
