use core::any::type_name;

use prism_ptr::{Ptr, PtrMut};
use thiserror::Error;

use super::PropertyStorage;
use super::scalar::{read_bool, read_integer, write_bool, write_integer};
use crate::container::{ArrayView, ArrayViewMut, MapView, MapViewMut, SetView, SetViewMut};
use crate::info::{PropertyDescriptor, PropertyKind, PropertyType, StructDescriptor};

// -----------------------------------------------------------------------------
// AccessError

/// Failure of a typed accessor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AccessError {
    #[error("struct `{structure}` has no field `{field}`")]
    MissingField { structure: String, field: String },
    #[error("property `{property}` of kind {kind} cannot be accessed as `{requested}`")]
    MismatchedType {
        property: String,
        kind: PropertyKind,
        requested: &'static str,
    },
    #[error("index {index} is out of bounds for `{property}` of length {len}")]
    OutOfBounds {
        property: String,
        index: usize,
        len: usize,
    },
    #[error("`{name}` is not an entry of the enum of `{property}`")]
    InvalidEnum { property: String, name: String },
}

impl AccessError {
    pub(crate) fn check_type<T: PropertyStorage>(
        property: &PropertyDescriptor,
    ) -> Result<(), AccessError> {
        if T::matches(property.ty()) {
            Ok(())
        } else {
            Err(AccessError::MismatchedType {
                property: property.name().into(),
                kind: property.kind(),
                requested: type_name::<T>(),
            })
        }
    }

    pub(crate) fn check_index(
        property: &PropertyDescriptor,
        index: usize,
        len: usize,
    ) -> Result<(), AccessError> {
        if index < len {
            Ok(())
        } else {
            Err(AccessError::OutOfBounds {
                property: property.name().into(),
                index,
                len,
            })
        }
    }

    fn check_kind(property: &PropertyDescriptor, requested: &'static str, ok: bool) -> Result<(), AccessError> {
        if ok {
            Ok(())
        } else {
            Err(AccessError::MismatchedType {
                property: property.name().into(),
                kind: property.kind(),
                requested,
            })
        }
    }
}

fn find_field<'a>(
    descriptor: &'a StructDescriptor,
    name: &str,
) -> Result<&'a PropertyDescriptor, AccessError> {
    descriptor.field(name).ok_or_else(|| AccessError::MissingField {
        structure: descriptor.name().into(),
        field: name.into(),
    })
}

// -----------------------------------------------------------------------------
// StructRef

/// A borrowed struct instance with its descriptor.
///
/// Field names resolve like [`StructDescriptor::field`]. Fixed-array fields
/// take an element index through the `_at` accessors.
#[derive(Clone, Copy, Debug)]
pub struct StructRef<'a> {
    descriptor: &'a StructDescriptor,
    data: Ptr<'a>,
}

impl<'a> StructRef<'a> {
    /// # Safety
    ///
    /// `data` must point to an initialized instance of `descriptor`.
    #[inline]
    pub unsafe fn new(descriptor: &'a StructDescriptor, data: Ptr<'a>) -> Self {
        Self { descriptor, data }
    }

    #[inline]
    pub fn descriptor(&self) -> &'a StructDescriptor {
        self.descriptor
    }

    #[inline]
    pub fn as_ptr(&self) -> Ptr<'a> {
        self.data
    }

    /// Descriptor and value pointer of element `index` of a field.
    pub fn field_ptr(
        &self,
        name: &str,
        index: usize,
    ) -> Result<(&'a PropertyDescriptor, Ptr<'a>), AccessError> {
        let field = find_field(self.descriptor, name)?;
        AccessError::check_index(field, index, field.array_dim())?;
        // SAFETY: the field belongs to this instance and the index was checked.
        Ok((field, unsafe { field.value_ptr(self.data, index) }))
    }

    #[inline]
    pub fn get<T: PropertyStorage>(&self, name: &str) -> Result<&'a T, AccessError> {
        self.get_at(name, 0)
    }

    pub fn get_at<T: PropertyStorage>(&self, name: &str, index: usize) -> Result<&'a T, AccessError> {
        let (field, ptr) = self.field_ptr(name, index)?;
        AccessError::check_type::<T>(field)?;
        // SAFETY: the storage type was checked.
        Ok(unsafe { ptr.as_ref::<T>() })
    }

    /// Reads a bool of any width or a bitfield bool.
    pub fn get_bool(&self, name: &str) -> Result<bool, AccessError> {
        let (field, ptr) = self.field_ptr(name, 0)?;
        match field.ty() {
            // SAFETY: the pointer holds a bool of this layout.
            PropertyType::Bool(layout) => Ok(unsafe { read_bool(*layout, ptr) }),
            _ => Err(AccessError::MismatchedType {
                property: field.name().into(),
                kind: field.kind(),
                requested: "bool",
            }),
        }
    }

    /// Reads any integer field, enums included, widened to `i128`.
    pub fn get_integer(&self, name: &str) -> Result<i128, AccessError> {
        let (field, ptr) = self.field_ptr(name, 0)?;
        // SAFETY: the pointer holds a value of the field type.
        let value = unsafe { read_integer(field.ty(), ptr) };
        AccessError::check_kind(field, "integer", value.is_some())?;
        Ok(value.unwrap_or_default())
    }

    /// Declared name of an enum field's current value, `None` if the value
    /// has no entry.
    pub fn get_enum(&self, name: &str) -> Result<Option<&'a str>, AccessError> {
        let (field, ptr) = self.field_ptr(name, 0)?;
        let Some(descriptor) = field.enum_descriptor() else {
            return Err(AccessError::MismatchedType {
                property: field.name().into(),
                kind: field.kind(),
                requested: "enum",
            });
        };
        // SAFETY: enum storage is an integer.
        let value = unsafe { read_integer(field.ty(), ptr) };
        Ok(value
            .and_then(|v| i64::try_from(v).ok())
            .and_then(|v| descriptor.name_of(v)))
    }

    /// A nested struct field.
    pub fn structure(&self, name: &str) -> Result<StructRef<'a>, AccessError> {
        let (field, ptr) = self.field_ptr(name, 0)?;
        match field.struct_descriptor() {
            // SAFETY: the pointer holds an instance of the nested struct.
            Some(descriptor) => Ok(unsafe { StructRef::new(descriptor, ptr) }),
            None => Err(AccessError::MismatchedType {
                property: field.name().into(),
                kind: field.kind(),
                requested: "struct",
            }),
        }
    }

    pub fn array_view(&self, name: &str) -> Result<ArrayView<'a>, AccessError> {
        let (field, ptr) = self.field_ptr(name, 0)?;
        AccessError::check_kind(field, "array", field.kind() == PropertyKind::Array)?;
        // SAFETY: the pointer holds an array of this type.
        Ok(unsafe { ArrayView::new(field.ty(), ptr) })
    }

    pub fn set_view(&self, name: &str) -> Result<SetView<'a>, AccessError> {
        let (field, ptr) = self.field_ptr(name, 0)?;
        AccessError::check_kind(field, "set", field.kind() == PropertyKind::Set)?;
        // SAFETY: the pointer holds a set of this type.
        Ok(unsafe { SetView::new(field.ty(), ptr) })
    }

    pub fn map_view(&self, name: &str) -> Result<MapView<'a>, AccessError> {
        let (field, ptr) = self.field_ptr(name, 0)?;
        AccessError::check_kind(field, "map", field.kind() == PropertyKind::Map)?;
        // SAFETY: the pointer holds a map of this type.
        Ok(unsafe { MapView::new(field.ty(), ptr) })
    }
}

// -----------------------------------------------------------------------------
// StructMut

/// A mutably borrowed struct instance with its descriptor.
#[derive(Debug)]
pub struct StructMut<'a> {
    descriptor: &'a StructDescriptor,
    data: PtrMut<'a>,
}

impl<'a> StructMut<'a> {
    /// # Safety
    ///
    /// `data` must point to an initialized instance of `descriptor`.
    #[inline]
    pub unsafe fn new(descriptor: &'a StructDescriptor, data: PtrMut<'a>) -> Self {
        Self { descriptor, data }
    }

    #[inline]
    pub fn descriptor(&self) -> &'a StructDescriptor {
        self.descriptor
    }

    #[inline]
    pub fn as_ref(&self) -> StructRef<'_> {
        StructRef {
            descriptor: self.descriptor,
            data: self.data.borrow(),
        }
    }

    #[inline]
    pub fn as_ptr_mut(&mut self) -> PtrMut<'_> {
        self.data.reborrow()
    }

    #[inline]
    pub(crate) fn into_raw(self) -> (&'a StructDescriptor, PtrMut<'a>) {
        (self.descriptor, self.data)
    }

    /// Descriptor and mutable value pointer of element `index` of a field.
    pub fn field_ptr_mut(
        &mut self,
        name: &str,
        index: usize,
    ) -> Result<(&'a PropertyDescriptor, PtrMut<'_>), AccessError> {
        let field = find_field(self.descriptor, name)?;
        AccessError::check_index(field, index, field.array_dim())?;
        // SAFETY: the field belongs to this instance and the index was checked.
        Ok((field, unsafe { field.value_ptr_mut(self.data.reborrow(), index) }))
    }

    #[inline]
    pub fn get_mut<T: PropertyStorage>(&mut self, name: &str) -> Result<&mut T, AccessError> {
        self.get_at_mut(name, 0)
    }

    pub fn get_at_mut<T: PropertyStorage>(
        &mut self,
        name: &str,
        index: usize,
    ) -> Result<&mut T, AccessError> {
        let (field, ptr) = self.field_ptr_mut(name, index)?;
        AccessError::check_type::<T>(field)?;
        // SAFETY: the storage type was checked.
        Ok(unsafe { ptr.consume::<T>() })
    }

    #[inline]
    pub fn set<T: PropertyStorage>(&mut self, name: &str, value: T) -> Result<(), AccessError> {
        self.set_at(name, 0, value)
    }

    pub fn set_at<T: PropertyStorage>(
        &mut self,
        name: &str,
        index: usize,
        value: T,
    ) -> Result<(), AccessError> {
        *self.get_at_mut::<T>(name, index)? = value;
        Ok(())
    }

    /// Writes a bool of any width or a bitfield bool.
    pub fn set_bool(&mut self, name: &str, value: bool) -> Result<(), AccessError> {
        let (field, ptr) = self.field_ptr_mut(name, 0)?;
        match field.ty() {
            PropertyType::Bool(layout) => {
                // SAFETY: the pointer holds a bool of this layout.
                unsafe { write_bool(*layout, ptr, value) };
                Ok(())
            }
            _ => Err(AccessError::MismatchedType {
                property: field.name().into(),
                kind: field.kind(),
                requested: "bool",
            }),
        }
    }

    /// Writes any integer field. Fails if `value` does not fit the width.
    pub fn set_integer(&mut self, name: &str, value: i128) -> Result<(), AccessError> {
        let (field, ptr) = self.field_ptr_mut(name, 0)?;
        // SAFETY: the pointer holds a value of the field type.
        let written = unsafe { write_integer(field.ty(), ptr, value) };
        AccessError::check_kind(field, "integer in range", written)
    }

    /// Sets an enum field by entry name. Accepts `Enum::Entry`.
    pub fn set_enum(&mut self, name: &str, entry: &str) -> Result<(), AccessError> {
        let (field, ptr) = self.field_ptr_mut(name, 0)?;
        let Some(descriptor) = field.enum_descriptor() else {
            return Err(AccessError::MismatchedType {
                property: field.name().into(),
                kind: field.kind(),
                requested: "enum",
            });
        };
        let invalid = || AccessError::InvalidEnum {
            property: field.name().into(),
            name: entry.into(),
        };
        let value = descriptor.value_of(entry).ok_or_else(invalid)?;
        // SAFETY: enum storage is an integer.
        if unsafe { write_integer(field.ty(), ptr, value as i128) } {
            Ok(())
        } else {
            Err(invalid())
        }
    }

    /// A nested struct field.
    pub fn structure_mut(&mut self, name: &str) -> Result<StructMut<'_>, AccessError> {
        let (field, ptr) = self.field_ptr_mut(name, 0)?;
        match field.struct_descriptor() {
            // SAFETY: the pointer holds an instance of the nested struct.
            Some(descriptor) => Ok(unsafe { StructMut::new(descriptor, ptr) }),
            None => Err(AccessError::MismatchedType {
                property: field.name().into(),
                kind: field.kind(),
                requested: "struct",
            }),
        }
    }

    pub fn array_view_mut(&mut self, name: &str) -> Result<ArrayViewMut<'_>, AccessError> {
        let (field, ptr) = self.field_ptr_mut(name, 0)?;
        AccessError::check_kind(field, "array", field.kind() == PropertyKind::Array)?;
        // SAFETY: the pointer holds an array of this type.
        Ok(unsafe { ArrayViewMut::new(field.ty(), ptr) })
    }

    pub fn set_view_mut(&mut self, name: &str) -> Result<SetViewMut<'_>, AccessError> {
        let (field, ptr) = self.field_ptr_mut(name, 0)?;
        AccessError::check_kind(field, "set", field.kind() == PropertyKind::Set)?;
        // SAFETY: the pointer holds a set of this type.
        Ok(unsafe { SetViewMut::new(field.ty(), ptr) })
    }

    pub fn map_view_mut(&mut self, name: &str) -> Result<MapViewMut<'_>, AccessError> {
        let (field, ptr) = self.field_ptr_mut(name, 0)?;
        AccessError::check_kind(field, "map", field.kind() == PropertyKind::Map)?;
        // SAFETY: the pointer holds a map of this type.
        Ok(unsafe { MapViewMut::new(field.ty(), ptr) })
    }
}
