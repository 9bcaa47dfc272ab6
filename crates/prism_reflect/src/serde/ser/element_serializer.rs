use prism_ptr::Ptr;
use serde_core::{Serialize, Serializer};

use super::array_serializer::ArraySerializer;
use super::error_utils::make_custom_error;
use super::map_serializer::MapSerializer;
use super::set_serializer::SetSerializer;
use super::struct_serializer::StructSerializer;

use crate::container::{ArrayView, MapView, SetView};
use crate::info::{EnumDescriptor, PropertyType};
use crate::ops::{read_bool, read_integer};
use crate::value::{InterfaceRef, Name, ObjectRef, SoftObjectPath, Text, WeakObjectRef};

/// Serializes one element of `ty`, the single dispatch point of the
/// serialize side.
///
/// Compact formats get `Name`s as index triples and object handles as raw
/// values. Human-readable formats get names as text and `null` for object
/// handles, and reject interfaces.
pub(super) struct ElementSerializer<'a> {
    pub ty: &'a PropertyType,
    /// Points to an initialized value of `ty`.
    pub ptr: Ptr<'a>,
}

impl Serialize for ElementSerializer<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let human_readable = serializer.is_human_readable();
        let ptr = self.ptr;

        // SAFETY: `ptr` holds an initialized value of `ty`, and every arm
        // reads it as the storage type of its kind.
        unsafe {
            match self.ty {
                PropertyType::Bool(layout) => serializer.serialize_bool(read_bool(*layout, ptr)),
                PropertyType::Byte(None) => serializer.serialize_u8(ptr.read::<u8>()),
                PropertyType::Byte(Some(descriptor)) | PropertyType::Enum { descriptor, .. } => {
                    serialize_enum(descriptor, self.ty, ptr, serializer)
                }
                PropertyType::Int8 => serializer.serialize_i8(ptr.read::<i8>()),
                PropertyType::Int16 => serializer.serialize_i16(ptr.read::<i16>()),
                PropertyType::Int32 => serializer.serialize_i32(ptr.read::<i32>()),
                PropertyType::Int64 => serializer.serialize_i64(ptr.read::<i64>()),
                PropertyType::UInt16 => serializer.serialize_u16(ptr.read::<u16>()),
                PropertyType::UInt32 => serializer.serialize_u32(ptr.read::<u32>()),
                PropertyType::UInt64 => serializer.serialize_u64(ptr.read::<u64>()),
                PropertyType::Float => {
                    let value = ptr.read::<f32>();
                    if human_readable && !value.is_finite() {
                        serializer.serialize_str(non_finite_text(value as f64))
                    } else {
                        serializer.serialize_f32(value)
                    }
                }
                PropertyType::Double => {
                    let value = ptr.read::<f64>();
                    if human_readable && !value.is_finite() {
                        serializer.serialize_str(non_finite_text(value))
                    } else {
                        serializer.serialize_f64(value)
                    }
                }
                PropertyType::Name => {
                    let name = ptr.read::<Name>();
                    if human_readable {
                        serializer.collect_str(&name)
                    } else {
                        (name.comparison_index(), name.display_index(), name.number())
                            .serialize(serializer)
                    }
                }
                PropertyType::String => serializer.serialize_str(ptr.as_ref::<String>()),
                PropertyType::Text => serializer.serialize_str(ptr.as_ref::<Text>().as_str()),
                PropertyType::Object => {
                    let object = ptr.read::<ObjectRef>();
                    if human_readable {
                        serializer.serialize_none()
                    } else {
                        serializer.serialize_u64(object.addr() as u64)
                    }
                }
                PropertyType::WeakObject => {
                    let weak = ptr.read::<WeakObjectRef>();
                    if human_readable {
                        serializer.serialize_none()
                    } else {
                        (weak.object_index, weak.serial_number).serialize(serializer)
                    }
                }
                PropertyType::SoftObject => {
                    serializer.serialize_str(ptr.as_ref::<SoftObjectPath>().as_str())
                }
                PropertyType::Interface => {
                    if human_readable {
                        return Err(make_custom_error(
                            "Interface properties have no human-readable mapping",
                        ));
                    }
                    let interface = ptr.read::<InterfaceRef>();
                    (interface.object.addr() as u64, interface.interface as u64)
                        .serialize(serializer)
                }
                PropertyType::Struct(descriptor) => {
                    StructSerializer { descriptor, ptr }.serialize(serializer)
                }
                PropertyType::Array(_) => ArraySerializer {
                    array: ArrayView::new(self.ty, ptr),
                }
                .serialize(serializer),
                PropertyType::Set(_) => SetSerializer {
                    set: SetView::new(self.ty, ptr),
                }
                .serialize(serializer),
                PropertyType::Map { .. } => MapSerializer {
                    map: MapView::new(self.ty, ptr),
                }
                .serialize(serializer),
            }
        }
    }
}

/// Enums are written by name in every format.
///
/// # Safety
///
/// `ptr` must hold an initialized value of `ty`.
unsafe fn serialize_enum<S: Serializer>(
    descriptor: &EnumDescriptor,
    ty: &PropertyType,
    ptr: Ptr<'_>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    // SAFETY: guaranteed by the caller.
    let value = unsafe { read_integer(ty, ptr) }.unwrap_or_default();
    let name = i64::try_from(value)
        .ok()
        .and_then(|value| descriptor.name_of(value));
    match name {
        Some(name) => serializer.serialize_str(name),
        None => Err(make_custom_error(format!(
            "value {value} of enum `{}` has no name",
            descriptor.name()
        ))),
    }
}

/// Human-readable formats have no number for these, the text reads back
/// through `str::parse`.
fn non_finite_text(value: f64) -> &'static str {
    if value.is_nan() {
        "NaN"
    } else if value > 0.0 {
        "inf"
    } else {
        "-inf"
    }
}
