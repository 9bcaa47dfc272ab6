use prism_ptr::PtrMut;
use serde_core::Deserialize;
use serde_core::de::{DeserializeSeed, Deserializer};

use super::array_visitor::ArrayVisitor;
use super::enum_visitor::deserialize_enum;
use super::error_utils::make_custom_error;
use super::map_visitor::MapVisitor;
use super::scalar_visitors::{BoolVisitor, FloatVisitor, IntegerVisitor, NullVisitor, StringVisitor};
use super::set_visitor::SetVisitor;
use super::struct_visitor::deserialize_struct;

use crate::container::{ArrayViewMut, MapViewMut, SetViewMut};
use crate::info::PropertyType;
use crate::ops::{write_bool, write_integer};
use crate::serde::DecodeContext;
use crate::value::{InterfaceRef, Name, ObjectRef, SoftObjectPath, Text, WeakObjectRef};

/// Decodes one element of `ty` in place, the single dispatch point of the
/// deserialize side.
///
/// The element is initialized before and after, also when an error is
/// returned; a failed scalar keeps its previous value.
pub(super) struct ElementSeed<'a> {
    pub ty: &'a PropertyType,
    /// Points to an initialized value of `ty`.
    pub ptr: PtrMut<'a>,
    pub ctx: &'a mut DecodeContext,
}

impl<'de> DeserializeSeed<'de> for ElementSeed<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        let human_readable = deserializer.is_human_readable();
        let Self { ty, ptr, ctx } = self;

        // SAFETY (all arms): `ptr` holds an initialized value of `ty`, and
        // every arm writes it as the storage type of its kind.
        match ty {
            PropertyType::Bool(layout) => {
                let value = if human_readable {
                    deserializer.deserialize_any(BoolVisitor)?
                } else {
                    deserializer.deserialize_bool(BoolVisitor)?
                };
                unsafe { write_bool(*layout, ptr, value) };
                Ok(())
            }
            PropertyType::Byte(Some(descriptor)) | PropertyType::Enum { descriptor, .. } => {
                deserialize_enum(descriptor, ty, ptr, ctx, deserializer)
            }
            PropertyType::Byte(None)
            | PropertyType::Int8
            | PropertyType::Int16
            | PropertyType::Int32
            | PropertyType::Int64
            | PropertyType::UInt16
            | PropertyType::UInt32
            | PropertyType::UInt64 => {
                let value = if human_readable {
                    deserializer.deserialize_any(IntegerVisitor)?
                } else {
                    deserialize_compact_integer(ty, deserializer)?
                };
                unsafe { store_integer(ty, ptr, value) }
            }
            PropertyType::Float => {
                let value = if human_readable {
                    deserializer.deserialize_any(FloatVisitor)?
                } else {
                    deserializer.deserialize_f32(FloatVisitor)?
                };
                unsafe { ptr.write(value as f32) };
                Ok(())
            }
            PropertyType::Double => {
                let value = if human_readable {
                    deserializer.deserialize_any(FloatVisitor)?
                } else {
                    deserializer.deserialize_f64(FloatVisitor)?
                };
                unsafe { ptr.write(value) };
                Ok(())
            }
            PropertyType::Name => {
                let name = if human_readable {
                    Name::new(&deserializer.deserialize_str(StringVisitor)?)
                } else {
                    let (comparison, display, number) =
                        <(u32, u32, u32)>::deserialize(deserializer)?;
                    Name::from_raw_parts(comparison, display, number).ok_or_else(|| {
                        make_custom_error(format!(
                            "no name is interned at ({comparison}, {display})"
                        ))
                    })?
                };
                unsafe { ptr.write(name) };
                Ok(())
            }
            PropertyType::String => {
                let value = deserializer.deserialize_string(StringVisitor)?;
                unsafe { *ptr.consume::<String>() = value };
                Ok(())
            }
            PropertyType::Text => {
                let value = deserializer.deserialize_string(StringVisitor)?;
                unsafe { *ptr.consume::<Text>() = Text::new(value) };
                Ok(())
            }
            PropertyType::SoftObject => {
                let value = deserializer.deserialize_string(StringVisitor)?;
                unsafe { *ptr.consume::<SoftObjectPath>() = SoftObjectPath::new(value) };
                Ok(())
            }
            PropertyType::Object => {
                let object = if human_readable {
                    deserializer.deserialize_any(NullVisitor)?;
                    ObjectRef::NULL
                } else {
                    ObjectRef::from_addr(u64::deserialize(deserializer)? as usize)
                };
                unsafe { ptr.write(object) };
                Ok(())
            }
            PropertyType::WeakObject => {
                let weak = if human_readable {
                    deserializer.deserialize_any(NullVisitor)?;
                    WeakObjectRef::default()
                } else {
                    let (object_index, serial_number) = <(i32, i32)>::deserialize(deserializer)?;
                    WeakObjectRef::new(object_index, serial_number)
                };
                unsafe { ptr.write(weak) };
                Ok(())
            }
            PropertyType::Interface => {
                if human_readable {
                    return Err(make_custom_error(
                        "Interface properties have no human-readable mapping",
                    ));
                }
                let (object, interface) = <(u64, u64)>::deserialize(deserializer)?;
                let value = InterfaceRef::new(ObjectRef::from_addr(object as usize), interface as usize);
                unsafe { ptr.write(value) };
                Ok(())
            }
            PropertyType::Struct(descriptor) => deserialize_struct(descriptor, ptr, ctx, deserializer),
            PropertyType::Array(_) => deserializer.deserialize_seq(ArrayVisitor {
                array: unsafe { ArrayViewMut::new(ty, ptr) },
                ctx,
            }),
            PropertyType::Set(_) => deserializer.deserialize_seq(SetVisitor {
                set: unsafe { SetViewMut::new(ty, ptr) },
                ctx,
            }),
            PropertyType::Map { .. } => deserializer.deserialize_map(MapVisitor {
                map: unsafe { MapViewMut::new(ty, ptr) },
                ctx,
            }),
        }
    }
}

/// Reads an integer at the declared width of `ty`.
pub(super) fn deserialize_compact_integer<'de, D: Deserializer<'de>>(
    ty: &PropertyType,
    deserializer: D,
) -> Result<i128, D::Error> {
    match ty.storage() {
        PropertyType::Byte(_) => deserializer.deserialize_u8(IntegerVisitor),
        PropertyType::Int8 => deserializer.deserialize_i8(IntegerVisitor),
        PropertyType::Int16 => deserializer.deserialize_i16(IntegerVisitor),
        PropertyType::Int32 => deserializer.deserialize_i32(IntegerVisitor),
        PropertyType::Int64 => deserializer.deserialize_i64(IntegerVisitor),
        PropertyType::UInt16 => deserializer.deserialize_u16(IntegerVisitor),
        PropertyType::UInt32 => deserializer.deserialize_u32(IntegerVisitor),
        PropertyType::UInt64 => deserializer.deserialize_u64(IntegerVisitor),
        other => Err(make_custom_error(format!("`{}` is not an integer type", other.kind()))),
    }
}

/// Writes `value` at the declared width, failing if it does not fit.
///
/// # Safety
///
/// `ptr` must point to writable storage of `ty`.
pub(super) unsafe fn store_integer<E: serde_core::de::Error>(
    ty: &PropertyType,
    ptr: PtrMut<'_>,
    value: i128,
) -> Result<(), E> {
    // SAFETY: guaranteed by the caller.
    if unsafe { write_integer(ty, ptr, value) } {
        Ok(())
    } else {
        Err(make_custom_error(format!(
            "{value} is out of range for `{}`",
            ty.storage().kind()
        )))
    }
}
