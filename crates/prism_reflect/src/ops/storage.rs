use crate::container::{ScriptArray, ScriptMap, ScriptSet};
use crate::info::{BoolLayout, PropertyType};
use crate::value::{InterfaceRef, Name, ObjectRef, SoftObjectPath, Text, WeakObjectRef};

/// A Rust type that can view the memory of some property types.
///
/// Typed accessors such as [`StructRef::get`](super::StructRef::get) check
/// [`matches`](Self::matches) before reinterpreting instance memory. Enums
/// match their storage integer.
///
/// # Safety
///
/// `matches` may only return `true` for property types whose values have
/// exactly the size, alignment and validity of `Self`.
///
/// # Examples
///
/// Mapping a `#[repr(C)]` struct onto its descriptor:
///
/// ```
/// use prism_reflect::info::PropertyType;
/// use prism_reflect::ops::PropertyStorage;
///
/// #[repr(C)]
/// struct Vector2 {
///     x: f32,
///     y: f32,
/// }
///
/// unsafe impl PropertyStorage for Vector2 {
///     fn matches(ty: &PropertyType) -> bool {
///         matches!(ty, PropertyType::Struct(s) if s.name() == "Vector2")
///     }
/// }
///
/// assert!(!Vector2::matches(&PropertyType::Float));
/// ```
pub unsafe trait PropertyStorage: 'static {
    fn matches(ty: &PropertyType) -> bool;
}

macro_rules! impl_property_storage {
    ($($ty:ty => $pat:pat),* $(,)?) => {
        $(
            unsafe impl PropertyStorage for $ty {
                #[inline]
                fn matches(ty: &PropertyType) -> bool {
                    matches!(ty.storage(), $pat)
                }
            }
        )*
    };
}

impl_property_storage! {
    bool => PropertyType::Bool(BoolLayout::Native(1)),
    u8 => PropertyType::Byte(_),
    i8 => PropertyType::Int8,
    i16 => PropertyType::Int16,
    i32 => PropertyType::Int32,
    i64 => PropertyType::Int64,
    u16 => PropertyType::UInt16,
    u32 => PropertyType::UInt32,
    u64 => PropertyType::UInt64,
    f32 => PropertyType::Float,
    f64 => PropertyType::Double,
    Name => PropertyType::Name,
    String => PropertyType::String,
    Text => PropertyType::Text,
    ObjectRef => PropertyType::Object,
    WeakObjectRef => PropertyType::WeakObject,
    SoftObjectPath => PropertyType::SoftObject,
    InterfaceRef => PropertyType::Interface,
    ScriptArray => PropertyType::Array(_),
    ScriptSet => PropertyType::Set(_),
    ScriptMap => PropertyType::Map { .. },
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use super::PropertyStorage;
    use crate::info::{BoolLayout, EnumDescriptor, PropertyType};

    #[test]
    fn enums_match_their_storage() {
        let e = Arc::new(EnumDescriptor::from_names("EDir", ["Up", "Down"]));
        assert!(u8::matches(&PropertyType::byte_enum(e.clone())));
        assert!(i32::matches(&PropertyType::enumeration(e, PropertyType::Int32)));
        assert!(!u32::matches(&PropertyType::Int32));
    }

    #[test]
    fn only_one_byte_bools_are_rust_bools() {
        assert!(bool::matches(&PropertyType::bool()));
        assert!(!bool::matches(&PropertyType::Bool(BoolLayout::Native(4))));
        assert!(!bool::matches(&PropertyType::Bool(BoolLayout::Bitfield { mask: 1 })));
    }
}
