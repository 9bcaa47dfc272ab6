use alloc::borrow::Cow;
use alloc::sync::Arc;
use core::alloc::Layout;

use prism_ptr::{Ptr, PtrMut};

use crate::container::{MapLayout, ScriptArray, ScriptMap, ScriptSet};
use crate::info::{EnumDescriptor, PropertyFlags, PropertyKind, StructDescriptor};
use crate::value::{InterfaceRef, Name, ObjectRef, SoftObjectPath, Text, WeakObjectRef};

// -----------------------------------------------------------------------------
// BoolLayout

/// Storage of a boolean property.
///
/// Reads are logical: any non-zero native value is `true`, a bitfield is
/// `true` when its bit is set. Writes store `0`/`1`, and bitfield writes keep
/// the neighbouring bits of the shared byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoolLayout {
    /// A whole integer of 1, 2, 4 or 8 bytes.
    Native(u8),
    /// One bit of a shared byte.
    Bitfield { mask: u8 },
}

impl BoolLayout {
    /// A Rust `bool`.
    pub const NATIVE: BoolLayout = BoolLayout::Native(1);

    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Self::Native(size) => size as usize,
            Self::Bitfield { .. } => 1,
        }
    }
}

// -----------------------------------------------------------------------------
// PropertyType

/// The closed set of property types, with the nested descriptors each carries.
///
/// Nested descriptors (enum underlying type, container elements, map key and
/// value) always have offset `0` and an array dimension of `1`; they describe a
/// value relative to the pointer handed to them.
#[derive(Clone, Debug)]
pub enum PropertyType {
    Bool(BoolLayout),
    /// `u8`, optionally presenting an enum.
    Byte(Option<Arc<EnumDescriptor>>),
    Int8,
    Int16,
    Int32,
    Int64,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    Name,
    String,
    Text,
    Enum {
        descriptor: Arc<EnumDescriptor>,
        underlying: Box<PropertyDescriptor>,
    },
    Object,
    WeakObject,
    SoftObject,
    Interface,
    Struct(Arc<StructDescriptor>),
    Array(Box<PropertyDescriptor>),
    Set(Box<PropertyDescriptor>),
    Map {
        key: Box<PropertyDescriptor>,
        value: Box<PropertyDescriptor>,
    },
}

impl PropertyType {
    /// A native `bool`.
    #[inline]
    pub const fn bool() -> Self {
        Self::Bool(BoolLayout::NATIVE)
    }

    /// An enum stored in `underlying`, which must be an integer type.
    ///
    /// # Panics
    ///
    /// Panics if `underlying` is not an integer type.
    #[track_caller]
    pub fn enumeration(descriptor: Arc<EnumDescriptor>, underlying: PropertyType) -> Self {
        assert!(
            underlying.kind().is_integer(),
            "enum `{}` cannot be stored as `{}`",
            descriptor.name(),
            underlying.kind(),
        );
        Self::Enum {
            descriptor,
            underlying: Box::new(PropertyDescriptor::new("UnderlyingType", underlying)),
        }
    }

    /// An enum stored in a single byte.
    #[inline]
    pub fn byte_enum(descriptor: Arc<EnumDescriptor>) -> Self {
        Self::Byte(Some(descriptor))
    }

    #[inline]
    pub fn structure(descriptor: Arc<StructDescriptor>) -> Self {
        Self::Struct(descriptor)
    }

    #[inline]
    pub fn array(element: PropertyType) -> Self {
        Self::Array(Box::new(PropertyDescriptor::new("Inner", element)))
    }

    #[inline]
    pub fn set(element: PropertyType) -> Self {
        Self::Set(Box::new(PropertyDescriptor::new("ElementProp", element)))
    }

    #[inline]
    pub fn map(key: PropertyType, value: PropertyType) -> Self {
        Self::Map {
            key: Box::new(PropertyDescriptor::new("Key", key)),
            value: Box::new(PropertyDescriptor::new("Value", value)),
        }
    }

    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Bool(_) => PropertyKind::Bool,
            Self::Byte(_) => PropertyKind::Byte,
            Self::Int8 => PropertyKind::Int8,
            Self::Int16 => PropertyKind::Int16,
            Self::Int32 => PropertyKind::Int32,
            Self::Int64 => PropertyKind::Int64,
            Self::UInt16 => PropertyKind::UInt16,
            Self::UInt32 => PropertyKind::UInt32,
            Self::UInt64 => PropertyKind::UInt64,
            Self::Float => PropertyKind::Float,
            Self::Double => PropertyKind::Double,
            Self::Name => PropertyKind::Name,
            Self::String => PropertyKind::String,
            Self::Text => PropertyKind::Text,
            Self::Enum { .. } => PropertyKind::Enum,
            Self::Object => PropertyKind::Object,
            Self::WeakObject => PropertyKind::WeakObject,
            Self::SoftObject => PropertyKind::SoftObject,
            Self::Interface => PropertyKind::Interface,
            Self::Struct(_) => PropertyKind::Struct,
            Self::Array(_) => PropertyKind::Array,
            Self::Set(_) => PropertyKind::Set,
            Self::Map { .. } => PropertyKind::Map,
        }
    }

    /// Layout of one value of this type.
    pub fn layout(&self) -> Layout {
        match self {
            Self::Bool(BoolLayout::Native(size)) => {
                let size = *size as usize;
                assert!(
                    matches!(size, 1 | 2 | 4 | 8),
                    "native bool of {size} bytes is not supported"
                );
                // size is a power of two, so this cannot fail.
                Layout::from_size_align(size, size).unwrap_or(Layout::new::<u8>())
            }
            Self::Bool(BoolLayout::Bitfield { .. }) | Self::Byte(_) => Layout::new::<u8>(),
            Self::Int8 => Layout::new::<i8>(),
            Self::Int16 => Layout::new::<i16>(),
            Self::Int32 => Layout::new::<i32>(),
            Self::Int64 => Layout::new::<i64>(),
            Self::UInt16 => Layout::new::<u16>(),
            Self::UInt32 => Layout::new::<u32>(),
            Self::UInt64 => Layout::new::<u64>(),
            Self::Float => Layout::new::<f32>(),
            Self::Double => Layout::new::<f64>(),
            Self::Name => Layout::new::<Name>(),
            Self::String => Layout::new::<String>(),
            Self::Text => Layout::new::<Text>(),
            Self::Enum { underlying, .. } => underlying.ty.layout(),
            Self::Object => Layout::new::<ObjectRef>(),
            Self::WeakObject => Layout::new::<WeakObjectRef>(),
            Self::SoftObject => Layout::new::<SoftObjectPath>(),
            Self::Interface => Layout::new::<InterfaceRef>(),
            Self::Struct(descriptor) => descriptor.layout(),
            Self::Array(_) => Layout::new::<ScriptArray>(),
            Self::Set(_) => Layout::new::<ScriptSet>(),
            Self::Map { .. } => Layout::new::<ScriptMap>(),
        }
    }

    /// Strips an enum down to the integer type it is stored in.
    #[inline]
    pub fn storage(&self) -> &PropertyType {
        match self {
            Self::Enum { underlying, .. } => &underlying.ty,
            other => other,
        }
    }

    /// The enum this type presents, for `Enum` and enum-backed `Byte`.
    pub fn enum_descriptor(&self) -> Option<&Arc<EnumDescriptor>> {
        match self {
            Self::Enum { descriptor, .. } | Self::Byte(Some(descriptor)) => Some(descriptor),
            _ => None,
        }
    }

    /// Whether values of this type own resources that must be released.
    pub fn needs_destroy(&self) -> bool {
        match self {
            Self::String | Self::Text | Self::SoftObject => true,
            Self::Array(_) | Self::Set(_) | Self::Map { .. } => true,
            Self::Struct(descriptor) => descriptor.fields().iter().any(|f| f.ty.needs_destroy()),
            _ => false,
        }
    }
}

/// Pair layout of a map property.
#[inline]
pub(crate) fn map_layout(key: &PropertyDescriptor, value: &PropertyDescriptor) -> MapLayout {
    MapLayout::new(key.ty.layout(), value.ty.layout())
}

// -----------------------------------------------------------------------------
// PropertyDescriptor

/// Metadata describing one field of a structured type.
///
/// A descriptor is built once, usually when its owning [`StructDescriptor`] is
/// registered, and never changes afterwards. It locates a value inside an
/// instance: element `index` of the field starts at
/// `instance + offset + index * element_size`.
///
/// # Examples
///
/// ```
/// use prism_reflect::info::{PropertyDescriptor, PropertyFlags, PropertyKind, PropertyType};
///
/// let scores = PropertyDescriptor::new("Scores", PropertyType::Int32)
///     .with_array_dim(3)
///     .with_flags(PropertyFlags::EDITABLE);
///
/// assert_eq!(scores.kind(), PropertyKind::Int32);
/// assert_eq!(scores.element_size(), 4);
/// assert_eq!(scores.total_size(), 12);
/// assert!(scores.should_serialize());
/// ```
#[derive(Clone, Debug)]
pub struct PropertyDescriptor {
    name: Cow<'static, str>,
    offset: usize,
    array_dim: usize,
    flags: PropertyFlags,
    pub(crate) ty: PropertyType,
}

impl PropertyDescriptor {
    /// Creates a descriptor at offset `0` with an array dimension of `1`.
    pub fn new(name: impl Into<Cow<'static, str>>, ty: PropertyType) -> Self {
        Self {
            name: name.into(),
            offset: 0,
            array_dim: 1,
            flags: PropertyFlags::empty(),
            ty,
        }
    }

    #[inline]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the fixed array dimension.
    ///
    /// # Panics
    ///
    /// Panics if `array_dim` is zero.
    #[track_caller]
    pub fn with_array_dim(mut self, array_dim: usize) -> Self {
        assert!(array_dim > 0, "property `{}` has a zero array dimension", self.name);
        self.array_dim = array_dim;
        self
    }

    #[inline]
    pub fn with_flags(mut self, flags: PropertyFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub(crate) fn name_cow(&self) -> &Cow<'static, str> {
        &self.name
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn array_dim(&self) -> usize {
        self.array_dim
    }

    #[inline]
    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    #[inline]
    pub fn has_flags(&self, flags: PropertyFlags) -> bool {
        self.flags.contains(flags)
    }

    #[inline]
    pub fn ty(&self) -> &PropertyType {
        &self.ty
    }

    #[inline]
    pub fn kind(&self) -> PropertyKind {
        self.ty.kind()
    }

    /// Size in bytes of one element.
    #[inline]
    pub fn element_size(&self) -> usize {
        self.ty.layout().size()
    }

    #[inline]
    pub fn element_align(&self) -> usize {
        self.ty.layout().align()
    }

    /// Size in bytes of all `array_dim` elements.
    #[inline]
    pub fn total_size(&self) -> usize {
        self.element_size() * self.array_dim
    }

    /// The filter applied before a field is handed to a codec.
    #[inline]
    pub fn should_serialize(&self) -> bool {
        !self.flags.intersects(PropertyFlags::SKIPPED)
    }

    /// The struct of a `Struct` property.
    pub fn struct_descriptor(&self) -> Option<&Arc<StructDescriptor>> {
        match &self.ty {
            PropertyType::Struct(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    /// The enum of an `Enum` or enum-backed `Byte` property.
    #[inline]
    pub fn enum_descriptor(&self) -> Option<&Arc<EnumDescriptor>> {
        self.ty.enum_descriptor()
    }

    /// Pointer to element `index` of this property inside `container`.
    ///
    /// # Safety
    ///
    /// `container` must point to an instance of the struct owning this property.
    ///
    /// # Panics
    ///
    /// Panics if `index >= array_dim`.
    #[track_caller]
    pub unsafe fn value_ptr<'a>(&self, container: Ptr<'a>, index: usize) -> Ptr<'a> {
        self.check_index(index);
        // SAFETY: the field lies inside the owning instance, guaranteed by the caller
        // and by the struct layout checks.
        unsafe { container.byte_add(self.offset + index * self.element_size()) }
    }

    /// Mutable pointer to element `index` of this property inside `container`.
    ///
    /// # Safety
    ///
    /// Same as [`value_ptr`](Self::value_ptr).
    #[track_caller]
    pub unsafe fn value_ptr_mut<'a>(&self, container: PtrMut<'a>, index: usize) -> PtrMut<'a> {
        self.check_index(index);
        // SAFETY: see `value_ptr`.
        unsafe { container.byte_add(self.offset + index * self.element_size()) }
    }

    /// Offset of element `index` relative to the start of the first element.
    #[inline]
    pub(crate) fn element_offset(&self, index: usize) -> usize {
        index * self.element_size()
    }

    #[track_caller]
    fn check_index(&self, index: usize) {
        assert!(
            index < self.array_dim,
            "index {index} out of bounds for property `{}` with array dimension {}",
            self.name,
            self.array_dim,
        );
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use super::{BoolLayout, PropertyDescriptor, PropertyType};
    use crate::info::{EnumDescriptor, PropertyFlags, PropertyKind};

    #[test]
    fn enum_storage() {
        let e = Arc::new(EnumDescriptor::from_names("ETeam", ["Red", "Blue"]));
        let ty = PropertyType::enumeration(e.clone(), PropertyType::Int16);
        assert_eq!(ty.kind(), PropertyKind::Enum);
        assert_eq!(ty.storage().kind(), PropertyKind::Int16);
        assert_eq!(ty.layout().size(), 2);

        let byte = PropertyType::byte_enum(e);
        assert_eq!(byte.kind(), PropertyKind::Byte);
        assert!(byte.enum_descriptor().is_some());
    }

    #[test]
    #[should_panic(expected = "cannot be stored as `Float`")]
    fn enum_needs_integer_storage() {
        let e = Arc::new(EnumDescriptor::from_names("ETeam", ["Red"]));
        let _ = PropertyType::enumeration(e, PropertyType::Float);
    }

    #[test]
    fn bool_layouts() {
        assert_eq!(PropertyType::Bool(BoolLayout::Native(4)).layout().size(), 4);
        assert_eq!(
            PropertyType::Bool(BoolLayout::Bitfield { mask: 0x04 }).layout().size(),
            1
        );
    }

    #[test]
    fn skipped_flags() {
        let p = PropertyDescriptor::new("Cache", PropertyType::Int32)
            .with_flags(PropertyFlags::TRANSIENT | PropertyFlags::EDITABLE);
        assert!(!p.should_serialize());
        assert!(p.has_flags(PropertyFlags::EDITABLE));
        assert!(PropertyType::array(PropertyType::Int32).needs_destroy());
        assert!(!PropertyType::Int32.needs_destroy());
    }
}
