use core::fmt;

/// The field-less tag of a [`PropertyType`](crate::info::PropertyType).
///
/// Diagnostics name properties by their kind, so this is `Display`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Bool,
    Byte,
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
    Enum,
    Object,
    WeakObject,
    SoftObject,
    Interface,
    Struct,
    Array,
    Set,
    Map,
}

impl PropertyKind {
    /// Returns the kind name as written in diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Byte => "Byte",
            Self::Int8 => "Int8",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::Name => "Name",
            Self::String => "String",
            Self::Text => "Text",
            Self::Enum => "Enum",
            Self::Object => "Object",
            Self::WeakObject => "WeakObject",
            Self::SoftObject => "SoftObject",
            Self::Interface => "Interface",
            Self::Struct => "Struct",
            Self::Array => "Array",
            Self::Set => "Set",
            Self::Map => "Map",
        }
    }

    /// Returns `true` for the fixed-width integer kinds, `Byte` included.
    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Byte
                | Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
        )
    }

    /// Returns `true` for `Array`, `Set` and `Map`.
    #[inline]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Array | Self::Set | Self::Map)
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
