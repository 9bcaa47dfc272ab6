use prism_ptr::Ptr;
use serde_core::ser::SerializeMap;
use serde_core::{Serialize, Serializer};

use super::array_serializer::FixedArraySerializer;
use super::element_serializer::ElementSerializer;
use super::struct_serializer::StructSerializer;

use crate::info::PropertyDescriptor;
use crate::ops::{AccessError, StructRef};
use crate::path::{self, PathGuard};

// -----------------------------------------------------------------------------
// SerializeDriver

/// Serializer for described structs, excluding the struct name.
///
/// Every property is dispatched on its [`PropertyType`](crate::info::PropertyType)
/// with a single exhaustive match. Fields for which
/// [`should_serialize`](PropertyDescriptor::should_serialize) is `false` are
/// left out.
///
/// # Format shapes
///
/// | Kind | Human-readable (JSON, RON) | Compact (binary archive) |
/// |---|---|---|
/// | Struct | map by field name, or the text hook string | positional tuple |
/// | Enum | name | name |
/// | Name | text | `(comparison, display, number)` |
/// | Infinite or NaN float | `"inf"`, `"-inf"`, `"NaN"` | number |
/// | Object, WeakObject | `null` | raw handle |
/// | Interface | error | raw handle |
/// | Array, Set | sequence | sequence |
/// | Map | map with text keys | map |
/// | Fixed array | tuple | tuple |
///
/// The data carries no type name, so the matching
/// [`DeserializeDriver`](crate::serde::DeserializeDriver) needs the
/// descriptor. [`TaggedSerializeDriver`] keeps the outermost name.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use prism_reflect::info::{EnumDescriptor, PropertyType, StructBuilder};
/// use prism_reflect::ops::StructInstance;
/// use prism_reflect::serde::SerializeDriver;
///
/// let tag = Arc::new(EnumDescriptor::from_names("ETag", ["Idle", "Run"]));
/// let player = Arc::new(
///     StructBuilder::new("Player")
///         .field("Health", PropertyType::Int32)
///         .field("Tag", PropertyType::byte_enum(tag))
///         .build(),
/// );
///
/// let mut input = StructInstance::new(player);
/// input.set("Health", 42i32).unwrap();
/// input.set_enum("Tag", "Run").unwrap();
///
/// let output = ron::to_string(&SerializeDriver::new(input.view())).unwrap();
///
/// assert_eq!(output, r#"{"Health":42,"Tag":"Run"}"#);
/// ```
#[derive(Clone, Copy)]
pub struct SerializeDriver<'a> {
    value: StructRef<'a>,
}

impl<'a> SerializeDriver<'a> {
    #[inline]
    pub const fn new(value: StructRef<'a>) -> Self {
        Self { value }
    }
}

impl Serialize for SerializeDriver<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        StructSerializer {
            descriptor: self.value.descriptor(),
            ptr: self.value.as_ptr(),
        }
        .serialize(serializer)
    }
}

// -----------------------------------------------------------------------------
// TaggedSerializeDriver

/// Serializer for described structs, wrapped in a single-entry map keyed by
/// the struct name.
///
/// Example (JSON representation):
///
/// ```json
/// { "Player": { "Health": 42 } }
/// ```
///
/// Only the outermost struct is named; [`SerializeDriver`] is used inside.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use prism_reflect::info::{PropertyType, StructBuilder};
/// use prism_reflect::ops::StructInstance;
/// use prism_reflect::serde::TaggedSerializeDriver;
///
/// let point = Arc::new(StructBuilder::new("Point").field("X", PropertyType::Int32).build());
/// let input = StructInstance::new(point);
///
/// let output = ron::to_string(&TaggedSerializeDriver::new(input.view())).unwrap();
///
/// assert_eq!(output, r#"{"Point":{"X":0}}"#);
/// ```
#[derive(Clone, Copy)]
pub struct TaggedSerializeDriver<'a> {
    value: StructRef<'a>,
}

impl<'a> TaggedSerializeDriver<'a> {
    #[inline]
    pub const fn new(value: StructRef<'a>) -> Self {
        Self { value }
    }
}

impl Serialize for TaggedSerializeDriver<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Leftovers of an earlier conversion that unwound.
        path::reset();

        let mut state = serializer.serialize_map(Some(1))?;
        state.serialize_entry(
            self.value.descriptor().name(),
            &SerializeDriver::new(self.value),
        )?;
        state.end()
    }
}

// -----------------------------------------------------------------------------
// PropertySerializer

/// Serializer for one property of a struct, all of its fixed-array elements
/// included.
///
/// A property with `array_dim > 1` is written as a tuple of its elements.
#[derive(Clone, Copy)]
pub struct PropertySerializer<'a> {
    property: &'a PropertyDescriptor,
    container: Ptr<'a>,
}

impl<'a> PropertySerializer<'a> {
    /// # Safety
    ///
    /// `container` must point to an initialized instance owning `property`.
    #[inline]
    pub const unsafe fn new(property: &'a PropertyDescriptor, container: Ptr<'a>) -> Self {
        Self {
            property,
            container,
        }
    }

    /// Serializer for the field `name` of `value`.
    pub fn from_field(value: StructRef<'a>, name: &str) -> Result<Self, AccessError> {
        let descriptor = value.descriptor();
        match descriptor.field(name) {
            Some(property) => Ok(Self {
                property,
                container: value.as_ptr(),
            }),
            None => Err(AccessError::MissingField {
                structure: descriptor.name().into(),
                field: name.into(),
            }),
        }
    }
}

impl Serialize for PropertySerializer<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let _guard = PathGuard::field(self.property);

        if self.property.array_dim() == 1 {
            ElementSerializer {
                ty: self.property.ty(),
                // SAFETY: `container` is the owning instance.
                ptr: unsafe { self.property.value_ptr(self.container, 0) },
            }
            .serialize(serializer)
        } else {
            FixedArraySerializer {
                property: self.property,
                container: self.container,
            }
            .serialize(serializer)
        }
    }
}
