use core::fmt;

use prism_ptr::PtrMut;
use serde_core::Deserializer;
use serde_core::de::{DeserializeSeed, Error, IgnoredAny, MapAccess, Visitor};

use super::array_visitor::FixedArrayVisitor;
use super::element_seed::ElementSeed;
use super::error_utils::make_custom_error;
use super::struct_visitor::deserialize_struct;

use crate::info::PropertyDescriptor;
use crate::ops::{AccessError, StructInstance, StructMut};
use crate::path::{self, PathGuard};
use crate::registry::TypeLookup;
use crate::serde::DecodeContext;

// -----------------------------------------------------------------------------
// DeserializeDriver

/// Deserializer writing into an existing struct instance, excluding the
/// struct name.
///
/// The counterpart of [`SerializeDriver`]. The data carries no type
/// information, so the target is given as a [`StructMut`].
///
/// # Decoding rules
///
/// - Fields missing from a human-readable map keep their current value.
/// - Unknown keys and keys of skipped fields are ignored.
/// - Arrays, sets and maps are replaced, not merged.
/// - Enum names are resolved under the [`EnumPolicy`] of the context; with
///   the lenient policy unknown names become the sentinel value and a warning
///   is recorded in the context's diagnostics.
///
/// An error leaves the instance valid but partially decoded.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use serde_core::de::DeserializeSeed;
/// use prism_reflect::info::{EnumDescriptor, PropertyType, StructBuilder};
/// use prism_reflect::ops::StructInstance;
/// use prism_reflect::serde::{DecodeContext, DecodeOptions, DeserializeDriver};
///
/// let tag = Arc::new(EnumDescriptor::from_names("ETag", ["Idle", "Run", "Jump"]));
/// let player = Arc::new(
///     StructBuilder::new("Player")
///         .field("Health", PropertyType::Int32)
///         .field("Tag", PropertyType::byte_enum(tag))
///         .build(),
/// );
///
/// let input = r#"{ "Health": 100, "Tag": "Jump" }"#;
///
/// let mut output = StructInstance::new(player);
/// let mut ctx = DecodeContext::new(DecodeOptions::strict());
/// let mut data = ron::Deserializer::from_str(input).unwrap();
///
/// DeserializeDriver::new(output.view_mut(), &mut ctx)
///     .deserialize(&mut data)
///     .unwrap();
///
/// assert_eq!(output.get::<i32>("Health"), Ok(&100));
/// assert_eq!(output.get_enum("Tag"), Ok(Some("Jump")));
/// assert!(ctx.diagnostics().is_empty());
/// ```
///
/// [`SerializeDriver`]: crate::serde::SerializeDriver
/// [`EnumPolicy`]: crate::serde::EnumPolicy
pub struct DeserializeDriver<'a> {
    value: StructMut<'a>,
    ctx: &'a mut DecodeContext,
}

impl<'a> DeserializeDriver<'a> {
    #[inline]
    pub fn new(value: StructMut<'a>, ctx: &'a mut DecodeContext) -> Self {
        Self { value, ctx }
    }
}

impl<'de> DeserializeSeed<'de> for DeserializeDriver<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        let (descriptor, ptr) = self.value.into_raw();
        deserialize_struct(descriptor, ptr, self.ctx, deserializer)
    }
}

// -----------------------------------------------------------------------------
// TaggedDeserializeDriver

/// Deserializer for the output of
/// [`TaggedSerializeDriver`](crate::serde::TaggedSerializeDriver).
///
/// The input is a map with a single entry, keyed by the struct name:
///
/// ```json
/// { "Player": { "Health": 42 } }
/// ```
///
/// The descriptor is found through a [`TypeLookup`] and a new
/// [`StructInstance`] is decoded from the value.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use serde_core::de::DeserializeSeed;
/// use prism_reflect::info::{PropertyType, StructBuilder};
/// use prism_reflect::registry::TypeRegistry;
/// use prism_reflect::serde::{DecodeContext, DecodeOptions, TaggedDeserializeDriver};
///
/// let mut registry = TypeRegistry::new();
/// registry
///     .register_struct(Arc::new(
///         StructBuilder::new("Point").field("X", PropertyType::Int32).build(),
///     ))
///     .unwrap();
///
/// let mut ctx = DecodeContext::new(DecodeOptions::strict());
/// let mut data = ron::Deserializer::from_str(r#"{ "Point": { "X": 7 } }"#).unwrap();
///
/// let point = TaggedDeserializeDriver::new(&registry, &mut ctx)
///     .deserialize(&mut data)
///     .unwrap();
///
/// assert_eq!(point.descriptor().name(), "Point");
/// assert_eq!(point.get::<i32>("X"), Ok(&7));
/// ```
pub struct TaggedDeserializeDriver<'a, L: TypeLookup + ?Sized> {
    lookup: &'a L,
    ctx: &'a mut DecodeContext,
}

impl<'a, L: TypeLookup + ?Sized> TaggedDeserializeDriver<'a, L> {
    #[inline]
    pub fn new(lookup: &'a L, ctx: &'a mut DecodeContext) -> Self {
        Self { lookup, ctx }
    }
}

impl<'de, L: TypeLookup + ?Sized> DeserializeSeed<'de> for TaggedDeserializeDriver<'_, L> {
    type Value = StructInstance;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        struct TaggedVisitor<'a, L: ?Sized> {
            lookup: &'a L,
            ctx: &'a mut DecodeContext,
        }

        impl<'de, L: TypeLookup + ?Sized> Visitor<'de> for TaggedVisitor<'_, L> {
            type Value = StructInstance;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("map containing a single struct name and its value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let name = map
                    .next_key::<String>()?
                    .ok_or_else(|| Error::invalid_length(0, &"a single entry"))?;

                let Some(descriptor) = self.lookup.find_struct(&name) else {
                    return Err(make_custom_error(format!(
                        "no struct named `{name}` is registered"
                    )));
                };

                let mut instance = StructInstance::new(descriptor);
                map.next_value_seed(DeserializeDriver::new(instance.view_mut(), self.ctx))?;

                if map.next_key::<IgnoredAny>()?.is_some() {
                    return Err(Error::invalid_length(2, &"a single entry"));
                }

                Ok(instance)
            }
        }

        // Leftovers of an earlier conversion that unwound.
        path::reset();

        deserializer.deserialize_map(TaggedVisitor {
            lookup: self.lookup,
            ctx: self.ctx,
        })
    }
}

// -----------------------------------------------------------------------------
// PropertyDeserializer

/// Deserializer for one property of a struct, all of its fixed-array
/// elements included.
///
/// A property with `array_dim > 1` is read as a tuple. Fewer elements leave
/// the tail untouched; extra elements are skipped with one warning.
pub struct PropertyDeserializer<'a> {
    pub(super) property: &'a PropertyDescriptor,
    pub(super) container: PtrMut<'a>,
    pub(super) ctx: &'a mut DecodeContext,
}

impl<'a> PropertyDeserializer<'a> {
    /// # Safety
    ///
    /// `container` must point to an initialized instance owning `property`.
    #[inline]
    pub unsafe fn new(
        property: &'a PropertyDescriptor,
        container: PtrMut<'a>,
        ctx: &'a mut DecodeContext,
    ) -> Self {
        Self {
            property,
            container,
            ctx,
        }
    }

    /// Deserializer for the field `name` of `value`.
    pub fn from_field(
        value: StructMut<'a>,
        name: &str,
        ctx: &'a mut DecodeContext,
    ) -> Result<Self, AccessError> {
        let (descriptor, container) = value.into_raw();
        match descriptor.field(name) {
            Some(property) => Ok(Self {
                property,
                container,
                ctx,
            }),
            None => Err(AccessError::MissingField {
                structure: descriptor.name().into(),
                field: name.into(),
            }),
        }
    }
}

impl<'de> DeserializeSeed<'de> for PropertyDeserializer<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        let _guard = PathGuard::field(self.property);

        let dim = self.property.array_dim();
        if dim == 1 {
            ElementSeed {
                ty: self.property.ty(),
                // SAFETY: `container` owns `property`.
                ptr: unsafe { self.property.value_ptr_mut(self.container, 0) },
                ctx: self.ctx,
            }
            .deserialize(deserializer)
        } else {
            deserializer.deserialize_tuple(
                dim,
                FixedArrayVisitor {
                    property: self.property,
                    container: self.container,
                    ctx: self.ctx,
                },
            )
        }
    }
}
