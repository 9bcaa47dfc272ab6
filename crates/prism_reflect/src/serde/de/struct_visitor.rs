use core::fmt;

use prism_ptr::PtrMut;
use serde_core::de::{Error, IgnoredAny, MapAccess, SeqAccess, Unexpected, Visitor};
use serde_core::{Deserialize, Deserializer};

use super::driver::PropertyDeserializer;
use super::error_utils::make_custom_error;

use crate::info::StructDescriptor;
use crate::serde::DecodeContext;

// -----------------------------------------------------------------------------
// Ident parser

#[derive(Debug, Clone, Eq, PartialEq)]
struct Ident(String);

impl<'de> Deserialize<'de> for Ident {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdentVisitor;

        impl<'de> Visitor<'de> for IdentVisitor {
            type Value = Ident;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("field name")
            }

            #[inline]
            fn visit_str<E: Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(Ident(value.to_owned()))
            }

            #[inline]
            fn visit_string<E: Error>(self, value: String) -> Result<Self::Value, E> {
                Ok(Ident(value))
            }
        }

        deserializer.deserialize_str(IdentVisitor)
    }
}

// -----------------------------------------------------------------------------
// struct visitor

/// Decodes a struct in place.
///
/// Human-readable formats give a map by field name (or the text hook string),
/// compact formats a positional tuple of the serialized fields.
pub(super) fn deserialize_struct<'de, D: Deserializer<'de>>(
    descriptor: &StructDescriptor,
    ptr: PtrMut<'_>,
    ctx: &mut DecodeContext,
    deserializer: D,
) -> Result<(), D::Error> {
    let visitor = StructVisitor {
        descriptor,
        ptr,
        ctx,
    };
    if !deserializer.is_human_readable() {
        let len = descriptor.serialized_fields().count();
        deserializer.deserialize_tuple(len, visitor)
    } else if descriptor.text_hooks().is_some() {
        deserializer.deserialize_any(visitor)
    } else {
        deserializer.deserialize_map(visitor)
    }
}

/// A [`Visitor`] writing into one struct instance.
struct StructVisitor<'a> {
    descriptor: &'a StructDescriptor,
    ptr: PtrMut<'a>,
    ctx: &'a mut DecodeContext,
}

impl<'de> Visitor<'de> for StructVisitor<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "struct `{}`", self.descriptor.name())
    }

    fn visit_map<V: MapAccess<'de>>(mut self, mut map: V) -> Result<Self::Value, V::Error> {
        while let Some(Ident(key)) = map.next_key::<Ident>()? {
            match self.descriptor.field(&key).filter(|f| f.should_serialize()) {
                Some(property) => map.next_value_seed(PropertyDeserializer {
                    property,
                    container: self.ptr.reborrow(),
                    ctx: &mut *self.ctx,
                })?,
                None => {
                    log::debug!(
                        "skipping unknown field `{key}` of struct `{}`",
                        self.descriptor.name()
                    );
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(())
    }

    fn visit_seq<V: SeqAccess<'de>>(mut self, mut seq: V) -> Result<Self::Value, V::Error> {
        let len = self.descriptor.serialized_fields().count();
        for (index, property) in self.descriptor.serialized_fields().enumerate() {
            let seed = PropertyDeserializer {
                property,
                container: self.ptr.reborrow(),
                ctx: &mut *self.ctx,
            };
            if seq.next_element_seed(seed)?.is_none() {
                return Err(make_custom_error(format!(
                    "invalid length, expected: `{len}`, actual: `{index}`"
                )));
            }
        }
        Ok(())
    }

    fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
        let Some(hooks) = self.descriptor.text_hooks() else {
            return Err(E::invalid_type(Unexpected::Str(v), &self));
        };
        // SAFETY: `ptr` is an initialized instance of the struct owning the hooks.
        if unsafe { (hooks.import)(v, self.ptr) } {
            Ok(())
        } else {
            Err(make_custom_error(format!(
                "`{v}` is not a valid `{}`",
                self.descriptor.name()
            )))
        }
    }
}
