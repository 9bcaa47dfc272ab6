use core::fmt;

use prism_ptr::PtrMut;
use serde_core::Deserializer;
use serde_core::de::{DeserializeSeed, Error, MapAccess, Visitor};

use super::element_seed::{ElementSeed, store_integer};
use super::error_utils::make_custom_error;
use super::scalar_visitors::StringVisitor;

use crate::codec::text::import_element;
use crate::container::MapViewMut;
use crate::info::PropertyType;
use crate::path::PathGuard;
use crate::serde::DecodeContext;
use crate::value::{Name, SoftObjectPath, Text};

/// A [`Visitor`] replacing the contents of a map.
///
/// Pairs go into fresh default slots and the map is rehashed once at the end,
/// on the error path too. A later duplicate key replaces the earlier pair.
pub(super) struct MapVisitor<'a> {
    pub map: MapViewMut<'a>,
    pub ctx: &'a mut DecodeContext,
}

impl<'de> Visitor<'de> for MapVisitor<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("map property")
    }

    fn visit_map<V: MapAccess<'de>>(mut self, mut map: V) -> Result<Self::Value, V::Error> {
        self.map.empty();
        let result = self.fill(&mut map);
        self.map.rehash();
        result
    }
}

impl MapVisitor<'_> {
    fn fill<'de, V: MapAccess<'de>>(&mut self, map: &mut V) -> Result<(), V::Error> {
        let key = self.map.key();
        let value = self.map.value();
        let mut index = 0;
        loop {
            let slot = self.map.add_default_slot();
            let _guard = PathGuard::index(index);

            let key_seed = KeySeed {
                ty: key.ty(),
                ptr: self.map.key_ptr_mut(slot),
                ctx: &mut *self.ctx,
            };
            match map.next_key_seed(key_seed) {
                Ok(Some(())) => {}
                Ok(None) => {
                    self.map.remove_slot(slot);
                    return Ok(());
                }
                Err(err) => {
                    self.map.remove_slot(slot);
                    return Err(err);
                }
            }

            let value_seed = ElementSeed {
                ty: value.ty(),
                ptr: self.map.value_ptr_mut(slot),
                ctx: &mut *self.ctx,
            };
            if let Err(err) = map.next_value_seed(value_seed) {
                self.map.remove_slot(slot);
                return Err(err);
            }
            index += 1;
        }
    }
}

/// Map keys. Human-readable formats only have text keys, which are coerced
/// back to the key type the way the text codec reads them.
struct KeySeed<'a> {
    ty: &'a PropertyType,
    ptr: PtrMut<'a>,
    ctx: &'a mut DecodeContext,
}

impl<'de> DeserializeSeed<'de> for KeySeed<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        let Self { ty, ptr, ctx } = self;
        if !deserializer.is_human_readable() {
            return ElementSeed { ty, ptr, ctx }.deserialize(deserializer);
        }

        let text = deserializer.deserialize_str(StringVisitor)?;

        // SAFETY (all arms): `ptr` holds an initialized key of `ty`.
        match ty {
            PropertyType::String => unsafe { *ptr.consume::<String>() = text },
            PropertyType::Name => unsafe { ptr.write(Name::new(&text)) },
            PropertyType::Text => unsafe { *ptr.consume::<Text>() = Text::new(text) },
            PropertyType::SoftObject => unsafe {
                *ptr.consume::<SoftObjectPath>() = SoftObjectPath::new(text)
            },
            PropertyType::Byte(Some(descriptor)) | PropertyType::Enum { descriptor, .. } => {
                let value = ctx
                    .resolve_enum(descriptor, &text)
                    .map_err(make_custom_error::<D::Error>)?;
                unsafe { store_integer::<D::Error>(ty, ptr, value as i128)? }
            }
            _ => {
                let imported = unsafe { import_element(ty, ptr, &text, ctx.diagnostics_mut()) };
                imported.map_err(D::Error::custom)?;
            }
        }
        Ok(())
    }
}
