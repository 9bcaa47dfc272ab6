use byteorder::{ByteOrder, NativeEndian};
use serde_core::de::value::U32Deserializer;
use serde_core::de::{
    self, DeserializeSeed, Deserializer, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};

use super::BinaryError;

/// The counterpart of [`BinarySerializer`](super::BinarySerializer), reading
/// from a byte slice.
///
/// The input is not self-describing, so `deserialize_any` and
/// `deserialize_ignored_any` are unsupported. Reading past the end fails with
/// [`BinaryError::UnexpectedEof`].
pub struct BinaryDeserializer<'de> {
    input: &'de [u8],
    offset: usize,
}

impl<'de> BinaryDeserializer<'de> {
    #[inline]
    pub fn new(input: &'de [u8]) -> Self {
        Self { input, offset: 0 }
    }

    /// Bytes consumed so far.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.input.len() - self.offset
    }

    /// Fails if input is left over.
    pub fn end(&self) -> Result<(), BinaryError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(BinaryError::TrailingBytes(n)),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'de [u8], BinaryError> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(BinaryError::UnexpectedEof {
                offset: self.offset,
                needed: len - remaining,
            });
        }
        let bytes = &self.input[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    fn read_u8(&mut self) -> Result<u8, BinaryError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, BinaryError> {
        Ok(NativeEndian::read_u32(self.take(4)?))
    }

    fn read_len(&mut self) -> Result<usize, BinaryError> {
        Ok(self.read_u32()? as usize)
    }

    fn read_bytes(&mut self) -> Result<&'de [u8], BinaryError> {
        let len = self.read_len()?;
        self.take(len)
    }

    fn read_str(&mut self) -> Result<&'de str, BinaryError> {
        let offset = self.offset;
        let bytes = self.read_bytes()?;
        core::str::from_utf8(bytes).map_err(|_| BinaryError::InvalidUtf8(offset))
    }

    fn invalid_tag(&self, what: &'static str, tag: u32, size: usize) -> BinaryError {
        BinaryError::InvalidTag {
            what,
            tag,
            offset: self.offset - size,
        }
    }
}

macro_rules! deserialize_number {
    ($($method:ident => $visit:ident, $size:literal, $read:expr;)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BinaryError> {
            let bytes = self.take($size)?;
            visitor.$visit($read(bytes))
        }
    )*};
}

impl<'de> Deserializer<'de> for &mut BinaryDeserializer<'de> {
    type Error = BinaryError;

    #[inline]
    fn is_human_readable(&self) -> bool {
        false
    }

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, BinaryError> {
        Err(BinaryError::Unsupported("reading without a schema"))
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, BinaryError> {
        Err(BinaryError::Unsupported("skipping a value"))
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BinaryError> {
        match self.read_u8()? {
            0 => visitor.visit_bool(false),
            1 => visitor.visit_bool(true),
            tag => Err(self.invalid_tag("bool", tag as u32, 1)),
        }
    }

    deserialize_number! {
        deserialize_i8 => visit_i8, 1, |b: &[u8]| b[0] as i8;
        deserialize_u8 => visit_u8, 1, |b: &[u8]| b[0];
        deserialize_i16 => visit_i16, 2, NativeEndian::read_i16;
        deserialize_i32 => visit_i32, 4, NativeEndian::read_i32;
        deserialize_i64 => visit_i64, 8, NativeEndian::read_i64;
        deserialize_i128 => visit_i128, 16, NativeEndian::read_i128;
        deserialize_u16 => visit_u16, 2, NativeEndian::read_u16;
        deserialize_u32 => visit_u32, 4, NativeEndian::read_u32;
        deserialize_u64 => visit_u64, 8, NativeEndian::read_u64;
        deserialize_u128 => visit_u128, 16, NativeEndian::read_u128;
        deserialize_f32 => visit_f32, 4, NativeEndian::read_f32;
        deserialize_f64 => visit_f64, 8, NativeEndian::read_f64;
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BinaryError> {
        let code = self.read_u32()?;
        match char::from_u32(code) {
            Some(c) => visitor.visit_char(c),
            None => Err(self.invalid_tag("char", code, 4)),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BinaryError> {
        visitor.visit_borrowed_str(self.read_str()?)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BinaryError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BinaryError> {
        visitor.visit_borrowed_bytes(self.read_bytes()?)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BinaryError> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BinaryError> {
        match self.read_u8()? {
            0 => visitor.visit_none(),
            1 => visitor.visit_some(self),
            tag => Err(self.invalid_tag("option", tag as u32, 1)),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BinaryError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, BinaryError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, BinaryError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BinaryError> {
        let len = self.read_len()?;
        visitor.visit_seq(Counted { de: self, len })
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, BinaryError> {
        visitor.visit_seq(Counted { de: self, len })
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, BinaryError> {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BinaryError> {
        let len = self.read_len()?;
        visitor.visit_map(Counted { de: self, len })
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BinaryError> {
        self.deserialize_tuple(fields.len(), visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BinaryError> {
        visitor.visit_enum(self)
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BinaryError> {
        self.deserialize_str(visitor)
    }
}

/// Exactly `len` elements or entries.
struct Counted<'a, 'de> {
    de: &'a mut BinaryDeserializer<'de>,
    len: usize,
}

impl Counted<'_, '_> {
    /// A corrupt length must not drive a huge allocation, so the hint never
    /// exceeds the bytes left.
    fn hint(&self) -> Option<usize> {
        Some(self.len.min(self.de.remaining()))
    }
}

impl<'de> SeqAccess<'de> for Counted<'_, 'de> {
    type Error = BinaryError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, BinaryError> {
        if self.len == 0 {
            return Ok(None);
        }
        self.len -= 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        self.hint()
    }
}

impl<'de> MapAccess<'de> for Counted<'_, 'de> {
    type Error = BinaryError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, BinaryError> {
        if self.len == 0 {
            return Ok(None);
        }
        self.len -= 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, BinaryError> {
        seed.deserialize(&mut *self.de)
    }

    fn size_hint(&self) -> Option<usize> {
        self.hint()
    }
}

impl<'de> EnumAccess<'de> for &mut BinaryDeserializer<'de> {
    type Error = BinaryError;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self), BinaryError> {
        let index: U32Deserializer<BinaryError> = self.read_u32()?.into_deserializer();
        let value = seed.deserialize(index)?;
        Ok((value, self))
    }
}

impl<'de> VariantAccess<'de> for &mut BinaryDeserializer<'de> {
    type Error = BinaryError;

    fn unit_variant(self) -> Result<(), BinaryError> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, BinaryError> {
        seed.deserialize(self)
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, BinaryError> {
        de::Deserializer::deserialize_tuple(self, len, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BinaryError> {
        de::Deserializer::deserialize_tuple(self, fields.len(), visitor)
    }
}
