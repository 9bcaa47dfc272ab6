use std::io::Write;

use byteorder::{NativeEndian, WriteBytesExt};
use serde_core::Serialize;
use serde_core::ser::{self, Serializer};

use super::BinaryError;

/// A compact [`Serializer`] writing fixed-width native-endian values.
///
/// - Integers, floats and `bool` (one byte) are written at their width.
/// - Strings, byte strings, sequences and maps get a `u32` length prefix.
/// - Tuples and structs are written field after field, unprefixed.
/// - Options get a one-byte tag, enum variants a `u32` index.
///
/// No endianness conversion happens; archives are meant to be read back by
/// the same kind of machine.
pub struct BinarySerializer<W> {
    writer: W,
}

impl<W: Write> BinarySerializer<W> {
    #[inline]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    #[inline]
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_len(&mut self, len: usize) -> Result<(), BinaryError> {
        let len32 = u32::try_from(len).map_err(|_| BinaryError::LengthOverflow(len))?;
        self.writer.write_u32::<NativeEndian>(len32)?;
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), BinaryError> {
        self.write_len(bytes.len())?;
        self.writer.write_all(bytes)?;
        Ok(())
    }
}

impl<'a, W: Write> Serializer for &'a mut BinarySerializer<W> {
    type Ok = ();
    type Error = BinaryError;

    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    #[inline]
    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, v: bool) -> Result<(), BinaryError> {
        Ok(self.writer.write_u8(u8::from(v))?)
    }

    fn serialize_i8(self, v: i8) -> Result<(), BinaryError> {
        Ok(self.writer.write_i8(v)?)
    }

    fn serialize_i16(self, v: i16) -> Result<(), BinaryError> {
        Ok(self.writer.write_i16::<NativeEndian>(v)?)
    }

    fn serialize_i32(self, v: i32) -> Result<(), BinaryError> {
        Ok(self.writer.write_i32::<NativeEndian>(v)?)
    }

    fn serialize_i64(self, v: i64) -> Result<(), BinaryError> {
        Ok(self.writer.write_i64::<NativeEndian>(v)?)
    }

    fn serialize_i128(self, v: i128) -> Result<(), BinaryError> {
        Ok(self.writer.write_i128::<NativeEndian>(v)?)
    }

    fn serialize_u8(self, v: u8) -> Result<(), BinaryError> {
        Ok(self.writer.write_u8(v)?)
    }

    fn serialize_u16(self, v: u16) -> Result<(), BinaryError> {
        Ok(self.writer.write_u16::<NativeEndian>(v)?)
    }

    fn serialize_u32(self, v: u32) -> Result<(), BinaryError> {
        Ok(self.writer.write_u32::<NativeEndian>(v)?)
    }

    fn serialize_u64(self, v: u64) -> Result<(), BinaryError> {
        Ok(self.writer.write_u64::<NativeEndian>(v)?)
    }

    fn serialize_u128(self, v: u128) -> Result<(), BinaryError> {
        Ok(self.writer.write_u128::<NativeEndian>(v)?)
    }

    fn serialize_f32(self, v: f32) -> Result<(), BinaryError> {
        Ok(self.writer.write_f32::<NativeEndian>(v)?)
    }

    fn serialize_f64(self, v: f64) -> Result<(), BinaryError> {
        Ok(self.writer.write_f64::<NativeEndian>(v)?)
    }

    fn serialize_char(self, v: char) -> Result<(), BinaryError> {
        Ok(self.writer.write_u32::<NativeEndian>(v as u32)?)
    }

    fn serialize_str(self, v: &str) -> Result<(), BinaryError> {
        self.write_bytes(v.as_bytes())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<(), BinaryError> {
        self.write_bytes(v)
    }

    fn serialize_none(self) -> Result<(), BinaryError> {
        Ok(self.writer.write_u8(0)?)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<(), BinaryError> {
        self.writer.write_u8(1)?;
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), BinaryError> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), BinaryError> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
    ) -> Result<(), BinaryError> {
        self.serialize_u32(variant_index)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), BinaryError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<(), BinaryError> {
        self.writer.write_u32::<NativeEndian>(variant_index)?;
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self, BinaryError> {
        self.write_len(len.ok_or(BinaryError::LengthRequired)?)?;
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self, BinaryError> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self, BinaryError> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, BinaryError> {
        self.writer.write_u32::<NativeEndian>(variant_index)?;
        Ok(self)
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self, BinaryError> {
        self.write_len(len.ok_or(BinaryError::LengthRequired)?)?;
        Ok(self)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self, BinaryError> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, BinaryError> {
        self.writer.write_u32::<NativeEndian>(variant_index)?;
        Ok(self)
    }
}

macro_rules! impl_sequence {
    ($($trait:ident :: $method:ident),* $(,)?) => {$(
        impl<W: Write> ser::$trait for &mut BinarySerializer<W> {
            type Ok = ();
            type Error = BinaryError;

            fn $method<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BinaryError> {
                value.serialize(&mut **self)
            }

            fn end(self) -> Result<(), BinaryError> {
                Ok(())
            }
        }
    )*};
}

impl_sequence!(
    SerializeSeq::serialize_element,
    SerializeTuple::serialize_element,
    SerializeTupleStruct::serialize_field,
    SerializeTupleVariant::serialize_field,
);

impl<W: Write> ser::SerializeMap for &mut BinarySerializer<W> {
    type Ok = ();
    type Error = BinaryError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), BinaryError> {
        key.serialize(&mut **self)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BinaryError> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), BinaryError> {
        Ok(())
    }
}

impl<W: Write> ser::SerializeStruct for &mut BinarySerializer<W> {
    type Ok = ();
    type Error = BinaryError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), BinaryError> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), BinaryError> {
        Ok(())
    }
}

impl<W: Write> ser::SerializeStructVariant for &mut BinarySerializer<W> {
    type Ok = ();
    type Error = BinaryError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), BinaryError> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), BinaryError> {
        Ok(())
    }
}
