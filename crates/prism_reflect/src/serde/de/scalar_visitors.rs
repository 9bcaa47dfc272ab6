use core::fmt;

use serde_core::de::{Error, Unexpected, Visitor};

/// Logical booleans. Integers are accepted as `0`/non-zero.
pub(super) struct BoolVisitor;

impl<'de> Visitor<'de> for BoolVisitor {
    type Value = bool;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a boolean")
    }

    #[inline]
    fn visit_bool<E: Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(v)
    }

    #[inline]
    fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(v != 0)
    }

    #[inline]
    fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(v != 0)
    }
}

/// Integers of any width, widened to `i128` for the range check.
///
/// Strings holding integer text are accepted so 64-bit values survive
/// formats that only have doubles. Floats are accepted when integral.
pub(super) struct IntegerVisitor;

impl<'de> Visitor<'de> for IntegerVisitor {
    type Value = i128;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an integer or integer text")
    }

    #[inline]
    fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(v as i128)
    }

    #[inline]
    fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(v as i128)
    }

    #[inline]
    fn visit_i128<E: Error>(self, v: i128) -> Result<Self::Value, E> {
        Ok(v)
    }

    fn visit_u128<E: Error>(self, v: u128) -> Result<Self::Value, E> {
        i128::try_from(v).map_err(|_| E::invalid_value(Unexpected::Other("u128"), &self))
    }

    fn visit_f64<E: Error>(self, v: f64) -> Result<Self::Value, E> {
        if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.2e18 {
            Ok(v as i128)
        } else {
            Err(E::invalid_type(Unexpected::Float(v), &self))
        }
    }

    fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
        v.trim()
            .parse::<i128>()
            .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
    }
}

/// Floating-point numbers. Integers and numeric text are accepted.
pub(super) struct FloatVisitor;

impl<'de> Visitor<'de> for FloatVisitor {
    type Value = f64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number")
    }

    #[inline]
    fn visit_f64<E: Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(v)
    }

    #[inline]
    fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(v as f64)
    }

    #[inline]
    fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(v as f64)
    }

    fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
        v.trim()
            .parse::<f64>()
            .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
    }
}

pub(super) struct StringVisitor;

impl<'de> Visitor<'de> for StringVisitor {
    type Value = String;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string")
    }

    #[inline]
    fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(v.to_owned())
    }

    #[inline]
    fn visit_string<E: Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(v)
    }
}

/// Object handles in human-readable formats, which are always `null`.
pub(super) struct NullVisitor;

impl<'de> Visitor<'de> for NullVisitor {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("null")
    }

    #[inline]
    fn visit_none<E: Error>(self) -> Result<Self::Value, E> {
        Ok(())
    }

    #[inline]
    fn visit_unit<E: Error>(self) -> Result<Self::Value, E> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_core::de::value::{Error, F64Deserializer, StrDeserializer};
    use serde_core::de::{Deserializer, IntoDeserializer};

    use super::{FloatVisitor, IntegerVisitor};

    #[test]
    fn integer_text_and_integral_floats() {
        let text: StrDeserializer<'_, Error> = " 100 ".into_deserializer();
        assert_eq!(text.deserialize_any(IntegerVisitor), Ok(100));

        let float: F64Deserializer<Error> = 7.0f64.into_deserializer();
        assert_eq!(float.deserialize_any(IntegerVisitor), Ok(7));

        let fraction: F64Deserializer<Error> = 7.5f64.into_deserializer();
        assert!(fraction.deserialize_any(IntegerVisitor).is_err());

        let bad: StrDeserializer<'_, Error> = "ten".into_deserializer();
        assert!(bad.deserialize_any(IntegerVisitor).is_err());
    }

    #[test]
    fn float_text() {
        let text: StrDeserializer<'_, Error> = "0.25".into_deserializer();
        assert_eq!(text.deserialize_any(FloatVisitor), Ok(0.25));
    }
}
