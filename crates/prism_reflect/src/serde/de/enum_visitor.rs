use prism_ptr::PtrMut;
use serde_core::Deserializer;

use super::element_seed::{deserialize_compact_integer, store_integer};
use super::error_utils::make_custom_error;
use super::scalar_visitors::StringVisitor;

use crate::info::{EnumDescriptor, PropertyType};
use crate::serde::DecodeContext;

/// Decodes an enum or enum-backed byte.
///
/// Enums are read by name and resolved under the context's
/// [`EnumPolicy`](crate::serde::EnumPolicy). Compact data written before
/// names were stored holds the underlying integer instead; that path is taken
/// only with [`DecodeOptions::legacy_enum_values`](crate::serde::DecodeOptions).
pub(super) fn deserialize_enum<'de, D: Deserializer<'de>>(
    descriptor: &EnumDescriptor,
    ty: &PropertyType,
    ptr: PtrMut<'_>,
    ctx: &mut DecodeContext,
    deserializer: D,
) -> Result<(), D::Error> {
    let value = if ctx.options().legacy_enum_values && !deserializer.is_human_readable() {
        let raw = deserialize_compact_integer(ty, deserializer)?;
        ctx.resolve_enum_value(descriptor, raw)
            .map_err(make_custom_error::<D::Error>)?
    } else {
        let name = deserializer.deserialize_str(StringVisitor)?;
        ctx.resolve_enum(descriptor, &name)
            .map_err(make_custom_error::<D::Error>)?
    };

    // SAFETY: the caller passes storage of `ty`.
    unsafe { store_integer(ty, ptr, value as i128) }
}
