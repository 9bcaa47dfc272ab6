//! Compact binary archive of described structs.
//!
//! Used for duplication, network transfer and undo snapshots within one
//! process. Values are written in declaration order at their native width
//! and byte order:
//!
//! - `Name`s are three `u32` indices into this process's name table.
//! - Object handles are raw addresses.
//! - Enums are written by name, so entries can be renumbered without breaking
//!   archives. [`ArchiveVersion::LegacyEnumValues`] reads old archives that
//!   stored the underlying integer instead.
//! - Arrays, sets and maps carry a `u32` element count.
//!
//! Unknown enum names decode to the `_MAX` sentinel with a warning. Running
//! out of input is a hard error, and the partially decoded destination should
//! be discarded.

// -----------------------------------------------------------------------------
// Modules

mod de;
mod error;
mod ser;

// -----------------------------------------------------------------------------
// Exports

pub use de::BinaryDeserializer;
pub use error::BinaryError;
pub use ser::BinarySerializer;

// -----------------------------------------------------------------------------
// Options

use serde_core::Serialize;
use serde_core::de::DeserializeSeed;

use crate::Diagnostics;
use crate::ops::{StructMut, StructRef};
use crate::path;
use crate::serde::{DecodeContext, DecodeOptions, DeserializeDriver, SerializeDriver};

/// Layout revision of an archive. Only the latest one is ever written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ArchiveVersion {
    /// Enums were stored as their underlying integer.
    LegacyEnumValues,
    /// Enums are stored by name.
    #[default]
    EnumNames,
}

impl ArchiveVersion {
    pub const LATEST: Self = Self::EnumNames;
}

/// Options of [`from_binary_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BinaryOptions {
    /// Revision the archive was written with.
    pub version: ArchiveVersion,
}

// -----------------------------------------------------------------------------
// Entry points

/// Writes the serialized fields of `value`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use prism_reflect::codec::binary::{from_binary, to_binary};
/// use prism_reflect::info::{PropertyType, StructBuilder};
/// use prism_reflect::ops::StructInstance;
///
/// let player = Arc::new(
///     StructBuilder::new("Player")
///         .field("Health", PropertyType::Int32)
///         .field("Tags", PropertyType::array(PropertyType::String))
///         .build(),
/// );
///
/// let mut input = StructInstance::new(player.clone());
/// input.set("Health", 42i32).unwrap();
/// input.array_view_mut("Tags").unwrap().push(String::from("hero")).unwrap();
///
/// let bytes = to_binary(input.view()).unwrap();
///
/// let mut output = StructInstance::new(player);
/// let diagnostics = from_binary(&bytes, output.view_mut()).unwrap();
/// assert!(diagnostics.is_empty());
/// assert_eq!(output, input);
/// ```
pub fn to_binary(value: StructRef<'_>) -> Result<Vec<u8>, BinaryError> {
    path::reset();
    let mut serializer = BinarySerializer::new(Vec::new());
    SerializeDriver::new(value).serialize(&mut serializer)?;
    Ok(serializer.into_inner())
}

/// Reads an archive of the latest version into `value`.
pub fn from_binary(bytes: &[u8], value: StructMut<'_>) -> Result<Diagnostics, BinaryError> {
    from_binary_with(bytes, value, &BinaryOptions::default())
}

/// Reads an archive into `value`.
///
/// The whole input must be consumed.
pub fn from_binary_with(
    bytes: &[u8],
    value: StructMut<'_>,
    options: &BinaryOptions,
) -> Result<Diagnostics, BinaryError> {
    path::reset();
    let legacy = options.version == ArchiveVersion::LegacyEnumValues;
    let mut ctx = DecodeContext::new(DecodeOptions::lenient().with_legacy_enum_values(legacy));

    let mut deserializer = BinaryDeserializer::new(bytes);
    DeserializeDriver::new(value, &mut ctx).deserialize(&mut deserializer)?;
    deserializer.end()?;

    Ok(ctx.into_diagnostics())
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use super::{ArchiveVersion, BinaryError, BinaryOptions, from_binary, from_binary_with, to_binary};
    use crate::info::{EnumDescriptor, PropertyDescriptor, PropertyType, StructBuilder};
    use crate::info::{BoolLayout, StructDescriptor};
    use crate::ops::StructInstance;
    use crate::value::{InterfaceRef, Name, ObjectRef, SoftObjectPath, Text, WeakObjectRef};

    fn tag() -> Arc<EnumDescriptor> {
        Arc::new(EnumDescriptor::from_names("ETag", ["Idle", "Run", "Jump"]))
    }

    fn tagged() -> Arc<StructDescriptor> {
        Arc::new(
            StructBuilder::new("Tagged")
                .field("Health", PropertyType::Int32)
                .field("Tag", PropertyType::byte_enum(tag()))
                .build(),
        )
    }

    fn everything() -> Arc<StructDescriptor> {
        let slot = Arc::new(
            StructBuilder::new("Slot")
                .field("Item", PropertyType::Name)
                .field("Count", PropertyType::UInt16)
                .build(),
        );
        Arc::new(
            StructBuilder::new("Everything")
                .field("Flag", PropertyType::Bool(BoolLayout::Bitfield { mask: 0b100 }))
                .field("Small", PropertyType::Int8)
                .field("Large", PropertyType::UInt64)
                .field("Ratio", PropertyType::Double)
                .field("Id", PropertyType::Name)
                .field("Title", PropertyType::Text)
                .field("Asset", PropertyType::SoftObject)
                .field("Owner", PropertyType::Object)
                .field("Weak", PropertyType::WeakObject)
                .field("Api", PropertyType::Interface)
                .field(
                    "Tag",
                    PropertyType::enumeration(tag(), PropertyType::Int64),
                )
                .field("Slots", PropertyType::array(PropertyType::structure(slot)))
                .field("Ids", PropertyType::set(PropertyType::Int32))
                .field("Lookup", PropertyType::map(PropertyType::Name, PropertyType::String))
                .property(PropertyDescriptor::new("Grid", PropertyType::Float).with_array_dim(4))
                .build(),
        )
    }

    #[test]
    fn round_trip() {
        let mut input = StructInstance::new(everything());
        input.set_bool("Flag", true).unwrap();
        input.set("Small", -7i8).unwrap();
        input.set("Large", u64::MAX).unwrap();
        input.set("Ratio", 0.25f64).unwrap();
        input.set("Id", Name::new("Spawn_12")).unwrap();
        input.set("Title", Text::new("Hello")).unwrap();
        input.set("Asset", SoftObjectPath::new("/Game/Barrel.Barrel")).unwrap();
        input.set("Owner", ObjectRef::from_addr(0x1000)).unwrap();
        input.set("Weak", WeakObjectRef::new(3, 9)).unwrap();
        input
            .set("Api", InterfaceRef::new(ObjectRef::from_addr(0x1000), 0x2000))
            .unwrap();
        input.set_enum("Tag", "Jump").unwrap();
        input.set_at("Grid", 3, -1.5f32).unwrap();
        {
            let mut view = input.view_mut();
            let mut slots = view.array_view_mut("Slots").unwrap();
            slots.add_default_slot();
            slots.add_default_slot();
        }
        {
            let mut ids = input.set_view_mut("Ids").unwrap();
            ids.insert(10i32).unwrap();
            ids.insert(-4i32).unwrap();
        }
        input
            .map_view_mut("Lookup")
            .unwrap()
            .insert(Name::new("Key"), String::from("value"))
            .unwrap();

        let bytes = to_binary(input.view()).unwrap();
        let mut output = StructInstance::new(input.descriptor().clone());
        let diagnostics = from_binary(&bytes, output.view_mut()).unwrap();

        assert!(diagnostics.is_empty());
        assert_eq!(output, input);
        assert_eq!(output.array_view("Slots").unwrap().len(), 2);
    }

    #[test]
    fn sets_are_rehashed() {
        let descriptor = Arc::new(
            StructBuilder::new("Bag")
                .field("Ids", PropertyType::set(PropertyType::Int32))
                .build(),
        );
        let mut input = StructInstance::new(descriptor.clone());
        {
            let mut ids = input.set_view_mut("Ids").unwrap();
            for id in [3i32, 1, 2] {
                ids.insert(id).unwrap();
            }
        }

        let bytes = to_binary(input.view()).unwrap();
        let mut output = StructInstance::new(descriptor);
        from_binary(&bytes, output.view_mut()).unwrap();

        let ids = output.set_view("Ids").unwrap();
        assert_eq!(ids.len(), 3);
        for id in [1i32, 2, 3] {
            assert!(ids.contains(&id), "{id} is missing");
        }
        assert!(!ids.contains(&4i32));
    }

    #[test]
    fn truncated_input_fails() {
        let mut input = StructInstance::new(everything());
        input.set("Id", Name::new("Truncated")).unwrap();
        input.array_view_mut("Slots").unwrap().add_default_slot();
        let bytes = to_binary(input.view()).unwrap();

        for len in 0..bytes.len() {
            let mut output = StructInstance::new(everything());
            let result = from_binary(&bytes[..len], output.view_mut());
            assert!(
                matches!(result, Err(BinaryError::UnexpectedEof { .. })),
                "prefix of {len} bytes: {result:?}"
            );
        }

        let mut padded = bytes;
        padded.push(0);
        let mut output = StructInstance::new(everything());
        assert!(matches!(
            from_binary(&padded, output.view_mut()),
            Err(BinaryError::TrailingBytes(1))
        ));
    }

    #[test]
    fn corrupt_counts_fail_without_reserving() {
        let big = Arc::new(
            StructBuilder::new("Big")
                .property(PropertyDescriptor::new("Samples", PropertyType::Double).with_array_dim(4096))
                .build(),
        );
        let holder = Arc::new(
            StructBuilder::new("Holder")
                .field("Items", PropertyType::array(PropertyType::structure(big)))
                .build(),
        );

        // Each element is 32 KiB, the count claims four billion of them.
        let mut bytes = u32::MAX.to_ne_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; 65536]);

        let mut output = StructInstance::new(holder);
        assert!(matches!(
            from_binary(&bytes, output.view_mut()),
            Err(BinaryError::UnexpectedEof { .. })
        ));
    }

    fn archive(health: i32, tag: &[u8]) -> Vec<u8> {
        let mut bytes = health.to_ne_bytes().to_vec();
        bytes.extend_from_slice(tag);
        bytes
    }

    fn named(name: &str) -> Vec<u8> {
        let mut bytes = (name.len() as u32).to_ne_bytes().to_vec();
        bytes.extend_from_slice(name.as_bytes());
        bytes
    }

    #[test]
    fn unknown_enum_names_fall_back() {
        let mut output = StructInstance::new(tagged());

        let diagnostics = from_binary(&archive(5, &named("Jump")), output.view_mut()).unwrap();
        assert_eq!(output.get_enum("Tag"), Ok(Some("Jump")));
        assert!(diagnostics.is_empty());

        let diagnostics = from_binary(&archive(5, &named("Fly")), output.view_mut()).unwrap();
        assert_eq!(output.get_enum("Tag"), Ok(Some("ETag_MAX")));
        assert_eq!(diagnostics.warnings().count(), 1);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(output.get::<i32>("Health"), Ok(&5));
    }

    #[test]
    fn legacy_enum_values() {
        let legacy = BinaryOptions {
            version: ArchiveVersion::LegacyEnumValues,
        };
        let mut output = StructInstance::new(tagged());

        from_binary_with(&archive(1, &[1]), output.view_mut(), &legacy).unwrap();
        assert_eq!(output.get_enum("Tag"), Ok(Some("Run")));

        let diagnostics = from_binary_with(&archive(1, &[9]), output.view_mut(), &legacy).unwrap();
        assert_eq!(output.get_enum("Tag"), Ok(Some("ETag_MAX")));
        assert_eq!(diagnostics.len(), 1);

        // New archives are never read as integers.
        assert!(from_binary(&archive(1, &[1]), output.view_mut()).is_err());
    }
}
