//! Serialization and deserialization of described structs with any serde
//! format.
//!
//! The drivers walk the property list of a [`StructDescriptor`] and convert
//! each value straight from or into instance memory. No per-type serializer
//! is needed, and the same drivers back the binary archive and JSON codecs in
//! [`codec`](crate::codec).
//!
//! # Overview
//!
//! ## Serialization
//!
//! - [`SerializeDriver`]: serializes a [`StructRef`] without its name.
//! - [`TaggedSerializeDriver`]: wraps the value in a single-entry map keyed by
//!   the struct name.
//! - [`PropertySerializer`]: serializes a single property.
//!
//! ## Deserialization
//!
//! - [`DeserializeDriver`]: decodes into an existing [`StructMut`] in place.
//! - [`TaggedDeserializeDriver`]: reads the struct name, finds the descriptor
//!   through a [`TypeLookup`] and returns a new [`StructInstance`].
//! - [`PropertyDeserializer`]: decodes a single property.
//!
//! Deserialization takes a [`DecodeContext`], which carries the
//! [`DecodeOptions`] and collects [`Diagnostics`] for recoverable problems.
//!
//! ## Formats
//!
//! The shape of the data depends on [`is_human_readable`]. Human-readable
//! formats get structs as maps and `Name`s as text; compact formats get
//! structs as positional tuples and `Name`s as index triples. Enums are
//! written by name everywhere.
//!
//! ## Errors
//!
//! Errors raised by the drivers name the property path they occurred at, such
//! as `Inventory.Slots[2].Count`. With the `debug` feature and debug
//! assertions, each segment is followed by its property kind.
//!
//! [`StructDescriptor`]: crate::info::StructDescriptor
//! [`StructRef`]: crate::ops::StructRef
//! [`StructMut`]: crate::ops::StructMut
//! [`StructInstance`]: crate::ops::StructInstance
//! [`TypeLookup`]: crate::registry::TypeLookup
//! [`Diagnostics`]: crate::Diagnostics
//! [`is_human_readable`]: serde_core::Serializer::is_human_readable

// -----------------------------------------------------------------------------
// Modules

mod de;
mod options;
mod ser;

// -----------------------------------------------------------------------------
// Exports

pub use de::{DeserializeDriver, PropertyDeserializer, TaggedDeserializeDriver};
pub use options::{DecodeContext, DecodeOptions, EnumPolicy};
pub use ser::{PropertySerializer, SerializeDriver, TaggedSerializeDriver};

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use serde_core::de::DeserializeSeed;

    use super::{
        DecodeContext, DecodeOptions, DeserializeDriver, SerializeDriver, TaggedDeserializeDriver,
        TaggedSerializeDriver,
    };
    use crate::info::{EnumDescriptor, PropertyDescriptor, PropertyType, StructBuilder};
    use crate::info::{PropertyFlags, StructDescriptor};
    use crate::ops::StructInstance;
    use crate::value::Name;

    fn inner() -> Arc<StructDescriptor> {
        Arc::new(
            StructBuilder::new("Inner")
                .field("Count", PropertyType::Byte(None))
                .field("Label", PropertyType::String)
                .build(),
        )
    }

    fn outer() -> Arc<StructDescriptor> {
        let tag = Arc::new(EnumDescriptor::from_names("ETag", ["Idle", "Run", "Jump"]));
        Arc::new(
            StructBuilder::new("Outer")
                .field("Health", PropertyType::Int32)
                .field("Speed", PropertyType::Float)
                .field("Id", PropertyType::Name)
                .field("Tag", PropertyType::byte_enum(tag))
                .field("Inner", PropertyType::structure(inner()))
                .field("Items", PropertyType::array(PropertyType::Int64))
                .field("Ids", PropertyType::set(PropertyType::Int32))
                .field("Lookup", PropertyType::map(PropertyType::String, PropertyType::Int32))
                .property(PropertyDescriptor::new("Scores", PropertyType::UInt16).with_array_dim(3))
                .property(
                    PropertyDescriptor::new("Cache", PropertyType::Int32)
                        .with_flags(PropertyFlags::TRANSIENT),
                )
                .build(),
        )
    }

    fn sample() -> StructInstance {
        let mut value = StructInstance::new(outer());
        value.set("Health", 42i32).unwrap();
        value.set("Speed", 1.5f32).unwrap();
        value.set("Id", Name::new("Hero_2")).unwrap();
        value.set_enum("Tag", "Run").unwrap();
        value.set_at("Scores", 1, 7u16).unwrap();
        value.set("Cache", 99i32).unwrap();
        {
            let mut items = value.array_view_mut("Items").unwrap();
            items.push(-5i64).unwrap();
            items.push(1i64 << 40).unwrap();
        }
        {
            let mut ids = value.set_view_mut("Ids").unwrap();
            ids.insert(3i32).unwrap();
            ids.insert(1i32).unwrap();
        }
        value
            .map_view_mut("Lookup")
            .unwrap()
            .insert(String::from("a"), 1i32)
            .unwrap();
        {
            let mut view = value.view_mut();
            let mut inner = view.structure_mut("Inner").unwrap();
            inner.set("Count", 200u8).unwrap();
            inner.set("Label", String::from("say \"hi\"")).unwrap();
        }
        value
    }

    fn decode(text: &str, output: &mut StructInstance, ctx: &mut DecodeContext) -> Result<(), String> {
        let mut data = ron::Deserializer::from_str(text).map_err(|e| e.to_string())?;
        DeserializeDriver::new(output.view_mut(), ctx)
            .deserialize(&mut data)
            .map_err(|e| e.to_string())
    }

    #[test]
    fn ron_round_trip() {
        let input = sample();
        let text = ron::to_string(&SerializeDriver::new(input.view())).unwrap();
        assert!(!text.contains("Cache"));

        let mut output = StructInstance::new(input.descriptor().clone());
        let mut ctx = DecodeContext::new(DecodeOptions::strict());
        decode(&text, &mut output, &mut ctx).unwrap();

        // `Cache` is transient and was not written.
        assert_eq!(output.get::<i32>("Cache"), Ok(&0));
        output.set("Cache", 99i32).unwrap();
        assert_eq!(output, input);
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn fixed_arrays_tolerate_length_mismatch() {
        let mut output = StructInstance::new(outer());
        let mut ctx = DecodeContext::default();

        decode(r#"{"Scores":(1,2)}"#, &mut output, &mut ctx).unwrap();
        assert_eq!(output.get_at::<u16>("Scores", 1), Ok(&2));
        assert_eq!(output.get_at::<u16>("Scores", 2), Ok(&0));
        assert!(ctx.diagnostics().is_empty());

        decode(r#"{"Scores":(4,5,6,7,8)}"#, &mut output, &mut ctx).unwrap();
        assert_eq!(output.get_at::<u16>("Scores", 2), Ok(&6));
        assert_eq!(ctx.diagnostics().len(), 1);
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let mut output = StructInstance::new(outer());
        let mut ctx = DecodeContext::default();
        decode(r#"{"Mana":[1,2],"health":5}"#, &mut output, &mut ctx).unwrap();
        assert_eq!(output.get::<i32>("Health"), Ok(&5));
    }

    #[test]
    fn errors_name_the_property() {
        let mut output = StructInstance::new(outer());
        let mut ctx = DecodeContext::default();
        let message = decode(r#"{"Inner":{"Count":300}}"#, &mut output, &mut ctx).unwrap_err();
        assert!(message.contains("out of range"), "{message}");
        assert!(message.contains("Inner"), "{message}");
        assert!(message.contains("Count"), "{message}");
    }

    #[test]
    fn enum_policies() {
        let mut output = StructInstance::new(outer());

        let mut lenient = DecodeContext::new(DecodeOptions::lenient());
        decode(r#"{"Tag":"Fly"}"#, &mut output, &mut lenient).unwrap();
        assert_eq!(output.get_enum("Tag"), Ok(Some("ETag_MAX")));
        assert_eq!(lenient.diagnostics().warnings().count(), 1);

        let mut strict = DecodeContext::new(DecodeOptions::strict());
        assert!(decode(r#"{"Tag":"Fly"}"#, &mut output, &mut strict).is_err());
    }

    #[test]
    fn tagged_round_trip() {
        let input = sample();
        let text = ron::to_string(&TaggedSerializeDriver::new(input.view())).unwrap();
        assert!(text.starts_with(r#"{"Outer":"#));

        let descriptor = input.descriptor().clone();
        let lookup = move |name: &str| (name == "Outer").then(|| descriptor.clone());

        let mut ctx = DecodeContext::default();
        let mut data = ron::Deserializer::from_str(&text).unwrap();
        let mut output = TaggedDeserializeDriver::new(&lookup, &mut ctx)
            .deserialize(&mut data)
            .unwrap();
        output.set("Cache", 99i32).unwrap();
        assert_eq!(output, input);

        let mut data = ron::Deserializer::from_str(r#"{"Missing":{}}"#).unwrap();
        assert!(
            TaggedDeserializeDriver::new(&lookup, &mut ctx)
                .deserialize(&mut data)
                .is_err()
        );
    }
}
