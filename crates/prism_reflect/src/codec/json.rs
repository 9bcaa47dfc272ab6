//! JSON value trees of described structs, through `serde_json`.
//!
//! | Kind | JSON |
//! |---|---|
//! | Bool | boolean |
//! | Integers | number; strings holding an integer are accepted on read |
//! | Float, Double | number |
//! | Enum | entry name |
//! | Name, String, Text, SoftObject | string |
//! | Struct | object, or a string for structs with text hooks |
//! | Array, Set | array |
//! | Map | object, keys in their text form |
//! | Object, WeakObject | `null` |
//! | Interface | unsupported, the conversion fails |
//!
//! Reading is strict about enums: an unknown name fails the field. Each
//! top-level field is decoded on its own and every failure is reported in
//! [`JsonError::Fields`]; fields decoded before or after a failing one keep
//! their new value.

use core::fmt;

use serde_core::de::DeserializeSeed;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::Diagnostics;
use crate::diagnostics;
use crate::ops::{StructInstance, StructMut, StructRef};
use crate::path;
use crate::registry::TypeLookup;
use crate::serde::{
    DecodeContext, DecodeOptions, PropertyDeserializer, SerializeDriver, TaggedSerializeDriver,
};

// -----------------------------------------------------------------------------
// JsonError

/// Failure of a JSON conversion.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JsonError {
    #[error("cannot convert to JSON: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("expected a JSON object for struct `{0}`")]
    NotAnObject(String),
    #[error("expected an object with a single entry keyed by a struct name")]
    NotTagged,
    #[error("no struct named `{0}` is registered")]
    UnknownStruct(String),
    #[error("{}", FieldList(.0))]
    Fields(Vec<FieldError>),
}

/// One top-level field that failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`: {}", self.field, self.message)
    }
}

struct FieldList<'a>(&'a [FieldError]);

impl fmt::Display for FieldList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s) could not be decoded", self.0.len())?;
        for error in self.0 {
            write!(f, "\n  {error}")?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Entry points

/// The JSON object of `value`, with the map keys that had to be replaced.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use prism_reflect::codec::json::{from_json, to_json};
/// use prism_reflect::info::{EnumDescriptor, PropertyType, StructBuilder};
/// use prism_reflect::ops::StructInstance;
///
/// let tag = Arc::new(EnumDescriptor::from_names("ETag", ["Idle", "Run", "Jump"]));
/// let player = Arc::new(
///     StructBuilder::new("Player")
///         .field("health", PropertyType::Int32)
///         .field("tag", PropertyType::byte_enum(tag))
///         .build(),
/// );
///
/// let mut value = StructInstance::new(player);
/// value.set("health", 42i32).unwrap();
/// value.set_enum("tag", "Run").unwrap();
/// let (json, diagnostics) = to_json(value.view()).unwrap();
/// assert_eq!(json.to_string(), r#"{"health":42,"tag":"Run"}"#);
/// assert!(diagnostics.is_empty());
///
/// let input = serde_json::json!({ "health": "100", "tag": "Jump" });
/// from_json(&input, value.view_mut()).unwrap();
/// assert_eq!(value.get::<i32>("health"), Ok(&100));
/// assert_eq!(value.get_enum("tag"), Ok(Some("Jump")));
/// ```
pub fn to_json(value: StructRef<'_>) -> Result<(Value, Diagnostics), JsonError> {
    path::reset();
    let (json, diagnostics) = diagnostics::collect(|| serde_json::to_value(SerializeDriver::new(value)));
    Ok((json.map_err(JsonError::Serialize)?, diagnostics))
}

/// Decodes the fields present in `json` into `value`.
///
/// Keys match field names exactly first, then case-insensitively. Unknown
/// keys are ignored and missing fields keep their value.
pub fn from_json(json: &Value, value: StructMut<'_>) -> Result<Diagnostics, JsonError> {
    path::reset();
    let (descriptor, mut container) = value.into_raw();
    let Value::Object(object) = json else {
        return Err(JsonError::NotAnObject(descriptor.name().into()));
    };

    let mut ctx = DecodeContext::new(DecodeOptions::strict());
    let mut errors = Vec::new();

    for property in descriptor.serialized_fields() {
        let Some(field) = find_key(object, property.name()) else {
            continue;
        };
        // SAFETY: the property belongs to this instance.
        let seed = unsafe { PropertyDeserializer::new(property, container.reborrow(), &mut ctx) };
        if let Err(err) = seed.deserialize(field) {
            errors.push(FieldError {
                field: property.name().into(),
                message: err.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(ctx.into_diagnostics())
    } else {
        Err(JsonError::Fields(errors))
    }
}

/// `{ "<StructName>": <to_json(value)> }`
pub fn to_json_tagged(value: StructRef<'_>) -> Result<(Value, Diagnostics), JsonError> {
    path::reset();
    let (json, diagnostics) =
        diagnostics::collect(|| serde_json::to_value(TaggedSerializeDriver::new(value)));
    Ok((json.map_err(JsonError::Serialize)?, diagnostics))
}

/// Reads the output of [`to_json_tagged`] into a new instance of the struct
/// it names.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use prism_reflect::codec::json::{from_json_tagged, to_json_tagged};
/// use prism_reflect::info::{PropertyType, StructBuilder};
/// use prism_reflect::ops::StructInstance;
/// use prism_reflect::registry::TypeRegistry;
///
/// let point = Arc::new(StructBuilder::new("Point").field("X", PropertyType::Int32).build());
/// let mut registry = TypeRegistry::new();
/// registry.register_struct(point.clone()).unwrap();
///
/// let mut value = StructInstance::new(point);
/// value.set("X", 3i32).unwrap();
///
/// let (json, _) = to_json_tagged(value.view()).unwrap();
/// assert_eq!(json, serde_json::json!({ "Point": { "X": 3 } }));
///
/// let (copy, _) = from_json_tagged(&json, &registry).unwrap();
/// assert_eq!(copy, value);
/// ```
pub fn from_json_tagged<L: TypeLookup + ?Sized>(
    json: &Value,
    lookup: &L,
) -> Result<(StructInstance, Diagnostics), JsonError> {
    let entry = match json {
        Value::Object(object) if object.len() == 1 => object.iter().next(),
        _ => None,
    };
    let Some((name, inner)) = entry else {
        return Err(JsonError::NotTagged);
    };
    let descriptor = lookup
        .find_struct(name)
        .ok_or_else(|| JsonError::UnknownStruct(name.clone()))?;

    let mut instance = StructInstance::new(descriptor);
    let diagnostics = from_json(inner, instance.view_mut())?;
    Ok((instance, diagnostics))
}

fn find_key<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object.get(name).or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use prism_ptr::{Ptr, PtrMut};
    use serde_json::json;

    use super::{JsonError, from_json, from_json_tagged, to_json, to_json_tagged};
    use crate::info::{EnumDescriptor, PropertyType, StructBuilder, StructDescriptor, StructTextHooks};
    use crate::ops::StructInstance;
    use crate::value::{InterfaceRef, ObjectRef, WeakObjectRef};

    fn tag() -> Arc<EnumDescriptor> {
        Arc::new(EnumDescriptor::from_names("ETag", ["Idle", "Run", "Jump"]))
    }

    fn player() -> Arc<StructDescriptor> {
        Arc::new(
            StructBuilder::new("Player")
                .field("health", PropertyType::Int32)
                .field("tag", PropertyType::byte_enum(tag()))
                .field("big", PropertyType::UInt64)
                .field("ratio", PropertyType::Float)
                .field("owner", PropertyType::Object)
                .field("weak", PropertyType::WeakObject)
                .build(),
        )
    }

    #[test]
    fn scalars_and_references() {
        let mut value = StructInstance::new(player());
        value.set("health", 42i32).unwrap();
        value.set_enum("tag", "Run").unwrap();
        value.set("big", u64::MAX).unwrap();
        value.set("ratio", 0.5f32).unwrap();
        value.set("owner", ObjectRef::from_addr(0x40)).unwrap();
        value.set("weak", WeakObjectRef::new(1, 2)).unwrap();

        let (json, diagnostics) = to_json(value.view()).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(
            json,
            json!({
                "health": 42,
                "tag": "Run",
                "big": u64::MAX,
                "ratio": 0.5,
                "owner": null,
                "weak": null,
            })
        );

        let mut copy = StructInstance::new(player());
        from_json(&json!({ "health": "100", "TAG": "Jump", "big": "18446744073709551615" }), copy.view_mut())
            .unwrap();
        assert_eq!(copy.get::<i32>("health"), Ok(&100));
        assert_eq!(copy.get_enum("tag"), Ok(Some("Jump")));
        assert_eq!(copy.get::<u64>("big"), Ok(&u64::MAX));

        from_json(&json!({ "owner": null, "weak": null, "mana": 7 }), value.view_mut()).unwrap();
        assert_eq!(value.get::<ObjectRef>("owner"), Ok(&ObjectRef::NULL));
        assert!(value.get::<WeakObjectRef>("weak").unwrap().is_null());
    }

    #[test]
    fn non_finite_floats_are_text() {
        let bounds = Arc::new(
            StructBuilder::new("Bounds")
                .field("Low", PropertyType::Float)
                .field("High", PropertyType::Float)
                .field("Mean", PropertyType::Double)
                .build(),
        );
        let mut value = StructInstance::new(bounds.clone());
        value.set("Low", f32::NEG_INFINITY).unwrap();
        value.set("High", f32::INFINITY).unwrap();
        value.set("Mean", f64::NAN).unwrap();

        let (json, _) = to_json(value.view()).unwrap();
        assert_eq!(json, json!({ "Low": "-inf", "High": "inf", "Mean": "NaN" }));

        let mut copy = StructInstance::new(bounds);
        from_json(&json, copy.view_mut()).unwrap();
        assert_eq!(copy.get::<f32>("Low"), Ok(&f32::NEG_INFINITY));
        assert_eq!(copy.get::<f32>("High"), Ok(&f32::INFINITY));
        assert!(copy.get::<f64>("Mean").unwrap().is_nan());
    }

    #[test]
    fn unknown_enum_names_fail_the_field() {
        let mut value = StructInstance::new(player());
        let input = json!({ "tag": "Fly", "health": 5, "ratio": "fast" });

        let Err(JsonError::Fields(errors)) = from_json(&input, value.view_mut()) else {
            panic!("expected field errors");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["tag", "ratio"]);
        assert!(errors[0].message.contains("Fly"), "{}", errors[0].message);

        // Other fields were still decoded.
        assert_eq!(value.get::<i32>("health"), Ok(&5));
        assert_eq!(value.get_enum("tag"), Ok(Some("Idle")));

        assert!(matches!(
            from_json(&json!([1, 2]), value.view_mut()),
            Err(JsonError::NotAnObject(_))
        ));
    }

    #[test]
    fn maps_use_text_keys() {
        let descriptor = Arc::new(
            StructBuilder::new("Table")
                .field("Named", PropertyType::map(PropertyType::String, PropertyType::Int32))
                .field("Numbered", PropertyType::map(PropertyType::Int16, PropertyType::bool()))
                .build(),
        );
        let mut value = StructInstance::new(descriptor.clone());
        {
            let mut named = value.map_view_mut("Named").unwrap();
            named.insert(String::from("a"), 1i32).unwrap();
            named.insert(String::from("b"), 2i32).unwrap();
        }
        value.map_view_mut("Numbered").unwrap().insert(-3i16, true).unwrap();

        let (json, _) = to_json(value.view()).unwrap();
        assert_eq!(json, json!({ "Named": { "a": 1, "b": 2 }, "Numbered": { "-3": true } }));

        let mut copy = StructInstance::new(descriptor);
        from_json(&json, copy.view_mut()).unwrap();
        assert_eq!(copy, value);
        assert_eq!(copy.map_view("Named").unwrap().get::<String, i32>(&"b".into()), Ok(Some(&2)));
    }

    #[test]
    fn empty_map_keys_are_replaced() {
        let descriptor = Arc::new(
            StructBuilder::new("Table")
                .field("Named", PropertyType::map(PropertyType::String, PropertyType::Int32))
                .build(),
        );
        let mut value = StructInstance::new(descriptor);
        value
            .map_view_mut("Named")
            .unwrap()
            .insert(String::new(), 9i32)
            .unwrap();

        let (json, diagnostics) = to_json(value.view()).unwrap();
        assert_eq!(json, json!({ "Named": { "Unparsed Key 0": 9 } }));
        assert!(diagnostics.has_errors());
        let entries = diagnostics.into_vec();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].path.starts_with("Named"), "{}", entries[0].path);
        assert!(entries[0].message.contains("Unparsed Key 0"));
    }

    #[test]
    fn interfaces_are_unsupported() {
        let descriptor = Arc::new(
            StructBuilder::new("Holder")
                .field("Count", PropertyType::Int32)
                .field("Api", PropertyType::Interface)
                .build(),
        );
        let mut value = StructInstance::new(descriptor);
        value.set("Api", InterfaceRef::default()).unwrap();

        let error = to_json(value.view()).unwrap_err();
        assert!(matches!(error, JsonError::Serialize(_)));
        assert!(error.to_string().contains("Api"), "{error}");
    }

    #[repr(C)]
    struct Stamp {
        seconds: i64,
    }

    unsafe fn export_stamp(ptr: Ptr<'_>) -> String {
        format!("T+{}", unsafe { ptr.as_ref::<Stamp>() }.seconds)
    }

    unsafe fn import_stamp(text: &str, ptr: PtrMut<'_>) -> bool {
        match text.strip_prefix("T+").and_then(|s| s.parse().ok()) {
            Some(seconds) => {
                unsafe { ptr.consume::<Stamp>() }.seconds = seconds;
                true
            }
            None => false,
        }
    }

    #[test]
    fn text_hooks_become_strings() {
        let stamp = Arc::new(
            StructBuilder::new("Stamp")
                .field("Seconds", PropertyType::Int64)
                .text_hooks(StructTextHooks {
                    export: export_stamp,
                    import: import_stamp,
                })
                .build(),
        );
        let event = Arc::new(
            StructBuilder::new("Event")
                .field("At", PropertyType::structure(stamp))
                .build(),
        );

        let mut value = StructInstance::new(event.clone());
        from_json(&json!({ "At": "T+90" }), value.view_mut()).unwrap();
        assert_eq!(to_json(value.view()).unwrap().0, json!({ "At": "T+90" }));
        assert!(from_json(&json!({ "At": "yesterday" }), value.view_mut()).is_err());

        let (tagged, _) = to_json_tagged(value.view()).unwrap();
        let (copy, diagnostics) = from_json_tagged(&tagged, &|name: &str| {
            (name == "Event").then(|| event.clone())
        })
        .unwrap();
        assert_eq!(copy, value);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn tagged_errors() {
        let lookup = |_: &str| -> Option<Arc<StructDescriptor>> { None };
        assert!(matches!(
            from_json_tagged(&json!({ "Ghost": {} }), &lookup),
            Err(JsonError::UnknownStruct(name)) if name == "Ghost"
        ));
        assert!(matches!(
            from_json_tagged(&json!({ "A": {}, "B": {} }), &lookup),
            Err(JsonError::NotTagged)
        ));
    }
}
