use prism_ptr::Ptr;
use serde_core::ser::{SerializeMap, SerializeTuple};
use serde_core::{Serialize, Serializer};

use super::PropertySerializer;
use crate::info::StructDescriptor;

/// A serializer for struct values.
///
/// Human-readable formats get a map keyed by field name, or the text hook
/// output when the struct has one. Compact formats get the fields as a
/// positional tuple in declaration order.
pub(super) struct StructSerializer<'a> {
    pub descriptor: &'a StructDescriptor,
    pub ptr: Ptr<'a>,
}

impl Serialize for StructSerializer<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let human_readable = serializer.is_human_readable();

        if human_readable && let Some(hooks) = self.descriptor.text_hooks() {
            // SAFETY: `ptr` holds an initialized instance of the descriptor.
            let text = unsafe { (hooks.export)(self.ptr) };
            return serializer.serialize_str(&text);
        }

        let len = self.descriptor.serialized_fields().count();
        if human_readable {
            let mut state = serializer.serialize_map(Some(len))?;
            for property in self.descriptor.serialized_fields() {
                // SAFETY: `ptr` is the owning instance of every field.
                let value = unsafe { PropertySerializer::new(property, self.ptr) };
                state.serialize_entry(property.name(), &value)?;
            }
            state.end()
        } else {
            let mut state = serializer.serialize_tuple(len)?;
            for property in self.descriptor.serialized_fields() {
                // SAFETY: `ptr` is the owning instance of every field.
                let value = unsafe { PropertySerializer::new(property, self.ptr) };
                state.serialize_element(&value)?;
            }
            state.end()
        }
    }
}
