use prism_ptr::Ptr;
use serde_core::ser::SerializeMap;
use serde_core::{Serialize, Serializer};

use super::element_serializer::ElementSerializer;
use crate::codec::text::{TextOptions, export_element};
use crate::container::MapView;
use crate::diagnostics;
use crate::info::PropertyType;
use crate::path::PathGuard;
use crate::value::{Name, SoftObjectPath, Text};

/// A serializer for maps, in ascending slot order.
///
/// Human-readable formats only take text keys, so keys are written in their
/// text form there. A key whose text is empty is replaced by
/// `Unparsed Key <n>` and an error is reported.
pub(super) struct MapSerializer<'a> {
    pub map: MapView<'a>,
}

impl Serialize for MapSerializer<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let human_readable = serializer.is_human_readable();
        let (key_ty, value_ty) = (self.map.key().ty(), self.map.value().ty());

        let mut state = serializer.serialize_map(Some(self.map.len()))?;
        for (position, slot) in self.map.slots().enumerate() {
            let _guard = PathGuard::index(position);
            let value = ElementSerializer {
                ty: value_ty,
                ptr: self.map.value_ptr(slot),
            };

            if human_readable {
                // SAFETY: live slots hold initialized keys.
                let mut key = unsafe { key_text(key_ty, self.map.key_ptr(slot)) };
                if key.is_empty() {
                    key = format!("Unparsed Key {position}");
                    diagnostics::report_error(format!(
                        "map key has no text form, written as `{key}`"
                    ));
                }
                state.serialize_entry(&key, &value)?;
            } else {
                let key = ElementSerializer {
                    ty: key_ty,
                    ptr: self.map.key_ptr(slot),
                };
                state.serialize_entry(&key, &value)?;
            }
        }
        state.end()
    }
}

/// # Safety
///
/// `ptr` must hold an initialized value of `ty`.
unsafe fn key_text(ty: &PropertyType, ptr: Ptr<'_>) -> String {
    // SAFETY: guaranteed by the caller.
    unsafe {
        match ty {
            PropertyType::String => ptr.as_ref::<String>().clone(),
            PropertyType::Name => ptr.read::<Name>().to_string(),
            PropertyType::Text => ptr.as_ref::<Text>().as_str().into(),
            PropertyType::SoftObject => ptr.as_ref::<SoftObjectPath>().as_str().into(),
            _ => export_element(ty, ptr, &TextOptions::default()),
        }
    }
}
