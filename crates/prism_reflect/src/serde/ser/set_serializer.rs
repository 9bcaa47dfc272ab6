use serde_core::ser::SerializeSeq;
use serde_core::{Serialize, Serializer};

use super::element_serializer::ElementSerializer;
use crate::container::SetView;
use crate::path::PathGuard;

/// A serializer for sets, in ascending slot order.
pub(super) struct SetSerializer<'a> {
    pub set: SetView<'a>,
}

impl Serialize for SetSerializer<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let element = self.set.element().ty();
        let mut state = serializer.serialize_seq(Some(self.set.len()))?;
        for (position, slot) in self.set.slots().enumerate() {
            let _guard = PathGuard::index(position);
            state.serialize_element(&ElementSerializer {
                ty: element,
                ptr: self.set.element_ptr(slot),
            })?;
        }
        state.end()
    }
}
