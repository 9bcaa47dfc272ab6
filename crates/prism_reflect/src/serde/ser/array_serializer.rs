use prism_ptr::Ptr;
use serde_core::ser::{SerializeSeq, SerializeTuple};
use serde_core::{Serialize, Serializer};

use super::element_serializer::ElementSerializer;
use crate::container::ArrayView;
use crate::info::PropertyDescriptor;
use crate::path::PathGuard;

/// A serializer for dynamic arrays, in index order.
pub(super) struct ArraySerializer<'a> {
    pub array: ArrayView<'a>,
}

impl Serialize for ArraySerializer<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let element = self.array.element().ty();
        let mut state = serializer.serialize_seq(Some(self.array.len()))?;
        for index in 0..self.array.len() {
            let _guard = PathGuard::index(index);
            state.serialize_element(&ElementSerializer {
                ty: element,
                ptr: self.array.element_ptr(index),
            })?;
        }
        state.end()
    }
}

/// A serializer for the `array_dim` elements of a fixed array property.
pub(super) struct FixedArraySerializer<'a> {
    pub property: &'a PropertyDescriptor,
    /// The owning instance.
    pub container: Ptr<'a>,
}

impl Serialize for FixedArraySerializer<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let dim = self.property.array_dim();
        let mut state = serializer.serialize_tuple(dim)?;
        for index in 0..dim {
            let _guard = PathGuard::index(index);
            state.serialize_element(&ElementSerializer {
                ty: self.property.ty(),
                // SAFETY: `container` is the owning instance and `index < dim`.
                ptr: unsafe { self.property.value_ptr(self.container, index) },
            })?;
        }
        state.end()
    }
}
