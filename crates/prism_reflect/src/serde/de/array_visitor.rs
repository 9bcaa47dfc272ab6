use core::fmt;

use prism_ptr::PtrMut;
use serde_core::de::{IgnoredAny, SeqAccess, Visitor};

use super::element_seed::ElementSeed;

use crate::container::ArrayViewMut;
use crate::info::PropertyDescriptor;
use crate::path::PathGuard;
use crate::serde::DecodeContext;

/// Upper bound in bytes on the storage reserved from a count hint.
const MAX_PREALLOCATION: usize = 1024 * 1024;

/// Elements to reserve for a hinted `len`, bounded by [`MAX_PREALLOCATION`].
fn preallocation(len: usize, element_size: usize) -> usize {
    len.min(MAX_PREALLOCATION / element_size.max(1))
}

/// A [`Visitor`] replacing the contents of a dynamic array.
///
/// The array is emptied, then sized to the incoming count when the format
/// knows it, up to [`MAX_PREALLOCATION`] bytes. Order is kept element for
/// element.
pub(super) struct ArrayVisitor<'a> {
    pub array: ArrayViewMut<'a>,
    pub ctx: &'a mut DecodeContext,
}

impl<'de> Visitor<'de> for ArrayVisitor<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("array property")
    }

    fn visit_seq<V: SeqAccess<'de>>(mut self, mut seq: V) -> Result<Self::Value, V::Error> {
        let element = self.array.element();

        self.array.empty();
        if let Some(len) = seq.size_hint() {
            self.array.resize(preallocation(len, element.element_size()));
        }

        let mut index = 0;
        loop {
            if index == self.array.len() {
                self.array.add_default_slot();
            }
            let _guard = PathGuard::index(index);
            let seed = ElementSeed {
                ty: element.ty(),
                ptr: self.array.element_ptr_mut(index),
                ctx: &mut *self.ctx,
            };
            if seq.next_element_seed(seed)?.is_none() {
                break;
            }
            index += 1;
        }

        self.array.resize(index);
        Ok(())
    }
}

/// A [`Visitor`] for the `array_dim` elements of a fixed-size property.
///
/// Fewer elements leave the tail untouched. Extra elements are skipped with a
/// single warning.
pub(super) struct FixedArrayVisitor<'a> {
    pub property: &'a PropertyDescriptor,
    pub container: PtrMut<'a>,
    pub ctx: &'a mut DecodeContext,
}

impl<'de> Visitor<'de> for FixedArrayVisitor<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "up to {} elements", self.property.array_dim())
    }

    fn visit_seq<V: SeqAccess<'de>>(mut self, mut seq: V) -> Result<Self::Value, V::Error> {
        let dim = self.property.array_dim();

        for index in 0..dim {
            let _guard = PathGuard::index(index);
            let seed = ElementSeed {
                ty: self.property.ty(),
                // SAFETY: `container` owns `property` and `index < array_dim`.
                ptr: unsafe { self.property.value_ptr_mut(self.container.reborrow(), index) },
                ctx: &mut *self.ctx,
            };
            if seq.next_element_seed(seed)?.is_none() {
                return Ok(());
            }
        }

        let mut extra = 0usize;
        while seq.next_element::<IgnoredAny>()?.is_some() {
            extra += 1;
        }
        if extra > 0 {
            self.ctx.diagnostics_mut().warn(format!(
                "ignored {extra} element(s) beyond the array dimension {dim}"
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_PREALLOCATION, preallocation};

    #[test]
    fn hints_are_bounded_by_bytes() {
        assert_eq!(preallocation(3, 8), 3);
        assert_eq!(preallocation(usize::MAX, 8), MAX_PREALLOCATION / 8);
        assert_eq!(preallocation(usize::MAX, 0), MAX_PREALLOCATION);
        assert_eq!(preallocation(0, 32 * 1024), 0);
    }
}
