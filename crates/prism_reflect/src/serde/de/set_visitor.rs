use core::fmt;

use serde_core::de::{SeqAccess, Visitor};

use super::element_seed::ElementSeed;

use crate::container::SetViewMut;
use crate::path::PathGuard;
use crate::serde::DecodeContext;

/// A [`Visitor`] replacing the contents of a set.
///
/// Every element is decoded into a fresh default slot and the set is rehashed
/// once at the end, on the error path too, so it stays usable for lookups.
pub(super) struct SetVisitor<'a> {
    pub set: SetViewMut<'a>,
    pub ctx: &'a mut DecodeContext,
}

impl<'de> Visitor<'de> for SetVisitor<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("set property")
    }

    fn visit_seq<V: SeqAccess<'de>>(mut self, mut seq: V) -> Result<Self::Value, V::Error> {
        self.set.empty();
        let result = self.fill(&mut seq);
        self.set.rehash();
        result
    }
}

impl SetVisitor<'_> {
    fn fill<'de, V: SeqAccess<'de>>(&mut self, seq: &mut V) -> Result<(), V::Error> {
        let element = self.set.element();
        let mut index = 0;
        loop {
            let slot = self.set.add_default_slot();
            let _guard = PathGuard::index(index);
            let seed = ElementSeed {
                ty: element.ty(),
                ptr: self.set.element_ptr_mut(slot),
                ctx: &mut *self.ctx,
            };
            match seq.next_element_seed(seed) {
                Ok(Some(())) => index += 1,
                Ok(None) => {
                    self.set.remove_slot(slot);
                    return Ok(());
                }
                Err(err) => {
                    self.set.remove_slot(slot);
                    return Err(err);
                }
            }
        }
    }
}
