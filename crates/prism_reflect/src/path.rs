//! The property path of the conversion in progress on this thread.
//!
//! Drivers push a segment when they enter a property or a container element
//! and pop it on the way out, error or not. Errors and diagnostics render the
//! stack as `Inventory.Slots[2].Count`.

use alloc::borrow::Cow;
use core::cell::RefCell;
use core::fmt;

use crate::info::{PropertyDescriptor, PropertyKind};

#[derive(Clone, Debug)]
enum PathSegment {
    Field {
        name: Cow<'static, str>,
        kind: PropertyKind,
    },
    Index(usize),
}

/// Stack of property names and element indices.
#[derive(Clone, Debug, Default)]
pub(crate) struct PropertyPath {
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    const fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field { name, kind } => {
                    if position > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                    #[cfg(all(feature = "debug", debug_assertions))]
                    write!(f, "({kind})")?;
                    #[cfg(not(all(feature = "debug", debug_assertions)))]
                    let _ = kind;
                }
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

std::thread_local! {
    static PROPERTY_PATH: RefCell<PropertyPath> = const { RefCell::new(PropertyPath::new()) };
}

/// Pops its segment when dropped.
#[must_use]
pub(crate) struct PathGuard(());

impl PathGuard {
    pub(crate) fn field(property: &PropertyDescriptor) -> Self {
        PROPERTY_PATH.with_borrow_mut(|path| {
            path.segments.push(PathSegment::Field {
                name: property.name_cow().clone(),
                kind: property.kind(),
            });
        });
        PathGuard(())
    }

    pub(crate) fn index(index: usize) -> Self {
        PROPERTY_PATH.with_borrow_mut(|path| path.segments.push(PathSegment::Index(index)));
        PathGuard(())
    }
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        PROPERTY_PATH.with_borrow_mut(|path| path.segments.pop());
    }
}

/// Clears leftovers of a conversion that unwound.
pub(crate) fn reset() {
    PROPERTY_PATH.with_borrow_mut(|path| path.segments.clear());
}

/// The current path, empty at top level.
pub(crate) fn current() -> String {
    PROPERTY_PATH.with_borrow(|path| path.to_string())
}

/// Appends the current path to `msg`, if there is one.
pub(crate) fn describe(msg: impl fmt::Display) -> String {
    PROPERTY_PATH.with_borrow(|path| {
        if path.is_empty() {
            msg.to_string()
        } else {
            format!("{msg} (at `{path}`)")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{PathGuard, current, describe, reset};
    use crate::info::{PropertyDescriptor, PropertyType};

    #[test]
    fn guards_pop_in_reverse() {
        reset();
        let slots = PropertyDescriptor::new("Slots", PropertyType::array(PropertyType::Int32));
        let count = PropertyDescriptor::new("Count", PropertyType::Int32);
        {
            let _a = PathGuard::field(&slots);
            let _b = PathGuard::index(2);
            let _c = PathGuard::field(&count);
            #[cfg(not(all(feature = "debug", debug_assertions)))]
            assert_eq!(current(), "Slots[2].Count");
            #[cfg(all(feature = "debug", debug_assertions))]
            assert_eq!(current(), "Slots(Array)[2].Count(Int32)");
        }
        assert_eq!(current(), "");
        assert_eq!(describe("boom"), "boom");
    }
}
