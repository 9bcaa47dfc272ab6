use alloc::sync::Arc;

use super::TypeRegistry;
use crate::info::StructDescriptor;

/// Resolves a struct descriptor from its name.
///
/// The tagged codecs take this instead of a concrete registry, so tests and
/// hosts can inject a closure.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use prism_reflect::info::{PropertyType, StructBuilder, StructDescriptor};
/// use prism_reflect::registry::TypeLookup;
///
/// let point = Arc::new(StructBuilder::new("Point").field("X", PropertyType::Int32).build());
/// let lookup = |name: &str| (name == "Point").then(|| point.clone());
///
/// assert!(lookup.find_struct("Point").is_some());
/// assert!(lookup.find_struct("Line").is_none());
/// ```
pub trait TypeLookup {
    fn find_struct(&self, name: &str) -> Option<Arc<StructDescriptor>>;
}

impl TypeLookup for TypeRegistry {
    #[inline]
    fn find_struct(&self, name: &str) -> Option<Arc<StructDescriptor>> {
        self.get_struct(name).cloned()
    }
}

impl<F> TypeLookup for F
where
    F: Fn(&str) -> Option<Arc<StructDescriptor>>,
{
    #[inline]
    fn find_struct(&self, name: &str) -> Option<Arc<StructDescriptor>> {
        self(name)
    }
}
