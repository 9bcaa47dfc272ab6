use alloc::borrow::Cow;
use core::alloc::Layout;
use core::fmt;

use prism_ptr::{Ptr, PtrMut};
use prism_utils::hash::HashMap;

use super::{PropertyDescriptor, PropertyType};

// -----------------------------------------------------------------------------
// StructTextHooks

/// Compact single-token text form of an intrinsic struct, such as a color
/// written as `#FF8000FF` or a timestamp.
///
/// When present, the text codec uses the hooks instead of `(A=..,B=..)`, and
/// human-readable serde formats write the exported string instead of a map.
///
/// # Safety contract of the hooks
///
/// Both functions receive a pointer to an initialized instance of the struct
/// that registered them.
#[derive(Clone, Copy)]
pub struct StructTextHooks {
    /// Writes the value as one token.
    pub export: unsafe fn(Ptr<'_>) -> String,
    /// Parses one token into the value. Returns `false` if the text is not
    /// accepted, in which case the value must be left untouched.
    pub import: unsafe fn(&str, PtrMut<'_>) -> bool,
}

impl fmt::Debug for StructTextHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructTextHooks").finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// StructDescriptor

/// The ordered field list of one structured type, plus its memory layout.
///
/// Field order is declaration order. Positional formats (the binary archive,
/// CSV rows) depend on it.
///
/// # Panics
///
/// Construction panics if a field does not fit inside the layout or is
/// misaligned. Those are registration bugs, not data errors.
///
/// # Examples
///
/// Describing an existing `#[repr(C)]` type:
///
/// ```
/// use core::alloc::Layout;
/// use core::mem::offset_of;
/// use prism_reflect::info::{PropertyDescriptor, PropertyType, StructDescriptor};
///
/// #[repr(C)]
/// struct Stats {
///     health: i32,
///     speed: f32,
/// }
///
/// let stats = StructDescriptor::new(
///     "Stats",
///     [
///         PropertyDescriptor::new("Health", PropertyType::Int32)
///             .with_offset(offset_of!(Stats, health)),
///         PropertyDescriptor::new("Speed", PropertyType::Float)
///             .with_offset(offset_of!(Stats, speed)),
///     ],
///     Layout::new::<Stats>(),
/// );
///
/// assert_eq!(stats.size(), 8);
/// assert_eq!(stats.field("speed").map(|f| f.offset()), Some(4));
/// ```
#[derive(Clone, Debug)]
pub struct StructDescriptor {
    name: Cow<'static, str>,
    fields: Box<[PropertyDescriptor]>,
    field_index: HashMap<Box<str>, usize>,
    layout: Layout,
    text_hooks: Option<StructTextHooks>,
}

impl StructDescriptor {
    /// Creates a descriptor over fields whose offsets are already set.
    #[track_caller]
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        fields: impl IntoIterator<Item = PropertyDescriptor>,
        layout: Layout,
    ) -> Self {
        let name = name.into();
        let fields: Box<[PropertyDescriptor]> = fields.into_iter().collect();
        let layout = layout.pad_to_align();

        assert!(layout.size() > 0, "struct `{name}` has a zero-sized layout");

        let mut field_index = HashMap::default();
        for (index, field) in fields.iter().enumerate() {
            let end = field.offset() + field.total_size();
            assert!(
                end <= layout.size(),
                "field `{name}.{}` ends at byte {end}, past the struct size {}",
                field.name(),
                layout.size(),
            );
            assert!(
                field.offset() % field.element_align() == 0 && field.element_align() <= layout.align(),
                "field `{name}.{}` at offset {} is misaligned",
                field.name(),
                field.offset(),
            );
            let previous = field_index.insert(Box::<str>::from(field.name()), index);
            assert!(previous.is_none(), "struct `{name}` declares `{}` twice", field.name());
        }

        Self {
            name,
            fields,
            field_index,
            layout,
            text_hooks: None,
        }
    }

    /// Attaches a compact text form.
    #[inline]
    pub fn with_text_hooks(mut self, hooks: StructTextHooks) -> Self {
        self.text_hooks = Some(hooks);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    #[inline]
    pub fn fields(&self) -> &[PropertyDescriptor] {
        &self.fields
    }

    #[inline]
    pub fn field_len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn field_at(&self, index: usize) -> Option<&PropertyDescriptor> {
        self.fields.get(index)
    }

    /// Index of the field called `name`. Exact match first, then ASCII
    /// case-insensitive.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        if let Some(&index) = self.field_index.get(name) {
            return Some(index);
        }
        self.fields
            .iter()
            .position(|f| f.name().eq_ignore_ascii_case(name))
    }

    #[inline]
    pub fn field(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.index_of(name).map(|index| &self.fields[index])
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    #[inline]
    pub fn align(&self) -> usize {
        self.layout.align()
    }

    #[inline]
    pub fn text_hooks(&self) -> Option<&StructTextHooks> {
        self.text_hooks.as_ref()
    }

    /// Fields that pass [`PropertyDescriptor::should_serialize`].
    #[inline]
    pub fn serialized_fields(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.fields.iter().filter(|f| f.should_serialize())
    }
}

// -----------------------------------------------------------------------------
// StructBuilder

/// Builds a [`StructDescriptor`] for a type that exists only as metadata.
///
/// Fields are placed in order, each at the next offset satisfying its
/// alignment. The final size is rounded up to the largest alignment.
///
/// # Examples
///
/// ```
/// use prism_reflect::info::{PropertyType, StructBuilder};
///
/// let pickup = StructBuilder::new("Pickup")
///     .field("Active", PropertyType::bool())
///     .field("Amount", PropertyType::Int64)
///     .build();
///
/// assert_eq!(pickup.field("Amount").map(|f| f.offset()), Some(8));
/// assert_eq!(pickup.size(), 16);
/// ```
#[derive(Debug)]
pub struct StructBuilder {
    name: Cow<'static, str>,
    fields: Vec<PropertyDescriptor>,
    size: usize,
    align: usize,
    text_hooks: Option<StructTextHooks>,
}

impl StructBuilder {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            size: 0,
            align: 1,
            text_hooks: None,
        }
    }

    /// Appends a plain field.
    #[inline]
    pub fn field(self, name: impl Into<Cow<'static, str>>, ty: PropertyType) -> Self {
        self.property(PropertyDescriptor::new(name, ty))
    }

    /// Appends a prepared descriptor, keeping its dimension and flags.
    /// Its offset is replaced.
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        let align = property.element_align();
        let offset = self.size.next_multiple_of(align);
        self.size = offset + property.total_size();
        self.align = self.align.max(align);
        self.fields.push(property.with_offset(offset));
        self
    }

    #[inline]
    pub fn text_hooks(mut self, hooks: StructTextHooks) -> Self {
        self.text_hooks = Some(hooks);
        self
    }

    #[track_caller]
    pub fn build(self) -> StructDescriptor {
        let size = self.size.max(1).next_multiple_of(self.align);
        let Ok(layout) = Layout::from_size_align(size, self.align) else {
            panic!("struct `{}` layout overflows isize", self.name);
        };

        let descriptor = StructDescriptor::new(self.name, self.fields, layout);
        match self.text_hooks {
            Some(hooks) => descriptor.with_text_hooks(hooks),
            None => descriptor,
        }
    }
}

#[cfg(test)]
mod tests {
    use core::alloc::Layout;

    use super::{StructBuilder, StructDescriptor};
    use crate::info::{PropertyDescriptor, PropertyFlags, PropertyType};

    #[test]
    fn builder_aligns_fields() {
        let s = StructBuilder::new("Mixed")
            .field("A", PropertyType::Byte(None))
            .field("B", PropertyType::Int32)
            .property(PropertyDescriptor::new("C", PropertyType::Int16).with_array_dim(3))
            .build();

        let offsets: Vec<_> = s.fields().iter().map(|f| f.offset()).collect();
        assert_eq!(offsets, [0, 4, 8]);
        assert_eq!(s.size(), 16);
        assert_eq!(s.align(), 4);
    }

    #[test]
    fn empty_struct_is_not_zero_sized() {
        let s = StructBuilder::new("Empty").build();
        assert_eq!(s.size(), 1);
        assert_eq!(s.field_len(), 0);
    }

    #[test]
    fn lookup_prefers_exact_case() {
        let s = StructBuilder::new("Names")
            .field("value", PropertyType::Int32)
            .field("Value", PropertyType::Int32)
            .build();
        assert_eq!(s.index_of("Value"), Some(1));
        assert_eq!(s.index_of("value"), Some(0));
        assert_eq!(s.index_of("VALUE"), Some(0));
        assert_eq!(s.index_of("Missing"), None);
    }

    #[test]
    fn serialized_fields_skip_transient() {
        let s = StructBuilder::new("Actor")
            .field("Id", PropertyType::Int32)
            .property(
                PropertyDescriptor::new("Cache", PropertyType::Int32)
                    .with_flags(PropertyFlags::TRANSIENT),
            )
            .build();
        let names: Vec<_> = s.serialized_fields().map(|f| f.name()).collect();
        assert_eq!(names, ["Id"]);
    }

    #[test]
    #[should_panic(expected = "past the struct size")]
    fn field_outside_layout_is_fatal() {
        let _ = StructDescriptor::new(
            "Broken",
            [PropertyDescriptor::new("X", PropertyType::Int64).with_offset(8)],
            Layout::new::<u64>(),
        );
    }
}
