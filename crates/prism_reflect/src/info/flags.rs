use bitflags::bitflags;

bitflags! {
    /// Bitflags attached to a [`PropertyDescriptor`](crate::info::PropertyDescriptor).
    ///
    /// The conversion layer never interprets these on its own except through
    /// [`PropertyDescriptor::should_serialize`](crate::info::PropertyDescriptor::should_serialize),
    /// which callers and the struct-level entry points use to filter fields.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u32 {
        /// Runtime-only state, never persisted.
        const TRANSIENT          = 1 << 0;
        /// Editable in property panels.
        const EDITABLE           = 1 << 1;
        /// Visible to scripting layers.
        const BLUEPRINT_VISIBLE  = 1 << 2;
        /// Kept only to load old data.
        const DEPRECATED         = 1 << 3;
        /// Excluded from every serialization path.
        const SKIP_SERIALIZATION = 1 << 4;
        /// Loaded from configuration files.
        const CONFIG             = 1 << 5;

        /// Flags that remove a property from serialization.
        const SKIPPED = Self::TRANSIENT.bits() | Self::SKIP_SERIALIZATION.bits();
    }
}
