use alloc::borrow::Cow;

// -----------------------------------------------------------------------------
// EnumEntry

/// One named value of an [`EnumDescriptor`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumEntry {
    name: Cow<'static, str>,
    value: i64,
    display_name: Option<Cow<'static, str>>,
}

impl EnumEntry {
    /// Creates an entry without a display name.
    pub fn new(name: impl Into<Cow<'static, str>>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
            display_name: None,
        }
    }

    /// Sets the friendly name shown in editors and accepted as an import fallback.
    pub fn with_display_name(mut self, display_name: impl Into<Cow<'static, str>>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Returns the display name, or the declared name when none was set.
    #[inline]
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

// -----------------------------------------------------------------------------
// EnumDescriptor

/// Bidirectional name and value table of one enumeration.
///
/// Entries keep declaration order. The last entry is always the sentinel
/// `<Enum>_MAX`, whose value is one past the largest declared value. Loaders
/// that meet an unknown name fall back to it.
///
/// Name lookups are ASCII case-insensitive and accept the qualified
/// `Enum::Entry` form.
///
/// # Examples
///
/// ```
/// use prism_reflect::info::EnumDescriptor;
///
/// let state = EnumDescriptor::from_names("EMoveState", ["Idle", "Run", "Jump"]);
///
/// assert_eq!(state.value_of("run"), Some(1));
/// assert_eq!(state.value_of("EMoveState::Jump"), Some(2));
/// assert_eq!(state.name_of(2), Some("Jump"));
/// assert_eq!(state.max_value(), 3);
/// assert_eq!(state.name_of(3), Some("EMoveState_MAX"));
/// ```
#[derive(Clone, Debug)]
pub struct EnumDescriptor {
    name: Cow<'static, str>,
    entries: Box<[EnumEntry]>,
}

impl EnumDescriptor {
    /// Creates a descriptor from entries in declaration order.
    ///
    /// A `<name>_MAX` sentinel is appended unless the last entry already ends in `_MAX`.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        entries: impl IntoIterator<Item = EnumEntry>,
    ) -> Self {
        let name = name.into();
        let mut entries: Vec<EnumEntry> = entries.into_iter().collect();

        let has_sentinel = entries.last().is_some_and(|e| e.name.ends_with("_MAX"));
        if !has_sentinel {
            let max = entries.iter().map(|e| e.value).max().map_or(0, |v| v + 1);
            entries.push(EnumEntry::new(format!("{name}_MAX"), max));
        }

        Self {
            name,
            entries: entries.into_boxed_slice(),
        }
    }

    /// Creates a descriptor whose values are the positions of `names`.
    pub fn from_names<I, S>(name: impl Into<Cow<'static, str>>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        Self::new(
            name,
            names
                .into_iter()
                .enumerate()
                .map(|(index, n)| EnumEntry::new(n, index as i64)),
        )
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All entries, sentinel included.
    #[inline]
    pub fn entries(&self) -> &[EnumEntry] {
        &self.entries
    }

    /// Number of entries, sentinel included.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The sentinel entry.
    #[inline]
    pub fn sentinel(&self) -> &EnumEntry {
        // `new` guarantees at least the sentinel.
        &self.entries[self.entries.len() - 1]
    }

    /// Value of the sentinel entry.
    #[inline]
    pub fn max_value(&self) -> i64 {
        self.sentinel().value
    }

    /// Returns `true` if some entry carries `value`.
    #[inline]
    pub fn is_valid_value(&self, value: i64) -> bool {
        self.entries.iter().any(|e| e.value == value)
    }

    pub fn entry_of(&self, value: i64) -> Option<&EnumEntry> {
        self.entries.iter().find(|e| e.value == value)
    }

    /// Declared name of `value`.
    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.entry_of(value).map(EnumEntry::name)
    }

    /// Display name of `value`, falling back to the declared name.
    pub fn display_name_of(&self, value: i64) -> Option<&str> {
        self.entry_of(value).map(EnumEntry::display_name)
    }

    /// Resolves a declared name, optionally qualified as `Enum::Entry`.
    pub fn value_of(&self, name: &str) -> Option<i64> {
        let name = name.trim();
        let short = match name.split_once("::") {
            Some((owner, entry)) if owner.eq_ignore_ascii_case(&self.name) => entry,
            Some(_) => return None,
            None => name,
        };
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(short))
            .map(|e| e.value)
    }

    /// Resolves a display name. Only entries with an explicit display name take part.
    pub fn value_of_display_name(&self, display_name: &str) -> Option<i64> {
        let display_name = display_name.trim();
        self.entries
            .iter()
            .find(|e| {
                e.display_name
                    .as_deref()
                    .is_some_and(|d| d.eq_ignore_ascii_case(display_name))
            })
            .map(|e| e.value)
    }

    /// Returns the `Enum::Entry` form of an entry name.
    pub fn qualified_name(&self, entry: &str) -> String {
        format!("{}::{}", self.name, entry)
    }
}

#[cfg(test)]
mod tests {
    use super::{EnumDescriptor, EnumEntry};

    #[test]
    fn sentinel_follows_largest_value() {
        let e = EnumDescriptor::new(
            "ESparse",
            [EnumEntry::new("A", 4), EnumEntry::new("B", 1)],
        );
        assert_eq!(e.len(), 3);
        assert_eq!(e.sentinel().name(), "ESparse_MAX");
        assert_eq!(e.max_value(), 5);
    }

    #[test]
    fn explicit_sentinel_is_kept() {
        let e = EnumDescriptor::new(
            "EFlags",
            [EnumEntry::new("None", 0), EnumEntry::new("EFlags_MAX", 9)],
        );
        assert_eq!(e.len(), 2);
        assert_eq!(e.max_value(), 9);
    }

    #[test]
    fn display_names() {
        let e = EnumDescriptor::new(
            "EColorMode",
            [
                EnumEntry::new("CM_Rgb", 0).with_display_name("Full Color"),
                EnumEntry::new("CM_Gray", 1),
            ],
        );
        assert_eq!(e.display_name_of(0), Some("Full Color"));
        assert_eq!(e.display_name_of(1), Some("CM_Gray"));
        assert_eq!(e.value_of_display_name("full color"), Some(0));
        // Declared names are not display names.
        assert_eq!(e.value_of_display_name("CM_Gray"), None);
    }

    #[test]
    fn qualified_names() {
        let e = EnumDescriptor::from_names("EMode", ["On", "Off"]);
        assert_eq!(e.value_of("EMode::Off"), Some(1));
        assert_eq!(e.value_of("EOther::Off"), None);
        assert_eq!(e.qualified_name("On"), "EMode::On");
    }
}
