use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::{OnceLock, PoisonError, RwLock};

use prism_utils::hash::HashMap;

// -----------------------------------------------------------------------------
// NameTable

/// Process-wide intern table backing [`Name`].
///
/// Every distinct spelling gets a display index. Spellings that differ only
/// in ASCII case share the comparison index of the first one interned.
struct NameTable {
    display: Vec<Box<str>>,
    exact: HashMap<Box<str>, u32>,
    folded: HashMap<Box<str>, u32>,
}

impl NameTable {
    fn new() -> Self {
        let mut table = Self {
            display: Vec::new(),
            exact: HashMap::default(),
            folded: HashMap::default(),
        };
        // Index 0 is `None`, so the all-zero name is the none name.
        table.intern(NONE_STR);
        table
    }

    fn intern(&mut self, base: &str) -> (u32, u32) {
        let folded_key = base.to_ascii_lowercase();

        let display_index = match self.exact.get(base) {
            Some(&index) => index,
            None => {
                let index = self.display.len() as u32;
                self.display.push(base.into());
                self.exact.insert(base.into(), index);
                index
            }
        };

        let comparison_index = *self
            .folded
            .entry(folded_key.into_boxed_str())
            .or_insert(display_index);

        (comparison_index, display_index)
    }

    fn find(&self, base: &str) -> Option<(u32, u32)> {
        let display_index = *self.exact.get(base)?;
        let comparison_index = *self.folded.get(base.to_ascii_lowercase().as_str())?;
        Some((comparison_index, display_index))
    }
}

const NONE_STR: &str = "None";

static NAME_TABLE: OnceLock<RwLock<NameTable>> = OnceLock::new();

fn name_table() -> &'static RwLock<NameTable> {
    NAME_TABLE.get_or_init(|| RwLock::new(NameTable::new()))
}

fn with_table<R>(f: impl FnOnce(&NameTable) -> R) -> R {
    let guard = name_table().read().unwrap_or_else(PoisonError::into_inner);
    f(&guard)
}

fn with_table_mut<R>(f: impl FnOnce(&mut NameTable) -> R) -> R {
    let mut guard = name_table().write().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

/// Splits a trailing `_<number>` suffix.
///
/// The stored number is the parsed value plus one, so `0` means "no number".
/// Suffixes with leading zeros stay part of the base, otherwise `Foo_01` and
/// `Foo_1` would collide.
fn split_number(text: &str) -> (&str, u32) {
    if let Some(pos) = text.rfind('_')
        && pos > 0
    {
        let digits = &text[pos + 1..];
        let well_formed = !digits.is_empty()
            && digits.len() <= 9
            && digits.bytes().all(|b| b.is_ascii_digit())
            && (digits.len() == 1 || !digits.starts_with('0'));

        if well_formed && let Ok(number) = digits.parse::<u32>() {
            return (&text[..pos], number + 1);
        }
    }
    (text, 0)
}

// -----------------------------------------------------------------------------
// Name

/// An interned, case-insensitive identifier.
///
/// Stored in instance memory as three `u32`: comparison index, display index
/// and instance number. The binary archive writes exactly these three fields,
/// which only have meaning inside the process that interned them.
///
/// # Examples
///
/// ```
/// use prism_reflect::value::Name;
///
/// let a = Name::new("Spawn_3");
/// assert_eq!(a.number(), 4);
/// assert_eq!(a.to_string(), "Spawn_3");
///
/// assert_eq!(a, Name::new("SPAWN_3"));
/// assert_ne!(a, Name::new("Spawn_4"));
/// assert!(Name::default().is_none());
/// ```
#[derive(Clone, Copy, Default)]
#[repr(C)]
pub struct Name {
    comparison_index: u32,
    display_index: u32,
    number: u32,
}

impl Name {
    /// The empty name, printed as `None`.
    pub const NONE: Name = Name {
        comparison_index: 0,
        display_index: 0,
        number: 0,
    };

    /// Interns `text` and returns its name.
    pub fn new(text: &str) -> Self {
        let (base, number) = split_number(text);
        let (comparison_index, display_index) = match with_table(|t| t.find(base)) {
            Some(found) => found,
            None => with_table_mut(|t| t.intern(base)),
        };
        Self {
            comparison_index,
            display_index,
            number,
        }
    }

    /// Rebuilds a name from its stored fields.
    ///
    /// Returns `None` if either index was never handed out by the table.
    pub fn from_raw_parts(comparison_index: u32, display_index: u32, number: u32) -> Option<Self> {
        let valid = with_table(|t| {
            let len = t.display.len() as u32;
            comparison_index < len && display_index < len
        });
        valid.then_some(Self {
            comparison_index,
            display_index,
            number,
        })
    }

    #[inline]
    pub const fn comparison_index(&self) -> u32 {
        self.comparison_index
    }

    #[inline]
    pub const fn display_index(&self) -> u32 {
        self.display_index
    }

    /// Instance number plus one, `0` if the name has no number.
    #[inline]
    pub const fn number(&self) -> u32 {
        self.number
    }

    #[inline]
    pub const fn is_none(&self) -> bool {
        self.comparison_index == 0 && self.number == 0
    }

    /// The spelling without the number suffix.
    pub fn base(&self) -> String {
        with_table(|t| {
            t.display
                .get(self.display_index as usize)
                .map_or_else(|| NONE_STR.into(), |s| String::from(&**s))
        })
    }
}

impl PartialEq for Name {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.comparison_index == other.comparison_index && self.number == other.number
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.comparison_index.hash(state);
        self.number.hash(state);
    }
}

impl From<&str> for Name {
    #[inline]
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base())?;
        if self.number != 0 {
            write!(f, "_{}", self.number - 1)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::{Name, split_number};

    #[test]
    fn number_suffix() {
        assert_eq!(split_number("Foo_3"), ("Foo", 4));
        assert_eq!(split_number("Foo_0"), ("Foo", 1));
        assert_eq!(split_number("Foo_03"), ("Foo_03", 0));
        assert_eq!(split_number("Foo_"), ("Foo_", 0));
        assert_eq!(split_number("_7"), ("_7", 0));
        assert_eq!(split_number("Foo"), ("Foo", 0));
    }

    #[test]
    fn case_insensitive_identity() {
        let lower = Name::new("pickup");
        let upper = Name::new("PickUp");
        assert_eq!(lower, upper);
        assert_eq!(lower.comparison_index(), upper.comparison_index());
        assert_ne!(lower.display_index(), upper.display_index());
        assert_eq!(upper.to_string(), "PickUp");
    }

    #[test]
    fn raw_parts() {
        let name = Name::new("Crate_12");
        let rebuilt =
            Name::from_raw_parts(name.comparison_index(), name.display_index(), name.number());
        assert_eq!(rebuilt, Some(name));
        assert!(Name::from_raw_parts(u32::MAX, 0, 0).is_none());
    }

    #[test]
    fn none_name() {
        assert_eq!(Name::NONE.to_string(), "None");
        assert_eq!(Name::new("none"), Name::NONE);
    }
}
