//! Recoverable problems reported by a conversion that still succeeded.

use core::cell::RefCell;
use core::fmt;

use crate::path;

/// How bad a [`Diagnostic`] is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Data was substituted or ignored, the conversion went on.
    Warning,
    /// Data was lost, the conversion went on.
    Error,
}

/// One recoverable problem, with the property path it occurred at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Property path such as `Inventory.Slots[2]`, empty at top level.
    pub path: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        if self.path.is_empty() {
            write!(f, "{severity}: {}", self.message)
        } else {
            write!(f, "{severity}: {} (at `{}`)", self.message, self.path)
        }
    }
}

/// The diagnostics collected by one conversion.
///
/// Every entry is also sent to the `log` facade when it is recorded.
///
/// # Examples
///
/// ```
/// use prism_reflect::{Diagnostics, Severity};
///
/// let mut diagnostics = Diagnostics::new();
/// diagnostics.warn("`Fly` is not a valid name for enum `EMoveState`");
///
/// assert_eq!(diagnostics.len(), 1);
/// assert_eq!(diagnostics.iter().next().unwrap().severity, Severity::Warning);
/// assert!(!diagnostics.has_errors());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Records a warning at the current property path.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message.into());
    }

    /// Records an error at the current property path.
    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message.into());
    }

    fn push(&mut self, severity: Severity, message: String) {
        let entry = Diagnostic {
            severity,
            path: path::current(),
            message,
        };
        match severity {
            Severity::Warning => log::warn!("{entry}"),
            Severity::Error => log::error!("{entry}"),
        }
        self.entries.push(entry);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|e| e.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|e| e.severity == Severity::Warning)
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Appends the entries of `other` without logging them again.
    pub fn append(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    #[inline]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = alloc::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = core::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// -----------------------------------------------------------------------------
// Serialize-side sink

std::thread_local! {
    static SINK: RefCell<Option<Diagnostics>> = const { RefCell::new(None) };
}

/// Runs `f` and returns what it reported through [`report_error`].
///
/// `Serialize` impls carry no context, so encoders report through this
/// thread-local scope instead.
pub(crate) fn collect<R>(f: impl FnOnce() -> R) -> (R, Diagnostics) {
    let outer = SINK.replace(Some(Diagnostics::new()));
    let result = f();
    let collected = SINK.replace(outer).unwrap_or_default();
    (result, collected)
}

/// Records an error in the innermost [`collect`] scope, or only logs it
/// outside of one.
pub(crate) fn report_error(message: String) {
    SINK.with_borrow_mut(|sink| match sink {
        Some(diagnostics) => diagnostics.error(message),
        None => log::error!("{}", path::describe(message)),
    });
}

#[cfg(test)]
mod tests {
    use super::{Severity, collect, report_error};

    #[test]
    fn reports_go_to_the_innermost_scope() {
        report_error(String::from("dropped"));

        let ((), outer) = collect(|| {
            report_error(String::from("outer"));
            let ((), inner) = collect(|| report_error(String::from("inner")));
            assert_eq!(inner.len(), 1);
            assert_eq!(inner.iter().next().unwrap().message, "inner");
        });

        let entries = outer.into_vec();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "outer");
        assert_eq!(entries[0].severity, Severity::Error);
    }
}
