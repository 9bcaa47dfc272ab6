use core::fmt;

/// Culture-invariant display text.
///
/// Text is presentation data. It round-trips through every codec as a plain
/// string, and the text codec marks it as `INVTEXT("...")` when delimited.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Text(String);

impl Text {
    #[inline]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for Text {
    #[inline]
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for Text {
    #[inline]
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
