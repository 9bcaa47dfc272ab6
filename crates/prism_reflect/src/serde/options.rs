use crate::Diagnostics;
use crate::info::EnumDescriptor;

/// What decoding does with an enum name the descriptor does not know.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EnumPolicy {
    /// Store the enum's `_MAX` sentinel and record one warning.
    #[default]
    Lenient,
    /// Fail the conversion.
    Strict,
}

/// Switches for the deserialize drivers.
///
/// The binary archive decodes with [`lenient`](Self::lenient) options, JSON
/// with [`strict`](Self::strict) ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub enum_policy: EnumPolicy,
    /// Compact formats only: enums were stored as their underlying integer
    /// instead of by name. Never used when writing.
    pub legacy_enum_values: bool,
}

impl DecodeOptions {
    #[inline]
    pub const fn lenient() -> Self {
        Self {
            enum_policy: EnumPolicy::Lenient,
            legacy_enum_values: false,
        }
    }

    #[inline]
    pub const fn strict() -> Self {
        Self {
            enum_policy: EnumPolicy::Strict,
            legacy_enum_values: false,
        }
    }

    #[inline]
    pub const fn with_legacy_enum_values(mut self, legacy: bool) -> Self {
        self.legacy_enum_values = legacy;
        self
    }
}

/// Mutable state shared by every seed of one decode call.
#[derive(Debug, Default)]
pub struct DecodeContext {
    options: DecodeOptions,
    diagnostics: Diagnostics,
}

impl DecodeContext {
    #[inline]
    pub const fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            diagnostics: Diagnostics::new(),
        }
    }

    #[inline]
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    #[inline]
    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    #[inline]
    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Resolves an enum name under the configured policy.
    ///
    /// The error is the message for the caller's error type.
    pub(crate) fn resolve_enum(
        &mut self,
        descriptor: &EnumDescriptor,
        name: &str,
    ) -> Result<i64, String> {
        if let Some(value) = descriptor.value_of(name) {
            return Ok(value);
        }
        let message = format!("`{name}` is not a valid name for enum `{}`", descriptor.name());
        match self.options.enum_policy {
            EnumPolicy::Strict => Err(message),
            EnumPolicy::Lenient => Ok(self.fall_back(descriptor, message)),
        }
    }

    /// Checks a legacy integer enum value under the configured policy.
    pub(crate) fn resolve_enum_value(
        &mut self,
        descriptor: &EnumDescriptor,
        value: i128,
    ) -> Result<i64, String> {
        if let Ok(value) = i64::try_from(value)
            && descriptor.is_valid_value(value)
        {
            return Ok(value);
        }
        let message = format!("{value} is not a valid value for enum `{}`", descriptor.name());
        match self.options.enum_policy {
            EnumPolicy::Strict => Err(message),
            EnumPolicy::Lenient => Ok(self.fall_back(descriptor, message)),
        }
    }

    fn fall_back(&mut self, descriptor: &EnumDescriptor, message: String) -> i64 {
        let sentinel = descriptor.sentinel();
        self.diagnostics
            .warn(format!("{message}, using `{}`", sentinel.name()));
        sentinel.value()
    }
}

#[cfg(test)]
mod tests {
    use super::{DecodeContext, DecodeOptions};
    use crate::info::EnumDescriptor;

    #[test]
    fn enum_policies() {
        let e = EnumDescriptor::from_names("ETag", ["Idle", "Run"]);

        let mut lenient = DecodeContext::new(DecodeOptions::lenient());
        assert_eq!(lenient.resolve_enum(&e, "Run"), Ok(1));
        assert_eq!(lenient.resolve_enum(&e, "Jump"), Ok(2));
        assert_eq!(lenient.diagnostics().len(), 1);

        let mut strict = DecodeContext::new(DecodeOptions::strict());
        assert!(strict.resolve_enum(&e, "Jump").is_err());
        assert!(strict.diagnostics().is_empty());
    }

    #[test]
    fn legacy_values_are_checked() {
        let e = EnumDescriptor::from_names("ETag", ["Idle", "Run"]);

        let mut lenient = DecodeContext::new(DecodeOptions::lenient());
        assert_eq!(lenient.resolve_enum_value(&e, 1), Ok(1));
        assert_eq!(lenient.resolve_enum_value(&e, 40), Ok(2));
        assert_eq!(lenient.diagnostics().len(), 1);

        let mut strict = DecodeContext::new(DecodeOptions::strict());
        assert!(strict.resolve_enum_value(&e, -1).is_err());
    }
}
