use core::fmt::Display;

use serde_core::de::Error;

use crate::path;

/// A helper function for generating a custom deserialization error message.
///
/// This function should be preferred over [`Error::custom`] as it appends the
/// property path being decoded.
#[inline]
pub(super) fn make_custom_error<E: Error>(msg: impl Display) -> E {
    E::custom(path::describe(msg))
}
