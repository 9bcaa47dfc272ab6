use core::fmt::Display;

use serde_core::ser::Error;

use crate::path;

/// A helper function for generating a custom serialization error message.
///
/// This function should be preferred over [`Error::custom`] as it appends
/// the path of the property being serialized.
#[inline]
pub(super) fn make_custom_error<E: Error>(msg: impl Display) -> E {
    E::custom(path::describe(msg))
}
