//! Concrete formats built on the serde drivers.
//!
//! | Module | Data | Enums | Object handles |
//! |---|---|---|---|
//! | [`binary`] | native-endian bytes, same process | by name, lenient | raw values |
//! | [`json`] | `serde_json::Value` trees | by name, strict | `null` |
//! | [`text`] | the engine's single-line literal syntax | by name, lenient | raw values |
//!
//! The lenient codecs map unknown enum names to the `_MAX` sentinel and
//! report a warning in the returned [`Diagnostics`](crate::Diagnostics).

// -----------------------------------------------------------------------------
// Modules

pub mod binary;
pub mod json;
pub mod text;
