use core::fmt;

use thiserror::Error;

use crate::info::PropertyKind;
use crate::ops::AccessError;
use crate::path;

/// Failure of a text import.
///
/// Errors raised below the top level of a property are wrapped in
/// [`TextError::At`], naming the property path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TextError {
    #[error("expected {expected} at offset {position}")]
    Syntax {
        position: usize,
        expected: &'static str,
    },
    #[error("`{text}` is not a valid {kind} value")]
    InvalidValue { kind: PropertyKind, text: String },
    #[error("`{text}` is out of range for {kind}")]
    OutOfRange { kind: PropertyKind, text: String },
    #[error("`{text}` is not accepted by struct `{structure}`")]
    Rejected { structure: String, text: String },
    #[error("unexpected trailing characters `{0}`")]
    TrailingCharacters(String),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("{error} (at `{path}`)")]
    At { path: String, error: Box<TextError> },
    #[error("{} cell(s) of the row could not be imported", .0.len())]
    Row(Vec<CellError>),
}

/// One failed cell of [`import_row`](super::import_row).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellError {
    /// Column name as given.
    pub field: String,
    pub error: TextError,
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.error)
    }
}

/// Attaches the current property path, if any.
pub(super) fn located(error: TextError) -> TextError {
    let path = path::current();
    if path.is_empty() {
        error
    } else {
        TextError::At {
            path,
            error: Box::new(error),
        }
    }
}

pub(super) fn invalid(kind: PropertyKind, text: &str) -> TextError {
    located(TextError::InvalidValue {
        kind,
        text: text.into(),
    })
}

pub(super) fn out_of_range(kind: PropertyKind, text: &str) -> TextError {
    located(TextError::OutOfRange {
        kind,
        text: text.into(),
    })
}
