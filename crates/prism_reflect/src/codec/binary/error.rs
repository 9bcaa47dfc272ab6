use core::fmt::Display;
use std::io;

use serde_core::{de, ser};
use thiserror::Error;

/// Failure of a binary archive conversion.
///
/// Any error while reading leaves the destination partially decoded; it
/// should be discarded.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BinaryError {
    #[error("unexpected end of archive at offset {offset}, {needed} more byte(s) needed")]
    UnexpectedEof { offset: usize, needed: usize },
    #[error("{0} trailing byte(s) after the value")]
    TrailingBytes(usize),
    #[error("invalid UTF-8 string at offset {0}")]
    InvalidUtf8(usize),
    #[error("invalid {what} tag {tag} at offset {offset}")]
    InvalidTag {
        what: &'static str,
        tag: u32,
        offset: usize,
    },
    #[error("sequences and maps must know their length up front")]
    LengthRequired,
    #[error("length {0} does not fit in 32 bits")]
    LengthOverflow(usize),
    #[error("{0} is not supported by the binary archive")]
    Unsupported(&'static str),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{0}")]
    Custom(String),
}

impl ser::Error for BinaryError {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}

impl de::Error for BinaryError {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}
