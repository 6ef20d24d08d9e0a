//! Error types for TSON serialization, deserialization and the record store.
//!
//! This module provides error reporting with enough context to find the
//! offending part of a document or record file.
//!
//! ## Error Categories
//!
//! - **Format Errors**: malformed brackets, quotes or delimiters, with the byte
//!   offset where the problem was detected and a short preview of the text there
//! - **Type Mismatches**: a decoded value cannot be assigned to the target type
//! - **Unknown Members**: a field name with no matching member (only surfaced for
//!   targets that deny unknown fields)
//! - **Record Store Errors**: duplicate or missing segment ids, invalid ids
//! - **Member Errors**: a member failed to encode; the member name and the Rust
//!   type of its value are attached and the original error is kept as the source
//! - **I/O Errors**: file reading/writing failures
//!
//! ## Member Paths
//!
//! Decode errors are not nested. When an error leaves a record, sequence, map or
//! tuple, the member name (or `[index]`) is prepended to the error's `path`, so the
//! caller receives one error such as:
//!
//! ```text
//! Type mismatch at offset 17 in `order.items[1].qty`: expected u32, found "x"
//! ```
//!
//! ## Examples
//!
//! ```rust
//! use serde_tson::{from_str, Error};
//!
//! let result: Result<Vec<i32>, Error> = from_str("[1,2");
//! assert!(matches!(result, Err(Error::Format { .. })));
//! ```

use std::fmt;
use thiserror::Error;

/// Number of characters of source text kept in a format error preview.
const PREVIEW_LEN: usize = 24;

/// Represents all possible errors that can occur while encoding, decoding or
/// maintaining a TSON record file.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Structural problem in the text (brackets, quotes, delimiters)
    #[error("Format error at offset {offset}{}: {msg}\n  near: {preview}", in_path(.path))]
    Format {
        offset: usize,
        path: String,
        msg: String,
        preview: String,
    },

    /// A decoded value does not fit the target type
    #[error("Type mismatch{}{}: expected {expected}, found {found}", at_offset(.offset), in_path(.path))]
    TypeMismatch {
        offset: Option<usize>,
        path: String,
        expected: String,
        found: String,
    },

    /// A field name with no matching member on the target type
    #[error("Unknown member `{name}`")]
    UnknownMember { name: String },

    /// A segment id that already exists in the record file
    #[error("Duplicate segment id `{id}`")]
    DuplicateId { id: String },

    /// A segment id that does not exist in the record file
    #[error("No segment with id `{id}`")]
    MissingSegment { id: String },

    /// A segment id that is empty, not alphanumeric, or reserved
    #[error("Invalid segment id {id:?}: {reason}")]
    InvalidId { id: String, reason: String },

    /// A member of a record failed to encode
    #[error("Failed to encode member `{member}` of type {type_name}: {source}")]
    Member {
        member: String,
        type_name: String,
        #[source]
        source: Box<Error>,
    },

    /// Unsupported type for serialization
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),

    /// Generic message
    #[error("{0}")]
    Message(String),
}

fn in_path(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" in `{}`", path)
    }
}

fn at_offset(offset: &Option<usize>) -> String {
    offset.map(|o| format!(" at offset {}", o)).unwrap_or_default()
}

fn preview(text: &str, offset: usize) -> String {
    let rest = text.get(offset..).unwrap_or("");
    let mut out: String = rest.chars().take(PREVIEW_LEN).collect();
    if rest.chars().nth(PREVIEW_LEN).is_some() {
        out.push_str("...");
    }
    out
}

impl Error {
    /// Creates a format error for `text` detected at byte `offset`.
    ///
    /// The error keeps a truncated preview of `text` starting at `offset`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tson::Error;
    ///
    /// let err = Error::format("{a:1", 4, "unterminated record");
    /// assert!(err.to_string().contains("offset 4"));
    /// ```
    pub fn format(text: &str, offset: usize, msg: &str) -> Self {
        Error::Format {
            offset,
            path: String::new(),
            msg: msg.to_string(),
            preview: preview(text, offset),
        }
    }

    /// Creates a type mismatch error when a span cannot be read as `expected`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tson::Error;
    ///
    /// let err = Error::type_mismatch(Some(3), "i32", "\"abc\"");
    /// assert!(err.to_string().contains("expected i32"));
    /// ```
    pub fn type_mismatch(offset: Option<usize>, expected: &str, found: &str) -> Self {
        Error::TypeMismatch {
            offset,
            path: String::new(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Creates an error for a rejected segment id.
    pub fn invalid_id(id: &str, reason: &str) -> Self {
        Error::InvalidId {
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Wraps an encoding failure with the member it happened in.
    pub fn member(member: &str, type_name: &str, source: Error) -> Self {
        Error::Member {
            member: member.to_string(),
            type_name: type_name.to_string(),
            source: Box::new(source),
        }
    }

    /// Creates an unsupported type error for values that have no TSON form.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tson::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for file reading/writing failures.
    pub fn io<T: fmt::Display>(msg: T) -> Self {
        Error::Io(msg.to_string())
    }

    /// Prepends a member name (or `[index]`) to the path of a decode error.
    ///
    /// Errors without a path are returned unchanged.
    #[must_use]
    pub fn at_member(mut self, segment: &str) -> Self {
        if let Error::Format { path, .. } | Error::TypeMismatch { path, .. } = &mut self {
            *path = if path.is_empty() {
                segment.to_string()
            } else if path.starts_with('[') {
                format!("{}{}", segment, path)
            } else {
                format!("{}.{}", segment, path)
            };
        }
        self
    }

    /// Fills in the offset of a type mismatch raised without one.
    #[must_use]
    pub fn at_offset(mut self, at: usize) -> Self {
        if let Error::TypeMismatch { offset, .. } = &mut self {
            if offset.is_none() {
                *offset = Some(at);
            }
        }
        self
    }

    /// The member path of a decode error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::Format { path, .. } | Error::TypeMismatch { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    fn invalid_type(unexp: serde::de::Unexpected, exp: &dyn serde::de::Expected) -> Self {
        Error::type_mismatch(None, &exp.to_string(), &unexp.to_string())
    }

    fn invalid_value(unexp: serde::de::Unexpected, exp: &dyn serde::de::Expected) -> Self {
        Error::type_mismatch(None, &exp.to_string(), &unexp.to_string())
    }

    fn unknown_field(field: &str, _expected: &'static [&'static str]) -> Self {
        Error::UnknownMember {
            name: field.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
