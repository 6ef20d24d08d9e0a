//! # serde_tson
//!
//! A Serde-compatible serialization library for TSON (Typed Serialized Object
//! Notation), plus a store that keeps several independently encoded records
//! in one text file.
//!
//! ## What is TSON?
//!
//! TSON is a human-readable text format that keeps the shape of typed values:
//! records, sequences, maps with arbitrary keys, tuples, multi-dimensional
//! arrays, chars, date/times and enum variants each have their own syntax.
//!
//! ```text
//! {name:"Alice",age:30,admin:True}        record
//! [1,2,3]                                 sequence
//! [1:"one",@[2,3]:"many"]                 map, `@` marks a composite key
//! (Item1:1,Item2:"x")                     tuple
//! [<2,2>1,2,3,4]                          2x2 array, row-major
//! 'c'  "15.01.2024 10:30:00.000000000"    char, date/time
//! ()                                      null
//! ```
//!
//! Whitespace outside string and char literals is insignificant.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_tson::{from_str, to_string};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     active: bool,
//! }
//!
//! let user = User { id: 123, name: "Alice".to_string(), active: true };
//!
//! let text = to_string(&user).unwrap();
//! assert_eq!(text, "{id:123,name:\"Alice\",active:True}");
//!
//! let user_back: User = from_str(&text).unwrap();
//! assert_eq!(user, user_back);
//! ```
//!
//! ### Settings
//!
//! [`TsonSettings`] switches on tab indentation and controls which members are
//! written: null members, default-valued members, and members marked
//! [`Ignored`]. A [`TypeConfig`] member lists members a type never writes.
//!
//! ### Record files
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_tson::{append_to_file, from_appended_with_shared, set_shared, TsonSettings};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Limits { soft: u32, hard: u32 }
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("limits.tson");
//! let settings = TsonSettings::new();
//!
//! append_to_file(&path, &Limits { soft: 1, hard: 2 }, "alice", settings).unwrap();
//! set_shared(&path, &Limits { soft: 0, hard: 9 }, settings).unwrap();
//!
//! // Shared fields override the record's own; `soft: 0` is a default and was not stored.
//! let limits: Limits = from_appended_with_shared(&path, "alice").unwrap();
//! assert_eq!(limits, Limits { soft: 1, hard: 9 });
//! ```
//!
//! ### Dynamic values
//!
//! ```rust
//! use serde_tson::{tson, value_from_str, TsonValue};
//!
//! let data = tson!({ "name": "Alice", "tags": ["rust", "serde"] });
//! assert_eq!(data.get("name").and_then(TsonValue::as_str), Some("Alice"));
//!
//! let parsed = value_from_str("(Item1:'a',Item2:[<1,2>1,2])").unwrap();
//! assert!(parsed.is_tuple());
//! ```

pub mod array;
pub mod de;
pub mod error;
pub mod grammar;
pub mod kind;
pub mod macros;
pub mod map;
pub mod markers;
pub mod scan;
pub mod ser;
pub mod settings;
pub mod store;
pub mod value;

pub use array::{MultiArray, Odometer};
pub use de::{Deserializer, Renames};
pub use error::{Error, Result};
pub use grammar::strip_whitespace;
pub use kind::{classify, classify_type, Kind, KindRegistry};
pub use map::TsonMap;
pub use markers::{datetime, Ignored, TypeConfig};
pub use ser::{to_value_with_settings, Serializer, ValueSerializer};
pub use settings::TsonSettings;
pub use store::{
    append_to_file, contains_id, from_appended, from_appended_with_shared, rewrite_appended,
    segment_ids, set_shared, SHARED_ID,
};
pub use value::{Number, TsonValue};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

/// Serialize any `T: Serialize` to a compact TSON string.
///
/// # Examples
///
/// ```rust
/// use serde_tson::to_string;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let point = Point { x: 1, y: 2 };
/// assert_eq!(to_string(&point).unwrap(), "{x:1,y:2}");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized (e.g., a map key that
/// fails to encode). Member failures name the member and its type.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_settings(value, TsonSettings::new())
}

/// Serialize any `T: Serialize` to a tab-indented TSON string.
///
/// # Examples
///
/// ```rust
/// use serde_tson::to_string_pretty;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let point = Point { x: 1, y: 2 };
/// assert_eq!(to_string_pretty(&point).unwrap(), "{\n\tx: 1,\n\ty: 2\n}");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_pretty<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_settings(value, TsonSettings::pretty())
}

/// Serialize any `T: Serialize` to a TSON string with custom settings.
///
/// # Examples
///
/// ```rust
/// use serde_tson::{to_string_with_settings, TsonSettings};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Profile { name: String, nickname: Option<String> }
///
/// let profile = Profile { name: "Ann".into(), nickname: None };
/// let settings = TsonSettings::new().with_ignore_null_values(true);
/// assert_eq!(to_string_with_settings(&profile, settings).unwrap(), "{name:\"Ann\"}");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_settings<T>(value: &T, settings: TsonSettings) -> Result<String>
where
    T: ?Sized + Serialize,
{
    let mut serializer = Serializer::new(settings);
    value.serialize(&mut serializer)?;
    Ok(serializer.into_inner())
}

/// Convert any `T: Serialize` to a [`TsonValue`].
///
/// # Examples
///
/// ```rust
/// use serde_tson::{to_value, TsonValue};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let value: TsonValue = to_value(&Point { x: 1, y: 2 }).unwrap();
/// assert!(value.is_record());
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<TsonValue>
where
    T: ?Sized + Serialize,
{
    to_value_with_settings(value, TsonSettings::new())
}

/// Serialize any `T: Serialize` to a writer in compact TSON.
///
/// # Examples
///
/// ```rust
/// use serde_tson::to_writer;
///
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &(1, 'a')).unwrap();
/// assert_eq!(buffer, b"(Item1:1,Item2:'a')");
/// ```
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    to_writer_with_settings(writer, value, TsonSettings::new())
}

/// Serialize any `T: Serialize` to a writer in TSON with custom settings.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_settings<W, T>(mut writer: W, value: &T, settings: TsonSettings) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let text = to_string_with_settings(value, settings)?;
    writer.write_all(text.as_bytes()).map_err(Error::io)?;
    Ok(())
}

/// Serialize any `T: Serialize` into the file at `path`, replacing its contents.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_file<P, T>(path: P, value: &T, settings: TsonSettings) -> Result<()>
where
    P: AsRef<Path>,
    T: ?Sized + Serialize,
{
    let path = path.as_ref();
    let text = to_string_with_settings(value, settings)?;
    fs::write(path, text).map_err(|e| Error::io(format!("write {}: {}", path.display(), e)))
}

/// Deserialize an instance of type `T` from TSON text.
///
/// Whitespace outside literals is removed first; error offsets refer to the
/// stripped text.
///
/// # Examples
///
/// ```rust
/// use serde_tson::from_str;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_str("{\n\tx: 1,\n\ty: 2\n}").unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns [`Error::Format`] for malformed text and [`Error::TypeMismatch`]
/// when a value does not fit its target, both with the member path.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let text = strip_whitespace(s);
    T::deserialize(Deserializer::from_str(&text))
}

/// Deserialize like [`from_str`], translating record field names through
/// `renames` (source name to member name) first.
///
/// # Examples
///
/// ```rust
/// use serde_tson::{from_str_with_renames, Renames};
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let renames: Renames = [("PosX".to_string(), "x".to_string())].into_iter().collect();
/// let point: Point = from_str_with_renames("{PosX:1,y:2}", &renames).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Same as [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str_with_renames<T>(s: &str, renames: &Renames) -> Result<T>
where
    T: DeserializeOwned,
{
    let text = strip_whitespace(s);
    T::deserialize(Deserializer::from_str(&text).with_renames(renames))
}

/// Deserialize an instance of type `T` from an I/O stream of TSON.
///
/// # Examples
///
/// ```rust
/// use serde_tson::from_reader;
/// use std::io::Cursor;
///
/// let numbers: Vec<u8> = from_reader(Cursor::new(b"[1, 2, 3]")).unwrap();
/// assert_eq!(numbers, vec![1, 2, 3]);
/// ```
///
/// # Errors
///
/// Returns an error if reading from the reader fails, the input is not valid
/// TSON, or the data cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut string = String::new();
    reader.read_to_string(&mut string).map_err(Error::io)?;
    from_str(&string)
}

/// Deserialize an instance of type `T` from bytes of TSON text.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8, not valid TSON, or
/// cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let s = std::str::from_utf8(v).map_err(Error::custom)?;
    from_str(s)
}

/// Deserialize an instance of type `T` from the file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its contents cannot be
/// deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_file<P, T>(path: P) -> Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| Error::io(format!("read {}: {}", path.display(), e)))?;
    from_str(&text)
}

/// Parse TSON text into a [`TsonValue`] without a target type.
///
/// Every production keeps its own variant: tuples, maps, chars, date/times
/// and multi-dimensional arrays are not folded into sequences or strings.
/// Bare names become [`TsonValue::Enum`] without an ordinal.
///
/// # Examples
///
/// ```rust
/// use serde_tson::{value_from_str, Kind};
///
/// let value = value_from_str("[@(Item1:1,Item2:2):Up]").unwrap();
/// let (key, variant) = &value.as_map().unwrap()[0];
/// assert_eq!(key.kind(), Kind::Tuple);
/// assert_eq!(variant.kind(), Kind::Enum);
/// ```
///
/// # Errors
///
/// Returns [`Error::Format`] for malformed text.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn value_from_str(s: &str) -> Result<TsonValue> {
    let text = strip_whitespace(s);
    Deserializer::from_str(&text).parse_value()
}
