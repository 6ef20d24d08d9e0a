//! Dynamic value representation for TSON data.
//!
//! This module provides the [`TsonValue`] enum which represents any valid TSON value.
//! It's useful for working with TSON data when the structure isn't known at compile time.
//!
//! ## Core Types
//!
//! - [`TsonValue`]: An enum with one variant per grammar production (null, bool,
//!   number, char, string, date/time, enum, sequence, map, tuple, record,
//!   multi-dimensional array)
//! - [`Number`]: A signed, unsigned or floating-point number
//!
//! ## Usage Patterns
//!
//! ### Creating Values
//!
//! ```rust
//! use serde_tson::{tson, TsonValue};
//!
//! // From primitives
//! let null = TsonValue::Null;
//! let boolean = TsonValue::from(true);
//! let number = TsonValue::from(42);
//! let text = TsonValue::from("hello");
//!
//! // Using the tson! macro
//! let record = tson!({
//!     "name": "Alice",
//!     "age": 30
//! });
//! assert!(record.is_record());
//! ```
//!
//! ### Reading Exact Values from Text
//!
//! [`value_from_str`](crate::value_from_str) decodes text without a target type
//! and keeps every production apart:
//!
//! ```rust
//! use serde_tson::{value_from_str, Kind};
//!
//! let value = value_from_str("(Item1:1,Item2:\"x\")").unwrap();
//! assert_eq!(value.kind(), Kind::Tuple);
//! assert_eq!(value.to_string(), "(Item1:1,Item2:\"x\")");
//! ```

use crate::grammar::{
    format_datetime, DATETIME_TOKEN, ENUM_TOKEN, MULTIARRAY_TOKEN, RECORD_TOKEN,
};
use crate::{Kind, TsonMap, TsonSettings};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A dynamically-typed representation of any valid TSON value.
///
/// # Examples
///
/// ```rust
/// use serde_tson::{TsonValue, Number};
///
/// let null = TsonValue::Null;
/// let num = TsonValue::Number(Number::Int(42));
/// let text = TsonValue::String("hello".to_string());
///
/// assert!(null.is_null());
/// assert!(num.is_number());
/// assert!(text.is_string());
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum TsonValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    Char(char),
    String(String),
    DateTime(DateTime<Utc>),
    /// A unit enum variant. The ordinal is `None` when the value was read from
    /// text, which only carries the name.
    Enum {
        name: String,
        ordinal: Option<u32>,
    },
    Sequence(Vec<TsonValue>),
    /// Map entries in text order. Keys may be any value.
    Map(Vec<(TsonValue, TsonValue)>),
    Tuple(Vec<TsonValue>),
    Record(TsonMap),
    /// Dimension sizes plus the elements in row-major order.
    MultiArray {
        dims: Vec<usize>,
        data: Vec<TsonValue>,
    },
}

/// A numeric value: signed, unsigned or floating point.
///
/// Non-negative integers that fit in an `i64` are always stored as [`Number::Int`];
/// [`Number::UInt`] only holds values above `i64::MAX`.
///
/// # Examples
///
/// ```rust
/// use serde_tson::Number;
///
/// let integer = Number::from(42u8);
/// let float = Number::Float(3.5);
///
/// assert!(integer.is_integer());
/// assert_eq!(integer.as_i64(), Some(42));
/// assert_eq!(float.as_f64(), 3.5);
/// assert_eq!(Number::from(u64::MAX).as_u64(), Some(u64::MAX));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl Number {
    /// Returns `true` if this is an integer value.
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Int(_) | Number::UInt(_))
    }

    /// Returns `true` if this is a floating-point value.
    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Returns `true` for zero of any representation.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Number::Int(i) => *i == 0,
            Number::UInt(u) => *u == 0,
            Number::Float(f) => *f == 0.0,
        }
    }

    /// Converts this number to an `i64` if it is an integer in range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tson::Number;
    ///
    /// assert_eq!(Number::Int(-7).as_i64(), Some(-7));
    /// assert_eq!(Number::UInt(u64::MAX).as_i64(), None);
    /// assert_eq!(Number::Float(42.0).as_i64(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int(i) => Some(*i),
            Number::UInt(u) => i64::try_from(*u).ok(),
            Number::Float(_) => None,
        }
    }

    /// Converts this number to a `u64` if it is a non-negative integer.
    #[inline]
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Number::Int(i) => u64::try_from(*i).ok(),
            Number::UInt(u) => Some(*u),
            Number::Float(_) => None,
        }
    }

    /// Converts this number to an `f64`, possibly losing precision.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::UInt(u) => *u as f64,
            Number::Float(f) => *f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::UInt(u) => write!(f, "{}", u),
            // Debug keeps a fractional part (`1.0`), so floats stay floats.
            Number::Float(fl) => write!(f, "{:?}", fl),
        }
    }
}

macro_rules! number_from_signed {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Number::Int(value as i64)
                }
            }
        )*
    };
}

macro_rules! number_from_unsigned {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Number::from(value as u64)
                }
            }
        )*
    };
}

number_from_signed!(i8, i16, i32, i64, isize);
number_from_unsigned!(u8, u16, u32, usize);

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Number::Int(i),
            Err(_) => Number::UInt(value),
        }
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        // Widen through the shortest decimal form so 0.1f32 prints as 0.1.
        Number::Float(value.to_string().parse().unwrap_or(value as f64))
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl TsonValue {
    /// Returns the grammar kind of this value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tson::{Kind, TsonValue};
    ///
    /// assert_eq!(TsonValue::from(1).kind(), Kind::Scalar);
    /// assert_eq!(TsonValue::from('x').kind(), Kind::Char);
    /// assert_eq!(TsonValue::Null.kind(), Kind::Null);
    /// ```
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            TsonValue::Null => Kind::Null,
            TsonValue::Bool(_) | TsonValue::Number(_) => Kind::Scalar,
            TsonValue::Char(_) => Kind::Char,
            TsonValue::String(_) => Kind::String,
            TsonValue::DateTime(_) => Kind::DateTime,
            TsonValue::Enum { .. } => Kind::Enum,
            TsonValue::Sequence(_) => Kind::Sequence,
            TsonValue::Map(_) => Kind::Map,
            TsonValue::Tuple(_) => Kind::Tuple,
            TsonValue::Record(_) => Kind::Record,
            TsonValue::MultiArray { .. } => Kind::MultiArray,
        }
    }

    /// Returns `true` if this value is its type's zero/empty value.
    ///
    /// Null, `False`, zero, the empty string, `'\0'`, the first enum variant and
    /// the Unix epoch are defaults. Composite values never are.
    #[must_use]
    pub fn is_default(&self) -> bool {
        match self {
            TsonValue::Null => true,
            TsonValue::Bool(b) => !b,
            TsonValue::Number(n) => n.is_zero(),
            TsonValue::Char(c) => *c == '\0',
            TsonValue::String(s) => s.is_empty(),
            TsonValue::DateTime(dt) => *dt == DateTime::<Utc>::default(),
            TsonValue::Enum { ordinal, .. } => *ordinal == Some(0),
            _ => false,
        }
    }

    /// Returns `true` if the value is null.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, TsonValue::Null)
    }

    /// Returns `true` if the value is a boolean.
    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, TsonValue::Bool(_))
    }

    /// Returns `true` if the value is a number.
    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, TsonValue::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_char(&self) -> bool {
        matches!(self, TsonValue::Char(_))
    }

    /// Returns `true` if the value is a string.
    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, TsonValue::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_datetime(&self) -> bool {
        matches!(self, TsonValue::DateTime(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_enum(&self) -> bool {
        matches!(self, TsonValue::Enum { .. })
    }

    /// Returns `true` if the value is a sequence.
    #[inline]
    #[must_use]
    pub const fn is_sequence(&self) -> bool {
        matches!(self, TsonValue::Sequence(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, TsonValue::Map(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_tuple(&self) -> bool {
        matches!(self, TsonValue::Tuple(_))
    }

    /// Returns `true` if the value is a record.
    #[inline]
    #[must_use]
    pub const fn is_record(&self) -> bool {
        matches!(self, TsonValue::Record(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_multi_array(&self) -> bool {
        matches!(self, TsonValue::MultiArray { .. })
    }

    /// If the value is a boolean, returns it. Otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tson::TsonValue;
    ///
    /// assert_eq!(TsonValue::Bool(true).as_bool(), Some(true));
    /// assert_eq!(TsonValue::from(42).as_bool(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TsonValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is an integer that fits in `i64`, returns it.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TsonValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            TsonValue::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    /// If the value is a number, returns it as `f64`.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TsonValue::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_char(&self) -> Option<char> {
        match self {
            TsonValue::Char(c) => Some(*c),
            _ => None,
        }
    }

    /// If the value is a string, returns a reference to it. Otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tson::TsonValue;
    ///
    /// assert_eq!(TsonValue::from("hello").as_str(), Some("hello"));
    /// assert_eq!(TsonValue::from(42).as_str(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            TsonValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// If the value is a sequence, returns its elements.
    #[inline]
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[TsonValue]> {
        match self {
            TsonValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&[(TsonValue, TsonValue)]> {
        match self {
            TsonValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// If the value is a record, returns its fields.
    #[inline]
    #[must_use]
    pub fn as_record(&self) -> Option<&TsonMap> {
        match self {
            TsonValue::Record(fields) => Some(fields),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_record_mut(&mut self) -> Option<&mut TsonMap> {
        match self {
            TsonValue::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Looks up a record field by name.
    ///
    /// Returns `None` for missing fields and for values that are not records.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tson::tson;
    ///
    /// let user = tson!({ "name": "Ann" });
    /// assert_eq!(user.get("name").and_then(|v| v.as_str()), Some("Ann"));
    /// assert!(user.get("age").is_none());
    /// ```
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TsonValue> {
        self.as_record().and_then(|fields| fields.get(name))
    }
}

/// Formats the value as compact TSON.
impl fmt::Display for TsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut output = String::new();
        crate::ser::write_value(&mut output, self, &TsonSettings::new(), 0);
        f.write_str(&output)
    }
}

impl Serialize for TsonValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            TsonValue::Null => serializer.serialize_unit(),
            TsonValue::Bool(b) => serializer.serialize_bool(*b),
            TsonValue::Number(Number::Int(i)) => serializer.serialize_i64(*i),
            TsonValue::Number(Number::UInt(u)) => serializer.serialize_u64(*u),
            TsonValue::Number(Number::Float(f)) => serializer.serialize_f64(*f),
            TsonValue::Char(c) => serializer.serialize_char(*c),
            TsonValue::String(s) => serializer.serialize_str(s),
            TsonValue::DateTime(dt) => {
                serializer.serialize_newtype_struct(DATETIME_TOKEN, &format_datetime(dt))
            }
            TsonValue::Enum { name, .. } => {
                serializer.serialize_newtype_struct(ENUM_TOKEN, name.as_str())
            }
            TsonValue::Sequence(items) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for element in items {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            TsonValue::Map(entries) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            TsonValue::Tuple(items) => {
                use serde::ser::SerializeTuple;
                let mut tuple = serializer.serialize_tuple(items.len())?;
                for element in items {
                    tuple.serialize_element(element)?;
                }
                tuple.end()
            }
            TsonValue::Record(fields) => serializer.serialize_newtype_struct(RECORD_TOKEN, fields),
            TsonValue::MultiArray { dims, data } => {
                use serde::ser::SerializeStruct;
                let mut array = serializer.serialize_struct(MULTIARRAY_TOKEN, 2)?;
                array.serialize_field("dims", dims)?;
                array.serialize_field("data", data)?;
                array.end()
            }
        }
    }
}

/// Reads a value through the self-describing serde path.
///
/// This works with any serde format. Through TSON it cannot tell a tuple from
/// a sequence, a string-keyed map from a record, or a date/time from a string;
/// use [`value_from_str`](crate::value_from_str) when those distinctions matter.
impl<'de> Deserialize<'de> for TsonValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, VariantAccess, Visitor};

        struct TsonValueVisitor;

        impl<'de> Visitor<'de> for TsonValueVisitor {
            type Value = TsonValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid TSON value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(TsonValue::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(TsonValue::Number(Number::Int(value)))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E> {
                Ok(TsonValue::Number(Number::from(value)))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(TsonValue::Number(Number::Float(value)))
            }

            fn visit_char<E>(self, value: char) -> Result<Self::Value, E> {
                Ok(TsonValue::Char(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(TsonValue::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(TsonValue::String(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(TsonValue::Null)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(TsonValue::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(TsonValue::Sequence(vec))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut entries: Vec<(TsonValue, TsonValue)> = Vec::new();
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                if entries.iter().all(|(k, _)| k.is_string()) {
                    let fields = entries
                        .into_iter()
                        .filter_map(|(k, v)| match k {
                            TsonValue::String(name) => Some((name, v)),
                            _ => None,
                        })
                        .collect();
                    Ok(TsonValue::Record(fields))
                } else {
                    Ok(TsonValue::Map(entries))
                }
            }

            fn visit_enum<A>(self, data: A) -> Result<Self::Value, A::Error>
            where
                A: de::EnumAccess<'de>,
            {
                let (name, variant): (String, _) = data.variant()?;
                variant.unit_variant()?;
                Ok(TsonValue::Enum {
                    name,
                    ordinal: None,
                })
            }
        }

        deserializer.deserialize_any(TsonValueVisitor)
    }
}

fn mismatch(expected: &str, value: &TsonValue) -> crate::Error {
    crate::Error::type_mismatch(None, expected, &value.to_string())
}

impl TryFrom<TsonValue> for i64 {
    type Error = crate::Error;

    fn try_from(value: TsonValue) -> crate::Result<Self> {
        value.as_i64().ok_or_else(|| mismatch("i64", &value))
    }
}

impl TryFrom<TsonValue> for u64 {
    type Error = crate::Error;

    fn try_from(value: TsonValue) -> crate::Result<Self> {
        value.as_u64().ok_or_else(|| mismatch("u64", &value))
    }
}

impl TryFrom<TsonValue> for f64 {
    type Error = crate::Error;

    fn try_from(value: TsonValue) -> crate::Result<Self> {
        value.as_f64().ok_or_else(|| mismatch("f64", &value))
    }
}

impl TryFrom<TsonValue> for bool {
    type Error = crate::Error;

    fn try_from(value: TsonValue) -> crate::Result<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", &value))
    }
}

impl TryFrom<TsonValue> for char {
    type Error = crate::Error;

    fn try_from(value: TsonValue) -> crate::Result<Self> {
        value.as_char().ok_or_else(|| mismatch("char", &value))
    }
}

impl TryFrom<TsonValue> for String {
    type Error = crate::Error;

    fn try_from(value: TsonValue) -> crate::Result<Self> {
        match value {
            TsonValue::String(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl TryFrom<TsonValue> for DateTime<Utc> {
    type Error = crate::Error;

    fn try_from(value: TsonValue) -> crate::Result<Self> {
        value
            .as_datetime()
            .copied()
            .ok_or_else(|| mismatch("date/time", &value))
    }
}

impl From<bool> for TsonValue {
    fn from(value: bool) -> Self {
        TsonValue::Bool(value)
    }
}

macro_rules! value_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for TsonValue {
                fn from(value: $ty) -> Self {
                    TsonValue::Number(Number::from(value))
                }
            }
        )*
    };
}

value_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<Number> for TsonValue {
    fn from(value: Number) -> Self {
        TsonValue::Number(value)
    }
}

impl From<char> for TsonValue {
    fn from(value: char) -> Self {
        TsonValue::Char(value)
    }
}

impl From<String> for TsonValue {
    fn from(value: String) -> Self {
        TsonValue::String(value)
    }
}

impl From<&str> for TsonValue {
    fn from(value: &str) -> Self {
        TsonValue::String(value.to_string())
    }
}

impl From<DateTime<Utc>> for TsonValue {
    fn from(value: DateTime<Utc>) -> Self {
        TsonValue::DateTime(value)
    }
}

impl From<Vec<TsonValue>> for TsonValue {
    fn from(value: Vec<TsonValue>) -> Self {
        TsonValue::Sequence(value)
    }
}

impl From<TsonMap> for TsonValue {
    fn from(value: TsonMap) -> Self {
        TsonValue::Record(value)
    }
}

impl<T: Into<TsonValue>> From<Option<T>> for TsonValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(TsonValue::Null, Into::into)
    }
}
