//! Member markers and serde helpers that steer the encoder.
//!
//! - [`Ignored`] marks a member that is left out of the output while
//!   [`TsonSettings::check_member_attributes`](crate::TsonSettings) is on.
//! - [`TypeConfig`] is a per-type configuration member listing members that
//!   are always left out. Its presence switches [`Ignored`] handling off for
//!   the record, and it is never written itself.
//! - [`datetime`] writes `chrono::DateTime<Utc>` members in the TSON date/time
//!   layout.
//!
//! Members removed on output are absent from the text, so they need a serde
//! default to be read back.
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_tson::{from_str, to_string, Ignored, TypeConfig};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Report {
//!     #[serde(skip_deserializing, default = "Report::config")]
//!     config: TypeConfig,
//!     title: String,
//!     #[serde(default)]
//!     draft: String,
//!     #[serde(default)]
//!     cache: Ignored<Vec<u8>>,
//! }
//!
//! impl Report {
//!     fn config() -> TypeConfig {
//!         TypeConfig::excluding(["draft"])
//!     }
//! }
//!
//! let report = Report {
//!     config: Report::config(),
//!     title: "Q3".into(),
//!     draft: "wip".into(),
//!     cache: Ignored::new(vec![1]),
//! };
//!
//! // The config suppresses `Ignored`, so `cache` is written; `draft` is not.
//! let text = to_string(&report).unwrap();
//! assert_eq!(text, "{title:\"Q3\",cache:[1]}");
//!
//! let back: Report = from_str(&text).unwrap();
//! assert_eq!(back.draft, "");
//! assert_eq!(*back.cache, vec![1]);
//! ```

use crate::grammar::{CONFIG_TOKEN, IGNORED_TOKEN};
use crate::TsonValue;
use serde::de::{Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

/// A member that is not written while member attributes are checked.
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
/// use serde_tson::{to_string, Ignored};
///
/// #[derive(Serialize)]
/// struct Login { user: String, password: Ignored<String> }
///
/// let login = Login { user: "ann".into(), password: Ignored::new("hunter2".into()) };
/// assert_eq!(to_string(&login).unwrap(), "{user:\"ann\"}");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Ignored<T>(pub T);

impl<T> Ignored<T> {
    pub fn new(value: T) -> Self {
        Ignored(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Ignored<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Ignored<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> From<T> for Ignored<T> {
    fn from(value: T) -> Self {
        Ignored(value)
    }
}

impl<T: Serialize> Serialize for Ignored<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_newtype_struct(IGNORED_TOKEN, &self.0)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Ignored<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IgnoredVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for IgnoredVisitor<T> {
            type Value = Ignored<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an ignored member")
            }

            fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                T::deserialize(deserializer).map(Ignored)
            }
        }

        deserializer.deserialize_newtype_struct(IGNORED_TOKEN, IgnoredVisitor(PhantomData))
    }
}

/// Per-type configuration carried as a member of the record it configures.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeConfig {
    /// Member names that are never written.
    pub excluded: Vec<String>,
}

impl TypeConfig {
    /// Creates a configuration that excludes the given members.
    pub fn excluding<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeConfig {
            excluded: names.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn excludes(&self, member: &str) -> bool {
        self.excluded.iter().any(|name| name == member)
    }
}

impl Serialize for TypeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_newtype_struct(CONFIG_TOKEN, &self.excluded)
    }
}

impl<'de> Deserialize<'de> for TypeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ConfigVisitor;

        impl<'de> Visitor<'de> for ConfigVisitor {
            type Value = TypeConfig;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a list of excluded member names")
            }

            fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Vec::<String>::deserialize(deserializer).map(|excluded| TypeConfig { excluded })
            }
        }

        deserializer.deserialize_newtype_struct(CONFIG_TOKEN, ConfigVisitor)
    }
}

/// What a record member turned out to be when probed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Marker {
    Plain,
    Ignored,
    Config(Vec<String>),
}

/// Looks at how a member serializes without encoding it.
pub(crate) fn probe_marker<T: ?Sized + Serialize>(value: &T) -> Marker {
    value.serialize(MarkerProbe).unwrap_or(Marker::Plain)
}

/// Serializer that only answers "is this a marker newtype".
///
/// Compound shapes bail out with an error, which [`probe_marker`] reads as
/// a plain member.
struct MarkerProbe;

macro_rules! plain {
    ($($method:ident($($arg:ty),*)),* $(,)?) => {
        $(
            fn $method(self, $(_: $arg),*) -> crate::Result<Marker> {
                Ok(Marker::Plain)
            }
        )*
    };
}

type Impossible = serde::ser::Impossible<Marker, crate::Error>;

fn not_a_marker<T>() -> crate::Result<T> {
    Err(crate::Error::Message("not a marker".to_string()))
}

impl Serializer for MarkerProbe {
    type Ok = Marker;
    type Error = crate::Error;
    type SerializeSeq = Impossible;
    type SerializeTuple = Impossible;
    type SerializeTupleStruct = Impossible;
    type SerializeTupleVariant = Impossible;
    type SerializeMap = Impossible;
    type SerializeStruct = Impossible;
    type SerializeStructVariant = Impossible;

    plain!(
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
        serialize_none(),
        serialize_unit(),
        serialize_unit_struct(&'static str),
        serialize_unit_variant(&'static str, u32, &'static str),
    );

    fn serialize_some<T: ?Sized + Serialize>(self, _value: &T) -> crate::Result<Marker> {
        Ok(Marker::Plain)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        value: &T,
    ) -> crate::Result<Marker> {
        match name {
            IGNORED_TOKEN => Ok(Marker::Ignored),
            CONFIG_TOKEN => {
                let names = match crate::to_value(value)? {
                    TsonValue::Sequence(items) => items
                        .into_iter()
                        .filter_map(|item| match item {
                            TsonValue::String(s) => Some(s),
                            _ => None,
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                Ok(Marker::Config(names))
            }
            _ => Ok(Marker::Plain),
        }
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> crate::Result<Marker> {
        Ok(Marker::Plain)
    }

    fn serialize_seq(self, _len: Option<usize>) -> crate::Result<Impossible> {
        not_a_marker()
    }

    fn serialize_tuple(self, _len: usize) -> crate::Result<Impossible> {
        not_a_marker()
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> crate::Result<Impossible> {
        not_a_marker()
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> crate::Result<Impossible> {
        not_a_marker()
    }

    fn serialize_map(self, _len: Option<usize>) -> crate::Result<Impossible> {
        not_a_marker()
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> crate::Result<Impossible> {
        not_a_marker()
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> crate::Result<Impossible> {
        not_a_marker()
    }
}

/// Serde helpers writing `DateTime<Utc>` in the TSON date/time layout.
///
/// Use with `#[serde(with = "serde_tson::datetime")]`. Through other serde
/// formats the value is a plain string in the same layout.
///
/// ```rust
/// use chrono::{DateTime, TimeZone, Utc};
/// use serde::{Deserialize, Serialize};
/// use serde_tson::{from_str, to_string};
///
/// #[derive(Serialize, Deserialize, Debug, PartialEq)]
/// struct Event {
///     #[serde(with = "serde_tson::datetime")]
///     at: DateTime<Utc>,
/// }
///
/// let event = Event { at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap() };
/// let text = to_string(&event).unwrap();
/// assert_eq!(text, "{at:\"15.01.2024 10:30:00.000000000\"}");
/// assert_eq!(from_str::<Event>(&text).unwrap(), event);
/// ```
pub mod datetime {
    use crate::grammar::{format_datetime, parse_datetime, DATETIME_TOKEN};
    use chrono::{DateTime, Utc};
    use serde::de::{self, Deserialize, Deserializer, Visitor};
    use serde::ser::Serializer;
    use std::fmt;

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_newtype_struct(DATETIME_TOKEN, &format_datetime(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_newtype_struct(DATETIME_TOKEN, DateTimeVisitor)
    }

    struct DateTimeVisitor;

    impl<'de> Visitor<'de> for DateTimeVisitor {
        type Value = DateTime<Utc>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a date/time as \"dd.MM.yyyy HH:mm:ss.fffffffff\"")
        }

        fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            let text = String::deserialize(deserializer)?;
            self.visit_str(&text)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            parse_datetime(value)
                .ok_or_else(|| de::Error::invalid_value(de::Unexpected::Str(value), &self))
        }
    }

    /// The same layout for `Option<DateTime<Utc>>`; `None` is written as null.
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::de::{Deserialize, Deserializer};
        use serde::ser::{Serialize, Serializer};

        struct Wrapper<'a>(&'a DateTime<Utc>);

        impl Serialize for Wrapper<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                super::serialize(self.0, serializer)
            }
        }

        struct Owned(DateTime<Utc>);

        impl<'de> Deserialize<'de> for Owned {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                super::deserialize(deserializer).map(Owned)
            }
        }

        pub fn serialize<S>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match dt {
                Some(dt) => serializer.serialize_some(&Wrapper(dt)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<Owned>::deserialize(deserializer).map(|dt| dt.map(|Owned(dt)| dt))
        }
    }
}
