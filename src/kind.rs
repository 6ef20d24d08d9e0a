//! Type classification.
//!
//! Every value is written and read through one grammar production, its
//! [`Kind`]. The kind of a Rust type is found by letting the type's
//! `Deserialize` impl ask a probe deserializer for the shape it wants; the
//! answer is cached per type in a process-wide [`KindRegistry`].
//!
//! ```rust
//! use serde_tson::{classify_type, Kind};
//! use std::collections::BTreeMap;
//!
//! assert_eq!(classify_type::<Vec<i32>>(), Kind::Sequence);
//! assert_eq!(classify_type::<BTreeMap<i32, String>>(), Kind::Map);
//! assert_eq!(classify_type::<(i32, String)>(), Kind::Tuple);
//! assert_eq!(classify_type::<Option<String>>(), Kind::String);
//! ```

use crate::grammar::{
    parse_datetime, unescape, CHAR_QUOTE, COMPLEX_KEY, DATETIME_TOKEN, DIMS_OPEN, FALSE_LITERAL,
    LIST_OPEN, MULTIARRAY_TOKEN, NULL_LITERAL, RECORD_OPEN, STRING_QUOTE, TRUE_LITERAL,
    TUPLE_OPEN,
};
use crate::scan::Scanner;
use crate::{Error, Result};
use serde::de::{self, DeserializeOwned, Visitor};
use serde::Serialize;
use std::any::TypeId;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{OnceLock, PoisonError, RwLock};

/// The grammar production a value is encoded with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    /// Booleans and numbers.
    Scalar,
    String,
    Char,
    DateTime,
    Enum,
    Sequence,
    Map,
    Tuple,
    MultiArray,
    Record,
}

impl Kind {
    /// Returns `true` for kinds written with brackets.
    #[must_use]
    pub const fn is_composite(self) -> bool {
        matches!(
            self,
            Kind::Sequence | Kind::Map | Kind::Tuple | Kind::MultiArray | Kind::Record
        )
    }

    /// Classifies canonical text by its leading production.
    ///
    /// `text` must be whitespace-stripped. A quoted string that parses as a
    /// date/time is reported as [`Kind::DateTime`]; a bracketed list whose first
    /// element holds a top-level `:` is a [`Kind::Map`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tson::Kind;
    ///
    /// assert_eq!(Kind::sniff("[1:2,3:4]"), Kind::Map);
    /// assert_eq!(Kind::sniff("[1,2]"), Kind::Sequence);
    /// assert_eq!(Kind::sniff("[<2>1,2]"), Kind::MultiArray);
    /// assert_eq!(Kind::sniff("(Item1:1)"), Kind::Tuple);
    /// assert_eq!(Kind::sniff("()"), Kind::Null);
    /// assert_eq!(Kind::sniff("Active"), Kind::Enum);
    /// ```
    #[must_use]
    pub fn sniff(text: &str) -> Kind {
        let bytes = text.as_bytes();
        match bytes.first() {
            None => Kind::Null,
            Some(&RECORD_OPEN) => Kind::Record,
            Some(&TUPLE_OPEN) if text == NULL_LITERAL => Kind::Null,
            Some(&TUPLE_OPEN) => Kind::Tuple,
            Some(&LIST_OPEN) if bytes.get(1) == Some(&DIMS_OPEN) => Kind::MultiArray,
            Some(&LIST_OPEN) => {
                if bytes.get(1) == Some(&COMPLEX_KEY) || first_element_is_entry(text) {
                    Kind::Map
                } else {
                    Kind::Sequence
                }
            }
            Some(&STRING_QUOTE) => {
                let body = text.get(1..text.len().saturating_sub(1)).unwrap_or("");
                if parse_datetime(&unescape(body)).is_some() {
                    Kind::DateTime
                } else {
                    Kind::String
                }
            }
            Some(&CHAR_QUOTE) => Kind::Char,
            _ if text == TRUE_LITERAL || text == FALSE_LITERAL => Kind::Scalar,
            Some(b) if b.is_ascii_digit() || *b == b'-' || *b == b'+' || *b == b'.' => {
                Kind::Scalar
            }
            _ if matches!(text, "NaN" | "inf" | "infinity" | "Infinity") => Kind::Scalar,
            _ => Kind::Enum,
        }
    }
}

fn first_element_is_entry(text: &str) -> bool {
    if text.len() < 2 {
        return false;
    }
    let mut scanner = Scanner::new(text, 1, text.len() - 1);
    matches!(
        scanner.next_top_level(b":,"),
        Ok(Some(at)) if text.as_bytes()[at] == b':'
    )
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Null => "null",
            Kind::Scalar => "scalar",
            Kind::String => "string",
            Kind::Char => "char",
            Kind::DateTime => "date/time",
            Kind::Enum => "enum",
            Kind::Sequence => "sequence",
            Kind::Map => "map",
            Kind::Tuple => "tuple",
            Kind::MultiArray => "multi-dimensional array",
            Kind::Record => "record",
        };
        f.write_str(name)
    }
}

/// Process-wide cache of type classifications.
///
/// Lookups take a read lock. A miss classifies the type outside the lock and
/// inserts the result only if no other thread got there first; classifying
/// twice is harmless since the result is deterministic.
pub struct KindRegistry {
    kinds: RwLock<HashMap<TypeId, Kind>>,
}

impl KindRegistry {
    fn new() -> Self {
        KindRegistry {
            kinds: RwLock::new(HashMap::new()),
        }
    }

    /// The shared registry.
    pub fn global() -> &'static KindRegistry {
        static REGISTRY: OnceLock<KindRegistry> = OnceLock::new();
        REGISTRY.get_or_init(KindRegistry::new)
    }

    /// Returns the cached kind of `T`, classifying it on first use.
    pub fn classify<T: DeserializeOwned + 'static>(&self) -> Kind {
        let id = TypeId::of::<T>();
        if let Some(kind) = self.get(id) {
            return kind;
        }

        let kind = probe::<T>();
        *self
            .kinds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_insert(kind)
    }

    fn get(&self, id: TypeId) -> Option<Kind> {
        self.kinds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
    }

    /// Number of classified types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classifies a static type through the global [`KindRegistry`].
///
/// Types that never ask for a specific shape fall back to [`Kind::Record`].
pub fn classify_type<T: DeserializeOwned + 'static>() -> Kind {
    KindRegistry::global().classify::<T>()
}

/// Classifies a runtime value by the shape it serializes as.
///
/// # Examples
///
/// ```rust
/// use serde_tson::{classify, Kind};
///
/// assert_eq!(classify(&true).unwrap(), Kind::Scalar);
/// assert_eq!(classify(&vec!["a"]).unwrap(), Kind::Sequence);
/// ```
pub fn classify<T: ?Sized + Serialize>(value: &T) -> Result<Kind> {
    crate::to_value(value).map(|v| v.kind())
}

fn probe<T: DeserializeOwned>() -> Kind {
    let found = Cell::new(None);
    // The probe always fails once it has seen the requested shape.
    let _ = T::deserialize(Probe { found: &found });
    found.get().unwrap_or(Kind::Record)
}

/// Deserializer that records the first shape requested of it and bails out.
struct Probe<'a> {
    found: &'a Cell<Option<Kind>>,
}

impl<'a> Probe<'a> {
    fn found<V>(self, kind: Kind) -> Result<V> {
        if self.found.get().is_none() {
            self.found.set(Some(kind));
        }
        Err(Error::Message("type probe".to_string()))
    }
}

macro_rules! probe_as {
    ($kind:expr => $($method:ident),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
                self.found($kind)
            }
        )*
    };
}

impl<'de, 'a> de::Deserializer<'de> for Probe<'a> {
    type Error = Error;

    probe_as!(Kind::Scalar =>
        deserialize_bool, deserialize_i8, deserialize_i16, deserialize_i32, deserialize_i64,
        deserialize_u8, deserialize_u16, deserialize_u32, deserialize_u64,
        deserialize_f32, deserialize_f64, deserialize_i128, deserialize_u128,
    );
    probe_as!(Kind::Char => deserialize_char);
    probe_as!(Kind::String => deserialize_str, deserialize_string, deserialize_identifier);
    probe_as!(Kind::Sequence => deserialize_bytes, deserialize_byte_buf, deserialize_seq);
    probe_as!(Kind::Null => deserialize_unit);
    probe_as!(Kind::Map => deserialize_map);
    probe_as!(Kind::Record => deserialize_any, deserialize_ignored_any);

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_some(self)
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _visitor: V,
    ) -> Result<V::Value> {
        self.found(Kind::Null)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        if name == DATETIME_TOKEN {
            self.found(Kind::DateTime)
        } else {
            visitor.visit_newtype_struct(self)
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, _visitor: V) -> Result<V::Value> {
        self.found(Kind::Tuple)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value> {
        self.found(Kind::Tuple)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value> {
        if name == MULTIARRAY_TOKEN {
            self.found(Kind::MultiArray)
        } else {
            self.found(Kind::Record)
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value> {
        self.found(Kind::Enum)
    }
}
