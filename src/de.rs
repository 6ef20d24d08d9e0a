//! TSON deserialization.
//!
//! This module provides the [`Deserializer`] implementation that reads
//! TSON text into Rust data structures.
//!
//! ## Overview
//!
//! A [`Deserializer`] is a view of one value's span inside whitespace-stripped
//! text. The target type says which production to expect; each composite
//! decoder splits its body with the shared top-level [`Scanner`](crate::scan::Scanner)
//! and hands every piece to a child deserializer over the piece's span. Nothing
//! is tokenized or copied up front.
//!
//! - **Records** (`{name:value,...}`): fields are matched to members by name.
//!   A name seen twice keeps its first position and its last value. Unknown
//!   names are skipped without parsing their value unless the target denies
//!   unknown fields.
//! - **Sequences** (`[a,b]`), **maps** (`[k:v,@{...}:v]`), **tuples**
//!   (`(Item1:a,...,Rest:(...))`) and **multi-dimensional arrays**
//!   (`[<2,2>a,b,c,d]`) each have their own access type.
//!
//! Errors carry the byte offset into the stripped text and the member path
//! leading to the failing value.
//!
//! ## Usage
//!
//! Most users should use the high-level functions in the crate root:
//!
//! ```rust
//! use serde_tson::from_str;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Data { x: i32, y: i32 }
//!
//! let data: Data = from_str("{ x: 1, y: 2 }").unwrap();
//! assert_eq!(data, Data { x: 1, y: 2 });
//! ```

use crate::array::{element_count, Odometer};
use crate::grammar::{
    is_identifier, parse_datetime, unescape, CHAR_QUOTE, DIMS_CLOSE, DIMS_OPEN, FALSE_LITERAL,
    LIST_CLOSE, LIST_OPEN, MULTIARRAY_FIELDS, MULTIARRAY_TOKEN, NULL_LITERAL, RECORD_CLOSE,
    RECORD_OPEN, STRING_QUOTE, TRUE_LITERAL, TUPLE_ARITY, TUPLE_CLOSE, TUPLE_ITEM, TUPLE_OPEN,
    TUPLE_REST,
};
use crate::scan::{self, Entry, Scanner, Span};
use crate::{Error, Kind, Number, Result, TsonMap, TsonValue};
use indexmap::IndexMap;
use serde::de::value::{
    BorrowedStrDeserializer, SeqDeserializer, StringDeserializer, U64Deserializer,
};
use serde::de::{self, DeserializeSeed, Visitor};
use serde::forward_to_deserialize_any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::str::FromStr;

/// Number of characters of a value quoted in a type mismatch.
const FOUND_LEN: usize = 24;

/// Source member name to target member name.
pub type Renames = HashMap<String, String>;

/// The TSON deserializer.
///
/// Reads one value from whitespace-stripped text (see
/// [`strip_whitespace`](crate::strip_whitespace)). Created via
/// [`Deserializer::from_str`].
#[derive(Clone, Copy)]
pub struct Deserializer<'de> {
    text: &'de str,
    start: usize,
    end: usize,
    renames: Option<&'de Renames>,
}

impl<'de> Deserializer<'de> {
    /// Creates a deserializer over all of `input`, which must already be
    /// whitespace-stripped.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(input: &'de str) -> Self {
        Deserializer {
            text: input,
            start: 0,
            end: input.len(),
            renames: None,
        }
    }

    /// Translates record field names through `renames` before they are
    /// matched to members.
    #[must_use]
    pub fn with_renames(mut self, renames: &'de Renames) -> Self {
        self.renames = Some(renames);
        self
    }

    #[inline]
    fn child(&self, (start, end): Span) -> Self {
        Deserializer {
            start,
            end,
            ..*self
        }
    }

    #[inline]
    fn span(&self) -> Span {
        (self.start, self.end)
    }

    #[inline]
    fn slice(&self) -> &'de str {
        &self.text[self.start..self.end]
    }

    #[inline]
    fn first(&self) -> Option<u8> {
        self.slice().as_bytes().first().copied()
    }

    fn is_null(&self) -> bool {
        self.start == self.end || self.slice() == NULL_LITERAL
    }

    fn fail(&self, at: usize, msg: &str) -> Error {
        Error::format(self.text, at, msg)
    }

    fn mismatch(&self, expected: &str) -> Error {
        let slice = self.slice();
        let mut found: String = slice.chars().take(FOUND_LEN).collect();
        if found.len() < slice.len() {
            found.push_str("...");
        }
        if found.is_empty() {
            found.push_str("nothing");
        }
        Error::type_mismatch(Some(self.start), expected, &found)
    }

    fn parse<T: FromStr>(&self, expected: &str) -> Result<T> {
        self.slice().parse().map_err(|_| self.mismatch(expected))
    }

    fn parse_bool(&self) -> Result<bool> {
        match self.slice() {
            TRUE_LITERAL | "true" => Ok(true),
            FALSE_LITERAL | "false" => Ok(false),
            _ => Err(self.mismatch("bool")),
        }
    }

    fn parse_number(&self) -> Result<Number> {
        let s = self.slice();
        if let Ok(i) = s.parse::<i64>() {
            Ok(Number::Int(i))
        } else if let Ok(u) = s.parse::<u64>() {
            Ok(Number::UInt(u))
        } else {
            self.parse::<f64>("number").map(Number::Float)
        }
    }

    /// Returns the body of a string or char literal spanning the whole value.
    fn quoted_body(&self, quote: u8, expected: &str) -> Result<&'de str> {
        if self.end < self.start + 2 || self.first() != Some(quote) {
            return Err(self.mismatch(expected));
        }
        let close = Scanner::new(self.text, self.start, self.end).skip_unit()?;
        if close != self.end {
            return Err(self.fail(close, "unexpected text after literal"));
        }
        Ok(&self.text[self.start + 1..self.end - 1])
    }

    fn parse_string(&self) -> Result<Cow<'de, str>> {
        self.quoted_body(STRING_QUOTE, "string").map(unescape)
    }

    fn parse_char(&self) -> Result<char> {
        let body = unescape(self.quoted_body(CHAR_QUOTE, "char")?);
        let mut chars = body.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(self.mismatch("char")),
        }
    }

    fn body(&self, open: u8, close: u8, what: &str) -> Result<Span> {
        if self.first() != Some(open) {
            return Err(self.mismatch(what));
        }
        scan::body(self.text, self.span(), open, close, what)
    }

    fn is_multi_array(&self) -> bool {
        self.slice().as_bytes().starts_with(&[LIST_OPEN, DIMS_OPEN])
    }

    /// Collects record fields in first-seen order, later duplicates winning.
    fn record_fields(&self) -> Result<IndexMap<Cow<'de, str>, Span>> {
        let body = self.body(RECORD_OPEN, RECORD_CLOSE, "record")?;
        let fields = scan::split_fields(self.text, body)?;
        let mut members = IndexMap::with_capacity(fields.len());
        for field in fields {
            let name = self.child(field.name).member_name()?;
            let name = match self.renames.and_then(|r| r.get(&*name)) {
                Some(target) => Cow::Borrowed(target.as_str()),
                None => name,
            };
            members.insert(name, field.value);
        }
        Ok(members)
    }

    /// A bare identifier, or a quoted name for anything else.
    fn member_name(&self) -> Result<Cow<'de, str>> {
        if self.first() == Some(STRING_QUOTE) {
            self.parse_string()
        } else {
            Ok(Cow::Borrowed(self.slice()))
        }
    }

    fn sequence_elements(&self) -> Result<Vec<Span>> {
        let body = self.body(LIST_OPEN, LIST_CLOSE, "sequence")?;
        scan::split_elements(self.text, body)
    }

    fn map_entries(&self) -> Result<Vec<Entry>> {
        let body = self.body(LIST_OPEN, LIST_CLOSE, "map")?;
        scan::split_entries(self.text, body)
    }

    /// Flattens `(Item1:..,Item7:..,Rest:(...))` into one list of element spans.
    fn tuple_elements(&self) -> Result<Vec<Span>> {
        let body = self.body(TUPLE_OPEN, TUPLE_CLOSE, "tuple")?;
        let mut slots: [Option<Span>; TUPLE_ARITY] = [None; TUPLE_ARITY];
        let mut rest = None;

        for field in scan::split_fields(self.text, body)? {
            let name = &self.text[field.name.0..field.name.1];
            if name == TUPLE_REST {
                rest = Some(field.value);
                continue;
            }
            let slot = name
                .strip_prefix(TUPLE_ITEM)
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| (1..=TUPLE_ARITY).contains(n));
            match slot {
                Some(n) => slots[n - 1] = Some(field.value),
                None => {
                    return Err(self.fail(field.name.0, &format!("unexpected tuple slot `{}`", name)))
                }
            }
        }

        let count = slots.iter().take_while(|s| s.is_some()).count();
        if slots[count..].iter().any(Option::is_some) {
            return Err(self.fail(
                body.0,
                &format!("missing tuple slot `{}{}`", TUPLE_ITEM, count + 1),
            ));
        }
        let mut elements: Vec<Span> = slots.iter().flatten().copied().collect();
        if let Some(rest) = rest {
            if count < TUPLE_ARITY {
                return Err(self.fail(rest.0, "`Rest` before all seven items"));
            }
            let rest = self.child(rest);
            elements.extend(rest.tuple_elements().map_err(|e| e.at_member(TUPLE_REST))?);
        }
        Ok(elements)
    }

    /// Splits `[<d1,...,dn>e1,...,em]` into its shape and element spans.
    fn multi_array_parts(&self) -> Result<(Vec<usize>, Vec<Span>)> {
        if !self.is_multi_array() {
            return Err(self.mismatch("multi-dimensional array"));
        }
        let (body_start, body_end) =
            scan::body(self.text, self.span(), LIST_OPEN, LIST_CLOSE, "multi-dimensional array")?;
        let header_start = body_start + 1;
        let header_end = self.text[header_start..body_end]
            .find(DIMS_CLOSE as char)
            .map(|i| header_start + i)
            .ok_or_else(|| self.fail(body_start, "unterminated dimension list"))?;

        let mut dims = Vec::new();
        let mut at = header_start;
        for piece in self.text[header_start..header_end].split(',') {
            let size = piece
                .parse::<usize>()
                .map_err(|_| self.fail(at, "dimension size is not a non-negative integer"))?;
            dims.push(size);
            at += piece.len() + 1;
        }

        let elements = scan::split_elements(self.text, (header_end + 1, body_end))?;
        if element_count(&dims) != Some(elements.len()) {
            return Err(self.fail(
                header_start,
                &format!(
                    "dimensions {:?} do not match the {} elements present",
                    dims,
                    elements.len()
                ),
            ));
        }
        Ok((dims, elements))
    }

    /// Decodes the value into a [`TsonValue`], keeping every production apart.
    ///
    /// Unlike going through `TsonValue`'s `Deserialize` impl, tuples stay
    /// tuples, maps stay maps and quoted date/times become
    /// [`TsonValue::DateTime`].
    pub fn parse_value(&self) -> Result<TsonValue> {
        let value = match Kind::sniff(self.slice()) {
            Kind::Null => TsonValue::Null,
            Kind::Scalar => match self.parse_bool() {
                Ok(b) => TsonValue::Bool(b),
                Err(_) => TsonValue::Number(self.parse_number()?),
            },
            Kind::String => TsonValue::String(self.parse_string()?.into_owned()),
            Kind::DateTime => {
                let text = self.parse_string()?;
                match parse_datetime(&text) {
                    Some(dt) => TsonValue::DateTime(dt),
                    None => TsonValue::String(text.into_owned()),
                }
            }
            Kind::Char => TsonValue::Char(self.parse_char()?),
            Kind::Enum => TsonValue::Enum {
                name: self.identifier()?.to_string(),
                ordinal: None,
            },
            Kind::Record => {
                let mut fields = TsonMap::new();
                for (name, span) in self.record_fields()? {
                    let value = self
                        .child(span)
                        .parse_value()
                        .map_err(|e| e.at_member(&name))?;
                    fields.insert(name.into_owned(), value);
                }
                TsonValue::Record(fields)
            }
            Kind::Sequence => TsonValue::Sequence(self.parse_elements(&self.sequence_elements()?)?),
            Kind::Tuple => TsonValue::Tuple(self.parse_elements(&self.tuple_elements()?)?),
            Kind::Map => {
                let mut entries = Vec::new();
                for entry in self.map_entries()? {
                    let key_text = &self.text[entry.key.0..entry.key.1];
                    let key = self.child(entry.key).parse_value()?;
                    let value = self
                        .child(entry.value)
                        .parse_value()
                        .map_err(|e| e.at_member(&format!("[{}]", key_text)))?;
                    entries.push((key, value));
                }
                TsonValue::Map(entries)
            }
            Kind::MultiArray => {
                let (dims, elements) = self.multi_array_parts()?;
                let data = self.parse_elements(&elements)?;
                TsonValue::MultiArray { dims, data }
            }
        };
        Ok(value)
    }

    fn parse_elements(&self, spans: &[Span]) -> Result<Vec<TsonValue>> {
        spans
            .iter()
            .enumerate()
            .map(|(i, &span)| {
                self.child(span)
                    .parse_value()
                    .map_err(|e| e.at_member(&format!("[{}]", i)))
            })
            .collect()
    }

    fn identifier(&self) -> Result<&'de str> {
        let s = self.slice();
        if is_identifier(s) {
            Ok(s)
        } else {
            Err(self.mismatch("variant name"))
        }
    }

    fn visit_scalar<V: Visitor<'de>>(&self, visitor: V) -> Result<V::Value> {
        if let Ok(b) = self.parse_bool() {
            return visitor.visit_bool(b);
        }
        match self.parse_number()? {
            Number::Int(i) => visitor.visit_i64(i),
            Number::UInt(u) => visitor.visit_u64(u),
            Number::Float(f) => visitor.visit_f64(f),
        }
    }

    fn visit_quoted<V: Visitor<'de>>(&self, visitor: V) -> Result<V::Value> {
        match self.parse_string()? {
            Cow::Borrowed(s) => visitor.visit_borrowed_str(s),
            Cow::Owned(s) => visitor.visit_string(s),
        }
    }

    fn visit_record<V: Visitor<'de>>(&self, visitor: V) -> Result<V::Value> {
        let fields = self.record_fields()?;
        visitor.visit_map(RecordAccess {
            de: *self,
            fields: fields.into_iter(),
            value: None,
        })
    }

    fn visit_elements<V: Visitor<'de>>(&self, items: Vec<Span>, visitor: V) -> Result<V::Value> {
        visitor.visit_seq(SeqAccess::new(*self, items))
    }
}

macro_rules! deserialize_number {
    ($($method:ident => $visit:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                visitor.$visit(self.parse::<$ty>(stringify!($ty))?)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for Deserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match Kind::sniff(self.slice()) {
            Kind::Null => visitor.visit_unit(),
            Kind::Scalar => self.visit_scalar(visitor),
            Kind::String | Kind::DateTime => self.visit_quoted(visitor),
            Kind::Char => visitor.visit_char(self.parse_char()?),
            Kind::Enum => visitor.visit_enum(EnumAccess {
                tag: Tag::Name(Cow::Borrowed(self.identifier()?)),
                payload: None,
            }),
            Kind::Record => self.visit_record(visitor),
            Kind::Map => self.deserialize_map(visitor),
            Kind::Sequence => self.visit_elements(self.sequence_elements()?, visitor),
            Kind::Tuple => self.visit_elements(self.tuple_elements()?, visitor),
            Kind::MultiArray => {
                let (_, elements) = self.multi_array_parts()?;
                self.visit_elements(elements, visitor)
            }
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_bool(self.parse_bool()?)
    }

    deserialize_number!(
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
    );

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_char(self.parse_char()?)
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.visit_quoted(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.visit_quoted(visitor)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.is_null() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.is_null() {
            visitor.visit_unit()
        } else {
            Err(self.mismatch("null"))
        }
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        // A multi-dimensional array read into a flat list keeps row-major order.
        let elements = if self.is_multi_array() {
            self.multi_array_parts()?.1
        } else {
            self.sequence_elements()?
        };
        self.visit_elements(elements, visitor)
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.visit_elements(self.tuple_elements()?, visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.first() == Some(RECORD_OPEN) {
            return self.visit_record(visitor);
        }
        let entries = self.map_entries()?;
        visitor.visit_map(MapEntries {
            de: self,
            entries: entries.into_iter(),
            value: None,
        })
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if name == MULTIARRAY_TOKEN {
            let (dims, elements) = self.multi_array_parts()?;
            return visitor.visit_map(MultiArrayAccess {
                de: self,
                dims,
                elements,
                field: 0,
            });
        }
        self.visit_record(visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.first() {
            Some(RECORD_OPEN) => {
                let fields = self.record_fields()?;
                let mut fields = fields.into_iter();
                match (fields.next(), fields.next()) {
                    (Some((name, span)), None) => visitor
                        .visit_enum(EnumAccess {
                            tag: Tag::Name(name.clone()),
                            payload: Some(self.child(span)),
                        })
                        .map_err(|e| e.at_member(&name)),
                    _ => Err(self.mismatch("a record with exactly one variant field")),
                }
            }
            Some(STRING_QUOTE) => visitor.visit_enum(EnumAccess {
                tag: Tag::Name(self.parse_string()?),
                payload: None,
            }),
            Some(b) if b.is_ascii_digit() => visitor.visit_enum(EnumAccess {
                tag: Tag::Ordinal(self.parse::<u64>("variant ordinal")?),
                payload: None,
            }),
            _ => visitor.visit_enum(EnumAccess {
                tag: Tag::Name(Cow::Borrowed(self.identifier()?)),
                payload: None,
            }),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.first() == Some(STRING_QUOTE) {
            self.visit_quoted(visitor)
        } else {
            visitor.visit_borrowed_str(self.slice())
        }
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

/// Record fields, keyed by member name.
struct RecordAccess<'de> {
    de: Deserializer<'de>,
    fields: indexmap::map::IntoIter<Cow<'de, str>, Span>,
    value: Option<(Cow<'de, str>, Span)>,
}

impl<'de> de::MapAccess<'de> for RecordAccess<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        match self.fields.next() {
            Some((name, span)) => {
                let key = match &name {
                    Cow::Borrowed(s) => seed.deserialize(BorrowedStrDeserializer::new(*s)),
                    Cow::Owned(s) => seed.deserialize(StringDeserializer::new(s.clone())),
                };
                self.value = Some((name, span));
                key.map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        let (name, span) = self
            .value
            .take()
            .ok_or_else(|| Error::custom("value requested before key"))?;
        seed.deserialize(self.de.child(span))
            .map_err(|e| e.at_offset(span.0).at_member(&name))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}

/// Elements of a sequence, tuple or flattened multi-dimensional array.
struct SeqAccess<'de> {
    de: Deserializer<'de>,
    items: std::vec::IntoIter<Span>,
    index: usize,
}

impl<'de> SeqAccess<'de> {
    fn new(de: Deserializer<'de>, items: Vec<Span>) -> Self {
        SeqAccess {
            de,
            items: items.into_iter(),
            index: 0,
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqAccess<'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        let Some(span) = self.items.next() else {
            return Ok(None);
        };
        let index = self.index;
        self.index += 1;
        seed.deserialize(self.de.child(span))
            .map(Some)
            .map_err(|e| e.at_offset(span.0).at_member(&format!("[{}]", index)))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

/// Entries of a map; later duplicate keys overwrite earlier ones in the target.
struct MapEntries<'de> {
    de: Deserializer<'de>,
    entries: std::vec::IntoIter<Entry>,
    value: Option<Entry>,
}

impl<'de> de::MapAccess<'de> for MapEntries<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        let Some(entry) = self.entries.next() else {
            return Ok(None);
        };
        self.value = Some(entry);
        seed.deserialize(self.de.child(entry.key))
            .map(Some)
            .map_err(|e| e.at_offset(entry.key.0))
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        let entry = self
            .value
            .take()
            .ok_or_else(|| Error::custom("value requested before key"))?;
        let key_text = &self.de.text[entry.key.0..entry.key.1];
        seed.deserialize(self.de.child(entry.value))
            .map_err(|e| e.at_offset(entry.value.0).at_member(&format!("[{}]", key_text)))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

/// Presents `[<dims>elements]` as a `{dims, data}` struct.
struct MultiArrayAccess<'de> {
    de: Deserializer<'de>,
    dims: Vec<usize>,
    elements: Vec<Span>,
    field: usize,
}

impl<'de> de::MapAccess<'de> for MultiArrayAccess<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        match MULTIARRAY_FIELDS.get(self.field) {
            Some(&key) => seed.deserialize(BorrowedStrDeserializer::new(key)).map(Some),
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        self.field += 1;
        match self.field {
            1 => {
                let dims: SeqDeserializer<_, Error> = SeqDeserializer::new(self.dims.clone().into_iter());
                seed.deserialize(dims)
            }
            2 => seed
                .deserialize(ElementsDeserializer {
                    de: self.de,
                    dims: std::mem::take(&mut self.dims),
                    elements: std::mem::take(&mut self.elements),
                })
                .map_err(|e| e.at_member("data")),
            _ => Err(Error::custom("value requested before key")),
        }
    }
}

/// The flat elements of a multi-dimensional array, read as a sequence.
struct ElementsDeserializer<'de> {
    de: Deserializer<'de>,
    dims: Vec<usize>,
    elements: Vec<Span>,
}

impl<'de> de::Deserializer<'de> for ElementsDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_seq(ElementsAccess {
            de: self.de,
            odometer: Odometer::new(&self.dims),
            items: self.elements.into_iter(),
        })
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

/// Multi-dimensional array elements; errors name the element's coordinate.
struct ElementsAccess<'de> {
    de: Deserializer<'de>,
    odometer: Odometer,
    items: std::vec::IntoIter<Span>,
}

impl<'de> de::SeqAccess<'de> for ElementsAccess<'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        let Some(span) = self.items.next() else {
            return Ok(None);
        };
        let coordinate = self
            .odometer
            .index()
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.odometer.advance();
        seed.deserialize(self.de.child(span))
            .map(Some)
            .map_err(|e| e.at_offset(span.0).at_member(&format!("[{}]", coordinate)))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

enum Tag<'de> {
    Name(Cow<'de, str>),
    Ordinal(u64),
}

/// A unit variant (`Name` or its ordinal) or a `{Variant:payload}` record.
struct EnumAccess<'de> {
    tag: Tag<'de>,
    payload: Option<Deserializer<'de>>,
}

impl<'de> de::EnumAccess<'de> for EnumAccess<'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self)>
    where
        V: DeserializeSeed<'de>,
    {
        let variant = match self.tag {
            Tag::Name(Cow::Borrowed(name)) => {
                seed.deserialize(BorrowedStrDeserializer::<Error>::new(name))?
            }
            Tag::Name(Cow::Owned(ref name)) => {
                seed.deserialize(StringDeserializer::<Error>::new(name.clone()))?
            }
            Tag::Ordinal(ordinal) => seed.deserialize(U64Deserializer::<Error>::new(ordinal))?,
        };
        Ok((variant, self))
    }
}

impl<'de> EnumAccess<'de> {
    fn payload(&self, expected: &str) -> Result<Deserializer<'de>> {
        self.payload
            .ok_or_else(|| Error::type_mismatch(None, expected, "a unit variant"))
    }
}

impl<'de> de::VariantAccess<'de> for EnumAccess<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.payload {
            Some(de) if !de.is_null() => Err(de.mismatch("unit variant")),
            _ => Ok(()),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(self.payload("newtype variant")?)
    }

    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_tuple(self.payload("tuple variant")?, len, visitor)
    }

    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_struct(self.payload("struct variant")?, "", fields, visitor)
    }
}
