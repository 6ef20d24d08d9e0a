//! TSON serialization.
//!
//! This module provides the [`Serializer`] implementation that converts
//! Rust data structures into TSON text.
//!
//! ## Overview
//!
//! Encoding runs in two steps:
//!
//! 1. The value is walked through serde into a [`TsonValue`] tree by
//!    [`ValueSerializer`]. Record member filtering (the [`Ignored`](crate::Ignored)
//!    marker, [`TypeConfig`](crate::TypeConfig) exclusions, null and default
//!    omission) happens here, so by the time anything is written the surviving
//!    members of every composite are known.
//! 2. The tree is written out by [`write_value`], compact or tab-indented
//!    depending on [`TsonSettings::use_indentation`]. Commas go between
//!    surviving siblings only.
//!
//! ## Usage
//!
//! Most users should use the high-level functions in the crate root:
//!
//! ```rust
//! use serde_tson::{to_string, to_string_pretty};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Data { x: i32, y: i32 }
//!
//! let data = Data { x: 1, y: 2 };
//!
//! assert_eq!(to_string(&data).unwrap(), "{x:1,y:2}");
//! assert_eq!(to_string_pretty(&data).unwrap(), "{\n\tx: 1,\n\ty: 2\n}");
//! ```
//!
//! ## Direct Serializer Usage
//!
//! ```rust
//! use serde_tson::{Serializer, TsonSettings};
//! use serde::Serialize;
//!
//! let mut serializer = Serializer::new(TsonSettings::new());
//!
//! let data = vec![1, 2, 3, 4, 5];
//! data.serialize(&mut serializer).unwrap();
//!
//! assert_eq!(serializer.into_inner(), "[1,2,3,4,5]");
//! ```

use crate::array::{element_count, Odometer};
use crate::grammar::{
    format_datetime, parse_datetime, write_char, write_name, write_string, DATETIME_TOKEN,
    ENUM_TOKEN, FALSE_LITERAL, MULTIARRAY_TOKEN, NULL_LITERAL, RECORD_TOKEN, TRUE_LITERAL,
    TUPLE_ARITY, TUPLE_ITEM, TUPLE_REST,
};
use crate::markers::{probe_marker, Marker};
use crate::{Error, Number, Result, TsonMap, TsonSettings, TsonValue};
use serde::{ser, Serialize};
use std::any::type_name;

/// The TSON serializer.
///
/// Converts Rust values implementing `Serialize` into TSON text.
/// Created via [`Serializer::new`] with the [`TsonSettings`] to apply.
pub struct Serializer {
    output: String,
    settings: TsonSettings,
}

impl Serializer {
    pub fn new(settings: TsonSettings) -> Self {
        Serializer {
            output: String::with_capacity(256),
            settings,
        }
    }

    pub fn into_inner(self) -> String {
        self.output
    }

    #[inline]
    fn values(&self) -> ValueSerializer {
        ValueSerializer::new(self.settings)
    }

    fn write(&mut self, value: &TsonValue) {
        write_value(&mut self.output, value, &self.settings, 0);
    }
}

macro_rules! write_through {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> Result<()> {
                let value = ser::Serializer::$method(self.values(), v)?;
                self.write(&value);
                Ok(())
            }
        )*
    };
}

impl<'a> ser::Serializer for &'a mut Serializer {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Compound<'a, SerializeVec>;
    type SerializeTuple = Compound<'a, SerializeVec>;
    type SerializeTupleStruct = Compound<'a, SerializeVec>;
    type SerializeTupleVariant = Compound<'a, SerializeTupleVariant>;
    type SerializeMap = Compound<'a, SerializeMap>;
    type SerializeStruct = Compound<'a, SerializeRecord>;
    type SerializeStructVariant = Compound<'a, SerializeStructVariant>;

    write_through!(
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_i128(i128),
        serialize_u128(u128),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
        serialize_unit_struct(&'static str),
    );

    fn serialize_none(self) -> Result<()> {
        self.write(&TsonValue::Null);
        Ok(())
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.write(&TsonValue::Null);
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        let value = ser::Serializer::serialize_unit_variant(
            self.values(),
            name,
            variant_index,
            variant,
        )?;
        self.write(&value);
        Ok(())
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let value = ser::Serializer::serialize_newtype_struct(self.values(), name, value)?;
        self.write(&value);
        Ok(())
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let value = ser::Serializer::serialize_newtype_variant(
            self.values(),
            name,
            variant_index,
            variant,
            value,
        )?;
        self.write(&value);
        Ok(())
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        let inner = ser::Serializer::serialize_seq(self.values(), len)?;
        Ok(Compound { ser: self, inner })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        let inner = ser::Serializer::serialize_tuple(self.values(), len)?;
        Ok(Compound { ser: self, inner })
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        let inner = ser::Serializer::serialize_tuple_struct(self.values(), name, len)?;
        Ok(Compound { ser: self, inner })
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        let inner = ser::Serializer::serialize_tuple_variant(
            self.values(),
            name,
            variant_index,
            variant,
            len,
        )?;
        Ok(Compound { ser: self, inner })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        let inner = ser::Serializer::serialize_map(self.values(), len)?;
        Ok(Compound { ser: self, inner })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        let inner = ser::Serializer::serialize_struct(self.values(), name, len)?;
        Ok(Compound { ser: self, inner })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        let inner = ser::Serializer::serialize_struct_variant(
            self.values(),
            name,
            variant_index,
            variant,
            len,
        )?;
        Ok(Compound { ser: self, inner })
    }
}

/// A composite being collected for a [`Serializer`]; written out on `end`.
pub struct Compound<'a, C> {
    ser: &'a mut Serializer,
    inner: C,
}

impl<'a> ser::SerializeSeq for Compound<'a, SerializeVec> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(&mut self.inner, value)
    }

    fn end(self) -> Result<()> {
        let value = ser::SerializeSeq::end(self.inner)?;
        self.ser.write(&value);
        Ok(())
    }
}

impl<'a> ser::SerializeTuple for Compound<'a, SerializeVec> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeTuple::serialize_element(&mut self.inner, value)
    }

    fn end(self) -> Result<()> {
        let value = ser::SerializeTuple::end(self.inner)?;
        self.ser.write(&value);
        Ok(())
    }
}

impl<'a> ser::SerializeTupleStruct for Compound<'a, SerializeVec> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeTupleStruct::serialize_field(&mut self.inner, value)
    }

    fn end(self) -> Result<()> {
        let value = ser::SerializeTupleStruct::end(self.inner)?;
        self.ser.write(&value);
        Ok(())
    }
}

impl<'a> ser::SerializeTupleVariant for Compound<'a, SerializeTupleVariant> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeTupleVariant::serialize_field(&mut self.inner, value)
    }

    fn end(self) -> Result<()> {
        let value = ser::SerializeTupleVariant::end(self.inner)?;
        self.ser.write(&value);
        Ok(())
    }
}

impl<'a> ser::SerializeMap for Compound<'a, SerializeMap> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeMap::serialize_key(&mut self.inner, key)
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeMap::serialize_value(&mut self.inner, value)
    }

    fn end(self) -> Result<()> {
        let value = ser::SerializeMap::end(self.inner)?;
        self.ser.write(&value);
        Ok(())
    }
}

impl<'a> ser::SerializeStruct for Compound<'a, SerializeRecord> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeStruct::serialize_field(&mut self.inner, key, value)
    }

    fn skip_field(&mut self, key: &'static str) -> Result<()> {
        ser::SerializeStruct::skip_field(&mut self.inner, key)
    }

    fn end(self) -> Result<()> {
        let value = ser::SerializeStruct::end(self.inner)?;
        self.ser.write(&value);
        Ok(())
    }
}

impl<'a> ser::SerializeStructVariant for Compound<'a, SerializeStructVariant> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeStructVariant::serialize_field(&mut self.inner, key, value)
    }

    fn end(self) -> Result<()> {
        let value = ser::SerializeStructVariant::end(self.inner)?;
        self.ser.write(&value);
        Ok(())
    }
}

/// Serializer producing a [`TsonValue`] tree.
///
/// Record members are filtered according to its [`TsonSettings`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ValueSerializer {
    settings: TsonSettings,
}

impl ValueSerializer {
    pub fn new(settings: TsonSettings) -> Self {
        ValueSerializer { settings }
    }

    #[inline]
    fn value_of<T: ?Sized + Serialize>(self, value: &T) -> Result<TsonValue> {
        value.serialize(self)
    }
}

/// Builds a record holding one field named after an enum variant.
fn variant_record(variant: &str, payload: TsonValue) -> TsonValue {
    let mut fields = TsonMap::with_capacity(1);
    fields.insert(variant.to_string(), payload);
    TsonValue::Record(fields)
}

impl ser::Serializer for ValueSerializer {
    type Ok = TsonValue;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeRecord;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<TsonValue> {
        Ok(TsonValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<TsonValue> {
        Ok(TsonValue::Number(Number::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<TsonValue> {
        Ok(TsonValue::Number(Number::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<TsonValue> {
        Ok(TsonValue::Number(Number::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<TsonValue> {
        Ok(TsonValue::Number(Number::from(v)))
    }

    fn serialize_u8(self, v: u8) -> Result<TsonValue> {
        Ok(TsonValue::Number(Number::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<TsonValue> {
        Ok(TsonValue::Number(Number::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<TsonValue> {
        Ok(TsonValue::Number(Number::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<TsonValue> {
        Ok(TsonValue::Number(Number::from(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<TsonValue> {
        if let Ok(i) = i64::try_from(v) {
            Ok(TsonValue::Number(Number::from(i)))
        } else if let Ok(u) = u64::try_from(v) {
            Ok(TsonValue::Number(Number::from(u)))
        } else {
            Err(Error::unsupported_type("i128 value out of 64-bit range"))
        }
    }

    fn serialize_u128(self, v: u128) -> Result<TsonValue> {
        u64::try_from(v)
            .map(|u| TsonValue::Number(Number::from(u)))
            .map_err(|_| Error::unsupported_type("u128 value out of 64-bit range"))
    }

    fn serialize_f32(self, v: f32) -> Result<TsonValue> {
        Ok(TsonValue::Number(Number::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<TsonValue> {
        Ok(TsonValue::Number(Number::from(v)))
    }

    fn serialize_char(self, v: char) -> Result<TsonValue> {
        Ok(TsonValue::Char(v))
    }

    fn serialize_str(self, v: &str) -> Result<TsonValue> {
        Ok(TsonValue::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<TsonValue> {
        let vec = v.iter().map(|&b| TsonValue::from(b)).collect();
        Ok(TsonValue::Sequence(vec))
    }

    fn serialize_none(self) -> Result<TsonValue> {
        Ok(TsonValue::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<TsonValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<TsonValue> {
        Ok(TsonValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<TsonValue> {
        Ok(TsonValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        variant: &'static str,
    ) -> Result<TsonValue> {
        Ok(TsonValue::Enum {
            name: variant.to_string(),
            ordinal: Some(variant_index),
        })
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<TsonValue>
    where
        T: ?Sized + Serialize,
    {
        match name {
            DATETIME_TOKEN => match self.value_of(value)? {
                TsonValue::String(s) => parse_datetime(&s)
                    .map(TsonValue::DateTime)
                    .ok_or_else(|| Error::type_mismatch(None, "date/time", &s)),
                TsonValue::DateTime(dt) => Ok(TsonValue::DateTime(dt)),
                other => Err(Error::type_mismatch(None, "date/time", &other.to_string())),
            },
            ENUM_TOKEN => match self.value_of(value)? {
                TsonValue::String(name) => Ok(TsonValue::Enum {
                    name,
                    ordinal: None,
                }),
                other => Err(Error::type_mismatch(None, "variant name", &other.to_string())),
            },
            RECORD_TOKEN => match self.value_of(value)? {
                TsonValue::Map(entries) => entries
                    .into_iter()
                    .map(|(k, v)| match k {
                        TsonValue::String(name) => Ok((name, v)),
                        other => Err(Error::type_mismatch(None, "field name", &other.to_string())),
                    })
                    .collect::<Result<TsonMap>>()
                    .map(TsonValue::Record),
                record @ TsonValue::Record(_) => Ok(record),
                other => Err(Error::type_mismatch(None, "record", &other.to_string())),
            },
            // Member markers only matter to the enclosing record.
            _ => value.serialize(self),
        }
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<TsonValue>
    where
        T: ?Sized + Serialize,
    {
        Ok(variant_record(variant, self.value_of(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(self, len.unwrap_or(0), false))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(self, len, true))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(self, len, true))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            variant,
            items: SerializeVec::new(self, len, true),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap {
            ser: self,
            entries: Vec::with_capacity(len.unwrap_or(0)),
            next_key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<SerializeRecord> {
        Ok(SerializeRecord {
            ser: self,
            fields: TsonMap::with_capacity(len),
            ignored: Vec::new(),
            config: None,
            multi_array: name == MULTIARRAY_TOKEN,
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeStructVariant> {
        Ok(SerializeStructVariant {
            variant,
            record: self.serialize_struct(name, len)?,
        })
    }
}

/// Collects sequence and tuple elements.
pub struct SerializeVec {
    ser: ValueSerializer,
    vec: Vec<TsonValue>,
    tuple: bool,
}

impl SerializeVec {
    fn new(ser: ValueSerializer, len: usize, tuple: bool) -> Self {
        SerializeVec {
            ser,
            vec: Vec::with_capacity(len),
            tuple,
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let index = self.vec.len();
        let value = self
            .ser
            .value_of(value)
            .map_err(|e| Error::member(&format!("[{}]", index), type_name::<T>(), e))?;
        self.vec.push(value);
        Ok(())
    }

    fn finish(self) -> TsonValue {
        if self.tuple {
            TsonValue::Tuple(self.vec)
        } else {
            TsonValue::Sequence(self.vec)
        }
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = TsonValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<TsonValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = TsonValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<TsonValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = TsonValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<TsonValue> {
        Ok(self.finish())
    }
}

/// Collects a tuple variant, written as `{Variant:(Item1:...)}`.
pub struct SerializeTupleVariant {
    variant: &'static str,
    items: SerializeVec,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = TsonValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(value)
    }

    fn end(self) -> Result<TsonValue> {
        Ok(variant_record(self.variant, self.items.finish()))
    }
}

/// Collects map entries in insertion order.
pub struct SerializeMap {
    ser: ValueSerializer,
    entries: Vec<(TsonValue, TsonValue)>,
    next_key: Option<TsonValue>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = TsonValue;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.next_key = Some(self.ser.value_of(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        let value = self
            .ser
            .value_of(value)
            .map_err(|e| Error::member(&key.to_string(), type_name::<T>(), e))?;
        self.entries.push((key, value));
        Ok(())
    }

    fn end(self) -> Result<TsonValue> {
        Ok(TsonValue::Map(self.entries))
    }
}

/// Collects record members and applies member filtering on `end`.
pub struct SerializeRecord {
    ser: ValueSerializer,
    fields: TsonMap,
    ignored: Vec<&'static str>,
    config: Option<Vec<String>>,
    multi_array: bool,
}

impl SerializeRecord {
    fn into_multi_array(mut self) -> Result<TsonValue> {
        let dims = match self.fields.remove("dims") {
            Some(TsonValue::Sequence(dims)) => dims
                .iter()
                .map(|d| {
                    d.as_u64()
                        .and_then(|d| usize::try_from(d).ok())
                        .ok_or_else(|| Error::type_mismatch(None, "dimension size", &d.to_string()))
                })
                .collect::<Result<Vec<usize>>>()?,
            _ => return Err(Error::custom("multi-dimensional array without dimensions")),
        };
        let data = match self.fields.remove("data") {
            Some(TsonValue::Sequence(data)) => data,
            _ => return Err(Error::custom("multi-dimensional array without elements")),
        };
        if dims.is_empty() || element_count(&dims) != Some(data.len()) {
            return Err(Error::custom(format!(
                "multi-dimensional array of shape {:?} cannot hold {} elements",
                dims,
                data.len()
            )));
        }
        Ok(TsonValue::MultiArray { dims, data })
    }

    fn filter(mut self) -> TsonMap {
        let settings = self.ser.settings;
        if let Some(excluded) = &self.config {
            self.fields.retain(|name, _| !excluded.contains(name));
        } else if settings.check_member_attributes {
            let ignored = &self.ignored;
            self.fields.retain(|name, _| !ignored.contains(&name.as_str()));
        }
        if settings.ignore_null_values {
            self.fields.retain(|_, value| !value.is_null());
        }
        if settings.ignore_default_values {
            self.fields.retain(|_, value| !value.is_default());
        }
        self.fields
    }
}

impl ser::SerializeStruct for SerializeRecord {
    type Ok = TsonValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        if !self.multi_array {
            match probe_marker(value) {
                Marker::Config(excluded) => {
                    self.config = Some(excluded);
                    return Ok(());
                }
                Marker::Ignored => self.ignored.push(key),
                Marker::Plain => {}
            }
        }

        let value = self
            .ser
            .value_of(value)
            .map_err(|e| Error::member(key, type_name::<T>(), e))?;
        self.fields.insert(key.to_string(), value);
        Ok(())
    }

    fn end(self) -> Result<TsonValue> {
        if self.multi_array {
            self.into_multi_array()
        } else {
            Ok(TsonValue::Record(self.filter()))
        }
    }
}

/// Collects a struct variant, written as `{Variant:{...}}`.
pub struct SerializeStructVariant {
    variant: &'static str,
    record: SerializeRecord,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = TsonValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeStruct::serialize_field(&mut self.record, key, value)
    }

    fn end(self) -> Result<TsonValue> {
        let record = ser::SerializeStruct::end(self.record)?;
        Ok(variant_record(self.variant, record))
    }
}

/// Converts a value to a [`TsonValue`] tree under `settings`.
pub fn to_value_with_settings<T>(value: &T, settings: TsonSettings) -> Result<TsonValue>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer::new(settings))
}

fn indent(output: &mut String, depth: usize) {
    output.push('\n');
    for _ in 0..depth {
        output.push('\t');
    }
}

fn name_separator(output: &mut String, settings: &TsonSettings) {
    output.push(':');
    if settings.use_indentation {
        output.push(' ');
    }
}

/// Writes `items` between `open` and `close`, comma separated.
///
/// With indentation each item goes on its own line one tab deeper than the
/// composite. Empty composites stay on one line.
fn write_items<I, F>(
    output: &mut String,
    open: &str,
    close: char,
    items: I,
    settings: &TsonSettings,
    depth: usize,
    mut write_item: F,
) where
    I: IntoIterator,
    F: FnMut(&mut String, I::Item, usize),
{
    output.push_str(open);
    let mut any = false;
    for item in items {
        if any {
            output.push(',');
        }
        if settings.use_indentation {
            indent(output, depth + 1);
        }
        write_item(output, item, depth + 1);
        any = true;
    }
    if any && settings.use_indentation {
        indent(output, depth);
    }
    output.push(close);
}

enum TupleSlot<'a> {
    Item(usize, &'a TsonValue),
    Rest(&'a [TsonValue]),
}

fn write_tuple(output: &mut String, items: &[TsonValue], settings: &TsonSettings, depth: usize) {
    let (head, rest) = if items.len() > TUPLE_ARITY {
        items.split_at(TUPLE_ARITY)
    } else {
        (items, &[][..])
    };
    let slots = head
        .iter()
        .enumerate()
        .map(|(i, item)| TupleSlot::Item(i + 1, item))
        .chain((!rest.is_empty()).then_some(TupleSlot::Rest(rest)));

    write_items(output, "(", ')', slots, settings, depth, |out, slot, depth| match slot {
        TupleSlot::Item(n, item) => {
            out.push_str(TUPLE_ITEM);
            out.push_str(&n.to_string());
            name_separator(out, settings);
            write_value(out, item, settings, depth);
        }
        TupleSlot::Rest(rest) => {
            out.push_str(TUPLE_REST);
            name_separator(out, settings);
            write_tuple(out, rest, settings, depth);
        }
    });
}

fn write_multi_array(
    output: &mut String,
    dims: &[usize],
    data: &[TsonValue],
    settings: &TsonSettings,
    depth: usize,
) {
    output.push_str("[<");
    for (i, d) in dims.iter().enumerate() {
        if i > 0 {
            output.push(',');
        }
        output.push_str(&d.to_string());
    }
    output.push('>');

    if data.is_empty() {
        output.push(']');
        return;
    }

    // One line per run of the fastest dimension.
    let mut odometer = Odometer::new(dims);
    if settings.use_indentation {
        indent(output, depth + 1);
    }
    for (i, item) in data.iter().enumerate() {
        write_value(output, item, settings, depth + 1);
        let wrapped = odometer.advance();
        if i + 1 < data.len() {
            output.push(',');
            if settings.use_indentation && wrapped > 0 {
                indent(output, depth + 1);
            }
        }
    }
    if settings.use_indentation {
        indent(output, depth);
    }
    output.push(']');
}

/// Writes the canonical text of `value` at nesting level `depth`.
pub fn write_value(output: &mut String, value: &TsonValue, settings: &TsonSettings, depth: usize) {
    match value {
        TsonValue::Null => output.push_str(NULL_LITERAL),
        TsonValue::Bool(true) => output.push_str(TRUE_LITERAL),
        TsonValue::Bool(false) => output.push_str(FALSE_LITERAL),
        TsonValue::Number(n) => output.push_str(&n.to_string()),
        TsonValue::Char(c) => write_char(output, *c),
        TsonValue::String(s) => write_string(output, s),
        TsonValue::DateTime(dt) => write_string(output, &format_datetime(dt)),
        TsonValue::Enum { name, .. } => write_name(output, name),
        TsonValue::Sequence(items) => {
            write_items(output, "[", ']', items, settings, depth, |out, item, depth| {
                write_value(out, item, settings, depth)
            });
        }
        TsonValue::Map(entries) => {
            write_items(output, "[", ']', entries, settings, depth, |out, (k, v), depth| {
                if k.kind().is_composite() {
                    out.push('@');
                }
                write_value(out, k, settings, depth);
                name_separator(out, settings);
                write_value(out, v, settings, depth);
            });
        }
        TsonValue::Tuple(items) => write_tuple(output, items, settings, depth),
        TsonValue::Record(fields) => {
            write_items(output, "{", '}', fields, settings, depth, |out, (name, v), depth| {
                write_name(out, name);
                name_separator(out, settings);
                write_value(out, v, settings, depth);
            });
        }
        TsonValue::MultiArray { dims, data } => {
            write_multi_array(output, dims, data, settings, depth)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tson, Ignored};
    use serde::Serialize;
    use std::collections::BTreeMap;

    fn compact(value: &TsonValue) -> String {
        let mut out = String::new();
        write_value(&mut out, value, &TsonSettings::new(), 0);
        out
    }

    fn pretty(value: &TsonValue) -> String {
        let mut out = String::new();
        write_value(&mut out, value, &TsonSettings::pretty(), 0);
        out
    }

    #[test]
    fn test_scalars() {
        assert_eq!(compact(&TsonValue::Bool(true)), "True");
        assert_eq!(compact(&TsonValue::Bool(false)), "False");
        assert_eq!(compact(&TsonValue::Null), "()");
        assert_eq!(compact(&TsonValue::from(-12)), "-12");
        assert_eq!(compact(&TsonValue::from(2.5)), "2.5");
        assert_eq!(compact(&TsonValue::from('\'')), "'\\''");
        assert_eq!(compact(&TsonValue::from("a\"b")), "\"a\\\"b\"");
    }

    #[test]
    fn test_map_with_complex_keys() {
        let value = TsonValue::Map(vec![
            (TsonValue::Sequence(vec![TsonValue::from(1)]), TsonValue::from("one")),
            (TsonValue::from(2), TsonValue::from("two")),
        ]);
        assert_eq!(compact(&value), "[@[1]:\"one\",2:\"two\"]");
    }

    #[test]
    fn test_long_tuple_nests_rest() {
        let items: Vec<TsonValue> = (1..=9).map(TsonValue::from).collect();
        assert_eq!(
            compact(&TsonValue::Tuple(items)),
            "(Item1:1,Item2:2,Item3:3,Item4:4,Item5:5,Item6:6,Item7:7,Rest:(Item1:8,Item2:9))"
        );
    }

    #[test]
    fn test_seven_tuple_has_no_rest() {
        let items: Vec<TsonValue> = (1..=7).map(TsonValue::from).collect();
        assert!(!compact(&TsonValue::Tuple(items)).contains("Rest"));
    }

    #[test]
    fn test_pretty_record() {
        let value = tson!({ "name": "Ann", "tags": ["a"], "empty": [] });
        assert_eq!(
            pretty(&value),
            "{\n\tname: \"Ann\",\n\ttags: [\n\t\t\"a\"\n\t],\n\tempty: []\n}"
        );
    }

    #[test]
    fn test_pretty_multi_array_rows() {
        let value = TsonValue::MultiArray {
            dims: vec![2, 3],
            data: (1..=6).map(TsonValue::from).collect(),
        };
        assert_eq!(compact(&value), "[<2,3>1,2,3,4,5,6]");
        assert_eq!(pretty(&value), "[<2,3>\n\t1,2,3,\n\t4,5,6\n]");
    }

    #[test]
    fn test_empty_multi_array() {
        let value = TsonValue::MultiArray {
            dims: vec![2, 0],
            data: vec![],
        };
        assert_eq!(pretty(&value), "[<2,0>]");
    }

    #[derive(Serialize)]
    enum Shape {
        Dot,
        Circle(f64),
        Rect { w: u32, h: u32 },
        Line(i32, i32),
    }

    #[test]
    fn test_enum_forms() {
        let settings = TsonSettings::new();
        let text = |s: &Shape| compact(&to_value_with_settings(s, settings).unwrap());
        assert_eq!(text(&Shape::Dot), "Dot");
        assert_eq!(text(&Shape::Circle(1.5)), "{Circle:1.5}");
        assert_eq!(text(&Shape::Rect { w: 2, h: 3 }), "{Rect:{w:2,h:3}}");
        assert_eq!(text(&Shape::Line(1, 2)), "{Line:(Item1:1,Item2:2)}");
    }

    #[derive(Serialize)]
    struct Sample {
        id: u32,
        note: Option<String>,
        count: i64,
        secret: Ignored<String>,
    }

    fn sample() -> Sample {
        Sample {
            id: 1,
            note: None,
            count: 0,
            secret: Ignored::new("s".to_string()),
        }
    }

    #[test]
    fn test_record_filtering() {
        let value = to_value_with_settings(&sample(), TsonSettings::new()).unwrap();
        assert_eq!(compact(&value), "{id:1,note:(),count:0}");

        let settings = TsonSettings::new().with_ignore_null_values(true);
        let value = to_value_with_settings(&sample(), settings).unwrap();
        assert_eq!(compact(&value), "{id:1,count:0}");

        let settings = TsonSettings::new()
            .with_ignore_default_values(true)
            .with_check_member_attributes(false);
        let value = to_value_with_settings(&sample(), settings).unwrap();
        assert_eq!(compact(&value), "{id:1,secret:\"s\"}");
    }

    #[test]
    fn test_filtering_never_leaves_trailing_comma() {
        let settings = TsonSettings::new()
            .with_ignore_null_values(true)
            .with_ignore_default_values(true);
        let mut s = sample();
        s.id = 0;
        let value = to_value_with_settings(&s, settings).unwrap();
        assert_eq!(compact(&value), "{}");
    }

    #[test]
    fn test_map_filtering_does_not_apply() {
        let mut map = BTreeMap::new();
        map.insert("a", None::<i32>);
        let settings = TsonSettings::new().with_ignore_null_values(true);
        let value = to_value_with_settings(&map, settings).unwrap();
        assert_eq!(compact(&value), "[\"a\":()]");
    }

    #[derive(Serialize)]
    struct Outer {
        inner: Inner,
    }

    struct Inner;

    impl Serialize for Inner {
        fn serialize<S: ser::Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
            Err(ser::Error::custom("boom"))
        }
    }

    #[test]
    fn test_member_error_context() {
        let err = to_value_with_settings(&Outer { inner: Inner }, TsonSettings::new()).unwrap_err();
        match err {
            Error::Member {
                member, type_name, ..
            } => {
                assert_eq!(member, "inner");
                assert!(type_name.ends_with("Inner"));
            }
            other => panic!("Expected member error, got {:?}", other),
        }
    }
}
