//! Ordered field map for TSON records.
//!
//! This module provides [`TsonMap`], a wrapper around [`IndexMap`] that keeps
//! record fields in insertion order. Field order is part of the canonical
//! encoding: a record is written in the order its members were enumerated, and a
//! record read from text keeps the order of the text.
//!
//! ## Examples
//!
//! ```rust
//! use serde_tson::{TsonMap, TsonValue};
//!
//! let mut map = TsonMap::new();
//! map.insert("name".to_string(), TsonValue::from("Alice"));
//! map.insert("age".to_string(), TsonValue::from(30));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! assert_eq!(TsonValue::from(map).to_string(), "{name:\"Alice\",age:30}");
//! ```

use crate::TsonValue;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// An insertion-ordered map of field names to TSON values.
///
/// # Examples
///
/// ```rust
/// use serde_tson::{TsonMap, TsonValue};
///
/// let mut map = TsonMap::new();
/// map.insert("first".to_string(), TsonValue::from(1));
/// map.insert("second".to_string(), TsonValue::from(2));
///
/// // Iteration maintains insertion order
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TsonMap(IndexMap<String, TsonValue>);

impl TsonMap {
    /// Creates an empty `TsonMap`.
    #[must_use]
    pub fn new() -> Self {
        TsonMap(IndexMap::new())
    }

    /// Creates an empty `TsonMap` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        TsonMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a field.
    ///
    /// A field that already exists keeps its position and gets the new value;
    /// the old value is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tson::{TsonMap, TsonValue};
    ///
    /// let mut map = TsonMap::new();
    /// assert!(map.insert("key".to_string(), TsonValue::from(42)).is_none());
    /// assert!(map.insert("key".to_string(), TsonValue::from(43)).is_some());
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&mut self, key: String, value: TsonValue) -> Option<TsonValue> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TsonValue> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut TsonValue> {
        self.0.get_mut(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes a field, keeping the order of the remaining ones.
    pub fn remove(&mut self, key: &str) -> Option<TsonValue> {
        self.0.shift_remove(key)
    }

    /// Keeps only the fields for which `keep` returns `true`.
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&String, &mut TsonValue) -> bool,
    {
        self.0.retain(keep);
    }

    /// Returns the number of fields in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map contains no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the field names, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, TsonValue> {
        self.0.keys()
    }

    /// Returns an iterator over the field values, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, TsonValue> {
        self.0.values()
    }

    /// Returns an iterator over the fields, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, TsonValue> {
        self.0.iter()
    }
}

impl Serialize for TsonMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl From<HashMap<String, TsonValue>> for TsonMap {
    fn from(map: HashMap<String, TsonValue>) -> Self {
        TsonMap(map.into_iter().collect())
    }
}

impl From<TsonMap> for HashMap<String, TsonValue> {
    fn from(map: TsonMap) -> Self {
        map.0.into_iter().collect()
    }
}

impl IntoIterator for TsonMap {
    type Item = (String, TsonValue);
    type IntoIter = indexmap::map::IntoIter<String, TsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TsonMap {
    type Item = (&'a String, &'a TsonValue);
    type IntoIter = indexmap::map::Iter<'a, String, TsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, TsonValue)> for TsonMap {
    fn from_iter<T: IntoIterator<Item = (String, TsonValue)>>(iter: T) -> Self {
        TsonMap(IndexMap::from_iter(iter))
    }
}
