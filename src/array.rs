//! Multi-dimensional arrays.
//!
//! [`MultiArray`] stores its elements flat, in row-major order, next to the
//! size of each dimension. TSON writes it as `[<d1,...,dn>e1,...,em]`; other
//! serde formats see a plain `{dims, data}` struct.
//!
//! [`Odometer`] enumerates coordinates in that same row-major order: starting
//! at all zeros, the last coordinate is incremented after each element and
//! carries into the previous one when it passes its dimension's size.
//!
//! ```rust
//! use serde_tson::{to_string, MultiArray};
//!
//! let grid = MultiArray::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
//! assert_eq!(to_string(&grid).unwrap(), "[<2,2>1,2,3,4]");
//! assert_eq!(grid.get(&[1, 0]), Some(&3));
//! ```

use crate::grammar::{MULTIARRAY_FIELDS, MULTIARRAY_TOKEN};
use crate::{Error, Result};
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// Number of elements a shape holds, or `None` on overflow.
#[must_use]
pub fn element_count(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Row-major coordinate iterator over a shape.
///
/// # Examples
///
/// ```rust
/// use serde_tson::Odometer;
///
/// let coords: Vec<Vec<usize>> = Odometer::new(&[2, 2]).collect();
/// assert_eq!(coords, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
/// ```
#[derive(Debug, Clone)]
pub struct Odometer {
    dims: Vec<usize>,
    current: Vec<usize>,
    remaining: usize,
}

impl Odometer {
    pub fn new(dims: &[usize]) -> Self {
        Odometer {
            dims: dims.to_vec(),
            current: vec![0; dims.len()],
            remaining: element_count(dims).unwrap_or(0),
        }
    }

    /// The coordinate of the next element.
    #[inline]
    pub fn index(&self) -> &[usize] {
        &self.current
    }

    /// Steps to the next coordinate and returns how many trailing dimensions
    /// wrapped back to zero.
    pub fn advance(&mut self) -> usize {
        if self.remaining == 0 {
            return 0;
        }
        self.remaining -= 1;

        let mut wrapped = 0;
        for axis in (0..self.dims.len()).rev() {
            self.current[axis] += 1;
            if self.current[axis] < self.dims[axis] {
                break;
            }
            if axis > 0 {
                self.current[axis] = 0;
            }
            wrapped += 1;
        }
        wrapped
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl Iterator for Odometer {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.remaining == 0 {
            return None;
        }
        let index = self.current.clone();
        self.advance();
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// A rectangular array of any rank.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiArray<T> {
    dims: Vec<usize>,
    data: Vec<T>,
}

impl<T> MultiArray<T> {
    /// Creates an array from its shape and row-major elements.
    ///
    /// Fails when the element count is not the product of the dimensions.
    pub fn new(dims: Vec<usize>, data: Vec<T>) -> Result<Self> {
        match element_count(&dims) {
            Some(count) if count == data.len() && !dims.is_empty() => Ok(MultiArray { dims, data }),
            _ => Err(Error::custom(format!(
                "multi-dimensional array of shape {:?} cannot hold {} elements",
                dims,
                data.len()
            ))),
        }
    }

    /// Creates an array by calling `f` with each coordinate in row-major order.
    pub fn from_fn<F>(dims: Vec<usize>, mut f: F) -> Result<Self>
    where
        F: FnMut(&[usize]) -> T,
    {
        let data = Odometer::new(&dims).map(|index| f(&index)).collect();
        MultiArray::new(dims, data)
    }

    /// Builds a two-dimensional array from equally long rows.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return Err(Error::custom("rows of a two-dimensional array differ in length"));
        }
        let dims = vec![rows.len(), width];
        MultiArray::new(dims, rows.into_iter().flatten().collect())
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The elements in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    fn offset(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.dims.len() {
            return None;
        }
        let mut offset = 0;
        for (&i, &d) in index.iter().zip(&self.dims) {
            if i >= d {
                return None;
            }
            offset = offset * d + i;
        }
        Some(offset)
    }

    /// Returns the element at `index`, or `None` when it is out of bounds or
    /// has the wrong rank.
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        self.offset(index).and_then(|o| self.data.get(o))
    }

    pub fn get_mut(&mut self, index: &[usize]) -> Option<&mut T> {
        self.offset(index).and_then(move |o| self.data.get_mut(o))
    }

    /// Iterates over `(coordinate, element)` pairs in row-major order.
    pub fn indexed(&self) -> impl Iterator<Item = (Vec<usize>, &T)> + '_ {
        Odometer::new(&self.dims).zip(self.data.iter())
    }
}

impl<T: Clone> MultiArray<T> {
    /// Creates an array of the given shape with every element set to `value`.
    pub fn filled(dims: Vec<usize>, value: T) -> Result<Self> {
        let count = element_count(&dims)
            .ok_or_else(|| Error::custom("multi-dimensional array shape overflows"))?;
        MultiArray::new(dims, vec![value; count])
    }
}

impl<T: Serialize> Serialize for MultiArray<T> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut array = serializer.serialize_struct(MULTIARRAY_TOKEN, 2)?;
        array.serialize_field("dims", &self.dims)?;
        array.serialize_field("data", &self.data)?;
        array.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for MultiArray<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MultiArrayVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for MultiArrayVisitor<T> {
            type Value = MultiArray<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a multi-dimensional array")
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let dims: Vec<usize> = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let data: Vec<T> = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                MultiArray::new(dims, data).map_err(de::Error::custom)
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut dims: Option<Vec<usize>> = None;
                let mut data: Option<Vec<T>> = None;
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "dims" => dims = Some(map.next_value()?),
                        "data" => data = Some(map.next_value()?),
                        _ => {
                            map.next_value::<de::IgnoredAny>()?;
                        }
                    }
                }
                let dims = dims.ok_or_else(|| de::Error::missing_field("dims"))?;
                let data = data.ok_or_else(|| de::Error::missing_field("data"))?;
                MultiArray::new(dims, data).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_struct(
            MULTIARRAY_TOKEN,
            MULTIARRAY_FIELDS,
            MultiArrayVisitor(PhantomData),
        )
    }
}
