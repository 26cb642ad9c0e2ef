//! Homogeneous collection packers.
//!
//! Both collections write a 4-byte count and then their elements back to
//! back with a fixed element packer. There are no per-element type tags; use
//! [`HeteroMapPacker`](crate::HeteroMapPacker) when entries differ in type.

use std::borrow::Cow;
use std::io::{Read, Write};

use crate::error::{type_mismatch, Result};
use crate::packer::Packer;
use crate::primitive::{pack_len, unpack_len};
use crate::value::Value;

/// Cap on elements reserved up front; counts come off the wire.
const MAX_PREALLOC_ITEMS: usize = 1024;

/// A list whose elements all share one packer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOf<P> {
    id: i32,
    element: P,
}

impl<P: Packer> ListOf<P> {
    pub const fn new(id: i32, element: P) -> Self {
        Self { id, element }
    }

    pub fn element(&self) -> &P {
        &self.element
    }
}

impl<P: Packer> Packer for ListOf<P> {
    type Value = Vec<P::Value>;

    fn type_id(&self) -> i32 {
        self.id
    }

    fn pack<W: Write + ?Sized>(&self, value: &Vec<P::Value>, writer: &mut W) -> Result<()> {
        pack_len(value.len(), writer)?;
        for item in value {
            self.element.pack(item, writer)?;
        }
        Ok(())
    }

    fn unpack<R: Read + ?Sized>(&self, reader: &mut R) -> Result<Vec<P::Value>> {
        let len = unpack_len(reader)?;
        let mut items = Vec::with_capacity(len.min(MAX_PREALLOC_ITEMS));
        for _ in 0..len {
            items.push(self.element.unpack(reader)?);
        }
        Ok(items)
    }

    fn into_value(&self, value: Vec<P::Value>) -> Value {
        Value::List(
            value
                .into_iter()
                .map(|item| self.element.into_value(item))
                .collect(),
        )
    }

    fn from_value<'v>(&self, value: &'v Value) -> Result<Cow<'v, Vec<P::Value>>> {
        let Value::List(items) = value else {
            return Err(type_mismatch("list", value));
        };
        items
            .iter()
            .map(|item| self.element.from_value(item).map(Cow::into_owned))
            .collect::<Result<Vec<_>>>()
            .map(Cow::Owned)
    }
}

/// A key/value map with one packer for keys and one for values.
///
/// Pairs are kept in insertion order on both sides of the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapOf<K, V> {
    id: i32,
    key: K,
    value: V,
}

impl<K: Packer, V: Packer> MapOf<K, V> {
    pub const fn new(id: i32, key: K, value: V) -> Self {
        Self { id, key, value }
    }

    pub fn key_packer(&self) -> &K {
        &self.key
    }

    pub fn value_packer(&self) -> &V {
        &self.value
    }
}

impl<K: Packer, V: Packer> Packer for MapOf<K, V> {
    type Value = Vec<(K::Value, V::Value)>;

    fn type_id(&self) -> i32 {
        self.id
    }

    fn pack<W: Write + ?Sized>(&self, value: &Self::Value, writer: &mut W) -> Result<()> {
        pack_len(value.len(), writer)?;
        for (key, val) in value {
            self.key.pack(key, writer)?;
            self.value.pack(val, writer)?;
        }
        Ok(())
    }

    fn unpack<R: Read + ?Sized>(&self, reader: &mut R) -> Result<Self::Value> {
        let len = unpack_len(reader)?;
        let mut pairs = Vec::with_capacity(len.min(MAX_PREALLOC_ITEMS));
        for _ in 0..len {
            let key = self.key.unpack(reader)?;
            let val = self.value.unpack(reader)?;
            pairs.push((key, val));
        }
        Ok(pairs)
    }

    fn into_value(&self, value: Self::Value) -> Value {
        Value::Map(
            value
                .into_iter()
                .map(|(key, val)| (self.key.into_value(key), self.value.into_value(val)))
                .collect(),
        )
    }

    fn from_value<'v>(&self, value: &'v Value) -> Result<Cow<'v, Self::Value>> {
        let Value::Map(pairs) = value else {
            return Err(type_mismatch("map", value));
        };
        pairs
            .iter()
            .map(|(key, val)| {
                let key = self.key.from_value(key)?.into_owned();
                let val = self.value.from_value(val)?.into_owned();
                Ok((key, val))
            })
            .collect::<Result<Vec<_>>>()
            .map(Cow::Owned)
    }
}
