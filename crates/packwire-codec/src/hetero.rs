use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, RandomState};

use crate::packer::PackerRef;
use crate::value::Value;

/// One self-describing heterogeneous-map entry.
#[derive(Clone, Debug)]
pub struct Entry {
    pub key: Value,
    pub key_packer: PackerRef,
    pub value: Value,
    pub value_packer: PackerRef,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.value == other.value
            && self.key_packer.tag() == other.key_packer.tag()
            && self.value_packer.tag() == other.value_packer.tag()
    }
}

/// An ordered map whose entries each carry the packers for their own key
/// and value.
///
/// The container never infers a wire type from a value: whoever inserts an
/// entry decides which packer represents it, so the same runtime value may
/// travel under different type ids. Iteration order is insertion order,
/// which is also the wire order.
#[derive(Clone, Default)]
pub struct HeteroMap {
    entries: Vec<Entry>,
    /// Key hash to entry positions.
    index: HashMap<u64, Vec<usize>>,
    hasher: RandomState,
}

impl HeteroMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            hasher: RandomState::new(),
        }
    }

    /// Insert an entry. An existing entry with an equal key is replaced in
    /// place, keeping its position, and its value is returned.
    pub fn insert(
        &mut self,
        key: impl Into<Value>,
        key_packer: PackerRef,
        value: impl Into<Value>,
        value_packer: PackerRef,
    ) -> Option<Value> {
        let entry = Entry {
            key: key.into(),
            key_packer,
            value: value.into(),
            value_packer,
        };
        let hash = self.hasher.hash_one(&entry.key);
        match self.find(hash, &entry.key) {
            Some(index) => {
                let old = std::mem::replace(&mut self.entries[index], entry);
                Some(old.value)
            }
            None => {
                self.index.entry(hash).or_default().push(self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.get_entry(key).map(|entry| &entry.value)
    }

    pub fn get_entry(&self, key: &Value) -> Option<&Entry> {
        self.position(key).map(|index| &self.entries[index])
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.position(key).is_some()
    }

    /// Remove an entry, preserving the order of the rest.
    pub fn remove(&mut self, key: &Value) -> Option<Entry> {
        let index = self.position(key)?;
        let removed = self.entries.remove(index);
        for positions in self.index.values_mut() {
            positions.retain(|&pos| pos != index);
            positions.iter_mut().filter(|pos| **pos > index).for_each(|pos| *pos -= 1);
        }
        self.index.retain(|_, positions| !positions.is_empty());
        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|entry| &entry.key)
    }

    fn position(&self, key: &Value) -> Option<usize> {
        self.find(self.hasher.hash_one(key), key)
    }

    fn find(&self, hash: u64, key: &Value) -> Option<usize> {
        self.index
            .get(&hash)?
            .iter()
            .copied()
            .find(|&index| &self.entries[index].key == key)
    }
}

impl PartialEq for HeteroMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl fmt::Debug for HeteroMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.entries).finish()
    }
}

impl<'a> IntoIterator for &'a HeteroMap {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for HeteroMap {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;

    fn sample() -> HeteroMap {
        let mut map = HeteroMap::new();
        map.insert("name", builtin::string(), "agnos", builtin::string());
        map.insert(7i32, builtin::int32(), 1.5f64, builtin::float());
        map.insert("flag", builtin::string(), true, builtin::boolean());
        map
    }

    #[test]
    fn keeps_insertion_order() {
        let map = sample();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![Value::from("name"), Value::Int32(7), Value::from("flag")]
        );
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut map = sample();
        let old = map.insert(7i32, builtin::int32(), "seven", builtin::string());
        assert_eq!(old, Some(Value::Float(1.5)));
        assert_eq!(map.len(), 3);
        assert_eq!(map.iter().nth(1).unwrap().value, Value::from("seven"));
        assert_eq!(map.get_entry(&Value::Int32(7)).unwrap().value_packer.tag(), builtin::STR);
    }

    #[test]
    fn lookup_and_remove() {
        let mut map = sample();
        assert_eq!(map.get(&Value::from("name")), Some(&Value::from("agnos")));
        assert!(map.contains_key(&Value::from("flag")));
        assert!(map.get(&Value::Int64(7)).is_none());

        let removed = map.remove(&Value::from("name")).unwrap();
        assert_eq!(removed.value, Value::from("agnos"));
        assert_eq!(map.keys().next(), Some(&Value::Int32(7)));
        assert!(map.remove(&Value::from("name")).is_none());
    }

    #[test]
    fn index_survives_removal() {
        let mut map = HeteroMap::new();
        for key in 0..100i32 {
            map.insert(key, builtin::int32(), i64::from(key), builtin::int64());
        }
        map.remove(&Value::Int32(10)).unwrap();
        map.remove(&Value::Int32(0)).unwrap();

        assert_eq!(map.len(), 98);
        assert_eq!(map.keys().next(), Some(&Value::Int32(1)));
        for key in (1..100i32).filter(|key| *key != 10) {
            assert_eq!(map.get(&Value::Int32(key)), Some(&Value::Int64(key.into())));
        }
        assert!(!map.contains_key(&Value::Int32(10)));

        map.insert(10i32, builtin::int32(), 0i64, builtin::int64());
        assert_eq!(map.keys().last(), Some(&Value::Int32(10)));
        assert_eq!(map.len(), 99);
    }

    #[test]
    fn float_zero_keys_collapse() {
        let mut map = HeteroMap::new();
        map.insert(0.0f64, builtin::float(), 1i32, builtin::int32());
        let old = map.insert(-0.0f64, builtin::float(), 2i32, builtin::int32());
        assert_eq!(old, Some(Value::Int32(1)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn equality_includes_packer_ids() {
        let mut a = HeteroMap::new();
        a.insert(1i32, builtin::int32(), 2i64, builtin::int64());
        let mut b = HeteroMap::new();
        b.insert(1i32, builtin::int32(), 2i64, builtin::int64());
        assert_eq!(a, b);

        let mut c = HeteroMap::new();
        c.insert(1i32, builtin::int64(), 2i64, builtin::int64());
        assert_ne!(a, c);
    }

    #[test]
    fn into_iterator_variants() {
        let map = sample();
        assert_eq!((&map).into_iter().count(), 3);
        let owned: Vec<Entry> = map.into_iter().collect();
        assert_eq!(owned.len(), 3);
        assert!(!owned.is_empty());
    }
}
