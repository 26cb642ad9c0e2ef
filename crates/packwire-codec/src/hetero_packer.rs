//! The self-describing heterogeneous-map codec.
//!
//! Wire layout: a 4-byte entry count, then for every entry
//! `key type id (int32), key bytes, value type id (int32), value bytes`.
//! Decoding resolves each id through a [`TypeRegistry`]: the sentinel 998
//! re-enters this packer, builtin ids hit the fixed table, anything else
//! must be in the session's custom table.

use std::borrow::Cow;
use std::io::{Read, Write};
use std::sync::Arc;

use tracing::trace;

use crate::builtin;
use crate::error::{type_mismatch, PackError, Result};
use crate::hetero::HeteroMap;
use crate::packer::{Packer, PackerRef};
use crate::primitive::{pack_len, unpack_len, Int32};
use crate::registry::{Resolved, TypeRegistry};
use crate::value::Value;

/// Cap on entries reserved up front; counts come off the wire.
const MAX_PREALLOC_ENTRIES: usize = 1024;

/// Encodes and decodes a [`HeteroMap`] against a session registry.
#[derive(Debug, Clone)]
pub struct HeteroMapPacker {
    id: i32,
    registry: Arc<TypeRegistry>,
}

impl HeteroMapPacker {
    /// A packer tagged with the sentinel id 998.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_id(builtin::HETERO_MAP, registry)
    }

    /// A packer tagged with a caller-chosen id, e.g. a generated struct that
    /// travels as a heterogeneous map.
    pub fn with_id(id: i32, registry: Arc<TypeRegistry>) -> Self {
        Self { id, registry }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Packer recorded for nested maps: sentinel-tagged, same registry.
    fn nested(&self) -> PackerRef {
        Arc::new(Self::new(Arc::clone(&self.registry)))
    }

    fn pack_map(&self, map: &HeteroMap, writer: &mut dyn Write) -> Result<()> {
        pack_len(map.len(), writer)?;
        for entry in map {
            Int32.pack(&entry.key_packer.tag(), writer)?;
            entry.key_packer.pack_value(&entry.key, writer)?;
            Int32.pack(&entry.value_packer.tag(), writer)?;
            entry.value_packer.pack_value(&entry.value, writer)?;
        }
        Ok(())
    }

    fn unpack_at_depth(&self, reader: &mut dyn Read, depth: usize) -> Result<HeteroMap> {
        let config = self.registry.config();
        if depth > config.max_depth {
            return Err(PackError::Decode(format!(
                "heteromap nesting exceeds {} levels",
                config.max_depth
            )));
        }

        let count = unpack_len(reader)?;
        if count > config.max_entries {
            return Err(PackError::Decode(format!(
                "heteromap entry count {count} exceeds limit {}",
                config.max_entries
            )));
        }

        let mut map = HeteroMap::with_capacity(count.min(MAX_PREALLOC_ENTRIES));
        for index in 0..count {
            let key_tag = Int32.unpack(reader)?;
            let (key, key_packer) = self.unpack_tagged(reader, key_tag, depth)?;
            let value_tag = Int32.unpack(reader)?;
            let (value, value_packer) = self.unpack_tagged(reader, value_tag, depth)?;
            trace!(index, depth, key_tag, value_tag, "decoded heteromap entry");
            if map.contains_key(&key) {
                return Err(PackError::Decode(format!(
                    "heteromap entry {index} repeats key {key:?}"
                )));
            }
            map.insert(key, key_packer, value, value_packer);
        }
        Ok(map)
    }

    fn unpack_tagged(
        &self,
        reader: &mut dyn Read,
        tag: i32,
        depth: usize,
    ) -> Result<(Value, PackerRef)> {
        match self.registry.resolve(tag)? {
            Resolved::Nested => {
                let nested = self.unpack_at_depth(reader, depth + 1)?;
                Ok((Value::HeteroMap(nested), self.nested()))
            }
            Resolved::Packer(packer) => {
                let value = packer.unpack_value(reader)?;
                Ok((value, packer))
            }
        }
    }
}

impl Packer for HeteroMapPacker {
    type Value = HeteroMap;

    fn type_id(&self) -> i32 {
        self.id
    }

    fn pack<W: Write + ?Sized>(&self, value: &HeteroMap, writer: &mut W) -> Result<()> {
        let mut writer = writer;
        self.pack_map(value, &mut writer)
    }

    fn unpack<R: Read + ?Sized>(&self, reader: &mut R) -> Result<HeteroMap> {
        let mut reader = reader;
        self.unpack_at_depth(&mut reader, 0)
    }

    fn into_value(&self, value: HeteroMap) -> Value {
        Value::HeteroMap(value)
    }

    fn from_value<'v>(&self, value: &'v Value) -> Result<Cow<'v, HeteroMap>> {
        match value {
            Value::HeteroMap(map) => Ok(Cow::Borrowed(map)),
            other => Err(type_mismatch("heteromap", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::config::RegistryConfig;
    use crate::packer::DynPacker;
    use crate::primitive::Int64;

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Debug)]
    struct PointPacker;

    impl Packer for PointPacker {
        type Value = Point;

        fn type_id(&self) -> i32 {
            1000
        }

        fn pack<W: Write + ?Sized>(&self, value: &Point, writer: &mut W) -> Result<()> {
            Int32.pack(&value.x, writer)?;
            Int32.pack(&value.y, writer)
        }

        fn unpack<R: Read + ?Sized>(&self, reader: &mut R) -> Result<Point> {
            let x = Int32.unpack(reader)?;
            let y = Int32.unpack(reader)?;
            Ok(Point { x, y })
        }

        fn into_value(&self, value: Point) -> Value {
            Value::object(Arc::new(value))
        }

        fn from_value<'v>(&self, value: &'v Value) -> Result<Cow<'v, Point>> {
            match value {
                Value::Object(obj) => obj
                    .downcast_ref::<Point>()
                    .map(Cow::Borrowed)
                    .ok_or_else(|| type_mismatch("point", value)),
                other => Err(type_mismatch("point", other)),
            }
        }
    }

    fn builtin_only() -> HeteroMapPacker {
        HeteroMapPacker::new(Arc::new(TypeRegistry::new()))
    }

    fn roundtrip(packer: &HeteroMapPacker, map: &HeteroMap) -> HeteroMap {
        let mut out = Vec::new();
        packer.pack(map, &mut out).unwrap();
        let mut cursor = Cursor::new(out);
        let decoded = packer.unpack(&mut cursor).unwrap();
        assert_eq!(cursor.position() as usize, cursor.get_ref().len());
        decoded
    }

    #[test]
    fn int_key_string_value_through_builtin_ids() {
        let mut map = HeteroMap::new();
        map.insert(5i32, builtin::int32(), "five", builtin::string());

        let decoded = roundtrip(&builtin_only(), &map);
        assert_eq!(decoded.len(), 1);
        let entry = decoded.iter().next().unwrap();
        assert_eq!(entry.key, Value::Int32(5));
        assert_eq!(entry.value, Value::from("five"));
        assert_eq!(entry.key_packer.tag(), builtin::INT32);
        assert_eq!(entry.value_packer.tag(), builtin::STR);
    }

    #[test]
    fn wire_layout() {
        let mut map = HeteroMap::new();
        map.insert(5i32, builtin::int32(), "hi", builtin::string());
        let mut out = Vec::new();
        builtin_only().pack(&map, &mut out).unwrap();
        assert_eq!(
            out,
            vec![
                0, 0, 0, 1, // count
                0, 0, 0, 4, // key id: int32
                0, 0, 0, 5, // key
                0, 0, 0, 9, // value id: str
                0, 0, 0, 2, b'h', b'i',
            ]
        );
    }

    #[test]
    fn decode_reads_count_from_stream() {
        let mut map = HeteroMap::new();
        map.insert("a", builtin::string(), 1i64, builtin::int64());
        map.insert("b", builtin::string(), true, builtin::boolean());
        map.insert("c", builtin::string(), 2.5f64, builtin::float());

        let decoded = roundtrip(&builtin_only(), &map);
        assert_eq!(decoded, map);
        let keys: Vec<_> = decoded.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn empty_map() {
        let decoded = roundtrip(&builtin_only(), &HeteroMap::new());
        assert!(decoded.is_empty());
    }

    #[test]
    fn unknown_id_rejected() {
        let mut out = Vec::new();
        Int32.pack(&1, &mut out).unwrap();
        Int32.pack(&4242, &mut out).unwrap();
        Int32.pack(&0, &mut out).unwrap();

        let err = builtin_only().unpack(&mut Cursor::new(out)).unwrap_err();
        assert!(matches!(err, PackError::UnknownTypeId(4242)));
    }

    #[test]
    fn nested_map_uses_sentinel() {
        let packer = builtin_only();
        let mut inner = HeteroMap::new();
        inner.insert("depth", builtin::string(), 2i32, builtin::int32());
        let mut outer = HeteroMap::new();
        outer.insert("child", builtin::string(), inner.clone(), packer.nested());

        let mut out = Vec::new();
        packer.pack(&outer, &mut out).unwrap();
        // count, key id, "child", then the sentinel
        assert_eq!(&out[4 + 4 + 4 + 5..4 + 4 + 4 + 5 + 4], &[0, 0, 0x03, 0xE6]);

        let decoded = packer.unpack(&mut Cursor::new(out)).unwrap();
        let entry = decoded.get_entry(&Value::from("child")).unwrap();
        assert_eq!(entry.value_packer.tag(), builtin::HETERO_MAP);
        assert_eq!(entry.value.as_hetero_map(), Some(&inner));
    }

    #[test]
    fn custom_type_through_session_registry() {
        let registry = TypeRegistry::from_packers([Arc::new(PointPacker) as PackerRef]).unwrap();
        let packer = HeteroMapPacker::new(Arc::new(registry));
        let point: PackerRef = Arc::new(PointPacker);

        let mut map = HeteroMap::new();
        map.insert(
            "origin",
            builtin::string(),
            Value::object(Arc::new(Point { x: 3, y: -4 })),
            Arc::clone(&point),
        );

        let mut out = Vec::new();
        packer.pack(&map, &mut out).unwrap();

        let decoded = packer.unpack(&mut Cursor::new(out.clone())).unwrap();
        let Value::Object(obj) = decoded.get(&Value::from("origin")).unwrap() else {
            panic!("expected an object value");
        };
        assert_eq!(obj.downcast_ref::<Point>(), Some(&Point { x: 3, y: -4 }));

        // A reader without the custom table cannot resolve id 1000.
        let err = builtin_only().unpack(&mut Cursor::new(out)).unwrap_err();
        assert!(matches!(err, PackError::UnknownTypeId(1000)));
    }

    #[test]
    fn same_value_under_different_wire_types() {
        let mut narrow = HeteroMap::new();
        narrow.insert(1i32, builtin::int32(), 7i32, builtin::int32());
        let mut wide = HeteroMap::new();
        wide.insert(1i32, builtin::int32(), 7i32, builtin::int64());

        let mut a = Vec::new();
        let mut b = Vec::new();
        builtin_only().pack(&narrow, &mut a).unwrap();
        builtin_only().pack(&wide, &mut b).unwrap();
        assert_eq!(a.len() + 4, b.len());

        let decoded = builtin_only().unpack(&mut Cursor::new(b)).unwrap();
        assert_eq!(decoded.get(&Value::Int32(1)), Some(&Value::Int64(7)));
    }

    #[test]
    fn mismatched_entry_value_fails_encode() {
        let mut map = HeteroMap::new();
        map.insert("n", builtin::string(), "not a number", builtin::int32());
        let err = builtin_only().pack(&map, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, PackError::TypeMismatch { expected: "int32", .. }));
    }

    #[test]
    fn depth_limit() {
        let registry = TypeRegistry::with_config(RegistryConfig {
            max_depth: 1,
            ..RegistryConfig::default()
        });
        let packer = HeteroMapPacker::new(Arc::new(registry));

        let mut one = HeteroMap::new();
        one.insert(1i32, builtin::int32(), HeteroMap::new(), packer.nested());
        roundtrip(&packer, &one);

        let mut two = HeteroMap::new();
        two.insert(1i32, builtin::int32(), one, packer.nested());
        let mut out = Vec::new();
        packer.pack(&two, &mut out).unwrap();
        let err = packer.unpack(&mut Cursor::new(out)).unwrap_err();
        assert!(matches!(err, PackError::Decode(_)));
    }

    #[test]
    fn entry_limit_and_negative_count() {
        let registry = TypeRegistry::with_config(RegistryConfig {
            max_entries: 2,
            ..RegistryConfig::default()
        });
        let packer = HeteroMapPacker::new(Arc::new(registry));

        let mut out = Vec::new();
        Int32.pack(&3, &mut out).unwrap();
        let err = packer.unpack(&mut Cursor::new(out)).unwrap_err();
        assert!(matches!(err, PackError::Decode(_)));

        let mut out = Vec::new();
        Int32.pack(&-1, &mut out).unwrap();
        let err = packer.unpack(&mut Cursor::new(out)).unwrap_err();
        assert!(matches!(err, PackError::Decode(_)));
    }

    fn int_keyed_wire(count: i32) -> Vec<u8> {
        let mut out = Vec::new();
        Int32.pack(&count, &mut out).unwrap();
        for key in 0..count {
            Int32.pack(&builtin::INT32, &mut out).unwrap();
            Int32.pack(&key, &mut out).unwrap();
            Int32.pack(&builtin::INT8, &mut out).unwrap();
            out.push(0);
        }
        out
    }

    #[test]
    fn large_map_decodes_without_rescanning() {
        let count = 200_000;
        let wire = int_keyed_wire(count);

        let started = std::time::Instant::now();
        let decoded = builtin_only().unpack(&mut Cursor::new(wire)).unwrap();
        let elapsed = started.elapsed();

        assert_eq!(decoded.len(), count as usize);
        assert_eq!(decoded.get(&Value::Int32(count - 1)), Some(&Value::Int8(0)));
        assert!(elapsed < std::time::Duration::from_secs(30), "decode took {elapsed:?}");
    }

    #[test]
    fn repeated_wire_key_rejected() {
        let mut out = int_keyed_wire(2);
        // point the second entry's key at the first one's
        out[4 + 13 + 4..4 + 13 + 8].copy_from_slice(&[0, 0, 0, 0]);

        let err = builtin_only().unpack(&mut Cursor::new(out)).unwrap_err();
        assert!(matches!(err, PackError::Decode(msg) if msg.contains("repeats key")));
    }

    #[test]
    fn shared_packer_across_threads() {
        let packer = Arc::new(builtin_only());
        std::thread::scope(|scope| {
            for worker in 0..8i32 {
                let packer = Arc::clone(&packer);
                scope.spawn(move || {
                    for round in 0..50i32 {
                        let mut map = HeteroMap::new();
                        map.insert(worker, builtin::int32(), round, builtin::int32());
                        map.insert("tag", builtin::string(), "w", builtin::string());
                        assert_eq!(roundtrip(&packer, &map), map);
                    }
                });
            }
        });
    }

    #[test]
    fn truncated_entry() {
        let mut map = HeteroMap::new();
        map.insert(9i64, builtin::int64(), "value", builtin::string());
        let mut out = Vec::new();
        builtin_only().pack(&map, &mut out).unwrap();
        out.truncate(out.len() - 1);
        let err = builtin_only().unpack(&mut Cursor::new(out)).unwrap_err();
        assert!(matches!(err, PackError::Truncated { .. }));
    }

    #[test]
    fn custom_id_heteromap_and_dynamic_view() {
        let packer = HeteroMapPacker::with_id(1500, Arc::new(TypeRegistry::new()));
        assert_eq!(packer.tag(), 1500);

        let mut map = HeteroMap::new();
        map.insert(0i64, Arc::new(Int64) as PackerRef, 0i64, builtin::int64());
        let mut out = Vec::new();
        packer.pack_value(&Value::HeteroMap(map.clone()), &mut out).unwrap();
        let value = packer.unpack_value(&mut Cursor::new(out)).unwrap();
        assert_eq!(value, Value::HeteroMap(map));

        let err = packer.pack_value(&Value::Int32(1), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, PackError::TypeMismatch { expected: "heteromap", .. }));
    }
}
