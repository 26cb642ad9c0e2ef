use std::any::Any;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};

use crate::hetero::HeteroMap;

/// A dynamically typed wire value.
///
/// This is what flows through a [`HeteroMap`] and through the type-erased
/// [`DynPacker`](crate::DynPacker) interface. Statically typed callers never
/// need it: every [`Packer`](crate::Packer) works on its own `Value` type.
#[derive(Clone, Debug)]
pub enum Value {
    /// Absent value. Integer packers encode it as zero, buffers and strings as empty.
    Null,
    Int8(i8),
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float(f64),
    Buffer(Bytes),
    /// A timestamp with an explicit UTC offset.
    Date(DateTime<FixedOffset>),
    /// A timestamp without an offset, read as local time.
    LocalDate(NaiveDateTime),
    Str(String),
    List(Vec<Value>),
    /// Key/value pairs in insertion order.
    Map(Vec<(Value, Value)>),
    HeteroMap(HeteroMap),
    /// An application object: generated struct types and object references.
    /// Compared by identity.
    Object(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Short name of the variant, used in type-mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int8(_) => "int8",
            Value::Bool(_) => "bool",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float(_) => "float",
            Value::Buffer(_) => "buffer",
            Value::Date(_) => "date",
            Value::LocalDate(_) => "local date",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::HeteroMap(_) => "heteromap",
            Value::Object(_) => "object",
        }
    }

    /// Widen any integer variant to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int8(v) => Some(v.into()),
            Value::Int16(v) => Some(v.into()),
            Value::Int32(v) => Some(v.into()),
            Value::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Buffer(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_hetero_map(&self) -> Option<&HeteroMap> {
        match self {
            Value::HeteroMap(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Wrap an application object.
    pub fn object<T: Any + Send + Sync>(obj: Arc<T>) -> Self {
        Value::Object(obj)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int8(a), Value::Int8(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Buffer(a), Value::Buffer(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::LocalDate(a), Value::LocalDate(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::HeteroMap(a), Value::HeteroMap(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Hashing agrees with `==`: dates hash as their UTC instant, `0.0` and
/// `-0.0` hash alike, objects hash by address.
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Int8(v) => v.hash(state),
            Value::Bool(v) => v.hash(state),
            Value::Int16(v) => v.hash(state),
            Value::Int32(v) => v.hash(state),
            Value::Int64(v) => v.hash(state),
            Value::Float(v) => {
                let bits = if *v == 0.0 { 0 } else { v.to_bits() };
                bits.hash(state);
            }
            Value::Buffer(b) => b.hash(state),
            Value::Date(dt) => dt.naive_utc().hash(state),
            Value::LocalDate(dt) => dt.hash(state),
            Value::Str(s) => s.hash(state),
            Value::List(items) => items.hash(state),
            Value::Map(pairs) => pairs.hash(state),
            Value::HeteroMap(map) => {
                map.len().hash(state);
                map.keys().for_each(|key| key.hash(state));
            }
            Value::Object(obj) => (Arc::as_ptr(obj) as *const () as usize).hash(state),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

value_from! {
    i8 => Int8,
    bool => Bool,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f64 => Float,
    Bytes => Buffer,
    String => Str,
    &str => Str,
    NaiveDateTime => LocalDate,
    Vec<Value> => List,
    HeteroMap => HeteroMap,
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(dt: DateTime<Tz>) -> Self {
        Value::Date(dt.fixed_offset())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn integer_widening() {
        assert_eq!(Value::Int8(-3).as_i64(), Some(-3));
        assert_eq!(Value::Int32(7).as_i64(), Some(7));
        assert_eq!(Value::Float(1.0).as_i64(), None);
    }

    #[test]
    fn objects_compare_by_identity() {
        let a = Arc::new(5u32);
        let first = Value::object(Arc::clone(&a));
        let second = Value::object(a);
        let other = Value::object(Arc::new(5u32));

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn dates_compare_as_instants() {
        let utc = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let shifted = utc.with_timezone(&FixedOffset::east_opt(2 * 3600).unwrap());
        assert_eq!(Value::from(utc), Value::from(shifted));
    }

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn equal_values_hash_alike() {
        assert_eq!(hash_of(&Value::Float(0.0)), hash_of(&Value::Float(-0.0)));

        let utc = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let shifted = utc.with_timezone(&FixedOffset::west_opt(5 * 3600).unwrap());
        assert_eq!(hash_of(&Value::from(utc)), hash_of(&Value::from(shifted)));

        let obj = Arc::new(1u8);
        assert_eq!(
            hash_of(&Value::object(Arc::clone(&obj))),
            hash_of(&Value::object(obj))
        );
        assert_ne!(hash_of(&Value::Int32(1)), hash_of(&Value::Int64(1)));
    }

    #[test]
    fn conversions_pick_variants() {
        assert_eq!(Value::from("hi"), Value::Str("hi".into()));
        assert_eq!(Value::from(5i32).kind(), "int32");
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert!(Value::from(Some(1i8)).as_i64().is_some());
    }
}
