//! Fixed-width packers: big-endian two's-complement integers, IEEE-754
//! doubles and single-byte booleans.

use std::borrow::Cow;
use std::io::{Read, Write};

use packwire_stream::{read_array, write_all};

use crate::builtin;
use crate::error::{type_mismatch, PackError, Result};
use crate::packer::{NullAsZero, Packer};
use crate::value::Value;

macro_rules! int_packer {
    ($(#[$meta:meta])* $name:ident, $ty:ty, $id:expr, $variant:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl $name {
            pub const ID: i32 = $id;
            /// Encoded size in bytes.
            pub const WIDTH: usize = std::mem::size_of::<$ty>();
        }

        impl Packer for $name {
            type Value = $ty;

            fn type_id(&self) -> i32 {
                Self::ID
            }

            fn pack<W: Write + ?Sized>(&self, value: &$ty, writer: &mut W) -> Result<()> {
                write_all(writer, &value.to_be_bytes())?;
                Ok(())
            }

            fn unpack<R: Read + ?Sized>(&self, reader: &mut R) -> Result<$ty> {
                Ok(<$ty>::from_be_bytes(read_array(reader)?))
            }

            fn into_value(&self, value: $ty) -> Value {
                Value::$variant(value)
            }

            fn from_value<'v>(&self, value: &'v Value) -> Result<Cow<'v, $ty>> {
                if value.is_null() {
                    return Ok(Cow::Owned(0));
                }
                value
                    .as_i64()
                    .and_then(|wide| <$ty>::try_from(wide).ok())
                    .map(Cow::Owned)
                    .ok_or_else(|| type_mismatch($kind, value))
            }
        }

        impl NullAsZero for $name {}
    };
}

int_packer!(
    /// 1-byte signed integer.
    Int8, i8, builtin::INT8, Int8, "int8"
);
int_packer!(
    /// 2-byte big-endian signed integer.
    Int16, i16, builtin::INT16, Int16, "int16"
);
int_packer!(
    /// 4-byte big-endian signed integer. Also the length prefix of every
    /// variable-length type.
    Int32, i32, builtin::INT32, Int32, "int32"
);
int_packer!(
    /// 8-byte big-endian signed integer.
    Int64, i64, builtin::INT64, Int64, "int64"
);

/// 8-byte big-endian IEEE-754 double.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Float;

impl Float {
    pub const ID: i32 = builtin::FLOAT;
}

impl Packer for Float {
    type Value = f64;

    fn type_id(&self) -> i32 {
        Self::ID
    }

    fn pack<W: Write + ?Sized>(&self, value: &f64, writer: &mut W) -> Result<()> {
        write_all(writer, &value.to_be_bytes())?;
        Ok(())
    }

    fn unpack<R: Read + ?Sized>(&self, reader: &mut R) -> Result<f64> {
        Ok(f64::from_be_bytes(read_array(reader)?))
    }

    fn into_value(&self, value: f64) -> Value {
        Value::Float(value)
    }

    fn from_value<'v>(&self, value: &'v Value) -> Result<Cow<'v, f64>> {
        match value {
            Value::Float(v) => Ok(Cow::Borrowed(v)),
            Value::Null => Ok(Cow::Owned(0.0)),
            other => other
                .as_i64()
                .map(|v| Cow::Owned(v as f64))
                .ok_or_else(|| type_mismatch("float", other)),
        }
    }
}

impl NullAsZero for Float {}

/// Single byte, 0 or 1. Any non-zero byte decodes as `true`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bool;

impl Bool {
    pub const ID: i32 = builtin::BOOL;
}

impl Packer for Bool {
    type Value = bool;

    fn type_id(&self) -> i32 {
        Self::ID
    }

    fn pack<W: Write + ?Sized>(&self, value: &bool, writer: &mut W) -> Result<()> {
        write_all(writer, &[u8::from(*value)])?;
        Ok(())
    }

    fn unpack<R: Read + ?Sized>(&self, reader: &mut R) -> Result<bool> {
        let [byte] = read_array::<1, _>(reader)?;
        Ok(byte != 0)
    }

    fn into_value(&self, value: bool) -> Value {
        Value::Bool(value)
    }

    fn from_value<'v>(&self, value: &'v Value) -> Result<Cow<'v, bool>> {
        match value {
            Value::Bool(v) => Ok(Cow::Borrowed(v)),
            Value::Null => Ok(Cow::Owned(false)),
            other => Err(type_mismatch("bool", other)),
        }
    }
}

impl NullAsZero for Bool {}

/// Write a collection length as the 4-byte prefix.
pub(crate) fn pack_len<W: Write + ?Sized>(len: usize, writer: &mut W) -> Result<()> {
    let len = i32::try_from(len).map_err(|_| PackError::LengthOverflow(len))?;
    Int32.pack(&len, writer)
}

/// Read a 4-byte length prefix. Negative lengths are a decode error.
pub(crate) fn unpack_len<R: Read + ?Sized>(reader: &mut R) -> Result<usize> {
    let len = Int32.unpack(reader)?;
    usize::try_from(len).map_err(|_| PackError::Decode(format!("negative length prefix {len}")))
}
