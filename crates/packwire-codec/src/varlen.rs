//! Length-prefixed packers: raw byte buffers and UTF-8 strings.

use std::borrow::Cow;
use std::io::{Read, Write};

use bytes::Bytes;
use packwire_stream::{read_vec, write_all};

use crate::builtin;
use crate::error::{type_mismatch, PackError, Result};
use crate::packer::{NullAsZero, Packer};
use crate::primitive::{pack_len, unpack_len};
use crate::value::Value;

/// 4-byte big-endian length followed by that many raw bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buffer;

impl Buffer {
    pub const ID: i32 = builtin::BUFFER;

    /// Encode a borrowed byte slice.
    pub fn pack_slice<W: Write + ?Sized>(&self, bytes: &[u8], writer: &mut W) -> Result<()> {
        pack_len(bytes.len(), writer)?;
        write_all(writer, bytes)?;
        Ok(())
    }

    fn unpack_vec<R: Read + ?Sized>(&self, reader: &mut R) -> Result<Vec<u8>> {
        let len = unpack_len(reader)?;
        Ok(read_vec(reader, len)?)
    }
}

impl Packer for Buffer {
    type Value = Bytes;

    fn type_id(&self) -> i32 {
        Self::ID
    }

    fn pack<W: Write + ?Sized>(&self, value: &Bytes, writer: &mut W) -> Result<()> {
        self.pack_slice(value, writer)
    }

    fn unpack<R: Read + ?Sized>(&self, reader: &mut R) -> Result<Bytes> {
        self.unpack_vec(reader).map(Bytes::from)
    }

    fn into_value(&self, value: Bytes) -> Value {
        Value::Buffer(value)
    }

    fn from_value<'v>(&self, value: &'v Value) -> Result<Cow<'v, Bytes>> {
        match value {
            Value::Buffer(bytes) => Ok(Cow::Borrowed(bytes)),
            Value::Null => Ok(Cow::Owned(Bytes::new())),
            other => Err(type_mismatch("buffer", other)),
        }
    }
}

impl NullAsZero for Buffer {}

/// A [`Buffer`] holding UTF-8 text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Str;

impl Str {
    pub const ID: i32 = builtin::STR;

    /// Encode a borrowed string slice.
    pub fn pack_str<W: Write + ?Sized>(&self, text: &str, writer: &mut W) -> Result<()> {
        Buffer.pack_slice(text.as_bytes(), writer)
    }
}

impl Packer for Str {
    type Value = String;

    fn type_id(&self) -> i32 {
        Self::ID
    }

    fn pack<W: Write + ?Sized>(&self, value: &String, writer: &mut W) -> Result<()> {
        self.pack_str(value, writer)
    }

    fn unpack<R: Read + ?Sized>(&self, reader: &mut R) -> Result<String> {
        let bytes = Buffer.unpack_vec(reader)?;
        String::from_utf8(bytes)
            .map_err(|err| PackError::Decode(format!("string is not valid UTF-8: {err}")))
    }

    fn into_value(&self, value: String) -> Value {
        Value::Str(value)
    }

    fn from_value<'v>(&self, value: &'v Value) -> Result<Cow<'v, String>> {
        match value {
            Value::Str(text) => Ok(Cow::Borrowed(text)),
            Value::Null => Ok(Cow::Owned(String::new())),
            other => Err(type_mismatch("str", other)),
        }
    }
}

impl NullAsZero for Str {}
