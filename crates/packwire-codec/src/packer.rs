use std::borrow::Cow;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use crate::error::Result;
use crate::value::Value;

/// A symmetric codec for one wire type, identified by a stable type id.
///
/// Packers are immutable capabilities: they hold only construction-time
/// parameters, so a single instance may be shared across threads and
/// invoked concurrently. Each `unpack` consumes exactly the bytes the
/// matching `pack` produced, which is what makes packers composable in
/// sequence without any outer framing.
pub trait Packer: Send + Sync {
    /// The statically typed value this packer encodes.
    type Value: Clone + Send + Sync;

    /// The type id this packer is tagged with on the wire.
    fn type_id(&self) -> i32;

    /// Encode `value` onto `writer`.
    fn pack<W: Write + ?Sized>(&self, value: &Self::Value, writer: &mut W) -> Result<()>;

    /// Decode one value from `reader`.
    fn unpack<R: Read + ?Sized>(&self, reader: &mut R) -> Result<Self::Value>;

    /// Lift a typed value into the dynamic [`Value`] model.
    fn into_value(&self, value: Self::Value) -> Value;

    /// View a dynamic value as this packer's type.
    ///
    /// Fails with `PackError::TypeMismatch` if the value has the wrong shape.
    fn from_value<'v>(&self, value: &'v Value) -> Result<Cow<'v, Self::Value>>;
}

/// Packers whose encoding of an absent value is the zero value.
///
/// Decoding can never tell "was null" apart from zero or empty; callers that
/// need nullability track it out of band.
pub trait NullAsZero: Packer
where
    Self::Value: Default,
{
    /// Encode `value`, substituting the zero value for `None`.
    fn pack_or_zero<W: Write + ?Sized>(
        &self,
        value: Option<&Self::Value>,
        writer: &mut W,
    ) -> Result<()> {
        match value {
            Some(value) => self.pack(value, writer),
            None => self.pack(&Self::Value::default(), writer),
        }
    }
}

/// Object-safe view of a [`Packer`], operating on dynamic [`Value`]s.
///
/// Implemented for every `Packer`; this is what registries and
/// heterogeneous-map entries hold.
pub trait DynPacker: Send + Sync + fmt::Debug {
    /// The type id written in front of values packed by this packer.
    fn tag(&self) -> i32;

    fn pack_value(&self, value: &Value, writer: &mut dyn Write) -> Result<()>;

    fn unpack_value(&self, reader: &mut dyn Read) -> Result<Value>;
}

impl<P> DynPacker for P
where
    P: Packer + fmt::Debug,
{
    fn tag(&self) -> i32 {
        self.type_id()
    }

    fn pack_value(&self, value: &Value, writer: &mut dyn Write) -> Result<()> {
        let typed = self.from_value(value)?;
        self.pack(typed.as_ref(), writer)
    }

    fn unpack_value(&self, reader: &mut dyn Read) -> Result<Value> {
        let typed = self.unpack(reader)?;
        Ok(self.into_value(typed))
    }
}

/// Shared handle to a type-erased packer.
pub type PackerRef = Arc<dyn DynPacker>;

/// `true` if both handles are the same packer instance.
pub fn same_packer(a: &PackerRef, b: &PackerRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
