//! Typed packers and the self-describing heterogeneous-map codec.
//!
//! A packer is a symmetric codec for one wire type, tagged with a stable
//! integer type id. All encodings are big-endian with no padding and no
//! outer framing:
//! - integers are fixed-width two's complement, floats IEEE-754 doubles
//! - bools are one byte, dates are an `Int64` of microseconds since 0001-01-01 UTC
//! - buffers, strings, lists and maps carry a 4-byte count prefix
//! - heterogeneous maps tag every key and value with its type id
//!
//! Type ids are resolved through a [`TypeRegistry`]: a fixed [`builtin`]
//! table plus a custom table supplied per session.

pub mod builtin;
pub mod collection;
pub mod config;
pub mod date;
pub mod error;
pub mod hetero;
pub mod hetero_packer;
pub mod objref;
pub mod packer;
pub mod primitive;
pub mod registry;
pub mod value;
pub mod varlen;

pub use collection::{ListOf, MapOf};
pub use config::{RegistryConfig, DEFAULT_MAX_DEPTH, DEFAULT_MAX_ENTRIES};
pub use date::{Date, DateInput};
pub use error::{PackError, Result};
pub use hetero::{Entry, HeteroMap};
pub use hetero_packer::HeteroMapPacker;
pub use objref::{ObjRef, ObjectTable};
pub use packer::{same_packer, DynPacker, NullAsZero, Packer, PackerRef};
pub use primitive::{Bool, Float, Int16, Int32, Int64, Int8};
pub use registry::{Resolved, TypeRegistry};
pub use value::Value;
pub use varlen::{Buffer, Str};
