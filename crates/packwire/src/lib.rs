//! Typed binary packers for RPC payloads.
//!
//! packwire converts typed values to and from a compact big-endian byte
//! stream. Fixed packers cover the scalar, string, buffer, date and
//! collection types; the heterogeneous map tags every entry with a type id
//! so peers can exchange structured data without sharing source code.
//!
//! # Crate Structure
//!
//! - [`stream`]: exact-length reads and writes over blocking streams
//! - [`codec`]: packers, the dynamic value model and the type-id registry
//!
//! ```
//! use std::io::Cursor;
//! use std::sync::Arc;
//!
//! use packwire::codec::{builtin, HeteroMap, HeteroMapPacker, Packer, TypeRegistry, Value};
//!
//! let packer = HeteroMapPacker::new(Arc::new(TypeRegistry::new()));
//! let mut map = HeteroMap::new();
//! map.insert(5i32, builtin::int32(), "five", builtin::string());
//!
//! let mut wire = Vec::new();
//! packer.pack(&map, &mut wire).unwrap();
//! let decoded = packer.unpack(&mut Cursor::new(wire)).unwrap();
//! assert_eq!(decoded.get(&Value::Int32(5)), Some(&Value::from("five")));
//! ```

/// Re-export stream helpers.
pub mod stream {
    pub use packwire_stream::*;
}

/// Re-export codec types.
pub mod codec {
    pub use packwire_codec::*;
}
