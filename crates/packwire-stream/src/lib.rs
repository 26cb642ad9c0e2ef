//! Exact-length I/O over blocking byte streams.
//!
//! This is the lowest layer of packwire. A stream is any [`std::io::Read`]
//! (decode side) or [`std::io::Write`] (encode side) owned by the caller:
//! a socket, a file, an in-memory buffer. There is no seeking and no framing
//! here; the packers themselves define every byte that crosses the stream.
//!
//! Everything above builds on the helpers in [`io`]:
//! - [`read_array`] / [`read_exact_into`] fill a fixed number of bytes
//! - [`read_vec`] reads a length-prefixed payload without trusting the length
//! - [`write_all`] pushes every byte through, retrying transient errors
//! - [`BoundedReader`] caps how much of an inner stream a decoder may consume

pub mod bounded;
pub mod error;
pub mod io;

pub use bounded::BoundedReader;
pub use error::{Result, StreamError};
pub use io::{read_array, read_exact_into, read_vec, write_all};
