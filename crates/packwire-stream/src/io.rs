use std::io::{ErrorKind, Read, Write};

use crate::error::{Result, StreamError};

/// Upper bound on buffer space reserved up front for a length-prefixed read.
///
/// Lengths come off the wire, so they are never trusted for allocation; the
/// buffer grows as bytes actually arrive.
pub const MAX_PREALLOC: usize = 64 * 1024;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Read exactly `N` bytes into a fixed-size array.
pub fn read_array<const N: usize, R: Read + ?Sized>(reader: &mut R) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    read_exact_into(reader, &mut buf)?;
    Ok(buf)
}

/// Fill `buf` completely from `reader` (blocking).
///
/// Returns `StreamError::Truncated` when EOF is reached first. Interrupted
/// reads are retried; every other error is surfaced as-is.
pub fn read_exact_into<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(StreamError::Truncated {
                    needed: buf.len(),
                    got: filled,
                })
            }
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(StreamError::Io(err)),
        }
    }
    Ok(())
}

/// Read exactly `len` bytes into a new vector.
pub fn read_vec<R: Read + ?Sized>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC));
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    while buf.len() < len {
        let want = (len - buf.len()).min(READ_CHUNK_SIZE);
        match reader.read(&mut chunk[..want]) {
            Ok(0) => {
                return Err(StreamError::Truncated {
                    needed: len,
                    got: buf.len(),
                })
            }
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(StreamError::Io(err)),
        }
    }

    Ok(buf)
}

/// Write every byte of `bytes` to `writer` (blocking).
///
/// Interrupted and would-block writes are retried. A write that accepts zero
/// bytes means the sink is gone and yields `StreamError::Closed`.
pub fn write_all<W: Write + ?Sized>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < bytes.len() {
        match writer.write(&bytes[offset..]) {
            Ok(0) => return Err(StreamError::Closed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(StreamError::Io(err)),
        }
    }
    Ok(())
}
