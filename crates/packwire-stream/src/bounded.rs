use std::io::{ErrorKind, Read};

use tracing::trace;

use crate::error::{Result, StreamError};

const SKIP_CHUNK_SIZE: usize = 8 * 1024;

/// A reader that exposes at most `limit` bytes of an inner stream.
///
/// Once the limit is reached the reader reports end-of-stream, so a decoder
/// that asks for more sees a truncation rather than bytes belonging to the
/// next message.
pub struct BoundedReader<R> {
    inner: R,
    remaining: u64,
}

impl<R: Read> BoundedReader<R> {
    /// Wrap `inner`, allowing at most `limit` bytes to be read.
    pub fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            remaining: limit,
        }
    }

    /// Bytes still readable before the bound is hit.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Read and discard everything left inside the bound.
    ///
    /// Returns the number of bytes skipped. Stops early if the inner stream
    /// ends first.
    pub fn skip_remaining(&mut self) -> Result<u64> {
        let mut chunk = [0u8; SKIP_CHUNK_SIZE];
        let mut skipped = 0u64;
        while self.remaining > 0 {
            let want = self.remaining.min(SKIP_CHUNK_SIZE as u64) as usize;
            match self.inner.read(&mut chunk[..want]) {
                Ok(0) => break,
                Ok(n) => {
                    self.remaining -= n as u64;
                    skipped += n as u64;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(StreamError::Io(err)),
            }
        }
        trace!(skipped, "skipped bounded remainder");
        Ok(skipped)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for BoundedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let max = self.remaining.min(buf.len() as u64) as usize;
        let n = self.inner.read(&mut buf[..max])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}

impl<R> std::fmt::Debug for BoundedReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedReader")
            .field("remaining", &self.remaining)
            .finish()
    }
}
