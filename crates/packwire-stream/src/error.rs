/// Errors that can occur while moving bytes across a stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The stream ended before the requested number of bytes arrived.
    #[error("stream truncated (needed {needed} bytes, got {got})")]
    Truncated { needed: usize, got: usize },

    /// The underlying channel reported an I/O fault.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The sink accepted zero bytes; the peer is gone.
    #[error("stream closed (write accepted zero bytes)")]
    Closed,
}

pub type Result<T> = std::result::Result<T, StreamError>;
