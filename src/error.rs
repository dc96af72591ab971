//! Error types for frame walking and ranged reads.
//!
//! Every failure belongs to one of four [`ErrorKind`]s. Fetch errors come
//! from the transport and may be retried from the cursor's unchanged
//! position; format and bounds errors are deterministic for a given archive
//! and retrying them will fail the same way.

use thiserror::Error;

/// Result type for runzst operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure or short read
    Fetch,
    /// Bytes that do not form a supported zstd structure
    Format,
    /// Offset beyond the known archive length
    Bounds,
    /// Decompression, state persistence or local output
    Other,
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    // Transport
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP request failed with status: {0}")]
    Status(reqwest::StatusCode),

    #[error("Remote server does not support Range requests")]
    RangeUnsupported,

    #[error("Server answered range starting at {returned}, requested {requested}")]
    RangeMismatch { requested: u64, returned: u64 },

    #[error("Remote server did not return Content-Length")]
    MissingContentLength,

    #[error("Max retries exceeded reading {length} bytes at offset {offset}")]
    RetriesExhausted { offset: u64, length: usize },

    #[error("Short read at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Format
    #[error("Unrecognized frame magic {magic:#010x} at offset {offset}")]
    UnknownMagic { offset: u64, magic: u32 },

    #[error("Invalid frame at offset {offset}: {reason}")]
    InvalidFrame { offset: u64, reason: String },

    // Bounds
    #[error("Range of {length} bytes at offset {offset} exceeds archive length {archive_len}")]
    OutOfBounds {
        offset: u64,
        length: u64,
        archive_len: u64,
    },

    // Downstream
    #[error("Failed to decompress frame at offset {offset}: {source}")]
    Decompress {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Resume state error: {0}")]
    State(#[from] serde_json::Error),

    /// Local file or output stream failure, unrelated to fetching
    #[error("Local IO error: {0}")]
    LocalIo(#[source] std::io::Error),
}

impl Error {
    pub fn invalid_frame(offset: u64, reason: impl Into<String>) -> Self {
        Self::InvalidFrame {
            offset,
            reason: reason.into(),
        }
    }

    pub fn out_of_bounds(offset: u64, length: u64, archive_len: u64) -> Self {
        Self::OutOfBounds {
            offset,
            length,
            archive_len,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_)
            | Self::Status(_)
            | Self::RangeUnsupported
            | Self::RangeMismatch { .. }
            | Self::MissingContentLength
            | Self::RetriesExhausted { .. }
            | Self::ShortRead { .. }
            | Self::Io(_) => ErrorKind::Fetch,
            Self::UnknownMagic { .. } | Self::InvalidFrame { .. } => ErrorKind::Format,
            Self::OutOfBounds { .. } => ErrorKind::Bounds,
            Self::Decompress { .. } | Self::State(_) | Self::LocalIo(_) => ErrorKind::Other,
        }
    }

    /// Whether repeating the failed operation can succeed.
    ///
    /// Only transport failures qualify.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Fetch
    }
}
