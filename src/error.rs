//! Structured error types for archive I/O and ZIP parsing.
//!
//! Errors are split along the same lines a caller needs to react
//! differently to: transport failures ([`HttpError`]), malformed or
//! unsupported archive data ([`ZipError`]), and invalid arguments from
//! the caller ([`InvalidArgument`]). Binaries built on this crate are
//! expected to wrap these in `anyhow` at their boundary; the library
//! itself never reaches for `anyhow`.

use thiserror::Error;

/// Transport-level failures talking to a remote archive source.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("HTTP request failed with status {0}")]
    Status(reqwest::StatusCode),

    #[error("remote server does not support range requests")]
    RangeUnsupported,

    #[error("remote server did not return a Content-Length header")]
    MissingContentLength,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("giving up after {0} retries")]
    RetriesExhausted(u32),
}

impl HttpError {
    /// Wrap into a [`std::io::Error`] so it can cross the [`crate::io::ReadAt`]
    /// boundary, which speaks `io::Result` like the rest of the standard
    /// library's random-access I/O traits.
    pub fn into_io_error(self) -> std::io::Error {
        std::io::Error::other(self)
    }
}

/// Archive-level failures: malformed structures, unsupported features,
/// or data that fails validation once decoded.
#[derive(Debug, Error)]
pub enum ZipError {
    #[error("not a valid ZIP archive: {0}")]
    InvalidArchive(&'static str),

    #[error("multi-disk archives are not supported")]
    MultiDisk,

    #[error("entry is encrypted and cannot be extracted")]
    Encrypted,

    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u16),

    #[error("checksum mismatch: expected {expected:08x}, computed {computed:08x}")]
    ChecksumMismatch { expected: u32, computed: u32 },

    #[error("decompressed size exceeded the configured extraction limit")]
    DecompressedTooLarge,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Caller-supplied arguments that cannot be satisfied.
#[derive(Debug, Error)]
pub enum InvalidArgument {
    #[error("range end {end} exceeds source size {size}")]
    OutOfBounds { end: u64, size: u64 },
}

impl InvalidArgument {
    /// Wrap into a [`std::io::Error`] so it can cross the [`crate::io::ReadAt`]
    /// boundary alongside [`HttpError::into_io_error`].
    pub fn into_io_error(self) -> std::io::Error {
        std::io::Error::other(self)
    }
}
