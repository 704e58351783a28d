//! Per-entry decompression.
//!
//! Each supported [`CompressionMethod`](super::structures::CompressionMethod)
//! gets an implementation of [`Decompressor`], a small push/finish
//! capability: feed compressed bytes in as they arrive over the wire,
//! get decompressed bytes back, possibly buffered until `finish()` for
//! codecs whose safe Rust bindings don't expose a truly incremental API.

use std::io::{Cursor, Read};

use bzip2::Status as Bzip2Status;
use flate2::{Decompress as FlateDecompress, FlushDecompress, Status as FlateStatus};

use crate::error::ZipError;

use super::structures::CompressionMethod;

/// Feed compressed bytes in, get decompressed bytes out.
pub trait Decompressor: Send {
    /// Feed the next chunk of compressed data, returning whatever
    /// plaintext bytes could be produced from it right away.
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>, ZipError>;

    /// Signal end of compressed input and flush any remaining plaintext.
    fn finish(&mut self) -> Result<Vec<u8>, ZipError>;
}

/// Construct the decompressor for a given compression method. The
/// caller passes the entry's declared uncompressed size, which the LZMA
/// codec needs to synthesize its "alone" header.
pub fn decompressor_for(
    method: CompressionMethod,
    uncompressed_size: u64,
) -> Result<Box<dyn Decompressor>, ZipError> {
    match method {
        CompressionMethod::Stored => Ok(Box::new(StoredDecompressor)),
        CompressionMethod::Deflate => Ok(Box::new(DeflateDecompressor::new())),
        CompressionMethod::Bzip2 => Ok(Box::new(Bzip2Decompressor::new())),
        CompressionMethod::Lzma => Ok(Box::new(LzmaDecompressor::new(uncompressed_size))),
        CompressionMethod::Zstd => Ok(Box::new(ZstdDecompressor::new())),
        CompressionMethod::Unsupported(code) => Err(ZipError::UnsupportedCompression(code)),
    }
}

/// STORED: data is already plaintext, passed through unchanged.
struct StoredDecompressor;

impl Decompressor for StoredDecompressor {
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>, ZipError> {
        Ok(chunk.to_vec())
    }

    fn finish(&mut self) -> Result<Vec<u8>, ZipError> {
        Ok(Vec::new())
    }
}

/// DEFLATE, raw (no zlib/gzip wrapper, ZIP uses RFC 1951 directly).
struct DeflateDecompressor {
    inner: FlateDecompress,
}

impl DeflateDecompressor {
    fn new() -> Self {
        Self {
            inner: FlateDecompress::new(false),
        }
    }
}

impl Decompressor for DeflateDecompressor {
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>, ZipError> {
        let mut out = Vec::new();
        let mut buf = [0u8; 32 * 1024];
        let mut input = chunk;

        loop {
            let before_in = self.inner.total_in();
            let before_out = self.inner.total_out();
            let status = self
                .inner
                .decompress(input, &mut buf, FlushDecompress::None)
                .map_err(|_| ZipError::InvalidArchive("corrupt DEFLATE stream"))?;

            let consumed = (self.inner.total_in() - before_in) as usize;
            let produced = (self.inner.total_out() - before_out) as usize;
            out.extend_from_slice(&buf[..produced]);
            input = &input[consumed..];

            if matches!(status, FlateStatus::StreamEnd) || input.is_empty() {
                break;
            }
        }

        Ok(out)
    }

    fn finish(&mut self) -> Result<Vec<u8>, ZipError> {
        Ok(Vec::new())
    }
}

/// BZIP2, mirrors `DeflateDecompressor`'s push-loop shape since `bzip2`
/// exposes the same low-level `Decompress` API as `flate2`.
struct Bzip2Decompressor {
    inner: bzip2::Decompress,
}

impl Bzip2Decompressor {
    fn new() -> Self {
        Self {
            inner: bzip2::Decompress::new(false),
        }
    }
}

impl Decompressor for Bzip2Decompressor {
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>, ZipError> {
        let mut out = Vec::new();
        let mut buf = [0u8; 32 * 1024];
        let mut input = chunk;

        loop {
            let before_in = self.inner.total_in();
            let before_out = self.inner.total_out();
            let status = self
                .inner
                .decompress(input, &mut buf)
                .map_err(|_| ZipError::InvalidArchive("corrupt BZIP2 stream"))?;

            let consumed = (self.inner.total_in() - before_in) as usize;
            let produced = (self.inner.total_out() - before_out) as usize;
            out.extend_from_slice(&buf[..produced]);
            input = &input[consumed..];

            if matches!(status, Bzip2Status::StreamEnd) || input.is_empty() {
                break;
            }
        }

        Ok(out)
    }

    fn finish(&mut self) -> Result<Vec<u8>, ZipError> {
        Ok(Vec::new())
    }
}

/// LZMA, as embedded by ZIP (APPNOTE method 14): a 4-byte mini-header
/// (2-byte LZMA SDK version, 2-byte little-endian properties length)
/// followed by the properties themselves (usually 5 bytes) and then a
/// raw LZMA1 stream with no size footer. `lzma-rs` expects the classic
/// "lzma-alone" framing instead: 5 properties bytes immediately
/// followed by an 8-byte little-endian uncompressed size. We buffer the
/// whole entry (the safe `lzma-rs` API has no incremental push) and
/// reassemble that framing at `finish()`.
struct LzmaDecompressor {
    buffer: Vec<u8>,
    uncompressed_size: u64,
}

impl LzmaDecompressor {
    fn new(uncompressed_size: u64) -> Self {
        Self {
            buffer: Vec::new(),
            uncompressed_size,
        }
    }
}

impl Decompressor for LzmaDecompressor {
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>, ZipError> {
        self.buffer.extend_from_slice(chunk);
        Ok(Vec::new())
    }

    fn finish(&mut self) -> Result<Vec<u8>, ZipError> {
        if self.buffer.len() < 4 {
            return Err(ZipError::InvalidArchive("truncated LZMA header"));
        }

        let props_len = u16::from_le_bytes([self.buffer[2], self.buffer[3]]) as usize;
        let props_start = 4;
        let props_end = props_start + props_len;
        if self.buffer.len() < props_end {
            return Err(ZipError::InvalidArchive("truncated LZMA properties"));
        }

        let mut alone = Vec::with_capacity(props_len + 8 + (self.buffer.len() - props_end));
        alone.extend_from_slice(&self.buffer[props_start..props_end]);
        alone.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        alone.extend_from_slice(&self.buffer[props_end..]);

        let mut output = Vec::with_capacity(self.uncompressed_size as usize);
        lzma_rs::lzma_decompress(&mut Cursor::new(&alone), &mut output)
            .map_err(|_| ZipError::InvalidArchive("corrupt LZMA stream"))?;

        Ok(output)
    }
}

/// Zstandard. Buffered at `finish()`; `zstd-safe`'s streaming bindings
/// are unsafe-adjacent enough that the crate's own `Read`-based decoder
/// over a fully-buffered `Cursor` is the idiomatic choice here.
struct ZstdDecompressor {
    buffer: Vec<u8>,
}

impl ZstdDecompressor {
    fn new() -> Self {
        Self {
            buffer: Vec::new(),
        }
    }
}

impl Decompressor for ZstdDecompressor {
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>, ZipError> {
        self.buffer.extend_from_slice(chunk);
        Ok(Vec::new())
    }

    fn finish(&mut self) -> Result<Vec<u8>, ZipError> {
        let mut decoder = zstd::stream::read::Decoder::new(Cursor::new(&self.buffer))
            .map_err(|_| ZipError::InvalidArchive("corrupt Zstandard frame"))?;
        let mut output = Vec::new();
        decoder
            .read_to_end(&mut output)
            .map_err(|_| ZipError::InvalidArchive("corrupt Zstandard stream"))?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn stored_passes_through_unchanged() {
        let mut d = decompressor_for(CompressionMethod::Stored, 5).unwrap();
        let mut out = d.push(b"hello").unwrap();
        out.extend(d.finish().unwrap());
        assert_eq!(out, b"hello");
    }

    #[test]
    fn deflate_round_trips_a_known_payload() {
        use flate2::write::DeflateEncoder;
        use flate2::Compression;

        let plaintext = b"the quick brown fox jumps over the lazy dog";
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(plaintext).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut d = decompressor_for(CompressionMethod::Deflate, plaintext.len() as u64).unwrap();
        let mut out = d.push(&compressed).unwrap();
        out.extend(d.finish().unwrap());
        assert_eq!(out, plaintext);
    }

    #[test]
    fn unsupported_method_is_an_error_not_a_panic() {
        assert!(decompressor_for(CompressionMethod::Unsupported(19), 0).is_err());
    }
}
