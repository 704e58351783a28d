//! High-level ZIP archive access: listing entries and extracting their
//! decompressed contents.
//!
//! This is where the archive locator, directory loader, and codec
//! dispatch come together. Listing only ever touches the EOCD and
//! Central Directory (a handful of range reads regardless of archive
//! size); extracting additionally resolves one entry's Local File
//! Header and streams its compressed data through the matching
//! [`Decompressor`].

use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::OnceCell;

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::ZipError;
use crate::io::ReadAt;

use super::codec::decompressor_for;
use super::directory::load_entries;
use super::locator::ArchiveLocator;
use super::structures::{LFH_SIGNATURE, LFH_SIZE, ZipEntryInfo};

/// Streamed in 256 KiB chunks: large enough to keep HTTP request
/// overhead low, small enough that a single entry's extraction doesn't
/// have to buffer its entire compressed size in one read.
const STREAM_CHUNK_SIZE: usize = 256 * 1024;

/// Guardrails against maliciously crafted archives that decompress to
/// far more data than their compressed size would suggest. Off by
/// default: a library used to browse legitimate large archives
/// shouldn't silently refuse them.
#[derive(Debug, Clone, Copy)]
pub struct ExtractLimits {
    pub max_decompressed_size: u64,
    pub max_compression_ratio: u64,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_decompressed_size: 1024 * 1024 * 1024, // 1 GiB
            max_compression_ratio: 1000,
        }
    }
}

/// Extraction-time options: optional CRC-32 verification and optional
/// zip-bomb guardrails.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub verify_checksum: bool,
    pub limits: Option<ExtractLimits>,
}

/// High-level ZIP archive reader.
///
/// Generic over the reader type `R`, allowing it to work with both
/// local files ([`LocalFileReader`](crate::LocalFileReader)) and remote
/// sources ([`HttpRangeReader`](crate::HttpRangeReader)).
pub struct ZipExtractor<R: ReadAt> {
    locator: ArchiveLocator<R>,
    entries: OnceCell<Vec<ZipEntryInfo>>,
}

impl<R: ReadAt> ZipExtractor<R> {
    /// Create a new extractor for the given reader. Nothing is read
    /// from the source until [`list_files`](Self::list_files) or an
    /// extraction method is called.
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            locator: ArchiveLocator::new(reader),
            entries: OnceCell::new(),
        }
    }

    /// List all entries in the archive, both files and directories.
    ///
    /// The Central Directory is loaded once and cached; subsequent
    /// calls are free.
    pub async fn list_files(&self) -> Result<&[ZipEntryInfo], ZipError> {
        let entries = self
            .entries
            .get_or_try_init(|| async { load_entries(&self.locator).await })
            .await?;
        Ok(entries.as_slice())
    }

    /// Resolve the byte offset where an entry's compressed data begins.
    ///
    /// The Central Directory's recorded offset points at the Local File
    /// Header, not the data itself; the LFH's filename and extra field
    /// lengths (which can differ slightly from the Central Directory's
    /// copies) have to be read to compute the real data offset.
    async fn get_data_offset(&self, entry: &ZipEntryInfo) -> Result<u64, ZipError> {
        let mut lfh_buf = vec![0u8; LFH_SIZE];
        self.locator
            .reader()
            .read_at(entry.raw_offset, &mut lfh_buf)
            .await?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            return Err(ZipError::InvalidArchive("bad Local File Header signature"));
        }

        let mut cursor = Cursor::new(&lfh_buf);
        cursor.set_position(26);
        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.raw_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// Extract a file's contents to memory, with default options (no
    /// checksum verification, no size guardrails).
    pub async fn extract_to_memory(&self, entry: &ZipEntryInfo) -> Result<Vec<u8>, ZipError> {
        self.extract_with_progress(entry, ExtractOptions::default(), |_| {})
            .await
    }

    /// Extract a file's contents, reporting the number of plaintext
    /// bytes produced after each streamed chunk via `on_progress`. The
    /// sum of all `on_progress` calls always equals the entry's
    /// `file_size`, including the zero-length no-op case (no calls at
    /// all) and directories (also no calls, since callers are expected to
    /// skip directory entries before extracting).
    pub async fn extract_with_progress<F>(
        &self,
        entry: &ZipEntryInfo,
        options: ExtractOptions,
        mut on_progress: F,
    ) -> Result<Vec<u8>, ZipError>
    where
        F: FnMut(u64),
    {
        if entry.encrypted {
            return Err(ZipError::Encrypted);
        }

        if entry.compressed_size == 0 {
            return Ok(Vec::new());
        }

        if let Some(limits) = options.limits
            && entry.file_size > limits.max_decompressed_size
        {
            return Err(ZipError::DecompressedTooLarge);
        }

        let data_offset = self.get_data_offset(entry).await?;
        let mut decompressor = decompressor_for(entry.compression, entry.file_size)?;

        let mut output = Vec::with_capacity(entry.file_size.min(64 * 1024 * 1024) as usize);
        let mut hasher = options.verify_checksum.then(crc32fast::Hasher::new);

        let mut remaining = entry.compressed_size;
        let mut offset = data_offset;
        let mut buf = vec![0u8; STREAM_CHUNK_SIZE.min(remaining as usize).max(1)];

        while remaining > 0 {
            let want = (buf.len() as u64).min(remaining) as usize;
            let read = self.locator.reader().read_at(offset, &mut buf[..want]).await?;
            if read == 0 {
                return Err(ZipError::InvalidArchive("archive truncated mid-entry"));
            }

            let produced = decompressor.push(&buf[..read])?;
            if let Some(limits) = options.limits {
                check_ratio(&limits, entry.compressed_size, output.len() as u64 + produced.len() as u64)?;
            }
            if let Some(h) = hasher.as_mut() {
                h.update(&produced);
            }
            on_progress(produced.len() as u64);
            output.extend_from_slice(&produced);

            offset += read as u64;
            remaining -= read as u64;
        }

        let tail = decompressor.finish()?;
        if let Some(h) = hasher.as_mut() {
            h.update(&tail);
        }
        if !tail.is_empty() {
            on_progress(tail.len() as u64);
        }
        output.extend_from_slice(&tail);

        if let Some(h) = hasher {
            let computed = h.finalize();
            if computed != entry.checksum {
                return Err(ZipError::ChecksumMismatch {
                    expected: entry.checksum,
                    computed,
                });
            }
        }

        Ok(output)
    }

    /// Extract a file to the filesystem, creating parent directories as
    /// needed.
    pub async fn extract_to_file(
        &self,
        entry: &ZipEntryInfo,
        output_path: &Path,
    ) -> Result<(), ZipError> {
        if let Some(parent) = output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let data = self.extract_to_memory(entry).await?;

        let mut file = fs::File::create(output_path).await?;
        file.write_all(&data).await?;

        Ok(())
    }

    /// Extract a file's contents directly to standard output.
    pub async fn extract_to_stdout(&self, entry: &ZipEntryInfo) -> Result<(), ZipError> {
        let data = self.extract_to_memory(entry).await?;

        let mut stdout = tokio::io::stdout();
        stdout.write_all(&data).await?;

        Ok(())
    }
}

fn check_ratio(limits: &ExtractLimits, compressed_so_far: u64, decompressed_so_far: u64) -> Result<(), ZipError> {
    if decompressed_so_far > limits.max_decompressed_size {
        return Err(ZipError::DecompressedTooLarge);
    }
    if compressed_so_far > 0 && decompressed_so_far / compressed_so_far.max(1) > limits.max_compression_ratio {
        return Err(ZipError::DecompressedTooLarge);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::structures::CompressionMethod;
    use async_trait::async_trait;

    struct MemSource(Vec<u8>);

    #[async_trait]
    impl ReadAt for MemSource {
        async fn read_at(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
            let start = offset as usize;
            let end = (start + buf.len()).min(self.0.len());
            let n = end.saturating_sub(start);
            buf[..n].copy_from_slice(&self.0[start..end]);
            Ok(n)
        }

        fn size(&self) -> u64 {
            self.0.len() as u64
        }
    }

    fn stored_entry(compressed_size: u64, file_size: u64) -> ZipEntryInfo {
        ZipEntryInfo {
            path: "f".into(),
            raw_offset: 0,
            file_size,
            compressed_size,
            checksum: 0,
            compression: CompressionMethod::Stored,
            last_mod_time: 0,
            last_mod_date: 0,
            encrypted: false,
            internal_attrs: 0,
            external_attrs: 0,
        }
    }

    #[tokio::test]
    async fn zero_compressed_size_is_a_no_op() {
        let extractor = ZipExtractor::new(Arc::new(MemSource(Vec::new())));
        let entry = stored_entry(0, 0);
        let mut calls = 0;
        let data = extractor
            .extract_with_progress(&entry, ExtractOptions::default(), |_| calls += 1)
            .await
            .unwrap();
        assert!(data.is_empty());
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn encrypted_entry_is_rejected_before_any_read() {
        let extractor = ZipExtractor::new(Arc::new(MemSource(Vec::new())));
        let mut entry = stored_entry(4, 4);
        entry.encrypted = true;
        let result = extractor.extract_to_memory(&entry).await;
        assert!(matches!(result, Err(ZipError::Encrypted)));
    }
}
