//! Archive locator: find the End of Central Directory and, if present,
//! its ZIP64 extension.
//!
//! ZIP files are designed to be read from the end. This is the first
//! step of reading any archive, local or remote: locate the EOCD
//! record, which points at the Central Directory, and upgrade it via
//! the ZIP64 EOCD when the classic record's fields overflowed.

use std::sync::Arc;

use crate::error::ZipError;
use crate::io::ReadAt;

use super::structures::{EndOfCentralDirectory, Zip64EOCD, Zip64EOCDLocator};

/// Maximum ZIP comment size allowed by the format (65535 bytes). Bounds
/// the backward search window to `comment + EOCD` bytes, 65557 total,
/// the exact tail-read size production ZIP readers use to avoid an
/// unbounded scan.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Locates and parses the End of Central Directory record (and its
/// ZIP64 extension, if any) for an archive reachable through `R`.
pub struct ArchiveLocator<R: ReadAt> {
    reader: Arc<R>,
    size: u64,
}

impl<R: ReadAt> ArchiveLocator<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Tries the common case first (no archive comment, EOCD is exactly
    /// the last 22 bytes) before falling back to a backward scan across
    /// the last `65535 + 22` bytes for archives carrying a comment.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64), ZipError> {
        if self.size >= EndOfCentralDirectory::SIZE as u64 {
            let offset = self.size - EndOfCentralDirectory::SIZE as u64;
            let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
            self.reader.read_at(offset, &mut buf).await?;

            if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
                let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
                eocd.reject_multi_disk()?;
                return Ok((eocd, offset));
            }
        }

        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_at(search_start, &mut buf).await?;

        for i in (0..buf.len().saturating_sub(EndOfCentralDirectory::SIZE)).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd =
                        EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                    eocd.reject_multi_disk()?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        Err(ZipError::InvalidArchive(
            "no End of Central Directory record found",
        ))
    }

    /// Read the ZIP64 End of Central Directory record, following the
    /// locator that sits immediately before the classic EOCD.
    pub async fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD, ZipError> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .ok_or(ZipError::InvalidArchive("archive too short for ZIP64 locator"))?;

        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.reader.read_at(locator_offset, &mut locator_buf).await?;
        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        self.reader
            .read_at(locator.eocd64_offset, &mut eocd64_buf)
            .await?;

        Zip64EOCD::from_bytes(&eocd64_buf)
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}
