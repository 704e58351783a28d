//! ZIP file format data structures.
//!
//! This module defines the data structures that represent the various
//! components of a ZIP file according to the PKZIP APPNOTE specification.
//!
//! ## ZIP File Layout
//!
//! ```text
//! [Local File Header 1]
//! [File Data 1]
//! [Local File Header 2]
//! [File Data 2]
//! ...
//! [Central Directory File Header 1]
//! [Central Directory File Header 2]
//! ...
//! [ZIP64 End of Central Directory Record] (optional)
//! [ZIP64 End of Central Directory Locator] (optional)
//! [End of Central Directory Record]
//! ```

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::ZipError;

/// ZIP compression methods.
///
/// ZIP supports various compression methods, identified by a 16-bit integer.
/// This enum represents the closed set of methods this crate can decompress,
/// plus a catch-all for everything else the format allows but this crate
/// does not implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// No compression (method 0)
    Stored,
    /// DEFLATE compression (method 8)
    Deflate,
    /// BZIP2 compression (method 12)
    Bzip2,
    /// LZMA compression (method 14)
    Lzma,
    /// Zstandard compression (method 93)
    Zstd,
    /// Any other method this crate does not implement
    Unsupported(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            12 => CompressionMethod::Bzip2,
            14 => CompressionMethod::Lzma,
            93 => CompressionMethod::Zstd,
            _ => CompressionMethod::Unsupported(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Bzip2 => 12,
            CompressionMethod::Lzma => 14,
            CompressionMethod::Zstd => 93,
            CompressionMethod::Unsupported(v) => *v,
        }
    }
}

/// General purpose bit flag bit 0: entry data is encrypted.
pub const GPBF_ENCRYPTED: u16 = 0x0001;
/// General purpose bit flag bit 11: filename/comment are UTF-8, not CP437.
pub const GPBF_UTF8: u16 = 0x0800;

/// End of Central Directory (EOCD) record.
///
/// ## Structure (22 bytes minimum)
///
/// | Offset | Size | Description |
/// |--------|------|-------------|
/// | 0 | 4 | Signature (0x06054b50) |
/// | 4 | 2 | Disk number |
/// | 6 | 2 | Disk with Central Directory |
/// | 8 | 2 | Entries on this disk |
/// | 10 | 2 | Total entries |
/// | 12 | 4 | Central Directory size |
/// | 16 | 4 | Central Directory offset |
/// | 20 | 2 | Comment length |
/// | 22 | n | Comment (variable) |
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self, ZipError> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(ZipError::InvalidArchive("bad End of Central Directory"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    /// Check if this archive requires ZIP64 extensions.
    ///
    /// ZIP64 is needed when any of the following fields have their
    /// maximum value (indicating the real value is in the ZIP64 EOCD):
    /// disk entries or total entries at `0xFFFF`, CD size or CD offset at
    /// `0xFFFFFFFF`. These are the correct sentinel widths for each
    /// field; a 32-bit field never uses a 16-bit sentinel or vice versa.
    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }

    /// Reject archives that span more than one disk. Multi-disk archives
    /// are out of scope: a remote byte-range source has no notion of
    /// "the next disk". Matches the detection a multi-disk archive
    /// actually triggers: the current disk differs from the disk holding
    /// the Central Directory, or the entry count on this disk differs
    /// from the total entry count.
    pub fn reject_multi_disk(&self) -> Result<(), ZipError> {
        if self.disk_number != self.disk_with_cd || self.disk_entries != self.total_entries {
            return Err(ZipError::MultiDisk);
        }
        Ok(())
    }
}

/// ZIP64 End of Central Directory Locator.
///
/// ## Structure (20 bytes)
///
/// | Offset | Size | Description |
/// |--------|------|-------------|
/// | 0 | 4 | Signature (0x07064b50) |
/// | 4 | 4 | Disk with ZIP64 EOCD |
/// | 8 | 8 | ZIP64 EOCD offset |
/// | 16 | 4 | Total number of disks |
pub struct Zip64EOCDLocator {
    pub disk_with_eocd64: u32,
    pub eocd64_offset: u64,
    pub total_disks: u32,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self, ZipError> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(ZipError::InvalidArchive("bad ZIP64 EOCD locator"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_with_eocd64: cursor.read_u32::<LittleEndian>()?,
            eocd64_offset: cursor.read_u64::<LittleEndian>()?,
            total_disks: cursor.read_u32::<LittleEndian>()?,
        })
    }
}

/// ZIP64 End of Central Directory record.
///
/// ## Structure (56 bytes minimum)
///
/// | Offset | Size | Description |
/// |--------|------|-------------|
/// | 0 | 4 | Signature (0x06064b50) |
/// | 4 | 8 | Size of ZIP64 EOCD (excluding signature and this field) |
/// | 12 | 2 | Version made by |
/// | 14 | 2 | Version needed to extract |
/// | 16 | 4 | Disk number |
/// | 20 | 4 | Disk with Central Directory |
/// | 24 | 8 | Entries on this disk |
/// | 32 | 8 | Total entries |
/// | 40 | 8 | Central Directory size |
/// | 48 | 8 | Central Directory offset |
pub struct Zip64EOCD {
    pub eocd64_size: u64,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub disk_number: u32,
    pub disk_with_cd: u32,
    pub disk_entries: u64,
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self, ZipError> {
        if data.len() < Self::MIN_SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(ZipError::InvalidArchive("bad ZIP64 EOCD record"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            eocd64_size: cursor.read_u64::<LittleEndian>()?,
            version_made_by: cursor.read_u16::<LittleEndian>()?,
            version_needed: cursor.read_u16::<LittleEndian>()?,
            disk_number: cursor.read_u32::<LittleEndian>()?,
            disk_with_cd: cursor.read_u32::<LittleEndian>()?,
            disk_entries: cursor.read_u64::<LittleEndian>()?,
            total_entries: cursor.read_u64::<LittleEndian>()?,
            cd_size: cursor.read_u64::<LittleEndian>()?,
            cd_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// Central Directory File Header signature: "PK\x01\x02"
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
/// Minimum size of Central Directory File Header (46 bytes)
pub const CDFH_MIN_SIZE: usize = 46;
/// Local File Header signature: "PK\x03\x04"
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
/// Size of Local File Header (30 bytes, fixed portion)
pub const LFH_SIZE: usize = 30;

/// Parsed ZIP entry metadata, resolved from a Central Directory File
/// Header (plus its ZIP64 extra field, if present).
///
/// ## Example
///
/// ```ignore
/// for entry in archive.entries() {
///     println!("{}: {} bytes (compressed: {})",
///         entry.path, entry.file_size, entry.compressed_size);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ZipEntryInfo {
    /// The entry's path within the archive, decoded per its UTF-8/CP437 flag.
    pub path: String,
    /// Offset of this entry's Local File Header from the start of the archive.
    pub raw_offset: u64,
    /// Uncompressed size in bytes.
    pub file_size: u64,
    /// Compressed size in bytes.
    pub compressed_size: u64,
    /// CRC-32 of the uncompressed data.
    pub checksum: u32,
    /// Compression method used for this entry.
    pub compression: CompressionMethod,
    /// Last modification time, DOS-packed format.
    pub last_mod_time: u16,
    /// Last modification date, DOS-packed format.
    pub last_mod_date: u16,
    /// True when general purpose bit flag 0 is set: this entry is encrypted.
    pub encrypted: bool,
    /// Internal file attributes (bit 0 historically meant "looks like text").
    pub internal_attrs: u16,
    /// External file attributes (host-specific; on Unix, the high 16 bits
    /// hold the st_mode value).
    pub external_attrs: u32,
}

impl ZipEntryInfo {
    /// Directory entries are conventionally named with a trailing `/`.
    pub fn is_dir(&self) -> bool {
        self.path.ends_with('/')
    }

    /// Parse the modification date from DOS format.
    ///
    /// DOS date format packs year, month, and day into 16 bits:
    /// - Bits 0-4: Day (1-31)
    /// - Bits 5-8: Month (1-12)
    /// - Bits 9-15: Year offset from 1980
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse the modification time from DOS format.
    ///
    /// DOS time format packs hour, minute, and second into 16 bits:
    /// - Bits 0-4: Second / 2 (0-29, representing 0-58 seconds)
    /// - Bits 5-10: Minute (0-59)
    /// - Bits 11-15: Hour (0-23)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mod_date_decodes_with_correct_year_shift() {
        // 1980-01-01, the DOS epoch: year bits all zero.
        let entry = ZipEntryInfo {
            path: "f".into(),
            raw_offset: 0,
            file_size: 0,
            compressed_size: 0,
            checksum: 0,
            compression: CompressionMethod::Stored,
            last_mod_time: 0,
            last_mod_date: (1 << 5) | 1, // month=1, day=1, year bits=0
            encrypted: false,
            internal_attrs: 0,
            external_attrs: 0,
        };
        assert_eq!(entry.mod_date(), (1980, 1, 1));
    }

    #[test]
    fn mod_date_year_uses_nine_bit_shift_not_eight() {
        // year offset = 45 -> 2025, encoded in bits 9..15.
        let date = (45u16 << 9) | (6 << 5) | 15;
        let entry = ZipEntryInfo {
            path: "f".into(),
            raw_offset: 0,
            file_size: 0,
            compressed_size: 0,
            checksum: 0,
            compression: CompressionMethod::Stored,
            last_mod_time: 0,
            last_mod_date: date,
            encrypted: false,
            internal_attrs: 0,
            external_attrs: 0,
        };
        assert_eq!(entry.mod_date(), (2025, 6, 15));
    }

    #[test]
    fn compression_method_round_trips() {
        for code in [0u16, 8, 12, 14, 93, 99] {
            assert_eq!(CompressionMethod::from_u16(code).as_u16(), code);
        }
    }

    #[test]
    fn eocd_detects_zip64_sentinels() {
        let eocd = EndOfCentralDirectory {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: 0xFFFF,
            total_entries: 0xFFFF,
            cd_size: 0xFFFFFFFF,
            cd_offset: 0xFFFFFFFF,
            comment_len: 0,
        };
        assert!(eocd.is_zip64());
    }

    #[test]
    fn eocd_rejects_multi_disk_archives() {
        let eocd = EndOfCentralDirectory {
            disk_number: 1,
            disk_with_cd: 0,
            disk_entries: 1,
            total_entries: 1,
            cd_size: 10,
            cd_offset: 0,
            comment_len: 0,
        };
        assert!(eocd.reject_multi_disk().is_err());
    }

    #[test]
    fn eocd_rejects_entry_count_mismatch_on_a_single_disk() {
        // disk_number == disk_with_cd, but disk_entries != total_entries:
        // the canonical multi-disk signal even when both disk fields are 0.
        let eocd = EndOfCentralDirectory {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: 1,
            total_entries: 2,
            cd_size: 10,
            cd_offset: 0,
            comment_len: 0,
        };
        assert!(eocd.reject_multi_disk().is_err());
    }

    #[test]
    fn eocd_accepts_single_disk_archive() {
        let eocd = EndOfCentralDirectory {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: 3,
            total_entries: 3,
            cd_size: 10,
            cd_offset: 0,
            comment_len: 0,
        };
        assert!(eocd.reject_multi_disk().is_ok());
    }
}
