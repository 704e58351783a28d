//! Directory loader: read the Central Directory and produce the archive's
//! entry list.
//!
//! Once the archive locator has found the EOCD (and ZIP64 EOCD, if
//! present), the Central Directory's location and size are known. This
//! module fetches it in a single read and parses every Central
//! Directory File Header it contains.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::error::ZipError;
use crate::io::ReadAt;

use super::cp437;
use super::extra::parse_zip64_extra;
use super::locator::ArchiveLocator;
use super::structures::{CDFH_SIGNATURE, CompressionMethod, GPBF_ENCRYPTED, ZipEntryInfo};

/// Load every entry from the archive's Central Directory.
///
/// Reads the whole Central Directory in a single request (one Range
/// request for remote sources) and parses each Central Directory File
/// Header in turn, resolving ZIP64 extra fields and CP437/UTF-8
/// filenames as it goes.
pub async fn load_entries<R: ReadAt>(
    locator: &ArchiveLocator<R>,
) -> Result<Vec<ZipEntryInfo>, ZipError> {
    let (eocd, eocd_offset) = locator.find_eocd().await?;

    let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
        let eocd64 = locator.read_zip64_eocd(eocd_offset).await?;
        (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
    } else {
        (
            eocd.cd_offset as u64,
            eocd.cd_size as u64,
            eocd.total_entries as u64,
        )
    };

    let mut cd_data = vec![0u8; cd_size as usize];
    locator.reader().read_at(cd_offset, &mut cd_data).await?;

    let mut entries = Vec::with_capacity(total_entries as usize);
    let mut cursor = Cursor::new(&cd_data);

    for _ in 0..total_entries {
        entries.push(parse_cdfh(&mut cursor)?);
    }

    Ok(entries)
}

/// Parse a single Central Directory File Header from a cursor
/// positioned at its start.
fn parse_cdfh(cursor: &mut Cursor<&Vec<u8>>) -> Result<ZipEntryInfo, ZipError> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        return Err(ZipError::InvalidArchive(
            "bad Central Directory File Header signature",
        ));
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let compressed_size_raw = cursor.read_u32::<LittleEndian>()?;
    let uncompressed_size_raw = cursor.read_u32::<LittleEndian>()?;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let external_attrs = cursor.read_u32::<LittleEndian>()?;
    let lfh_offset_raw = cursor.read_u32::<LittleEndian>()?;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    let path = cp437::decode_filename(&file_name_bytes, flags);

    let extra_field_end = cursor.position() + extra_field_length as u64;
    let mut extra_bytes = vec![0u8; extra_field_length as usize];
    cursor.read_exact(&mut extra_bytes)?;

    let overrides = parse_zip64_extra(
        &extra_bytes,
        uncompressed_size_raw == 0xFFFFFFFF,
        compressed_size_raw == 0xFFFFFFFF,
        lfh_offset_raw == 0xFFFFFFFF,
        false,
    )?;

    cursor.set_position(extra_field_end);
    cursor.set_position(cursor.position() + file_comment_length as u64);

    Ok(ZipEntryInfo {
        path,
        raw_offset: overrides.lfh_offset.unwrap_or(lfh_offset_raw as u64),
        file_size: overrides
            .uncompressed_size
            .unwrap_or(uncompressed_size_raw as u64),
        compressed_size: overrides
            .compressed_size
            .unwrap_or(compressed_size_raw as u64),
        checksum: crc32,
        compression: CompressionMethod::from_u16(compression_method),
        last_mod_time,
        last_mod_date,
        encrypted: flags & GPBF_ENCRYPTED != 0,
        internal_attrs,
        external_attrs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use byteorder::WriteBytesExt;
    use std::io::Write;
    use std::sync::Arc;

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

    /// Builds a minimal single-entry STORED archive: one LFH + data,
    /// one CDFH, one EOCD. Used to exercise the locator + directory
    /// loader together end to end.
    fn build_stored_archive(name: &str, content: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let lfh_offset = out.len() as u32;

        // Local File Header
        out.extend_from_slice(b"PK\x03\x04");
        out.write_u16::<LittleEndian>(20).unwrap(); // version needed
        out.write_u16::<LittleEndian>(0).unwrap(); // flags
        out.write_u16::<LittleEndian>(0).unwrap(); // method: stored
        out.write_u16::<LittleEndian>(0).unwrap(); // time
        out.write_u16::<LittleEndian>(0).unwrap(); // date
        out.write_u32::<LittleEndian>(crc32fast::hash(content)).unwrap();
        out.write_u32::<LittleEndian>(content.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(content.len() as u32).unwrap();
        out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap(); // extra len
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(content);

        let cd_offset = out.len() as u32;

        // Central Directory File Header
        out.extend_from_slice(b"PK\x01\x02");
        out.write_u16::<LittleEndian>(20).unwrap(); // version made by
        out.write_u16::<LittleEndian>(20).unwrap(); // version needed
        out.write_u16::<LittleEndian>(0).unwrap(); // flags
        out.write_u16::<LittleEndian>(0).unwrap(); // method
        out.write_u16::<LittleEndian>(0).unwrap(); // time
        out.write_u16::<LittleEndian>(0).unwrap(); // date
        out.write_u32::<LittleEndian>(crc32fast::hash(content)).unwrap();
        out.write_u32::<LittleEndian>(content.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(content.len() as u32).unwrap();
        out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap(); // extra len
        out.write_u16::<LittleEndian>(0).unwrap(); // comment len
        out.write_u16::<LittleEndian>(0).unwrap(); // disk start
        out.write_u16::<LittleEndian>(0).unwrap(); // internal attrs
        out.write_u32::<LittleEndian>(0).unwrap(); // external attrs
        out.write_u32::<LittleEndian>(lfh_offset).unwrap();
        out.extend_from_slice(name.as_bytes());

        let cd_size = out.len() as u32 - cd_offset;

        // End of Central Directory
        out.extend_from_slice(b"PK\x05\x06");
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(1).unwrap();
        out.write_u16::<LittleEndian>(1).unwrap();
        out.write_u32::<LittleEndian>(cd_size).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();

        out
    }

    #[tokio::test]
    async fn loads_a_single_stored_entry() {
        let archive = build_stored_archive("hello.txt", b"hello world");
        let reader = Arc::new(MemSource(archive));
        let locator = ArchiveLocator::new(reader);

        let entries = load_entries(&locator).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "hello.txt");
        assert_eq!(entries[0].file_size, 11);
        assert_eq!(entries[0].compression, CompressionMethod::Stored);
        assert!(!entries[0].is_dir());
        assert!(!entries[0].encrypted);
    }
}
