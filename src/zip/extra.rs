//! ZIP64 extended information extra field parsing (header id `0x0001`).
//!
//! The Central Directory File Header and Local File Header both carry a
//! variable-length "extra field" area. When a 32-bit size/offset field in
//! the fixed header is set to its sentinel value (`0xFFFFFFFF`, or
//! `0xFFFF` for the disk-start field), the real 64-bit value lives here
//! instead, in a fixed order: uncompressed size, compressed size, local
//! header offset, disk start number, each present only if its sentinel
//! fired.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::ZipError;

/// ZIP64 extra field header id.
pub const ZIP64_EXTRA_ID: u16 = 0x0001;

/// 64-bit overrides recovered from a ZIP64 extra field, present only for
/// the fields whose fixed-width counterpart held a sentinel value.
#[derive(Debug, Default, Clone, Copy)]
pub struct Zip64Overrides {
    pub uncompressed_size: Option<u64>,
    pub compressed_size: Option<u64>,
    pub lfh_offset: Option<u64>,
    pub disk_start: Option<u32>,
}

/// Walk the extra field bytes looking for a ZIP64 record, pulling out
/// only the overrides the caller says are needed (i.e. whose fixed
/// header field held the corresponding sentinel).
pub fn parse_zip64_extra(
    extra: &[u8],
    need_uncompressed: bool,
    need_compressed: bool,
    need_offset: bool,
    need_disk: bool,
) -> Result<Zip64Overrides, ZipError> {
    let mut overrides = Zip64Overrides::default();
    let end = extra.len() as u64;
    let mut cursor = Cursor::new(extra);

    while cursor.position() + 4 <= end {
        let id = cursor.read_u16::<LittleEndian>()?;
        let size = cursor.read_u16::<LittleEndian>()? as u64;
        let field_end = cursor.position() + size;
        if field_end > end {
            break;
        }

        if id == ZIP64_EXTRA_ID {
            if need_uncompressed && cursor.position() + 8 <= field_end {
                overrides.uncompressed_size = Some(cursor.read_u64::<LittleEndian>()?);
            }
            if need_compressed && cursor.position() + 8 <= field_end {
                overrides.compressed_size = Some(cursor.read_u64::<LittleEndian>()?);
            }
            if need_offset && cursor.position() + 8 <= field_end {
                overrides.lfh_offset = Some(cursor.read_u64::<LittleEndian>()?);
            }
            if need_disk && cursor.position() + 4 <= field_end {
                overrides.disk_start = Some(cursor.read_u32::<LittleEndian>()?);
            }
        }

        cursor.set_position(field_end);
    }

    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Write;

    fn build_zip64_extra(uncompressed: u64, compressed: u64, offset: u64) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.write_u64::<LittleEndian>(uncompressed).unwrap();
        payload.write_u64::<LittleEndian>(compressed).unwrap();
        payload.write_u64::<LittleEndian>(offset).unwrap();

        let mut extra = Vec::new();
        extra.write_u16::<LittleEndian>(ZIP64_EXTRA_ID).unwrap();
        extra
            .write_u16::<LittleEndian>(payload.len() as u16)
            .unwrap();
        extra.write_all(&payload).unwrap();
        extra
    }

    #[test]
    fn recovers_only_requested_fields() {
        let extra = build_zip64_extra(u64::MAX, 4096, 8192);
        let overrides = parse_zip64_extra(&extra, true, true, true, false).unwrap();
        assert_eq!(overrides.uncompressed_size, Some(u64::MAX));
        assert_eq!(overrides.compressed_size, Some(4096));
        assert_eq!(overrides.lfh_offset, Some(8192));
        assert_eq!(overrides.disk_start, None);
    }

    #[test]
    fn ignores_unrelated_extra_fields() {
        let mut extra = Vec::new();
        extra.write_u16::<LittleEndian>(0x9999).unwrap();
        extra.write_u16::<LittleEndian>(4).unwrap();
        extra.write_u32::<LittleEndian>(0).unwrap();
        extra.extend(build_zip64_extra(10, 20, 30));

        let overrides = parse_zip64_extra(&extra, true, true, true, false).unwrap();
        assert_eq!(overrides.uncompressed_size, Some(10));
    }
}
