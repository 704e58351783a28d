//! Filename decoding: CP437 vs UTF-8 selection.
//!
//! The general purpose bit flag's bit 11 tells us how a raw filename
//! byte string is encoded. If set, it's UTF-8 (the modern default most
//! tools now write). If clear, PKZIP's original default applies: IBM
//! code page 437, the original PC-DOS character set.

use std::borrow::Cow;

use codepage_437::{BorrowFromCp437, CP437_CONTROL};

use super::structures::GPBF_UTF8;

/// Decode a raw filename/comment byte string per the general purpose
/// bit flag's UTF-8 bit.
pub fn decode_filename(raw: &[u8], flags: u16) -> String {
    if flags & GPBF_UTF8 != 0 {
        String::from_utf8_lossy(raw).into_owned()
    } else {
        let decoded: Cow<str> = Cow::borrow_from_cp437(raw, &CP437_CONTROL);
        decoded.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ascii_identically_under_either_flag() {
        let raw = b"hello.txt";
        assert_eq!(decode_filename(raw, 0), "hello.txt");
        assert_eq!(decode_filename(raw, GPBF_UTF8), "hello.txt");
    }

    #[test]
    fn decodes_utf8_when_flag_set() {
        let raw = "café.txt".as_bytes();
        assert_eq!(decode_filename(raw, GPBF_UTF8), "café.txt");
    }

    #[test]
    fn decodes_cp437_high_bytes_when_flag_clear() {
        // 0x81 is "ü" in CP437.
        let raw = [0x81u8, b'.', b't', b'x', b't'];
        assert_eq!(decode_filename(&raw, 0), "ü.txt");
    }
}
