//! ZIP archive parsing and extraction.
//!
//! ## Architecture
//!
//! - [`structures`]: binary layouts for EOCD, ZIP64 EOCD, and file headers
//! - [`extra`]: ZIP64 extended information extra field parsing
//! - [`cp437`]: CP437/UTF-8 filename decoding
//! - [`locator`]: finds the End of Central Directory from the tail of the archive
//! - [`directory`]: loads and parses the Central Directory into entries
//! - [`codec`]: per-entry decompression (STORED/DEFLATE/BZIP2/LZMA/Zstandard)
//! - [`extractor`]: the public, high-level API tying the above together
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Reading from the end (EOCD, then Central Directory, then only the
//! Local File Headers of entries actually being extracted) is what
//! makes this crate's HTTP Range-based reading efficient: listing an
//! archive's contents costs a handful of range reads regardless of how
//! large the archive or how many entries it contains.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible) and ZIP64
//! - STORED, DEFLATE, BZIP2, LZMA, and Zstandard compression methods
//! - CP437 and UTF-8 filename decoding
//! - Optional CRC-32 verification and zip-bomb guardrails
//!
//! ## Limitations
//!
//! - No support for writing or modifying archives
//! - No multi-disk archive support
//! - No encrypted entry extraction (detected and rejected, not decrypted)

pub mod codec;
pub mod cp437;
pub mod directory;
pub mod extra;
pub mod extractor;
pub mod locator;
pub mod structures;

pub use extractor::{ExtractLimits, ExtractOptions, ZipExtractor};
pub use structures::*;
