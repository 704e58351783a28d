//! # remzip
//!
//! Random-access ZIP reading over HTTP(S) byte-range requests.
//!
//! This library inspects and selectively extracts entries from a ZIP
//! archive without downloading it in full, by issuing HTTP Range
//! requests (RFC 7233) for just the End of Central Directory, the
//! Central Directory, and the Local File Header + data of whichever
//! entries are actually extracted. The same abstraction also works
//! against local files, which is how the test suite exercises it
//! without a network.
//!
//! ## Features
//!
//! - Archive inspection via a handful of range reads, independent of archive size
//! - ZIP64 support for archives and entries beyond the 32-bit size limits
//! - STORED, DEFLATE, BZIP2, LZMA, and Zstandard decompression
//! - CP437 and UTF-8 filename decoding
//! - Streaming extraction with progress callbacks and optional CRC-32 verification
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use remzip::{HttpRangeReader, ZipExtractor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let reader = Arc::new(HttpRangeReader::new("https://example.com/archive.zip".to_string()).await?);
//!     let extractor = ZipExtractor::new(reader);
//!
//!     for entry in extractor.list_files().await? {
//!         println!("{}", entry.path);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use io::{HttpRangeReader, HttpReaderConfig, LocalFileReader, ReadAt};
pub use zip::{ExtractLimits, ExtractOptions, ZipEntryInfo, ZipExtractor};
