//! Command-line interface definition for remzip.
//!
//! This module defines the CLI structure using `clap` derive macros,
//! providing a familiar interface similar to the standard `unzip` utility.

use clap::Parser;

use crate::io::{HttpReaderConfig, ProtocolVersion};

/// Command-line arguments for the remzip utility.
///
/// This structure defines all available command-line options,
/// mimicking the behavior of the standard Unix `unzip` command
/// while adding support for HTTP URLs.
#[derive(Parser, Debug)]
#[command(name = "remzip")]
#[command(version)]
#[command(about = "Random-access ZIP reading over HTTP(S) byte-range requests", long_about = None)]
#[command(after_help = "Examples:\n  \
  remzip data1.zip -x joe        extract all files except joe from data1.zip\n  \
  remzip -p foo.zip | more       send contents of foo.zip via pipe into more\n  \
  remzip -l https://example.com/archive.zip   list files from remote ZIP")]
pub struct Cli {
    /// ZIP file path or HTTP URL.
    ///
    /// Can be either a local filesystem path or an HTTP/HTTPS URL.
    /// When an HTTP URL is provided, the tool uses Range requests
    /// to efficiently access specific parts of the archive.
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files to extract (default: all).
    ///
    /// Optional list of file patterns to extract from the archive.
    /// Supports substring matching and basic glob patterns (* and ?).
    /// If not specified, all files are extracted.
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format).
    ///
    /// Display the contents of the archive without extracting.
    /// Shows only file names, one per line.
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely/show version info.
    ///
    /// Display detailed information about archive contents including
    /// file sizes, compression ratios, and modification timestamps.
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files to pipe, no messages.
    ///
    /// Write extracted file contents directly to stdout.
    /// Useful for piping archive contents to other commands.
    /// Suppresses all informational messages.
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir.
    ///
    /// Specify a target directory for extraction.
    /// The directory will be created if it doesn't exist.
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude files that follow.
    ///
    /// Specify patterns for files to exclude from extraction.
    /// Supports substring matching and basic glob patterns.
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files.
    ///
    /// Skip extraction of files that already exist in the target location.
    /// Takes precedence over the `-o` flag.
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting.
    ///
    /// Silently overwrite existing files during extraction.
    /// By default, existing files are skipped with a warning.
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories).
    ///
    /// Extract all files to the target directory without creating
    /// subdirectories. Only the base filename is used.
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode (-qq => quieter).
    ///
    /// Suppress informational output. Can be specified multiple times
    /// for increased quietness:
    /// - `-q`: Suppress most messages
    /// - `-qq`: Suppress all messages except errors
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Verify each extracted entry's CRC-32 checksum.
    ///
    /// Adds a small amount of CPU overhead per entry in exchange for
    /// detecting a corrupted download or a truncated range read.
    #[arg(long = "verify-crc")]
    pub verify_crc: bool,

    /// Extra HTTP header to send with every request, as `name: value`.
    ///
    /// May be repeated. Useful for authenticated archives behind a
    /// reverse proxy or object store that expects a bearer token or a
    /// custom header.
    #[arg(long = "header", value_name = "NAME: VALUE")]
    pub headers: Vec<String>,

    /// Skip TLS certificate verification.
    ///
    /// Only useful against self-signed or internal endpoints. Has no
    /// effect for local files.
    #[arg(long = "insecure")]
    pub insecure: bool,

    /// Restrict the HTTP client to HTTP/1.1.
    ///
    /// Some servers advertise HTTP/2 support but handle Range requests
    /// incorrectly over it; this forces the older, better-tested path.
    #[arg(long = "http1")]
    pub http1: bool,

    /// Number of times to retry a failed range request before giving up.
    #[arg(long = "retries", value_name = "N", default_value_t = 10)]
    pub retries: u32,

    /// Per-request timeout, in seconds.
    #[arg(long = "timeout", value_name = "SECONDS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl Cli {
    /// Check if the input file is an HTTP/HTTPS URL.
    ///
    /// # Returns
    ///
    /// Returns `true` if the file path starts with "http://" or "https://".
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    /// Check if quiet mode is enabled.
    ///
    /// Quiet mode is enabled either by the `-q` flag or by pipe mode (`-p`).
    ///
    /// # Returns
    ///
    /// Returns `true` if informational messages should be suppressed.
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    /// Check if very quiet mode is enabled.
    ///
    /// Very quiet mode is enabled when `-q` is specified multiple times.
    ///
    /// # Returns
    ///
    /// Returns `true` if only error messages should be displayed.
    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Build the HTTP reader configuration implied by the command-line
    /// flags. Each `--header` value is split on the first `:`; malformed
    /// entries (missing a colon) are skipped.
    pub fn http_config(&self) -> HttpReaderConfig {
        let additional_headers = self
            .headers
            .iter()
            .filter_map(|h| h.split_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect();

        HttpReaderConfig {
            additional_headers,
            insecure_skip_verify: self.insecure,
            protocol_version: if self.http1 {
                ProtocolVersion::Http1Only
            } else {
                ProtocolVersion::Auto
            },
            max_retries: self.retries,
            timeout: std::time::Duration::from_secs(self.timeout_secs),
        }
    }
}
