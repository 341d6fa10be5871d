//! Error types for decoding and comparison requests.
//!
//! Field-level defects never surface here: a malformed SNR or locator is
//! dropped where it is read. Only file-level and request-level failures are
//! reported, each carrying enough context to point at the offending upload.

use std::io;
use thiserror::Error;

/// Result type for comparison operations
pub type CompareResult<T> = Result<T, CompareError>;

/// A file that cannot be read as ADIF at all.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Neither `<EOR>` nor `<EOH>` appears anywhere in the content
    #[error("no ADIF record delimiter (<EOR> or <EOH>) found")]
    NoRecordDelimiter,

    /// Content looked gzip-compressed but could not be inflated
    #[error("failed to decompress gzip content: {0}")]
    Gzip(#[from] io::Error),
}

/// Errors raised by a comparison request.
#[derive(Error, Debug)]
pub enum CompareError {
    /// Fewer than two or more than ten files were supplied
    #[error("a comparison needs between {min} and {max} files, got {count}")]
    InputSize {
        count: usize,
        min: usize,
        max: usize,
    },

    /// Identifier outside the 0-9 antenna suffix range
    #[error("configuration id {0} is outside the range 0-9")]
    InvalidConfigurationId(u8),

    /// The same identifier was bound to more than one file
    #[error("configuration {configuration_id} is bound to both '{first_file}' and '{second_file}'")]
    ConfigurationConflict {
        configuration_id: u8,
        first_file: String,
        second_file: String,
    },

    /// One uploaded file could not be decoded
    #[error("failed to decode '{file_name}' (configuration {configuration_id}): {source}")]
    Decode {
        configuration_id: u8,
        file_name: String,
        #[source]
        source: DecodeError,
    },

    /// A decode worker panicked or was cancelled
    #[error("decode worker failed: {0}")]
    Worker(String),
}
