//! Error types for the extraction pass.
//!
//! Every error here is terminal: a pass that fails returns no output.

use thiserror::Error;

/// Malformed container data reported by the element stream or the block router.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Missing vint byte")]
    MissingVint,
    #[error("Invalid vint length (leading byte {0:#04x})")]
    InvalidVint(u8),
    #[error("Truncated vint")]
    TruncatedVint,
    #[error("Malformed element stream: {0}")]
    Element(String),
    #[error("Block for track {track} is {len} bytes, too short for its header")]
    MalformedBlock { track: u64, len: usize },
    #[error("Failed to inflate block for track {track}: {source}")]
    Inflate {
        track: u64,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a whole extraction pass.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The byte source failed before the stream was fully read
    #[error("Failed to read input: {0}")]
    Acquisition(#[from] std::io::Error),

    /// The container is malformed
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Attachment leaves of two files overlapped
    #[error("Attachment {field} arrived twice before the current attachment was complete")]
    InterleavedAttachment { field: &'static str },

    /// The stream was consumed but produced neither subtitles nor attachments
    #[error("No data found")]
    EmptyResult,
}

pub type Result<T> = std::result::Result<T, ExtractError>;
