//! # mkvsubs core
//!
//! Rebuilds the subtitle tracks embedded in a Matroska/WebM container as
//! SubRip or Advanced SubStation files, and pulls out its attachments.
//!
//! ```no_run
//! let data = std::fs::read("movie.mkv")?;
//! for file in mkvsubs_core::extract_bytes(&data)? {
//!     println!("{} ({} bytes)", file.name, file.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// ============================================================================
// Container Elements
// ============================================================================
pub mod mkv;

// ============================================================================
// Extraction
// ============================================================================
pub mod error;
pub mod extract;
pub mod output;
pub mod subtitles;

pub use error::{DecodeError, ExtractError, Result};
pub use extract::{extract_async, extract_bytes, extract_events, extract_reader, Extractor};
pub use mkv::{Master, MatroskaSpec};
pub use output::{OutputData, OutputFile, OutputKind, OutputSummary};

// ============================================================================
// Version
// ============================================================================
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
