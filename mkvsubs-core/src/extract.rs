//! Subtitle and attachment extraction
//!
//! One pass over a Matroska container: element tags are folded into an
//! [`Extractor`], which registers subtitle tracks, routes their blocks,
//! collects attachments, and at end of stream renders every track.
//!
//! A pass is all-or-nothing. Any read or decode failure discards everything
//! accumulated so far, and a pass that finds nothing is an error.

use std::cell::Cell;
use std::io::{self, ErrorKind, Read};
use std::rc::Rc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

pub mod attachments;
pub mod blocks;
pub mod encoding;
pub mod tracks;

pub use attachments::AttachmentCollector;
pub use blocks::{route_block, BlockAccumulator, BlockRecord, RoutedBlock};
pub use encoding::{Compression, ContentEncoding};
pub use tracks::{SubtitleTrack, TrackRegistry, SUBTITLE_TRACK_TYPE};

use crate::error::{DecodeError, ExtractError, Result};
use crate::mkv::{element_stream, Master, MatroskaSpec};
use crate::output::OutputFile;
use crate::subtitles::render_track;

/// Read size used when pulling from an async byte source.
pub const CHUNK_SIZE: usize = 64 * 1024;

// ============================================================================
// Run State
// ============================================================================

/// State of one extraction pass. Created empty, fed element tags in
/// document order, consumed by [`Extractor::finish`].
#[derive(Debug, Default)]
pub struct Extractor {
    tracks: TrackRegistry,
    blocks: BlockAccumulator,
    attachments: AttachmentCollector,
    events_seen: u64,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// React to one element tag. Masters are expected as `Start`/`End` pairs,
    /// the way [`element_stream`] emits them; buffered `Full` masters are
    /// ignored.
    pub fn handle(&mut self, tag: MatroskaSpec) -> Result<()> {
        self.events_seen += 1;
        match tag {
            MatroskaSpec::TrackEntry(Master::Start) => self.tracks.begin_entry(),
            MatroskaSpec::TrackEntry(Master::End) => {
                if self.tracks.commit()?.is_some() {
                    self.blocks.add_track();
                }
            }
            MatroskaSpec::ContentEncoding(Master::Start) => self.tracks.begin_encoding(),
            MatroskaSpec::ContentEncoding(Master::End) => self.tracks.end_encoding(),
            MatroskaSpec::TrackNumber(number) => self.tracks.set_number(number),
            MatroskaSpec::TrackType(track_type) => self.tracks.set_type(track_type),
            MatroskaSpec::CodecID(codec_id) => self.tracks.set_codec_id(codec_id),
            MatroskaSpec::CodecPrivate(data) => self.tracks.set_codec_private(Bytes::from(data)),
            MatroskaSpec::ContentEncodingScope(scope) => self.tracks.encoding().scope = scope,
            MatroskaSpec::ContentEncodingType(kind) => self.tracks.encoding().encoding_type = kind,
            MatroskaSpec::ContentCompAlgo(algo) => self.tracks.encoding().algo = algo,
            MatroskaSpec::ContentCompSettings(settings) => {
                self.tracks.encoding().settings = Bytes::from(settings)
            }

            MatroskaSpec::Timestamp(time_ms) => self.blocks.set_cluster_time(time_ms),
            MatroskaSpec::BlockGroup(Master::Start) => self.blocks.begin_group(),
            MatroskaSpec::BlockGroup(Master::End) => self.blocks.end_group(),
            MatroskaSpec::SimpleBlock(payload) | MatroskaSpec::Block(payload) => {
                self.handle_block(Bytes::from(payload))?
            }
            MatroskaSpec::BlockDuration(duration_ms) => self.blocks.set_duration(duration_ms),

            MatroskaSpec::FileName(name) => self.attachments.set_name(name)?,
            MatroskaSpec::FileData(data) => self.attachments.set_data(Bytes::from(data))?,
            MatroskaSpec::AttachedFile(Master::End) => self.attachments.end_file(),
            _ => {}
        }
        Ok(())
    }

    fn handle_block(&mut self, payload: Bytes) -> Result<()> {
        let Some(routed) = route_block(&self.tracks, &payload)? else {
            self.blocks.ignore_block();
            return Ok(());
        };
        let text = routed.track.frame_text(&routed.frame)?;
        self.blocks.push(routed.track_index, text, routed.line_offset_ms);
        Ok(())
    }

    /// End of input: render every subtitle track in registration order after
    /// the attachments, and fail if nothing was found.
    pub fn finish(self) -> Result<Vec<OutputFile>> {
        let events_seen = self.events_seen;
        let tracks = self.tracks.into_tracks();
        let records = self.blocks.into_records();
        let mut files = self.attachments.into_files();
        let attachment_count = files.len();

        for (index, (track, records)) in tracks.iter().zip(records.iter()).enumerate() {
            let rendered = render_track(&track.codec_header, records);
            let name = rendered.file_name(index);
            tracing::debug!(
                "Track {} rendered as {} ({} blocks)",
                track.track_number,
                name,
                records.len()
            );
            files.push(OutputFile::text(name, rendered.content));
        }

        if files.is_empty() {
            tracing::warn!("No subtitle tracks or attachments in {} events", events_seen);
            return Err(ExtractError::EmptyResult);
        }

        tracing::info!(
            "Extracted {} subtitle track(s) and {} attachment(s)",
            tracks.len(),
            attachment_count
        );
        Ok(files)
    }
}

// ============================================================================
// Byte Sources
// ============================================================================

/// Byte source wrapper that keeps the first read failure, so a failing
/// source is reported as [`ExtractError::Acquisition`] and not as malformed
/// container data.
struct SourceReader<R> {
    inner: R,
    failure: Rc<Cell<Option<io::Error>>>,
}

impl<R: Read> Read for SourceReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.inner.read(buf) {
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    let kind = e.kind();
                    self.failure.set(Some(e));
                    return Err(io::Error::new(kind, "byte source failed"));
                }
                Ok(n) => return Ok(n),
            }
        }
    }
}

fn extract_from<R: Read>(source: R) -> Result<Vec<OutputFile>> {
    let failure = Rc::new(Cell::new(None));
    let reader = SourceReader {
        inner: source,
        failure: Rc::clone(&failure),
    };

    let mut extractor = Extractor::new();
    for tag in element_stream(reader) {
        match tag {
            Ok(tag) => extractor.handle(tag)?,
            Err(err) => {
                return Err(match failure.take() {
                    Some(source_error) => ExtractError::Acquisition(source_error),
                    None => DecodeError::Element(err.to_string()).into(),
                });
            }
        }
    }
    if let Some(source_error) = failure.take() {
        return Err(ExtractError::Acquisition(source_error));
    }
    extractor.finish()
}

// ============================================================================
// Public API
// ============================================================================

/// Fold an already-decoded tag sequence into output files.
pub fn extract_events<I>(events: I) -> Result<Vec<OutputFile>>
where
    I: IntoIterator<Item = MatroskaSpec>,
{
    events
        .into_iter()
        .try_fold(Extractor::new(), |mut extractor, event| {
            extractor.handle(event)?;
            Ok::<_, ExtractError>(extractor)
        })?
        .finish()
}

/// Extract from a container held fully in memory.
pub fn extract_bytes(data: &[u8]) -> Result<Vec<OutputFile>> {
    extract_from(data)
}

/// Extract from a blocking byte source, decoding as it is read.
pub fn extract_reader<R: Read>(reader: R) -> Result<Vec<OutputFile>> {
    extract_from(reader)
}

/// Extract from an async byte source. The whole input is awaited in
/// [`CHUNK_SIZE`] reads before decoding starts.
pub async fn extract_async<R: AsyncRead + Unpin>(mut reader: R) -> Result<Vec<OutputFile>> {
    let mut data = Vec::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);
    }
    tracing::debug!("Read {} bytes from async source", data.len());
    extract_bytes(&data)
}
