//! Block routing and per-track accumulation.

use bytes::Bytes;

use super::tracks::{SubtitleTrack, TrackRegistry};
use crate::error::DecodeError;
use crate::mkv::read_vint;

/// Bytes between the track number and the frame: 16-bit timecode + flags.
const BLOCK_SUB_HEADER_LEN: usize = 3;

/// One subtitle block, as accumulated for its track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    pub text: String,
    /// Offset from the enclosing cluster's timecode
    pub line_offset_ms: i16,
    pub cluster_time_ms: u64,
    pub duration_ms: Option<u64>,
}

impl BlockRecord {
    /// Absolute start time, saturating at both ends of the `u64` range.
    pub fn start_ms(&self) -> u64 {
        self.cluster_time_ms
            .saturating_add_signed(i64::from(self.line_offset_ms))
    }

    /// Absolute end time; a block without a duration ends where it starts.
    pub fn end_ms(&self) -> u64 {
        self.start_ms().saturating_add(self.duration_ms.unwrap_or(0))
    }
}

/// A block whose track number matched a registered subtitle track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedBlock<'a> {
    pub track_index: usize,
    pub track: &'a SubtitleTrack,
    pub line_offset_ms: i16,
    pub frame: Bytes,
}

/// Map a Block/SimpleBlock payload to its subtitle track. Blocks of other
/// tracks return `None`.
pub fn route_block<'a>(
    registry: &'a TrackRegistry,
    payload: &Bytes,
) -> Result<Option<RoutedBlock<'a>>, DecodeError> {
    let mut cursor = &payload[..];
    let track = read_vint(&mut cursor)?;

    let Some((track_index, subtitle_track)) = registry.lookup(track.value) else {
        return Ok(None);
    };

    let header_len = track.length + BLOCK_SUB_HEADER_LEN;
    if payload.len() < header_len {
        return Err(DecodeError::MalformedBlock {
            track: track.value,
            len: payload.len(),
        });
    }

    let line_offset_ms = i16::from_be_bytes([payload[track.length], payload[track.length + 1]]);

    Ok(Some(RoutedBlock {
        track_index,
        track: subtitle_track,
        line_offset_ms,
        frame: payload.slice(header_len..),
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Routed {
    /// No block seen yet in the current scope
    Nothing,
    Track(usize),
    /// Last block belonged to a track we do not extract
    Ignored,
}

/// Per-track record lists plus the cluster clock and the routing scope that
/// BlockDuration elements attach to.
#[derive(Debug)]
pub struct BlockAccumulator {
    records: Vec<Vec<BlockRecord>>,
    cluster_time_ms: u64,
    routed: Routed,
    in_group: bool,
    pending_duration: Option<u64>,
}

impl Default for BlockAccumulator {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            cluster_time_ms: 0,
            routed: Routed::Nothing,
            in_group: false,
            pending_duration: None,
        }
    }
}

impl BlockAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a record list for a newly registered track.
    pub fn add_track(&mut self) -> usize {
        self.records.push(Vec::new());
        self.records.len() - 1
    }

    pub fn set_cluster_time(&mut self, time_ms: u64) {
        self.cluster_time_ms = time_ms;
    }

    pub fn begin_group(&mut self) {
        self.in_group = true;
        self.routed = Routed::Nothing;
        self.pending_duration = None;
    }

    pub fn end_group(&mut self) {
        self.in_group = false;
        self.routed = Routed::Nothing;
        self.pending_duration = None;
    }

    /// A block for a track that is not extracted.
    pub fn ignore_block(&mut self) {
        self.routed = if self.in_group { Routed::Ignored } else { Routed::Nothing };
        self.pending_duration = None;
    }

    /// Append a routed block. Only a Block inside a BlockGroup stays routed
    /// for a following BlockDuration; a SimpleBlock has no duration siblings.
    pub fn push(&mut self, track_index: usize, text: String, line_offset_ms: i16) {
        let Some(records) = self.records.get_mut(track_index) else {
            return;
        };
        records.push(BlockRecord {
            text,
            line_offset_ms,
            cluster_time_ms: self.cluster_time_ms,
            duration_ms: self.pending_duration.take(),
        });
        self.routed = if self.in_group {
            Routed::Track(track_index)
        } else {
            Routed::Nothing
        };
    }

    /// Attach a BlockDuration to the block it belongs to.
    pub fn set_duration(&mut self, duration_ms: u64) {
        match self.routed {
            Routed::Track(index) => {
                if let Some(record) = self.records.get_mut(index).and_then(|r| r.last_mut()) {
                    record.duration_ms = Some(duration_ms);
                }
            }
            // Duration ahead of its block inside the same group
            Routed::Nothing if self.in_group => self.pending_duration = Some(duration_ms),
            Routed::Nothing | Routed::Ignored => {}
        }
    }

    pub fn into_records(self) -> Vec<Vec<BlockRecord>> {
        self.records
    }
}
