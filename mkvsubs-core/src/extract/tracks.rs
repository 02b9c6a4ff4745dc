//! Track registry: keeps the subtitle tracks declared in the Tracks element.

use bytes::Bytes;

use super::encoding::{ContentEncoding, PendingEncoding};
use crate::error::DecodeError;

/// TrackType value Matroska reserves for subtitle tracks.
pub const SUBTITLE_TRACK_TYPE: u64 = 0x11;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleTrack {
    pub track_number: u64,
    pub codec_id: Option<String>,
    /// CodecPrivate as text; empty when the track declares none
    pub codec_header: String,
    pub encoding: Option<ContentEncoding>,
}

impl SubtitleTrack {
    /// Decode a block frame into its text payload.
    pub fn frame_text(&self, frame: &[u8]) -> Result<String, DecodeError> {
        match self.encoding.as_ref().filter(|e| e.applies_to_frames()) {
            Some(encoding) => {
                let decoded = encoding.decode(frame).map_err(|source| DecodeError::Inflate {
                    track: self.track_number,
                    source,
                })?;
                Ok(String::from_utf8_lossy(&decoded).into_owned())
            }
            None => Ok(String::from_utf8_lossy(frame).into_owned()),
        }
    }
}

/// TrackEntry fields buffered until the entry closes.
#[derive(Debug, Default)]
struct PendingTrack {
    number: Option<u64>,
    track_type: Option<u64>,
    codec_id: Option<String>,
    codec_private: Option<Bytes>,
    encodings: Vec<PendingEncoding>,
    current_encoding: Option<PendingEncoding>,
}

#[derive(Debug, Default)]
pub struct TrackRegistry {
    tracks: Vec<SubtitleTrack>,
    pending: PendingTrack,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_entry(&mut self) {
        self.pending = PendingTrack::default();
    }

    pub fn begin_encoding(&mut self) {
        self.pending.current_encoding = Some(PendingEncoding::default());
    }

    pub fn end_encoding(&mut self) {
        if let Some(encoding) = self.pending.current_encoding.take() {
            self.pending.encodings.push(encoding);
        }
    }

    pub fn set_number(&mut self, number: u64) {
        self.pending.number = Some(number);
    }

    pub fn set_type(&mut self, track_type: u64) {
        self.pending.track_type = Some(track_type);
    }

    pub fn set_codec_id(&mut self, codec_id: String) {
        self.pending.codec_id = Some(codec_id.trim_end_matches('\0').to_string());
    }

    pub fn set_codec_private(&mut self, data: Bytes) {
        self.pending.codec_private = Some(data);
    }

    /// ContentEncoding fields being buffered for the current entry.
    pub fn encoding(&mut self) -> &mut PendingEncoding {
        self.pending.current_encoding.get_or_insert_with(Default::default)
    }

    /// Close the current TrackEntry. Returns the new track's index when the
    /// entry declared a subtitle track that can be extracted.
    pub fn commit(&mut self) -> Result<Option<usize>, DecodeError> {
        self.end_encoding();
        let pending = std::mem::take(&mut self.pending);

        if pending.track_type != Some(SUBTITLE_TRACK_TYPE) {
            return Ok(None);
        }

        let Some(track_number) = pending.number else {
            tracing::warn!("Subtitle track entry without a track number, skipping");
            return Ok(None);
        };

        let mut encodings = pending.encodings;
        if encodings.len() > 1 {
            tracing::warn!(
                "Skipping subtitle track {}: {} chained content encodings",
                track_number,
                encodings.len()
            );
            return Ok(None);
        }
        let encoding = match encodings.pop().map(PendingEncoding::resolve).transpose() {
            Ok(encoding) => encoding,
            Err(reason) => {
                tracing::warn!("Skipping subtitle track {}: {}", track_number, reason);
                return Ok(None);
            }
        };

        let codec_header = match (&pending.codec_private, &encoding) {
            (Some(private), Some(encoding)) if encoding.applies_to_codec_private() => {
                let decoded = encoding.decode(private).map_err(|source| DecodeError::Inflate {
                    track: track_number,
                    source,
                })?;
                String::from_utf8_lossy(&decoded).into_owned()
            }
            (Some(private), _) => String::from_utf8_lossy(private).into_owned(),
            (None, _) => String::new(),
        };

        if self.lookup(track_number).is_some() {
            tracing::warn!("Duplicate subtitle track number {}, keeping the first", track_number);
            return Ok(None);
        }

        tracing::debug!(
            "Registered subtitle track {} ({})",
            track_number,
            pending.codec_id.as_deref().unwrap_or("no codec id")
        );

        self.tracks.push(SubtitleTrack {
            track_number,
            codec_id: pending.codec_id,
            codec_header,
            encoding,
        });
        Ok(Some(self.tracks.len() - 1))
    }

    /// Index and definition of the subtitle track with this number.
    pub fn lookup(&self, track_number: u64) -> Option<(usize, &SubtitleTrack)> {
        self.tracks
            .iter()
            .enumerate()
            .find(|(_, t)| t.track_number == track_number)
    }

    pub fn into_tracks(self) -> Vec<SubtitleTrack> {
        self.tracks
    }
}

#[cfg(test)]
impl TrackRegistry {
    pub(crate) fn tracks(&self) -> &[SubtitleTrack] {
        &self.tracks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(registry: &mut TrackRegistry, number: u64, track_type: u64) {
        registry.begin_entry();
        registry.set_number(number);
        registry.set_type(track_type);
    }

    fn index_of(registry: &TrackRegistry, number: u64) -> Option<usize> {
        registry.lookup(number).map(|(index, _)| index)
    }

    #[test]
    fn registers_subtitle_tracks_only() {
        let mut registry = TrackRegistry::new();

        entry(&mut registry, 1, 1);
        assert_eq!(registry.commit().unwrap(), None);

        registry.begin_entry();
        registry.set_type(0x11);
        registry.set_codec_id("S_TEXT/UTF8".to_string());
        registry.set_number(3);
        assert_eq!(registry.commit().unwrap(), Some(0));

        assert_eq!(registry.tracks().len(), 1);
        assert_eq!(index_of(&registry, 3), Some(0));
        assert_eq!(index_of(&registry, 1), None);
        assert_eq!(registry.tracks()[0].codec_header, "");
        assert_eq!(registry.tracks()[0].codec_id.as_deref(), Some("S_TEXT/UTF8"));
    }

    #[test]
    fn codec_header_does_not_leak_into_next_entry() {
        let mut registry = TrackRegistry::new();

        entry(&mut registry, 2, 0x11);
        registry.set_codec_private(Bytes::from_static(b"[Script Info]"));
        registry.commit().unwrap();

        entry(&mut registry, 3, 0x11);
        registry.commit().unwrap();

        assert_eq!(registry.tracks()[0].codec_header, "[Script Info]");
        assert_eq!(registry.tracks()[1].codec_header, "");
    }

    #[test]
    fn skips_entry_without_track_number() {
        let mut registry = TrackRegistry::new();
        registry.begin_entry();
        registry.set_type(0x11);
        assert_eq!(registry.commit().unwrap(), None);
        assert!(registry.tracks().is_empty());
    }

    #[test]
    fn skips_encrypted_tracks() {
        let mut registry = TrackRegistry::new();
        entry(&mut registry, 4, 0x11);
        registry.begin_encoding();
        registry.encoding().encoding_type = 1;
        registry.end_encoding();
        assert_eq!(registry.commit().unwrap(), None);
    }

    #[test]
    fn skips_chained_encodings() {
        let mut registry = TrackRegistry::new();
        entry(&mut registry, 4, 0x11);
        for _ in 0..2 {
            registry.begin_encoding();
            registry.end_encoding();
        }
        assert_eq!(registry.commit().unwrap(), None);
    }

    #[test]
    fn header_stripping_applies_to_frames() {
        let mut registry = TrackRegistry::new();
        entry(&mut registry, 5, 0x11);
        registry.begin_encoding();
        registry.encoding().algo = 3;
        registry.encoding().settings = Bytes::from_static(b"<i>");
        registry.end_encoding();
        registry.commit().unwrap().expect("registered");

        let (_, track) = registry.lookup(5).expect("track 5");
        assert_eq!(track.frame_text(b"hi</i>").unwrap(), "<i>hi</i>");
    }

    #[test]
    fn duplicate_track_numbers_keep_first() {
        let mut registry = TrackRegistry::new();
        for header in ["first", "second"] {
            entry(&mut registry, 7, 0x11);
            registry.set_codec_private(Bytes::from(header.as_bytes().to_vec()));
            registry.commit().unwrap();
        }
        assert_eq!(registry.tracks().len(), 1);
        assert_eq!(registry.tracks()[0].codec_header, "first");
    }
}
