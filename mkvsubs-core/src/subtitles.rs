//! Subtitle reconstruction
//!
//! Turns a track's accumulated block records into timed cues and renders
//! them as a SubRip (`.srt`) or Advanced SubStation (`.ass`) document.
//!
//! The style is picked from the track's codec header: a header with an
//! `[Events]` section and a `Format:` line is a SubStation script, anything
//! else is rendered as SubRip.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extract::BlockRecord;

const LINE_BREAK: &str = "\r\n";

static EVENTS_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[Events\]\s+Format:[^\r\n]*").expect("valid events regex"));

// ============================================================================
// Subtitle Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Srt,
    Ass,
}

impl SubtitleFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Ass => "ass",
        }
    }
}

/// A SubStation codec header split around its events `Format:` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptHeader<'a> {
    /// Everything before `[Events]`
    pub preamble: &'a str,
    /// `[Events]` through the end of the `Format:` line
    pub format_line: &'a str,
    /// Everything after the `Format:` line, carried through verbatim
    pub trailer: &'a str,
}

impl<'a> ScriptHeader<'a> {
    pub fn parse(header: &'a str) -> Option<Self> {
        let found = EVENTS_FORMAT.find(header)?;
        Some(Self {
            preamble: &header[..found.start()],
            format_line: found.as_str(),
            trailer: &header[found.end()..],
        })
    }
}

/// Rendering style of one track, decided from its codec header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleStyle<'a> {
    Script(ScriptHeader<'a>),
    Line,
}

impl<'a> SubtitleStyle<'a> {
    pub fn detect(codec_header: &'a str) -> Self {
        match ScriptHeader::parse(codec_header) {
            Some(header) => SubtitleStyle::Script(header),
            None => SubtitleStyle::Line,
        }
    }

    pub fn format(&self) -> SubtitleFormat {
        match self {
            SubtitleStyle::Script(_) => SubtitleFormat::Ass,
            SubtitleStyle::Line => SubtitleFormat::Srt,
        }
    }
}

/// Key that groups block records into one cue.
///
/// Numeric keys sort before labels, so script events come out in ReadOrder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CueKey {
    Index(u64),
    Label(String),
}

impl CueKey {
    fn from_field(field: &str) -> Self {
        let field = field.trim();
        field
            .parse()
            .map(CueKey::Index)
            .unwrap_or_else(|_| CueKey::Label(field.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueEntry {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// One timed subtitle entry. Continuation fragments that share the key are
/// kept in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub key: CueKey,
    pub entries: Vec<CueEntry>,
}

impl Cue {
    pub fn start_ms(&self) -> u64 {
        self.entries.first().map(|e| e.start_ms).unwrap_or(0)
    }

    pub fn end_ms(&self) -> u64 {
        self.entries.iter().map(|e| e.end_ms).max().unwrap_or(0)
    }

    pub fn text(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join(LINE_BREAK)
    }
}

// ============================================================================
// Cue Reconstruction
// ============================================================================

/// Group a track's records into cues, ordered by key.
pub fn reconstruct(style: &SubtitleStyle<'_>, records: &[BlockRecord]) -> Vec<Cue> {
    let mut cues: BTreeMap<CueKey, Cue> = BTreeMap::new();

    for (position, record) in records.iter().enumerate() {
        let key = match style {
            SubtitleStyle::Script(_) => {
                CueKey::from_field(record.text.split(',').next().unwrap_or_default())
            }
            SubtitleStyle::Line => CueKey::Index(position as u64),
        };
        let entry = CueEntry {
            start_ms: record.start_ms(),
            end_ms: record.end_ms(),
            text: record.text.clone(),
        };

        cues.entry(key.clone())
            .or_insert_with(|| Cue {
                key,
                entries: Vec::new(),
            })
            .entries
            .push(entry);
    }

    cues.into_values().collect()
}

// ============================================================================
// Timestamps
// ============================================================================

/// `H:MM:SS.cc`, hours unpadded, rounded to centiseconds.
pub fn format_ass_timestamp(ms: u64) -> String {
    let cs = (ms + 5) / 10;
    let hours = cs / 360_000;
    let minutes = (cs / 6_000) % 60;
    let seconds = (cs / 100) % 60;
    let centis = cs % 100;
    format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)
}

/// `HH:MM:SS,mmm` with the SubRip comma separator.
pub fn format_srt_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

// ============================================================================
// Rendering
// ============================================================================

/// `Dialogue:` line for one script event. The block text carries
/// `ReadOrder,Layer,Style,...`; ReadOrder is dropped and the times are
/// spliced in after Layer.
fn render_dialogue(entry: &CueEntry) -> String {
    let mut fields = entry.text.split(',').skip(1);
    let layer = fields.next().unwrap_or_default();

    let mut line = format!(
        "Dialogue: {},{},{}",
        layer,
        format_ass_timestamp(entry.start_ms),
        format_ass_timestamp(entry.end_ms)
    );
    for field in fields {
        line.push(',');
        line.push_str(field);
    }
    line
}

fn render_srt_block(ordinal: u64, entry: &CueEntry) -> String {
    format!(
        "{}\r\n{} --> {}\r\n{}\r\n",
        ordinal,
        format_srt_timestamp(entry.start_ms),
        format_srt_timestamp(entry.end_ms),
        entry.text
    )
}

fn render_cue(style: &SubtitleStyle<'_>, cue: &Cue) -> String {
    let ordinal = match cue.key {
        CueKey::Index(index) => index + 1,
        CueKey::Label(_) => 0,
    };
    cue.entries
        .iter()
        .map(|entry| match style {
            SubtitleStyle::Script(_) => render_dialogue(entry),
            SubtitleStyle::Line => render_srt_block(ordinal, entry),
        })
        .collect::<Vec<_>>()
        .join(LINE_BREAK)
}

/// A subtitle track rendered to a complete document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTrack {
    pub format: SubtitleFormat,
    pub content: String,
}

impl RenderedTrack {
    /// `Subtitle_<n>.<ext>` for the track at zero-based registration `index`.
    pub fn file_name(&self, index: usize) -> String {
        format!("Subtitle_{}.{}", index + 1, self.format.extension())
    }
}

/// Reconstruct and render one track.
pub fn render_track(codec_header: &str, records: &[BlockRecord]) -> RenderedTrack {
    let style = SubtitleStyle::detect(codec_header);
    let cues = reconstruct(&style, records);

    let body = cues
        .iter()
        .map(|cue| render_cue(&style, cue))
        .collect::<Vec<_>>()
        .join(LINE_BREAK);

    let content = match &style {
        SubtitleStyle::Script(header) => format!(
            "{}{}{}{}{}{}",
            header.preamble, header.format_line, LINE_BREAK, body, header.trailer, LINE_BREAK
        ),
        SubtitleStyle::Line => format!("{}{}", body, LINE_BREAK),
    };

    RenderedTrack {
        format: style.format(),
        content,
    }
}
