// MKV (Matroska/WebM) element stream
// Replays the EBML element tree as ordered start/end/leaf tags via webm_iterable

use std::io::Read;

use webm_iterable::WebmIterator;

pub mod parser;

#[cfg(test)]
pub(crate) mod test_support;

pub use parser::{read_vint, Vint};
pub use webm_iterable::matroska_spec::{Master, MatroskaSpec};

/// Iterate the elements of a Matroska stream in document order.
///
/// Masters arrive as `Master::Start` / `Master::End` pairs and leaves arrive
/// fully buffered. Subtrees that never carry subtitle or attachment data
/// (EBML header, SeekHead, Info, Cues, Chapters, Tags) are buffered into a
/// single `Master::Full` tag, so their children never show up as loose events.
pub fn element_stream<R: Read>(source: R) -> WebmIterator<R> {
    WebmIterator::new(
        source,
        &[
            MatroskaSpec::Ebml(Master::Start),
            MatroskaSpec::SeekHead(Master::Start),
            MatroskaSpec::Info(Master::Start),
            MatroskaSpec::Cues(Master::Start),
            MatroskaSpec::Chapters(Master::Start),
            MatroskaSpec::Tags(Master::Start),
        ],
    )
}
