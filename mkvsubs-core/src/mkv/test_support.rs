//! Synthetic Matroska streams for tests, serialized with `WebmWriter`.

use webm_iterable::WebmWriter;

use super::{Master, MatroskaSpec};

const SEGMENT_ID: [u8; 4] = [0x18, 0x53, 0x80, 0x67];
const CLUSTER_ID: [u8; 4] = [0x1F, 0x43, 0xB6, 0x75];

/// Serialize tags back to back.
pub fn encode(tags: &[MatroskaSpec]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut writer = WebmWriter::new(&mut out);
    for tag in tags {
        writer.write(tag).expect("serialize tag");
    }
    drop(writer);
    out
}

/// A complete file: EBML header followed by `tags`.
pub fn file(tags: &[MatroskaSpec]) -> Vec<u8> {
    let mut out = encode(&[ebml_header()]);
    out.extend(encode(tags));
    out
}

/// A Segment with an all-ones (unknown) size, as live muxers write it.
pub fn unknown_sized_segment(children: &[Vec<u8>]) -> Vec<u8> {
    let mut out = SEGMENT_ID.to_vec();
    out.extend([0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    out.extend(children.concat());
    out
}

/// A Cluster with a one-byte unknown size.
pub fn unknown_sized_cluster(timestamp: u64, blocks: &[MatroskaSpec]) -> Vec<u8> {
    let mut out = CLUSTER_ID.to_vec();
    out.push(0xFF);
    out.extend(encode(&[MatroskaSpec::Timestamp(timestamp)]));
    out.extend(encode(blocks));
    out
}

// ============================================================================
// Matroska building blocks
// ============================================================================

pub fn ebml_header() -> MatroskaSpec {
    MatroskaSpec::Ebml(Master::Full(vec![MatroskaSpec::DocType("matroska".to_string())]))
}

pub fn segment(children: Vec<MatroskaSpec>) -> MatroskaSpec {
    MatroskaSpec::Segment(Master::Full(children))
}

pub fn tracks(entries: Vec<MatroskaSpec>) -> MatroskaSpec {
    MatroskaSpec::Tracks(Master::Full(entries))
}

pub fn track_entry(number: u64, track_type: u64, codec_private: Option<&str>) -> MatroskaSpec {
    let mut children = vec![MatroskaSpec::TrackNumber(number), MatroskaSpec::TrackType(track_type)];
    if let Some(private) = codec_private {
        children.push(MatroskaSpec::CodecPrivate(private.as_bytes().to_vec()));
    }
    MatroskaSpec::TrackEntry(Master::Full(children))
}

pub fn subtitle_track(number: u64, codec_private: Option<&str>) -> MatroskaSpec {
    track_entry(number, 0x11, codec_private)
}

/// Block payload: track vint, signed 16-bit offset, flags byte, frame data.
pub fn block_payload(track: u64, offset: i16, frame: &[u8]) -> Vec<u8> {
    let length = (1..=8)
        .find(|&n| track < (1u64 << (7 * n)) - 1)
        .expect("track number fits in a vint");
    let marked = track | (1u64 << (7 * length));
    let mut out = marked.to_be_bytes()[8 - length..].to_vec();
    out.extend(offset.to_be_bytes());
    out.push(0x00);
    out.extend_from_slice(frame);
    out
}

pub fn simple_block(track: u64, offset: i16, frame: &str) -> MatroskaSpec {
    MatroskaSpec::SimpleBlock(block_payload(track, offset, frame.as_bytes()))
}

pub fn block_group(track: u64, offset: i16, frame: &str, duration: Option<u64>) -> MatroskaSpec {
    let mut children = vec![MatroskaSpec::Block(block_payload(track, offset, frame.as_bytes()))];
    if let Some(duration) = duration {
        children.push(MatroskaSpec::BlockDuration(duration));
    }
    MatroskaSpec::BlockGroup(Master::Full(children))
}

pub fn cluster(timestamp: u64, blocks: Vec<MatroskaSpec>) -> MatroskaSpec {
    let mut children = vec![MatroskaSpec::Timestamp(timestamp)];
    children.extend(blocks);
    MatroskaSpec::Cluster(Master::Full(children))
}

pub fn attachments(files: Vec<MatroskaSpec>) -> MatroskaSpec {
    MatroskaSpec::Attachments(Master::Full(files))
}

pub fn attached_file(name: &str, data: &[u8]) -> MatroskaSpec {
    MatroskaSpec::AttachedFile(Master::Full(vec![
        MatroskaSpec::FileName(name.to_string()),
        MatroskaSpec::FileData(data.to_vec()),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_payload_starts_with_track_vint() {
        assert_eq!(block_payload(1, 0, b"x"), vec![0x81, 0x00, 0x00, 0x00, b'x']);
        assert_eq!(&block_payload(300, -1, b"")[..4], &[0x41, 0x2C, 0xFF, 0xFF]);
    }

    #[test]
    fn file_starts_with_ebml_magic() {
        let bytes = file(&[segment(vec![])]);
        assert_eq!(&bytes[..4], &[0x1A, 0x45, 0xDF, 0xA3]);
    }
}
