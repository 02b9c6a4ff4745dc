//! Track content encodings (compression) applied to frames and codec data.

use std::io::Read;

use bytes::Bytes;
use flate2::read::ZlibDecoder;

const SCOPE_FRAMES: u64 = 0x1;
const SCOPE_CODEC_PRIVATE: u64 = 0x2;

const TYPE_COMPRESSION: u64 = 0;
const TYPE_ENCRYPTION: u64 = 1;

const ALGO_ZLIB: u64 = 0;
const ALGO_BZLIB: u64 = 1;
const ALGO_LZO1X: u64 = 2;
const ALGO_HEADER_STRIPPING: u64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compression {
    Zlib,
    /// Bytes removed from the front of every frame by the muxer
    HeaderStripping(Bytes),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEncoding {
    pub compression: Compression,
    pub scope: u64,
}

impl ContentEncoding {
    pub fn applies_to_frames(&self) -> bool {
        self.scope & SCOPE_FRAMES != 0
    }

    pub fn applies_to_codec_private(&self) -> bool {
        self.scope & SCOPE_CODEC_PRIVATE != 0
    }

    pub fn decode(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        match &self.compression {
            Compression::Zlib => {
                let mut out = Vec::with_capacity(data.len() * 2);
                ZlibDecoder::new(data).read_to_end(&mut out)?;
                Ok(out)
            }
            Compression::HeaderStripping(prefix) => {
                let mut out = Vec::with_capacity(prefix.len() + data.len());
                out.extend_from_slice(prefix);
                out.extend_from_slice(data);
                Ok(out)
            }
        }
    }
}

/// ContentEncoding fields as they stream in, before validation.
#[derive(Debug, Clone)]
pub struct PendingEncoding {
    pub scope: u64,
    pub encoding_type: u64,
    pub algo: u64,
    pub settings: Bytes,
}

impl Default for PendingEncoding {
    fn default() -> Self {
        Self {
            scope: SCOPE_FRAMES,
            encoding_type: TYPE_COMPRESSION,
            algo: ALGO_ZLIB,
            settings: Bytes::new(),
        }
    }
}

impl PendingEncoding {
    /// Turn the buffered fields into a usable encoding, or the reason the
    /// track cannot be extracted.
    pub fn resolve(self) -> Result<ContentEncoding, &'static str> {
        if self.encoding_type == TYPE_ENCRYPTION {
            return Err("encrypted content");
        }
        if self.encoding_type != TYPE_COMPRESSION {
            return Err("unknown content encoding type");
        }

        let compression = match self.algo {
            ALGO_ZLIB => Compression::Zlib,
            ALGO_HEADER_STRIPPING => Compression::HeaderStripping(self.settings),
            ALGO_BZLIB => return Err("bzlib compression"),
            ALGO_LZO1X => return Err("lzo1x compression"),
            _ => return Err("unknown compression algorithm"),
        };

        Ok(ContentEncoding {
            compression,
            scope: self.scope,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression as Level;
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Level::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn inflates_zlib_frames() {
        let encoding = PendingEncoding::default().resolve().unwrap();
        assert!(encoding.applies_to_frames());
        assert!(!encoding.applies_to_codec_private());
        assert_eq!(encoding.decode(&zlib(b"Hello there")).unwrap(), b"Hello there");
    }

    #[test]
    fn restores_stripped_header() {
        let encoding = PendingEncoding {
            algo: ALGO_HEADER_STRIPPING,
            settings: Bytes::from_static(b"12,0,"),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(encoding.decode(b"Default,,Hi").unwrap(), b"12,0,Default,,Hi");
    }

    #[test]
    fn rejects_encryption_and_unsupported_algorithms() {
        let encrypted = PendingEncoding {
            encoding_type: TYPE_ENCRYPTION,
            ..Default::default()
        };
        assert_eq!(encrypted.resolve(), Err("encrypted content"));

        let lzo = PendingEncoding {
            algo: ALGO_LZO1X,
            ..Default::default()
        };
        assert!(lzo.resolve().is_err());
    }

    #[test]
    fn corrupt_zlib_is_an_error() {
        let encoding = PendingEncoding::default().resolve().unwrap();
        assert!(encoding.decode(b"not zlib at all").is_err());
    }
}
