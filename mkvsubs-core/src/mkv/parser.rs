//! EBML vint reading for the sub-fields packed inside block payloads.

use bytes::Buf;

use crate::error::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vint {
    /// Encoded length in bytes, marker included
    pub length: usize,
    pub value: u64,
}

/// Read one variable-length unsigned integer with the length marker stripped.
pub fn read_vint<B: Buf>(buf: &mut B) -> Result<Vint, DecodeError> {
    if !buf.has_remaining() {
        return Err(DecodeError::MissingVint);
    }

    let first = buf.get_u8();
    let length = match first.leading_zeros() as usize {
        n if n < 8 => n + 1,
        _ => return Err(DecodeError::InvalidVint(first)),
    };

    let mut value = (first as u64) & (0xFFu64 >> length);
    for _ in 1..length {
        if !buf.has_remaining() {
            return Err(DecodeError::TruncatedVint);
        }
        value = (value << 8) | buf.get_u8() as u64;
    }

    Ok(Vint { length, value })
}
