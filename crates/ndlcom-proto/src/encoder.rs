//! Byte-stuffing HDLC-style frame encoder.

use crate::{
    crc::Crc,
    error::{EncodeError, Result},
    header::{ESC, FLAG, Header},
};

/// Stuffed encoding of the given frame, written to `out`.
///
/// `encode` and [`encode_scatter`] are the only two ways to produce an
/// on-wire frame; both write `FLAG`, byte-stuffed `[header, payload, crc]`,
/// `FLAG` and compute the CRC over the *un-stuffed* header and payload bytes.
pub fn encode(header: Header, payload: &[u8], out: &mut Vec<u8>) -> Result<usize> {
    encode_scatter(header, &[payload], out)
}

/// Scatter variant of [`encode`]: `segments` are concatenated logically
/// (never physically) before byte-stuffing and CRC computation, so a caller
/// holding payload bytes in several disjoint buffers need not copy them into
/// one contiguous slice first.
///
/// # Errors
///
/// Returns [`EncodeError::PayloadLenMismatch`] if the combined length of
/// `segments` does not equal `header.data_len`.
pub fn encode_scatter(header: Header, segments: &[&[u8]], out: &mut Vec<u8>) -> Result<usize> {
    let total_len: usize = segments.iter().map(|s| s.len()).sum();
    if total_len != header.data_len as usize {
        return Err(EncodeError::PayloadLenMismatch {
            expected: header.data_len as usize,
            actual: total_len,
        });
    }

    let start_len = out.len();
    out.reserve(worst_case_len(header.data_len));

    let mut crc = Crc::new();
    out.push(FLAG);

    for &byte in &header.to_bytes() {
        crc = crc.update(byte);
        push_stuffed(out, byte);
    }
    for segment in segments {
        for &byte in *segment {
            crc = crc.update(byte);
            push_stuffed(out, byte);
        }
    }
    push_stuffed(out, crc.value());

    out.push(FLAG);

    Ok(out.len() - start_len)
}

/// Worst-case encoded size for a frame carrying `data_len` payload bytes:
/// open and close flags, plus every header/payload/CRC byte potentially
/// doubled by stuffing.
#[must_use]
pub const fn worst_case_len(data_len: u8) -> usize {
    2 + 2 * (Header::SIZE + data_len as usize + 1)
}

fn push_stuffed(out: &mut Vec<u8>, byte: u8) {
    if byte == FLAG {
        out.push(ESC);
        out.push(FLAG ^ 0x20);
    } else if byte == ESC {
        out.push(ESC);
        out.push(ESC ^ 0x20);
    } else {
        out.push(byte);
    }
}
