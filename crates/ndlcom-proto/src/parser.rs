//! Resumable byte-stream destuffer and frame parser.
//!
//! [`Parser`] is fed raw transport bytes — one at a time or in arbitrarily
//! sized chunks — and surfaces one decoded `(Header, payload)` frame at a
//! time. It never allocates beyond its payload buffer's capacity growth and
//! never blocks.

use crate::{
    crc::Crc,
    header::{ESC, FLAG, Header},
};

/// States the parser can be in.
///
/// The original C implementation this protocol is modeled on names two
/// substates here (`WaitFirstCrc`/`WaitSecondCrc`) left over from an earlier
/// 16-bit FCS design; since the CRC here is always a single byte, they
/// collapse to one `WaitCrc` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    /// Buffering the 4 header bytes.
    WaitHeader,
    /// Buffering `data_len` payload bytes.
    WaitData,
    /// Waiting for the single CRC byte.
    WaitCrc,
    /// A complete, verified frame is available.
    Complete,
}

/// Resumable frame parser: destuffs, bounds-checks, and checksums a byte
/// stream, surfacing one frame at a time.
#[derive(Debug, Clone)]
pub struct Parser {
    state: ParserState,
    header_raw: [u8; Header::SIZE],
    header_len: u8,
    data_len: u8,
    payload: Vec<u8>,
    crc: Crc,
    last_was_esc: bool,
    crc_fail_count: u32,
    header: Option<Header>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// New parser, starting in the header-waiting state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ParserState::WaitHeader,
            header_raw: [0; Header::SIZE],
            header_len: 0,
            data_len: 0,
            payload: Vec::with_capacity(255),
            crc: Crc::new(),
            last_was_esc: false,
            crc_fail_count: 0,
            header: None,
        }
    }

    /// Feed bytes into the parser. Consumes up to as many bytes as needed to
    /// either complete the current frame or exhaust `bytes`.
    ///
    /// Byte-at-a-time calls are fully supported: feeding a whole encoded
    /// frame in one call or one byte at a time produces the same result.
    pub fn receive(&mut self, bytes: &[u8]) -> usize {
        if self.state == ParserState::Complete {
            return 0;
        }

        for (consumed, &byte) in bytes.iter().enumerate() {
            if self.last_was_esc {
                self.last_was_esc = false;
                if byte == FLAG {
                    // Aborted frame, per RFC1662: ESC followed by FLAG.
                    self.reset_packet();
                    continue;
                }
                self.feed_decoded(byte ^ 0x20);
            } else if byte == ESC {
                self.last_was_esc = true;
                continue;
            } else if byte == FLAG {
                // Bare FLAG: either a clean frame boundary or an abort of an
                // in-progress frame. Either way, start fresh.
                self.reset_packet();
                continue;
            } else {
                self.feed_decoded(byte);
            }

            if self.state == ParserState::Complete {
                return consumed + 1;
            }
        }

        bytes.len()
    }

    fn feed_decoded(&mut self, byte: u8) {
        match self.state {
            ParserState::WaitHeader => {
                self.header_raw[self.header_len as usize] = byte;
                self.header_len += 1;
                self.crc = self.crc.update(byte);

                if self.header_len as usize == Header::SIZE {
                    let header = Header::new(
                        self.header_raw[0],
                        self.header_raw[1],
                        self.header_raw[2],
                        self.header_raw[3],
                    );
                    self.data_len = header.data_len;
                    self.header = Some(header);
                    self.payload.clear();
                    self.state =
                        if self.data_len == 0 { ParserState::WaitCrc } else { ParserState::WaitData };
                }
            },
            ParserState::WaitData => {
                self.payload.push(byte);
                self.crc = self.crc.update(byte);

                if self.payload.len() == self.data_len as usize {
                    self.state = ParserState::WaitCrc;
                }
            },
            ParserState::WaitCrc => {
                if byte == self.crc.value() {
                    self.state = ParserState::Complete;
                } else {
                    tracing::trace!(
                        expected = self.crc.value(),
                        got = byte,
                        "parser: crc mismatch, discarding frame"
                    );
                    self.crc_fail_count = self.crc_fail_count.saturating_add(1);
                    self.reset_packet();
                }
            },
            ParserState::Complete => {
                // receive() never calls feed_decoded() while Complete.
            },
        }
    }

    /// True if a complete, checksummed frame is available.
    #[must_use]
    pub fn has_packet(&self) -> bool {
        self.state == ParserState::Complete
    }

    /// The decoded header of the available frame, if any.
    #[must_use]
    pub fn header(&self) -> Option<&Header> {
        if self.has_packet() { self.header.as_ref() } else { None }
    }

    /// The decoded payload of the available frame, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        if self.has_packet() { Some(&self.payload) } else { None }
    }

    /// Discard the completed frame (if any) and return to `WaitHeader`.
    ///
    /// Clears the running CRC and the escape-pending flag; does not affect
    /// [`Parser::crc_fail_count`].
    pub fn reset_packet(&mut self) {
        self.state = ParserState::WaitHeader;
        self.header_len = 0;
        self.crc = Crc::new();
        self.last_was_esc = false;
    }

    /// Number of CRC failures observed since the last
    /// [`Parser::reset_crc_fail_count`], saturating.
    #[must_use]
    pub fn crc_fail_count(&self) -> u32 {
        self.crc_fail_count
    }

    /// Reset the CRC failure counter to zero.
    pub fn reset_crc_fail_count(&mut self) {
        self.crc_fail_count = 0;
    }
}
