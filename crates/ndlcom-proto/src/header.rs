//! The 4-byte NDLCom frame header.

/// Reserved device identifier meaning "error/unused".
pub const RESERVED_ID: u8 = 0x00;

/// Broadcast device identifier.
pub const BROADCAST_ID: u8 = 0xFF;

/// Frame delimiter, start and end of frame.
pub const FLAG: u8 = 0x7E;

/// Escape prefix byte.
pub const ESC: u8 = 0x7D;

/// 4-byte frame header, serialized in field order.
///
/// `data_len` is the *decoded* payload length (0..=255); it is never the
/// stuffed, on-wire length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    /// Destination device id, or [`BROADCAST_ID`].
    pub receiver_id: u8,
    /// Originating device id.
    pub sender_id: u8,
    /// Per-(sender, receiver) packet counter, for loss detection only.
    pub counter: u8,
    /// Length of the payload that follows.
    pub data_len: u8,
}

impl Header {
    /// Size of the serialized header, in bytes.
    pub const SIZE: usize = 4;

    /// Build a new header.
    #[must_use]
    pub const fn new(receiver_id: u8, sender_id: u8, counter: u8, data_len: u8) -> Self {
        Self { receiver_id, sender_id, counter, data_len }
    }

    /// Serialize the header in wire order: receiver, sender, counter, data_len.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; Self::SIZE] {
        [self.receiver_id, self.sender_id, self.counter, self.data_len]
    }

    /// True if `receiver_id` is the broadcast identifier.
    #[must_use]
    pub const fn is_broadcast(self) -> bool {
        self.receiver_id == BROADCAST_ID
    }
}
