//! Error types for the NDLCom wire codec.

use thiserror::Error;

/// Errors that can occur while encoding a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// `payload.len()` did not match `header.data_len`.
    #[error("payload length {actual} does not match header data_len {expected}")]
    PayloadLenMismatch {
        /// Length declared in the header.
        expected: usize,
        /// Actual combined length of the payload segments passed in.
        actual: usize,
    },
}

/// Result alias for the wire codec.
pub type Result<T> = std::result::Result<T, EncodeError>;
