//! Error types for the bridge/routing engine and node abstraction.

use thiserror::Error;

use crate::{node::NodeHandle, routing::InterfaceHandle};

/// An error reported by a transport's read or write callback.
///
/// Transports are plain closures returning `usize`/`()` on success; on
/// failure they return this instead, and the owning interface's
/// [`crate::interface::ReportErrorPolicy`] decides whether it escalates to
/// [`BridgeError::TransportFatal`] or is logged and ignored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    /// Human-readable description of the failure.
    pub message: String,
}

impl TransportError {
    /// Build a new transport error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Errors returned by [`crate::bridge::Bridge`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The referenced node handle is not currently registered.
    #[error("unknown node handle {0:?}")]
    UnknownNode(NodeHandle),

    /// A node was asked to send a payload longer than a frame's `data_len`
    /// field (a single byte) can represent.
    #[error("payload of {len} bytes exceeds the 255-byte maximum for a single frame")]
    PayloadTooLarge {
        /// The payload length that was rejected.
        len: usize,
    },

    /// A transport callback failed and the interface's
    /// [`crate::interface::ReportErrorPolicy`] escalated it to fatal.
    #[error("fatal transport error on interface {handle:?}: {source}")]
    TransportFatal {
        /// The interface whose transport failed.
        handle: InterfaceHandle,
        /// The underlying transport error.
        #[source]
        source: TransportError,
    },

    /// A frame handed to the forwarding stage (via `send_raw` or a decoded
    /// frame) could not be re-encoded, most commonly because its payload
    /// length does not match `header.data_len`.
    #[error("could not encode frame for forwarding: {0}")]
    Encode(#[from] ndlcom_proto::EncodeError),
}

/// Result alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
