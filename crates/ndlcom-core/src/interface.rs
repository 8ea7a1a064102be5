//! External transport bindings: the boxed-closure read/write seam a bridge
//! drives, plus the per-interface policy and accounting around it.

use bitflags::bitflags;
use ndlcom_proto::Parser;

pub use crate::routing::InterfaceHandle;
use crate::error::TransportError;

bitflags! {
    /// Per-interface behavior flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InterfaceFlags: u8 {
        /// The interface receives a copy of every frame the bridge
        /// processes, regardless of routing outcome, in addition to
        /// whatever routing would otherwise deliver to it.
        const MIRROR = 1 << 0;
    }
}

/// How a [`Bridge`](crate::bridge::Bridge) should react when a transport
/// callback reports an error.
///
/// Named and registered per interface (the default is to treat every
/// transport error as fatal and surface it to the caller driving
/// `process`/`process_once`); an embedder that would rather keep routing
/// other interfaces can install [`DropAndLog`] instead.
pub trait ReportErrorPolicy: std::fmt::Debug {
    /// Decide whether a transport error on this interface should abort the
    /// bridge's current `process_once` call.
    fn is_fatal(&self, error: &TransportError) -> bool;
}

/// Default policy: every transport error is fatal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Raise;

impl ReportErrorPolicy for Raise {
    fn is_fatal(&self, _error: &TransportError) -> bool {
        true
    }
}

/// Alternate policy: log the error and keep going, treating the interface as
/// though it produced zero bytes (for a read) or silently dropped the write
/// for this call.
#[derive(Debug, Clone, Copy, Default)]
pub struct DropAndLog;

impl ReportErrorPolicy for DropAndLog {
    fn is_fatal(&self, error: &TransportError) -> bool {
        tracing::warn!(%error, "transport error demoted to drop+log");
        false
    }
}

type ReadFn = dyn FnMut(&mut [u8]) -> std::result::Result<usize, TransportError> + Send;
type WriteFn = dyn FnMut(&[u8]) -> std::result::Result<(), TransportError> + Send;

/// One registered transport: read/write callbacks, its parser, flags, and
/// byte accounting.
///
/// Callbacks are boxed closures rather than a context pointer paired with a
/// function pointer, since a closure already carries whatever state a
/// transport needs to capture.
pub struct ExternalInterface {
    read: Box<ReadFn>,
    write: Box<WriteFn>,
    parser: Parser,
    flags: InterfaceFlags,
    error_policy: Box<dyn ReportErrorPolicy + Send>,
    paused: bool,
    bytes_tx: u64,
    bytes_rx: u64,
}

impl std::fmt::Debug for ExternalInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalInterface")
            .field("flags", &self.flags)
            .field("paused", &self.paused)
            .field("bytes_tx", &self.bytes_tx)
            .field("bytes_rx", &self.bytes_rx)
            .finish_non_exhaustive()
    }
}

impl ExternalInterface {
    /// Build a new interface from a pair of transport callbacks, using the
    /// default (`Raise`) error policy.
    #[must_use]
    pub fn new(
        read: impl FnMut(&mut [u8]) -> std::result::Result<usize, TransportError> + Send + 'static,
        write: impl FnMut(&[u8]) -> std::result::Result<(), TransportError> + Send + 'static,
        flags: InterfaceFlags,
    ) -> Self {
        Self {
            read: Box::new(read),
            write: Box::new(write),
            parser: Parser::new(),
            flags,
            error_policy: Box::new(Raise),
            paused: false,
            bytes_tx: 0,
            bytes_rx: 0,
        }
    }

    /// Install a non-default [`ReportErrorPolicy`].
    pub fn set_error_policy(&mut self, policy: impl ReportErrorPolicy + Send + 'static) {
        self.error_policy = Box::new(policy);
    }

    /// This interface's behavior flags.
    #[must_use]
    pub fn flags(&self) -> InterfaceFlags {
        self.flags
    }

    /// True if the interface is marked [`InterfaceFlags::MIRROR`].
    #[must_use]
    pub fn is_mirror(&self) -> bool {
        self.flags.contains(InterfaceFlags::MIRROR)
    }

    /// True if reads are currently discarded rather than parsed.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause or resume parsing of bytes read from this interface.
    ///
    /// While paused, `process_once` still calls the read callback (so a
    /// transport's internal buffers keep draining) but discards whatever it
    /// returns instead of feeding it to the parser.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Total bytes ever successfully read from this interface, saturating.
    #[must_use]
    pub fn bytes_rx(&self) -> u64 {
        self.bytes_rx
    }

    /// Total bytes ever successfully written to this interface, saturating.
    #[must_use]
    pub fn bytes_tx(&self) -> u64 {
        self.bytes_tx
    }

    pub(crate) fn parser_mut(&mut self) -> &mut Parser {
        &mut self.parser
    }

    /// Whether a just-reported transport error should abort processing.
    pub(crate) fn is_fatal(&self, error: &TransportError) -> bool {
        self.error_policy.is_fatal(error)
    }

    pub(crate) fn read_into(
        &mut self,
        buf: &mut [u8],
    ) -> std::result::Result<usize, TransportError> {
        let n = (self.read)(buf)?;
        self.bytes_rx = self.bytes_rx.saturating_add(n as u64);
        Ok(n)
    }

    pub(crate) fn write_bytes(
        &mut self,
        bytes: &[u8],
    ) -> std::result::Result<(), TransportError> {
        (self.write)(bytes)?;
        self.bytes_tx = self.bytes_tx.saturating_add(bytes.len() as u64);
        Ok(())
    }
}
