//! Observer callbacks invoked by a bridge as frames are processed.

use bitflags::bitflags;

use crate::routing::InterfaceHandle;

bitflags! {
    /// Flags controlling when a registered [`BridgeHandler`] is invoked.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HandlerFlags: u8 {
        /// Skip this handler for frames whose origin is `None` (i.e. frames
        /// that originated locally via `Bridge::send_raw`/`Node::send`
        /// rather than arriving on an external interface).
        const NO_INTERNAL = 1 << 0;
    }
}

/// Non-owning handle to a registered [`BridgeHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerHandle(pub(crate) usize);

/// Observes every frame a bridge processes, before forwarding.
///
/// Implemented for any `FnMut(&Header, &[u8], Option<InterfaceHandle>)`
/// closure, so most registrations need no named type at all; a handler that
/// needs to reply should capture a shared handle to the owning bridge itself
/// (e.g. an `Rc<RefCell<Bridge>>`) the way any other callback-with-replies
/// pattern does — the bridge does not pass itself into the callback.
pub trait BridgeHandler: Send {
    /// Called once per frame the bridge processes, with `origin` set to the
    /// interface it arrived on, or `None` if it originated locally.
    fn on_frame(
        &mut self,
        header: &ndlcom_proto::Header,
        payload: &[u8],
        origin: Option<InterfaceHandle>,
    );
}

impl<F> BridgeHandler for F
where
    F: FnMut(&ndlcom_proto::Header, &[u8], Option<InterfaceHandle>) + Send,
{
    fn on_frame(
        &mut self,
        header: &ndlcom_proto::Header,
        payload: &[u8],
        origin: Option<InterfaceHandle>,
    ) {
        self(header, payload, origin);
    }
}

/// Observes frames addressed to one node's device id (or broadcast).
///
/// Same shape as [`BridgeHandler`]; kept as a distinct trait because a node's
/// handlers are filtered by device id before being invoked, while a bridge's
/// handlers see every frame.
pub trait NodeHandler: Send {
    /// Called once per frame addressed to the owning node.
    fn on_frame(
        &mut self,
        header: &ndlcom_proto::Header,
        payload: &[u8],
        origin: Option<InterfaceHandle>,
    );
}

impl<F> NodeHandler for F
where
    F: FnMut(&ndlcom_proto::Header, &[u8], Option<InterfaceHandle>) + Send,
{
    fn on_frame(
        &mut self,
        header: &ndlcom_proto::Header,
        payload: &[u8],
        origin: Option<InterfaceHandle>,
    ) {
        self(header, payload, origin);
    }
}
