//! A locally owned device identity and its frame handlers.

use ndlcom_proto::Header;

use crate::{handler::NodeHandler, header_config::HeaderConfig, routing::InterfaceHandle};

/// Non-owning handle to a node registered on a [`crate::bridge::Bridge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub(crate) usize);

/// Non-owning handle to a handler registered on one [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandlerHandle(usize);

/// A local device identity: one `device_id`, its outgoing packet counters,
/// and the handlers invoked for frames addressed to it (or broadcast).
///
/// A node is always registered on exactly one bridge, which marks its
/// `device_id` `Internal` in the routing table for as long as the node stays
/// registered. Sending and registration both go through the owning
/// [`crate::bridge::Bridge`] rather than through a reference held by `Node`
/// itself, so a node never needs to borrow back into its owner.
#[derive(Debug)]
pub struct Node {
    device_id: u8,
    header_config: HeaderConfig,
    handlers: Vec<Option<Box<dyn NodeHandler>>>,
}

impl Node {
    /// A new node for `device_id`, with no handlers registered.
    #[must_use]
    pub fn new(device_id: u8) -> Self {
        Self { device_id, header_config: HeaderConfig::new(device_id), handlers: Vec::new() }
    }

    /// This node's device id.
    #[must_use]
    pub fn device_id(&self) -> u8 {
        self.device_id
    }

    /// Register a handler, invoked for every frame addressed to this node's
    /// `device_id` or to broadcast.
    pub fn register_handler(&mut self, handler: impl NodeHandler + 'static) -> NodeHandlerHandle {
        let index = self.handlers.len();
        self.handlers.push(Some(Box::new(handler)));
        NodeHandlerHandle(index)
    }

    /// Remove a previously registered handler.
    pub fn deregister_handler(&mut self, handle: NodeHandlerHandle) -> Option<Box<dyn NodeHandler>> {
        self.handlers.get_mut(handle.0).and_then(Option::take)
    }

    /// Build the header for the next frame this node sends to `receiver_id`,
    /// advancing that receiver's counter.
    pub(crate) fn next_header(&mut self, receiver_id: u8, payload_len: u8) -> Header {
        let counter = self.header_config.next_counter(receiver_id);
        Header::new(receiver_id, self.device_id, counter, payload_len)
    }

    /// Change this node's device id, zeroing its outgoing counters.
    ///
    /// Does not touch the owning bridge's routing table; callers go through
    /// `Bridge::set_node_device_id`, which updates both together.
    pub(crate) fn set_device_id(&mut self, new_id: u8) {
        self.header_config.set_own_sender_id(new_id);
        self.device_id = new_id;
    }

    /// Invoke every registered handler with the given frame.
    pub(crate) fn dispatch(
        &mut self,
        header: &Header,
        payload: &[u8],
        origin: Option<InterfaceHandle>,
    ) {
        for slot in &mut self.handlers {
            if let Some(handler) = slot.as_mut() {
                handler.on_frame(header, payload, origin);
            }
        }
    }
}
