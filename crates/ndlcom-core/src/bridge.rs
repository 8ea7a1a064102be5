//! The bridge: owns interfaces and nodes, drives the wire codec, and routes
//! frames between them.
//!
//! `Bridge` is a synchronous, single-threaded Sans-IO engine: `process_once`
//! and `process` read from and write to whatever transports its interfaces
//! wrap, but never block, spawn a thread, or hand control to an async
//! runtime. An embedder is free to drive it from a `tokio` task, a plain
//! loop, or an interrupt handler.

use bitflags::bitflags;
use ndlcom_proto::{Header, worst_case_len};

use crate::{
    error::{BridgeError, Result},
    handler::{BridgeHandler, HandlerFlags, HandlerHandle},
    interface::{ExternalInterface, InterfaceFlags},
    node::{Node, NodeHandle},
    routing::{Destination, InterfaceHandle, RoutingTable},
};

bitflags! {
    /// Bridge-wide behavior flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BridgeFlags: u8 {
        /// When clear, `process_once` still reads and parses every
        /// interface (so CRC failures and routing-table learning keep
        /// happening) but never writes a forwarded frame out.
        const FORWARDING_ENABLED = 1 << 0;
    }
}

impl Default for BridgeFlags {
    fn default() -> Self {
        Self::FORWARDING_ENABLED
    }
}

/// Construction-time bridge configuration.
#[derive(Debug, Clone, Copy)]
pub struct BridgeConfig {
    /// Whether forwarding starts enabled. Defaults to `true`.
    pub forwarding_enabled: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self { forwarding_enabled: true }
    }
}

/// Owns a set of interfaces and nodes and routes frames between them.
pub struct Bridge {
    interfaces: Vec<Option<ExternalInterface>>,
    nodes: Vec<Option<Node>>,
    bridge_handlers: Vec<Option<(HandlerFlags, Box<dyn BridgeHandler>)>>,
    routing_table: RoutingTable,
    flags: BridgeFlags,
}

impl Bridge {
    /// A new, empty bridge.
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        let mut flags = BridgeFlags::empty();
        flags.set(BridgeFlags::FORWARDING_ENABLED, config.forwarding_enabled);
        Self {
            interfaces: Vec::new(),
            nodes: Vec::new(),
            bridge_handlers: Vec::new(),
            routing_table: RoutingTable::new(),
            flags,
        }
    }

    /// Current bridge-wide flags.
    #[must_use]
    pub fn flags(&self) -> BridgeFlags {
        self.flags
    }

    /// Enable or disable forwarding without tearing anything down.
    pub fn set_forwarding_enabled(&mut self, enabled: bool) {
        self.flags.set(BridgeFlags::FORWARDING_ENABLED, enabled);
    }

    /// Read-only view of the routing table.
    #[must_use]
    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing_table
    }

    // -- interfaces ----------------------------------------------------

    /// Register a new interface, returning a handle that stays valid until
    /// it is deregistered.
    pub fn register_interface(&mut self, interface: ExternalInterface) -> InterfaceHandle {
        let handle = InterfaceHandle(self.interfaces.len());
        self.interfaces.push(Some(interface));
        handle
    }

    /// Remove a registered interface, invalidating any routing-table entries
    /// pointing to it.
    pub fn deregister_interface(&mut self, handle: InterfaceHandle) -> Option<ExternalInterface> {
        let removed = self.interfaces.get_mut(handle.0).and_then(Option::take);
        if removed.is_some() {
            self.routing_table.invalidate(handle);
        }
        removed
    }

    /// Borrow a registered interface.
    #[must_use]
    pub fn interface(&self, handle: InterfaceHandle) -> Option<&ExternalInterface> {
        self.interfaces.get(handle.0).and_then(Option::as_ref)
    }

    /// Mutably borrow a registered interface.
    pub fn interface_mut(&mut self, handle: InterfaceHandle) -> Option<&mut ExternalInterface> {
        self.interfaces.get_mut(handle.0).and_then(Option::as_mut)
    }

    // -- nodes -----------------------------------------------------------

    /// Register a node, marking its device id `Internal` in the routing
    /// table.
    pub fn register_node(&mut self, node: Node) -> NodeHandle {
        self.routing_table.mark_internal(node.device_id());
        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(Some(node));
        handle
    }

    /// Remove a registered node, clearing its `Internal` routing-table mark.
    pub fn deregister_node(&mut self, handle: NodeHandle) -> Option<Node> {
        let removed = self.nodes.get_mut(handle.0).and_then(Option::take);
        if let Some(node) = &removed {
            self.routing_table.clear_internal(node.device_id());
        }
        removed
    }

    /// Borrow a registered node.
    #[must_use]
    pub fn node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle.0).and_then(Option::as_ref)
    }

    /// Change a registered node's device id, keeping the routing table's
    /// `Internal` mark in step.
    pub fn set_node_device_id(&mut self, handle: NodeHandle, new_id: u8) -> Result<()> {
        let node = self.nodes.get_mut(handle.0).and_then(Option::as_mut);
        let Some(node) = node else {
            return Err(BridgeError::UnknownNode(handle));
        };
        let old_id = node.device_id();
        node.set_device_id(new_id);
        self.routing_table.clear_internal(old_id);
        self.routing_table.mark_internal(new_id);
        Ok(())
    }

    /// Send a frame on behalf of a registered node: builds the header using
    /// the node's own sender id and next counter, then routes it exactly as
    /// an internally originated frame (`origin: None`).
    ///
    /// Returns `BridgeError::PayloadTooLarge` if `payload` is longer than 255
    /// bytes, the most a single frame's `data_len` field can represent.
    pub fn node_send(&mut self, handle: NodeHandle, receiver_id: u8, payload: &[u8]) -> Result<()> {
        if payload.len() > 255 {
            return Err(BridgeError::PayloadTooLarge { len: payload.len() });
        }

        let Some(mut node) = self.nodes.get_mut(handle.0).and_then(Option::take) else {
            return Err(BridgeError::UnknownNode(handle));
        };

        let payload_len = payload.len() as u8;
        let header = node.next_header(receiver_id, payload_len);
        let device_id = node.device_id();
        self.nodes[handle.0] = Some(node);

        self.dispatch_nodes(&header, payload, None);
        self.dispatch_bridge_handlers(&header, payload, None);

        let result = if self.flags.contains(BridgeFlags::FORWARDING_ENABLED) {
            self.forward(header, payload, None)
        } else {
            Ok(())
        };

        tracing::debug!(device_id, receiver_id, "node_send dispatched");
        result
    }

    // -- bridge handlers ---------------------------------------------------

    /// Register a handler invoked for every frame the bridge processes.
    pub fn register_bridge_handler(
        &mut self,
        flags: HandlerFlags,
        handler: impl BridgeHandler + 'static,
    ) -> HandlerHandle {
        let handle = HandlerHandle(self.bridge_handlers.len());
        self.bridge_handlers.push(Some((flags, Box::new(handler))));
        handle
    }

    /// Remove a previously registered bridge handler.
    pub fn deregister_bridge_handler(
        &mut self,
        handle: HandlerHandle,
    ) -> Option<Box<dyn BridgeHandler>> {
        self.bridge_handlers.get_mut(handle.0).and_then(Option::take).map(|(_, handler)| handler)
    }

    // -- the Sans-IO loop --------------------------------------------------

    /// Route a frame that did not arrive on an external interface (e.g. a
    /// raw injection for testing, or a frame relayed verbatim).
    pub fn send_raw(&mut self, header: Header, payload: &[u8]) -> Result<()> {
        self.dispatch_nodes(&header, payload, None);
        self.dispatch_bridge_handlers(&header, payload, None);
        if self.flags.contains(BridgeFlags::FORWARDING_ENABLED) {
            self.forward(header, payload, None)
        } else {
            Ok(())
        }
    }

    /// Read once from every registered interface, feed the bytes through
    /// its parser, and route every frame that completes. Returns the total
    /// number of raw bytes successfully consumed across all interfaces.
    ///
    /// Each completed frame is, in order: learned into the routing table
    /// (unless the originating interface is a mirror), fanned out to
    /// matching node handlers and registered bridge handlers, forwarded per
    /// the routing table (if forwarding is enabled), then the interface's
    /// parser is reset so the remainder of the read buffer can surface
    /// further frames.
    ///
    /// A transport error escalated to fatal by its interface's
    /// [`crate::interface::ReportErrorPolicy`] aborts the rest of this call;
    /// interfaces processed before the failing one keep whatever they
    /// already did.
    pub fn process_once(&mut self) -> Result<usize> {
        let mut total_consumed = 0;

        for index in 0..self.interfaces.len() {
            let Some(mut iface) = self.interfaces[index].take() else { continue };
            let handle = InterfaceHandle(index);

            let mut buf = [0u8; worst_case_len(255)];
            let read_result = iface.read_into(&mut buf);
            let n = match read_result {
                Ok(n) => n,
                Err(error) => {
                    let fatal = iface.is_fatal(&error);
                    self.interfaces[index] = Some(iface);
                    if fatal {
                        return Err(BridgeError::TransportFatal { handle, source: error });
                    }
                    continue;
                },
            };
            total_consumed += n;

            if !iface.is_paused() {
                let mut offset = 0;
                while offset < n {
                    offset += iface.parser_mut().receive(&buf[offset..n]);
                    if !iface.parser_mut().has_packet() {
                        break;
                    }

                    let header = *iface
                        .parser_mut()
                        .header()
                        .expect("has_packet() guarantees a header is present");
                    let payload = iface
                        .parser_mut()
                        .payload()
                        .expect("has_packet() guarantees a payload is present")
                        .to_vec();

                    if !iface.is_mirror() {
                        self.routing_table.learn(header.sender_id, handle);
                    }

                    self.dispatch_nodes(&header, &payload, Some(handle));
                    self.dispatch_bridge_handlers(&header, &payload, Some(handle));

                    if self.flags.contains(BridgeFlags::FORWARDING_ENABLED) {
                        if let Err(err) = self.forward(header, &payload, Some(handle)) {
                            self.interfaces[index] = Some(iface);
                            return Err(err);
                        }
                    }

                    iface.parser_mut().reset_packet();
                }
            }

            self.interfaces[index] = Some(iface);
        }

        Ok(total_consumed)
    }

    /// Call [`Bridge::process_once`] until it reports no bytes consumed,
    /// draining every interface's currently available input.
    pub fn process(&mut self) -> Result<usize> {
        let mut total = 0;
        loop {
            let n = self.process_once()?;
            total += n;
            if n == 0 {
                break;
            }
        }
        Ok(total)
    }

    // -- internal dispatch --------------------------------------------------

    fn dispatch_nodes(&mut self, header: &Header, payload: &[u8], origin: Option<InterfaceHandle>) {
        for index in 0..self.nodes.len() {
            let Some(mut node) = self.nodes[index].take() else { continue };
            if node.device_id() == header.receiver_id || header.is_broadcast() {
                node.dispatch(header, payload, origin);
            }
            self.nodes[index] = Some(node);
        }
    }

    fn dispatch_bridge_handlers(
        &mut self,
        header: &Header,
        payload: &[u8],
        origin: Option<InterfaceHandle>,
    ) {
        for index in 0..self.bridge_handlers.len() {
            let Some((flags, mut handler)) = self.bridge_handlers[index].take() else { continue };
            if !(origin.is_none() && flags.contains(HandlerFlags::NO_INTERNAL)) {
                handler.on_frame(header, payload, origin);
            }
            self.bridge_handlers[index] = Some((flags, handler));
        }
    }

    /// Route and, if enabled, egress a processed frame.
    ///
    /// The interface the frame arrived on (if any) has already been removed
    /// from `self.interfaces` by the caller (`process_once`'s take/restore
    /// pattern, or `send_raw`'s `origin: None`), so loop suppression falls
    /// out for free: iterating `self.interfaces` here can never reach the
    /// origin, because its slot is empty for the duration of this call.
    fn forward(&mut self, header: Header, payload: &[u8], origin: Option<InterfaceHandle>) -> Result<()> {
        let mut encoded = Vec::new();
        ndlcom_proto::encode(header, payload, &mut encoded)?;

        // Mirror interfaces see a copy of every frame the bridge processes,
        // regardless of where routing sends it (or whether routing sends it
        // anywhere at all).
        for index in 0..self.interfaces.len() {
            let is_mirror = self.interfaces[index].as_ref().is_some_and(ExternalInterface::is_mirror);
            if is_mirror {
                self.write_or_fail(index, &encoded)?;
            }
        }

        match self.routing_table.lookup(header.receiver_id) {
            Destination::Internal => {},
            Destination::Unknown => {
                for index in 0..self.interfaces.len() {
                    let is_mirror =
                        self.interfaces[index].as_ref().is_some_and(ExternalInterface::is_mirror);
                    if self.interfaces[index].is_some() && !is_mirror {
                        self.write_or_fail(index, &encoded)?;
                    }
                }
            },
            Destination::Interface(target) => {
                if Some(target) == origin {
                    tracing::debug!(
                        receiver_id = header.receiver_id,
                        "dropping forward back to origin interface"
                    );
                    return Ok(());
                }
                let is_mirror =
                    self.interfaces.get(target.0).and_then(Option::as_ref).is_some_and(ExternalInterface::is_mirror);
                if self.interfaces.get(target.0).and_then(Option::as_ref).is_some() && !is_mirror {
                    self.write_or_fail(target.0, &encoded)?;
                }
            },
        }

        Ok(())
    }

    fn write_or_fail(&mut self, index: usize, encoded: &[u8]) -> Result<()> {
        let Some(iface) = self.interfaces[index].as_mut() else { return Ok(()) };
        if let Err(error) = iface.write_bytes(encoded) {
            let fatal = iface.is_fatal(&error);
            if fatal {
                return Err(BridgeError::TransportFatal { handle: InterfaceHandle(index), source: error });
            }
        }
        Ok(())
    }
}
