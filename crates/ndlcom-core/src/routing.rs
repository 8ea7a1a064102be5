//! Per-bridge routing table: maps device ids to where a frame addressed to
//! them should go.

use ndlcom_proto::BROADCAST_ID;

/// Non-owning handle to an interface registered on a [`crate::bridge::Bridge`].
///
/// A plain `usize` index into the bridge's interface slots rather than a
/// generational/slotmap key: once assigned, a handle's slot never changes
/// and is never reused for a different interface, so equality alone is
/// enough to detect a stale handle being passed back after deregistration
/// (the slot reads back `None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceHandle(pub(crate) usize);

/// Where a frame addressed to a given device id should be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// No interface has ever been observed sending on behalf of this id, and
    /// it is not marked internal. Frames addressed here are treated as
    /// broadcast: fan out to every interface (loop suppression still
    /// applies).
    Unknown,
    /// This id belongs to a node owned by the local bridge. Frames addressed
    /// here are delivered only to bridge/node handlers, never re-egressed.
    Internal,
    /// This id was last seen arriving on the given interface; frames
    /// addressed here are written only to it (plus mirror interfaces).
    Interface(InterfaceHandle),
}

/// Maps each of the 256 possible device ids to a [`Destination`].
///
/// Entries start `Unknown` and are updated by [`RoutingTable::learn`] (as
/// frames arrive) and [`RoutingTable::mark_internal`] /
/// [`RoutingTable::clear_internal`] (as nodes are registered/deregistered).
/// [`ndlcom_proto::BROADCAST_ID`] never has an entry: [`RoutingTable::lookup`]
/// always answers `Unknown` for it regardless of what learning has occurred,
/// since nothing should ever claim ownership of the broadcast id.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    table: [Destination; 256],
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutingTable {
    /// A fresh table with every entry `Unknown`.
    #[must_use]
    pub fn new() -> Self {
        Self { table: [Destination::Unknown; 256] }
    }

    /// Where a frame addressed to `receiver_id` should go.
    #[must_use]
    pub fn lookup(&self, receiver_id: u8) -> Destination {
        if receiver_id == BROADCAST_ID {
            return Destination::Unknown;
        }
        self.table[receiver_id as usize]
    }

    /// Record that `sender_id` was last seen arriving on `origin`.
    ///
    /// A no-op for the broadcast id and for any id currently marked
    /// `Internal` — a locally owned device id is never overwritten by
    /// observed traffic, even traffic that happens to claim the same id
    /// (which would otherwise indicate a misconfigured peer).
    pub fn learn(&mut self, sender_id: u8, origin: InterfaceHandle) {
        if sender_id == BROADCAST_ID {
            return;
        }
        if self.table[sender_id as usize] == Destination::Internal {
            return;
        }
        if self.table[sender_id as usize] != Destination::Interface(origin) {
            tracing::debug!(sender_id, ?origin, "routing table: learned new route");
        }
        self.table[sender_id as usize] = Destination::Interface(origin);
    }

    /// Mark `device_id` as owned by a locally registered node.
    pub fn mark_internal(&mut self, device_id: u8) {
        tracing::debug!(device_id, "routing table: marked internal");
        self.table[device_id as usize] = Destination::Internal;
    }

    /// Clear a previous [`RoutingTable::mark_internal`], returning the entry
    /// to `Unknown`.
    pub fn clear_internal(&mut self, device_id: u8) {
        tracing::debug!(device_id, "routing table: cleared internal mark");
        self.table[device_id as usize] = Destination::Unknown;
    }

    /// Reset every entry pointing at `handle` back to `Unknown`.
    ///
    /// Called when an interface is deregistered, so a later handle reusing
    /// a different slot index never inherits stale routes.
    pub fn invalidate(&mut self, handle: InterfaceHandle) {
        for entry in &mut self.table {
            if *entry == Destination::Interface(handle) {
                *entry = Destination::Unknown;
            }
        }
    }
}
