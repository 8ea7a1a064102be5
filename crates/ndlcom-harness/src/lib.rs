//! In-memory test transports for exercising [`ndlcom_core::Bridge`] without
//! real I/O.
//!
//! Three small building blocks cover most multi-bridge scenarios: a
//! bidirectional [`connect`] between two bridges, a write-only [`sink`] for
//! observing what a bridge forwards, and a one-shot [`source`] for feeding a
//! bridge a fixed byte sequence.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use ndlcom_core::{Bridge, ExternalInterface, InterfaceFlags, InterfaceHandle};
use ndlcom_proto::Result as ProtoResult;

/// # Panics
///
/// Panics if `queue`'s mutex is poisoned. Acceptable for test-harness code.
#[allow(clippy::unwrap_used)]
fn drain_into(queue: &Mutex<VecDeque<u8>>, buf: &mut [u8]) -> usize {
    let mut queue = queue.lock().unwrap();
    let mut n = 0;
    while n < buf.len() {
        let Some(byte) = queue.pop_front() else { break };
        buf[n] = byte;
        n += 1;
    }
    n
}

/// Register a bidirectional in-memory link between two bridges: bytes
/// written on one side's interface are read back on the other's, like a
/// serial cable.
///
/// # Panics
///
/// The registered write callbacks panic if the shared queue's mutex is
/// poisoned. Acceptable for test-harness code.
#[allow(clippy::unwrap_used)]
pub fn connect(
    bridge_a: &mut Bridge,
    flags_a: InterfaceFlags,
    bridge_b: &mut Bridge,
    flags_b: InterfaceFlags,
) -> (InterfaceHandle, InterfaceHandle) {
    let a_to_b = Arc::new(Mutex::new(VecDeque::new()));
    let b_to_a = Arc::new(Mutex::new(VecDeque::new()));

    let write_a = Arc::clone(&a_to_b);
    let read_a = Arc::clone(&b_to_a);
    let handle_a = bridge_a.register_interface(ExternalInterface::new(
        move |buf: &mut [u8]| Ok(drain_into(&read_a, buf)),
        move |bytes: &[u8]| {
            write_a.lock().unwrap().extend(bytes.iter().copied());
            Ok(())
        },
        flags_a,
    ));

    let write_b = Arc::clone(&b_to_a);
    let read_b = Arc::clone(&a_to_b);
    let handle_b = bridge_b.register_interface(ExternalInterface::new(
        move |buf: &mut [u8]| Ok(drain_into(&read_b, buf)),
        move |bytes: &[u8]| {
            write_b.lock().unwrap().extend(bytes.iter().copied());
            Ok(())
        },
        flags_b,
    ));

    tracing::debug!(?handle_a, ?handle_b, "harness: connected in-memory link");
    (handle_a, handle_b)
}

/// Register a write-only interface that records every byte it is asked to
/// send and never produces input of its own.
///
/// # Panics
///
/// The registered write callback panics if the shared buffer's mutex is
/// poisoned. Acceptable for test-harness code.
#[allow(clippy::unwrap_used)]
pub fn sink(bridge: &mut Bridge, flags: InterfaceFlags) -> (InterfaceHandle, Arc<Mutex<Vec<u8>>>) {
    let written = Arc::new(Mutex::new(Vec::new()));
    let written_clone = Arc::clone(&written);
    let handle = bridge.register_interface(ExternalInterface::new(
        |_: &mut [u8]| Ok(0),
        move |bytes: &[u8]| {
            written_clone.lock().unwrap().extend_from_slice(bytes);
            Ok(())
        },
        flags,
    ));
    (handle, written)
}

/// Register an interface that yields `bytes` exactly once (spread across
/// however many reads it takes to drain it), then behaves like an idle
/// transport, and discards anything written to it.
pub fn source(bridge: &mut Bridge, flags: InterfaceFlags, bytes: &[u8]) -> InterfaceHandle {
    let remaining = Arc::new(Mutex::new(bytes.iter().copied().collect::<VecDeque<u8>>()));
    bridge.register_interface(ExternalInterface::new(
        move |buf: &mut [u8]| Ok(drain_into(&remaining, buf)),
        |_: &[u8]| Ok(()),
        flags,
    ))
}

/// Encode a frame the way a harness test would hand-assemble wire bytes for
/// a [`source`], surfacing the underlying [`ndlcom_proto`] encode error
/// rather than hiding it behind an `unwrap` in every call site.
pub fn encode_frame(header: ndlcom_proto::Header, payload: &[u8]) -> ProtoResult<Vec<u8>> {
    let mut out = Vec::new();
    ndlcom_proto::encode(header, payload, &mut out)?;
    Ok(out)
}
