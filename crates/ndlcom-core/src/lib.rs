//! Bridge/routing engine and node abstraction for NDLCom.
//!
//! Built on [`ndlcom_proto`]'s wire codec: this crate owns transports
//! (`ExternalInterface`), decides where a decoded frame should go
//! (`RoutingTable`), and gives local device identities (`Node`) a way to
//! send and receive. The whole engine is a synchronous Sans-IO state
//! machine — see [`bridge::Bridge::process_once`] for the main loop.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bridge;
mod error;
mod handler;
mod header_config;
mod interface;
mod node;
mod routing;

pub use bridge::{Bridge, BridgeConfig, BridgeFlags};
pub use error::{BridgeError, Result, TransportError};
pub use handler::{BridgeHandler, HandlerFlags, HandlerHandle, NodeHandler};
pub use header_config::HeaderConfig;
pub use interface::{DropAndLog, ExternalInterface, InterfaceFlags, Raise, ReportErrorPolicy};
pub use node::{Node, NodeHandle, NodeHandlerHandle};
pub use routing::{Destination, InterfaceHandle, RoutingTable};
