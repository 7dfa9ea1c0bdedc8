//! Address type, wire codec and the emulated network shim (§4.1, §6).
//!
//! Everything above the shim talks to peers only through
//! [`NetworkShim::send`]/[`NetworkShim::drain`]; there is no ordering or
//! delivery guarantee and no retransmission at this layer.

mod address;
mod log;
mod message;
mod shim;
mod sim;
pub mod wire;

pub use address::Address;
pub use log::{EventLog, NullEventLog, TracingEventLog};
pub use message::{Digest, Message};
pub use shim::NetworkShim;
pub use sim::SimNetwork;

pub use wire::Error;
