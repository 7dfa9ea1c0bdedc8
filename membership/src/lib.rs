//! Heartbeat-gossip membership engine with timeout-based failure
//! detection (§4.2) — a SWIM-lite variant.

mod constants;
mod engine;
mod table;

pub use constants::{T_FAIL, T_REMOVE};
pub use engine::MembershipEngine;
pub use table::{MembershipTable, PeerEntry, PeerState};
