use bytes::Bytes;

use crate::Address;

/// The network shim consumed by every layer above it (§4.1, §6).
///
/// `send` is fire-and-forget: no ordering, no delivery guarantee, no
/// retransmission at this layer. `drain` returns everything enqueued
/// for `at` since the last call. Failures are never surfaced — a lost
/// packet is silent, exactly as §4.1 specifies.
pub trait NetworkShim {
    fn send(&self, from: Address, to: Address, bytes: Bytes);
    fn drain(&self, at: Address) -> Vec<Bytes>;
}
