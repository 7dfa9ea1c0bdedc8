use swimkv_net::{Message, NetworkShim};
use swimkv_ring::{replicas_for, Ring};

use crate::store::LocalStore;

/// Re-replicates every locally held key onto its current replica set
/// whenever the ring changes (§4.6). Unconditional: it re-sends every
/// key even to replicas that already hold it, and never garbage
/// collects copies on replicas that have since left the set — left
/// unspecified on purpose (§9 open question).
pub struct Stabilization;

impl Stabilization {
    /// Addresses the peer itself (the sender) so replies loop back
    /// here, though replicas never reply to a `trans_id == -1` CREATE.
    pub fn run(me: swimkv_net::Address, store: &dyn LocalStore, ring: &Ring, net: &dyn NetworkShim) {
        for (key, value) in store.iter() {
            for replica in replicas_for(ring, key) {
                let msg = Message::Create {
                    from: me,
                    trans_id: -1,
                    key: key.to_string(),
                    value: value.to_string(),
                };
                net.send(me, replica, swimkv_net::wire::encode(&msg));
            }
        }
    }
}
