use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use parking_lot::Mutex;

use crate::{Address, NetworkShim};

/// An in-memory network used by tests, doctests and the CLI harness to
/// stand in for the real emulator §4.1 describes as an external
/// collaborator. Delivery is unordered and lossy only in the sense
/// that a message sent to a killed address is dropped; otherwise every
/// send is queued for the next `drain`.
#[derive(Default)]
pub struct SimNetwork {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    queues: HashMap<Address, Vec<Bytes>>,
    killed: HashSet<Address>,
}

impl SimNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop delivering to, and accepting sends from, `addr` — used to
    /// simulate a node failure for §8 scenario 3/6.
    pub fn kill(&self, addr: Address) {
        let mut inner = self.inner.lock();
        inner.killed.insert(addr);
        inner.queues.remove(&addr);
    }

    pub fn is_killed(&self, addr: Address) -> bool {
        self.inner.lock().killed.contains(&addr)
    }
}

impl NetworkShim for SimNetwork {
    fn send(&self, from: Address, to: Address, bytes: Bytes) {
        let mut inner = self.inner.lock();
        if inner.killed.contains(&from) || inner.killed.contains(&to) {
            return;
        }
        inner.queues.entry(to).or_default().push(bytes);
    }

    fn drain(&self, at: Address) -> Vec<Bytes> {
        let mut inner = self.inner.lock();
        if inner.killed.contains(&at) {
            return Vec::new();
        }
        inner.queues.remove(&at).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_everything_since_last_drain() {
        let net = SimNetwork::new();
        let a = Address::new(1, 0);
        let b = Address::new(2, 0);
        net.send(a, b, Bytes::from_static(b"one"));
        net.send(a, b, Bytes::from_static(b"two"));
        assert_eq!(net.drain(b).len(), 2);
        assert!(net.drain(b).is_empty());
    }

    #[test]
    fn killed_peer_neither_sends_nor_receives() {
        let net = SimNetwork::new();
        let a = Address::new(1, 0);
        let b = Address::new(2, 0);
        net.kill(b);
        net.send(a, b, Bytes::from_static(b"dropped"));
        assert!(net.drain(b).is_empty());

        net.kill(a);
        net.send(a, Address::new(3, 0), Bytes::from_static(b"also dropped"));
        assert!(net.drain(Address::new(3, 0)).is_empty());
    }
}
