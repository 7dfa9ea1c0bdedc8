use swimkv_net::{Address, Digest, EventLog, Message, NetworkShim};

use crate::constants::{T_FAIL, T_REMOVE};
use crate::table::{MembershipTable, PeerEntry};

/// Heartbeat-gossip membership engine (§4.2).
///
/// Owns no clock of its own — `now` is passed in on every call so the
/// host's tick counter is the single source of truth (§5: "the host
/// invokes `tick()` on each peer in an outer loop").
pub struct MembershipEngine {
    me: Address,
    in_group: bool,
    heartbeat: u64,
    table: MembershipTable,
    t_fail: u64,
    t_remove: u64,
}

impl MembershipEngine {
    pub fn new(me: Address) -> Self {
        Self {
            me,
            in_group: false,
            heartbeat: 0,
            table: MembershipTable::new(),
            t_fail: T_FAIL,
            t_remove: T_REMOVE,
        }
    }

    /// Overrides the failure-detection thresholds — lets a test
    /// harness shrink `T_FAIL`/`T_REMOVE` for faster convergence
    /// without changing the production defaults.
    pub fn with_thresholds(mut self, t_fail: u64, t_remove: u64) -> Self {
        self.t_fail = t_fail;
        self.t_remove = t_remove;
        self
    }

    pub fn me(&self) -> Address {
        self.me
    }

    pub fn in_group(&self) -> bool {
        self.in_group
    }

    pub fn heartbeat(&self) -> u64 {
        self.heartbeat
    }

    pub fn table(&self) -> &MembershipTable {
        &self.table
    }

    /// `snapshot() -> list<Address>`: the current in-group peer set
    /// including self (§4.2).
    pub fn snapshot(&self) -> Vec<Address> {
        let mut peers: Vec<Address> = self.table.iter().map(|e| e.address).collect();
        peers.push(self.me);
        peers
    }

    /// If `me == introducer`, mark self in-group immediately; else
    /// send JOINREQ and stay out of group until JOINREP arrives (§4.2).
    pub fn start(&mut self, introducer: Address, net: &dyn NetworkShim) {
        if self.me == introducer {
            self.in_group = true;
            return;
        }
        net.send(
            self.me,
            introducer,
            swimkv_net::wire::encode(&Message::JoinReq { from: self.me }),
        );
    }

    /// Introducer side: admit the joiner (heartbeat inferred as 1) and
    /// reply with our own digest (§4.2).
    pub fn on_join_req(&mut self, now: u64, from: Address, log: &dyn EventLog) -> Message {
        if from != self.me && !self.table.contains(from) {
            self.table.upsert(
                self.me,
                PeerEntry { address: from, heartbeat: 1, last_seen: now },
            );
            log.log_node_add(self.me, from);
            metrics::increment_counter!("membership_node_add");
        }
        Message::JoinRep { from: self.me, digest: self.digest() }
    }

    /// Joiner side: the first JOINREP admits us into the group, and
    /// admits the introducer's own row with heartbeat 1 — mirroring
    /// `on_join_req`'s admission of the joiner (§4.2). `self.heartbeat`
    /// is not usable here: it is still 0 until the first `tick()`.
    pub fn on_join_rep(&mut self, now: u64, from: Address, digest: &[Digest], log: &dyn EventLog) {
        self.in_group = true;
        self.merge_digest(now, from, 1, digest, log);
    }

    /// PING carries the sender's own heartbeat plus a digest of the
    /// sender's table (§4.2). Merge rules:
    /// - for the sender's own row: `hb <- max(hb, recv_hb)`,
    ///   `last_seen <- now`;
    /// - for each digest entry: refresh if `hb' > hb`; admit a brand
    ///   new row only if the digest heartbeat is non-zero (prevents a
    ///   stale digest resurrecting a just-evicted peer, §4.2).
    pub fn on_ping(
        &mut self,
        now: u64,
        from: Address,
        sender_heartbeat: u64,
        digest: &[Digest],
        log: &dyn EventLog,
    ) {
        self.merge_digest(now, from, sender_heartbeat, digest, log);
    }

    fn merge_digest(
        &mut self,
        now: u64,
        from: Address,
        from_heartbeat: u64,
        digest: &[Digest],
        log: &dyn EventLog,
    ) {
        self.refresh_sender(now, from, from_heartbeat, log);
        for entry in digest {
            if entry.address == from {
                // already folded in above with the authoritative sender heartbeat
                continue;
            }
            self.refresh_or_admit(now, entry.address, entry.heartbeat, log);
        }
    }

    /// The sender's own row refreshes unconditionally on direct
    /// receipt: `hb <- max(hb, recv_hb)`, `last_seen <- now` even if
    /// `recv_hb` didn't advance (§4.2). Digest entries for other peers
    /// use the stricter `refresh_or_admit` below instead.
    fn refresh_sender(&mut self, now: u64, address: Address, heartbeat: u64, log: &dyn EventLog) {
        if address == self.me {
            return;
        }
        match self.table.get(address) {
            Some(existing) => {
                let heartbeat = heartbeat.max(existing.heartbeat);
                self.table.upsert(
                    self.me,
                    PeerEntry { address, heartbeat, last_seen: now },
                );
            }
            None => self.admit_if_nonzero(now, address, heartbeat, log),
        }
    }

    fn refresh_or_admit(&mut self, now: u64, address: Address, heartbeat: u64, log: &dyn EventLog) {
        if address == self.me {
            return;
        }
        match self.table.get(address) {
            Some(existing) => {
                if heartbeat > existing.heartbeat {
                    self.table.upsert(
                        self.me,
                        PeerEntry { address, heartbeat, last_seen: now },
                    );
                }
            }
            None => self.admit_if_nonzero(now, address, heartbeat, log),
        }
    }

    /// A zero digest heartbeat never resurrects a row we don't have —
    /// either it's a brand-new peer (which always gossips hb >= 1 once
    /// it is in_group) or it's a stale echo of a peer we (or someone)
    /// already evicted.
    fn admit_if_nonzero(&mut self, now: u64, address: Address, heartbeat: u64, log: &dyn EventLog) {
        if heartbeat != 0 {
            self.table.upsert(
                self.me,
                PeerEntry { address, heartbeat, last_seen: now },
            );
            log.log_node_add(self.me, address);
            metrics::increment_counter!("membership_node_add");
        }
    }

    /// `tick()`: if out of group, callers should still route inbound
    /// JOINREP/PING to the `on_*` methods above — only the
    /// advance-and-broadcast half lives here, run only once in group
    /// (§4.2).
    pub fn tick(&mut self, now: u64, net: &dyn NetworkShim, log: &dyn EventLog) {
        if !self.in_group {
            return;
        }

        // (a) increment own heartbeat strictly before the eviction
        // scan, matching the original's statement order (SPEC_FULL §3.5).
        self.heartbeat += 1;

        // (b) evict entries older than T_REMOVE.
        for address in self.table.expired(now, self.t_fail, self.t_remove) {
            self.table.remove(address);
            log.log_node_remove(self.me, address);
            metrics::increment_counter!("membership_node_remove");
        }
        metrics::gauge!("membership_table_size", self.table.len() as f64);

        // (c) broadcast PING with our digest to every live peer.
        let ping = Message::Ping {
            from: self.me,
            heartbeat: self.heartbeat,
            digest: self.digest(),
        };
        let bytes = swimkv_net::wire::encode(&ping);
        for peer in self.table.iter() {
            net.send(self.me, peer.address, bytes.clone());
        }
    }

    fn digest(&self) -> Vec<Digest> {
        self.table
            .iter()
            .map(|e| Digest { address: e.address, heartbeat: e.heartbeat })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swimkv_net::{NullEventLog, SimNetwork};

    fn addr(id: u32) -> Address {
        Address::new(id, 0)
    }

    #[test]
    fn single_peer_bootstrap_is_in_group_with_empty_table() {
        let mut engine = MembershipEngine::new(Address::INTRODUCER);
        let net = SimNetwork::new();
        engine.start(Address::INTRODUCER, &net);
        assert!(engine.in_group());
        assert!(engine.table().is_empty());
        assert_eq!(engine.snapshot(), vec![Address::INTRODUCER]);
    }

    #[test]
    fn join_request_admits_joiner_with_heartbeat_one() {
        let log = NullEventLog;
        let mut introducer = MembershipEngine::new(Address::INTRODUCER);
        introducer.start(Address::INTRODUCER, &SimNetwork::new());

        let joiner = addr(2);
        let rep = introducer.on_join_req(3, joiner, &log);
        assert_eq!(introducer.table().get(joiner).unwrap().heartbeat, 1);
        match rep {
            Message::JoinRep { from, .. } => assert_eq!(from, Address::INTRODUCER),
            _ => panic!("expected JoinRep"),
        }
    }

    #[test]
    fn join_rep_puts_joiner_in_group_and_admits_introducer_row() {
        let log = NullEventLog;
        let mut joiner = MembershipEngine::new(addr(2));
        joiner.on_join_rep(1, Address::INTRODUCER, &[], &log);
        assert!(joiner.in_group());
        assert_eq!(joiner.table().get(Address::INTRODUCER).unwrap().heartbeat, 1);
    }

    #[test]
    fn ping_refreshes_sender_last_seen_even_without_heartbeat_advance() {
        let log = NullEventLog;
        let me = addr(1);
        let mut engine = MembershipEngine::new(me);
        engine.start(me, &SimNetwork::new());
        engine.on_join_req(0, addr(2), &log);
        assert_eq!(engine.table().get(addr(2)).unwrap().last_seen, 0);

        // Same heartbeat as already recorded — still must bump last_seen.
        engine.on_ping(10, addr(2), 1, &[], &log);
        assert_eq!(engine.table().get(addr(2)).unwrap().last_seen, 10);
        assert_eq!(engine.table().get(addr(2)).unwrap().heartbeat, 1);
    }

    #[test]
    fn digest_resurrection_is_refused_for_zero_heartbeat() {
        let log = NullEventLog;
        let mut engine = MembershipEngine::new(addr(1));
        engine.start(addr(1), &SimNetwork::new());
        // A digest entry with heartbeat 0 for an address we've never
        // seen must not create a row (§4.2 open question resolution).
        engine.on_ping(5, addr(9), 3, &[Digest { address: addr(42), heartbeat: 0 }], &log);
        assert!(!engine.table().contains(addr(42)));
        // sender itself is still admitted since its own heartbeat (3) is non-zero
        assert!(engine.table().contains(addr(9)));
    }

    #[test]
    fn never_creates_a_row_for_self_via_digest() {
        let log = NullEventLog;
        let me = addr(1);
        let mut engine = MembershipEngine::new(me);
        engine.start(me, &SimNetwork::new());
        engine.on_ping(5, addr(2), 1, &[Digest { address: me, heartbeat: 99 }], &log);
        assert!(!engine.table().contains(me));
    }

    #[test]
    fn tick_evicts_after_t_remove_and_logs_once() {
        use crate::constants::T_REMOVE;
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingLog(AtomicUsize);
        impl EventLog for CountingLog {
            fn log_node_add(&self, _me: Address, _added: Address) {}
            fn log_node_remove(&self, _me: Address, _removed: Address) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
            fn log_create_success(&self, _: Address, _: bool, _: i64, _: &str, _: &str) {}
            fn log_create_fail(&self, _: Address, _: bool, _: i64, _: &str, _: &str) {}
            fn log_read_success(&self, _: Address, _: bool, _: i64, _: &str, _: &str) {}
            fn log_read_fail(&self, _: Address, _: bool, _: i64, _: &str) {}
            fn log_update_success(&self, _: Address, _: bool, _: i64, _: &str, _: &str) {}
            fn log_update_fail(&self, _: Address, _: bool, _: i64, _: &str, _: &str) {}
            fn log_delete_success(&self, _: Address, _: bool, _: i64, _: &str) {}
            fn log_delete_fail(&self, _: Address, _: bool, _: i64, _: &str) {}
        }

        let log = CountingLog(AtomicUsize::new(0));
        let net = SimNetwork::new();
        let me = addr(1);
        let mut engine = MembershipEngine::new(me);
        engine.start(me, &net);
        engine.on_join_req(0, addr(2), &log);

        for now in 1..T_REMOVE {
            engine.tick(now, &net, &log);
            assert!(engine.table().contains(addr(2)));
        }
        engine.tick(T_REMOVE, &net, &log);
        assert!(!engine.table().contains(addr(2)));
        assert_eq!(log.0.load(Ordering::SeqCst), 1);
    }
}
