use swimkv_kv::{Coordinator, InMemoryStore, ReplicaServer, Stabilization};
use swimkv_membership::MembershipEngine;
use swimkv_net::{Address, EventLog, Message, NetworkShim};
use swimkv_ring::Ring;

use crate::config::PeerConfig;

/// One logical peer: membership participant, ring member, client
/// coordinator, and replica server all in one (§1, §2).
pub struct Peer {
    me: Address,
    now: u64,
    membership: MembershipEngine,
    ring: Ring,
    coordinator: Coordinator,
    replica: ReplicaServer,
    store: InMemoryStore,
}

impl Peer {
    /// Builds the peer and immediately runs the join handshake's first
    /// half (§4.2 `start`): introducer marks itself in-group, anyone
    /// else emits JOINREQ via `net`.
    pub fn new(config: PeerConfig, net: &dyn NetworkShim) -> Self {
        let mut membership = MembershipEngine::new(config.me);
        if let (Some(t_fail), Some(t_remove)) = (config.t_fail, config.t_remove) {
            membership = membership.with_thresholds(t_fail, t_remove);
        }
        membership.start(config.introducer, net);

        let mut coordinator = Coordinator::new(config.me);
        if let Some(t_transaction) = config.t_transaction {
            coordinator = coordinator.with_transaction_timeout(t_transaction);
        }

        Self {
            me: config.me,
            now: 0,
            membership,
            ring: Ring::default(),
            coordinator,
            replica: ReplicaServer::new(config.me),
            store: InMemoryStore::new(),
        }
    }

    pub fn me(&self) -> Address {
        self.me
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn in_group(&self) -> bool {
        self.membership.in_group()
    }

    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    pub fn membership(&self) -> &MembershipEngine {
        &self.membership
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn client_create(&mut self, net: &dyn NetworkShim, key: &str, value: &str) -> u32 {
        self.coordinator.client_create(&self.ring, net, self.now, key, value)
    }

    pub fn client_read(&mut self, net: &dyn NetworkShim, key: &str) -> u32 {
        self.coordinator.client_read(&self.ring, net, self.now, key)
    }

    pub fn client_update(&mut self, net: &dyn NetworkShim, key: &str, value: &str) -> u32 {
        self.coordinator.client_update(&self.ring, net, self.now, key, value)
    }

    pub fn client_delete(&mut self, net: &dyn NetworkShim, key: &str) -> u32 {
        self.coordinator.client_delete(&self.ring, net, self.now, key)
    }

    /// One control-flow pass (§2): drain inbound, advance membership
    /// (which itself broadcasts gossip only if in-group), then — only
    /// if in-group — rebuild the ring, stabilize on change, and
    /// advance the KV coordinator's quorum/timeout sweep.
    pub fn tick(&mut self, net: &dyn NetworkShim, log: &dyn EventLog) {
        self.now += 1;
        self.drain_inbound(net, log);
        self.membership.tick(self.now, net, log);

        if self.membership.in_group() {
            let new_ring = swimkv_ring::rebuild(&self.membership);
            if swimkv_ring::changed(&self.ring, &new_ring) {
                Stabilization::run(self.me, &self.store, &new_ring, net);
                metrics::increment_counter!("node_stabilization_run");
            }
            self.ring = new_ring;
            self.coordinator.check_transactions(self.now, log);
        }
    }

    fn drain_inbound(&mut self, net: &dyn NetworkShim, log: &dyn EventLog) {
        for bytes in net.drain(self.me) {
            let msg = match swimkv_net::wire::decode(&bytes) {
                Ok(msg) => msg,
                Err(error) => {
                    tracing::warn!(me = %self.me, %error, "dropping undecodable message");
                    continue;
                }
            };
            self.dispatch(msg, net, log);
        }
    }

    fn dispatch(&mut self, msg: Message, net: &dyn NetworkShim, log: &dyn EventLog) {
        match msg {
            Message::JoinReq { from } => {
                let rep = self.membership.on_join_req(self.now, from, log);
                net.send(self.me, from, swimkv_net::wire::encode(&rep));
            }
            Message::JoinRep { from, digest } => {
                self.membership.on_join_rep(self.now, from, &digest, log);
            }
            Message::Ping { from, heartbeat, digest } => {
                self.membership.on_ping(self.now, from, heartbeat, &digest, log);
            }
            Message::Create { .. } | Message::Read { .. } | Message::Update { .. } | Message::Delete { .. } => {
                self.replica.on_message(&msg, &mut self.store, net, log);
            }
            Message::Reply { .. } | Message::ReadReply { .. } => {
                self.coordinator.on_reply(&msg);
            }
        }
    }
}
