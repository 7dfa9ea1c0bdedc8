use swimkv_net::{Address, EventLog, Message, NetworkShim};
use swimkv_ring::{replicas_for, Ring};

use crate::constants::{QUORUM, T_TRANSACTION};
use crate::transaction::{Kind, TransactionTable};

/// Turns client CRUD calls into quorum-replicated operations (§4.4).
///
/// Sending in `client_*` happens inline, eagerly, not queued for the
/// next tick — the fan-out is cheap local bookkeeping plus
/// `NetworkShim::send`, which never blocks.
pub struct Coordinator {
    me: Address,
    table: TransactionTable,
    t_transaction: u64,
}

impl Coordinator {
    pub fn new(me: Address) -> Self {
        Self { me, table: TransactionTable::new(), t_transaction: T_TRANSACTION }
    }

    /// Overrides the quorum timeout — lets a test harness shrink
    /// `T_TRANSACTION` without touching the production default.
    pub fn with_transaction_timeout(mut self, t_transaction: u64) -> Self {
        self.t_transaction = t_transaction;
        self
    }

    pub fn table(&self) -> &TransactionTable {
        &self.table
    }

    pub fn client_create(&mut self, ring: &Ring, net: &dyn NetworkShim, now: u64, key: &str, value: &str) -> u32 {
        self.dispatch(ring, net, now, Kind::Create, key, value)
    }

    pub fn client_read(&mut self, ring: &Ring, net: &dyn NetworkShim, now: u64, key: &str) -> u32 {
        self.dispatch(ring, net, now, Kind::Read, key, "")
    }

    pub fn client_update(&mut self, ring: &Ring, net: &dyn NetworkShim, now: u64, key: &str, value: &str) -> u32 {
        self.dispatch(ring, net, now, Kind::Update, key, value)
    }

    pub fn client_delete(&mut self, ring: &Ring, net: &dyn NetworkShim, now: u64, key: &str) -> u32 {
        self.dispatch(ring, net, now, Kind::Delete, key, "")
    }

    fn dispatch(&mut self, ring: &Ring, net: &dyn NetworkShim, now: u64, kind: Kind, key: &str, value: &str) -> u32 {
        let replicas = replicas_for(ring, key);
        let id = self.table.insert(kind, key.to_string(), value.to_string(), now);
        let trans_id = id as i64;
        for replica in replicas {
            let msg = match kind {
                Kind::Create => Message::Create { from: self.me, trans_id, key: key.to_string(), value: value.to_string() },
                Kind::Read => Message::Read { from: self.me, trans_id, key: key.to_string() },
                Kind::Update => Message::Update { from: self.me, trans_id, key: key.to_string(), value: value.to_string() },
                Kind::Delete => Message::Delete { from: self.me, trans_id, key: key.to_string() },
            };
            net.send(self.me, replica, swimkv_net::wire::encode(&msg));
        }
        metrics::increment_counter!("kv_coordinator_dispatch");
        id
    }

    /// Folds an inbound REPLY or READREPLY into its transaction.
    /// Duplicate replies from the same replica are counted again — no
    /// per-replica dedup, matching §4.4's documented edge case.
    pub fn on_reply(&mut self, msg: &Message) {
        match msg {
            Message::Reply { trans_id, success, .. } => {
                if let Some(t) = self.non_negative(*trans_id) {
                    t.replies += 1;
                    if *success {
                        t.successes += 1;
                    }
                }
            }
            Message::ReadReply { trans_id, value, success, .. } => {
                if let Some(t) = self.non_negative(*trans_id) {
                    t.replies += 1;
                    if *success {
                        t.successes += 1;
                    }
                    // last-received value wins; reads are not versioned (§4.4)
                    t.collected_value = Some(value.clone());
                }
            }
            _ => {}
        }
    }

    fn non_negative(&mut self, trans_id: i64) -> Option<&mut crate::transaction::Transaction> {
        if trans_id < 0 {
            return None;
        }
        self.table.get_mut(trans_id as u32)
    }

    /// Decides every open transaction that has reached quorum or
    /// timed out, then retires old logged rows (§4.4, §9).
    pub fn check_transactions(&mut self, now: u64, log: &dyn EventLog) {
        for id in self.table.open_ids() {
            let t = self.table.get_mut(id).expect("open_ids only returns live rows");
            if t.replies as usize >= QUORUM {
                let success = t.successes == t.replies;
                Self::log_decision(log, self.me, t, success);
                t.logged = true;
            } else if now.saturating_sub(t.created_at) > self.t_transaction {
                Self::log_decision(log, self.me, t, false);
                t.logged = true;
            }
        }
        self.table.evict_logged(now, self.t_transaction);
    }

    fn log_decision(log: &dyn EventLog, me: Address, t: &crate::transaction::Transaction, success: bool) {
        let trans_id = t.id as i64;
        match (t.kind, success) {
            (Kind::Create, true) => log.log_create_success(me, true, trans_id, &t.key, &t.value),
            (Kind::Create, false) => log.log_create_fail(me, true, trans_id, &t.key, &t.value),
            (Kind::Read, true) => {
                let value = t.collected_value.clone().unwrap_or_default();
                // empty-string value from a successful-looking read still
                // counts as a miss (§4.4 edge case)
                if value.is_empty() {
                    log.log_read_fail(me, true, trans_id, &t.key);
                } else {
                    log.log_read_success(me, true, trans_id, &t.key, &value);
                }
            }
            (Kind::Read, false) => log.log_read_fail(me, true, trans_id, &t.key),
            (Kind::Update, true) => log.log_update_success(me, true, trans_id, &t.key, &t.value),
            (Kind::Update, false) => log.log_update_fail(me, true, trans_id, &t.key, &t.value),
            (Kind::Delete, true) => log.log_delete_success(me, true, trans_id, &t.key),
            (Kind::Delete, false) => log.log_delete_fail(me, true, trans_id, &t.key),
        }
    }
}
