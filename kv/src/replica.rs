use swimkv_net::{Address, EventLog, Message, NetworkShim};

use crate::store::LocalStore;

/// Applies inbound CRUD to the local store and replies (§4.5).
pub struct ReplicaServer {
    me: Address,
}

impl ReplicaServer {
    pub fn new(me: Address) -> Self {
        Self { me }
    }

    /// Handles one inbound CREATE/READ/UPDATE/DELETE. A `trans_id ==
    /// -1` message is a stabilization replant: apply silently, no log
    /// entry, no reply (§4.5, §4.6). Any other message kind is a
    /// logic error at the call site and is ignored.
    pub fn on_message(&self, msg: &Message, store: &mut dyn LocalStore, net: &dyn NetworkShim, log: &dyn EventLog) {
        match msg {
            Message::Create { from, trans_id, key, value } => {
                let success = store.create(key, value);
                if msg.is_stabilization() {
                    return;
                }
                log.log_create_success(self.me, false, *trans_id, key, value);
                debug_assert!(success, "InMemoryStore::create never fails");
                self.reply(net, *from, *trans_id, key, true);
            }
            Message::Read { from, trans_id, key } => {
                let value = store.read(key);
                let success = !value.is_empty();
                if success {
                    log.log_read_success(self.me, false, *trans_id, key, &value);
                } else {
                    log.log_read_fail(self.me, false, *trans_id, key);
                }
                self.read_reply(net, *from, *trans_id, key, &value, success);
            }
            Message::Update { from, trans_id, key, value } => {
                let success = store.update(key, value);
                if success {
                    log.log_update_success(self.me, false, *trans_id, key, value);
                } else {
                    log.log_update_fail(self.me, false, *trans_id, key, value);
                }
                self.reply(net, *from, *trans_id, key, success);
            }
            Message::Delete { from, trans_id, key } => {
                let success = store.delete(key);
                if success {
                    log.log_delete_success(self.me, false, *trans_id, key);
                } else {
                    log.log_delete_fail(self.me, false, *trans_id, key);
                }
                self.reply(net, *from, *trans_id, key, success);
            }
            _ => {}
        }
    }

    fn reply(&self, net: &dyn NetworkShim, to: Address, trans_id: i64, key: &str, success: bool) {
        let msg = Message::Reply { from: self.me, trans_id, key: key.to_string(), success };
        net.send(self.me, to, swimkv_net::wire::encode(&msg));
    }

    fn read_reply(&self, net: &dyn NetworkShim, to: Address, trans_id: i64, key: &str, value: &str, success: bool) {
        let msg = Message::ReadReply {
            from: self.me,
            trans_id,
            key: key.to_string(),
            value: value.to_string(),
            success,
        };
        net.send(self.me, to, swimkv_net::wire::encode(&msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swimkv_net::{NullEventLog, SimNetwork};
    use crate::store::InMemoryStore;

    fn addr(id: u32) -> Address {
        Address::new(id, 0)
    }

    #[test]
    fn create_always_replies_success() {
        let replica = ReplicaServer::new(addr(1));
        let mut store = InMemoryStore::new();
        let net = SimNetwork::new();
        let log = NullEventLog;
        replica.on_message(
            &Message::Create { from: addr(2), trans_id: 5, key: "k".into(), value: "v".into() },
            &mut store,
            &net,
            &log,
        );
        assert_eq!(store.read("k"), "v");
        let sent = net.drain(addr(2));
        assert_eq!(sent.len(), 1);
    }

    #[test]
    fn stabilization_create_is_silent() {
        let replica = ReplicaServer::new(addr(1));
        let mut store = InMemoryStore::new();
        let net = SimNetwork::new();
        let log = NullEventLog;
        replica.on_message(
            &Message::Create { from: addr(2), trans_id: -1, key: "k".into(), value: "v".into() },
            &mut store,
            &net,
            &log,
        );
        assert_eq!(store.read("k"), "v");
        assert!(net.drain(addr(2)).is_empty());
    }

    #[test]
    fn update_on_missing_key_fails() {
        let replica = ReplicaServer::new(addr(1));
        let mut store = InMemoryStore::new();
        let net = SimNetwork::new();
        let log = NullEventLog;
        replica.on_message(
            &Message::Update { from: addr(2), trans_id: 1, key: "missing".into(), value: "v".into() },
            &mut store,
            &net,
            &log,
        );
        let sent = net.drain(addr(2));
        match swimkv_net::wire::decode(&sent[0]).unwrap() {
            Message::Reply { success, .. } => assert!(!success),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn read_reply_carries_empty_string_on_miss() {
        let replica = ReplicaServer::new(addr(1));
        let mut store = InMemoryStore::new();
        let net = SimNetwork::new();
        let log = NullEventLog;
        replica.on_message(
            &Message::Read { from: addr(2), trans_id: 1, key: "missing".into() },
            &mut store,
            &net,
            &log,
        );
        let sent = net.drain(addr(2));
        match swimkv_net::wire::decode(&sent[0]).unwrap() {
            Message::ReadReply { value, success, .. } => {
                assert_eq!(value, "");
                assert!(!success);
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }
}
