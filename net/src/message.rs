use crate::Address;

/// One entry of a gossip digest piggybacked on a `Ping`: `(id, port,
/// heartbeat)`, deliberately without a timestamp — freshness is judged
/// against the receiver's own clock (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Digest {
    pub address: Address,
    pub heartbeat: u64,
}

/// The tagged union of every message the protocols exchange (§3, §9).
///
/// Modeled as an explicit sum type with exhaustive `match` handling at
/// every call site, rather than as a runtime-polymorphic `MessageType`
/// discriminant dispatching into a class hierarchy (§9 "Dynamic dispatch
/// replacement"). `Reply` and `ReadReply` are kept as distinct variants:
/// the original's `REPLY` case falls through into `READREPLY` (no
/// `break`), which §9 calls out as almost certainly a defect and
/// instructs not to replicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    JoinReq {
        from: Address,
    },
    JoinRep {
        from: Address,
        digest: Vec<Digest>,
    },
    Ping {
        from: Address,
        heartbeat: u64,
        digest: Vec<Digest>,
    },
    Create {
        from: Address,
        trans_id: i64,
        key: String,
        value: String,
    },
    Read {
        from: Address,
        trans_id: i64,
        key: String,
    },
    Update {
        from: Address,
        trans_id: i64,
        key: String,
        value: String,
    },
    Delete {
        from: Address,
        trans_id: i64,
        key: String,
    },
    Reply {
        from: Address,
        trans_id: i64,
        key: String,
        success: bool,
    },
    ReadReply {
        from: Address,
        trans_id: i64,
        key: String,
        value: String,
        success: bool,
    },
}

impl Message {
    pub fn from(&self) -> Address {
        match *self {
            Message::JoinReq { from }
            | Message::JoinRep { from, .. }
            | Message::Ping { from, .. }
            | Message::Create { from, .. }
            | Message::Read { from, .. }
            | Message::Update { from, .. }
            | Message::Delete { from, .. }
            | Message::Reply { from, .. }
            | Message::ReadReply { from, .. } => from,
        }
    }

    /// `true` for the messages the stabilization protocol sends with
    /// `trans_id == -1` (§4.5, §4.6): applied silently, no log entry,
    /// no reply.
    pub fn is_stabilization(&self) -> bool {
        matches!(self, Message::Create { trans_id, .. } if *trans_id == -1)
    }
}
