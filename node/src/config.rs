use swimkv_net::Address;

/// Construction-time knobs for a [`crate::Peer`] (SPEC_FULL §4 `[node]`).
///
/// The threshold overrides exist so integration tests can shrink
/// `T_FAIL`/`T_REMOVE`/`T_TRANSACTION` for fast convergence without
/// touching the production defaults baked into `membership`/`kv`.
#[derive(Debug, Clone, Copy)]
pub struct PeerConfig {
    pub me: Address,
    pub introducer: Address,
    pub t_fail: Option<u64>,
    pub t_remove: Option<u64>,
    pub t_transaction: Option<u64>,
}

impl PeerConfig {
    pub fn new(me: Address, introducer: Address) -> Self {
        Self { me, introducer, t_fail: None, t_remove: None, t_transaction: None }
    }

    pub fn with_fast_timeouts(mut self, t_fail: u64, t_remove: u64, t_transaction: u64) -> Self {
        self.t_fail = Some(t_fail);
        self.t_remove = Some(t_remove);
        self.t_transaction = Some(t_transaction);
        self
    }
}
