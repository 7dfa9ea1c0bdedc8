/// Ticks a coordinator waits for quorum before giving up on a transaction (§4.4).
pub const T_TRANSACTION: u64 = 10;

/// Replies needed to decide a transaction (§4.4).
pub const QUORUM: usize = swimkv_ring::QUORUM;
