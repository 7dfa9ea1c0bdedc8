/// Keys and addresses hash into `[0, RING_SIZE)` (§3).
pub const RING_SIZE: u64 = 1u64 << 32;

/// Each key lives on this many consecutive ring successors (§3).
pub const REPLICATION_FACTOR: usize = 3;

/// Replies required before a transaction is decided (§3).
pub const QUORUM: usize = 2;
