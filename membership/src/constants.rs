/// Ticks after which a row with no fresher heartbeat turns SUSPECT (§4.2).
pub const T_FAIL: u64 = 5;

/// Ticks after which a row is evicted outright (§4.2, §6).
pub const T_REMOVE: u64 = 20;
