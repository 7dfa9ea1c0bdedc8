use std::collections::HashMap;

use swimkv_net::Address;

/// One row of the membership table (§3).
///
/// Invariant upheld by [`MembershipTable`]: no two rows share an
/// address, and the owning peer never has a row for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerEntry {
    pub address: Address,
    pub heartbeat: u64,
    pub last_seen: u64,
}

/// The per-row state machine of §4.2, derived from `now - last_seen`
/// rather than stored — there is no explicit FAIL message, only
/// timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Alive,
    Suspect,
}

impl PeerEntry {
    /// `None` once the row has crossed `t_remove` and should be
    /// evicted. Thresholds are passed in rather than read from a
    /// module constant so a test harness can shrink them for faster
    /// convergence without touching production defaults
    /// ([`crate::T_FAIL`], [`crate::T_REMOVE`]).
    pub fn state(&self, now: u64, t_fail: u64, t_remove: u64) -> Option<PeerState> {
        let age = now.saturating_sub(self.last_seen);
        if age >= t_remove {
            None
        } else if age >= t_fail {
            Some(PeerState::Suspect)
        } else {
            Some(PeerState::Alive)
        }
    }
}

/// An unordered collection of [`PeerEntry`], owned by one peer and
/// mutated only by the membership engine (§3).
#[derive(Debug, Default, Clone)]
pub struct MembershipTable {
    rows: HashMap<Address, PeerEntry>,
}

impl MembershipTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: Address) -> Option<&PeerEntry> {
        self.rows.get(&address)
    }

    pub fn contains(&self, address: Address) -> bool {
        self.rows.contains_key(&address)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerEntry> {
        self.rows.values()
    }

    /// Inserts or refreshes a row. Never inserts a row for `me` — a
    /// digest entry equal to self is a self-addressed anomaly that
    /// must be skipped on merge (§7).
    pub(crate) fn upsert(&mut self, me: Address, entry: PeerEntry) {
        if entry.address == me {
            return;
        }
        self.rows.insert(entry.address, entry);
    }

    pub(crate) fn remove(&mut self, address: Address) -> Option<PeerEntry> {
        self.rows.remove(&address)
    }

    /// Rows whose age has crossed `t_remove` as of `now`.
    pub(crate) fn expired(&self, now: u64, t_fail: u64, t_remove: u64) -> Vec<Address> {
        self.rows
            .values()
            .filter(|e| e.state(now, t_fail, t_remove).is_none())
            .map(|e| e.address)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{T_FAIL, T_REMOVE};

    fn addr(id: u32) -> Address {
        Address::new(id, 0)
    }

    #[test]
    fn never_inserts_a_row_for_self() {
        let me = addr(1);
        let mut table = MembershipTable::new();
        table.upsert(me, PeerEntry { address: me, heartbeat: 1, last_seen: 0 });
        assert!(table.is_empty());
    }

    #[test]
    fn state_transitions_by_age() {
        let entry = PeerEntry { address: addr(2), heartbeat: 0, last_seen: 0 };
        assert_eq!(entry.state(0, T_FAIL, T_REMOVE), Some(PeerState::Alive));
        assert_eq!(entry.state(T_FAIL, T_FAIL, T_REMOVE), Some(PeerState::Suspect));
        assert_eq!(entry.state(T_REMOVE, T_FAIL, T_REMOVE), None);
    }

    #[test]
    fn expired_lists_only_rows_past_t_remove() {
        let me = addr(1);
        let mut table = MembershipTable::new();
        table.upsert(me, PeerEntry { address: addr(2), heartbeat: 0, last_seen: 0 });
        table.upsert(me, PeerEntry { address: addr(3), heartbeat: 0, last_seen: T_REMOVE });
        assert_eq!(table.expired(T_REMOVE, T_FAIL, T_REMOVE), vec![addr(2)]);
    }
}
