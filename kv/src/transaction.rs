use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Create,
    Read,
    Update,
    Delete,
}

/// One in-flight client operation (§3). `id` is a process-wide
/// monotonically increasing counter — acceptable because every peer in
/// the emulated harness runs in the same process (§9 "Global
/// transaction counter"); a real deployment would key this as
/// `(peer_id, local_counter)` instead.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: u32,
    pub kind: Kind,
    pub key: String,
    pub value: String,
    pub created_at: u64,
    pub replies: u8,
    pub successes: u8,
    pub collected_value: Option<String>,
    pub logged: bool,
}

impl Transaction {
    fn new(id: u32, kind: Kind, key: String, value: String, created_at: u64) -> Self {
        Self {
            id,
            kind,
            key,
            value,
            created_at,
            replies: 0,
            successes: 0,
            collected_value: None,
            logged: false,
        }
    }
}

/// Owned exclusively by the coordinator (§3, §5).
#[derive(Debug, Default)]
pub struct TransactionTable {
    next_id: u32,
    rows: HashMap<u32, Transaction>,
}

impl TransactionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: Kind, key: String, value: String, now: u64) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.insert(id, Transaction::new(id, kind, key, value, now));
        id
    }

    pub fn get(&self, id: u32) -> Option<&Transaction> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Transaction> {
        self.rows.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ids of every still-open transaction, for the decision sweep.
    pub fn open_ids(&self) -> Vec<u32> {
        self.rows
            .values()
            .filter(|t| !t.logged)
            .map(|t| t.id)
            .collect()
    }

    /// Retires logged rows older than `t_transaction * 2`, bounding
    /// table growth — the source never did this (§9 "Transaction table
    /// growth").
    pub fn evict_logged(&mut self, now: u64, t_transaction: u64) {
        self.rows
            .retain(|_, t| !(t.logged && now.saturating_sub(t.created_at) >= t_transaction * 2));
    }
}
