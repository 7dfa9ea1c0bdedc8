//! The structured event log sink consumed by the membership and KV
//! layers (§6). The log is an external collaborator in `spec.md`'s own
//! words — its fixed API is specified there, so it lives next to the
//! other consumed interfaces (`NetworkShim`) rather than inside the
//! layer that calls it. `TracingEventLog` is the ambient-stack default
//! a host gets for free; a production host can substitute its own
//! sink (a metrics pipeline, a file, a test spy) behind the same
//! trait.

use crate::Address;

/// Per-operation success/failure logger methods for CREATE/READ/UPDATE/
/// DELETE, plus node add/remove, exactly as specified in §6.
///
/// `is_coordinator` distinguishes a replica-apply event
/// (`is_coordinator = false`) from a quorum-decision event
/// (`is_coordinator = true`) — see SPEC_FULL §3.2.
pub trait EventLog: Send + Sync {
    fn log_node_add(&self, me: Address, added: Address);
    fn log_node_remove(&self, me: Address, removed: Address);

    fn log_create_success(&self, me: Address, is_coordinator: bool, trans_id: i64, key: &str, value: &str);
    fn log_create_fail(&self, me: Address, is_coordinator: bool, trans_id: i64, key: &str, value: &str);

    fn log_read_success(&self, me: Address, is_coordinator: bool, trans_id: i64, key: &str, value: &str);
    fn log_read_fail(&self, me: Address, is_coordinator: bool, trans_id: i64, key: &str);

    fn log_update_success(&self, me: Address, is_coordinator: bool, trans_id: i64, key: &str, value: &str);
    fn log_update_fail(&self, me: Address, is_coordinator: bool, trans_id: i64, key: &str, value: &str);

    fn log_delete_success(&self, me: Address, is_coordinator: bool, trans_id: i64, key: &str);
    fn log_delete_fail(&self, me: Address, is_coordinator: bool, trans_id: i64, key: &str);
}

/// Emits every event as a `tracing` event at an appropriate level —
/// the ambient-stack default described in SPEC_FULL §1.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventLog;

impl EventLog for TracingEventLog {
    fn log_node_add(&self, me: Address, added: Address) {
        tracing::info!(%me, %added, "node added to membership table");
    }

    fn log_node_remove(&self, me: Address, removed: Address) {
        tracing::warn!(%me, %removed, "node evicted from membership table");
    }

    fn log_create_success(&self, me: Address, is_coordinator: bool, trans_id: i64, key: &str, value: &str) {
        tracing::debug!(%me, is_coordinator, trans_id, key, value, "create succeeded");
    }

    fn log_create_fail(&self, me: Address, is_coordinator: bool, trans_id: i64, key: &str, value: &str) {
        tracing::debug!(%me, is_coordinator, trans_id, key, value, "create failed");
    }

    fn log_read_success(&self, me: Address, is_coordinator: bool, trans_id: i64, key: &str, value: &str) {
        tracing::debug!(%me, is_coordinator, trans_id, key, value, "read succeeded");
    }

    fn log_read_fail(&self, me: Address, is_coordinator: bool, trans_id: i64, key: &str) {
        tracing::debug!(%me, is_coordinator, trans_id, key, "read failed");
    }

    fn log_update_success(&self, me: Address, is_coordinator: bool, trans_id: i64, key: &str, value: &str) {
        tracing::debug!(%me, is_coordinator, trans_id, key, value, "update succeeded");
    }

    fn log_update_fail(&self, me: Address, is_coordinator: bool, trans_id: i64, key: &str, value: &str) {
        tracing::debug!(%me, is_coordinator, trans_id, key, value, "update failed");
    }

    fn log_delete_success(&self, me: Address, is_coordinator: bool, trans_id: i64, key: &str) {
        tracing::debug!(%me, is_coordinator, trans_id, key, "delete succeeded");
    }

    fn log_delete_fail(&self, me: Address, is_coordinator: bool, trans_id: i64, key: &str) {
        tracing::debug!(%me, is_coordinator, trans_id, key, "delete failed");
    }
}

/// Discards every event — useful in tests that only care about state,
/// not the log stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventLog;

impl EventLog for NullEventLog {
    fn log_node_add(&self, _me: Address, _added: Address) {}
    fn log_node_remove(&self, _me: Address, _removed: Address) {}
    fn log_create_success(&self, _me: Address, _is_coordinator: bool, _trans_id: i64, _key: &str, _value: &str) {}
    fn log_create_fail(&self, _me: Address, _is_coordinator: bool, _trans_id: i64, _key: &str, _value: &str) {}
    fn log_read_success(&self, _me: Address, _is_coordinator: bool, _trans_id: i64, _key: &str, _value: &str) {}
    fn log_read_fail(&self, _me: Address, _is_coordinator: bool, _trans_id: i64, _key: &str) {}
    fn log_update_success(&self, _me: Address, _is_coordinator: bool, _trans_id: i64, _key: &str, _value: &str) {}
    fn log_update_fail(&self, _me: Address, _is_coordinator: bool, _trans_id: i64, _key: &str, _value: &str) {}
    fn log_delete_success(&self, _me: Address, _is_coordinator: bool, _trans_id: i64, _key: &str) {}
    fn log_delete_fail(&self, _me: Address, _is_coordinator: bool, _trans_id: i64, _key: &str) {}
}
