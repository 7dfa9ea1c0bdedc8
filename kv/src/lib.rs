//! Quorum-replicated key-value layer on top of the consistent-hash
//! ring (§4.4, §4.5, §4.6).

mod constants;
mod coordinator;
mod replica;
mod stabilization;
mod store;
mod transaction;

pub use constants::T_TRANSACTION;
pub use coordinator::Coordinator;
pub use replica::ReplicaServer;
pub use stabilization::Stabilization;
pub use store::{InMemoryStore, LocalStore};
pub use transaction::{Kind, Transaction, TransactionTable};
