//! Cross-run persistence: the ledger record, its envelope, and save slots.

pub mod checksum;
pub mod codec;
mod logic;
pub mod manager;
pub mod store;
pub mod types;

pub use manager::{LedgerManager, PendingSave};
pub use store::{FileSlotStore, MemorySlotStore, SaveSlotStore};
pub use types::{
    LedgerError, LifetimeStat, LifetimeStatistics, LoadOutcome, PersistenceLedger, RunSnapshot,
};
