use super::codec;
use super::store::SaveSlotStore;
use super::types::{LedgerError, LoadOutcome, PersistenceLedger, Result};
use crate::core::constants::{DEFAULT_MAX_SLOTS, LEDGER_SLOT_NAME};
use tracing::{debug, info, warn};

/// Encoded ledger waiting to be written by [`LedgerManager::finish_save`].
#[derive(Debug)]
#[must_use = "a pending save keeps the manager locked until finished"]
pub struct PendingSave {
    bytes: Vec<u8>,
}

impl PendingSave {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Loads and saves a [`PersistenceLedger`] through a [`SaveSlotStore`].
///
/// Saves are single-flight: between `begin_save` and `finish_save` any
/// further `begin_save` is rejected.
pub struct LedgerManager<S: SaveSlotStore> {
    store: S,
    slot_name: String,
    total_rooms: u32,
    max_slots: usize,
    save_in_flight: bool,
}

impl<S: SaveSlotStore> LedgerManager<S> {
    pub fn new(store: S, total_rooms: u32) -> Self {
        Self::with_slot(store, LEDGER_SLOT_NAME, total_rooms)
    }

    pub fn with_slot(store: S, slot_name: &str, total_rooms: u32) -> Self {
        Self {
            store,
            slot_name: slot_name.to_string(),
            total_rooms,
            max_slots: DEFAULT_MAX_SLOTS,
            save_in_flight: false,
        }
    }

    /// Slot count saved loadouts are checked against on load.
    pub fn with_max_slots(mut self, max_slots: usize) -> Self {
        self.max_slots = max_slots;
        self
    }

    pub fn slot_name(&self) -> &str {
        &self.slot_name
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn is_save_in_flight(&self) -> bool {
        self.save_in_flight
    }

    pub fn save_exists(&self) -> bool {
        self.store.read_slot(&self.slot_name).is_some()
    }

    /// Never fails: unreadable or invalid data yields a fresh ledger and a
    /// [`LoadOutcome::Discarded`] describing why.
    pub fn load(&self) -> (PersistenceLedger, LoadOutcome) {
        let Some(bytes) = self.store.read_slot(&self.slot_name) else {
            debug!(slot = %self.slot_name, "no saved ledger");
            return (PersistenceLedger::new(), LoadOutcome::Fresh);
        };

        let decoded = codec::decode(&bytes).and_then(|(ledger, version)| {
            ledger.validate(self.total_rooms, self.max_slots)?;
            Ok((ledger, version))
        });

        match decoded {
            Ok((ledger, version)) if version < ledger.schema_version => {
                info!(from = version, to = ledger.schema_version, "ledger migrated");
                (ledger, LoadOutcome::Migrated { from_version: version })
            }
            Ok((ledger, _)) => {
                debug!(
                    runs = ledger.lifetime.total_runs_completed,
                    equipped = ledger.equipped_rewards.len(),
                    "ledger loaded"
                );
                (ledger, LoadOutcome::Loaded)
            }
            Err(err) => {
                warn!(slot = %self.slot_name, %err, "saved ledger discarded");
                (
                    PersistenceLedger::new(),
                    LoadOutcome::Discarded {
                        reason: err.to_string(),
                    },
                )
            }
        }
    }

    /// Stamps save time and checksum, then encodes. Locks the manager until
    /// [`finish_save`](Self::finish_save).
    pub fn begin_save(&mut self, ledger: &mut PersistenceLedger) -> Result<PendingSave> {
        if self.save_in_flight {
            return Err(LedgerError::SaveInFlight);
        }
        ledger.last_save_time = chrono::Utc::now().timestamp();
        ledger.refresh_checksum();
        let bytes = codec::encode(ledger)?;
        self.save_in_flight = true;
        Ok(PendingSave { bytes })
    }

    /// Writes the pending bytes and releases the lock, even on failure.
    pub fn finish_save(&mut self, pending: PendingSave) -> Result<()> {
        self.save_in_flight = false;
        if !self.store.write_slot(&self.slot_name, &pending.bytes) {
            return Err(LedgerError::WriteFailed(self.slot_name.clone()));
        }
        debug!(slot = %self.slot_name, bytes = pending.bytes.len(), "ledger saved");
        Ok(())
    }

    pub fn save(&mut self, ledger: &mut PersistenceLedger) -> Result<()> {
        let pending = self.begin_save(ledger)?;
        self.finish_save(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::store::MemorySlotStore;

    fn manager() -> LedgerManager<MemorySlotStore> {
        LedgerManager::new(MemorySlotStore::new(), 5)
    }

    #[test]
    fn test_load_without_save_is_fresh() {
        let (ledger, outcome) = manager().load();
        assert_eq!(outcome, LoadOutcome::Fresh);
        assert_eq!(ledger, PersistenceLedger::new());
    }

    #[test]
    fn test_save_then_load() {
        let mut manager = manager();
        let mut ledger = PersistenceLedger::new();
        ledger.lifetime.total_runs_completed = 2;
        manager.save(&mut ledger).unwrap();
        assert!(ledger.last_save_time > 0);

        let (loaded, outcome) = manager.load();
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert_eq!(loaded, ledger);
    }

    #[test]
    fn test_single_flight() {
        let mut manager = manager();
        let mut ledger = PersistenceLedger::new();
        let pending = manager.begin_save(&mut ledger).unwrap();
        assert!(manager.is_save_in_flight());
        assert!(matches!(
            manager.begin_save(&mut ledger),
            Err(LedgerError::SaveInFlight)
        ));
        manager.finish_save(pending).unwrap();
        assert!(!manager.is_save_in_flight());
        assert!(manager.begin_save(&mut ledger).is_ok());
    }

    #[test]
    fn test_failed_write_releases_lock() {
        let mut manager = manager();
        manager.store_mut().set_fail_writes(true);
        let mut ledger = PersistenceLedger::new();
        assert!(matches!(
            manager.save(&mut ledger),
            Err(LedgerError::WriteFailed(_))
        ));
        assert!(!manager.is_save_in_flight());
        assert!(!manager.save_exists());
    }

    #[test]
    fn test_out_of_range_level_discarded() {
        let mut manager = LedgerManager::new(MemorySlotStore::new(), 10);
        let mut ledger = PersistenceLedger::new();
        ledger.current_run.in_progress = true;
        ledger.current_run.current_level = 8;
        manager.save(&mut ledger).unwrap();

        let strict = LedgerManager::new(manager.store().clone(), 5);
        let (loaded, outcome) = strict.load();
        assert!(matches!(outcome, LoadOutcome::Discarded { .. }));
        assert!(!loaded.current_run.in_progress);
    }
}
