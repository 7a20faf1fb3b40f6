//! The owning game session: one run machine, its catalogs and the ledger it
//! checkpoints into.

use crate::core::AtlasConfig;
use crate::ledger::{
    LedgerError, LedgerManager, LifetimeStat, LoadOutcome, PersistenceLedger, SaveSlotStore,
};
use crate::rewards::{CatalogError, RewardCatalog};
use crate::rooms::RoomCatalog;
use crate::run::types::{REASON_PLAYER_DIED, REASON_STATION_DESTROYED};
use crate::run::{Collaborators, RunError, RunEvent, RunOutcome, RunStateMachine};
use crate::selection::SelectionResult;
use rand::Rng;
use tracing::{info, warn};

/// How [`GameSession::start_run`] began the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStart {
    Fresh,
    Resumed { level: u32 },
}

pub struct GameSession<S: SaveSlotStore> {
    config: AtlasConfig,
    rewards: RewardCatalog,
    machine: RunStateMachine,
    ledger: PersistenceLedger,
    manager: LedgerManager<S>,
    load_outcome: LoadOutcome,
}

impl<S: SaveSlotStore> GameSession<S> {
    /// Loads the ledger from `store` and equips the saved loadout, or the
    /// catalog's default loadout when nothing was saved.
    pub fn new(
        config: AtlasConfig,
        rewards: RewardCatalog,
        rooms: &RoomCatalog,
        collaborators: Collaborators,
        store: S,
    ) -> Self {
        let machine = RunStateMachine::new(&config, rooms, collaborators);
        let manager = LedgerManager::new(store, rooms.total_rooms() as u32)
            .with_max_slots(config.slots.max_slots);
        let (ledger, load_outcome) = manager.load();

        let mut session = Self {
            config,
            rewards,
            machine,
            ledger,
            manager,
            load_outcome,
        };
        session.restore_loadout();
        // Startup equips are not gameplay notifications.
        session.machine.drain_events();
        session
    }

    /// Re-equips the ledger's loadout, falling back to the default loadout
    /// when none has been saved.
    fn restore_loadout(&mut self) {
        let inventory = self.machine.inventory_mut();
        if self.ledger.equipped_rewards.is_empty() {
            inventory.reset_to_loadout(&self.rewards.default_loadout());
        } else {
            let restored = self.ledger.restore_loadout(&self.rewards, inventory);
            info!(restored, "saved loadout restored");
        }
    }

    /// Built-in catalogs, default configuration and headless collaborators.
    pub fn headless(store: S) -> Result<Self, CatalogError> {
        let rewards = RewardCatalog::builtin();
        let rooms = RoomCatalog::builtin(&rewards)?;
        Ok(Self::new(
            AtlasConfig::default(),
            rewards,
            &rooms,
            Collaborators::default(),
            store,
        ))
    }

    // ── Run control ─────────────────────────────────────────────────

    /// Resumes the saved run if there is one, otherwise starts fresh.
    pub fn start_run<R: Rng>(&mut self, rng: &mut R) -> Result<RunStart, RunError> {
        if !self.machine.is_run_active() {
            if let Some(saved) = self.ledger.resume_point(self.machine.total_rooms()) {
                match self.machine.resume_run(&saved, rng) {
                    Ok(()) => {
                        return Ok(RunStart::Resumed {
                            level: saved.current_level,
                        })
                    }
                    Err(err) => {
                        warn!(%err, "saved run could not be resumed, starting fresh");
                        self.ledger.clear_current_run();
                    }
                }
            }
        }
        self.start_new_run(rng)?;
        Ok(RunStart::Fresh)
    }

    /// Starts a fresh run, discarding any saved run in progress.
    pub fn start_new_run<R: Rng>(&mut self, rng: &mut R) -> Result<(), RunError> {
        self.ledger.clear_current_run();
        let started = self.machine.start_new_run(rng);
        self.pump();
        started
    }

    /// Advances the run and applies checkpoints for whatever happened.
    pub fn tick<R: Rng>(&mut self, delta_ms: u64, rng: &mut R) -> Vec<RunEvent> {
        let events = self.machine.tick(delta_ms, rng);
        self.apply_checkpoints(&events);
        events
    }

    /// Drains notifications raised by direct calls on the machine (reward
    /// choices, gameplay reports) and applies their checkpoints.
    pub fn pump(&mut self) -> Vec<RunEvent> {
        let events = self.machine.drain_events();
        self.apply_checkpoints(&events);
        events
    }

    fn apply_checkpoints(&mut self, events: &[RunEvent]) {
        let mut dirty = false;
        for event in events {
            match event {
                RunEvent::RewardResolved(completed) => {
                    if let (SelectionResult::Selected, Some(tag)) =
                        (completed.result, completed.reward.as_ref())
                    {
                        self.ledger.unlock_reward(tag);
                    }
                }
                RunEvent::RoomCompleted { .. } => {
                    // The final room ends the run in the same step; the
                    // terminal event below handles it.
                    if let Some(progress) = self.machine.progress() {
                        self.ledger.save_run_progress(&progress);
                        dirty = true;
                    }
                }
                RunEvent::RunCompleted(outcome) => {
                    self.record_outcome(outcome);
                    self.ledger.save_loadout(self.machine.inventory());
                    dirty = true;
                }
                RunEvent::RunFailed(outcome) => {
                    self.record_outcome(outcome);
                    match outcome.reason.as_str() {
                        REASON_PLAYER_DIED => self.ledger.increment_stat(LifetimeStat::Deaths),
                        REASON_STATION_DESTROYED => {
                            self.ledger.increment_stat(LifetimeStat::StationDestructions)
                        }
                        _ => {}
                    }
                    // Rewards picked up during a failed run are lost.
                    self.restore_loadout();
                    dirty = true;
                }
                _ => {}
            }
        }
        if dirty {
            self.checkpoint();
        }
    }

    fn record_outcome(&mut self, outcome: &RunOutcome) {
        self.ledger.clear_current_run();
        if !outcome.run_id.is_nil() {
            self.ledger.apply_run_statistics(&outcome.progress);
        }
    }

    /// Saves, logging instead of failing. Returns whether the save landed.
    pub fn checkpoint(&mut self) -> bool {
        match self.manager.save(&mut self.ledger) {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "checkpoint save failed");
                false
            }
        }
    }

    pub fn save(&mut self) -> Result<(), LedgerError> {
        self.manager.save(&mut self.ledger)
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    pub fn rewards(&self) -> &RewardCatalog {
        &self.rewards
    }

    pub fn machine(&self) -> &RunStateMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut RunStateMachine {
        &mut self.machine
    }

    pub fn ledger(&self) -> &PersistenceLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut PersistenceLedger {
        &mut self.ledger
    }

    pub fn manager(&self) -> &LedgerManager<S> {
        &self.manager
    }

    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.load_outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemorySlotStore;
    use crate::rewards::RewardTag;
    use crate::run::RunState;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_fresh_session_equips_default_loadout() {
        let session = GameSession::headless(MemorySlotStore::new()).unwrap();
        assert_eq!(session.load_outcome(), &LoadOutcome::Fresh);
        assert!(session
            .machine()
            .inventory()
            .is_equipped(&RewardTag::new("Reward.Defense.ImprovedBlock")));
    }

    #[test]
    fn test_death_is_counted_and_saved() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut session = GameSession::headless(MemorySlotStore::new()).unwrap();
        assert_eq!(session.start_run(&mut rng).unwrap(), RunStart::Fresh);
        assert!(session.machine().is_run_active());

        session.machine_mut().report_player_health(0.0);
        session.pump();

        assert_eq!(session.machine().state(), RunState::RunFailed);
        assert_eq!(session.ledger().lifetime.total_deaths, 1);
        assert!(!session.ledger().has_run_in_progress());
        assert!(session.manager().save_exists());
    }
}
