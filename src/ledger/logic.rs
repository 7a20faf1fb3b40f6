use super::checksum::compute_checksum;
use super::types::{
    LedgerError, LifetimeStat, LifetimeStatistics, PersistenceLedger, Result, RunSnapshot,
};
use crate::core::constants::{
    LEDGER_SCHEMA_VERSION, MAX_PERCENT, MAX_SAVED_REWARDS, MAX_STACK_LEVEL,
};
use crate::rewards::{RewardCatalog, RewardTag};
use crate::run::RunProgress;
use crate::slots::SlotInventory;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

impl PersistenceLedger {
    pub fn new() -> Self {
        let mut ledger = Self {
            schema_version: LEDGER_SCHEMA_VERSION,
            equipped_rewards: Vec::new(),
            unlocked_rewards: BTreeMap::new(),
            lifetime: LifetimeStatistics::default(),
            current_run: RunSnapshot::default(),
            last_save_time: 0,
            checksum: 0,
        };
        ledger.refresh_checksum();
        ledger
    }

    pub fn compute_checksum(&self) -> u32 {
        compute_checksum(self)
    }

    pub fn refresh_checksum(&mut self) {
        self.checksum = compute_checksum(self);
    }

    /// Folds one finished run into the lifetime statistics. The run counts
    /// as completed when it cleared the final room.
    pub fn apply_run_statistics(&mut self, progress: &RunProgress) {
        let completed = progress.reached_final_room();
        let stats = &mut self.lifetime;
        let reached = progress.current_level.min(progress.total_rooms);
        stats.highest_room_reached = stats.highest_room_reached.max(reached);
        stats.best_run_rooms = stats.best_run_rooms.max(progress.rooms_completed());
        stats.total_enemies_defeated += progress.stats.enemies_defeated;
        stats.total_damage_dealt += progress.stats.damage_dealt;
        stats.total_damage_taken += progress.stats.damage_taken;
        stats.perfect_parries += progress.stats.perfect_parries;
        stats.successful_blocks += progress.stats.successful_blocks;

        if completed {
            stats.total_runs_completed += 1;
            stats.fastest_run_ms = Some(match stats.fastest_run_ms {
                Some(best) => best.min(progress.elapsed_ms),
                None => progress.elapsed_ms,
            });
        }
        debug!(
            completed,
            reached,
            runs = stats.total_runs_completed,
            "run statistics applied"
        );
    }

    /// Returns how many times the reward has now been unlocked.
    pub fn unlock_reward(&mut self, tag: &RewardTag) -> u32 {
        let count = self.unlocked_rewards.entry(tag.clone()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn is_reward_unlocked(&self, tag: &RewardTag) -> bool {
        self.unlocked_rewards.contains_key(tag)
    }

    pub fn increment_stat(&mut self, stat: LifetimeStat) {
        let stats = &mut self.lifetime;
        match stat {
            LifetimeStat::EnemiesDefeated => stats.total_enemies_defeated += 1,
            LifetimeStat::PerfectParries => stats.perfect_parries += 1,
            LifetimeStat::SuccessfulBlocks => stats.successful_blocks += 1,
            LifetimeStat::Deaths => stats.total_deaths += 1,
            LifetimeStat::StationDestructions => stats.station_destructions += 1,
            LifetimeStat::RunsCompleted => stats.total_runs_completed += 1,
        }
    }

    pub fn save_loadout(&mut self, inventory: &SlotInventory) {
        self.equipped_rewards = inventory.snapshot();
    }

    /// Re-equips the saved loadout into `inventory`, which is cleared first.
    ///
    /// Unknown tags are skipped. A reward whose saved slot is no longer usable
    /// falls back to the best free slot. Returns the number restored.
    pub fn restore_loadout(&self, catalog: &RewardCatalog, inventory: &mut SlotInventory) -> usize {
        inventory.clear_all();

        let mut saved: Vec<_> = self.equipped_rewards.iter().collect();
        saved.sort_by_key(|entry| entry.slot_index);

        let mut restored = 0;
        for entry in saved {
            let Some(reward) = catalog.get(&entry.tag) else {
                warn!(tag = %entry.tag, "saved reward not in catalog, skipped");
                continue;
            };
            if inventory.equip(reward, entry.slot_index).is_err() {
                let fallback = inventory
                    .find_best_slot(reward)
                    .map(|slot| inventory.equip(reward, slot));
                if !matches!(fallback, Some(Ok(()))) {
                    warn!(tag = %entry.tag, slot = entry.slot_index, "saved reward does not fit, skipped");
                    continue;
                }
            }
            for _ in 1..entry.stack_level {
                if inventory.enhance(&entry.tag).is_err() {
                    break;
                }
            }
            restored += 1;
        }
        restored
    }

    pub fn save_run_progress(&mut self, progress: &RunProgress) {
        self.current_run = RunSnapshot::from_progress(progress);
    }

    pub fn clear_current_run(&mut self) {
        self.current_run = RunSnapshot::default();
    }

    pub fn has_run_in_progress(&self) -> bool {
        self.current_run.in_progress
    }

    /// Progress to hand to `RunStateMachine::resume_run`, if a run was saved.
    pub fn resume_point(&self, total_rooms: u32) -> Option<RunProgress> {
        self.current_run
            .in_progress
            .then(|| self.current_run.to_progress(total_rooms))
    }

    /// Range and version checks applied after decoding. `max_slots` bounds
    /// the saved slot indices.
    pub fn validate(&self, total_rooms: u32, max_slots: usize) -> Result<()> {
        if self.schema_version > LEDGER_SCHEMA_VERSION {
            return Err(LedgerError::UnsupportedVersion {
                found: self.schema_version,
                supported: LEDGER_SCHEMA_VERSION,
            });
        }
        if self.equipped_rewards.len() > MAX_SAVED_REWARDS {
            return Err(LedgerError::OutOfRange(format!(
                "{} equipped rewards (max {MAX_SAVED_REWARDS})",
                self.equipped_rewards.len()
            )));
        }
        let mut used_slots = HashSet::new();
        let mut seen_tags = HashSet::new();
        for entry in &self.equipped_rewards {
            if !(1..=MAX_STACK_LEVEL).contains(&entry.stack_level) {
                return Err(LedgerError::OutOfRange(format!(
                    "reward {} has stack level {} (max {MAX_STACK_LEVEL})",
                    entry.tag, entry.stack_level
                )));
            }
            if entry.slot_index >= max_slots {
                return Err(LedgerError::OutOfRange(format!(
                    "reward {} in slot {} of {max_slots}",
                    entry.tag, entry.slot_index
                )));
            }
            if !used_slots.insert(entry.slot_index) {
                return Err(LedgerError::OutOfRange(format!(
                    "slot {} saved twice",
                    entry.slot_index
                )));
            }
            if !seen_tags.insert(&entry.tag) {
                return Err(LedgerError::OutOfRange(format!(
                    "reward {} saved twice",
                    entry.tag
                )));
            }
        }

        let run = &self.current_run;
        if !(0.0..=MAX_PERCENT).contains(&run.player_health) {
            return Err(LedgerError::OutOfRange(format!(
                "player health {}",
                run.player_health
            )));
        }
        if !(0.0..=MAX_PERCENT).contains(&run.station_integrity) {
            return Err(LedgerError::OutOfRange(format!(
                "station integrity {}",
                run.station_integrity
            )));
        }
        if run.current_level > total_rooms {
            return Err(LedgerError::OutOfRange(format!(
                "run level {} exceeds {total_rooms} rooms",
                run.current_level
            )));
        }
        Ok(())
    }
}
