use crate::core::constants::{FULL_HEALTH, FULL_INTEGRITY, LEDGER_SCHEMA_VERSION};
use crate::rewards::RewardTag;
use crate::rooms::RoomId;
use crate::run::{RunProgress, RunStatistics};
use crate::slots::SavedReward;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Encode(#[from] bincode::Error),
    #[error("corrupted save: {0}")]
    Corrupted(String),
    #[error("save version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("checksum mismatch (stored {stored:#010x}, computed {computed:#010x})")]
    ChecksumMismatch { stored: u32, computed: u32 },
    #[error("field out of range: {0}")]
    OutOfRange(String),
    #[error("a save is already in flight")]
    SaveInFlight,
    #[error("slot '{0}' could not be written")]
    WriteFailed(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// How [`LedgerManager::load`](super::LedgerManager::load) produced its ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing saved yet.
    Fresh,
    Loaded,
    Migrated { from_version: u32 },
    /// The saved ledger failed validation and was replaced with defaults.
    Discarded { reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifetimeStatistics {
    pub total_runs_completed: u32,
    pub highest_room_reached: u32,
    pub best_run_rooms: u32,
    pub total_enemies_defeated: u32,
    pub total_damage_dealt: f32,
    pub total_damage_taken: f32,
    pub perfect_parries: u32,
    pub successful_blocks: u32,
    pub total_deaths: u32,
    pub station_destructions: u32,
    pub fastest_run_ms: Option<u64>,
}

/// Named lifetime counters for [`PersistenceLedger::increment_stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifetimeStat {
    EnemiesDefeated,
    PerfectParries,
    SuccessfulBlocks,
    Deaths,
    StationDestructions,
    RunsCompleted,
}

impl FromStr for LifetimeStat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "enemies" | "enemiesdefeated" => Ok(LifetimeStat::EnemiesDefeated),
            "parries" | "perfectparries" => Ok(LifetimeStat::PerfectParries),
            "blocks" | "successfulblocks" => Ok(LifetimeStat::SuccessfulBlocks),
            "deaths" => Ok(LifetimeStat::Deaths),
            "stationdestructions" => Ok(LifetimeStat::StationDestructions),
            "runs" | "runscompleted" => Ok(LifetimeStat::RunsCompleted),
            other => Err(format!("unknown stat '{other}'")),
        }
    }
}

/// Persisted state of an unfinished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub in_progress: bool,
    pub current_level: u32,
    pub player_health: f32,
    pub station_integrity: f32,
    pub completed_rooms: Vec<RoomId>,
    pub elapsed_ms: u64,
    pub stats: RunStatistics,
}

impl Default for RunSnapshot {
    fn default() -> Self {
        Self {
            in_progress: false,
            current_level: 0,
            player_health: FULL_HEALTH,
            station_integrity: FULL_INTEGRITY,
            completed_rooms: Vec::new(),
            elapsed_ms: 0,
            stats: RunStatistics::default(),
        }
    }
}

impl RunSnapshot {
    pub fn from_progress(progress: &RunProgress) -> Self {
        Self {
            in_progress: true,
            current_level: progress.current_level,
            player_health: progress.player_health,
            station_integrity: progress.station_integrity,
            completed_rooms: progress.completed_rooms.clone(),
            elapsed_ms: progress.elapsed_ms,
            stats: progress.stats.clone(),
        }
    }

    pub fn to_progress(&self, total_rooms: u32) -> RunProgress {
        RunProgress {
            current_level: self.current_level,
            total_rooms,
            player_health: self.player_health,
            station_integrity: self.station_integrity,
            completed_rooms: self.completed_rooms.clone(),
            elapsed_ms: self.elapsed_ms,
            stats: self.stats.clone(),
        }
    }
}

/// Cross-run progression record, one per save slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceLedger {
    pub schema_version: u32,
    pub equipped_rewards: Vec<SavedReward>,
    pub unlocked_rewards: BTreeMap<RewardTag, u32>,
    pub lifetime: LifetimeStatistics,
    pub current_run: RunSnapshot,
    /// Unix seconds of the last successful save.
    pub last_save_time: i64,
    pub checksum: u32,
}

impl Default for PersistenceLedger {
    fn default() -> Self {
        Self::new()
    }
}

// ── Version 1 layout ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct LifetimeStatisticsV1 {
    pub total_runs_completed: u32,
    pub highest_room_reached: u32,
    pub total_enemies_defeated: u32,
    pub total_damage_dealt: f32,
    pub perfect_parries: u32,
    pub total_deaths: u32,
}

/// Version 1 ledgers predate unlock tracking and the extended counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct LedgerV1 {
    pub equipped_rewards: Vec<SavedReward>,
    pub lifetime: LifetimeStatisticsV1,
    pub current_run: RunSnapshot,
    pub last_save_time: i64,
    pub checksum: u32,
}

impl From<LedgerV1> for PersistenceLedger {
    fn from(old: LedgerV1) -> Self {
        Self {
            schema_version: LEDGER_SCHEMA_VERSION,
            equipped_rewards: old.equipped_rewards,
            unlocked_rewards: BTreeMap::new(),
            lifetime: LifetimeStatistics {
                total_runs_completed: old.lifetime.total_runs_completed,
                highest_room_reached: old.lifetime.highest_room_reached,
                best_run_rooms: old.lifetime.highest_room_reached,
                total_enemies_defeated: old.lifetime.total_enemies_defeated,
                total_damage_dealt: old.lifetime.total_damage_dealt,
                perfect_parries: old.lifetime.perfect_parries,
                total_deaths: old.lifetime.total_deaths,
                ..LifetimeStatistics::default()
            },
            current_run: old.current_run,
            last_save_time: old.last_save_time,
            checksum: 0,
        }
    }
}
