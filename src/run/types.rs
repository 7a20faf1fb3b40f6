use crate::core::constants::{FULL_HEALTH, FULL_INTEGRITY, STARTING_LEVEL};
use crate::rewards::RewardTag;
use crate::rooms::RoomId;
use crate::selection::{SelectionCompleted, SelectionError};
use crate::slots::{SavedReward, SlotEvent};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub const REASON_NO_ROOMS: &str = "No rooms available";
pub const REASON_ROOM_SELECTION_FAILED: &str = "Room selection failed";
pub const REASON_ENEMY_SPAWN_FAILED: &str = "Enemy spawn failed";
pub const REASON_PLAYER_DIED: &str = "Player health depleted";
pub const REASON_STATION_DESTROYED: &str = "Station integrity reached zero";
pub const REASON_ABANDONED: &str = "Run abandoned by player";
pub const REASON_ALL_ROOMS_COMPLETED: &str = "All rooms completed!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    PreRun,
    RoomIntro,
    Combat,
    Victory,
    RewardSelection,
    RoomComplete,
    RunComplete,
    RunFailed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::RunComplete | RunState::RunFailed)
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, RunState::PreRun) && !self.is_terminal()
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::PreRun => "Pre-Run",
            RunState::RoomIntro => "Room Intro",
            RunState::Combat => "Combat",
            RunState::Victory => "Victory",
            RunState::RewardSelection => "Reward Selection",
            RunState::RoomComplete => "Room Complete",
            RunState::RunComplete => "Run Complete",
            RunState::RunFailed => "Run Failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("no rooms available")]
    NoRooms,
    #[error("no run is active")]
    NotActive,
    #[error("expected state {expected}, run is in {actual}")]
    InvalidState { expected: RunState, actual: RunState },
    #[error("cannot resume: {0}")]
    InvalidResume(String),
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

pub type Result<T> = std::result::Result<T, RunError>;

/// Counters accumulated over one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub enemies_defeated: u32,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub perfect_parries: u32,
    pub successful_blocks: u32,
}

/// Point-in-time view of a run, sufficient to resume it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunProgress {
    pub current_level: u32,
    pub total_rooms: u32,
    pub player_health: f32,
    pub station_integrity: f32,
    pub completed_rooms: Vec<RoomId>,
    pub elapsed_ms: u64,
    pub stats: RunStatistics,
}

impl RunProgress {
    pub fn new(total_rooms: u32) -> Self {
        Self {
            current_level: STARTING_LEVEL,
            total_rooms,
            player_health: FULL_HEALTH,
            station_integrity: FULL_INTEGRITY,
            completed_rooms: Vec::new(),
            elapsed_ms: 0,
            stats: RunStatistics::default(),
        }
    }

    pub fn rooms_completed(&self) -> u32 {
        self.completed_rooms.len() as u32
    }

    pub fn reached_final_room(&self) -> bool {
        self.total_rooms > 0 && self.rooms_completed() >= self.total_rooms
    }
}

/// How a run ended. Kept after the session is cleared.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub success: bool,
    pub reason: String,
    pub progress: RunProgress,
    /// Loadout to carry into the next run; only set on success.
    pub carried_loadout: Option<Vec<SavedReward>>,
}

/// Opaque handle to a spawned enemy, issued by the room presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnemyHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTimer {
    BeginCombat,
    EnterRewardSelection,
    FinishRoomTransition,
    SelectionTimeout { selection_id: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    RunStarted {
        run_id: Uuid,
        total_rooms: u32,
        resumed: bool,
    },
    StateChanged {
        from: RunState,
        to: RunState,
    },
    RoomStarted {
        level: u32,
        room: RoomId,
        placed: String,
    },
    CombatStarted {
        room: RoomId,
        enemy_power: u32,
    },
    RewardsOffered {
        selection_id: u64,
        choices: Vec<RewardTag>,
    },
    SlotChoiceRequired {
        tag: RewardTag,
    },
    RewardResolved(SelectionCompleted),
    RoomCompleted {
        level: u32,
        room: RoomId,
    },
    RunCompleted(RunOutcome),
    RunFailed(RunOutcome),
    Slot(SlotEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_classification() {
        assert!(!RunState::PreRun.is_active());
        assert!(RunState::Combat.is_active());
        assert!(RunState::RunFailed.is_terminal());
        assert!(!RunState::RunFailed.is_active());
    }

    #[test]
    fn test_final_room_reached() {
        let mut progress = RunProgress::new(2);
        assert!(!progress.reached_final_room());
        progress.completed_rooms = vec![RoomId::new("A"), RoomId::new("B")];
        assert!(progress.reached_final_room());
    }
}
