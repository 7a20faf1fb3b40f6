//! The run lifecycle: room sequencing, combat hand-off, reward choice and
//! terminal outcomes.

pub mod collaborators;
pub mod machine;
pub mod types;

pub use collaborators::{
    Collaborators, DifficultyScaler, HeadlessRewards, HeadlessRooms, RewardPresenter,
    RoomPresenter, SlotScaledDifficulty, SpawnRequest,
};
pub use machine::RunStateMachine;
pub use types::{
    EnemyHandle, RunError, RunEvent, RunOutcome, RunProgress, RunState, RunStatistics, RunTimer,
};
