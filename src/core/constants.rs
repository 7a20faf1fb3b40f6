// Tick and timing
pub const TICK_INTERVAL_MS: u64 = 100;
pub const COMBAT_START_DELAY_MS: u64 = 3_000;
pub const VICTORY_DELAY_MS: u64 = 2_000;
pub const ROOM_TRANSITION_MS: u64 = 2_000;
pub const SELECTION_TIMEOUT_MS: u64 = 30_000;

// Slot inventory
pub const DEFAULT_MAX_SLOTS: usize = 6;
pub const MIN_SLOT_COST: u8 = 1;
pub const MAX_SLOT_COST: u8 = 3;
pub const MIN_STACK_LEVEL: u8 = 1;
pub const MAX_STACK_LEVEL: u8 = 5;

// Room and reward pools
pub const DEFAULT_REWARD_CHOICE_COUNT: usize = 2;
pub const DEFAULT_BONUS_REWARD_CHANCE: f32 = 0.1;
pub const MIN_SELECTION_WEIGHT: f32 = 0.1;
pub const MAX_SELECTION_WEIGHT: f32 = 10.0;
pub const UNLIMITED_APPEARANCES: u32 = 999;
pub const MIN_ENEMY_BASE_POWER: u32 = 1;
pub const MAX_ENEMY_BASE_POWER: u32 = 10;

// Run progress
pub const STARTING_LEVEL: u32 = 1;
pub const FULL_HEALTH: f32 = 100.0;
pub const FULL_INTEGRITY: f32 = 100.0;

// Ledger
pub const LEDGER_SCHEMA_VERSION: u32 = 2;
pub const LEDGER_MAGIC: u64 = 0x4154_4C41_5352_554E; // "ATLASRUN"
pub const LEDGER_SLOT_NAME: &str = "atlas_progress";
pub const MAX_SAVED_REWARDS: usize = 100;
pub const MAX_PERCENT: f32 = 100.0;
