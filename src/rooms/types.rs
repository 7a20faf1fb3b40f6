use crate::core::constants::*;
use crate::rewards::{RewardCategory, RewardDescriptor, RewardTag};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoomDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Boss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoomHazard {
    #[default]
    None,
    LowGravity,
    ElectricalSurges,
    HullBreach,
    ToxicLeak,
    SystemMalfunction,
}

impl RoomHazard {
    pub fn display_name(&self) -> &'static str {
        match self {
            RoomHazard::None => "Normal Environment",
            RoomHazard::LowGravity => "Low Gravity",
            RoomHazard::ElectricalSurges => "Electrical Surges",
            RoomHazard::HullBreach => "Hull Breach",
            RoomHazard::ToxicLeak => "Toxic Leak",
            RoomHazard::SystemMalfunction => "System Malfunction",
        }
    }
}

/// One weighted entry of a room's reward pool.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardPoolEntry {
    pub reward: Arc<RewardDescriptor>,
    pub weight: f32,
    pub min_level: u32,
    /// How many times this reward may be offered in a single run.
    pub max_appearances: u32,
}

/// Resolved, immutable room catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomDescriptor {
    pub id: RoomId,
    pub display_name: String,
    pub description: String,
    pub theme: RewardCategory,
    pub difficulty: RoomDifficulty,
    pub hazard: RoomHazard,
    pub eligible_levels: Vec<u32>,
    pub repeatable: bool,
    pub selection_weight: f32,
    pub reward_pool: Vec<RewardPoolEntry>,
    pub guaranteed_reward: Option<Arc<RewardDescriptor>>,
    pub bonus_reward: Option<Arc<RewardDescriptor>>,
    pub bonus_reward_chance: f32,
    pub reward_choice_count: usize,
    pub enemy_class: Option<String>,
    pub enemy_base_power: u32,
}

impl RoomDescriptor {
    pub fn is_eligible_for_level(&self, level: u32) -> bool {
        self.eligible_levels.contains(&level)
    }
}

/// Serialized form of a reward pool entry; rewards are referenced by tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardPoolDef {
    pub reward: RewardTag,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default = "default_min_level")]
    pub min_level: u32,
    #[serde(default = "default_max_appearances")]
    pub max_appearances: u32,
}

/// Serialized form of a room, resolved against a reward catalog on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDefinition {
    pub id: RoomId,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub theme: RewardCategory,
    #[serde(default)]
    pub difficulty: RoomDifficulty,
    #[serde(default)]
    pub hazard: RoomHazard,
    pub eligible_levels: Vec<u32>,
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default = "default_weight")]
    pub selection_weight: f32,
    #[serde(default)]
    pub reward_pool: Vec<RewardPoolDef>,
    #[serde(default)]
    pub guaranteed_reward: Option<RewardTag>,
    #[serde(default)]
    pub bonus_reward: Option<RewardTag>,
    #[serde(default = "default_bonus_chance")]
    pub bonus_reward_chance: f32,
    #[serde(default = "default_choice_count")]
    pub reward_choice_count: usize,
    #[serde(default)]
    pub enemy_class: Option<String>,
    #[serde(default = "default_enemy_power")]
    pub enemy_base_power: u32,
}

fn default_weight() -> f32 {
    1.0
}

fn default_min_level() -> u32 {
    1
}

fn default_max_appearances() -> u32 {
    UNLIMITED_APPEARANCES
}

fn default_bonus_chance() -> f32 {
    DEFAULT_BONUS_REWARD_CHANCE
}

fn default_choice_count() -> usize {
    DEFAULT_REWARD_CHOICE_COUNT
}

fn default_enemy_power() -> u32 {
    MIN_ENEMY_BASE_POWER
}

/// A physical room instance placed in the level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacedRoom {
    pub index: usize,
    pub name: String,
}

impl PlacedRoom {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hazard_display_names() {
        assert_eq!(RoomHazard::None.display_name(), "Normal Environment");
        assert_eq!(RoomHazard::ToxicLeak.display_name(), "Toxic Leak");
    }

    #[test]
    fn test_definition_defaults() {
        let json = r#"{ "id": "Room_X", "display_name": "X", "theme": "Offense", "eligible_levels": [1] }"#;
        let def: RoomDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.selection_weight, 1.0);
        assert_eq!(def.reward_choice_count, 2);
        assert_eq!(def.bonus_reward_chance, 0.1);
        assert_eq!(def.hazard, RoomHazard::None);
        assert!(!def.repeatable);
    }
}
