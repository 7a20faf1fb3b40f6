use crate::core::constants::{MAX_SLOT_COST, MAX_STACK_LEVEL, MIN_SLOT_COST, MIN_STACK_LEVEL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("duplicate entry '{0}'")]
    Duplicate(String),
    #[error("reward '{tag}': {reason}")]
    InvalidReward { tag: RewardTag, reason: String },
    #[error("room '{room}' references unknown reward '{tag}'")]
    UnknownReward { room: String, tag: RewardTag },
    #[error("room '{room}': {reason}")]
    InvalidRoom { room: String, reason: String },
}

/// Stable identifier of a reward, e.g. `Reward.Defense.ParryMaster`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardTag(String);

impl RewardTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RewardTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RewardTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RewardCategory {
    Defense,
    Offense,
    PassiveStats,
    PassiveAbility,
    Interactable,
}

impl RewardCategory {
    pub const ALL: [RewardCategory; 5] = [
        RewardCategory::Defense,
        RewardCategory::Offense,
        RewardCategory::PassiveStats,
        RewardCategory::PassiveAbility,
        RewardCategory::Interactable,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            RewardCategory::Defense => "Defense",
            RewardCategory::Offense => "Offense",
            RewardCategory::PassiveStats => "Passive Stats",
            RewardCategory::PassiveAbility => "Passive Ability",
            RewardCategory::Interactable => "Interactable",
        }
    }
}

/// Immutable catalog entry. Loaded once, shared behind `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardDescriptor {
    pub tag: RewardTag,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub category: RewardCategory,
    pub slot_cost: u8,
    pub max_stack_level: u8,
    /// Multiplier applied at stack level `i + 1`.
    #[serde(default)]
    pub stack_multipliers: Vec<f32>,
    #[serde(default)]
    pub stat_modifiers: BTreeMap<String, f32>,
    #[serde(default)]
    pub incompatible_with: Vec<RewardTag>,
    /// Action or ability tag the reward binds while equipped, e.g. `Action.Combat.Block`.
    #[serde(default)]
    pub linked_action: Option<String>,
}

impl RewardDescriptor {
    /// Multiplier for a stack level. Levels past the table reuse its last
    /// entry; an empty table means no scaling.
    pub fn stack_multiplier(&self, stack_level: u8) -> f32 {
        if self.stack_multipliers.is_empty() {
            return 1.0;
        }
        let last = self.stack_multipliers.len() - 1;
        let index = (stack_level.saturating_sub(1) as usize).min(last);
        self.stack_multipliers[index]
    }

    pub fn is_incompatible_with(&self, other: &RewardTag) -> bool {
        self.incompatible_with.contains(other)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: String| CatalogError::InvalidReward {
            tag: self.tag.clone(),
            reason,
        };
        if self.tag.as_str().is_empty() {
            return Err(invalid("empty tag".into()));
        }
        if !(MIN_SLOT_COST..=MAX_SLOT_COST).contains(&self.slot_cost) {
            return Err(invalid(format!(
                "slot cost {} outside {}..={}",
                self.slot_cost, MIN_SLOT_COST, MAX_SLOT_COST
            )));
        }
        if !(MIN_STACK_LEVEL..=MAX_STACK_LEVEL).contains(&self.max_stack_level) {
            return Err(invalid(format!(
                "max stack level {} outside {}..={}",
                self.max_stack_level, MIN_STACK_LEVEL, MAX_STACK_LEVEL
            )));
        }
        if self.incompatible_with.contains(&self.tag) {
            return Err(invalid("incompatible with itself".into()));
        }
        Ok(())
    }
}
