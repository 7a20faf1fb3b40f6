use crate::rewards::{RewardDescriptor, RewardTag};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Why a slot operation was rejected. The inventory is unchanged whenever one
/// of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("slot {index} is out of range (0..{max_slots})")]
    InvalidSlot { index: usize, max_slots: usize },
    #[error("slot {0} is already occupied")]
    SlotOccupied(usize),
    #[error("slot {0} is empty")]
    SlotEmpty(usize),
    #[error("{0} is already equipped, enhance it instead")]
    AlreadyEquipped(RewardTag),
    #[error("{0} is not equipped")]
    NotEquipped(RewardTag),
    #[error("{0} is already at max stack level")]
    MaxStack(RewardTag),
    #[error("not enough slots (requires {required}, have {available})")]
    InsufficientCapacity { required: usize, available: usize },
    #[error("{reward} is incompatible with equipped {equipped}")]
    Incompatible { reward: RewardTag, equipped: RewardTag },
}

pub type Result<T> = std::result::Result<T, SlotError>;

#[derive(Debug, Clone, PartialEq)]
pub struct EquippedReward {
    pub reward: Arc<RewardDescriptor>,
    pub stack_level: u8,
    pub slot_index: usize,
}

impl EquippedReward {
    pub fn tag(&self) -> &RewardTag {
        &self.reward.tag
    }

    pub fn is_max_stack(&self) -> bool {
        self.stack_level >= self.reward.max_stack_level
    }

    pub fn multiplier(&self) -> f32 {
        self.reward.stack_multiplier(self.stack_level)
    }
}

/// Entry in the tag lookup kept alongside the slot array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackEntry {
    pub slot_index: usize,
    pub stack_level: u8,
}

/// An action or ability bound by an equipped reward.
#[derive(Debug, Clone, PartialEq)]
pub struct AbilityLink {
    pub reward: RewardTag,
    pub ability: String,
    pub stack_level: u8,
    pub multiplier: f32,
}

/// Serializable view of one occupied slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedReward {
    pub tag: RewardTag,
    pub stack_level: u8,
    pub slot_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlotEvent {
    Equipped {
        slot: usize,
        tag: RewardTag,
    },
    Removed {
        slot: usize,
        tag: RewardTag,
    },
    Enhanced {
        slot: usize,
        tag: RewardTag,
        stack_level: u8,
    },
    Swapped {
        a: usize,
        b: usize,
    },
}
