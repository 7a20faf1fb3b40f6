use crate::rewards::RewardTag;
use crate::slots::SlotError;
use std::fmt;
use thiserror::Error;

/// Terminal outcome of one reward selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionResult {
    Selected,
    Skipped,
    Cancelled,
    TimedOut,
}

/// What a choice did to the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceOutcome {
    Enhanced { tag: RewardTag, stack_level: u8 },
    Equipped { tag: RewardTag, slot: usize },
    /// No automatic placement exists; the player must pick a slot.
    AwaitingSlot { tag: RewardTag },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no selection is active")]
    NotActive,
    #[error("a selection is already active")]
    AlreadyActive,
    #[error("no rewards to present")]
    NoChoices,
    #[error("{0} was not offered")]
    NotOffered(RewardTag),
    #[error("no reward is waiting for a slot")]
    NoPendingReward,
    #[error("skipping is disabled")]
    SkipNotAllowed,
    #[error(transparent)]
    Slot(#[from] SlotError),
}

pub type Result<T> = std::result::Result<T, SelectionError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCompleted {
    pub selection_id: u64,
    pub result: SelectionResult,
    pub reward: Option<RewardTag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    Presented {
        selection_id: u64,
        choices: Vec<RewardTag>,
        timeout_ms: u64,
    },
    AwaitingSlot {
        selection_id: u64,
        tag: RewardTag,
    },
    Completed(SelectionCompleted),
}

/// Before/after summary shown next to an offered reward.
#[derive(Debug, Clone, PartialEq)]
pub enum RewardComparison {
    Enhance {
        from_level: u8,
        to_level: u8,
        from_multiplier: f32,
        to_multiplier: f32,
    },
    New {
        slot_cost: u8,
        available: usize,
    },
    AtMaxStack {
        stack_level: u8,
    },
}

impl fmt::Display for RewardComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewardComparison::Enhance {
                from_level,
                to_level,
                from_multiplier,
                to_multiplier,
            } => write!(
                f,
                "Enhance: Level {from_level} -> {to_level}\nEffect: x{from_multiplier:.1} -> x{to_multiplier:.1}"
            ),
            RewardComparison::New {
                slot_cost,
                available,
            } => {
                write!(f, "New Reward\nSlot Cost: {slot_cost}")?;
                if *available < *slot_cost as usize {
                    write!(f, "\nNot enough slots (have {available})")?;
                }
                Ok(())
            }
            RewardComparison::AtMaxStack { stack_level } => {
                write!(f, "Already at max level {stack_level}")
            }
        }
    }
}
