//! The equipped-reward slot inventory.

pub mod inventory;
pub mod types;

pub use inventory::SlotInventory;
pub use types::{AbilityLink, EquippedReward, SavedReward, SlotError, SlotEvent, StackEntry};
