//! Post-combat reward choice and its routing into the slot inventory.

pub mod flow;
pub mod types;

pub use flow::RewardSelectionFlow;
pub use types::{
    ChoiceOutcome, RewardComparison, SelectionCompleted, SelectionError, SelectionEvent,
    SelectionResult,
};
