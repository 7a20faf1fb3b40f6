//! Room descriptors, the built-in station layout and per-run room sequencing.

pub mod catalog;
pub mod data;
pub mod sequencer;
pub mod types;

pub use catalog::{RoomCatalog, RoomCatalogFile};
pub use sequencer::{weighted_index, RoomSequencer};
pub use types::{
    PlacedRoom, RewardPoolDef, RewardPoolEntry, RoomDefinition, RoomDescriptor, RoomDifficulty,
    RoomHazard, RoomId,
};
