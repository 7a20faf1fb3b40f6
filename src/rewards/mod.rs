//! Reward descriptors and the catalog they are loaded into.

pub mod catalog;
pub mod data;
pub mod types;

pub use catalog::RewardCatalog;
pub use types::{CatalogError, RewardCategory, RewardDescriptor, RewardTag};
