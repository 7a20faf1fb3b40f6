//! Shared plumbing: tunables, configuration, the timer scheduler and the
//! notification queue every domain module emits into.

pub mod config;
pub mod constants;
pub mod events;
pub mod logging;
pub mod scheduler;

pub use config::{AtlasConfig, ConfigError, RunTiming, SelectionConfig, SlotConfig};
pub use constants::*;
pub use events::EventQueue;
pub use scheduler::{Scheduler, TimerHandle};
