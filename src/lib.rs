//! Atlas Run - roguelite run progression library
//!
//! Drives a run through a fixed sequence of rooms, offers weighted rewards
//! after each fight, manages the slot-limited loadout and persists progress
//! between sessions.

pub mod console;
pub mod core;
pub mod ledger;
pub mod rewards;
pub mod rooms;
pub mod run;
pub mod selection;
pub mod session;
pub mod slots;
