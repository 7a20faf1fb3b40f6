//! Interfaces to the presentation side of the game. The run machine only
//! calls these; it never reaches into actors, widgets or AI directly.

use super::types::EnemyHandle;
use crate::rewards::RewardDescriptor;
use crate::rooms::{PlacedRoom, RoomDescriptor};
use std::sync::Arc;
use tracing::debug;

/// Maps the player's loadout size to an enemy power level.
pub trait DifficultyScaler {
    fn enemy_power(&self, used_slots: usize) -> u32;
}

/// One power level per used slot, starting at 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotScaledDifficulty;

impl DifficultyScaler for SlotScaledDifficulty {
    fn enemy_power(&self, used_slots: usize) -> u32 {
        used_slots as u32 + 1
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SpawnRequest<'a> {
    pub placed: &'a PlacedRoom,
    pub room: &'a RoomDescriptor,
    pub enemy_class: &'a str,
    pub base_power: u32,
    pub scaled_power: u32,
}

pub trait RoomPresenter {
    fn activate(&mut self, placed: &PlacedRoom, room: &RoomDescriptor) -> Result<(), String>;
    fn teleport_player_here(&mut self, placed: &PlacedRoom);
    fn deactivate(&mut self, placed: &PlacedRoom);
    fn spawn_enemy(&mut self, request: &SpawnRequest<'_>) -> Result<EnemyHandle, String>;
    fn despawn_enemy(&mut self, enemy: EnemyHandle);
}

pub trait RewardPresenter {
    fn show_choices(&mut self, choices: &[Arc<RewardDescriptor>], timeout_ms: u64);
    fn hide(&mut self);
}

/// Room presenter with no world behind it; every load and spawn succeeds.
#[derive(Debug, Default)]
pub struct HeadlessRooms {
    next_enemy: u64,
}

impl RoomPresenter for HeadlessRooms {
    fn activate(&mut self, placed: &PlacedRoom, room: &RoomDescriptor) -> Result<(), String> {
        debug!(placed = %placed.name, room = %room.id, "room activated");
        Ok(())
    }

    fn teleport_player_here(&mut self, _placed: &PlacedRoom) {}

    fn deactivate(&mut self, placed: &PlacedRoom) {
        debug!(placed = %placed.name, "room deactivated");
    }

    fn spawn_enemy(&mut self, request: &SpawnRequest<'_>) -> Result<EnemyHandle, String> {
        self.next_enemy += 1;
        debug!(
            enemy = request.enemy_class,
            power = request.scaled_power,
            "enemy spawned"
        );
        Ok(EnemyHandle(self.next_enemy))
    }

    fn despawn_enemy(&mut self, _enemy: EnemyHandle) {}
}

#[derive(Debug, Default)]
pub struct HeadlessRewards;

impl RewardPresenter for HeadlessRewards {
    fn show_choices(&mut self, _choices: &[Arc<RewardDescriptor>], _timeout_ms: u64) {}

    fn hide(&mut self) {}
}

/// Everything the run machine delegates to.
pub struct Collaborators {
    pub difficulty: Box<dyn DifficultyScaler>,
    pub rooms: Box<dyn RoomPresenter>,
    pub rewards: Box<dyn RewardPresenter>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            difficulty: Box::new(SlotScaledDifficulty),
            rooms: Box::<HeadlessRooms>::default(),
            rewards: Box::new(HeadlessRewards),
        }
    }
}
