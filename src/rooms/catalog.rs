use super::data::builtin_room_definitions;
use super::types::{PlacedRoom, RewardPoolEntry, RoomDefinition, RoomDescriptor, RoomId};
use crate::core::constants::*;
use crate::rewards::{CatalogError, RewardCatalog, RewardDescriptor, RewardTag};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// On-disk layout of a room catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomCatalogFile {
    pub rooms: Vec<RoomDefinition>,
    /// Names of the physical room instances. One per room when omitted.
    #[serde(default)]
    pub placed_rooms: Vec<String>,
}

/// Resolved rooms plus the physical instances a run walks through.
#[derive(Debug, Clone, Default)]
pub struct RoomCatalog {
    rooms: Vec<Arc<RoomDescriptor>>,
    placed: Vec<PlacedRoom>,
}

impl RoomCatalog {
    pub fn new(rooms: Vec<Arc<RoomDescriptor>>, placed: Vec<PlacedRoom>) -> Self {
        Self { rooms, placed }
    }

    pub fn builtin(rewards: &RewardCatalog) -> Result<Self, CatalogError> {
        Self::from_definitions(builtin_room_definitions(), Vec::new(), rewards)
    }

    pub fn from_definitions(
        definitions: Vec<RoomDefinition>,
        placed_names: Vec<String>,
        rewards: &RewardCatalog,
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut rooms = Vec::with_capacity(definitions.len());
        for definition in &definitions {
            if !seen.insert(definition.id.clone()) {
                return Err(CatalogError::Duplicate(definition.id.to_string()));
            }
            rooms.push(Arc::new(resolve(definition, rewards)?));
        }

        let placed = if placed_names.is_empty() {
            rooms
                .iter()
                .enumerate()
                .map(|(index, room)| PlacedRoom::new(index, format!("Placed_{}", room.id)))
                .collect()
        } else {
            placed_names
                .into_iter()
                .enumerate()
                .map(|(index, name)| PlacedRoom::new(index, name))
                .collect()
        };
        Ok(Self { rooms, placed })
    }

    pub fn from_json(json: &str, rewards: &RewardCatalog) -> Result<Self, CatalogError> {
        let file: RoomCatalogFile = serde_json::from_str(json)?;
        Self::from_definitions(file.rooms, file.placed_rooms, rewards)
    }

    pub fn load(path: &Path, rewards: &RewardCatalog) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json, rewards)
    }

    pub fn get(&self, id: &RoomId) -> Option<&Arc<RoomDescriptor>> {
        self.rooms.iter().find(|room| &room.id == id)
    }

    pub fn rooms(&self) -> &[Arc<RoomDescriptor>] {
        &self.rooms
    }

    pub fn placed_rooms(&self) -> &[PlacedRoom] {
        &self.placed
    }

    /// Length of a full run.
    pub fn total_rooms(&self) -> usize {
        self.placed.len()
    }
}

/// Resolves reward tags and clamps tunables into their authored ranges.
fn resolve(
    definition: &RoomDefinition,
    rewards: &RewardCatalog,
) -> Result<RoomDescriptor, CatalogError> {
    let lookup = |tag: &RewardTag| -> Result<Arc<RewardDescriptor>, CatalogError> {
        rewards
            .get(tag)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownReward {
                room: definition.id.to_string(),
                tag: tag.clone(),
            })
    };

    if definition.eligible_levels.is_empty() || definition.eligible_levels.contains(&0) {
        return Err(CatalogError::InvalidRoom {
            room: definition.id.to_string(),
            reason: "eligible levels must be non-empty and 1-based".into(),
        });
    }

    let reward_pool = definition
        .reward_pool
        .iter()
        .map(|entry| {
            Ok(RewardPoolEntry {
                reward: lookup(&entry.reward)?,
                weight: entry.weight.clamp(MIN_SELECTION_WEIGHT, MAX_SELECTION_WEIGHT),
                min_level: entry.min_level.max(1),
                max_appearances: entry.max_appearances.max(1),
            })
        })
        .collect::<Result<Vec<_>, CatalogError>>()?;

    Ok(RoomDescriptor {
        id: definition.id.clone(),
        display_name: definition.display_name.clone(),
        description: definition.description.clone(),
        theme: definition.theme,
        difficulty: definition.difficulty,
        hazard: definition.hazard,
        eligible_levels: definition.eligible_levels.clone(),
        repeatable: definition.repeatable,
        selection_weight: definition
            .selection_weight
            .clamp(MIN_SELECTION_WEIGHT, MAX_SELECTION_WEIGHT),
        reward_pool,
        guaranteed_reward: definition.guaranteed_reward.as_ref().map(lookup).transpose()?,
        bonus_reward: definition.bonus_reward.as_ref().map(lookup).transpose()?,
        bonus_reward_chance: definition.bonus_reward_chance.clamp(0.0, 1.0),
        reward_choice_count: definition.reward_choice_count.max(1),
        enemy_class: definition.enemy_class.clone(),
        enemy_base_power: definition
            .enemy_base_power
            .clamp(MIN_ENEMY_BASE_POWER, MAX_ENEMY_BASE_POWER),
    })
}
