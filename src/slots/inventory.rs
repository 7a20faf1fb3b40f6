use super::types::{
    AbilityLink, EquippedReward, Result, SavedReward, SlotError, SlotEvent, StackEntry,
};
use crate::core::config::SlotConfig;
use crate::core::events::EventQueue;
use crate::rewards::{RewardCategory, RewardDescriptor, RewardTag};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fixed-size array of equip slots plus the tag index kept in lockstep with it.
///
/// A reward occupies the single slot index it was equipped at but consumes
/// `slot_cost` units of capacity. Every mutating operation either succeeds
/// completely or returns a [`SlotError`] without touching state.
#[derive(Debug)]
pub struct SlotInventory {
    slots: Vec<Option<EquippedReward>>,
    stacks: HashMap<RewardTag, StackEntry>,
    modifiers: BTreeMap<String, f32>,
    abilities: Vec<AbilityLink>,
    events: EventQueue<SlotEvent>,
}

impl Default for SlotInventory {
    fn default() -> Self {
        Self::new(SlotConfig::default())
    }
}

impl SlotInventory {
    pub fn new(config: SlotConfig) -> Self {
        Self {
            slots: vec![None; config.max_slots],
            stacks: HashMap::new(),
            modifiers: BTreeMap::new(),
            abilities: Vec::new(),
            events: EventQueue::new(),
        }
    }

    pub fn max_slots(&self) -> usize {
        self.slots.len()
    }

    // ── Mutations ───────────────────────────────────────────────────

    pub fn equip(&mut self, reward: &Arc<RewardDescriptor>, slot: usize) -> Result<()> {
        self.check_index(slot)?;
        if self.slots[slot].is_some() {
            return Err(self.reject(SlotError::SlotOccupied(slot)));
        }
        if let Err(err) = self.check_equip(reward, None) {
            return Err(self.reject(err));
        }
        self.insert(reward, slot, 1);
        Ok(())
    }

    pub fn enhance(&mut self, tag: &RewardTag) -> Result<()> {
        let Some(entry) = self.stacks.get(tag).copied() else {
            return Err(self.reject(SlotError::NotEquipped(tag.clone())));
        };
        let at_max = self.slots[entry.slot_index]
            .as_ref()
            .map_or(true, EquippedReward::is_max_stack);
        if at_max {
            return Err(self.reject(SlotError::MaxStack(tag.clone())));
        }
        let Some(equipped) = self.slots[entry.slot_index].as_mut() else {
            return Err(SlotError::SlotEmpty(entry.slot_index));
        };

        equipped.stack_level += 1;
        let stack_level = equipped.stack_level;
        self.stacks.insert(
            tag.clone(),
            StackEntry {
                slot_index: entry.slot_index,
                stack_level,
            },
        );
        self.recompute();
        debug!(%tag, stack_level, "reward enhanced");
        self.events.push(SlotEvent::Enhanced {
            slot: entry.slot_index,
            tag: tag.clone(),
            stack_level,
        });
        Ok(())
    }

    pub fn remove(&mut self, slot: usize) -> Result<EquippedReward> {
        self.check_index(slot)?;
        let Some(removed) = self.slots[slot].take() else {
            return Err(SlotError::SlotEmpty(slot));
        };
        self.stacks.remove(removed.tag());
        self.recompute();
        debug!(tag = %removed.tag(), slot, "reward removed");
        self.events.push(SlotEvent::Removed {
            slot,
            tag: removed.tag().clone(),
        });
        Ok(removed)
    }

    /// Remove followed by equip at the same index, validated up front so a
    /// failing equip leaves the old reward in place.
    pub fn replace(&mut self, slot: usize, reward: &Arc<RewardDescriptor>) -> Result<()> {
        self.check_index(slot)?;
        if self.slots[slot].is_none() {
            return Err(self.reject(SlotError::SlotEmpty(slot)));
        }
        if let Err(err) = self.check_equip(reward, Some(slot)) {
            return Err(self.reject(err));
        }
        self.remove(slot)?;
        self.insert(reward, slot, 1);
        Ok(())
    }

    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        self.check_index(a)?;
        self.check_index(b)?;
        if a == b {
            return Ok(());
        }
        self.slots.swap(a, b);
        for index in [a, b] {
            if let Some(equipped) = self.slots[index].as_mut() {
                equipped.slot_index = index;
                if let Some(entry) = self.stacks.get_mut(&equipped.reward.tag) {
                    entry.slot_index = index;
                }
            }
        }
        self.events.push(SlotEvent::Swapped { a, b });
        Ok(())
    }

    pub fn clear_all(&mut self) {
        for slot in 0..self.slots.len() {
            let _ = self.remove(slot);
        }
    }

    /// Clears every slot and equips `rewards` into consecutive indices from 0.
    /// Entries that do not fit are skipped.
    pub fn reset_to_loadout(&mut self, rewards: &[Arc<RewardDescriptor>]) {
        self.clear_all();
        for (slot, reward) in rewards.iter().enumerate().take(self.slots.len()) {
            if let Err(err) = self.equip(reward, slot) {
                warn!(tag = %reward.tag, %err, "default loadout entry skipped");
            }
        }
    }

    pub fn drain_events(&mut self) -> Vec<SlotEvent> {
        self.events.drain()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&SlotEvent) + 'static) {
        self.events.subscribe(listener);
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn used_slot_count(&self) -> usize {
        self.occupied()
            .map(|equipped| equipped.reward.slot_cost as usize)
            .sum()
    }

    pub fn available_slot_count(&self) -> usize {
        self.max_slots().saturating_sub(self.used_slot_count())
    }

    /// Capacity check only; incompatibility is not considered.
    pub fn has_slots_for(&self, reward: &RewardDescriptor) -> bool {
        self.available_slot_count() >= reward.slot_cost as usize
    }

    pub fn is_equipped(&self, tag: &RewardTag) -> bool {
        self.stacks.contains_key(tag)
    }

    pub fn find_by_tag(&self, tag: &RewardTag) -> Option<&EquippedReward> {
        let entry = self.stacks.get(tag)?;
        self.slots[entry.slot_index].as_ref()
    }

    pub fn stack_level(&self, tag: &RewardTag) -> Option<u8> {
        self.stacks.get(tag).map(|entry| entry.stack_level)
    }

    pub fn reward_in_slot(&self, slot: usize) -> Option<&EquippedReward> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn equipped(&self) -> Vec<&EquippedReward> {
        self.occupied().collect()
    }

    pub fn rewards_by_category(&self, category: RewardCategory) -> Vec<&EquippedReward> {
        self.occupied()
            .filter(|equipped| equipped.reward.category == category)
            .collect()
    }

    /// True when choosing `reward` again should enhance rather than equip.
    pub fn would_enhance_existing(&self, reward: &RewardDescriptor) -> bool {
        self.stacks
            .get(&reward.tag)
            .is_some_and(|entry| entry.stack_level < reward.max_stack_level)
    }

    /// Equipped tags that conflict with `reward`, checked in both directions.
    pub fn incompatible_with(&self, reward: &RewardDescriptor) -> Vec<RewardTag> {
        self.occupied()
            .filter(|equipped| {
                reward.is_incompatible_with(&equipped.reward.tag)
                    || equipped.reward.is_incompatible_with(&reward.tag)
            })
            .map(|equipped| equipped.reward.tag.clone())
            .collect()
    }

    /// First index starting a run of `slot_cost` consecutive empty slots.
    pub fn find_best_slot(&self, reward: &RewardDescriptor) -> Option<usize> {
        let cost = reward.slot_cost.max(1) as usize;
        if cost > self.slots.len() {
            return None;
        }
        (0..=self.slots.len() - cost)
            .find(|&start| self.slots[start..start + cost].iter().all(Option::is_none))
    }

    /// Sum of `value * stack multiplier` over PassiveStats rewards.
    pub fn stat_modifier(&self, stat: &str) -> f32 {
        self.modifiers.get(stat).copied().unwrap_or(0.0)
    }

    pub fn all_stat_modifiers(&self) -> &BTreeMap<String, f32> {
        &self.modifiers
    }

    pub fn active_abilities(&self) -> &[AbilityLink] {
        &self.abilities
    }

    pub fn snapshot(&self) -> Vec<SavedReward> {
        self.occupied()
            .map(|equipped| SavedReward {
                tag: equipped.reward.tag.clone(),
                stack_level: equipped.stack_level,
                slot_index: equipped.slot_index,
            })
            .collect()
    }

    /// Verifies the slot array and tag index agree and capacity holds.
    pub fn check_consistency(&self) -> std::result::Result<(), String> {
        let mut seen = 0;
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(equipped) = slot else { continue };
            seen += 1;
            if equipped.slot_index != index {
                return Err(format!(
                    "{} records slot {} but sits in {}",
                    equipped.tag(),
                    equipped.slot_index,
                    index
                ));
            }
            match self.stacks.get(equipped.tag()) {
                Some(entry)
                    if entry.slot_index == index && entry.stack_level == equipped.stack_level => {}
                other => {
                    return Err(format!("index entry {:?} disagrees with slot {}", other, index))
                }
            }
        }
        if seen != self.stacks.len() {
            return Err(format!(
                "{} occupied slots but {} index entries",
                seen,
                self.stacks.len()
            ));
        }
        if self.used_slot_count() > self.max_slots() {
            return Err(format!(
                "{} slots used of {}",
                self.used_slot_count(),
                self.max_slots()
            ));
        }
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────────

    fn occupied(&self) -> impl Iterator<Item = &EquippedReward> {
        self.slots.iter().flatten()
    }

    fn check_index(&self, slot: usize) -> Result<()> {
        if slot >= self.slots.len() {
            return Err(SlotError::InvalidSlot {
                index: slot,
                max_slots: self.slots.len(),
            });
        }
        Ok(())
    }

    /// Capacity, duplicate and incompatibility checks, optionally pretending
    /// the reward in `vacating` has already been removed.
    fn check_equip(&self, reward: &RewardDescriptor, vacating: Option<usize>) -> Result<()> {
        let remaining = || {
            self.occupied()
                .filter(move |equipped| Some(equipped.slot_index) != vacating)
        };

        if remaining().any(|equipped| equipped.reward.tag == reward.tag) {
            return Err(SlotError::AlreadyEquipped(reward.tag.clone()));
        }

        let used: usize = remaining()
            .map(|equipped| equipped.reward.slot_cost as usize)
            .sum();
        let available = self.max_slots().saturating_sub(used);
        if available < reward.slot_cost as usize {
            return Err(SlotError::InsufficientCapacity {
                required: reward.slot_cost as usize,
                available,
            });
        }

        if let Some(conflict) = remaining().find(|equipped| {
            reward.is_incompatible_with(&equipped.reward.tag)
                || equipped.reward.is_incompatible_with(&reward.tag)
        }) {
            return Err(SlotError::Incompatible {
                reward: reward.tag.clone(),
                equipped: conflict.reward.tag.clone(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, reward: &Arc<RewardDescriptor>, slot: usize, stack_level: u8) {
        self.slots[slot] = Some(EquippedReward {
            reward: Arc::clone(reward),
            stack_level,
            slot_index: slot,
        });
        self.stacks.insert(
            reward.tag.clone(),
            StackEntry {
                slot_index: slot,
                stack_level,
            },
        );
        self.recompute();
        debug!(tag = %reward.tag, slot, "reward equipped");
        self.events.push(SlotEvent::Equipped {
            slot,
            tag: reward.tag.clone(),
        });
    }

    fn reject(&self, err: SlotError) -> SlotError {
        debug!(%err, "slot operation rejected");
        err
    }

    fn recompute(&mut self) {
        let mut modifiers = BTreeMap::new();
        let mut abilities = Vec::new();
        for equipped in self.slots.iter().flatten() {
            let multiplier = equipped.multiplier();
            if equipped.reward.category == RewardCategory::PassiveStats {
                for (stat, value) in &equipped.reward.stat_modifiers {
                    *modifiers.entry(stat.clone()).or_insert(0.0) += value * multiplier;
                }
            }
            if let Some(ability) = &equipped.reward.linked_action {
                abilities.push(AbilityLink {
                    reward: equipped.reward.tag.clone(),
                    ability: ability.clone(),
                    stack_level: equipped.stack_level,
                    multiplier,
                });
            }
        }
        self.modifiers = modifiers;
        self.abilities = abilities;
    }
}
