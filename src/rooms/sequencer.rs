use super::types::{PlacedRoom, RoomDescriptor, RoomId};
use crate::rewards::{RewardDescriptor, RewardTag};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Cumulative-weight draw: `U(0, total)` against a running sum, taking the
/// first entry whose cumulative weight reaches the draw. Falls back to the
/// first entry when weights do not sum to a positive total.
pub fn weighted_index<R: Rng>(weights: &[f32], rng: &mut R) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let total: f32 = weights.iter().sum();
    if total <= 0.0 {
        return Some(0);
    }
    let draw = rng.gen::<f32>() * total;
    let mut cumulative = 0.0_f32;
    for (i, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if draw <= cumulative {
            return Some(i);
        }
    }
    Some(0)
}

/// Picks rooms for each level of a run and the rewards each room offers.
///
/// Holds the pool of descriptors not yet consumed this run and how often each
/// reward has been offered, for per-run appearance caps.
#[derive(Debug, Clone, Default)]
pub struct RoomSequencer {
    remaining: Vec<Arc<RoomDescriptor>>,
    appearances: HashMap<RewardTag, u32>,
}

impl RoomSequencer {
    pub fn new(rooms: &[Arc<RoomDescriptor>]) -> Self {
        let mut sequencer = Self::default();
        sequencer.reset(rooms);
        sequencer
    }

    /// Refills the pool for a new run.
    pub fn reset(&mut self, rooms: &[Arc<RoomDescriptor>]) {
        self.remaining = rooms.to_vec();
        self.appearances.clear();
    }

    /// Shuffled visiting order of the physical rooms.
    pub fn build_run_order<R: Rng>(placed: &[PlacedRoom], rng: &mut R) -> Vec<PlacedRoom> {
        let mut order = placed.to_vec();
        order.shuffle(rng);
        order
    }

    pub fn remaining(&self) -> &[Arc<RoomDescriptor>] {
        &self.remaining
    }

    /// Drops a non-repeatable room from the pool, used when resuming a run.
    pub fn mark_completed(&mut self, id: &RoomId) {
        self.remaining.retain(|room| room.repeatable || &room.id != id);
    }

    pub fn appearances(&self, tag: &RewardTag) -> u32 {
        self.appearances.get(tag).copied().unwrap_or(0)
    }

    /// Weighted pick among rooms eligible for `level` that are repeatable or
    /// not yet completed. A non-repeatable pick leaves the pool.
    pub fn select_weighted<R: Rng>(
        &mut self,
        level: u32,
        completed: &[RoomId],
        rng: &mut R,
    ) -> Option<Arc<RoomDescriptor>> {
        let candidates: Vec<usize> = self
            .remaining
            .iter()
            .enumerate()
            .filter(|(_, room)| {
                room.is_eligible_for_level(level)
                    && (room.repeatable || !completed.contains(&room.id))
            })
            .map(|(i, _)| i)
            .collect();

        let weights: Vec<f32> = candidates
            .iter()
            .map(|&i| self.remaining[i].selection_weight)
            .collect();
        let pick = candidates[weighted_index(&weights, rng)?];
        let room = Arc::clone(&self.remaining[pick]);
        if !room.repeatable {
            self.remaining.remove(pick);
        }
        debug!(room = %room.id, level, remaining = self.remaining.len(), "room selected");
        Some(room)
    }

    /// Guaranteed reward first, then weighted draws without replacement from
    /// the level-eligible pool, then a chance to add or swap in the bonus.
    pub fn select_rewards_for_room<R: Rng>(
        &mut self,
        room: &RoomDescriptor,
        count: usize,
        level: u32,
        rng: &mut R,
    ) -> Vec<Arc<RewardDescriptor>> {
        let mut eligible: Vec<_> = room
            .reward_pool
            .iter()
            .filter(|entry| {
                entry.min_level <= level
                    && self.appearances(&entry.reward.tag) < entry.max_appearances
            })
            .collect();

        let mut selected: Vec<Arc<RewardDescriptor>> = Vec::with_capacity(count);
        if let Some(guaranteed) = &room.guaranteed_reward {
            if count > 0 {
                selected.push(Arc::clone(guaranteed));
            }
        }

        while selected.len() < count && !eligible.is_empty() {
            let weights: Vec<f32> = eligible.iter().map(|entry| entry.weight).collect();
            let Some(i) = weighted_index(&weights, rng) else {
                break;
            };
            let entry = eligible.remove(i);
            if !selected.iter().any(|reward| reward.tag == entry.reward.tag) {
                selected.push(Arc::clone(&entry.reward));
            }
        }

        if let Some(bonus) = &room.bonus_reward {
            let already_offered = selected.iter().any(|reward| reward.tag == bonus.tag);
            if !already_offered && rng.gen::<f32>() < room.bonus_reward_chance {
                if selected.len() < count {
                    selected.push(Arc::clone(bonus));
                } else if selected.len() > 1 {
                    let index = rng.gen_range(1..selected.len());
                    selected[index] = Arc::clone(bonus);
                }
                debug!(room = %room.id, bonus = %bonus.tag, "bonus reward rolled");
            }
        }

        for reward in &selected {
            *self.appearances.entry(reward.tag.clone()).or_insert(0) += 1;
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_weighted_index_empty() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert_eq!(weighted_index(&[], &mut rng), None);
    }

    #[test]
    fn test_weighted_index_zero_total_falls_back_to_first() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert_eq!(weighted_index(&[0.0, 0.0], &mut rng), Some(0));
    }

    #[test]
    fn test_weighted_index_single_entry() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(weighted_index(&[2.5], &mut rng), Some(0));
        }
    }

    #[test]
    fn test_run_order_is_permutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let placed: Vec<PlacedRoom> = (0..5).map(|i| PlacedRoom::new(i, format!("P{i}"))).collect();
        let mut order = RoomSequencer::build_run_order(&placed, &mut rng);
        assert_eq!(order.len(), 5);
        order.sort_by_key(|room| room.index);
        assert_eq!(order, placed);
    }
}
