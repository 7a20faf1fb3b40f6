use super::types::{
    ChoiceOutcome, RewardComparison, Result, SelectionCompleted, SelectionError, SelectionEvent,
    SelectionResult,
};
use crate::core::config::SelectionConfig;
use crate::core::events::EventQueue;
use crate::rewards::{RewardDescriptor, RewardTag};
use crate::slots::{SlotError, SlotInventory};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct ActiveSelection {
    id: u64,
    choices: Vec<Arc<RewardDescriptor>>,
    pending: Option<Arc<RewardDescriptor>>,
    started_at_ms: u64,
    deadline_ms: Option<u64>,
}

/// Post-combat reward offer.
///
/// Each presentation gets a fresh id. Finalizing takes the active selection,
/// so whichever of a manual choice or a timeout arrives second finds nothing
/// to finalize and does nothing.
#[derive(Debug)]
pub struct RewardSelectionFlow {
    config: SelectionConfig,
    active: Option<ActiveSelection>,
    next_id: u64,
    events: EventQueue<SelectionEvent>,
}

impl Default for RewardSelectionFlow {
    fn default() -> Self {
        Self::new(SelectionConfig::default())
    }
}

impl RewardSelectionFlow {
    pub fn new(config: SelectionConfig) -> Self {
        Self {
            config,
            active: None,
            next_id: 1,
            events: EventQueue::new(),
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Opens a selection and returns its id.
    pub fn present_choices(
        &mut self,
        choices: Vec<Arc<RewardDescriptor>>,
        now_ms: u64,
    ) -> Result<u64> {
        if self.active.is_some() {
            warn!("reward selection already active");
            return Err(SelectionError::AlreadyActive);
        }
        if choices.is_empty() {
            warn!("no rewards to present");
            return Err(SelectionError::NoChoices);
        }

        let id = self.next_id;
        self.next_id += 1;
        let deadline_ms = (self.config.timeout_ms > 0).then(|| now_ms + self.config.timeout_ms);
        let tags: Vec<RewardTag> = choices.iter().map(|reward| reward.tag.clone()).collect();
        info!(selection_id = id, choices = tags.len(), "presenting rewards");

        self.active = Some(ActiveSelection {
            id,
            choices,
            pending: None,
            started_at_ms: now_ms,
            deadline_ms,
        });
        self.events.push(SelectionEvent::Presented {
            selection_id: id,
            choices: tags,
            timeout_ms: self.config.timeout_ms,
        });
        Ok(id)
    }

    pub fn present_single(&mut self, reward: Arc<RewardDescriptor>, now_ms: u64) -> Result<u64> {
        self.present_choices(vec![reward], now_ms)
    }

    /// Routes an offered reward into the inventory: enhance if already held,
    /// else equip at the first fitting run of empty slots, else wait for
    /// [`slot_chosen`](Self::slot_chosen).
    pub fn choose_reward(
        &mut self,
        tag: &RewardTag,
        inventory: &mut SlotInventory,
    ) -> Result<ChoiceOutcome> {
        let active = self.active.as_ref().ok_or(SelectionError::NotActive)?;
        let reward = active
            .choices
            .iter()
            .find(|reward| &reward.tag == tag)
            .cloned()
            .ok_or_else(|| SelectionError::NotOffered(tag.clone()))?;

        if let Some(outcome) = self.place(&reward, inventory)? {
            return Ok(outcome);
        }

        let Some(active) = self.active.as_mut() else {
            return Err(SelectionError::NotActive);
        };
        active.pending = Some(reward);
        debug!(selection_id = active.id, %tag, "reward waiting for slot");
        self.events.push(SelectionEvent::AwaitingSlot {
            selection_id: active.id,
            tag: tag.clone(),
        });
        Ok(ChoiceOutcome::AwaitingSlot { tag: tag.clone() })
    }

    /// Enhances or auto-places `reward` and finalizes. `None` means it needs
    /// a slot from the player; nothing is changed in that case.
    fn place(
        &mut self,
        reward: &Arc<RewardDescriptor>,
        inventory: &mut SlotInventory,
    ) -> Result<Option<ChoiceOutcome>> {
        let tag = &reward.tag;
        if inventory.would_enhance_existing(reward) {
            inventory.enhance(tag)?;
            let stack_level = inventory.stack_level(tag).unwrap_or(1);
            self.finalize(SelectionResult::Selected, Some(tag.clone()));
            return Ok(Some(ChoiceOutcome::Enhanced {
                tag: tag.clone(),
                stack_level,
            }));
        }
        if inventory.is_equipped(tag) {
            return Err(SlotError::MaxStack(tag.clone()).into());
        }

        if let Some(slot) = inventory.find_best_slot(reward) {
            if inventory.equip(reward, slot).is_ok() {
                self.finalize(SelectionResult::Selected, Some(tag.clone()));
                return Ok(Some(ChoiceOutcome::Equipped {
                    tag: tag.clone(),
                    slot,
                }));
            }
        }
        Ok(None)
    }

    /// Places the pending reward at `slot`, replacing whatever is there.
    /// On failure the reward stays pending.
    pub fn slot_chosen(
        &mut self,
        slot: usize,
        inventory: &mut SlotInventory,
    ) -> Result<ChoiceOutcome> {
        let active = self.active.as_ref().ok_or(SelectionError::NotActive)?;
        let reward = active
            .pending
            .clone()
            .ok_or(SelectionError::NoPendingReward)?;

        let placed = if inventory.reward_in_slot(slot).is_some() {
            inventory.replace(slot, &reward)
        } else {
            inventory.equip(&reward, slot)
        };
        if let Err(err) = placed {
            warn!(tag = %reward.tag, slot, %err, "slot choice rejected");
            return Err(err.into());
        }

        self.finalize(SelectionResult::Selected, Some(reward.tag.clone()));
        Ok(ChoiceOutcome::Equipped {
            tag: reward.tag.clone(),
            slot,
        })
    }

    pub fn skip(&mut self) -> Result<()> {
        if self.active.is_none() {
            return Err(SelectionError::NotActive);
        }
        if !self.config.allow_skip {
            return Err(SelectionError::SkipNotAllowed);
        }
        self.finalize(SelectionResult::Skipped, None);
        Ok(())
    }

    /// Closes the selection without granting anything.
    pub fn cancel(&mut self) -> bool {
        self.finalize(SelectionResult::Cancelled, None)
    }

    /// Timer callback for `selection_id`. Stale ids are ignored.
    pub fn handle_timeout<R: Rng>(
        &mut self,
        selection_id: u64,
        inventory: &mut SlotInventory,
        rng: &mut R,
    ) -> Option<SelectionResult> {
        let active = self.active.as_ref()?;
        if active.id != selection_id {
            debug!(selection_id, "stale selection timeout ignored");
            return None;
        }

        if self.config.auto_select_on_timeout {
            let pick = rng.gen_range(0..active.choices.len());
            let reward = Arc::clone(&active.choices[pick]);
            info!(selection_id, tag = %reward.tag, "selection timed out, auto-selecting");
            // No slot prompt here: a pick that cannot be placed times out.
            if let Ok(Some(_)) = self.place(&reward, inventory) {
                return Some(SelectionResult::Selected);
            }
        } else {
            info!(selection_id, "selection timed out");
        }
        self.finalize(SelectionResult::TimedOut, None);
        Some(SelectionResult::TimedOut)
    }

    pub fn force_timeout<R: Rng>(
        &mut self,
        inventory: &mut SlotInventory,
        rng: &mut R,
    ) -> Option<SelectionResult> {
        let id = self.active.as_ref()?.id;
        self.handle_timeout(id, inventory, rng)
    }

    /// Fires the timeout if `now_ms` is past the deadline. For owners that
    /// poll instead of scheduling a timer.
    pub fn poll_timeout<R: Rng>(
        &mut self,
        now_ms: u64,
        inventory: &mut SlotInventory,
        rng: &mut R,
    ) -> Option<SelectionResult> {
        let (id, deadline) = self.active.as_ref().map(|a| (a.id, a.deadline_ms))?;
        match deadline {
            Some(deadline) if now_ms >= deadline => self.handle_timeout(id, inventory, rng),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn selection_id(&self) -> Option<u64> {
        self.active.as_ref().map(|active| active.id)
    }

    pub fn choices(&self) -> &[Arc<RewardDescriptor>] {
        self.active
            .as_ref()
            .map(|active| active.choices.as_slice())
            .unwrap_or(&[])
    }

    pub fn pending_reward(&self) -> Option<&Arc<RewardDescriptor>> {
        self.active.as_ref().and_then(|active| active.pending.as_ref())
    }

    /// `None` when idle or when the selection has no timeout.
    pub fn time_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        let deadline = self.active.as_ref()?.deadline_ms?;
        Some(deadline.saturating_sub(now_ms))
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> Option<u64> {
        self.active
            .as_ref()
            .map(|active| now_ms.saturating_sub(active.started_at_ms))
    }

    pub fn drain_events(&mut self) -> Vec<SelectionEvent> {
        self.events.drain()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&SelectionEvent) + 'static) {
        self.events.subscribe(listener);
    }

    pub fn compare(reward: &RewardDescriptor, inventory: &SlotInventory) -> RewardComparison {
        match inventory.find_by_tag(&reward.tag) {
            Some(existing) if existing.is_max_stack() => RewardComparison::AtMaxStack {
                stack_level: existing.stack_level,
            },
            Some(existing) => RewardComparison::Enhance {
                from_level: existing.stack_level,
                to_level: existing.stack_level + 1,
                from_multiplier: reward.stack_multiplier(existing.stack_level),
                to_multiplier: reward.stack_multiplier(existing.stack_level + 1),
            },
            None => RewardComparison::New {
                slot_cost: reward.slot_cost,
                available: inventory.available_slot_count(),
            },
        }
    }

    /// A larger reward may displace a smaller one.
    pub fn can_replace(new_reward: &RewardDescriptor, existing: &RewardDescriptor) -> bool {
        new_reward.slot_cost > existing.slot_cost
    }

    fn finalize(&mut self, result: SelectionResult, reward: Option<RewardTag>) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        info!(selection_id = active.id, ?result, "reward selection finished");
        self.events.push(SelectionEvent::Completed(SelectionCompleted {
            selection_id: active.id,
            result,
            reward,
        }));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::RewardCatalog;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn tag(s: &str) -> RewardTag {
        RewardTag::new(s)
    }

    #[test]
    fn test_stale_timeout_is_ignored() {
        let catalog = RewardCatalog::builtin();
        let mut flow = RewardSelectionFlow::default();
        let mut inventory = SlotInventory::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let reward = catalog.get(&tag("Reward.Passive.Vitality")).unwrap().clone();
        let first = flow.present_single(reward.clone(), 0).unwrap();
        flow.skip().unwrap();
        let second = flow.present_single(reward, 10).unwrap();

        assert_eq!(flow.handle_timeout(first, &mut inventory, &mut rng), None);
        assert_eq!(flow.selection_id(), Some(second));
    }

    #[test]
    fn test_comparison_text() {
        let catalog = RewardCatalog::builtin();
        let mut inventory = SlotInventory::default();
        let block = catalog.get(&tag("Reward.Defense.ImprovedBlock")).unwrap();
        inventory.equip(block, 0).unwrap();

        let text = RewardSelectionFlow::compare(block, &inventory).to_string();
        assert_eq!(text, "Enhance: Level 1 -> 2\nEffect: x0.6 -> x0.7");

        let vent = catalog.get(&tag("Reward.Interact.TurretHack")).unwrap();
        let text = RewardSelectionFlow::compare(vent, &inventory).to_string();
        assert_eq!(text, "New Reward\nSlot Cost: 2");
    }

    #[test]
    fn test_can_replace_prefers_larger_cost() {
        let catalog = RewardCatalog::builtin();
        let big = catalog.get(&tag("Reward.Ability.SecondWind")).unwrap();
        let small = catalog.get(&tag("Reward.Passive.Vitality")).unwrap();
        assert!(RewardSelectionFlow::can_replace(big, small));
        assert!(!RewardSelectionFlow::can_replace(small, big));
    }
}
