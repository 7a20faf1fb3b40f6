//! Slot inventory: capacity, stacking, incompatibility and index consistency.

use atlas_run::core::SlotConfig;
use atlas_run::rewards::{RewardCatalog, RewardCategory, RewardDescriptor, RewardTag};
use atlas_run::slots::{SlotError, SlotEvent, SlotInventory};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::sync::Arc;

fn reward(tag: &str, slot_cost: u8, max_stack_level: u8) -> Arc<RewardDescriptor> {
    Arc::new(RewardDescriptor {
        tag: RewardTag::new(tag),
        display_name: tag.to_string(),
        description: String::new(),
        category: RewardCategory::PassiveStats,
        slot_cost,
        max_stack_level,
        stack_multipliers: vec![1.0, 1.5, 2.0],
        stat_modifiers: BTreeMap::from([("Damage".to_string(), 0.1)]),
        incompatible_with: Vec::new(),
        linked_action: None,
    })
}

fn incompatible(tag: &str, with: &str) -> Arc<RewardDescriptor> {
    let mut descriptor = (*reward(tag, 1, 1)).clone();
    descriptor.incompatible_with = vec![RewardTag::new(with)];
    Arc::new(descriptor)
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn test_equip_one_cost_reward_into_empty_inventory() {
    let mut inventory = SlotInventory::new(SlotConfig { max_slots: 6 });
    let a = reward("Reward.A", 1, 3);

    inventory.equip(&a, 0).unwrap();

    assert_eq!(inventory.used_slot_count(), 1);
    assert_eq!(inventory.available_slot_count(), 5);
    assert_eq!(inventory.stack_level(&a.tag), Some(1));
    assert_eq!(
        inventory.drain_events(),
        vec![SlotEvent::Equipped {
            slot: 0,
            tag: a.tag.clone()
        }]
    );
}

#[test]
fn test_capacity_counts_slot_cost() {
    let mut inventory = SlotInventory::default();
    inventory.equip(&reward("Reward.Big", 3, 1), 0).unwrap();
    inventory.equip(&reward("Reward.Mid", 2, 1), 1).unwrap();
    assert_eq!(inventory.used_slot_count(), 5);

    let err = inventory.equip(&reward("Reward.Two", 2, 1), 2).unwrap_err();
    assert_eq!(
        err,
        SlotError::InsufficientCapacity {
            required: 2,
            available: 1
        }
    );
    assert!(inventory.reward_in_slot(2).is_none());
    assert!(inventory.has_slots_for(&reward("Reward.One", 1, 1)));
}

#[test]
fn test_equip_rejections_leave_state_unchanged() {
    let mut inventory = SlotInventory::default();
    let a = reward("Reward.A", 1, 3);
    inventory.equip(&a, 0).unwrap();
    inventory.drain_events();
    let before = inventory.snapshot();

    assert!(matches!(
        inventory.equip(&a, 6),
        Err(SlotError::InvalidSlot { index: 6, .. })
    ));
    assert_eq!(
        inventory.equip(&reward("Reward.B", 1, 1), 0),
        Err(SlotError::SlotOccupied(0))
    );
    assert_eq!(
        inventory.equip(&a, 1),
        Err(SlotError::AlreadyEquipped(a.tag.clone()))
    );

    assert_eq!(inventory.snapshot(), before);
    assert!(inventory.drain_events().is_empty());
}

#[test]
fn test_enhance_until_max_stack() {
    let mut inventory = SlotInventory::default();
    let a = reward("Reward.A", 1, 3);
    inventory.equip(&a, 2).unwrap();

    inventory.enhance(&a.tag).unwrap();
    inventory.enhance(&a.tag).unwrap();
    assert_eq!(inventory.stack_level(&a.tag), Some(3));
    assert!(!inventory.would_enhance_existing(&a));

    assert_eq!(
        inventory.enhance(&a.tag),
        Err(SlotError::MaxStack(a.tag.clone()))
    );
    assert_eq!(inventory.stack_level(&a.tag), Some(3));
    assert!((inventory.stat_modifier("Damage") - 0.2).abs() < 1e-6);
}

#[test]
fn test_enhance_unequipped_fails() {
    let mut inventory = SlotInventory::default();
    let tag = RewardTag::new("Reward.Missing");
    assert_eq!(inventory.enhance(&tag), Err(SlotError::NotEquipped(tag)));
}

#[test]
fn test_remove_empty_slot_is_noop() {
    let mut inventory = SlotInventory::default();
    inventory.equip(&reward("Reward.A", 1, 1), 0).unwrap();
    inventory.remove(0).unwrap();
    inventory.drain_events();

    assert_eq!(inventory.remove(0), Err(SlotError::SlotEmpty(0)));
    assert_eq!(inventory.remove(0), Err(SlotError::SlotEmpty(0)));
    assert_eq!(inventory.used_slot_count(), 0);
    assert!(inventory.drain_events().is_empty());
}

#[test]
fn test_incompatibility_checked_both_directions() {
    let mut inventory = SlotInventory::default();
    let stand = incompatible("Reward.Stand", "Reward.Rage");
    let rage = reward("Reward.Rage", 1, 1);

    inventory.equip(&stand, 0).unwrap();
    assert!(matches!(
        inventory.equip(&rage, 1),
        Err(SlotError::Incompatible { .. })
    ));

    let mut other = SlotInventory::default();
    other.equip(&rage, 0).unwrap();
    assert!(matches!(
        other.equip(&stand, 1),
        Err(SlotError::Incompatible { .. })
    ));
    assert_eq!(other.incompatible_with(&stand), vec![rage.tag.clone()]);
}

#[test]
fn test_replace_failure_keeps_original() {
    let mut inventory = SlotInventory::default();
    let small = reward("Reward.Small", 1, 1);
    inventory.equip(&small, 0).unwrap();
    inventory.equip(&reward("Reward.Fill", 3, 1), 1).unwrap();
    inventory.equip(&reward("Reward.Fill2", 2, 1), 2).unwrap();

    // 6 used; swapping the 1-cost reward for a 3-cost one needs 2 more.
    let err = inventory.replace(0, &reward("Reward.Huge", 3, 1)).unwrap_err();
    assert!(matches!(err, SlotError::InsufficientCapacity { .. }));
    assert_eq!(inventory.reward_in_slot(0).map(|r| r.tag().clone()), Some(small.tag.clone()));

    inventory.replace(0, &reward("Reward.Other", 1, 1)).unwrap();
    assert!(!inventory.is_equipped(&small.tag));
}

#[test]
fn test_swap_updates_index() {
    let mut inventory = SlotInventory::default();
    let a = reward("Reward.A", 1, 1);
    inventory.equip(&a, 0).unwrap();

    inventory.swap(0, 4).unwrap();
    assert_eq!(inventory.find_by_tag(&a.tag).map(|r| r.slot_index), Some(4));
    assert!(inventory.reward_in_slot(0).is_none());
    inventory.check_consistency().unwrap();

    assert!(inventory.swap(0, 9).is_err());
}

#[test]
fn test_find_best_slot_needs_consecutive_empty_slots() {
    let mut inventory = SlotInventory::default();
    inventory.equip(&reward("Reward.A", 1, 1), 1).unwrap();
    inventory.equip(&reward("Reward.B", 1, 1), 3).unwrap();

    assert_eq!(inventory.find_best_slot(&reward("Reward.One", 1, 1)), Some(0));
    assert_eq!(inventory.find_best_slot(&reward("Reward.Two", 2, 1)), Some(4));
    assert_eq!(inventory.find_best_slot(&reward("Reward.Three", 3, 1)), None);
}

#[test]
fn test_builtin_abilities_follow_stack_level() {
    let catalog = RewardCatalog::builtin();
    let block = catalog
        .get(&RewardTag::new("Reward.Defense.ImprovedBlock"))
        .unwrap();
    let mut inventory = SlotInventory::default();
    inventory.equip(block, 0).unwrap();
    inventory.enhance(&block.tag).unwrap();

    let links = inventory.active_abilities();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].ability, "Action.Combat.Block");
    assert_eq!(links[0].stack_level, 2);
    assert!((links[0].multiplier - 0.7).abs() < 1e-6);
}

// =========================================================================
// Invariants over random operation sequences
// =========================================================================

#[test]
fn test_random_operations_preserve_invariants() {
    let pool: Vec<_> = (0..10)
        .map(|i| reward(&format!("Reward.R{i}"), 1 + (i % 3) as u8, 1 + (i % 4) as u8))
        .collect();

    for seed in 0..20 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut inventory = SlotInventory::default();
        for _ in 0..300 {
            let slot = rng.gen_range(0..7);
            let pick = &pool[rng.gen_range(0..pool.len())];
            match rng.gen_range(0..5) {
                0 => {
                    let _ = inventory.equip(pick, slot);
                }
                1 => {
                    let _ = inventory.enhance(&pick.tag);
                }
                2 => {
                    let _ = inventory.remove(slot);
                }
                3 => {
                    let _ = inventory.replace(slot, pick);
                }
                _ => {
                    let _ = inventory.swap(slot, rng.gen_range(0..7));
                }
            }
            assert!(inventory.used_slot_count() <= inventory.max_slots());
            inventory.check_consistency().unwrap();
            for equipped in inventory.equipped() {
                assert!(equipped.stack_level >= 1);
                assert!(equipped.stack_level <= equipped.reward.max_stack_level);
            }
        }
    }
}
