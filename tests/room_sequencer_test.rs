//! Room sequencing: weighted room choice, pool exhaustion and reward draws.

use atlas_run::rewards::{RewardCatalog, RewardCategory, RewardDescriptor, RewardTag};
use atlas_run::rooms::{
    weighted_index, RewardPoolEntry, RoomCatalog, RoomDescriptor, RoomDifficulty, RoomHazard,
    RoomId, RoomSequencer,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

fn room(id: &str, levels: &[u32], repeatable: bool, weight: f32) -> RoomDescriptor {
    RoomDescriptor {
        id: RoomId::new(id),
        display_name: id.to_string(),
        description: String::new(),
        theme: RewardCategory::Offense,
        difficulty: RoomDifficulty::Medium,
        hazard: RoomHazard::None,
        eligible_levels: levels.to_vec(),
        repeatable,
        selection_weight: weight,
        reward_pool: Vec::new(),
        guaranteed_reward: None,
        bonus_reward: None,
        bonus_reward_chance: 0.0,
        reward_choice_count: 2,
        enemy_class: Some("Enemy.Test".to_string()),
        enemy_base_power: 1,
    }
}

fn entry(reward: &Arc<RewardDescriptor>, weight: f32, min_level: u32, cap: u32) -> RewardPoolEntry {
    RewardPoolEntry {
        reward: Arc::clone(reward),
        weight,
        min_level,
        max_appearances: cap,
    }
}

fn get(catalog: &RewardCatalog, tag: &str) -> Arc<RewardDescriptor> {
    Arc::clone(catalog.get(&RewardTag::new(tag)).unwrap())
}

// =========================================================================
// Room selection
// =========================================================================

#[test]
fn test_weighted_selection_fairness() {
    let rooms = vec![
        Arc::new(room("Heavy", &[1], true, 3.0)),
        Arc::new(room("Light", &[1], true, 1.0)),
    ];
    let mut sequencer = RoomSequencer::new(&rooms);
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let draws = 20_000;
    let heavy = (0..draws)
        .filter_map(|_| sequencer.select_weighted(1, &[], &mut rng))
        .filter(|picked| picked.id.as_str() == "Heavy")
        .count();
    let share = heavy as f64 / draws as f64;
    assert!((share - 0.75).abs() < 0.02, "heavy share {share}");
}

#[test]
fn test_weighted_index_matches_cumulative_ranges() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut counts = [0usize; 3];
    for _ in 0..30_000 {
        counts[weighted_index(&[1.0, 0.0, 2.0], &mut rng).unwrap()] += 1;
    }
    assert_eq!(counts[1], 0);
    let share = counts[2] as f64 / 30_000.0;
    assert!((share - 2.0 / 3.0).abs() < 0.02, "share {share}");
}

#[test]
fn test_non_repeatable_rooms_leave_the_pool() {
    let rooms = vec![
        Arc::new(room("A", &[1, 2, 3], false, 1.0)),
        Arc::new(room("B", &[1, 2, 3], false, 1.0)),
    ];
    let mut sequencer = RoomSequencer::new(&rooms);
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let first = sequencer.select_weighted(1, &[], &mut rng).unwrap();
    let second = sequencer
        .select_weighted(2, &[first.id.clone()], &mut rng)
        .unwrap();
    assert_ne!(first.id, second.id);
    assert!(sequencer.remaining().is_empty());
    assert!(sequencer
        .select_weighted(3, &[first.id.clone(), second.id.clone()], &mut rng)
        .is_none());
}

#[test]
fn test_empty_pool_without_repeatable_returns_none() {
    let mut sequencer = RoomSequencer::new(&[]);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    assert!(sequencer.select_weighted(1, &[], &mut rng).is_none());
}

#[test]
fn test_level_eligibility_filters_rooms() {
    let rooms = vec![
        Arc::new(room("Early", &[1, 2], false, 1.0)),
        Arc::new(room("Late", &[4, 5], false, 1.0)),
    ];
    let mut sequencer = RoomSequencer::new(&rooms);
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    assert!(sequencer.select_weighted(3, &[], &mut rng).is_none());
    assert_eq!(
        sequencer.select_weighted(5, &[], &mut rng).unwrap().id,
        RoomId::new("Late")
    );
}

#[test]
fn test_repeatable_room_survives_completion() {
    let rooms = vec![Arc::new(room("Loop", &[1, 2, 3], true, 1.0))];
    let mut sequencer = RoomSequencer::new(&rooms);
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let completed = vec![RoomId::new("Loop")];
    for level in 1..=3 {
        assert!(sequencer.select_weighted(level, &completed, &mut rng).is_some());
    }
    sequencer.mark_completed(&RoomId::new("Loop"));
    assert_eq!(sequencer.remaining().len(), 1);
}

#[test]
fn test_builtin_catalog_covers_every_level() {
    let rewards = RewardCatalog::builtin();
    let catalog = RoomCatalog::builtin(&rewards).unwrap();
    let total = catalog.total_rooms() as u32;
    assert_eq!(total, 5);

    for seed in 0..50 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut sequencer = RoomSequencer::new(catalog.rooms());
        let mut completed = Vec::new();
        for level in 1..=total {
            let picked = sequencer
                .select_weighted(level, &completed, &mut rng)
                .unwrap_or_else(|| panic!("seed {seed}: no room for level {level}"));
            completed.push(picked.id.clone());
        }
    }
}

// =========================================================================
// Reward draws
// =========================================================================

#[test]
fn test_guaranteed_reward_comes_first() {
    let catalog = RewardCatalog::builtin();
    let vitality = get(&catalog, "Reward.Passive.Vitality");
    let mut medical = room("Medical", &[1], false, 1.0);
    medical.guaranteed_reward = Some(Arc::clone(&vitality));
    medical.reward_pool = vec![
        entry(&get(&catalog, "Reward.Defense.IronSkin"), 1.0, 1, 99),
        entry(&get(&catalog, "Reward.Defense.ParryMaster"), 1.0, 1, 99),
    ];

    let mut sequencer = RoomSequencer::default();
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    for _ in 0..20 {
        let offered = sequencer.select_rewards_for_room(&medical, 3, 1, &mut rng);
        assert_eq!(offered.len(), 3);
        assert_eq!(offered[0].tag, vitality.tag);
    }
}

#[test]
fn test_draws_are_without_replacement_and_level_gated() {
    let catalog = RewardCatalog::builtin();
    let mut weapons = room("Weapons", &[1], false, 1.0);
    weapons.reward_pool = vec![
        entry(&get(&catalog, "Reward.Offense.SharpBlade"), 5.0, 1, 99),
        entry(&get(&catalog, "Reward.Offense.RapidStrikes"), 1.0, 1, 99),
        entry(&get(&catalog, "Reward.Offense.Executioner"), 1.0, 4, 99),
    ];

    let mut sequencer = RoomSequencer::default();
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    for _ in 0..50 {
        let offered = sequencer.select_rewards_for_room(&weapons, 3, 2, &mut rng);
        assert_eq!(offered.len(), 2);
        assert_ne!(offered[0].tag, offered[1].tag);
        assert!(offered
            .iter()
            .all(|reward| reward.tag.as_str() != "Reward.Offense.Executioner"));
    }
}

#[test]
fn test_appearance_cap_limits_offers_per_run() {
    let catalog = RewardCatalog::builtin();
    let blade = get(&catalog, "Reward.Offense.SharpBlade");
    let mut weapons = room("Weapons", &[1], true, 1.0);
    weapons.reward_pool = vec![entry(&blade, 1.0, 1, 2)];

    let mut sequencer = RoomSequencer::default();
    let mut rng = ChaCha8Rng::seed_from_u64(10);
    assert_eq!(sequencer.select_rewards_for_room(&weapons, 1, 1, &mut rng).len(), 1);
    assert_eq!(sequencer.select_rewards_for_room(&weapons, 1, 1, &mut rng).len(), 1);
    assert!(sequencer
        .select_rewards_for_room(&weapons, 1, 1, &mut rng)
        .is_empty());
    assert_eq!(sequencer.appearances(&blade.tag), 2);

    sequencer.reset(&[]);
    assert_eq!(sequencer.appearances(&blade.tag), 0);
}

#[test]
fn test_certain_bonus_is_appended_or_swapped_in() {
    let catalog = RewardCatalog::builtin();
    let bonus = get(&catalog, "Reward.Ability.Berserker");
    let mut room_def = room("Command", &[1], false, 1.0);
    room_def.reward_pool = vec![
        entry(&get(&catalog, "Reward.Offense.SharpBlade"), 1.0, 1, 99),
        entry(&get(&catalog, "Reward.Offense.RapidStrikes"), 1.0, 1, 99),
    ];
    room_def.bonus_reward = Some(Arc::clone(&bonus));
    room_def.bonus_reward_chance = 1.0;

    let mut sequencer = RoomSequencer::default();
    let mut rng = ChaCha8Rng::seed_from_u64(12);

    let appended = sequencer.select_rewards_for_room(&room_def, 3, 1, &mut rng);
    assert_eq!(appended.len(), 3);
    assert_eq!(appended[2].tag, bonus.tag);

    let swapped = sequencer.select_rewards_for_room(&room_def, 2, 1, &mut rng);
    assert_eq!(swapped.len(), 2);
    assert_eq!(swapped[1].tag, bonus.tag);
    assert_ne!(swapped[0].tag, bonus.tag);
}
