//! Built-in station rooms.

use super::types::{RewardPoolDef, RoomDefinition, RoomDifficulty, RoomHazard, RoomId};
use crate::core::constants::{
    DEFAULT_BONUS_REWARD_CHANCE, DEFAULT_REWARD_CHOICE_COUNT, UNLIMITED_APPEARANCES,
};
use crate::rewards::{RewardCategory, RewardTag};

fn pool(entries: &[(&str, f32, u32)]) -> Vec<RewardPoolDef> {
    entries
        .iter()
        .map(|&(tag, weight, min_level)| RewardPoolDef {
            reward: RewardTag::new(tag),
            weight,
            min_level,
            max_appearances: UNLIMITED_APPEARANCES,
        })
        .collect()
}

/// The five rooms of the station, one per reward theme.
pub fn builtin_room_definitions() -> Vec<RoomDefinition> {
    vec![
        RoomDefinition {
            id: RoomId::new("Room_A_Engineering"),
            display_name: "Engineering Bay".into(),
            description: "The heart of the station's mechanical systems. Sparks fly from damaged panels among the machinery.".into(),
            theme: RewardCategory::Defense,
            difficulty: RoomDifficulty::Medium,
            hazard: RoomHazard::ElectricalSurges,
            eligible_levels: vec![1, 2, 3],
            repeatable: false,
            selection_weight: 1.0,
            reward_pool: pool(&[
                ("Reward.Defense.ImprovedBlock", 1.5, 1),
                ("Reward.Defense.ParryMaster", 1.0, 1),
                ("Reward.Defense.CounterStrike", 0.8, 2),
                ("Reward.Defense.IronSkin", 1.0, 1),
                ("Reward.Defense.LastStand", 0.6, 2),
            ]),
            guaranteed_reward: None,
            bonus_reward: Some(RewardTag::new("Reward.Interact.PowerSurge")),
            bonus_reward_chance: DEFAULT_BONUS_REWARD_CHANCE,
            reward_choice_count: DEFAULT_REWARD_CHOICE_COUNT,
            enemy_class: Some("Chief Engineer Hayes".into()),
            enemy_base_power: 3,
        },
        RoomDefinition {
            id: RoomId::new("Room_B_Medical"),
            display_name: "Medical Ward".into(),
            description: "Where healing became harm. The medical bay reeks of chemicals and decay.".into(),
            theme: RewardCategory::PassiveStats,
            difficulty: RoomDifficulty::Easy,
            hazard: RoomHazard::ToxicLeak,
            eligible_levels: vec![1, 2],
            repeatable: false,
            selection_weight: 1.2,
            reward_pool: pool(&[
                ("Reward.Passive.Vitality", 1.5, 1),
                ("Reward.Passive.Regeneration", 1.0, 1),
                ("Reward.Passive.Fortitude", 1.0, 1),
                ("Reward.Passive.Swiftness", 1.0, 1),
                ("Reward.Passive.Heavyweight", 0.8, 1),
            ]),
            guaranteed_reward: Some(RewardTag::new("Reward.Passive.Vitality")),
            bonus_reward: Some(RewardTag::new("Reward.Ability.Vampirism")),
            bonus_reward_chance: DEFAULT_BONUS_REWARD_CHANCE,
            reward_choice_count: DEFAULT_REWARD_CHOICE_COUNT,
            enemy_class: Some("Dr. Voss".into()),
            enemy_base_power: 2,
        },
        RoomDefinition {
            id: RoomId::new("Room_C_Weapons"),
            display_name: "Weapons Laboratory".into(),
            description: "Where destruction was perfected. The lab is filled with prototypes and experimental armaments.".into(),
            theme: RewardCategory::Offense,
            difficulty: RoomDifficulty::Hard,
            hazard: RoomHazard::None,
            eligible_levels: vec![2, 3, 4],
            repeatable: false,
            selection_weight: 0.8,
            reward_pool: pool(&[
                ("Reward.Offense.SharpBlade", 1.5, 1),
                ("Reward.Offense.HeavyImpact", 1.0, 2),
                ("Reward.Offense.BleedingStrikes", 1.0, 1),
                ("Reward.Offense.Executioner", 0.7, 3),
                ("Reward.Offense.RapidStrikes", 1.2, 1),
            ]),
            guaranteed_reward: None,
            bonus_reward: Some(RewardTag::new("Reward.Ability.Berserker")),
            bonus_reward_chance: DEFAULT_BONUS_REWARD_CHANCE,
            reward_choice_count: DEFAULT_REWARD_CHOICE_COUNT,
            enemy_class: Some("Commander Rex".into()),
            enemy_base_power: 4,
        },
        RoomDefinition {
            id: RoomId::new("Room_D_Command"),
            display_name: "Command Center".into(),
            description: "Where order turned to chaos. The command screens flicker with corrupted data.".into(),
            theme: RewardCategory::PassiveAbility,
            difficulty: RoomDifficulty::Hard,
            hazard: RoomHazard::SystemMalfunction,
            eligible_levels: vec![3, 4, 5],
            repeatable: false,
            selection_weight: 0.9,
            reward_pool: pool(&[
                ("Reward.Ability.SecondWind", 0.5, 4),
                ("Reward.Ability.Vampirism", 1.0, 3),
                ("Reward.Ability.Berserker", 1.0, 3),
                ("Reward.Ability.Momentum", 1.0, 3),
                ("Reward.Ability.StationShield", 1.2, 3),
            ]),
            guaranteed_reward: None,
            bonus_reward: Some(RewardTag::new("Reward.Ability.SecondWind")),
            bonus_reward_chance: DEFAULT_BONUS_REWARD_CHANCE,
            reward_choice_count: DEFAULT_REWARD_CHOICE_COUNT,
            enemy_class: Some("Admiral Kronos".into()),
            enemy_base_power: 5,
        },
        RoomDefinition {
            id: RoomId::new("Room_E_Maintenance"),
            display_name: "Maintenance Shaft".into(),
            description: "The station's forgotten underbelly. Narrow corridors wind through exposed machinery.".into(),
            theme: RewardCategory::Interactable,
            difficulty: RoomDifficulty::Medium,
            hazard: RoomHazard::LowGravity,
            eligible_levels: vec![1, 2, 3, 4, 5],
            repeatable: true,
            selection_weight: 1.1,
            reward_pool: pool(&[
                ("Reward.Interact.ExplosiveValves", 1.2, 1),
                ("Reward.Interact.GravityWells", 0.8, 2),
                ("Reward.Interact.TurretHack", 0.8, 2),
                ("Reward.Interact.EmergencyVent", 1.2, 1),
                ("Reward.Interact.PowerSurge", 1.0, 1),
            ]),
            guaranteed_reward: None,
            bonus_reward: Some(RewardTag::new("Reward.Defense.CounterStrike")),
            bonus_reward_chance: DEFAULT_BONUS_REWARD_CHANCE,
            reward_choice_count: DEFAULT_REWARD_CHOICE_COUNT,
            enemy_class: Some("Unit M-471".into()),
            enemy_base_power: 3,
        },
    ]
}
