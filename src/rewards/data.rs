//! Built-in reward definitions.

use super::types::{RewardCategory, RewardDescriptor, RewardTag};

/// Static authoring form of a reward, converted to a [`RewardDescriptor`] on load.
#[derive(Debug, Clone, Copy)]
pub struct RewardDef {
    pub tag: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: RewardCategory,
    pub slot_cost: u8,
    pub max_stack_level: u8,
    pub stack_multipliers: &'static [f32],
    pub stat_modifiers: &'static [(&'static str, f32)],
    pub incompatible_with: &'static [&'static str],
    pub linked_action: Option<&'static str>,
}

impl RewardDef {
    pub fn to_descriptor(&self) -> RewardDescriptor {
        RewardDescriptor {
            tag: RewardTag::new(self.tag),
            display_name: self.name.to_string(),
            description: self.description.to_string(),
            category: self.category,
            slot_cost: self.slot_cost,
            max_stack_level: self.max_stack_level,
            stack_multipliers: self.stack_multipliers.to_vec(),
            stat_modifiers: self
                .stat_modifiers
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
            incompatible_with: self
                .incompatible_with
                .iter()
                .map(|tag| RewardTag::new(*tag))
                .collect(),
            linked_action: self.linked_action.map(str::to_string),
        }
    }
}

/// Every shipped reward, grouped by theme.
pub const BUILTIN_REWARDS: &[RewardDef] = &[
    // ═══════════════════════════════════════════════════════════════
    // DEFENSE
    // ═══════════════════════════════════════════════════════════════
    RewardDef {
        tag: "Reward.Defense.ImprovedBlock",
        name: "Improved Block",
        description: "Enhances your blocking ability, reducing more damage with each stack",
        category: RewardCategory::Defense,
        slot_cost: 1,
        max_stack_level: 3,
        stack_multipliers: &[0.6, 0.7, 0.8],
        stat_modifiers: &[],
        incompatible_with: &[],
        linked_action: Some("Action.Combat.Block"),
    },
    RewardDef {
        tag: "Reward.Defense.ParryMaster",
        name: "Parry Master",
        description: "Extends parry timing windows, making perfect parries easier",
        category: RewardCategory::Defense,
        slot_cost: 1,
        max_stack_level: 2,
        stack_multipliers: &[1.5, 2.0],
        stat_modifiers: &[],
        incompatible_with: &[],
        linked_action: Some("Ability.Parry.Extended"),
    },
    RewardDef {
        tag: "Reward.Defense.CounterStrike",
        name: "Counter Strike",
        description: "Automatically counter-attack after a successful parry",
        category: RewardCategory::Defense,
        slot_cost: 2,
        max_stack_level: 1,
        stack_multipliers: &[],
        stat_modifiers: &[],
        incompatible_with: &[],
        linked_action: Some("Ability.Counter.Auto"),
    },
    RewardDef {
        tag: "Reward.Defense.IronSkin",
        name: "Iron Skin",
        description: "Reduces all incoming damage by a percentage",
        category: RewardCategory::PassiveStats,
        slot_cost: 1,
        max_stack_level: 3,
        stack_multipliers: &[1.0, 1.5, 2.0],
        stat_modifiers: &[("DamageReduction", 0.1)],
        incompatible_with: &[],
        linked_action: None,
    },
    RewardDef {
        tag: "Reward.Defense.LastStand",
        name: "Last Stand",
        description: "Blocks cannot be broken when health is below 25%",
        category: RewardCategory::PassiveAbility,
        slot_cost: 2,
        max_stack_level: 1,
        stack_multipliers: &[],
        stat_modifiers: &[],
        incompatible_with: &["Reward.Ability.Berserker"],
        linked_action: Some("Ability.LastStand"),
    },
    // ═══════════════════════════════════════════════════════════════
    // OFFENSE
    // ═══════════════════════════════════════════════════════════════
    RewardDef {
        tag: "Reward.Offense.SharpBlade",
        name: "Sharp Blade",
        description: "Increases all melee damage dealt",
        category: RewardCategory::PassiveStats,
        slot_cost: 1,
        max_stack_level: 3,
        stack_multipliers: &[1.0, 1.75, 2.5],
        stat_modifiers: &[("DamageMultiplier", 0.2)],
        incompatible_with: &[],
        linked_action: None,
    },
    RewardDef {
        tag: "Reward.Offense.HeavyImpact",
        name: "Heavy Impact",
        description: "Heavy attacks create AOE shockwaves on impact",
        category: RewardCategory::Offense,
        slot_cost: 2,
        max_stack_level: 2,
        stack_multipliers: &[1.0, 1.5],
        stat_modifiers: &[],
        incompatible_with: &[],
        linked_action: Some("Action.Combat.HeavyAttack"),
    },
    RewardDef {
        tag: "Reward.Offense.BleedingStrikes",
        name: "Bleeding Strikes",
        description: "All attacks apply bleeding damage over time",
        category: RewardCategory::PassiveAbility,
        slot_cost: 1,
        max_stack_level: 3,
        stack_multipliers: &[1.0, 1.5, 2.0],
        stat_modifiers: &[],
        incompatible_with: &[],
        linked_action: Some("Ability.DOT.Bleed"),
    },
    RewardDef {
        tag: "Reward.Offense.Executioner",
        name: "Executioner",
        description: "Deal double damage to stunned or staggered enemies",
        category: RewardCategory::PassiveAbility,
        slot_cost: 2,
        max_stack_level: 1,
        stack_multipliers: &[],
        stat_modifiers: &[],
        incompatible_with: &[],
        linked_action: Some("Ability.Execution"),
    },
    RewardDef {
        tag: "Reward.Offense.RapidStrikes",
        name: "Rapid Strikes",
        description: "Increases attack speed for all melee attacks",
        category: RewardCategory::PassiveStats,
        slot_cost: 1,
        max_stack_level: 3,
        stack_multipliers: &[1.0, 1.5, 2.0],
        stat_modifiers: &[("AttackSpeed", 0.3)],
        incompatible_with: &[],
        linked_action: None,
    },
    // ═══════════════════════════════════════════════════════════════
    // PASSIVE STATS
    // ═══════════════════════════════════════════════════════════════
    RewardDef {
        tag: "Reward.Passive.Vitality",
        name: "Vitality",
        description: "Increases maximum health",
        category: RewardCategory::PassiveStats,
        slot_cost: 1,
        max_stack_level: 3,
        stack_multipliers: &[1.0, 1.5, 2.0],
        stat_modifiers: &[("MaxHealth", 50.0)],
        incompatible_with: &[],
        linked_action: None,
    },
    RewardDef {
        tag: "Reward.Passive.Swiftness",
        name: "Swiftness",
        description: "Increases movement speed",
        category: RewardCategory::PassiveStats,
        slot_cost: 1,
        max_stack_level: 2,
        stack_multipliers: &[1.0, 1.5],
        stat_modifiers: &[("MoveSpeed", 0.2)],
        incompatible_with: &[],
        linked_action: None,
    },
    RewardDef {
        tag: "Reward.Passive.Heavyweight",
        name: "Heavyweight",
        description: "Increases knockback dealt and reduces knockback received",
        category: RewardCategory::PassiveStats,
        slot_cost: 1,
        max_stack_level: 2,
        stack_multipliers: &[1.0, 1.5],
        stat_modifiers: &[("KnockbackForce", 0.5), ("KnockbackResistance", 0.25)],
        incompatible_with: &[],
        linked_action: None,
    },
    RewardDef {
        tag: "Reward.Passive.Regeneration",
        name: "Regeneration",
        description: "Slowly regenerate health when out of combat",
        category: RewardCategory::PassiveStats,
        slot_cost: 2,
        max_stack_level: 2,
        stack_multipliers: &[1.0, 1.5],
        stat_modifiers: &[("HealthRegenRate", 2.0), ("CombatRegenDelay", 3.0)],
        incompatible_with: &[],
        linked_action: None,
    },
    RewardDef {
        tag: "Reward.Passive.Fortitude",
        name: "Fortitude",
        description: "Increases maximum poise and poise regeneration rate",
        category: RewardCategory::PassiveStats,
        slot_cost: 1,
        max_stack_level: 3,
        stack_multipliers: &[1.0, 1.5, 2.0],
        stat_modifiers: &[("PoiseMax", 50.0), ("PoiseRegenRate", 0.5)],
        incompatible_with: &[],
        linked_action: None,
    },
    // ═══════════════════════════════════════════════════════════════
    // PASSIVE ABILITIES
    // ═══════════════════════════════════════════════════════════════
    RewardDef {
        tag: "Reward.Ability.SecondWind",
        name: "Second Wind",
        description: "Upon death, revive with 50% health once per run",
        category: RewardCategory::PassiveAbility,
        slot_cost: 3,
        max_stack_level: 1,
        stack_multipliers: &[],
        stat_modifiers: &[],
        incompatible_with: &[],
        linked_action: Some("Ability.Revive.Once"),
    },
    RewardDef {
        tag: "Reward.Ability.Vampirism",
        name: "Vampirism",
        description: "Heal for a percentage of damage dealt",
        category: RewardCategory::PassiveAbility,
        slot_cost: 2,
        max_stack_level: 2,
        stack_multipliers: &[1.0, 1.5],
        stat_modifiers: &[],
        incompatible_with: &[],
        linked_action: Some("Ability.Lifesteal"),
    },
    RewardDef {
        tag: "Reward.Ability.Berserker",
        name: "Berserker",
        description: "Deal 50% more damage when below 30% health",
        category: RewardCategory::PassiveAbility,
        slot_cost: 2,
        max_stack_level: 1,
        stack_multipliers: &[],
        stat_modifiers: &[],
        incompatible_with: &["Reward.Defense.LastStand"],
        linked_action: Some("Ability.Berserker"),
    },
    RewardDef {
        tag: "Reward.Ability.Momentum",
        name: "Momentum",
        description: "Each successful hit increases damage, resets on miss",
        category: RewardCategory::PassiveAbility,
        slot_cost: 2,
        max_stack_level: 1,
        stack_multipliers: &[],
        stat_modifiers: &[],
        incompatible_with: &[],
        linked_action: Some("Ability.Momentum"),
    },
    RewardDef {
        tag: "Reward.Ability.StationShield",
        name: "Station Shield",
        description: "50% of damage taken is redirected to station integrity",
        category: RewardCategory::PassiveAbility,
        slot_cost: 2,
        max_stack_level: 1,
        stack_multipliers: &[],
        stat_modifiers: &[],
        incompatible_with: &[],
        linked_action: Some("Ability.StationShield"),
    },
    // ═══════════════════════════════════════════════════════════════
    // INTERACTABLES
    // ═══════════════════════════════════════════════════════════════
    RewardDef {
        tag: "Reward.Interact.ExplosiveValves",
        name: "Explosive Valves",
        description: "Interact with valves to cause explosive damage in an area",
        category: RewardCategory::Interactable,
        slot_cost: 1,
        max_stack_level: 2,
        stack_multipliers: &[1.0, 1.5],
        stat_modifiers: &[],
        incompatible_with: &[],
        linked_action: None,
    },
    RewardDef {
        tag: "Reward.Interact.GravityWells",
        name: "Gravity Wells",
        description: "Create gravity wells that pull and slow enemies",
        category: RewardCategory::Interactable,
        slot_cost: 2,
        max_stack_level: 1,
        stack_multipliers: &[],
        stat_modifiers: &[],
        incompatible_with: &[],
        linked_action: None,
    },
    RewardDef {
        tag: "Reward.Interact.TurretHack",
        name: "Turret Hack",
        description: "Hack station turrets to fight for you",
        category: RewardCategory::Interactable,
        slot_cost: 2,
        max_stack_level: 1,
        stack_multipliers: &[],
        stat_modifiers: &[],
        incompatible_with: &[],
        linked_action: None,
    },
    RewardDef {
        tag: "Reward.Interact.EmergencyVent",
        name: "Emergency Vent",
        description: "Trigger emergency vents to launch enemies",
        category: RewardCategory::Interactable,
        slot_cost: 1,
        max_stack_level: 2,
        stack_multipliers: &[1.0, 1.5],
        stat_modifiers: &[],
        incompatible_with: &[],
        linked_action: None,
    },
    RewardDef {
        tag: "Reward.Interact.PowerSurge",
        name: "Power Surge",
        description: "Overload panels to stun and damage nearby enemies",
        category: RewardCategory::Interactable,
        slot_cost: 1,
        max_stack_level: 3,
        stack_multipliers: &[1.0, 1.5, 2.0],
        stat_modifiers: &[],
        incompatible_with: &[],
        linked_action: None,
    },
];

/// Rewards a brand-new profile starts with.
pub const DEFAULT_LOADOUT: &[&str] = &["Reward.Defense.ImprovedBlock"];
