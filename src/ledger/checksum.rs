//! Order-sensitive checksum over the fields that matter for tamper detection.

use super::types::{LedgerV1, PersistenceLedger};
use crate::slots::SavedReward;

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a hash of a reward tag.
pub fn tag_hash(tag: &str) -> u32 {
    tag.bytes()
        .fold(FNV_OFFSET, |h, b| (h ^ b as u32).wrapping_mul(FNV_PRIME))
}

fn mix(acc: u32, value: u32) -> u32 {
    acc.rotate_left(5) ^ value
}

/// `counters` are folded before the equipped rewards, `trailer` after.
fn fold(counters: [u32; 5], equipped: &[SavedReward], trailer: [u32; 3]) -> u32 {
    let mut acc = counters.into_iter().fold(0, mix);
    acc = mix(acc, equipped.len() as u32);
    for saved in equipped {
        acc = mix(acc, tag_hash(saved.tag.as_str()) ^ saved.stack_level as u32);
    }
    trailer.into_iter().fold(acc, mix)
}

/// Reordering equipped rewards changes the result.
pub fn compute_checksum(ledger: &PersistenceLedger) -> u32 {
    let stats = &ledger.lifetime;
    fold(
        [
            ledger.schema_version,
            stats.total_runs_completed,
            stats.highest_room_reached,
            stats.total_enemies_defeated,
            stats.total_damage_dealt as u32,
        ],
        &ledger.equipped_rewards,
        [
            ledger.unlocked_rewards.len() as u32,
            stats.total_deaths,
            stats.station_destructions,
        ],
    )
}

/// Checksum as version 1 wrote it. That layout had no unlocks and no station
/// destructions, so both fold in as zero.
pub(crate) fn compute_v1_checksum(old: &LedgerV1) -> u32 {
    let stats = &old.lifetime;
    fold(
        [
            1,
            stats.total_runs_completed,
            stats.highest_room_reached,
            stats.total_enemies_defeated,
            stats.total_damage_dealt as u32,
        ],
        &old.equipped_rewards,
        [0, stats.total_deaths, 0],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::RewardTag;
    use crate::slots::SavedReward;

    fn saved(tag: &str, level: u8, slot: usize) -> SavedReward {
        SavedReward {
            tag: RewardTag::new(tag),
            stack_level: level,
            slot_index: slot,
        }
    }

    #[test]
    fn test_tag_hash_known_values() {
        assert_eq!(tag_hash(""), FNV_OFFSET);
        assert_eq!(tag_hash("a"), 0xe40c_292c);
    }

    #[test]
    fn test_checksum_changes_with_stats() {
        let mut ledger = PersistenceLedger::new();
        let before = compute_checksum(&ledger);
        ledger.lifetime.total_deaths += 1;
        assert_ne!(before, compute_checksum(&ledger));
    }

    #[test]
    fn test_checksum_is_order_sensitive() {
        let mut a = PersistenceLedger::new();
        a.equipped_rewards = vec![saved("Reward.A", 1, 0), saved("Reward.B", 2, 1)];
        let mut b = a.clone();
        b.equipped_rewards.reverse();
        assert_ne!(compute_checksum(&a), compute_checksum(&b));
    }

    #[test]
    fn test_v1_checksum_matches_migrated_fold() {
        let mut old = LedgerV1::default();
        old.lifetime.total_runs_completed = 3;
        old.lifetime.total_deaths = 2;
        old.equipped_rewards = vec![saved("Reward.A", 2, 0)];

        let mut migrated = PersistenceLedger::from(old.clone());
        assert_ne!(compute_checksum(&migrated), compute_v1_checksum(&old));
        migrated.schema_version = 1;
        assert_eq!(compute_checksum(&migrated), compute_v1_checksum(&old));
    }

    #[test]
    fn test_checksum_ignores_save_time() {
        let mut ledger = PersistenceLedger::new();
        let before = compute_checksum(&ledger);
        ledger.last_save_time = 1_700_000_000;
        assert_eq!(before, compute_checksum(&ledger));
    }
}
