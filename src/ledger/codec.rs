//! Binary envelope for persisted ledgers.
//!
//! Layout:
//! - Magic (8 bytes)
//! - Schema version (4 bytes)
//! - Ledger checksum (4 bytes)
//! - Body length (4 bytes)
//! - Bincode body (variable length)
//! - SHA256 over everything above (32 bytes)

use super::checksum::{compute_checksum, compute_v1_checksum};
use super::types::{LedgerError, LedgerV1, PersistenceLedger, Result};
use crate::core::constants::{LEDGER_MAGIC, LEDGER_SCHEMA_VERSION};
use sha2::{Digest, Sha256};

const HEADER_LEN: usize = 8 + 4 + 4 + 4;
const DIGEST_LEN: usize = 32;

/// Serializes the ledger as-is; callers stamp the checksum first.
pub fn encode(ledger: &PersistenceLedger) -> Result<Vec<u8>> {
    let body = bincode::serialize(ledger)?;
    Ok(frame(ledger.schema_version, ledger.checksum, &body))
}

#[cfg(test)]
pub(crate) fn encode_v1(ledger: &LedgerV1) -> Result<Vec<u8>> {
    let body = bincode::serialize(ledger)?;
    Ok(frame(1, ledger.checksum, &body))
}

fn frame(version: u32, checksum: u32, body: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + body.len() + DIGEST_LEN);
    bytes.extend_from_slice(&LEDGER_MAGIC.to_le_bytes());
    bytes.extend_from_slice(&version.to_le_bytes());
    bytes.extend_from_slice(&checksum.to_le_bytes());
    bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
    bytes.extend_from_slice(body);
    let digest = Sha256::digest(&bytes);
    bytes.extend_from_slice(&digest);
    bytes
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(word)
}

/// Decodes and verifies an envelope, migrating older schema versions.
///
/// Returns the ledger together with the schema version it was stored as.
pub fn decode(bytes: &[u8]) -> Result<(PersistenceLedger, u32)> {
    if bytes.len() < HEADER_LEN + DIGEST_LEN {
        return Err(LedgerError::Corrupted(format!(
            "truncated save ({} bytes)",
            bytes.len()
        )));
    }

    let mut magic = [0u8; 8];
    magic.copy_from_slice(&bytes[..8]);
    let magic = u64::from_le_bytes(magic);
    if magic != LEDGER_MAGIC {
        return Err(LedgerError::Corrupted(format!(
            "invalid magic: expected 0x{:016X}, got 0x{:016X}",
            LEDGER_MAGIC, magic
        )));
    }

    let (payload, stored_digest) = bytes.split_at(bytes.len() - DIGEST_LEN);
    if Sha256::digest(payload).as_slice() != stored_digest {
        return Err(LedgerError::Corrupted("digest verification failed".into()));
    }

    let version = read_u32(payload, 8);
    let stored_checksum = read_u32(payload, 12);
    let body_len = read_u32(payload, 16) as usize;
    let body = &payload[HEADER_LEN..];
    if body.len() != body_len {
        return Err(LedgerError::Corrupted(format!(
            "body length {} does not match header {}",
            body.len(),
            body_len
        )));
    }

    match version {
        1 => {
            let old: LedgerV1 = bincode::deserialize(body)?;
            // Version 1 writers that never stamped a checksum left it at 0.
            if stored_checksum != 0 || old.checksum != 0 {
                let computed = compute_v1_checksum(&old);
                if computed != stored_checksum || old.checksum != stored_checksum {
                    return Err(LedgerError::ChecksumMismatch {
                        stored: stored_checksum,
                        computed,
                    });
                }
            }
            let mut ledger = PersistenceLedger::from(old);
            ledger.refresh_checksum();
            Ok((ledger, 1))
        }
        LEDGER_SCHEMA_VERSION => {
            let ledger: PersistenceLedger = bincode::deserialize(body)?;
            if ledger.schema_version != version {
                return Err(LedgerError::Corrupted(format!(
                    "body schema {} disagrees with header {}",
                    ledger.schema_version, version
                )));
            }
            let computed = compute_checksum(&ledger);
            if computed != stored_checksum || ledger.checksum != stored_checksum {
                return Err(LedgerError::ChecksumMismatch {
                    stored: stored_checksum,
                    computed,
                });
            }
            Ok((ledger, version))
        }
        v if v > LEDGER_SCHEMA_VERSION => Err(LedgerError::UnsupportedVersion {
            found: v,
            supported: LEDGER_SCHEMA_VERSION,
        }),
        v => Err(LedgerError::Corrupted(format!("unknown schema version {v}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped() -> PersistenceLedger {
        let mut ledger = PersistenceLedger::new();
        ledger.lifetime.total_runs_completed = 4;
        ledger.lifetime.total_deaths = 2;
        ledger.refresh_checksum();
        ledger
    }

    #[test]
    fn test_decode_accepts_encoded() {
        let ledger = stamped();
        let bytes = encode(&ledger).unwrap();
        let (decoded, version) = decode(&bytes).unwrap();
        assert_eq!(version, LEDGER_SCHEMA_VERSION);
        assert_eq!(decoded, ledger);
    }

    #[test]
    fn test_flipped_body_byte_fails_digest() {
        let mut bytes = encode(&stamped()).unwrap();
        bytes[HEADER_LEN + 2] ^= 0xFF;
        assert!(matches!(decode(&bytes), Err(LedgerError::Corrupted(_))));
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode(&stamped()).unwrap();
        bytes[0] ^= 0x01;
        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("invalid magic"));
    }

    #[test]
    fn test_truncated() {
        assert!(matches!(decode(&[0u8; 10]), Err(LedgerError::Corrupted(_))));
    }

    #[test]
    fn test_stale_checksum_detected() {
        let mut ledger = stamped();
        ledger.lifetime.total_deaths = 99;
        let bytes = encode(&ledger).unwrap();
        assert!(matches!(
            decode(&bytes),
            Err(LedgerError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_newer_version_rejected() {
        let mut ledger = stamped();
        ledger.schema_version = LEDGER_SCHEMA_VERSION + 1;
        let bytes = encode(&ledger).unwrap();
        assert!(matches!(
            decode(&bytes),
            Err(LedgerError::UnsupportedVersion { found, .. }) if found == LEDGER_SCHEMA_VERSION + 1
        ));
    }

    #[test]
    fn test_v1_migrates() {
        let mut old = LedgerV1::default();
        old.lifetime.total_runs_completed = 7;
        old.lifetime.highest_room_reached = 4;
        old.lifetime.total_deaths = 3;
        let bytes = encode_v1(&old).unwrap();

        let (ledger, version) = decode(&bytes).unwrap();
        assert_eq!(version, 1);
        assert_eq!(ledger.schema_version, LEDGER_SCHEMA_VERSION);
        assert_eq!(ledger.lifetime.total_runs_completed, 7);
        assert_eq!(ledger.lifetime.best_run_rooms, 4);
        assert_eq!(ledger.lifetime.total_deaths, 3);
        assert_eq!(ledger.lifetime.station_destructions, 0);
        assert!(ledger.unlocked_rewards.is_empty());
        assert_eq!(ledger.checksum, ledger.compute_checksum());
    }

    fn stamped_v1() -> LedgerV1 {
        let mut old = LedgerV1::default();
        old.lifetime.total_runs_completed = 2;
        old.lifetime.total_enemies_defeated = 9;
        old.checksum = compute_v1_checksum(&old);
        old
    }

    #[test]
    fn test_v1_with_valid_checksum_migrates() {
        let old = stamped_v1();
        assert_ne!(old.checksum, 0);
        let (ledger, version) = decode(&encode_v1(&old).unwrap()).unwrap();
        assert_eq!(version, 1);
        assert_eq!(ledger.lifetime.total_enemies_defeated, 9);
    }

    #[test]
    fn test_v1_checksum_mismatch_rejected() {
        let mut old = stamped_v1();
        old.checksum = 0xDEAD_BEEF;
        assert!(matches!(
            decode(&encode_v1(&old).unwrap()),
            Err(LedgerError::ChecksumMismatch { stored: 0xDEAD_BEEF, .. })
        ));

        let mut edited = stamped_v1();
        edited.lifetime.total_runs_completed = 50;
        assert!(matches!(
            decode(&encode_v1(&edited).unwrap()),
            Err(LedgerError::ChecksumMismatch { .. })
        ));
    }
}
