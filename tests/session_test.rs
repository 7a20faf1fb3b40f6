//! Session checkpoints: what the ledger remembers after completed, failed and
//! interrupted runs.

use atlas_run::ledger::{LoadOutcome, MemorySlotStore};
use atlas_run::rewards::RewardTag;
use atlas_run::run::RunState;
use atlas_run::selection::ChoiceOutcome;
use atlas_run::session::{GameSession, RunStart};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn fight_to_selection(session: &mut GameSession<MemorySlotStore>, rng: &mut ChaCha8Rng) {
    session.tick(3_000, rng);
    session.machine_mut().on_enemy_defeated().unwrap();
    session.tick(2_000, rng);
    assert_eq!(session.machine().state(), RunState::RewardSelection);
}

/// Takes the first offered reward, or skips when it cannot be placed.
fn take_first_reward(session: &mut GameSession<MemorySlotStore>) {
    let tag = session.machine().selection().choices()[0].tag.clone();
    match session.machine_mut().choose_reward(&tag) {
        Ok(ChoiceOutcome::Equipped { .. } | ChoiceOutcome::Enhanced { .. }) => {}
        _ => session.machine_mut().skip_reward().unwrap(),
    }
    session.pump();
}

fn reopen(session: &GameSession<MemorySlotStore>) -> GameSession<MemorySlotStore> {
    GameSession::headless(session.manager().store().clone()).unwrap()
}

#[test]
fn test_completed_run_keeps_loadout_and_counts() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut session = GameSession::headless(MemorySlotStore::new()).unwrap();
    session.start_run(&mut rng).unwrap();

    while session.machine().is_run_active() {
        fight_to_selection(&mut session, &mut rng);
        take_first_reward(&mut session);
        session.tick(2_000, &mut rng);
    }

    assert_eq!(session.machine().state(), RunState::RunComplete);
    let snapshot = session.machine().inventory().snapshot();
    let ledger = session.ledger();
    assert_eq!(ledger.lifetime.total_runs_completed, 1);
    assert_eq!(ledger.lifetime.best_run_rooms, 5);
    assert!(ledger.lifetime.fastest_run_ms.is_some());
    assert!(!ledger.has_run_in_progress());
    assert_eq!(ledger.equipped_rewards, snapshot);
    assert!(!ledger.unlocked_rewards.is_empty());

    let reopened = reopen(&session);
    assert_eq!(reopened.load_outcome(), &LoadOutcome::Loaded);
    assert_eq!(reopened.machine().inventory().snapshot(), snapshot);
    assert_eq!(reopened.ledger().lifetime.total_runs_completed, 1);
}

#[test]
fn test_failed_run_drops_rewards_from_that_run() {
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let mut session = GameSession::headless(MemorySlotStore::new()).unwrap();
    let before = session.machine().inventory().snapshot();
    session.start_run(&mut rng).unwrap();

    fight_to_selection(&mut session, &mut rng);
    take_first_reward(&mut session);
    session.machine_mut().report_station_integrity(0.0);
    session.pump();

    assert_eq!(session.machine().state(), RunState::RunFailed);
    assert_eq!(session.machine().inventory().snapshot(), before);
    assert_eq!(session.ledger().lifetime.station_destructions, 1);
    assert_eq!(session.ledger().lifetime.total_runs_completed, 0);
    assert_eq!(session.ledger().lifetime.best_run_rooms, 1);
}

#[test]
fn test_interrupted_run_resumes_after_reload() {
    let mut rng = ChaCha8Rng::seed_from_u64(15);
    let mut session = GameSession::headless(MemorySlotStore::new()).unwrap();
    assert_eq!(session.start_run(&mut rng).unwrap(), RunStart::Fresh);

    fight_to_selection(&mut session, &mut rng);
    session.machine_mut().skip_reward().unwrap();
    session.pump();
    assert!(session.ledger().has_run_in_progress());
    assert_eq!(session.ledger().current_run.current_level, 2);

    // Dropped without finishing the run.
    let mut reopened = reopen(&session);
    assert!(reopened.ledger().has_run_in_progress());
    assert_eq!(
        reopened.start_run(&mut rng).unwrap(),
        RunStart::Resumed { level: 2 }
    );
    assert_eq!(reopened.machine().current_level(), Some(2));
    assert_eq!(reopened.machine().progress().unwrap().rooms_completed(), 1);
}

#[test]
fn test_starting_new_run_discards_saved_progress() {
    let mut rng = ChaCha8Rng::seed_from_u64(16);
    let mut session = GameSession::headless(MemorySlotStore::new()).unwrap();
    session.start_run(&mut rng).unwrap();
    fight_to_selection(&mut session, &mut rng);
    session.machine_mut().skip_reward().unwrap();
    session.pump();

    let mut reopened = reopen(&session);
    reopened.start_new_run(&mut rng).unwrap();
    assert_eq!(reopened.machine().current_level(), Some(1));
    assert!(!reopened.ledger().has_run_in_progress());
}

#[test]
fn test_selected_rewards_are_unlocked() {
    let mut rng = ChaCha8Rng::seed_from_u64(23);
    let mut session = GameSession::headless(MemorySlotStore::new()).unwrap();
    session.start_run(&mut rng).unwrap();
    fight_to_selection(&mut session, &mut rng);

    let tag: RewardTag = session.machine().selection().choices()[0].tag.clone();
    let outcome = session.machine_mut().choose_reward(&tag).unwrap();
    session.pump();

    if !matches!(outcome, ChoiceOutcome::AwaitingSlot { .. }) {
        assert!(session.ledger().is_reward_unlocked(&tag));
    }
}
