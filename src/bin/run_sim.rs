//! Headless Run Simulator
//!
//! Plays runs through the same `GameSession` the game uses, with an
//! auto-playing policy standing in for the player: it wins every fight it
//! survives, takes the first reward offered and lets the ledger carry the
//! loadout between runs.
//!
//! Usage:
//!   cargo run --bin run-sim -- [OPTIONS]
//!
//! Options:
//!   --runs N         Number of runs with incrementing seeds (default: 10)
//!   --seed N         RNG seed (default: 42)
//!   --config FILE    JSON tuning file (default: built-in)
//!   --save-dir DIR   Persist the ledger under DIR (default: in memory)
//!   --verbose        Per-event logging
//!   --quiet          Only final summary line

use atlas_run::core::logging::init_logging;
use atlas_run::core::{AtlasConfig, TICK_INTERVAL_MS};
use atlas_run::ledger::{FileSlotStore, MemorySlotStore, SaveSlotStore};
use atlas_run::run::{RunEvent, RunOutcome, RunState};
use atlas_run::selection::ChoiceOutcome;
use atlas_run::session::GameSession;
use atlas_run::{rewards::RewardCatalog, rooms::RoomCatalog, run::Collaborators};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::process;
use tracing::Level;

/// Hard stop for a run that never reaches a terminal state.
const MAX_STEPS_PER_RUN: u32 = 100_000;

// ── CLI Configuration ────────────────────────────────────────────────

struct SimConfig {
    runs: u32,
    seed: u64,
    config_path: Option<PathBuf>,
    save_dir: Option<PathBuf>,
    verbose: bool,
    quiet: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            runs: 10,
            seed: 42,
            config_path: None,
            save_dir: None,
            verbose: false,
            quiet: false,
        }
    }
}

fn fail_usage(message: &str) -> ! {
    eprintln!("{message}");
    print_usage();
    process::exit(1);
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> T {
    value
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_else(|| fail_usage(&format!("{flag} requires a number")))
}

fn parse_args() -> SimConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = SimConfig::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--runs" => {
                i += 1;
                config.runs = parse_number("--runs", args.get(i));
            }
            "--seed" => {
                i += 1;
                config.seed = parse_number("--seed", args.get(i));
            }
            "--config" => {
                i += 1;
                let path = args
                    .get(i)
                    .unwrap_or_else(|| fail_usage("--config requires a path"));
                config.config_path = Some(PathBuf::from(path));
            }
            "--save-dir" => {
                i += 1;
                let dir = args
                    .get(i)
                    .unwrap_or_else(|| fail_usage("--save-dir requires a path"));
                config.save_dir = Some(PathBuf::from(dir));
            }
            "--verbose" => config.verbose = true,
            "--quiet" => config.quiet = true,
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            other => fail_usage(&format!("Unknown argument: {other}")),
        }
        i += 1;
    }
    config
}

fn print_usage() {
    eprintln!(
        "Atlas Run Simulator\n\
         \n\
         Usage: run-sim [OPTIONS]\n\
         \n\
         Options:\n\
         \x20 --runs N         Number of runs with incrementing seeds (default: 10)\n\
         \x20 --seed N         RNG seed (default: 42)\n\
         \x20 --config FILE    JSON tuning file (default: built-in)\n\
         \x20 --save-dir DIR   Persist the ledger under DIR (default: in memory)\n\
         \x20 --verbose        Per-event logging\n\
         \x20 --quiet          Only final summary line\n\
         \x20 --help, -h       Show this help"
    );
}

// ── Simulation Statistics ────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct RunStats {
    success: bool,
    reason: String,
    rooms_cleared: u32,
    elapsed_ms: u64,
    rewards_taken: u32,
    rewards_skipped: u32,
    slots_used: usize,
}

impl RunStats {
    fn finish(&mut self, outcome: &RunOutcome, slots_used: usize) {
        self.success = outcome.success;
        self.reason = outcome.reason.clone();
        self.rooms_cleared = outcome.progress.rooms_completed();
        self.elapsed_ms = outcome.progress.elapsed_ms;
        self.slots_used = slots_used;
    }
}

// ── Core Simulation Loop ─────────────────────────────────────────────

/// Damage the policy takes per fight, before reductions.
fn combat_damage<R: Rng>(enemy_power: u32, rng: &mut R) -> f32 {
    rng.gen_range(2.0_f32..8.0) * enemy_power as f32
}

fn play_run<S: SaveSlotStore>(
    session: &mut GameSession<S>,
    seed: u64,
    verbose: bool,
) -> RunStats {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut stats = RunStats::default();
    let mut health = atlas_run::core::FULL_HEALTH;
    let mut enemy_power = 1;

    if let Err(err) = session.start_new_run(&mut rng) {
        stats.reason = err.to_string();
        return stats;
    }

    for _ in 0..MAX_STEPS_PER_RUN {
        let machine = session.machine_mut();
        match machine.state() {
            RunState::Combat => {
                let reduction = machine
                    .inventory()
                    .stat_modifier("DamageReduction")
                    .clamp(0.0, 0.9);
                let taken = combat_damage(enemy_power, &mut rng) * (1.0 - reduction);
                health -= taken;
                machine.record_damage_taken(taken);
                machine.report_player_health(health);
                if machine.is_run_active() {
                    machine.record_damage_dealt(rng.gen_range(50.0_f32..150.0));
                    if let Err(err) = machine.on_enemy_defeated() {
                        tracing::warn!(%err, "policy could not finish combat");
                    }
                }
            }
            RunState::RewardSelection if machine.selection().pending_reward().is_some() => {
                // First slot the reward can replace into.
                let max_slots = machine.inventory().max_slots();
                let chosen = (0..max_slots).any(|slot| machine.choose_slot(slot).is_ok());
                if chosen {
                    stats.rewards_taken += 1;
                } else if machine.skip_reward().is_ok() {
                    stats.rewards_skipped += 1;
                }
            }
            RunState::RewardSelection => {
                let first = machine.selection().choices().first().map(|r| r.tag.clone());
                match first.map(|tag| machine.choose_reward(&tag)) {
                    Some(Ok(ChoiceOutcome::AwaitingSlot { .. })) => {}
                    Some(Ok(_)) => stats.rewards_taken += 1,
                    _ => {
                        if machine.skip_reward().is_ok() {
                            stats.rewards_skipped += 1;
                        }
                    }
                }
            }
            _ => {}
        }

        let mut events = session.pump();
        if session.machine().is_run_active() {
            events.extend(session.tick(TICK_INTERVAL_MS, &mut rng));
        }

        for event in &events {
            if verbose {
                print_event(event);
            }
            match event {
                RunEvent::CombatStarted { enemy_power: power, .. } => enemy_power = *power,
                RunEvent::RunCompleted(outcome) | RunEvent::RunFailed(outcome) => {
                    stats.finish(outcome, session.machine().inventory().used_slot_count());
                    return stats;
                }
                _ => {}
            }
        }
    }

    session.machine_mut().abandon_run();
    if let Some(outcome) = session.machine().last_outcome() {
        stats.finish(outcome, session.machine().inventory().used_slot_count());
    }
    session.pump();
    stats
}

// ── Output ───────────────────────────────────────────────────────────

fn print_event(event: &RunEvent) {
    let line = match event {
        RunEvent::RunStarted { total_rooms, .. } => format!("Run started ({total_rooms} rooms)"),
        RunEvent::RoomStarted { level, room, .. } => format!("Room {level}: {room}"),
        RunEvent::CombatStarted { enemy_power, .. } => format!("Combat, enemy power {enemy_power}"),
        RunEvent::RewardsOffered { choices, .. } => {
            let names: Vec<_> = choices.iter().map(|tag| tag.as_str()).collect();
            format!("Offered: {}", names.join(", "))
        }
        RunEvent::RewardResolved(done) => match &done.reward {
            Some(tag) => format!("{:?}: {tag}", done.result),
            None => format!("{:?}", done.result),
        },
        RunEvent::RoomCompleted { level, room } => format!("Cleared room {level} ({room})"),
        RunEvent::RunCompleted(outcome) | RunEvent::RunFailed(outcome) => {
            format!("Run over: {}", outcome.reason)
        }
        RunEvent::StateChanged { .. }
        | RunEvent::SlotChoiceRequired { .. }
        | RunEvent::Slot(_) => return,
    };
    println!("  {line}");
}

fn print_summary<S: SaveSlotStore>(all: &[RunStats], session: &GameSession<S>) {
    let runs = all.len().max(1) as f64;
    let wins = all.iter().filter(|s| s.success).count();
    let rooms: u32 = all.iter().map(|s| s.rooms_cleared).sum();
    let taken: u32 = all.iter().map(|s| s.rewards_taken).sum();
    let skipped: u32 = all.iter().map(|s| s.rewards_skipped).sum();
    let lifetime = &session.ledger().lifetime;

    println!("=== Summary ({} runs) ===", all.len());
    println!(
        "Win rate:        {:.1}% ({wins}/{})",
        wins as f64 / runs * 100.0,
        all.len()
    );
    println!("Avg rooms:       {:.2}", rooms as f64 / runs);
    println!("Rewards taken:   {taken} (skipped {skipped})");
    println!(
        "Ledger:          {} completed, {} deaths, best room {}, fastest {}",
        lifetime.total_runs_completed,
        lifetime.total_deaths,
        lifetime.highest_room_reached,
        lifetime
            .fastest_run_ms
            .map(|ms| format!("{:.1}s", ms as f64 / 1000.0))
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "Final loadout:   {}/{} slots",
        session.machine().inventory().used_slot_count(),
        session.machine().inventory().max_slots()
    );
}

fn simulate<S: SaveSlotStore>(config: &SimConfig, mut session: GameSession<S>) {
    let mut all = Vec::with_capacity(config.runs as usize);
    for run in 0..config.runs {
        let seed = config.seed + run as u64;
        if config.verbose {
            println!("--- Run {}/{} (seed={seed}) ---", run + 1, config.runs);
        }
        let stats = play_run(&mut session, seed, config.verbose);
        if !config.quiet {
            println!(
                "  Run {}: {} rooms={} time={:.1}s rewards={} slots={} ({})",
                run + 1,
                if stats.success { "WIN " } else { "LOSS" },
                stats.rooms_cleared,
                stats.elapsed_ms as f64 / 1000.0,
                stats.rewards_taken,
                stats.slots_used,
                stats.reason,
            );
        }
        all.push(stats);
    }
    println!();
    print_summary(&all, &session);
}

fn main() {
    let config = parse_args();
    init_logging(if config.verbose { Level::DEBUG } else { Level::WARN });

    let tuning = match &config.config_path {
        Some(path) => AtlasConfig::load(path).unwrap_or_else(|err| {
            eprintln!("Failed to load {}: {err}", path.display());
            process::exit(1);
        }),
        None => AtlasConfig::default(),
    };
    let rewards = RewardCatalog::builtin();
    let rooms = RoomCatalog::builtin(&rewards).unwrap_or_else(|err| {
        eprintln!("Built-in room catalog is invalid: {err}");
        process::exit(1);
    });

    if !config.quiet {
        eprintln!(
            "Atlas Run Simulator: {} run(s), seed={}, {} rooms, {} slots",
            config.runs,
            config.seed,
            rooms.total_rooms(),
            tuning.slots.max_slots,
        );
    }

    match &config.save_dir {
        Some(dir) => {
            let store = FileSlotStore::at(dir).unwrap_or_else(|err| {
                eprintln!("Cannot use save directory {}: {err}", dir.display());
                process::exit(1);
            });
            let session =
                GameSession::new(tuning, rewards, &rooms, Collaborators::default(), store);
            eprintln!("Ledger: {:?}", session.load_outcome());
            simulate(&config, session);
        }
        None => {
            let session = GameSession::new(
                tuning,
                rewards,
                &rooms,
                Collaborators::default(),
                MemorySlotStore::new(),
            );
            simulate(&config, session);
        }
    }
}
