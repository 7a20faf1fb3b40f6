//! Debug console commands for poking at a live session.

use crate::ledger::SaveSlotStore;
use crate::rewards::RewardTag;
use crate::session::{GameSession, RunStart};
use rand::Rng;
use std::fmt::Write as _;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Status,
    Slots,
    Give(RewardTag),
    Clear(usize),
    Swap(usize, usize),
    Reset,
    Start,
    Kill,
    Choose(RewardTag),
    Slot(usize),
    Skip,
    Abandon,
    Tick(u64),
    Save,
}

fn parse_arg<T: FromStr>(arg: Option<&str>, usage: &'static str) -> Result<T, ParseCommandError> {
    arg.and_then(|raw| raw.parse().ok())
        .ok_or(ParseCommandError::Usage(usage))
}

impl FromStr for ConsoleCommand {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(ParseCommandError::Empty)?;
        let first = words.next();
        let command = match name.to_ascii_lowercase().as_str() {
            "status" => ConsoleCommand::Status,
            "slots" => ConsoleCommand::Slots,
            "give" => ConsoleCommand::Give(RewardTag::new(
                first.ok_or(ParseCommandError::Usage("give <reward tag>"))?,
            )),
            "clear" => ConsoleCommand::Clear(parse_arg(first, "clear <slot>")?),
            "swap" => ConsoleCommand::Swap(
                parse_arg(first, "swap <slot a> <slot b>")?,
                parse_arg(words.next(), "swap <slot a> <slot b>")?,
            ),
            "reset" => ConsoleCommand::Reset,
            "start" => ConsoleCommand::Start,
            "kill" => ConsoleCommand::Kill,
            "choose" => ConsoleCommand::Choose(RewardTag::new(
                first.ok_or(ParseCommandError::Usage("choose <reward tag>"))?,
            )),
            "slot" => ConsoleCommand::Slot(parse_arg(first, "slot <index>")?),
            "skip" => ConsoleCommand::Skip,
            "abandon" => ConsoleCommand::Abandon,
            "tick" => ConsoleCommand::Tick(parse_arg(first, "tick <milliseconds>")?),
            "save" => ConsoleCommand::Save,
            other => return Err(ParseCommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

impl ConsoleCommand {
    /// Runs the command and returns the text to show the player.
    pub fn execute<S: SaveSlotStore, R: Rng>(
        &self,
        session: &mut GameSession<S>,
        rng: &mut R,
    ) -> String {
        let reply = match self {
            ConsoleCommand::Status => return status(session),
            ConsoleCommand::Slots => return slots(session),
            ConsoleCommand::Give(tag) => give(session, tag),
            ConsoleCommand::Clear(slot) => match session.machine_mut().inventory_mut().remove(*slot)
            {
                Ok(removed) => format!("Removed {} from slot {slot}", removed.tag()),
                Err(err) => format!("Cannot clear slot {slot}: {err}"),
            },
            ConsoleCommand::Swap(a, b) => match session.machine_mut().inventory_mut().swap(*a, *b) {
                Ok(()) => format!("Swapped slots {a} and {b}"),
                Err(err) => format!("Cannot swap: {err}"),
            },
            ConsoleCommand::Reset => {
                let loadout = session.rewards().default_loadout();
                session.machine_mut().inventory_mut().reset_to_loadout(&loadout);
                "Slots reset to default loadout".to_string()
            }
            ConsoleCommand::Start => match session.start_run(rng) {
                Ok(RunStart::Fresh) => "Run started".to_string(),
                Ok(RunStart::Resumed { level }) => format!("Run resumed at room {level}"),
                Err(err) => format!("Cannot start run: {err}"),
            },
            ConsoleCommand::Kill => match session.machine_mut().on_enemy_defeated() {
                Ok(()) => "Enemy defeated".to_string(),
                Err(err) => format!("Cannot kill: {err}"),
            },
            ConsoleCommand::Choose(tag) => match session.machine_mut().choose_reward(tag) {
                Ok(outcome) => format!("{outcome:?}"),
                Err(err) => format!("Cannot choose {tag}: {err}"),
            },
            ConsoleCommand::Slot(slot) => match session.machine_mut().choose_slot(*slot) {
                Ok(outcome) => format!("{outcome:?}"),
                Err(err) => format!("Cannot use slot {slot}: {err}"),
            },
            ConsoleCommand::Skip => match session.machine_mut().skip_reward() {
                Ok(()) => "Reward skipped".to_string(),
                Err(err) => format!("Cannot skip: {err}"),
            },
            ConsoleCommand::Abandon => {
                if session.machine_mut().abandon_run() {
                    "Run abandoned".to_string()
                } else {
                    "No run to abandon".to_string()
                }
            }
            ConsoleCommand::Tick(ms) => {
                let events = session.tick(*ms, rng);
                return format!(
                    "Advanced {ms} ms, {} events, state {}",
                    events.len(),
                    session.machine().state()
                );
            }
            ConsoleCommand::Save => match session.save() {
                Ok(()) => "Saved".to_string(),
                Err(err) => format!("Save failed: {err}"),
            },
        };
        session.pump();
        reply
    }
}

fn give<S: SaveSlotStore>(session: &mut GameSession<S>, tag: &RewardTag) -> String {
    let Some(reward) = session.rewards().get(tag).cloned() else {
        return format!("Unknown reward {tag}");
    };
    let inventory = session.machine_mut().inventory_mut();
    if inventory.is_equipped(tag) {
        return match inventory.enhance(tag) {
            Ok(()) => format!(
                "{} enhanced to level {}",
                reward.display_name,
                inventory.stack_level(tag).unwrap_or(0)
            ),
            Err(err) => format!("Cannot enhance {}: {err}", reward.display_name),
        };
    }
    let Some(slot) = inventory.find_best_slot(&reward) else {
        return format!("No room for {}", reward.display_name);
    };
    match inventory.equip(&reward, slot) {
        Ok(()) => format!("{} equipped in slot {slot}", reward.display_name),
        Err(err) => format!("Cannot equip {}: {err}", reward.display_name),
    }
}

fn status<S: SaveSlotStore>(session: &GameSession<S>) -> String {
    let machine = session.machine();
    let inventory = machine.inventory();
    let lifetime = &session.ledger().lifetime;
    let mut out = format!("State: {}\n", machine.state());
    if let Some(progress) = machine.progress() {
        let _ = writeln!(
            out,
            "Room {}/{}  Health {:.0}  Integrity {:.0}",
            progress.current_level,
            progress.total_rooms,
            progress.player_health,
            progress.station_integrity
        );
    }
    if let Some(room) = machine.current_room() {
        let _ = writeln!(out, "In: {} ({})", room.display_name, room.id);
    }
    if let Some(remaining) = machine.selection_time_remaining_ms() {
        let _ = writeln!(out, "Selection closes in {:.1}s", remaining as f64 / 1000.0);
    }
    let _ = writeln!(
        out,
        "Slots: {}/{} used",
        inventory.used_slot_count(),
        inventory.max_slots()
    );
    let _ = write!(
        out,
        "Lifetime: {} runs completed, best room {}, {} deaths",
        lifetime.total_runs_completed, lifetime.highest_room_reached, lifetime.total_deaths
    );
    out
}

fn slots<S: SaveSlotStore>(session: &GameSession<S>) -> String {
    let inventory = session.machine().inventory();
    let mut out = String::new();
    for index in 0..inventory.max_slots() {
        match inventory.reward_in_slot(index) {
            Some(equipped) => {
                let _ = writeln!(
                    out,
                    "[{index}] {} Lv{}/{} (cost {})",
                    equipped.reward.display_name,
                    equipped.stack_level,
                    equipped.reward.max_stack_level,
                    equipped.reward.slot_cost
                );
            }
            None => {
                let _ = writeln!(out, "[{index}] -");
            }
        }
    }
    let _ = write!(out, "{} capacity free", inventory.available_slot_count());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemorySlotStore;
    use crate::run::RunState;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_parse_commands() {
        assert_eq!("status".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Status));
        assert_eq!("SWAP 1 2".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Swap(1, 2)));
        assert_eq!("tick 250".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Tick(250)));
        assert_eq!(
            "give Reward.Offense.SharpBlade".parse::<ConsoleCommand>(),
            Ok(ConsoleCommand::Give(RewardTag::new("Reward.Offense.SharpBlade")))
        );
        assert_eq!(
            "swap 1".parse::<ConsoleCommand>(),
            Err(ParseCommandError::Usage("swap <slot a> <slot b>"))
        );
        assert_eq!("".parse::<ConsoleCommand>(), Err(ParseCommandError::Empty));
        assert!(matches!(
            "dance".parse::<ConsoleCommand>(),
            Err(ParseCommandError::Unknown(_))
        ));
    }

    #[test]
    fn test_give_equips_then_enhances() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut session = GameSession::headless(MemorySlotStore::new()).unwrap();
        let give = ConsoleCommand::Give(RewardTag::new("Reward.Offense.SharpBlade"));

        let first = give.execute(&mut session, &mut rng);
        assert!(first.contains("equipped"), "{first}");
        let second = give.execute(&mut session, &mut rng);
        assert!(second.contains("level 2"), "{second}");
    }

    #[test]
    fn test_start_tick_kill_flow() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut session = GameSession::headless(MemorySlotStore::new()).unwrap();
        ConsoleCommand::Start.execute(&mut session, &mut rng);
        assert_eq!(session.machine().state(), RunState::RoomIntro);

        ConsoleCommand::Tick(3_000).execute(&mut session, &mut rng);
        assert_eq!(session.machine().state(), RunState::Combat);

        let reply = ConsoleCommand::Kill.execute(&mut session, &mut rng);
        assert_eq!(reply, "Enemy defeated");
        assert_eq!(session.machine().state(), RunState::Victory);

        let status = ConsoleCommand::Status.execute(&mut session, &mut rng);
        assert!(status.starts_with("State: Victory"));
    }

    #[test]
    fn test_commands_outside_a_run_report_errors() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut session = GameSession::headless(MemorySlotStore::new()).unwrap();
        let reply = ConsoleCommand::Kill.execute(&mut session, &mut rng);
        assert!(reply.starts_with("Cannot kill"));
        assert_eq!(
            ConsoleCommand::Abandon.execute(&mut session, &mut rng),
            "No run to abandon"
        );
    }
}
