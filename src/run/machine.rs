use super::collaborators::{Collaborators, SpawnRequest};
use super::types::*;
use crate::core::config::{AtlasConfig, RunTiming};
use crate::core::constants::{FULL_HEALTH, FULL_INTEGRITY, STARTING_LEVEL};
use crate::core::events::EventQueue;
use crate::core::scheduler::{Scheduler, TimerHandle};
use crate::rewards::RewardTag;
use crate::rooms::{PlacedRoom, RoomCatalog, RoomDescriptor, RoomId, RoomSequencer};
use crate::selection::{ChoiceOutcome, RewardSelectionFlow, SelectionError, SelectionEvent};
use crate::slots::SlotInventory;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct ActiveRoom {
    placed: PlacedRoom,
    descriptor: Arc<RoomDescriptor>,
}

/// Mutable state of the run in progress.
#[derive(Debug, Clone)]
struct RunSession {
    id: Uuid,
    current_level: u32,
    room_order: Vec<PlacedRoom>,
    completed_rooms: Vec<RoomId>,
    current_room: Option<ActiveRoom>,
    current_enemy: Option<EnemyHandle>,
    stats: RunStatistics,
    player_health: f32,
    station_integrity: f32,
    started_at_ms: u64,
    resumed_elapsed_ms: u64,
}

impl RunSession {
    fn new(room_order: Vec<PlacedRoom>, now_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            current_level: STARTING_LEVEL,
            room_order,
            completed_rooms: Vec::new(),
            current_room: None,
            current_enemy: None,
            stats: RunStatistics::default(),
            player_health: FULL_HEALTH,
            station_integrity: FULL_INTEGRITY,
            started_at_ms: now_ms,
            resumed_elapsed_ms: 0,
        }
    }

    fn progress(&self, now_ms: u64) -> RunProgress {
        RunProgress {
            current_level: self.current_level,
            total_rooms: self.room_order.len() as u32,
            player_health: self.player_health,
            station_integrity: self.station_integrity,
            completed_rooms: self.completed_rooms.clone(),
            elapsed_ms: self.resumed_elapsed_ms + now_ms.saturating_sub(self.started_at_ms),
            stats: self.stats.clone(),
        }
    }
}

/// Drives one run at a time through
/// `RoomIntro -> Combat -> Victory -> RewardSelection -> RoomComplete`
/// until every placed room is cleared or the run fails.
///
/// Delays between phases are timers on an internal [`Scheduler`], fired from
/// [`tick`](Self::tick). Every timer belongs to the phase that scheduled it and
/// each handler re-checks the state it expects, so a timer that survives a
/// transition does nothing.
pub struct RunStateMachine {
    timing: RunTiming,
    rooms: Vec<Arc<RoomDescriptor>>,
    placed: Vec<PlacedRoom>,
    sequencer: RoomSequencer,
    inventory: SlotInventory,
    selection: RewardSelectionFlow,
    scheduler: Scheduler<RunTimer>,
    timers: Vec<TimerHandle>,
    selection_timer: Option<TimerHandle>,
    collaborators: Collaborators,
    state: RunState,
    session: Option<RunSession>,
    last_outcome: Option<RunOutcome>,
    events: EventQueue<RunEvent>,
}

impl RunStateMachine {
    pub fn new(config: &AtlasConfig, rooms: &RoomCatalog, collaborators: Collaborators) -> Self {
        Self {
            timing: config.timing,
            rooms: rooms.rooms().to_vec(),
            placed: rooms.placed_rooms().to_vec(),
            sequencer: RoomSequencer::new(rooms.rooms()),
            inventory: SlotInventory::new(config.slots),
            selection: RewardSelectionFlow::new(config.selection),
            scheduler: Scheduler::new(),
            timers: Vec::new(),
            selection_timer: None,
            collaborators,
            state: RunState::PreRun,
            session: None,
            last_outcome: None,
            events: EventQueue::new(),
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Starts a fresh run at level 1. An active run is abandoned first.
    pub fn start_new_run<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        if self.is_run_active() {
            self.finish_run(false, REASON_ABANDONED);
        }

        let order = RoomSequencer::build_run_order(&self.placed, rng);
        if order.is_empty() {
            warn!("cannot start run without placed rooms");
            self.finish_run(false, REASON_NO_ROOMS);
            return Err(RunError::NoRooms);
        }

        self.sequencer.reset(&self.rooms);
        let session = RunSession::new(order, self.scheduler.now_ms());
        info!(run_id = %session.id, rooms = session.room_order.len(), "run started");
        self.events.push(RunEvent::RunStarted {
            run_id: session.id,
            total_rooms: session.room_order.len() as u32,
            resumed: false,
        });
        self.session = Some(session);
        self.enter_room(rng);
        Ok(())
    }

    /// Continues a saved run from the level it was on.
    pub fn resume_run<R: Rng>(&mut self, saved: &RunProgress, rng: &mut R) -> Result<()> {
        let total = self.placed.len() as u32;
        if saved.current_level < STARTING_LEVEL || saved.current_level > total {
            return Err(RunError::InvalidResume(format!(
                "level {} outside 1..={}",
                saved.current_level, total
            )));
        }
        if self.is_run_active() {
            self.finish_run(false, REASON_ABANDONED);
        }

        let order = RoomSequencer::build_run_order(&self.placed, rng);
        self.sequencer.reset(&self.rooms);
        for id in &saved.completed_rooms {
            self.sequencer.mark_completed(id);
        }

        let mut session = RunSession::new(order, self.scheduler.now_ms());
        session.current_level = saved.current_level;
        session.completed_rooms = saved.completed_rooms.clone();
        session.player_health = saved.player_health;
        session.station_integrity = saved.station_integrity;
        session.stats = saved.stats.clone();
        session.resumed_elapsed_ms = saved.elapsed_ms;
        info!(run_id = %session.id, level = saved.current_level, "run resumed");
        self.events.push(RunEvent::RunStarted {
            run_id: session.id,
            total_rooms: total,
            resumed: true,
        });
        self.session = Some(session);
        self.enter_room(rng);
        Ok(())
    }

    /// Ends the active run. Returns false when there is nothing to end.
    pub fn end_run(&mut self, success: bool, reason: impl Into<String>) -> bool {
        if self.session.is_none() {
            return false;
        }
        self.finish_run(success, reason);
        true
    }

    pub fn abandon_run(&mut self) -> bool {
        self.end_run(false, REASON_ABANDONED)
    }

    pub fn on_player_death(&mut self) -> bool {
        self.end_run(false, REASON_PLAYER_DIED)
    }

    pub fn on_station_destroyed(&mut self) -> bool {
        self.end_run(false, REASON_STATION_DESTROYED)
    }

    /// Room completion signal: the current room's enemy is dead.
    pub fn on_enemy_defeated(&mut self) -> Result<()> {
        self.expect_state(RunState::Combat)?;
        if let Some(session) = self.session.as_mut() {
            session.stats.enemies_defeated += 1;
            if let Some(enemy) = session.current_enemy.take() {
                self.collaborators.rooms.despawn_enemy(enemy);
            }
        }
        self.set_state(RunState::Victory);
        self.schedule(self.timing.victory_delay_ms, RunTimer::EnterRewardSelection);
        Ok(())
    }

    /// Advances the clock and fires every timer that falls due, then returns
    /// the notifications produced since the last drain.
    pub fn tick<R: Rng>(&mut self, delta_ms: u64, rng: &mut R) -> Vec<RunEvent> {
        let target = self.scheduler.now_ms().saturating_add(delta_ms);
        while let Some((handle, timer)) = self.scheduler.pop_due(target) {
            self.timers.retain(|pending| *pending != handle);
            if self.selection_timer == Some(handle) {
                self.selection_timer = None;
            }
            self.dispatch(timer, rng);
        }
        self.scheduler.advance_to(target);
        self.drain_events()
    }

    // ── Reward choice ───────────────────────────────────────────────

    pub fn choose_reward(&mut self, tag: &RewardTag) -> Result<ChoiceOutcome> {
        self.expect_state(RunState::RewardSelection)?;
        let outcome = self.selection.choose_reward(tag, &mut self.inventory);
        self.process_selection_events();
        Ok(outcome?)
    }

    pub fn choose_slot(&mut self, slot: usize) -> Result<ChoiceOutcome> {
        self.expect_state(RunState::RewardSelection)?;
        let outcome = self.selection.slot_chosen(slot, &mut self.inventory);
        self.process_selection_events();
        Ok(outcome?)
    }

    pub fn skip_reward(&mut self) -> Result<()> {
        self.expect_state(RunState::RewardSelection)?;
        let skipped = self.selection.skip();
        self.process_selection_events();
        Ok(skipped?)
    }

    // ── Gameplay reports ────────────────────────────────────────────

    /// Fails the run when health reaches zero.
    pub fn report_player_health(&mut self, health: f32) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.player_health = health.clamp(0.0, FULL_HEALTH);
        if session.player_health <= 0.0 {
            self.on_player_death();
        }
    }

    /// Fails the run when station integrity reaches zero.
    pub fn report_station_integrity(&mut self, integrity: f32) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.station_integrity = integrity.clamp(0.0, FULL_INTEGRITY);
        if session.station_integrity <= 0.0 {
            self.on_station_destroyed();
        }
    }

    pub fn record_damage_dealt(&mut self, amount: f32) {
        if let Some(session) = self.session.as_mut() {
            session.stats.damage_dealt += amount.max(0.0);
        }
    }

    pub fn record_damage_taken(&mut self, amount: f32) {
        if let Some(session) = self.session.as_mut() {
            session.stats.damage_taken += amount.max(0.0);
        }
    }

    pub fn record_perfect_parry(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.stats.perfect_parries += 1;
        }
    }

    pub fn record_successful_block(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.stats.successful_blocks += 1;
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_run_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn current_level(&self) -> Option<u32> {
        self.session.as_ref().map(|session| session.current_level)
    }

    pub fn total_rooms(&self) -> u32 {
        self.placed.len() as u32
    }

    pub fn current_room(&self) -> Option<&Arc<RoomDescriptor>> {
        self.session
            .as_ref()
            .and_then(|session| session.current_room.as_ref())
            .map(|room| &room.descriptor)
    }

    pub fn current_placed_room(&self) -> Option<&PlacedRoom> {
        self.session
            .as_ref()
            .and_then(|session| session.current_room.as_ref())
            .map(|room| &room.placed)
    }

    pub fn current_enemy(&self) -> Option<EnemyHandle> {
        self.session.as_ref().and_then(|session| session.current_enemy)
    }

    pub fn run_order(&self) -> &[PlacedRoom] {
        self.session
            .as_ref()
            .map(|session| session.room_order.as_slice())
            .unwrap_or(&[])
    }

    pub fn progress(&self) -> Option<RunProgress> {
        self.session
            .as_ref()
            .map(|session| session.progress(self.scheduler.now_ms()))
    }

    pub fn last_outcome(&self) -> Option<&RunOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn inventory(&self) -> &SlotInventory {
        &self.inventory
    }

    /// Direct slot management outside a reward choice (loadout restore,
    /// debug commands). Notifications are forwarded on the next drain.
    pub fn inventory_mut(&mut self) -> &mut SlotInventory {
        &mut self.inventory
    }

    pub fn selection(&self) -> &RewardSelectionFlow {
        &self.selection
    }

    pub fn sequencer(&self) -> &RoomSequencer {
        &self.sequencer
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn pending_timer_count(&self) -> usize {
        self.scheduler.pending_count()
    }

    pub fn selection_time_remaining_ms(&self) -> Option<u64> {
        self.selection.time_remaining_ms(self.scheduler.now_ms())
    }

    pub fn drain_events(&mut self) -> Vec<RunEvent> {
        for event in self.inventory.drain_events() {
            self.events.push(RunEvent::Slot(event));
        }
        self.events.drain()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&RunEvent) + 'static) {
        self.events.subscribe(listener);
    }

    // ── Transitions ─────────────────────────────────────────────────

    fn dispatch<R: Rng>(&mut self, timer: RunTimer, rng: &mut R) {
        debug!(?timer, state = %self.state, "timer fired");
        match timer {
            RunTimer::BeginCombat if self.state == RunState::RoomIntro => self.begin_combat(),
            RunTimer::EnterRewardSelection if self.state == RunState::Victory => {
                self.enter_reward_selection(rng)
            }
            RunTimer::FinishRoomTransition if self.state == RunState::RoomComplete => {
                self.enter_room(rng)
            }
            RunTimer::SelectionTimeout { selection_id } => {
                self.selection
                    .handle_timeout(selection_id, &mut self.inventory, rng);
                self.process_selection_events();
            }
            _ => debug!(?timer, "stale timer ignored"),
        }
    }

    fn enter_room<R: Rng>(&mut self, rng: &mut R) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let level = session.current_level;
        let slot = (level as usize).checked_sub(1);
        let Some(placed) = slot.and_then(|i| session.room_order.get(i)).cloned() else {
            self.finish_run(false, format!("No placed room for level {level}"));
            return;
        };
        let completed = session.completed_rooms.clone();

        let Some(descriptor) = self.sequencer.select_weighted(level, &completed, rng) else {
            warn!(level, "no eligible room descriptor");
            self.finish_run(false, REASON_ROOM_SELECTION_FAILED);
            return;
        };
        if let Err(err) = self.collaborators.rooms.activate(&placed, &descriptor) {
            warn!(room = %descriptor.id, %err, "room failed to load");
            self.finish_run(false, format!("Room {} failed to load: {err}", descriptor.id));
            return;
        }
        self.collaborators.rooms.teleport_player_here(&placed);

        info!(level, room = %descriptor.id, placed = %placed.name, "entering room");
        self.events.push(RunEvent::RoomStarted {
            level,
            room: descriptor.id.clone(),
            placed: placed.name.clone(),
        });
        if let Some(session) = self.session.as_mut() {
            session.current_room = Some(ActiveRoom { placed, descriptor });
        }
        self.set_state(RunState::RoomIntro);
        self.schedule(self.timing.combat_start_delay_ms, RunTimer::BeginCombat);
    }

    fn begin_combat(&mut self) {
        let Some(active) = self
            .session
            .as_ref()
            .and_then(|session| session.current_room.clone())
        else {
            return;
        };
        let room = &active.descriptor;
        let Some(enemy_class) = room.enemy_class.as_deref() else {
            warn!(room = %room.id, "room has no enemy configured");
            self.finish_run(false, format!("Room {} has no enemy configured", room.id));
            return;
        };

        let scaled_power = self
            .collaborators
            .difficulty
            .enemy_power(self.inventory.used_slot_count());
        let request = SpawnRequest {
            placed: &active.placed,
            room,
            enemy_class,
            base_power: room.enemy_base_power,
            scaled_power,
        };
        let enemy = match self.collaborators.rooms.spawn_enemy(&request) {
            Ok(enemy) => enemy,
            Err(err) => {
                warn!(room = %room.id, %err, "enemy spawn failed");
                self.finish_run(false, REASON_ENEMY_SPAWN_FAILED);
                return;
            }
        };

        if let Some(session) = self.session.as_mut() {
            session.current_enemy = Some(enemy);
        }
        self.set_state(RunState::Combat);
        self.events.push(RunEvent::CombatStarted {
            room: room.id.clone(),
            enemy_power: scaled_power,
        });
    }

    fn enter_reward_selection<R: Rng>(&mut self, rng: &mut R) {
        let Some((room, level)) = self.session.as_ref().and_then(|session| {
            session
                .current_room
                .as_ref()
                .map(|active| (Arc::clone(&active.descriptor), session.current_level))
        }) else {
            return;
        };
        self.set_state(RunState::RewardSelection);

        let rewards =
            self.sequencer
                .select_rewards_for_room(&room, room.reward_choice_count, level, rng);
        let now = self.scheduler.now_ms();
        match self.selection.present_choices(rewards.clone(), now) {
            Ok(selection_id) => {
                let timeout_ms = self.selection.config().timeout_ms;
                self.collaborators.rewards.show_choices(&rewards, timeout_ms);
                if timeout_ms > 0 {
                    let handle = self.schedule(timeout_ms, RunTimer::SelectionTimeout { selection_id });
                    self.selection_timer = Some(handle);
                }
                self.events.push(RunEvent::RewardsOffered {
                    selection_id,
                    choices: rewards.iter().map(|reward| reward.tag.clone()).collect(),
                });
                // Presented notification is re-emitted as RewardsOffered above.
                self.selection.drain_events();
            }
            Err(SelectionError::NoChoices) => {
                info!(room = %room.id, "room has no rewards to offer");
                self.complete_room();
            }
            Err(err) => {
                warn!(%err, "reward selection could not open");
                self.complete_room();
            }
        }
    }

    /// Forwards selection notifications and completes the room once the
    /// selection reaches a terminal result.
    fn process_selection_events(&mut self) {
        for event in self.selection.drain_events() {
            match event {
                SelectionEvent::AwaitingSlot { tag, .. } => {
                    self.events.push(RunEvent::SlotChoiceRequired { tag });
                }
                SelectionEvent::Completed(completed) => {
                    if let Some(handle) = self.selection_timer.take() {
                        self.cancel_timer(handle);
                    }
                    self.collaborators.rewards.hide();
                    self.events.push(RunEvent::RewardResolved(completed));
                    if self.state == RunState::RewardSelection {
                        self.complete_room();
                    }
                }
                SelectionEvent::Presented { .. } => {}
            }
        }
    }

    fn complete_room(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let level = session.current_level;
        let room_id = session
            .current_room
            .as_ref()
            .map(|active| active.descriptor.id.clone());
        // One entry per clear; repeatable rooms may appear more than once.
        if let Some(id) = &room_id {
            session.completed_rooms.push(id.clone());
        }
        session.current_level += 1;
        let finished = session.current_level > session.room_order.len() as u32;

        self.set_state(RunState::RoomComplete);
        if let Some(room) = room_id {
            info!(level, %room, "room complete");
            self.events.push(RunEvent::RoomCompleted { level, room });
        }

        if finished {
            self.finish_run(true, REASON_ALL_ROOMS_COMPLETED);
            return;
        }
        self.clear_current_room();
        self.schedule(self.timing.room_transition_ms, RunTimer::FinishRoomTransition);
    }

    /// Emits exactly one of `RunCompleted` / `RunFailed` and clears the
    /// session, whether or not a session existed.
    fn finish_run(&mut self, success: bool, reason: impl Into<String>) {
        let reason = reason.into();
        self.cancel_all_timers();
        if self.selection.is_active() {
            self.selection.cancel();
            self.selection.drain_events();
            self.collaborators.rewards.hide();
        }
        self.clear_current_room();

        let now = self.scheduler.now_ms();
        let (run_id, progress) = match self.session.take() {
            Some(session) => (session.id, session.progress(now)),
            None => (Uuid::nil(), RunProgress::new(self.total_rooms())),
        };
        let outcome = RunOutcome {
            run_id,
            success,
            reason: reason.clone(),
            progress,
            carried_loadout: success.then(|| self.inventory.snapshot()),
        };

        if success {
            info!(%run_id, %reason, "run completed");
            self.set_state(RunState::RunComplete);
            self.events.push(RunEvent::RunCompleted(outcome.clone()));
        } else {
            warn!(%run_id, %reason, "run failed");
            self.set_state(RunState::RunFailed);
            self.events.push(RunEvent::RunFailed(outcome.clone()));
        }
        self.last_outcome = Some(outcome);
    }

    fn clear_current_room(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(enemy) = session.current_enemy.take() {
            self.collaborators.rooms.despawn_enemy(enemy);
        }
        if let Some(active) = session.current_room.take() {
            self.collaborators.rooms.deactivate(&active.placed);
        }
    }

    fn set_state(&mut self, next: RunState) {
        if self.state == next {
            return;
        }
        let previous = self.state;
        self.state = next;
        debug!(from = %previous, to = %next, "run state changed");
        self.events.push(RunEvent::StateChanged {
            from: previous,
            to: next,
        });
    }

    fn expect_state(&self, expected: RunState) -> Result<()> {
        if self.session.is_none() {
            return Err(RunError::NotActive);
        }
        if self.state != expected {
            return Err(RunError::InvalidState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    fn schedule(&mut self, delay_ms: u64, timer: RunTimer) -> TimerHandle {
        let handle = self.scheduler.schedule_once(delay_ms, timer);
        self.timers.push(handle);
        handle
    }

    fn cancel_timer(&mut self, handle: TimerHandle) {
        self.scheduler.cancel(handle);
        self.timers.retain(|pending| *pending != handle);
    }

    fn cancel_all_timers(&mut self) {
        for handle in self.timers.drain(..) {
            self.scheduler.cancel(handle);
        }
        self.selection_timer = None;
    }
}
