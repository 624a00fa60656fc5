//! The cat itself: one sprite whose look, position and chatter follow the
//! host's activity.
//!
//! `Companion` is the single owner of every piece of cat state. All inputs
//! (host events, timers, frames, pointer gestures) funnel through it on one
//! thread, in arrival order.

pub mod behavior;
pub mod messages;
pub mod movement;

use std::sync::mpsc::Receiver;

use glam::Vec2;

use crate::activity::{ActivityStore, DisplayState, HostEvent, Reaction, Reconciler, StoreChange};
use crate::config::Config;
use crate::daynight::DayNightState;
use crate::host::Host;
use crate::timers::{TimerId, Timers};
use behavior::{BehaviorPick, Facing, IdleBehavior, IdleScheduler};
use messages::MessageBoard;
use movement::{DragOutcome, MovementController};

/// What the cat looks like right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    pub emoji: &'static str,
    pub bubble: Option<String>,
    pub facing: Facing,
    pub state: DisplayState,
    pub behavior: IdleBehavior,
}

impl Presentation {
    /// One-line rendering: sprite plus bubble, or plus what it is doing.
    /// A walk also shows which way the cat is heading.
    pub fn title(&self) -> String {
        match &self.bubble {
            Some(text) => format!("{} {}", self.emoji, text),
            None if self.state == DisplayState::Idle && self.behavior == IdleBehavior::Walk => {
                format!("{} walk {}", self.emoji, self.facing.arrow())
            }
            None if self.state == DisplayState::Idle => {
                format!("{} {}", self.emoji, self.behavior.label())
            }
            None => format!("{} {}", self.emoji, self.state.label()),
        }
    }
}

pub struct Companion<H: Host> {
    config: Config,
    host: H,
    rng: fastrand::Rng,
    timers: Timers,
    store: ActivityStore,
    changes: Receiver<StoreChange>,
    reconciler: Reconciler,
    idle: IdleScheduler,
    movement: MovementController,
    messages: MessageBoard,
    pub daynight: DayNightState,
    pomodoro_running: bool,
    running: bool,
}

impl<H: Host> Companion<H> {
    pub fn new(config: Config, host: H, rng: fastrand::Rng, screen_w: f32, sprite_w: f32) -> Self {
        let start = match host.window_position() {
            Ok((x, y)) => Vec2::new(x as f32, y as f32),
            Err(e) => {
                log::debug!("Window position unavailable ({e}), using configured start");
                Vec2::new(config.window.start_x as f32, config.window.start_y as f32)
            }
        };

        let mut store = ActivityStore::new();
        let changes = store.subscribe();

        let mut c = Self {
            timers: Timers::new(),
            reconciler: Reconciler::new(&config.reconcile),
            idle: IdleScheduler::new(),
            movement: MovementController::new(start, &config.walk, screen_w, sprite_w),
            messages: MessageBoard::new(&config.messages),
            daynight: DayNightState::new(&config.schedule),
            config,
            host,
            rng,
            store,
            changes,
            pomodoro_running: false,
            running: true,
        };
        c.messages.start_chatter(&mut c.timers);
        c.refresh_eligibility();
        log::info!("Cat ready at ({:.0}, {:.0})", start.x, start.y);
        c
    }

    #[cfg(test)]
    pub fn host(&self) -> &H {
        &self.host
    }

    #[cfg(test)]
    pub fn store(&self) -> &ActivityStore {
        &self.store
    }

    #[cfg(test)]
    pub fn state(&self) -> DisplayState {
        self.store.state()
    }

    #[cfg(test)]
    pub fn position(&self) -> Vec2 {
        self.movement.position()
    }

    #[cfg(test)]
    pub fn idle_behavior(&self) -> IdleBehavior {
        self.idle.current()
    }

    #[cfg(test)]
    pub fn bubble(&self) -> Option<&str> {
        self.messages.current()
    }

    #[cfg(test)]
    pub fn click_count(&self) -> u32 {
        self.messages.click_count()
    }

    #[cfg(test)]
    pub fn is_pomodoro_running(&self) -> bool {
        self.pomodoro_running
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_screen(&mut self, screen_w: f32, sprite_w: f32) {
        self.movement.set_screen(screen_w, sprite_w);
    }

    pub fn handle_event(&mut self, event: HostEvent) {
        if !self.running {
            return;
        }
        log::debug!("Host event: {}", event.name());
        match self
            .reconciler
            .apply(event, &mut self.store, &mut self.timers)
        {
            Reaction::None => {}
            Reaction::SetVisible(visible) => {
                if self.config.window.auto_hide_fullscreen {
                    if let Err(e) = self.host.set_visible(visible) {
                        log::debug!("Ignoring failed visibility change: {e}");
                    }
                }
            }
            Reaction::PomodoroFinished => self.pomodoro_running = false,
        }
        self.flush();
    }

    /// Fire every timer due by `now_ms`, in deadline order.
    pub fn advance_to(&mut self, now_ms: u64) {
        if !self.running {
            return;
        }
        while let Some(id) = self.timers.pop_due(now_ms) {
            log::trace!("Timer {} fired at {}ms", id.label(), self.timers.now_ms());
            self.on_timer(id);
            self.flush();
        }
        self.timers.settle(now_ms);
    }

    /// One animation frame. Only a walking cat moves on its own.
    pub fn on_frame(&mut self, now_ms: u64) {
        if !self.running {
            return;
        }
        if self.is_walking() {
            self.movement
                .walk_frame(now_ms, &mut self.rng, &mut self.host);
        } else {
            self.movement.stop_walking();
        }
    }

    pub fn pointer_down(&mut self, pointer: Vec2) {
        if !self.running {
            return;
        }
        self.movement.pointer_down(pointer);
        self.refresh_eligibility();
    }

    pub fn pointer_move(&mut self, pointer: Vec2) -> bool {
        if !self.running {
            return false;
        }
        self.movement.pointer_move(pointer, &mut self.host)
    }

    /// A moved gesture gets the drag bubble; a still one is a click.
    pub fn pointer_up(&mut self) -> Option<DragOutcome> {
        if !self.running {
            return None;
        }
        let outcome = self.movement.pointer_up();
        // Resume idle first so the fresh behavior doesn't wipe the click emoji.
        self.refresh_eligibility();
        match outcome {
            Some(DragOutcome::Dragged) => self.messages.on_drag_release(&mut self.timers),
            Some(DragOutcome::Click) => {
                if let Err(e) = self.host.notify_clicked() {
                    log::debug!("Click notification failed: {e}");
                }
                let tier = self.messages.on_click(&mut self.rng, &mut self.timers);
                log::debug!("Click #{} ({tier:?})", self.messages.click_count());
            }
            None => {}
        }
        outcome
    }

    /// Start or stop the host's pomodoro. Returns whether one is running.
    pub fn toggle_pomodoro(&mut self) -> bool {
        if !self.running {
            return self.pomodoro_running;
        }
        let result = if self.pomodoro_running {
            self.host.stop_pomodoro()
        } else {
            self.host.start_pomodoro()
        };
        match result {
            Ok(()) => self.pomodoro_running = !self.pomodoro_running,
            Err(e) => log::warn!("Pomodoro toggle failed: {e}"),
        }
        self.pomodoro_running
    }

    /// Cancel everything. Inputs after this are ignored.
    pub fn shutdown(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        let cancelled = self.timers.cancel_all();
        self.movement.stop_walking();
        self.movement.cancel_drag();
        let counters = self.store.counters();
        let level = self.store.level();
        log::info!(
            "Session: {} coding minutes, {} commits, {} pomodoros, level {} ({}/{} exp)",
            counters.today_coding_minutes,
            counters.today_commits,
            counters.today_pomodoros,
            level.level,
            level.exp,
            level.exp_to_next
        );
        log::info!(
            "Cat shut down after {}s idle, {cancelled} timers cancelled",
            self.store.idle_seconds()
        );
    }

    /// Whether the loop should pace animation frames.
    pub fn wants_frames(&self) -> bool {
        self.running && (self.is_walking() || self.movement.is_dragging())
    }

    pub fn next_deadline(&self) -> Option<u64> {
        if !self.running {
            return None;
        }
        self.timers.next_deadline()
    }

    pub fn presentation(&self) -> Presentation {
        let state = self.store.state();
        let behavior = self.idle.current();
        let emoji = self
            .messages
            .emoji_override()
            .or(state.emoji())
            .unwrap_or(behavior.emoji());
        Presentation {
            emoji,
            bubble: self.messages.current().map(str::to_string),
            facing: self.movement.facing(),
            state,
            behavior,
        }
    }

    pub fn present(&mut self) {
        let frame = self.presentation();
        self.host.present(&frame);
    }

    fn is_walking(&self) -> bool {
        self.idle.is_eligible()
            && self.idle.current() == IdleBehavior::Walk
            && !self.movement.is_dragging()
    }

    fn on_timer(&mut self, id: TimerId) {
        match id {
            TimerId::BehaviorExpiry => {
                let period = self.daynight.period;
                if let Some(pick) = self.idle.on_expired(&mut self.timers, period, &mut self.rng) {
                    self.apply_pick(pick);
                }
            }
            TimerId::MessageDismiss => self.messages.on_dismiss(),
            TimerId::CelebrationRevert => self
                .reconciler
                .on_celebration_revert(&mut self.store, &mut self.timers),
            TimerId::ClickReset => self.messages.on_click_reset(),
            TimerId::EmojiRevert => self.messages.on_emoji_revert(),
            TimerId::CodingMinute => self
                .reconciler
                .on_coding_minute(&mut self.store, &mut self.timers),
            TimerId::ChatterPoll => {
                let free = self.store.state() == DisplayState::Idle && !self.movement.is_dragging();
                self.messages
                    .on_chatter_poll(free, &mut self.rng, &mut self.timers);
            }
        }
    }

    /// React to everything the store reported since the last flush.
    fn flush(&mut self) {
        while let Ok(change) = self.changes.try_recv() {
            self.react(change);
        }
    }

    fn react(&mut self, change: StoreChange) {
        match change {
            StoreChange::State { prev, next } if prev != next => {
                self.messages
                    .on_transition(prev, next, &mut self.rng, &mut self.timers);
                self.refresh_eligibility();
            }
            StoreChange::Level(info) => {
                log::debug!("Level {} ({}/{} exp)", info.level, info.exp, info.exp_to_next);
            }
            StoreChange::Counters(counters) => log::trace!("Counters: {counters:?}"),
            _ => {}
        }
    }

    fn refresh_eligibility(&mut self) {
        let eligible = self.running
            && self.store.state() == DisplayState::Idle
            && !self.movement.is_dragging();
        let period = self.daynight.period;
        if let Some(pick) = self
            .idle
            .set_eligible(eligible, &mut self.timers, period, &mut self.rng)
        {
            self.apply_pick(pick);
        }
    }

    fn apply_pick(&mut self, pick: BehaviorPick) {
        if let Some(facing) = pick.facing {
            self.movement.set_facing(facing);
        }
        self.messages.clear_emoji_override(&mut self.timers);
    }
}
