use super::events::{ActivityStatus, HostEvent};
use super::store::{ActivityStore, DisplayState};
use crate::config::ReconcileConfig;
use crate::timers::{TimerId, Timers};

/// Fallback name when a status snapshot reports a running tool without naming it.
const UNNAMED_TOOL: &str = "IDE";

/// Side effects the reconciler cannot apply to the store itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    None,
    /// Show or hide the whole widget.
    SetVisible(bool),
    PomodoroFinished,
}

/// Turns host activity events into display state, in arrival order.
pub struct Reconciler {
    celebration_ms: u64,
    coding_minute_ms: u64,
}

impl Reconciler {
    pub fn new(config: &ReconcileConfig) -> Self {
        Self {
            celebration_ms: config.celebration_ms,
            coding_minute_ms: config.coding_minute_ms,
        }
    }

    pub fn apply(
        &mut self,
        event: HostEvent,
        store: &mut ActivityStore,
        timers: &mut Timers,
    ) -> Reaction {
        match event {
            HostEvent::ToolDetected(name) => {
                store.set_active_tool(Some(name));
                if store.state() != DisplayState::Coding {
                    store.set_state(DisplayState::Coding);
                }
                self.start_coding_clock(timers);
            }
            HostEvent::ToolClosed => {
                store.set_active_tool(None);
                store.set_state(DisplayState::Idle);
                timers.cancel(TimerId::CodingMinute);
            }
            HostEvent::Idle(seconds) => {
                store.set_idle_seconds(seconds);
                store.set_state(DisplayState::Idle);
            }
            HostEvent::Sleeping(seconds) => {
                store.set_idle_seconds(seconds);
                store.set_state(DisplayState::Sleeping);
                timers.cancel(TimerId::CodingMinute);
            }
            HostEvent::LateNightCoding(hour) => {
                // Qualifies coding only; anything else ignores it.
                if store.state() == DisplayState::Coding {
                    log::debug!("Still coding at {hour}h, getting tired");
                    store.set_state(DisplayState::Tired);
                }
            }
            HostEvent::NewCommit => {
                store.add_commit();
                store.set_state(DisplayState::Celebrating);
                if timers.arm(TimerId::CelebrationRevert, self.celebration_ms) {
                    log::debug!("Commit during celebration, restarting revert window");
                }
            }
            HostEvent::Status(status) => self.self_heal(status, store, timers),
            HostEvent::Fullscreen(fullscreen) => return Reaction::SetVisible(!fullscreen),
            HostEvent::StateChanged(next) => store.set_state(next),
            HostEvent::Level(info) => store.set_level(info),
            HostEvent::PomodoroTick(remaining) => {
                log::trace!("Pomodoro: {remaining}s left");
            }
            HostEvent::PomodoroComplete => {
                store.add_pomodoro();
                return Reaction::PomodoroFinished;
            }
            HostEvent::PomodoroCancelled => return Reaction::PomodoroFinished,
        }
        Reaction::None
    }

    /// The celebration window elapsed with no further commits.
    pub fn on_celebration_revert(&mut self, store: &mut ActivityStore, timers: &mut Timers) {
        // Something else took over during the celebration; leave it alone.
        if store.state() != DisplayState::Celebrating {
            return;
        }
        if store.active_tool().is_some() {
            store.set_state(DisplayState::Coding);
            if !timers.is_armed(TimerId::CodingMinute) {
                self.start_coding_clock(timers);
            }
        } else {
            store.set_state(DisplayState::Idle);
        }
    }

    pub fn on_coding_minute(&mut self, store: &mut ActivityStore, timers: &mut Timers) {
        if store.active_tool().is_none() {
            return;
        }
        store.add_coding_minute();
        timers.arm(TimerId::CodingMinute, self.coding_minute_ms);
    }

    fn start_coding_clock(&self, timers: &mut Timers) {
        timers.arm(TimerId::CodingMinute, self.coding_minute_ms);
    }

    /// Correct drift from missed discrete events. Temporary states
    /// (celebrating, sleeping, tired) are never overridden here.
    fn self_heal(&mut self, status: ActivityStatus, store: &mut ActivityStore, timers: &mut Timers) {
        store.set_idle_seconds(status.idle_seconds);

        let recorded = store.active_tool().is_some();
        if status.is_tool_running && !recorded {
            let name = status
                .active_tool
                .unwrap_or_else(|| UNNAMED_TOOL.to_string());
            log::debug!("Snapshot shows {name} running, adopting it");
            store.set_active_tool(Some(name));
            if store.state() == DisplayState::Idle {
                store.set_state(DisplayState::Coding);
            }
            // A sleeping or celebrating cat isn't at the keyboard yet.
            if matches!(store.state(), DisplayState::Coding | DisplayState::Tired) {
                self.start_coding_clock(timers);
            }
        } else if !status.is_tool_running && recorded {
            log::debug!("Snapshot shows no tool running, clearing");
            store.set_active_tool(None);
            timers.cancel(TimerId::CodingMinute);
            if store.state() == DisplayState::Coding {
                store.set_state(DisplayState::Idle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::store::StoreChange;
    use pretty_assertions::assert_eq;

    struct Fixture {
        store: ActivityStore,
        timers: Timers,
        rec: Reconciler,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: ActivityStore::new(),
                timers: Timers::new(),
                rec: Reconciler::new(&ReconcileConfig::default()),
            }
        }

        fn send(&mut self, event: HostEvent) -> Reaction {
            self.rec.apply(event, &mut self.store, &mut self.timers)
        }

        /// Fire every due timer the reconciler owns up to `now_ms`.
        fn advance(&mut self, now_ms: u64) {
            while let Some(id) = self.timers.pop_due(now_ms) {
                match id {
                    TimerId::CelebrationRevert => {
                        self.rec.on_celebration_revert(&mut self.store, &mut self.timers)
                    }
                    TimerId::CodingMinute => {
                        self.rec.on_coding_minute(&mut self.store, &mut self.timers)
                    }
                    _ => {}
                }
            }
            self.timers.settle(now_ms);
        }

        fn status(running: bool, tool: Option<&str>) -> HostEvent {
            HostEvent::Status(ActivityStatus {
                is_tool_running: running,
                active_tool: tool.map(str::to_string),
                idle_seconds: 7,
            })
        }
    }

    #[test]
    fn tool_detected_then_closed() {
        let mut f = Fixture::new();
        f.send(HostEvent::ToolDetected("vscode".into()));
        assert_eq!(f.store.state(), DisplayState::Coding);
        assert_eq!(f.store.active_tool(), Some("vscode"));
        assert!(f.timers.is_armed(TimerId::CodingMinute));

        f.send(HostEvent::ToolClosed);
        assert_eq!(f.store.state(), DisplayState::Idle);
        assert_eq!(f.store.active_tool(), None);
        assert!(!f.timers.is_armed(TimerId::CodingMinute));
    }

    #[test]
    fn coding_minutes_tick_while_tool_is_open() {
        let mut f = Fixture::new();
        f.send(HostEvent::ToolDetected("vscode".into()));
        f.advance(180_000);
        assert_eq!(f.store.counters().today_coding_minutes, 3);

        f.send(HostEvent::Sleeping(600));
        f.advance(600_000);
        assert_eq!(f.store.counters().today_coding_minutes, 3);
    }

    #[test]
    fn redetecting_restarts_minute_clock() {
        let mut f = Fixture::new();
        f.send(HostEvent::ToolDetected("vscode".into()));
        f.advance(59_000);
        f.send(HostEvent::ToolDetected("vscode".into()));
        f.advance(100_000);
        assert_eq!(f.store.counters().today_coding_minutes, 0);
        f.advance(119_000);
        assert_eq!(f.store.counters().today_coding_minutes, 1);
    }

    #[test]
    fn late_night_only_qualifies_coding() {
        let mut f = Fixture::new();
        f.send(HostEvent::LateNightCoding(23));
        assert_eq!(f.store.state(), DisplayState::Idle);

        f.send(HostEvent::ToolDetected("vscode".into()));
        f.send(HostEvent::LateNightCoding(23));
        assert_eq!(f.store.state(), DisplayState::Tired);

        // No automatic way back to coding.
        f.advance(600_000);
        assert_eq!(f.store.state(), DisplayState::Tired);
    }

    #[test]
    fn double_commit_reverts_once_after_last_commit() {
        let mut f = Fixture::new();
        let rx = f.store.subscribe();

        f.send(HostEvent::NewCommit);
        f.advance(2_000);
        f.send(HostEvent::NewCommit);
        assert_eq!(f.store.state(), DisplayState::Celebrating);

        f.advance(4_999);
        assert_eq!(f.store.state(), DisplayState::Celebrating);
        f.advance(5_000);
        assert_eq!(f.store.state(), DisplayState::Idle);
        f.advance(20_000);

        let reverts = rx
            .try_iter()
            .filter(|c| {
                matches!(
                    c,
                    StoreChange::State {
                        prev: DisplayState::Celebrating,
                        next,
                    } if *next != DisplayState::Celebrating
                )
            })
            .count();
        assert_eq!(reverts, 1);
        assert_eq!(f.store.counters().today_commits, 2);
    }

    #[test]
    fn celebration_returns_to_coding_when_tool_open() {
        let mut f = Fixture::new();
        f.send(HostEvent::ToolDetected("vscode".into()));
        f.send(HostEvent::NewCommit);
        f.advance(3_000);
        assert_eq!(f.store.state(), DisplayState::Coding);
    }

    #[test]
    fn revert_does_not_clobber_later_state() {
        let mut f = Fixture::new();
        f.send(HostEvent::NewCommit);
        f.send(HostEvent::Sleeping(900));
        f.advance(3_000);
        assert_eq!(f.store.state(), DisplayState::Sleeping);
    }

    #[test]
    fn idle_and_sleeping_are_unconditional() {
        let mut f = Fixture::new();
        f.send(HostEvent::ToolDetected("vscode".into()));
        f.send(HostEvent::Sleeping(700));
        assert_eq!(f.store.state(), DisplayState::Sleeping);
        assert_eq!(f.store.idle_seconds(), 700);
        f.send(HostEvent::Idle(5));
        assert_eq!(f.store.state(), DisplayState::Idle);
    }

    #[test]
    fn snapshot_adopts_missed_tool_only_from_idle() {
        let mut f = Fixture::new();
        f.send(Fixture::status(true, Some("Zed")));
        assert_eq!(f.store.active_tool(), Some("Zed"));
        assert_eq!(f.store.state(), DisplayState::Coding);
        assert_eq!(f.store.idle_seconds(), 7);

        let mut f = Fixture::new();
        f.send(HostEvent::Sleeping(900));
        f.send(Fixture::status(true, None));
        assert_eq!(f.store.active_tool(), Some(UNNAMED_TOOL));
        assert_eq!(f.store.state(), DisplayState::Sleeping);
        assert!(!f.timers.is_armed(TimerId::CodingMinute));
        f.advance(300_000);
        assert_eq!(f.store.state(), DisplayState::Sleeping);
        assert_eq!(f.store.counters().today_coding_minutes, 0);
    }

    #[test]
    fn snapshot_clears_stale_tool_only_from_coding() {
        let mut f = Fixture::new();
        f.send(HostEvent::ToolDetected("vscode".into()));
        f.send(Fixture::status(false, None));
        assert_eq!(f.store.active_tool(), None);
        assert_eq!(f.store.state(), DisplayState::Idle);
        assert!(!f.timers.is_armed(TimerId::CodingMinute));

        let mut f = Fixture::new();
        f.send(HostEvent::ToolDetected("vscode".into()));
        f.send(HostEvent::LateNightCoding(1));
        f.send(Fixture::status(false, None));
        assert_eq!(f.store.active_tool(), None);
        assert_eq!(f.store.state(), DisplayState::Tired);
    }

    #[test]
    fn snapshot_never_interrupts_celebration() {
        let mut f = Fixture::new();
        f.send(HostEvent::NewCommit);
        f.send(Fixture::status(true, Some("vscode")));
        assert_eq!(f.store.state(), DisplayState::Celebrating);
        f.advance(3_000);
        assert_eq!(f.store.state(), DisplayState::Coding);
        f.advance(63_000);
        assert_eq!(f.store.counters().today_coding_minutes, 1);
    }

    #[test]
    fn snapshot_in_agreement_changes_nothing_but_idle_time() {
        let mut f = Fixture::new();
        f.send(HostEvent::ToolDetected("vscode".into()));
        f.send(Fixture::status(true, Some("something else")));
        assert_eq!(f.store.active_tool(), Some("vscode"));
        assert_eq!(f.store.state(), DisplayState::Coding);
        assert_eq!(f.store.idle_seconds(), 7);
    }

    #[test]
    fn fullscreen_toggles_visibility_only() {
        let mut f = Fixture::new();
        f.send(HostEvent::ToolDetected("vscode".into()));
        assert_eq!(f.send(HostEvent::Fullscreen(true)), Reaction::SetVisible(false));
        assert_eq!(f.send(HostEvent::Fullscreen(false)), Reaction::SetVisible(true));
        assert_eq!(f.store.state(), DisplayState::Coding);
    }

    #[test]
    fn host_overrides_and_pomodoro() {
        let mut f = Fixture::new();
        f.send(HostEvent::StateChanged(DisplayState::Frustrated));
        assert_eq!(f.store.state(), DisplayState::Frustrated);

        assert_eq!(f.send(HostEvent::PomodoroTick(30)), Reaction::None);
        assert_eq!(f.send(HostEvent::PomodoroComplete), Reaction::PomodoroFinished);
        assert_eq!(f.store.counters().today_pomodoros, 1);

        assert_eq!(f.send(HostEvent::PomodoroCancelled), Reaction::PomodoroFinished);
        assert_eq!(f.store.counters().today_pomodoros, 1);
    }
}
