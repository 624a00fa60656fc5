use std::sync::mpsc::{self, Receiver, Sender};

use serde::{Deserialize, Serialize};

/// The single visible mode of the cat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayState {
    #[default]
    Idle,
    Coding,
    Celebrating,
    Frustrated,
    Sleeping,
    Tired,
    Interaction,
}

impl DisplayState {
    #[cfg(test)]
    pub const ALL: [DisplayState; 7] = [
        Self::Idle,
        Self::Coding,
        Self::Celebrating,
        Self::Frustrated,
        Self::Sleeping,
        Self::Tired,
        Self::Interaction,
    ];

    /// Mood is a pure function of the state.
    pub fn mood(self) -> Mood {
        match self {
            Self::Idle => Mood::Happy,
            Self::Coding => Mood::Focused,
            Self::Celebrating => Mood::Excited,
            Self::Frustrated => Mood::Sad,
            Self::Sleeping => Mood::Sleeping,
            Self::Tired => Mood::Sad,
            Self::Interaction => Mood::Happy,
        }
    }

    /// Sprite override for non-idle states. Idle shows the current idle behavior.
    pub fn emoji(self) -> Option<&'static str> {
        match self {
            Self::Idle => None,
            Self::Coding => Some("😺"),
            Self::Celebrating => Some("🎉"),
            Self::Frustrated => Some("😿"),
            Self::Sleeping => Some("😴"),
            Self::Tired => Some("🥱"),
            Self::Interaction => Some("😻"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Coding => "coding",
            Self::Celebrating => "celebrating",
            Self::Frustrated => "frustrated",
            Self::Sleeping => "sleeping",
            Self::Tired => "tired",
            Self::Interaction => "interaction",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mood {
    Happy,
    Sad,
    Sleeping,
    Focused,
    Excited,
}

/// Level info mirrored from the external experience ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelInfo {
    pub level: u32,
    pub exp: u32,
    pub exp_to_next: u32,
    #[serde(default)]
    pub streak_days: u32,
}

impl Default for LevelInfo {
    fn default() -> Self {
        Self {
            level: 1,
            exp: 0,
            exp_to_next: 60,
            streak_days: 0,
        }
    }
}

/// Per-session counters. Only ever incremented here; daily reset is external.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCounters {
    pub today_coding_minutes: u32,
    pub today_commits: u32,
    pub today_pomodoros: u32,
}

/// Pushed to subscribers after every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    State { prev: DisplayState, next: DisplayState },
    ActiveTool(Option<String>),
    IdleSeconds(u64),
    Counters(SessionCounters),
    Level(LevelInfo),
}

/// Process-wide activity state, owned by the companion root.
pub struct ActivityStore {
    state: DisplayState,
    active_tool: Option<String>,
    idle_seconds: u64,
    counters: SessionCounters,
    level: LevelInfo,
    subscribers: Vec<Sender<StoreChange>>,
}

impl ActivityStore {
    pub fn new() -> Self {
        Self {
            state: DisplayState::Idle,
            active_tool: None,
            idle_seconds: 0,
            counters: SessionCounters::default(),
            level: LevelInfo::default(),
            subscribers: Vec::new(),
        }
    }

    /// Register for change notifications. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<StoreChange> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    #[cfg(test)]
    pub fn mood(&self) -> Mood {
        self.state.mood()
    }

    pub fn active_tool(&self) -> Option<&str> {
        self.active_tool.as_deref()
    }

    pub fn idle_seconds(&self) -> u64 {
        self.idle_seconds
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub fn level(&self) -> LevelInfo {
        self.level
    }

    pub fn set_state(&mut self, next: DisplayState) {
        let prev = self.state;
        self.state = next;
        if prev != next {
            log::debug!("State {} -> {} (mood {:?})", prev.label(), next.label(), next.mood());
        }
        self.notify(StoreChange::State { prev, next });
    }

    pub fn set_active_tool(&mut self, tool: Option<String>) {
        self.active_tool = tool.clone();
        self.notify(StoreChange::ActiveTool(tool));
    }

    pub fn set_idle_seconds(&mut self, seconds: u64) {
        self.idle_seconds = seconds;
        self.notify(StoreChange::IdleSeconds(seconds));
    }

    pub fn add_commit(&mut self) {
        self.counters.today_commits += 1;
        self.notify(StoreChange::Counters(self.counters));
    }

    pub fn add_coding_minute(&mut self) {
        self.counters.today_coding_minutes += 1;
        self.notify(StoreChange::Counters(self.counters));
    }

    pub fn add_pomodoro(&mut self) {
        self.counters.today_pomodoros += 1;
        self.notify(StoreChange::Counters(self.counters));
    }

    pub fn set_level(&mut self, level: LevelInfo) {
        self.level = level;
        self.notify(StoreChange::Level(level));
    }

    fn notify(&mut self, change: StoreChange) {
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }
}
