use crate::activity::DisplayState;
use crate::config::MessageConfig;
use crate::timers::{TimerId, Timers};

pub const DRAG_MESSAGE: &str = "wheee~!";

const NEUTRAL_MESSAGES: &[&str] = &[
    "meow!", "nya~", "purr...", "mrrp?", "*stretch*", "code with me~", "prrrr~",
];
const HAPPY_MESSAGES: &[&str] = &["😻 love it!", "more pets!", "purrrr~", "nya nya~!"];
const ANNOYED_MESSAGES: &[&str] = &["...meow.", "okay okay!", "I'm busy!", "stahp!", "😾"];
const CHATTER_MESSAGES: &[&str] = &[
    "*yawn*", "...", "💭", "hmm...", "*tail swish*", "commit something!", "☕", "*purr*",
];

const TO_CODING: &[&str] = &["let's code! 💻", "focus mode!", "coding time~", "⌨️ *tap tap*"];
const TO_SLEEPING: &[&str] = &["zzz...", "so sleepy...", "💤 good night...", "*curls up*"];
const TO_TIRED: &[&str] = &["it's late... 🌙", "*yawn* still coding?", "go to bed!"];
const TO_CELEBRATING: &[&str] = &["🎉 commit!", "nice commit!", "woohoo!"];
const CODING_TO_IDLE: &[&str] = &["break time~", "done coding?", "*stretch*"];
const SLEEPING_TO_IDLE: &[&str] = &["*wakes up* 🥱", "morning!", "I'm up!"];

/// Lines for entering `next` from `prev`. Empty means stay quiet.
pub fn transition_pool(prev: DisplayState, next: DisplayState) -> &'static [&'static str] {
    match (prev, next) {
        (_, DisplayState::Coding) => TO_CODING,
        (_, DisplayState::Sleeping) => TO_SLEEPING,
        (_, DisplayState::Tired) => TO_TIRED,
        (_, DisplayState::Celebrating) => TO_CELEBRATING,
        (DisplayState::Coding, DisplayState::Idle) => CODING_TO_IDLE,
        (DisplayState::Sleeping, DisplayState::Idle) => SLEEPING_TO_IDLE,
        _ => &[],
    }
}

/// Tone of a click reaction, escalating with rapid clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTier {
    Neutral,
    Happy,
    Annoyed,
}

impl ClickTier {
    pub fn for_count(count: u32) -> Self {
        match count {
            0..=2 => Self::Neutral,
            3..=5 => Self::Happy,
            _ => Self::Annoyed,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Neutral => "😻",
            Self::Happy => "🥰",
            Self::Annoyed => "😾",
        }
    }

    pub fn pool(self) -> &'static [&'static str] {
        match self {
            Self::Neutral => NEUTRAL_MESSAGES,
            Self::Happy => HAPPY_MESSAGES,
            Self::Annoyed => ANNOYED_MESSAGES,
        }
    }
}

fn choose(pool: &'static [&'static str], rng: &mut fastrand::Rng) -> Option<&'static str> {
    if pool.is_empty() {
        return None;
    }
    Some(pool[rng.usize(0..pool.len())])
}

/// Single-flight speech bubble plus click escalation state.
pub struct MessageBoard {
    config: MessageConfig,
    current: Option<String>,
    click_count: u32,
    emoji_override: Option<&'static str>,
}

impl MessageBoard {
    pub fn new(config: &MessageConfig) -> Self {
        Self {
            config: config.clone(),
            current: None,
            click_count: 0,
            emoji_override: None,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn click_count(&self) -> u32 {
        self.click_count
    }

    pub fn emoji_override(&self) -> Option<&'static str> {
        self.emoji_override
    }

    /// Replace whatever is showing and restart the dismissal timer.
    pub fn show(&mut self, text: impl Into<String>, duration_ms: u64, timers: &mut Timers) {
        let text = text.into();
        log::debug!("Bubble: {text:?} ({duration_ms}ms)");
        self.current = Some(text);
        timers.arm(TimerId::MessageDismiss, duration_ms);
    }

    pub fn on_dismiss(&mut self) {
        self.current = None;
    }

    /// Display state actually changed.
    pub fn on_transition(
        &mut self,
        prev: DisplayState,
        next: DisplayState,
        rng: &mut fastrand::Rng,
        timers: &mut Timers,
    ) {
        self.emoji_override = None;
        if let Some(line) = choose(transition_pool(prev, next), rng) {
            self.show(line, self.config.transition_ms, timers);
        }
    }

    /// Periodic chatter roll. Re-arms itself. Speaks only when `idle` (idle
    /// state, not being dragged) and no bubble is up. Returns true if it spoke.
    pub fn on_chatter_poll(
        &mut self,
        idle: bool,
        rng: &mut fastrand::Rng,
        timers: &mut Timers,
    ) -> bool {
        timers.arm(TimerId::ChatterPoll, self.config.chatter_interval_ms);
        if !idle || self.current.is_some() {
            return false;
        }
        if rng.f32() >= self.config.chatter_chance {
            return false;
        }
        match choose(CHATTER_MESSAGES, rng) {
            Some(line) => {
                self.show(line, self.config.transition_ms, timers);
                true
            }
            None => false,
        }
    }

    /// Start the chatter cadence.
    pub fn start_chatter(&self, timers: &mut Timers) {
        timers.arm(TimerId::ChatterPoll, self.config.chatter_interval_ms);
    }

    /// Count a click, pick the tier's line and emoji. The count resets
    /// `click_reset_ms` after the latest click; the emoji reverts sooner.
    pub fn on_click(&mut self, rng: &mut fastrand::Rng, timers: &mut Timers) -> ClickTier {
        self.click_count += 1;
        timers.arm(TimerId::ClickReset, self.config.click_reset_ms);

        let tier = ClickTier::for_count(self.click_count);
        self.emoji_override = Some(tier.emoji());
        timers.arm(TimerId::EmojiRevert, self.config.emoji_revert_ms);

        if let Some(line) = choose(tier.pool(), rng) {
            self.show(line, self.config.bubble_ms, timers);
        }
        tier
    }

    pub fn on_drag_release(&mut self, timers: &mut Timers) {
        self.show(DRAG_MESSAGE, self.config.drag_ms, timers);
    }

    pub fn on_click_reset(&mut self) {
        self.click_count = 0;
    }

    pub fn on_emoji_revert(&mut self) {
        self.emoji_override = None;
    }

    /// A new idle behavior took over the sprite.
    pub fn clear_emoji_override(&mut self, timers: &mut Timers) {
        self.emoji_override = None;
        timers.cancel(TimerId::EmojiRevert);
    }
}
