use crate::daynight::DayPeriod;
use crate::timers::{TimerId, Timers};

/// Autonomous sub-animation, only meaningful while the display state is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IdleBehavior {
    Walk,
    Sit,
    Lick,
    LookAround,
    Stretch,
    Nap,
    Wiggle,
}

impl IdleBehavior {
    /// Fixed enumeration order; the weighted pick walks this order.
    pub const ALL: [IdleBehavior; 7] = [
        Self::Walk,
        Self::Sit,
        Self::Lick,
        Self::LookAround,
        Self::Stretch,
        Self::Nap,
        Self::Wiggle,
    ];

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Walk | Self::Sit => "🐱",
            Self::Lick => "😽",
            Self::LookAround => "🙀",
            Self::Stretch => "😸",
            Self::Nap => "😴",
            Self::Wiggle => "😼",
        }
    }

    /// Inclusive duration range in milliseconds.
    pub fn duration_ms(self) -> (u64, u64) {
        match self {
            Self::Walk => (3_000, 8_000),
            Self::Sit => (2_000, 5_000),
            Self::Lick => (1_500, 3_000),
            Self::LookAround => (1_000, 2_000),
            Self::Stretch => (1_500, 2_500),
            Self::Nap => (5_000, 10_000),
            Self::Wiggle => (800, 1_500),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Walk => "walk",
            Self::Sit => "sit",
            Self::Lick => "lick",
            Self::LookAround => "lookAround",
            Self::Stretch => "stretch",
            Self::Nap => "nap",
            Self::Wiggle => "wiggle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// +1 for right, -1 for left.
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Facing::Left => "◀",
            Facing::Right => "▶",
        }
    }
}

/// Weights indexed in `IdleBehavior::ALL` order.
pub type WeightTable = [u32; 7];

/// Night: mostly naps, never wiggles. Morning: stretchy. Otherwise flat daytime.
pub fn weights(period: DayPeriod) -> WeightTable {
    match period {
        //                 walk sit lick look stretch nap wiggle
        DayPeriod::Night => [1, 3, 1, 1, 1, 8, 0],
        DayPeriod::Morning => [3, 2, 2, 2, 4, 1, 2],
        DayPeriod::Day => [4, 3, 2, 2, 2, 1, 2],
    }
}

/// Inverse-CDF pick: draw in [0, total), subtract weights in order until the
/// remainder drops to zero or below. Zero-weight entries never win.
pub fn pick(table: &WeightTable, rng: &mut fastrand::Rng) -> IdleBehavior {
    let total: u32 = table.iter().sum();
    if total == 0 {
        return IdleBehavior::Walk;
    }

    let mut remaining = rng.f64() * total as f64;
    for (behavior, &weight) in IdleBehavior::ALL.iter().zip(table) {
        if weight == 0 {
            continue;
        }
        remaining -= weight as f64;
        if remaining <= 0.0 {
            return *behavior;
        }
    }
    IdleBehavior::Walk
}

/// One scheduled idle behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviorPick {
    pub behavior: IdleBehavior,
    pub duration_ms: u64,
    /// Only set for walks.
    pub facing: Option<Facing>,
}

/// Weighted behavior, uniform duration, and a fresh coin-flip facing for walks.
pub fn roll(period: DayPeriod, rng: &mut fastrand::Rng) -> BehaviorPick {
    let behavior = pick(&weights(period), rng);
    let (min, max) = behavior.duration_ms();
    let facing = (behavior == IdleBehavior::Walk).then(|| {
        if rng.bool() {
            Facing::Right
        } else {
            Facing::Left
        }
    });
    BehaviorPick {
        behavior,
        duration_ms: rng.u64(min..=max),
        facing,
    }
}

/// Self-renewing sequence of idle behaviors, running only while eligible
/// (idle and not being dragged).
pub struct IdleScheduler {
    current: IdleBehavior,
    eligible: bool,
}

impl IdleScheduler {
    pub fn new() -> Self {
        Self {
            current: IdleBehavior::Sit,
            eligible: false,
        }
    }

    pub fn current(&self) -> IdleBehavior {
        self.current
    }

    pub fn is_eligible(&self) -> bool {
        self.eligible
    }

    /// Apply the eligibility condition. Gaining it schedules a behavior right
    /// away; losing it cancels the pending expiry and freezes `current`.
    pub fn set_eligible(
        &mut self,
        eligible: bool,
        timers: &mut Timers,
        period: DayPeriod,
        rng: &mut fastrand::Rng,
    ) -> Option<BehaviorPick> {
        if eligible == self.eligible {
            return None;
        }
        self.eligible = eligible;
        if eligible {
            Some(self.schedule(timers, period, rng))
        } else {
            timers.cancel(TimerId::BehaviorExpiry);
            None
        }
    }

    /// The current behavior ran its course.
    pub fn on_expired(
        &mut self,
        timers: &mut Timers,
        period: DayPeriod,
        rng: &mut fastrand::Rng,
    ) -> Option<BehaviorPick> {
        if !self.eligible {
            return None;
        }
        Some(self.schedule(timers, period, rng))
    }

    fn schedule(
        &mut self,
        timers: &mut Timers,
        period: DayPeriod,
        rng: &mut fastrand::Rng,
    ) -> BehaviorPick {
        let pick = roll(period, rng);
        self.current = pick.behavior;
        timers.arm(TimerId::BehaviorExpiry, pick.duration_ms);
        log::debug!(
            "Idle behavior: {} for {}ms {:?}",
            pick.behavior.label(),
            pick.duration_ms,
            pick.facing
        );
        pick
    }
}
