//! Named one-shot timers on a caller-driven millisecond clock.
//!
//! Each `TimerId` owns a single slot, so arming a timer that is already
//! pending replaces its deadline. Duplicate timers cannot pile up no matter
//! how fast the owning condition flaps.

/// Which timer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TimerId {
    BehaviorExpiry = 0,
    MessageDismiss = 1,
    CelebrationRevert = 2,
    ClickReset = 3,
    EmojiRevert = 4,
    CodingMinute = 5,
    ChatterPoll = 6,
}

const SLOT_COUNT: usize = 7;

impl TimerId {
    pub const ALL: [TimerId; SLOT_COUNT] = [
        Self::BehaviorExpiry,
        Self::MessageDismiss,
        Self::CelebrationRevert,
        Self::ClickReset,
        Self::EmojiRevert,
        Self::CodingMinute,
        Self::ChatterPoll,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::BehaviorExpiry => "behavior-expiry",
            Self::MessageDismiss => "message-dismiss",
            Self::CelebrationRevert => "celebration-revert",
            Self::ClickReset => "click-reset",
            Self::EmojiRevert => "emoji-revert",
            Self::CodingMinute => "coding-minute",
            Self::ChatterPoll => "chatter-poll",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at_ms: u64,
    /// Arm order, breaks ties between equal deadlines.
    seq: u64,
}

pub struct Timers {
    now_ms: u64,
    slots: [Option<Deadline>; SLOT_COUNT],
    next_seq: u64,
}

impl Timers {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            slots: [None; SLOT_COUNT],
            next_seq: 0,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Arm `id` to fire `delay_ms` from now, cancelling any pending deadline.
    /// Returns true if a pending deadline was replaced.
    pub fn arm(&mut self, id: TimerId, delay_ms: u64) -> bool {
        let replaced = self.slots[id as usize].is_some();
        self.slots[id as usize] = Some(Deadline {
            at_ms: self.now_ms.saturating_add(delay_ms),
            seq: self.next_seq,
        });
        self.next_seq += 1;
        replaced
    }

    /// Returns true if something was pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.slots[id as usize].take().is_some()
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.slots[id as usize].is_some()
    }

    #[cfg(test)]
    pub fn deadline(&self, id: TimerId) -> Option<u64> {
        self.slots[id as usize].map(|d| d.at_ms)
    }

    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Earliest pending deadline, for sleeping the event loop.
    pub fn next_deadline(&self) -> Option<u64> {
        self.slots.iter().flatten().map(|d| d.at_ms).min()
    }

    /// Pop the earliest timer due at or before `now_ms`.
    ///
    /// The clock moves to that timer's deadline first, so anything the
    /// handler re-arms is measured from when the timer actually fired.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<TimerId> {
        let (idx, deadline) = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|d| (i, d)))
            .filter(|(_, d)| d.at_ms <= now_ms)
            .min_by_key(|(_, d)| (d.at_ms, d.seq))?;

        self.slots[idx] = None;
        self.now_ms = self.now_ms.max(deadline.at_ms);
        Some(TimerId::ALL[idx])
    }

    /// Move the clock forward to `now_ms` once nothing more is due.
    pub fn settle(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// Drop every pending deadline. Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.pending();
        self.slots = [None; SLOT_COUNT];
        n
    }
}
