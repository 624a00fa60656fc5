//! Day period from the local clock.
//! Drives which idle-behavior weight table the cat uses.

use chrono::Timelike;

use crate::config::ScheduleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    Night,
    Morning,
    Day,
}

/// Time-of-day state computed from the system clock.
#[derive(Debug, Clone, Copy)]
pub struct DayNightState {
    /// Current local hour (0-23).
    pub hour: u32,
    pub period: DayPeriod,
    night_start: u32,
    night_end: u32,
    morning_end: u32,
}

impl DayNightState {
    pub fn new(config: &ScheduleConfig) -> Self {
        let mut s = Self {
            hour: 12,
            period: DayPeriod::Day,
            night_start: config.night_start,
            night_end: config.night_end,
            morning_end: config.morning_end,
        };
        s.update();
        s
    }

    /// Refresh from the system clock. Call once per frame or less.
    pub fn update(&mut self) {
        self.set_hour(chrono::Local::now().hour());
    }

    pub fn set_hour(&mut self, hour: u32) {
        self.hour = hour % 24;
        self.period = self.period_for(self.hour);
    }

    /// Night may wrap past midnight; morning runs from night's end.
    pub fn period_for(&self, hour: u32) -> DayPeriod {
        let night = if self.night_start > self.night_end {
            hour >= self.night_start || hour < self.night_end
        } else {
            hour >= self.night_start && hour < self.night_end
        };
        if night {
            DayPeriod::Night
        } else if hour >= self.night_end && hour < self.morning_end {
            DayPeriod::Morning
        } else {
            DayPeriod::Day
        }
    }
}
