//! Time base shared by every subsystem
//!
//! The host owns the monotonic tick counter; the core only reads it.

use serde::{Deserialize, Serialize};

use crate::core::types::Tick;

/// Number of simulation ticks per in-game hour
pub const TICKS_PER_HOUR: Tick = 2_500;

/// Number of simulation ticks per in-game day
pub const TICKS_PER_DAY: Tick = 60_000;

/// Convert a per-day rate into a per-tick rate
#[inline]
pub fn per_tick(rate_per_day: f32) -> f32 {
    rate_per_day / TICKS_PER_DAY as f32
}

/// Monotonic clock used by the sandbox host and the demo binary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    now: Tick,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now: Tick) -> Self {
        Self { now }
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    pub fn advance(&mut self) -> Tick {
        self.now += 1;
        self.now
    }

    pub fn advance_by(&mut self, ticks: Tick) -> Tick {
        self.now += ticks;
        self.now
    }
}

/// Countdown that fires once its deadline passes and must be re-armed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalTimer {
    next_fire: Tick,
}

impl IntervalTimer {
    pub fn armed_at(next_fire: Tick) -> Self {
        Self { next_fire }
    }

    /// True once `now` is strictly past the deadline
    pub fn is_due(&self, now: Tick) -> bool {
        now > self.next_fire
    }

    pub fn rearm(&mut self, now: Tick, interval: Tick) {
        self.next_fire = now + interval;
    }

    pub fn next_fire(&self) -> Tick {
        self.next_fire
    }
}
