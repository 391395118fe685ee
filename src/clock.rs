//! Chess clock.
//!
//! Two countdown budgets, one running at a time. All time arithmetic is
//! driven by caller-supplied `Instant`s: charging is elapsed-based, so an
//! irregular or delayed tick cadence still yields the correct remaining
//! time, and tests can play out whole time scenarios without waiting.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::engine::Color;

/// Two-sided countdown clock. Created at match start, owned by the match
/// controller; external callers only see snapshots.
#[derive(Clone, Debug)]
pub struct ChessClock {
    remaining: [Duration; 2],
    active: Color,
    last_charge: Instant,
    /// First side whose budget hit zero. Sticky once set.
    flagged: Option<Color>,
    /// A halted clock ignores further charging (game over).
    halted: bool,
}

impl ChessClock {
    /// Both sides get `allowance`; White's clock starts running at `now`.
    pub fn new(allowance: Duration, now: Instant) -> Self {
        ChessClock {
            remaining: [allowance; 2],
            active: Color::White,
            last_charge: now,
            flagged: None,
            halted: false,
        }
    }

    /// Charge elapsed time to the active side and report both budgets.
    /// The inactive side is never charged.
    pub fn tick(&mut self, now: Instant) -> ClockSnapshot {
        self.charge(now);
        self.snapshot()
    }

    /// A move was committed: charge the mover, then start the opponent's
    /// clock. No effect once a flag has fallen or the clock is halted.
    pub fn press(&mut self, now: Instant) {
        self.charge(now);
        if self.flagged.is_none() && !self.halted {
            self.active = !self.active;
        }
    }

    /// Freeze both budgets at their current values.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    /// Back to a fresh clock: both sides at `allowance`, White running.
    pub fn reset(&mut self, allowance: Duration, now: Instant) {
        *self = ChessClock::new(allowance, now);
    }

    pub fn remaining(&self, side: Color) -> Duration {
        self.remaining[side.index()]
    }

    pub fn active_side(&self) -> Color {
        self.active
    }

    /// The side whose time ran out, if any. Detected at the first charge
    /// that observes the crossing and sticky from then on.
    pub fn timed_out(&self) -> Option<Color> {
        self.flagged
    }

    /// Current budgets without charging.
    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            white_remaining_ms: self.remaining[Color::White.index()].as_millis() as u64,
            black_remaining_ms: self.remaining[Color::Black.index()].as_millis() as u64,
            timed_out: self.flagged,
        }
    }

    fn charge(&mut self, now: Instant) {
        if self.halted || self.flagged.is_some() {
            return;
        }
        let elapsed = now.saturating_duration_since(self.last_charge);
        self.last_charge = now;

        let budget = &mut self.remaining[self.active.index()];
        *budget = budget.saturating_sub(elapsed);
        if budget.is_zero() {
            self.flagged = Some(self.active);
        }
    }
}

/// Read-only clock view for display and timeout reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockSnapshot {
    pub white_remaining_ms: u64,
    pub black_remaining_ms: u64,
    pub timed_out: Option<Color>,
}

impl ClockSnapshot {
    pub fn remaining_ms(&self, side: Color) -> u64 {
        match side {
            Color::White => self.white_remaining_ms,
            Color::Black => self.black_remaining_ms,
        }
    }

    /// "mm:ss" rendering for clock displays.
    pub fn format(&self, side: Color) -> String {
        let secs = self.remaining_ms(side) / 1000;
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

// =========================================================================
// Tests
// =========================================================================
