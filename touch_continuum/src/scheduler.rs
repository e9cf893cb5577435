//! The rounding scheduler: advances every live touch's smoothed position
//! once per tick and decides whether another tick is needed.
//!
//! While a finger moves, the emitted position chases the finger
//! (`RoundSpeedToFinger`).  Once it has been still for `MovementDecay`, the
//! position is pulled toward the centre of the key under the finger
//! (`RoundSpeedToKey`) and finally snapped onto it.  With pitch lock on the
//! position jumps straight to the key centre.
//!
//! The scheduler does not own a timer.  [`RoundingScheduler::tick`] returns
//! a [`TickOutcome`]; the host keeps calling it every
//! [`interval`](RoundingScheduler::interval) while the outcome is
//! `Continue` and stops calling once it is `Stop`, until a press or move
//! restarts it with [`ensure_running`](RoundingScheduler::ensure_running).

use std::time::{Duration, Instant};

use tracing::trace;

use crate::session::TouchSession;

/// A move must exceed this raw horizontal delta to count as movement.
pub const KEY_MOVEMENT_THRESHOLD: f32 = 1.0;

/// Within this distance of the key centre a settled touch snaps onto it.
pub const SNAP_DISTANCE: f32 = 1.0;

// ════════════════════════════════════════════════════════════════════════════
// RoundingSettings
// ════════════════════════════════════════════════════════════════════════════

/// Validated rounding parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoundingSettings {
    /// Time between ticks.
    pub interval:           Duration,
    /// Fraction of the remaining distance to the finger covered per tick.
    pub finger_follow_rate: f32,
    /// Fraction of the remaining distance to the key centre covered per tick.
    pub key_snap_rate:      f32,
    /// How long after the last move a finger still counts as moving.
    pub movement_decay:     Duration,
    /// Snap to key centres immediately, no interpolation.
    pub pitch_lock:         bool,
}

impl Default for RoundingSettings {
    fn default() -> Self {
        RoundingSettings {
            interval:           Duration::from_millis(10),
            finger_follow_rate: 0.6,
            key_snap_rate:      0.2,
            movement_decay:     Duration::from_millis(200),
            pitch_lock:         false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TickOutcome
// ════════════════════════════════════════════════════════════════════════════

/// Whether the host should schedule another tick.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// At least one touch is still moving or interpolating.
    Continue,
    /// Every touch has converged; the scheduler is stopped.
    Stop,
}

impl TickOutcome {
    pub fn should_continue(self) -> bool {
        self == TickOutcome::Continue
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RoundingScheduler
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct RoundingScheduler {
    settings: RoundingSettings,
    running:  bool,
    ticks:    u64,
}

impl RoundingScheduler {
    pub fn new(settings: RoundingSettings) -> Self {
        RoundingScheduler { settings, running: false, ticks: 0 }
    }

    pub fn settings(&self) -> &RoundingSettings { &self.settings }

    pub fn interval(&self) -> Duration { self.settings.interval }

    pub fn is_running(&self) -> bool { self.running }

    /// Total ticks since creation.
    pub fn tick_count(&self) -> u64 { self.ticks }

    /// Start the scheduler if it is stopped.  Returns true if this call
    /// started it.
    pub fn ensure_running(&mut self) -> bool {
        let started = !self.running;
        if started {
            trace!("rounding scheduler started");
        }
        self.running = true;
        started
    }

    pub fn set_pitch_lock(&mut self, on: bool) {
        self.settings.pitch_lock = on;
    }

    /// Advance one session by one tick.  Returns true while the session
    /// still needs ticking.
    pub fn advance(&self, session: &mut TouchSession, now: Instant) -> bool {
        let target_key = session.rounded_key_center;
        let previous   = session.previous_position;

        if self.settings.pitch_lock {
            session.is_moving = false;
            session.current_position = target_key;
        } else {
            session.is_moving =
                now.saturating_duration_since(session.last_update) < self.settings.movement_decay
                && session.last_dx.abs() > KEY_MOVEMENT_THRESHOLD;

            if session.is_moving {
                session.current_position =
                    previous + (session.finger_position - previous) * self.settings.finger_follow_rate;
            } else {
                session.current_position =
                    previous + (target_key - previous) * self.settings.key_snap_rate;
                if (target_key - session.current_position).abs() <= SNAP_DISTANCE {
                    session.current_position = target_key;
                }
            }
        }

        // Whole units only: sub-unit drift must not keep the loop alive.
        let current = session.current_position.round();
        let needs_more = current != previous.round() || current != target_key.round();

        session.previous_position = session.current_position;
        needs_more
    }

    /// Advance every session, handing each one to `emit` afterwards
    /// (converged or not) so its pitch can be sent.
    pub fn tick<'a, I, F>(&mut self, sessions: I, now: Instant, mut emit: F) -> TickOutcome
    where
        I: IntoIterator<Item = &'a mut TouchSession>,
        F: FnMut(&TouchSession),
    {
        let mut needs_more = false;
        let mut count = 0usize;
        for session in sessions {
            needs_more |= self.advance(session, now);
            emit(session);
            count += 1;
        }

        self.ticks  += 1;
        self.running = needs_more;
        trace!(tick = self.ticks, sessions = count, continue_ = needs_more, "rounding tick");

        if needs_more { TickOutcome::Continue } else { TickOutcome::Stop }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
