//! Per-finger state tracked from press to release.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use crate::geometry::KeyAddress;

// ════════════════════════════════════════════════════════════════════════════
// TouchId
// ════════════════════════════════════════════════════════════════════════════

/// Stable identity of one touch, assigned by the input layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TouchId(pub u64);

impl fmt::Display for TouchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Live sessions, keyed by touch identity.
pub type SessionMap = HashMap<TouchId, TouchSession>;

// ════════════════════════════════════════════════════════════════════════════
// TouchPhase
// ════════════════════════════════════════════════════════════════════════════

/// Where a live touch is in its lifecycle.  A released touch has no
/// session at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    /// Pressed, not moved yet.
    Pressed,
    /// Moved at least once.
    Tracking,
}

// ════════════════════════════════════════════════════════════════════════════
// TouchSession
// ════════════════════════════════════════════════════════════════════════════

/// State of one finger on the keyboard.
///
/// All horizontal positions are relative to the keyboard's left edge.
/// `current_position` is the smoothed position that is turned into pitch
/// bend; apart from its initial value it is written only by
/// [`RoundingScheduler`](crate::scheduler::RoundingScheduler).
#[derive(Clone, Debug)]
pub struct TouchSession {
    pub id:                 TouchId,
    /// Key struck at press; anchors the pitch-bend zero point.
    pub initial_key:        KeyAddress,
    /// MIDI note sounded for this touch (transpose already applied).
    pub note_number:        u8,
    pub phase:              TouchPhase,

    /// Latest bounded finger x.
    pub finger_position:    f32,
    /// Centre of the key under the finger.
    pub rounded_key_center: f32,
    pub(crate) current_position:  f32,
    pub(crate) previous_position: f32,
    pub is_moving:          bool,

    /// Time of the last raw move (or the press).
    pub last_update:        Instant,
    /// Raw horizontal delta of the last move.
    pub last_dx:            f32,

    /// Key currently painted for this touch.
    pub highlighted_key:    KeyAddress,
    /// Bounded finger point on the surface, for the finger indicator.
    pub finger_point:       (f32, f32),
}

impl TouchSession {
    /// Start a session on `key`.  The finger sits on the key's left edge
    /// and the emitted position starts on the key's centre, so the first
    /// pitch bend is neutral.
    pub fn new(
        id:           TouchId,
        key:          KeyAddress,
        key_width:    f32,
        note_number:  u8,
        finger_point: (f32, f32),
        at:           Instant,
    ) -> Self {
        let center = key.key_origin + key_width / 2.0;
        TouchSession {
            id,
            initial_key:        key,
            note_number,
            phase:              TouchPhase::Pressed,
            finger_position:    key.key_origin,
            rounded_key_center: center,
            current_position:   center,
            previous_position:  center,
            is_moving:          false,
            last_update:        at,
            last_dx:            0.0,
            highlighted_key:    key,
            finger_point,
        }
    }

    /// Smoothed position, as emitted.
    pub fn current_position(&self) -> f32 { self.current_position }

    /// `current_position` as of the previous tick.
    pub fn previous_position(&self) -> f32 { self.previous_position }

    /// Centre of the struck key, relative to the keyboard.
    pub fn initial_center(&self, key_width: f32) -> f32 {
        self.initial_key.key_origin + key_width / 2.0
    }

    /// Record a finger move.  Does not touch `current_position`.
    pub fn track(&mut self, finger_position: f32, rounded_key_center: f32, dx: f32, at: Instant) {
        self.finger_position    = finger_position;
        self.rounded_key_center = rounded_key_center;
        self.last_dx            = dx;
        self.last_update        = at;
        self.phase              = TouchPhase::Tracking;
    }

    /// False when any position has gone non-finite; such a session cannot
    /// be interpolated.
    pub fn is_sound(&self) -> bool {
        self.finger_position.is_finite()
            && self.rounded_key_center.is_finite()
            && self.current_position.is_finite()
            && self.previous_position.is_finite()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn key2() -> KeyAddress {
        KeyAddress { key_index: 2, key_origin: 100.0 }
    }

    #[test]
    fn new_session_starts_on_key_center() {
        let s = TouchSession::new(TouchId(1), key2(), 50.0, 38, (120.0, 300.0), Instant::now());
        assert_eq!(s.finger_position, 100.0);
        assert_eq!(s.rounded_key_center, 125.0);
        assert_eq!(s.current_position(), 125.0);
        assert_eq!(s.previous_position(), 125.0);
        assert!(!s.is_moving);
        assert_eq!(s.phase, TouchPhase::Pressed);
        assert_eq!(s.initial_center(50.0), 125.0);
    }

    #[test]
    fn track_updates_targets_only() {
        let t0 = Instant::now();
        let mut s = TouchSession::new(TouchId(1), key2(), 50.0, 38, (120.0, 300.0), t0);
        s.track(160.0, 175.0, 40.0, t0);
        assert_eq!(s.finger_position, 160.0);
        assert_eq!(s.rounded_key_center, 175.0);
        assert_eq!(s.last_dx, 40.0);
        assert_eq!(s.current_position(), 125.0);
        assert_eq!(s.phase, TouchPhase::Tracking);
    }

    #[test]
    fn non_finite_session_is_unsound() {
        let mut s = TouchSession::new(TouchId(1), key2(), 50.0, 38, (0.0, 0.0), Instant::now());
        assert!(s.is_sound());
        s.finger_position = f32::NAN;
        assert!(!s.is_sound());
    }

    #[test]
    fn touch_id_display() {
        assert_eq!(TouchId(7).to_string(), "#7");
    }
}
