//! Display hints for whoever draws the keyboard.
//!
//! The engine never draws.  It queues [`RenderHint`]s as touches come and
//! go, and exposes a [`TouchView`] per live touch; a renderer may use
//! either, both, or neither.

use crate::geometry::KeyAddress;
use crate::session::{TouchId, TouchPhase};

// ════════════════════════════════════════════════════════════════════════════
// Brightness
// ════════════════════════════════════════════════════════════════════════════

/// Shade of a highlighted key at the bottom / top of the keyboard.
pub const KEY_BRIGHTNESS: (f32, f32) = (0.1, 0.5);

/// Level of the feedback wall at the bottom / top of the keyboard.
pub const FEEDBACK_LEVEL: (f32, f32) = (0.4, 1.0);

fn lerp((lo, hi): (f32, f32), t: f32) -> f32 {
    lo + (hi - lo) * t.clamp(0.0, 1.0)
}

/// Key shade for a vertical fraction (0.0 bottom, 1.0 top).
pub fn key_brightness(y_fraction: f32) -> f32 {
    lerp(KEY_BRIGHTNESS, y_fraction)
}

/// Feedback-wall level for a vertical fraction.
pub fn feedback_level(y_fraction: f32) -> f32 {
    lerp(FEEDBACK_LEVEL, y_fraction)
}

// ════════════════════════════════════════════════════════════════════════════
// RenderHint
// ════════════════════════════════════════════════════════════════════════════

/// One display change.  Positions are absolute surface coordinates unless
/// noted.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderHint {
    ShowFinger   { id: TouchId, x: f32, y: f32 },
    MoveFinger   { id: TouchId, x: f32, y: f32 },
    FadeFinger   { id: TouchId },
    HighlightKey { id: TouchId, key: KeyAddress },
    FadeKey      { id: TouchId, key: KeyAddress },
    /// Vertical position inside the highlighted key; sent on every move.
    ShadeKey     { id: TouchId, key: KeyAddress, y_offset: f32, brightness: f32 },
    Feedback     { level: f32 },
    FadeFeedback,
    /// Debug line at the emitted pitch position.
    PitchLine    { id: TouchId, x: f32 },
}

impl RenderHint {
    /// The touch this hint belongs to, if any.
    pub fn touch(&self) -> Option<TouchId> {
        match *self {
            RenderHint::ShowFinger   { id, .. }
            | RenderHint::MoveFinger   { id, .. }
            | RenderHint::FadeFinger   { id }
            | RenderHint::HighlightKey { id, .. }
            | RenderHint::FadeKey      { id, .. }
            | RenderHint::ShadeKey     { id, .. }
            | RenderHint::PitchLine    { id, .. } => Some(id),
            RenderHint::Feedback { .. } | RenderHint::FadeFeedback => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HintQueue
// ════════════════════════════════════════════════════════════════════════════

/// Hints waiting for a renderer.  The queue only empties when drained, so
/// a host without a renderer should switch it off.
#[derive(Clone, Debug)]
pub struct HintQueue {
    enabled: bool,
    pending: Vec<RenderHint>,
}

impl Default for HintQueue {
    fn default() -> Self {
        HintQueue { enabled: true, pending: Vec::new() }
    }
}

impl HintQueue {
    pub fn new() -> Self { Self::default() }

    pub fn is_enabled(&self) -> bool { self.enabled }

    /// Turning the queue off discards whatever is pending.
    pub fn set_enabled(&mut self, on: bool) {
        self.enabled = on;
        if !on {
            self.pending.clear();
        }
    }

    pub fn push(&mut self, hint: RenderHint) {
        if self.enabled {
            self.pending.push(hint);
        }
    }

    pub fn len(&self) -> usize { self.pending.len() }

    pub fn is_empty(&self) -> bool { self.pending.is_empty() }

    pub fn drain(&mut self) -> Vec<RenderHint> {
        std::mem::take(&mut self.pending)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TouchView
// ════════════════════════════════════════════════════════════════════════════

/// Snapshot of one live touch for drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchView {
    pub id:              TouchId,
    pub phase:           TouchPhase,
    /// Absolute x of the emitted (smoothed) pitch position.
    pub pitch_x:         f32,
    pub highlighted_key: KeyAddress,
    pub finger_point:    (f32, f32),
    pub is_moving:       bool,
}
