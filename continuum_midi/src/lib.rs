//! # continuum_midi
//!
//! Wire-level MIDI for a continuous-pitch touch controller.
//!
//! * [`MidiMessage`] — the channel-voice messages the controller emits
//!   (Note On/Off, Pitch Bend, Control Change, Channel Aftertouch) and
//!   their byte encoding.
//! * [`pitch_bend_value`] / [`split_14bit`] — pixel distance → 14-bit bend.
//! * [`y_axis_value`] / [`y_axis_message`] — vertical position → 0–127,
//!   routed to aftertouch or a CC controller according to [`YAxisMode`].
//! * [`MidiSink`] — where messages go (a live port, a `Vec`, nowhere, or a
//!   [`PerformanceRecorder`] that writes a Standard MIDI File).
//!
//! ## Quick start
//!
//! ```rust
//! use continuum_midi::{MidiMessage, MidiSink, pitch_bend_value};
//!
//! let mut sent: Vec<MidiMessage> = Vec::new();
//! // 50 px right of the key centre, ±24 semitone range, 50 px keys
//! let value = pitch_bend_value(50.0, 24, 50.0);
//! sent.send(MidiMessage::PitchBend { channel: 0, value });
//!
//! assert_eq!(value, 8533);
//! assert_eq!(sent[0].bytes().as_slice(), &[0xE0, 85, 66]);
//! ```

use serde::{Deserialize, Serialize};

pub mod recorder;
pub mod sink;

pub use recorder::PerformanceRecorder;
pub use sink::{MidiSink, NullSink};

// ════════════════════════════════════════════════════════════════════════════
// Constants
// ════════════════════════════════════════════════════════════════════════════

/// 14-bit pitch-bend value meaning "no bend".
pub const PITCH_BEND_CENTER: u16 = 8192;

/// Largest 14-bit pitch-bend value.
pub const PITCH_BEND_MAX: u16 = 16383;

/// Velocity used for every Note On.
pub const NOTE_ON_VELOCITY: u8 = 127;

/// Largest 7-bit data value.
pub const DATA_MAX: u8 = 127;

// ════════════════════════════════════════════════════════════════════════════
// YAxisMode — what the vertical touch position controls
// ════════════════════════════════════════════════════════════════════════════

/// Destination of the vertical (Y-axis) touch position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum YAxisMode {
    /// Channel Aftertouch (pressure).
    #[default]
    Aftertouch,
    /// A Control Change controller (modulation / volume), see `CCController`.
    Volume,
}

impl YAxisMode {
    pub fn name(self) -> &'static str {
        match self {
            YAxisMode::Aftertouch => "Aftertouch",
            YAxisMode::Volume     => "Volume",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MidiMessage — channel-voice messages
// ════════════════════════════════════════════════════════════════════════════

/// A channel-voice message.  Channels are 0–15; they are masked to 4 bits
/// when encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn        { channel: u8, note: u8, velocity: u8 },
    NoteOff       { channel: u8, note: u8 },
    /// 14-bit value, 8192 = centre.
    PitchBend     { channel: u8, value: u16 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Channel pressure (0xD0), a single data byte.
    Aftertouch    { channel: u8, value: u8 },
}

impl MidiMessage {
    /// Note On at the fixed controller velocity (127).
    pub fn note_on(channel: u8, note: u8) -> Self {
        MidiMessage::NoteOn { channel, note, velocity: NOTE_ON_VELOCITY }
    }

    pub fn note_off(channel: u8, note: u8) -> Self {
        MidiMessage::NoteOff { channel, note }
    }

    /// Pitch bend; `value` is clamped to the 14-bit range.
    pub fn pitch_bend(channel: u8, value: u16) -> Self {
        MidiMessage::PitchBend { channel, value: value.min(PITCH_BEND_MAX) }
    }

    pub fn channel(&self) -> u8 {
        match *self {
            MidiMessage::NoteOn        { channel, .. }
            | MidiMessage::NoteOff       { channel, .. }
            | MidiMessage::PitchBend     { channel, .. }
            | MidiMessage::ControlChange { channel, .. }
            | MidiMessage::Aftertouch    { channel, .. } => channel,
        }
    }

    /// Encode as running-status-free wire bytes.
    pub fn bytes(&self) -> WireBytes {
        match *self {
            MidiMessage::NoteOn { channel, note, velocity } =>
                WireBytes::three(0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F),
            MidiMessage::NoteOff { channel, note } =>
                WireBytes::three(0x80 | (channel & 0x0F), note & 0x7F, 0),
            MidiMessage::PitchBend { channel, value } => {
                let (lsb, msb) = split_14bit(value);
                WireBytes::three(0xE0 | (channel & 0x0F), lsb, msb)
            }
            MidiMessage::ControlChange { channel, controller, value } =>
                WireBytes::three(0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F),
            MidiMessage::Aftertouch { channel, value } =>
                WireBytes::two(0xD0 | (channel & 0x0F), value & 0x7F),
        }
    }
}

/// Encoded bytes of one [`MidiMessage`] (2 or 3 bytes, no allocation).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WireBytes {
    data: [u8; 3],
    len:  usize,
}

impl WireBytes {
    fn two(status: u8, d1: u8) -> Self {
        WireBytes { data: [status, d1, 0], len: 2 }
    }

    fn three(status: u8, d1: u8, d2: u8) -> Self {
        WireBytes { data: [status, d1, d2], len: 3 }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Conversions
// ════════════════════════════════════════════════════════════════════════════

/// Convert a horizontal distance from the struck key's centre into a 14-bit
/// pitch-bend value.
///
/// One key width is one semitone; `range_semitones` is the synthesizer's
/// configured bend range, so a full ±8192 swing covers `range_semitones`
/// keys.  The result is rounded and clamped to `0..=16383`.
///
/// ```rust
/// use continuum_midi::pitch_bend_value;
/// assert_eq!(pitch_bend_value(0.0, 24, 50.0), 8192);
/// assert_eq!(pitch_bend_value(50.0, 24, 50.0), 8533);
/// ```
pub fn pitch_bend_value(pixel_distance: f32, range_semitones: u8, key_width: f32) -> u16 {
    let span = range_semitones.max(1) as f32 * key_width;
    if span <= 0.0 || !span.is_finite() || !pixel_distance.is_finite() {
        return PITCH_BEND_CENTER;
    }
    let offset = (pixel_distance * PITCH_BEND_CENTER as f32 / span).round();
    (offset + PITCH_BEND_CENTER as f32).clamp(0.0, PITCH_BEND_MAX as f32) as u16
}

/// Split a 14-bit value into its (LSB, MSB) 7-bit data bytes.
pub fn split_14bit(value: u16) -> (u8, u8) {
    let v = value.min(PITCH_BEND_MAX);
    ((v % 128) as u8, (v / 128) as u8)
}

/// Scale a vertical fraction (0.0 = keyboard bottom, 1.0 = top) to 0–127.
pub fn y_axis_value(fraction: f32) -> u8 {
    if !fraction.is_finite() { return 0; }
    (DATA_MAX as f32 * fraction).round().clamp(0.0, DATA_MAX as f32) as u8
}

/// Route a Y-axis value to aftertouch or to the configured CC controller.
pub fn y_axis_message(mode: YAxisMode, channel: u8, cc_controller: u8, value: u8) -> MidiMessage {
    match mode {
        YAxisMode::Aftertouch => MidiMessage::Aftertouch { channel, value },
        YAxisMode::Volume     => MidiMessage::ControlChange {
            channel,
            controller: cc_controller,
            value,
        },
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    // ── pitch bend math ───────────────────────────────────────────────────
    #[test]
    fn bend_center_at_zero_distance() {
        assert_eq!(pitch_bend_value(0.0, 24, 50.0), PITCH_BEND_CENTER);
    }

    #[test]
    fn bend_one_key_right_at_range_24() {
        // 50 * 8192 / (24 * 50) = 341.33 → 341 + 8192
        assert_eq!(pitch_bend_value(50.0, 24, 50.0), 8533);
        assert_eq!(split_14bit(8533), (85, 66));
    }

    #[test]
    fn bend_is_symmetric_around_center() {
        let up   = pitch_bend_value( 75.0, 12, 50.0) as i32 - 8192;
        let down = pitch_bend_value(-75.0, 12, 50.0) as i32 - 8192;
        assert_eq!(up, -down);
    }

    #[test]
    fn bend_clamps_to_14_bits() {
        assert_eq!(pitch_bend_value( 1.0e6, 2, 50.0), PITCH_BEND_MAX);
        assert_eq!(pitch_bend_value(-1.0e6, 2, 50.0), 0);
    }

    #[test]
    fn bend_full_range_reaches_extremes() {
        // range keys to the left = exactly -8192
        assert_eq!(pitch_bend_value(-24.0 * 50.0, 24, 50.0), 0);
    }

    #[test]
    fn bend_non_finite_distance_is_neutral() {
        assert_eq!(pitch_bend_value(f32::NAN, 24, 50.0), PITCH_BEND_CENTER);
    }

    #[test]
    fn split_center() {
        assert_eq!(split_14bit(8192), (0, 64));
        assert_eq!(split_14bit(PITCH_BEND_MAX), (127, 127));
    }

    // ── y axis ────────────────────────────────────────────────────────────
    #[test]
    fn y_axis_scaling() {
        assert_eq!(y_axis_value(0.0), 0);
        assert_eq!(y_axis_value(1.0), 127);
        assert_eq!(y_axis_value(0.5), 64); // 63.5 rounds away from zero
        assert_eq!(y_axis_value(2.0), 127);
        assert_eq!(y_axis_value(-1.0), 0);
    }

    #[test]
    fn y_axis_routing() {
        assert_eq!(
            y_axis_message(YAxisMode::Aftertouch, 3, 1, 90),
            MidiMessage::Aftertouch { channel: 3, value: 90 },
        );
        assert_eq!(
            y_axis_message(YAxisMode::Volume, 3, 7, 90),
            MidiMessage::ControlChange { channel: 3, controller: 7, value: 90 },
        );
    }

    // ── wire bytes ────────────────────────────────────────────────────────
    #[test]
    fn note_on_bytes() {
        let m = MidiMessage::note_on(2, 38);
        assert_eq!(m.bytes().as_slice(), &[0x92, 38, 127]);
    }

    #[test]
    fn note_off_bytes_use_zero_velocity() {
        let m = MidiMessage::note_off(15, 60);
        assert_eq!(m.bytes().as_slice(), &[0x8F, 60, 0]);
    }

    #[test]
    fn aftertouch_is_two_bytes() {
        let m = MidiMessage::Aftertouch { channel: 0, value: 100 };
        assert_eq!(m.bytes().as_slice(), &[0xD0, 100]);
    }

    #[test]
    fn control_change_bytes() {
        let m = MidiMessage::ControlChange { channel: 1, controller: 1, value: 0 };
        assert_eq!(m.bytes().as_slice(), &[0xB1, 1, 0]);
    }

    #[test]
    fn channel_is_masked() {
        let m = MidiMessage::note_on(0x13, 60);
        assert_eq!(m.bytes().as_slice()[0], 0x93);
    }

    #[test]
    fn pitch_bend_constructor_clamps() {
        assert_eq!(
            MidiMessage::pitch_bend(0, u16::MAX),
            MidiMessage::PitchBend { channel: 0, value: PITCH_BEND_MAX },
        );
    }

    #[test]
    fn y_axis_defaults_to_aftertouch() {
        assert_eq!(YAxisMode::default(), YAxisMode::Aftertouch);
        assert_eq!(YAxisMode::Volume.name(), "Volume");
    }
}
