//! Session-aware MIDI emission: turns a [`TouchSession`]'s numbers into
//! [`MidiMessage`]s on the configured channel.
//!
//! Everything here is a pure function of its inputs; the wire encoding
//! itself lives in `continuum_midi`.

use continuum_midi::{
    pitch_bend_value, y_axis_message, y_axis_value, MidiMessage, YAxisMode, DATA_MAX,
    PITCH_BEND_CENTER,
};

use crate::geometry::KeyboardGeometry;
use crate::session::TouchSession;

/// Validated MIDI parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MidiSettings {
    /// 0–15.
    pub channel:         u8,
    /// Synthesizer pitch-bend range in semitones (≥ 1).
    pub pitchbend_range: u8,
    /// Added to the key index to get the note number.
    pub transpose:       i32,
    /// Controller number used when the Y axis drives a CC.
    pub cc_controller:   u8,
    pub y_axis:          YAxisMode,
}

impl Default for MidiSettings {
    fn default() -> Self {
        MidiSettings {
            channel:         0,
            pitchbend_range: 24,
            transpose:       36,
            cc_controller:   1,
            y_axis:          YAxisMode::Aftertouch,
        }
    }
}

/// MIDI note for a key, clamped to 0–127.
pub fn note_for(key_index: usize, transpose: i32) -> u8 {
    let index = i64::try_from(key_index).unwrap_or(i64::MAX);
    index.saturating_add(transpose as i64).clamp(0, DATA_MAX as i64) as u8
}

/// Pitch bend for the session's smoothed position, measured from the centre
/// of the key struck at press.
pub fn pitch_bend(session: &TouchSession, key_width: f32, midi: &MidiSettings) -> MidiMessage {
    let distance = session.current_position() - session.initial_center(key_width);
    MidiMessage::pitch_bend(midi.channel, pitch_bend_value(distance, midi.pitchbend_range, key_width))
}

/// The "no bend" message sent at every press.
pub fn pitch_bend_neutral(midi: &MidiSettings) -> MidiMessage {
    MidiMessage::pitch_bend(midi.channel, PITCH_BEND_CENTER)
}

pub fn note_on(session: &TouchSession, midi: &MidiSettings) -> MidiMessage {
    MidiMessage::note_on(midi.channel, session.note_number)
}

pub fn note_off(session: &TouchSession, midi: &MidiSettings) -> MidiMessage {
    MidiMessage::note_off(midi.channel, session.note_number)
}

/// Y-axis control from a raw vertical coordinate.
pub fn y_axis(y: f32, geometry: &KeyboardGeometry, midi: &MidiSettings) -> MidiMessage {
    let value = y_axis_value(geometry.y_fraction(y));
    y_axis_message(midi.y_axis, midi.channel, midi.cc_controller, value)
}

/// Sent on release when the Y axis drives a CC; `None` in aftertouch mode.
pub fn release_reset(midi: &MidiSettings) -> Option<MidiMessage> {
    match midi.y_axis {
        YAxisMode::Aftertouch => None,
        YAxisMode::Volume => Some(MidiMessage::ControlChange {
            channel:    midi.channel,
            controller: midi.cc_controller,
            value:      0,
        }),
    }
}

/// Sent once when the Y-axis mode changes to `mode`: leaving aftertouch
/// clears held pressure, entering it opens the CC fully.
pub fn mode_switch(mode: YAxisMode, midi: &MidiSettings) -> MidiMessage {
    match mode {
        YAxisMode::Volume => MidiMessage::Aftertouch { channel: midi.channel, value: 0 },
        YAxisMode::Aftertouch => MidiMessage::ControlChange {
            channel:    midi.channel,
            controller: midi.cc_controller,
            value:      DATA_MAX,
        },
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::KeyAddress;
    use crate::session::TouchId;
    use std::time::Instant;

    fn geometry() -> KeyboardGeometry {
        KeyboardGeometry {
            left:          0.0,
            bottom:        100.0,
            width:         3000.0,
            height:        400.0,
            key_width:     50.0,
            surface_width: 1280.0,
        }
    }

    fn session() -> TouchSession {
        TouchSession::new(
            TouchId(1),
            KeyAddress { key_index: 2, key_origin: 100.0 },
            50.0,
            note_for(2, 36),
            (120.0, 300.0),
            Instant::now(),
        )
    }

    #[test]
    fn transpose_36_key_2_is_note_38() {
        let midi = MidiSettings::default();
        let s = session();
        assert_eq!(s.note_number, 38);
        assert_eq!(
            note_on(&s, &midi),
            MidiMessage::NoteOn { channel: 0, note: 38, velocity: 127 },
        );
        assert_eq!(note_off(&s, &midi).bytes().as_slice(), &[0x80, 38, 0]);
    }

    #[test]
    fn note_for_clamps() {
        assert_eq!(note_for(0, -12), 0);
        assert_eq!(note_for(100, 36), 127);
        assert_eq!(note_for(usize::MAX, 0), 127);
    }

    #[test]
    fn fresh_session_bends_neutral() {
        let midi = MidiSettings::default();
        assert_eq!(pitch_bend(&session(), 50.0, &midi), pitch_bend_neutral(&midi));
    }

    #[test]
    fn fifty_px_right_is_8533() {
        let midi = MidiSettings::default();
        let mut s = session();
        s.current_position = 175.0;
        let msg = pitch_bend(&s, 50.0, &midi);
        assert_eq!(msg, MidiMessage::PitchBend { channel: 0, value: 8533 });
        assert_eq!(msg.bytes().as_slice(), &[0xE0, 85, 66]);
    }

    #[test]
    fn channel_is_applied_everywhere() {
        let midi = MidiSettings { channel: 5, y_axis: YAxisMode::Volume, ..MidiSettings::default() };
        let s = session();
        assert_eq!(note_on(&s, &midi).channel(), 5);
        assert_eq!(note_off(&s, &midi).channel(), 5);
        assert_eq!(pitch_bend(&s, 50.0, &midi).channel(), 5);
        assert_eq!(y_axis(300.0, &geometry(), &midi).channel(), 5);
        assert_eq!(release_reset(&midi).map(|m| m.channel()), Some(5));
    }

    #[test]
    fn y_axis_routes_by_mode() {
        let g = geometry();
        let at = MidiSettings::default();
        assert_eq!(y_axis(500.0, &g, &at), MidiMessage::Aftertouch { channel: 0, value: 127 });

        let vol = MidiSettings { y_axis: YAxisMode::Volume, cc_controller: 7, ..at };
        assert_eq!(
            y_axis(50.0, &g, &vol),
            MidiMessage::ControlChange { channel: 0, controller: 7, value: 0 },
        );
    }

    #[test]
    fn release_reset_only_in_volume_mode() {
        assert_eq!(release_reset(&MidiSettings::default()), None);
        let vol = MidiSettings { y_axis: YAxisMode::Volume, ..MidiSettings::default() };
        assert_eq!(
            release_reset(&vol),
            Some(MidiMessage::ControlChange { channel: 0, controller: 1, value: 0 }),
        );
    }

    #[test]
    fn mode_switch_messages() {
        let midi = MidiSettings::default();
        assert_eq!(
            mode_switch(YAxisMode::Volume, &midi),
            MidiMessage::Aftertouch { channel: 0, value: 0 },
        );
        assert_eq!(
            mode_switch(YAxisMode::Aftertouch, &midi),
            MidiMessage::ControlChange { channel: 0, controller: 1, value: 127 },
        );
    }
}
