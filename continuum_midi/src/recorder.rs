//! Capture a live performance and serialise it as a Standard MIDI File.
//!
//! Messages are stamped with wall-clock time as they are sent; on export the
//! elapsed time is converted to ticks at a fixed tempo, so the file plays
//! back with the original timing.

use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::{MidiMessage, MidiSink};

/// Records every message it is sent, with its arrival time.
///
/// ```rust
/// use continuum_midi::{MidiMessage, MidiSink, PerformanceRecorder};
///
/// let mut rec = PerformanceRecorder::new();
/// rec.send(MidiMessage::note_on(0, 60));
/// rec.send(MidiMessage::note_off(0, 60));
///
/// let bytes = rec.to_bytes();
/// assert_eq!(&bytes[0..4], b"MThd");
/// ```
#[derive(Clone, Debug)]
pub struct PerformanceRecorder {
    start:             Option<Instant>,
    events:            Vec<(Duration, MidiMessage)>,
    pub ticks_per_quarter: u16,
    pub tempo_bpm:         u32,
    /// Embedded as the track name.
    pub name:              String,
}

impl Default for PerformanceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceRecorder {
    /// 480 ticks per quarter at 120 BPM (1 tick ≈ 1.04 ms).
    pub fn new() -> Self {
        PerformanceRecorder {
            start:             None,
            events:            Vec::new(),
            ticks_per_quarter: 480,
            tempo_bpm:         120,
            name:              "touch_continuum performance".to_string(),
        }
    }

    /// Record `message` as having been sent at `at`.  The first recorded
    /// message defines time zero.
    pub fn record_at(&mut self, at: Instant, message: MidiMessage) {
        let start = *self.start.get_or_insert(at);
        self.events.push((at.saturating_duration_since(start), message));
    }

    pub fn len(&self) -> usize { self.events.len() }
    pub fn is_empty(&self) -> bool { self.events.is_empty() }

    /// Convert an elapsed time into ticks at the recorder's tempo.
    fn ticks_for(&self, elapsed: Duration) -> u32 {
        let micros_per_quarter = 60_000_000u128 / self.tempo_bpm.max(1) as u128;
        let ticks = elapsed.as_micros() * self.ticks_per_quarter as u128 / micros_per_quarter;
        ticks.min(u32::MAX as u128) as u32
    }

    /// Serialise to a `Vec<u8>` containing a valid MIDI Type-0 file.
    pub fn to_bytes(&self) -> Vec<u8> {
        let track = self.build_track_chunk();

        let mut out = Vec::new();
        // ── Header chunk ──────────────────────────────────────────────────
        out.extend_from_slice(b"MThd");
        out.extend_from_slice(&6u32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // format 0
        out.extend_from_slice(&1u16.to_be_bytes()); // 1 track
        out.extend_from_slice(&self.ticks_per_quarter.to_be_bytes());

        // ── Track chunk ───────────────────────────────────────────────────
        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&(track.len() as u32).to_be_bytes());
        out.extend_from_slice(&track);

        out
    }

    /// Write the recording to `path` as a Type-0 Standard MIDI File.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let bytes = self.to_bytes();
        let mut f = std::fs::File::create(path)?;
        f.write_all(&bytes)
    }

    fn build_track_chunk(&self) -> Vec<u8> {
        let mut t: Vec<u8> = Vec::new();

        // ── Tempo meta-event ──────────────────────────────────────────────
        let micros = 60_000_000u32 / self.tempo_bpm.max(1);
        t.extend_from_slice(&[0x00, 0xFF, 0x51, 0x03]);
        t.push(((micros >> 16) & 0xFF) as u8);
        t.push(((micros >>  8) & 0xFF) as u8);
        t.push(( micros        & 0xFF) as u8);

        // ── Track name meta-event ─────────────────────────────────────────
        let name = self.name.as_bytes();
        t.extend_from_slice(&[0x00, 0xFF, 0x03]);
        write_vlq(&mut t, name.len() as u32);
        t.extend_from_slice(name);

        // ── Channel events ────────────────────────────────────────────────
        let mut last_tick = 0u32;
        for (elapsed, message) in &self.events {
            let tick = self.ticks_for(*elapsed).max(last_tick);
            write_vlq(&mut t, tick - last_tick);
            t.extend_from_slice(message.bytes().as_slice());
            last_tick = tick;
        }

        // ── End of Track ──────────────────────────────────────────────────
        t.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

        t
    }
}

impl MidiSink for PerformanceRecorder {
    fn send(&mut self, message: MidiMessage) {
        self.record_at(Instant::now(), message);
    }
}

/// Write a MIDI variable-length quantity (VLQ).
fn write_vlq(buf: &mut Vec<u8>, mut value: u32) {
    let mut bytes = [0u8; 5];
    let mut i = 4;
    bytes[i] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 {
        i -= 1;
        bytes[i] = ((value & 0x7F) | 0x80) as u8;
        value >>= 7;
    }
    buf.extend_from_slice(&bytes[i..]);
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    // ── VLQ encoding ─────────────────────────────────────────────────────
    #[test]
    fn vlq_single_byte() {
        let mut b = Vec::new();
        write_vlq(&mut b, 0x40);
        assert_eq!(b, [0x40]);
    }

    #[test]
    fn vlq_two_bytes() {
        let mut b = Vec::new();
        write_vlq(&mut b, 128);
        assert_eq!(b, [0x81, 0x00]);
    }

    #[test]
    fn vlq_largest_two_byte_value() {
        let mut b = Vec::new();
        write_vlq(&mut b, 0x3FFF);
        assert_eq!(b, [0xFF, 0x7F]);
    }

    #[test]
    fn vlq_u32_max_fits() {
        let mut b = Vec::new();
        write_vlq(&mut b, u32::MAX);
        assert_eq!(b.len(), 5);
        assert_eq!(*b.last().unwrap(), 0x7F);
    }

    // ── timing ────────────────────────────────────────────────────────────
    #[test]
    fn half_second_is_one_quarter_at_120bpm() {
        let rec = PerformanceRecorder::new();
        assert_eq!(rec.ticks_for(Duration::from_millis(500)), 480);
        assert_eq!(rec.ticks_for(Duration::ZERO), 0);
    }

    #[test]
    fn first_event_is_time_zero() {
        let t0 = Instant::now();
        let mut rec = PerformanceRecorder::new();
        rec.record_at(t0 + Duration::from_secs(3), MidiMessage::note_on(0, 60));
        rec.record_at(t0 + Duration::from_millis(3500), MidiMessage::note_off(0, 60));
        assert_eq!(rec.events[0].0, Duration::ZERO);
        assert_eq!(rec.events[1].0, Duration::from_millis(500));
    }

    // ── file structure ────────────────────────────────────────────────────
    #[test]
    fn header_is_format_0_single_track() {
        let bytes = PerformanceRecorder::new().to_bytes();
        assert_eq!(&bytes[0..4], b"MThd");
        assert_eq!(&bytes[8..10], &[0, 0]);
        assert_eq!(&bytes[10..12], &[0, 1]);
        assert_eq!(&bytes[12..14], &480u16.to_be_bytes());
        assert_eq!(&bytes[14..18], b"MTrk");
    }

    #[test]
    fn events_are_delta_encoded() {
        let t0 = Instant::now();
        let mut rec = PerformanceRecorder::new();
        rec.name = String::new();
        rec.record_at(t0, MidiMessage::note_on(0, 60));
        rec.record_at(t0 + Duration::from_millis(500), MidiMessage::pitch_bend(0, 8533));
        let bytes = rec.to_bytes();

        // tempo (7) + empty name (4) precede the channel events
        let events = &bytes[22 + 7 + 4..];
        assert_eq!(&events[0..4], &[0x00, 0x90, 60, 127]);
        // 480 ticks = VLQ 0x83 0x60
        assert_eq!(&events[4..9], &[0x83, 0x60, 0xE0, 85, 66]);
        assert_eq!(&events[9..], &[0x00, 0xFF, 0x2F, 0x00]);
    }

    #[test]
    fn track_length_matches_chunk() {
        let mut rec = PerformanceRecorder::new();
        rec.send(MidiMessage::Aftertouch { channel: 0, value: 5 });
        let bytes = rec.to_bytes();
        let declared = u32::from_be_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]) as usize;
        assert_eq!(bytes.len(), 22 + declared);
    }
}
