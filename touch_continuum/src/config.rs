//! Configuration: the JSON settings file and the validated snapshot the
//! engine runs on.
//!
//! [`ContinuumConfig`] mirrors the file one-to-one (sections `General`,
//! `MIDI`, `Advanced`, `Keyboard`; every key optional).  It is checked once
//! at startup by `EngineSettings::try_from`, which turns it into plain
//! numbers and `Duration`s; nothing on the tick path looks at the file
//! representation again.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use continuum_midi::YAxisMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::emitter::MidiSettings;
use crate::geometry::KeyboardGeometry;
use crate::scheduler::RoundingSettings;

pub const CONFIG_FILE: &str = "touch_continuum.json";

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access config file {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot serialise config: {0}")]
    Serialize(#[from] serde_json::Error),
    /// A value that would make the engine misbehave (e.g. a zero key width).
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ════════════════════════════════════════════════════════════════════════════
// File representation
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContinuumConfig {
    #[serde(rename = "General")]
    pub general:  GeneralSection,
    #[serde(rename = "MIDI")]
    pub midi:     MidiSection,
    #[serde(rename = "Advanced")]
    pub advanced: AdvancedSection,
    #[serde(rename = "Keyboard")]
    pub keyboard: KeyboardSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct GeneralSection {
    pub pitch_lock:      bool,
    pub y_axis:          YAxisMode,
    pub show_pitch_line: bool,
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            pitch_lock:      false,
            y_axis:          YAxisMode::Aftertouch,
            show_pitch_line: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct MidiSection {
    /// Preferred output port name; the first port is used if absent.
    pub device:          Option<String>,
    pub channel:         u32,
    pub pitchbend_range: u32,
    pub transpose:       i32,
    #[serde(rename = "CCController")]
    pub cc_controller:   u32,
}

impl Default for MidiSection {
    fn default() -> Self {
        Self {
            device:          None,
            channel:         0,
            pitchbend_range: 24,
            transpose:       36,
            cc_controller:   1,
        }
    }
}

/// Timing and smoothing.  Times are in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct AdvancedSection {
    pub rounding_scheduler_interval: f64,
    pub round_speed_to_finger:       f32,
    pub round_speed_to_key:          f32,
    pub movement_decay:              f64,
}

impl Default for AdvancedSection {
    fn default() -> Self {
        Self {
            rounding_scheduler_interval: 0.01,
            round_speed_to_finger:       0.6,
            round_speed_to_key:          0.2,
            movement_decay:              0.2,
        }
    }
}

/// Keyboard placement in surface pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct KeyboardSection {
    pub key_width:     f32,
    pub left:          f32,
    pub bottom:        f32,
    pub keys:          u32,
    pub height:        f32,
    pub surface_width: f32,
}

impl Default for KeyboardSection {
    fn default() -> Self {
        Self {
            key_width:     50.0,
            left:          -540.0,
            bottom:        366.0,
            keys:          60,
            height:        468.0,
            surface_width: 1280.0,
        }
    }
}

impl ContinuumConfig {
    /// Load from `path`.  A missing file yields the defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Write as pretty-printed JSON.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// EngineSettings — validated snapshot
// ════════════════════════════════════════════════════════════════════════════

/// Everything the engine needs, checked and converted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineSettings {
    pub geometry:        KeyboardGeometry,
    pub midi:            MidiSettings,
    pub rounding:        RoundingSettings,
    pub show_pitch_line: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            geometry: KeyboardGeometry {
                left:          -540.0,
                bottom:        366.0,
                width:         60.0 * 50.0,
                height:        468.0,
                key_width:     50.0,
                surface_width: 1280.0,
            },
            midi:            MidiSettings::default(),
            rounding:        RoundingSettings::default(),
            show_pitch_line: false,
        }
    }
}

fn ensure(ok: bool, key: &'static str, reason: impl FnOnce() -> String) -> Result<(), ConfigError> {
    if ok { Ok(()) } else { Err(ConfigError::Invalid { key, reason: reason() }) }
}

fn positive(value: f32, key: &'static str) -> Result<(), ConfigError> {
    ensure(value.is_finite() && value > 0.0, key, || format!("must be positive, got {value}"))
}

fn rate(value: f32, key: &'static str) -> Result<(), ConfigError> {
    ensure(value.is_finite() && value > 0.0 && value <= 1.0, key, || {
        format!("must be in (0, 1], got {value}")
    })
}

fn seconds(value: f64, key: &'static str, allow_zero: bool) -> Result<Duration, ConfigError> {
    let ok = value.is_finite() && (value > 0.0 || (allow_zero && value == 0.0)) && value < 3600.0;
    ensure(ok, key, || format!("not a usable duration: {value} s"))?;
    Ok(Duration::from_secs_f64(value))
}

fn small_int(value: u32, range: std::ops::RangeInclusive<u32>, key: &'static str) -> Result<u8, ConfigError> {
    ensure(range.contains(&value), key, || {
        format!("must be in {}..={}, got {value}", range.start(), range.end())
    })?;
    Ok(value as u8)
}

impl TryFrom<&ContinuumConfig> for EngineSettings {
    type Error = ConfigError;

    fn try_from(config: &ContinuumConfig) -> Result<Self, Self::Error> {
        let kb = &config.keyboard;
        positive(kb.key_width, "Keyboard.KeyWidth")?;
        positive(kb.height, "Keyboard.Height")?;
        positive(kb.surface_width, "Keyboard.SurfaceWidth")?;
        ensure(kb.keys >= 1, "Keyboard.Keys", || "at least one key is required".to_string())?;
        ensure(kb.left.is_finite(), "Keyboard.Left", || format!("not a number: {}", kb.left))?;
        ensure(kb.bottom.is_finite(), "Keyboard.Bottom", || format!("not a number: {}", kb.bottom))?;

        let geometry = KeyboardGeometry {
            left:          kb.left,
            bottom:        kb.bottom,
            width:         kb.keys as f32 * kb.key_width,
            height:        kb.height,
            key_width:     kb.key_width,
            surface_width: kb.surface_width,
        };
        positive(geometry.width, "Keyboard.Keys")?;

        let m = &config.midi;
        ensure((-127..=127).contains(&m.transpose), "MIDI.Transpose", || {
            format!("must be in -127..=127, got {}", m.transpose)
        })?;
        let midi = MidiSettings {
            channel:         small_int(m.channel, 0..=15, "MIDI.Channel")?,
            pitchbend_range: small_int(m.pitchbend_range, 1..=127, "MIDI.PitchbendRange")?,
            transpose:       m.transpose,
            cc_controller:   small_int(m.cc_controller, 1..=127, "MIDI.CCController")?,
            y_axis:          config.general.y_axis,
        };

        let a = &config.advanced;
        rate(a.round_speed_to_finger, "Advanced.RoundSpeedToFinger")?;
        rate(a.round_speed_to_key, "Advanced.RoundSpeedToKey")?;
        let rounding = RoundingSettings {
            interval:           seconds(a.rounding_scheduler_interval, "Advanced.RoundingSchedulerInterval", false)?,
            finger_follow_rate: a.round_speed_to_finger,
            key_snap_rate:      a.round_speed_to_key,
            movement_decay:     seconds(a.movement_decay, "Advanced.MovementDecay", true)?,
            pitch_lock:         config.general.pitch_lock,
        };

        Ok(EngineSettings {
            geometry,
            midi,
            rounding,
            show_pitch_line: config.general.show_pitch_line,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
