//! # touch_continuum
//!
//! A touch keyboard that does not quantise pitch.  Every finger's horizontal
//! position is followed continuously and sent as MIDI pitch bend on top of
//! the note it struck; when the finger rests, the pitch glides onto the
//! nearest semitone.
//!
//! ## Pipeline
//!
//! ```text
//! TouchEvent ──▶ TouchController ──press/move/release──▶ TouchSession map
//!                      │                                      │
//!                      └──tick every RoundingSchedulerInterval─┘
//!                                 RoundingScheduler
//!                                        │
//!                                 emitter ──▶ MidiSink (midir / recorder)
//!                                        └──▶ RenderHint queue
//! ```
//!
//! | Module | Role |
//! |---|---|
//! | [`geometry`] | raw coordinates → bounded keyboard space and key addresses |
//! | [`session`] | per-finger state |
//! | [`scheduler`] | smoothing, rounding and the self-stopping tick |
//! | [`emitter`] | session numbers → MIDI messages |
//! | [`controller`] | touch lifecycle, owns everything above |
//! | [`hints`] | display hints for a renderer |
//! | [`config`] | JSON settings and their validated snapshot |
//! | [`touch`], [`script`] | touch event sources, scripted playback |
//! | [`output`] | `midir` port selection |
//! | [`app`] | the host loop used by the binary |
//!
//! ## Settings file
//!
//! ```json
//! {
//!   "General":  { "PitchLock": false, "YAxis": "Aftertouch", "ShowPitchLine": false },
//!   "MIDI":     { "Device": null, "Channel": 0, "PitchbendRange": 24,
//!                 "Transpose": 36, "CCController": 1 },
//!   "Advanced": { "RoundingSchedulerInterval": 0.01, "RoundSpeedToFinger": 0.6,
//!                 "RoundSpeedToKey": 0.2, "MovementDecay": 0.2 },
//!   "Keyboard": { "KeyWidth": 50, "Left": -540, "Bottom": 366, "Keys": 60,
//!                 "Height": 468, "SurfaceWidth": 1280 }
//! }
//! ```
//!
//! The synthesizer's pitch-bend range must match `PitchbendRange`, or
//! slides will not land on the keys.

pub mod app;
pub mod config;
pub mod controller;
pub mod emitter;
pub mod geometry;
pub mod hints;
pub mod output;
pub mod scheduler;
pub mod script;
pub mod session;
pub mod touch;
