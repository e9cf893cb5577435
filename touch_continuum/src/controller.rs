//! Touch lifecycle: press → (move)* → release for every finger, plus the
//! tick that drives the rounding scheduler.
//!
//! [`TouchController`] owns the live sessions, the scheduler and the MIDI
//! sink.  All handlers and ticks run on one thread; a handler never runs
//! while a tick is iterating the sessions, so the session map needs no
//! locking.
//!
//! Render hints queue up until [`drain_hints`](TouchController::drain_hints)
//! takes them.  A host with no renderer calls
//! [`set_hints_enabled(false)`](TouchController::set_hints_enabled) so the
//! queue does not grow for the life of the controller.
//!
//! ```rust
//! use std::time::Instant;
//! use continuum_midi::MidiMessage;
//! use touch_continuum::config::EngineSettings;
//! use touch_continuum::controller::TouchController;
//! use touch_continuum::session::TouchId;
//!
//! let mut settings = EngineSettings::default();
//! settings.geometry.left = 0.0;
//!
//! let mut ctl = TouchController::new(settings, Vec::<MidiMessage>::new());
//! ctl.set_hints_enabled(false);
//! let t0 = Instant::now();
//! assert!(ctl.press(TouchId(1), 120.0, 400.0, t0));
//! while ctl.tick(t0).should_continue() {}
//! ctl.release(TouchId(1));
//!
//! assert!(ctl.sink().contains(&MidiMessage::note_off(0, 38)));
//! ```

use std::time::{Duration, Instant};

use continuum_midi::{MidiSink, YAxisMode};
use tracing::{debug, trace, warn};

use crate::config::EngineSettings;
use crate::emitter;
use crate::geometry::KeyboardGeometry;
use crate::hints::{feedback_level, key_brightness, HintQueue, RenderHint, TouchView};
use crate::scheduler::{RoundingScheduler, TickOutcome};
use crate::session::{SessionMap, TouchId, TouchSession};
use crate::touch::TouchEvent;

pub struct TouchController<S: MidiSink> {
    settings:  EngineSettings,
    sessions:  SessionMap,
    scheduler: RoundingScheduler,
    sink:      S,
    hints:     HintQueue,
}

impl<S: MidiSink> TouchController<S> {
    pub fn new(settings: EngineSettings, sink: S) -> Self {
        TouchController {
            scheduler: RoundingScheduler::new(settings.rounding),
            settings,
            sessions:  SessionMap::new(),
            sink,
            hints:     HintQueue::new(),
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn settings(&self) -> &EngineSettings { &self.settings }

    pub fn geometry(&self) -> &KeyboardGeometry { &self.settings.geometry }

    pub fn session(&self, id: TouchId) -> Option<&TouchSession> { self.sessions.get(&id) }

    pub fn active_touches(&self) -> usize { self.sessions.len() }

    /// True while the host should keep calling [`tick`](Self::tick).
    pub fn is_running(&self) -> bool { self.scheduler.is_running() }

    pub fn tick_interval(&self) -> Duration { self.scheduler.interval() }

    pub fn sink(&self) -> &S { &self.sink }

    pub fn sink_mut(&mut self) -> &mut S { &mut self.sink }

    pub fn into_sink(self) -> S { self.sink }

    /// Take every render hint queued since the last call.
    pub fn drain_hints(&mut self) -> Vec<RenderHint> {
        self.hints.drain()
    }

    /// Stop (or resume) queueing render hints.  Disabling drops any that
    /// are pending.
    pub fn set_hints_enabled(&mut self, on: bool) {
        self.hints.set_enabled(on);
    }

    /// Snapshot of every live touch, ordered by id.
    pub fn views(&self) -> Vec<TouchView> {
        let mut views: Vec<TouchView> = self
            .sessions
            .values()
            .map(|s| TouchView {
                id:              s.id,
                phase:           s.phase,
                pitch_x:         self.settings.geometry.to_surface_x(s.current_position()),
                highlighted_key: s.highlighted_key,
                finger_point:    s.finger_point,
                is_moving:       s.is_moving,
            })
            .collect();
        views.sort_by_key(|v| v.id);
        views
    }

    // ════════════════════════════════════════════════════════════════════
    // Touch handlers
    // ════════════════════════════════════════════════════════════════════

    /// Start a touch.  Returns false (and does nothing) when the point is
    /// not on the keyboard.  A press for an id that is already live ends
    /// the old touch first.
    pub fn press(&mut self, id: TouchId, x: f32, y: f32, at: Instant) -> bool {
        let g = self.settings.geometry;
        if !g.contains(x, y) {
            debug!(touch = %id, x, y, "press outside keyboard ignored");
            return false;
        }
        if self.sessions.contains_key(&id) {
            debug!(touch = %id, "press for live touch, releasing it first");
            self.release(id);
        }

        let midi  = self.settings.midi;
        let key   = g.key_of(x);
        let note  = emitter::note_for(key.key_index, midi.transpose);
        let point = (g.bound_x(x), g.bound_y(y));
        let session = TouchSession::new(id, key, g.key_width, note, point, at);

        // the bend left over from the previous note is reset here, not on release
        self.sink.send(emitter::pitch_bend_neutral(&midi));
        self.sink.send(emitter::y_axis(y, &g, &midi));
        self.sink.send(emitter::note_on(&session, &midi));

        let fraction = g.y_fraction(y);
        self.hints.push(RenderHint::ShowFinger { id, x: point.0, y: point.1 });
        self.hints.push(RenderHint::HighlightKey { id, key });
        self.hints.push(RenderHint::Feedback { level: feedback_level(fraction) });

        debug!(touch = %id, key = key.key_index, note, "press");
        self.sessions.insert(id, session);
        self.scheduler.ensure_running();
        true
    }

    /// Follow a touch to `(x, y)`; `previous` is where the input layer last
    /// saw it.  Unknown ids are ignored.
    pub fn move_to(&mut self, id: TouchId, x: f32, y: f32, previous: (f32, f32), at: Instant) -> bool {
        let g    = self.settings.geometry;
        let midi = self.settings.midi;
        let Some(session) = self.sessions.get_mut(&id) else {
            debug!(touch = %id, "move for unknown touch ignored");
            return false;
        };

        let bx = g.bound_x(x);
        let by = g.bound_y(y);
        let center = g.key_center_of(bx);
        session.track(bx - g.left, center, x - previous.0, at);
        session.finger_point = (bx, by);

        self.sink.send(emitter::y_axis(y, &g, &midi));

        self.hints.push(RenderHint::MoveFinger { id, x: bx, y: by });

        let old_left = g.to_surface_x(session.highlighted_key.key_origin);
        if bx < old_left || bx > old_left + g.key_width - 1.0 {
            let new_key = g.key_of(bx);
            self.hints.push(RenderHint::FadeKey { id, key: session.highlighted_key });
            self.hints.push(RenderHint::HighlightKey { id, key: new_key });
            trace!(touch = %id, from = session.highlighted_key.key_index, to = new_key.key_index, "key change");
            session.highlighted_key = new_key;
        }

        let fraction = g.y_fraction(y);
        self.hints.push(RenderHint::ShadeKey {
            id,
            key:        session.highlighted_key,
            y_offset:   by - g.bound_y(previous.1),
            brightness: key_brightness(fraction),
        });
        self.hints.push(RenderHint::Feedback { level: feedback_level(fraction) });

        self.scheduler.ensure_running();
        true
    }

    /// End a touch.  The pitch bend is left where it is so the note's
    /// release tail is not bent back.  Unknown ids are ignored.
    pub fn release(&mut self, id: TouchId) -> bool {
        let Some(session) = self.sessions.remove(&id) else {
            debug!(touch = %id, "release for unknown touch ignored");
            return false;
        };
        let midi = self.settings.midi;

        self.sink.send(emitter::note_off(&session, &midi));
        if let Some(reset) = emitter::release_reset(&midi) {
            self.sink.send(reset);
        }

        self.hints.push(RenderHint::FadeKey { id, key: session.highlighted_key });
        self.hints.push(RenderHint::FadeFinger { id });
        self.hints.push(RenderHint::FadeFeedback);

        debug!(touch = %id, note = session.note_number, "release");
        true
    }

    /// Release every live touch, lowest id first.
    pub fn release_all(&mut self) {
        let mut ids: Vec<TouchId> = self.sessions.keys().copied().collect();
        ids.sort();
        for id in ids {
            self.release(id);
        }
    }

    /// Apply one input event.  `Quit` is for the host and is ignored here.
    pub fn handle(&mut self, event: TouchEvent) {
        match event {
            TouchEvent::Down { id, x, y, at } => {
                self.press(id, x, y, at);
            }
            TouchEvent::Move { id, x, y, px, py, at } => {
                self.move_to(id, x, y, (px, py), at);
            }
            TouchEvent::Up { id } => {
                self.release(id);
            }
            TouchEvent::PitchLock(on)   => self.set_pitch_lock(on),
            TouchEvent::YAxis(mode)     => self.set_y_axis_mode(mode),
            TouchEvent::Scroll { left } => self.set_keyboard_left(left),
            TouchEvent::Quit            => {}
        }
    }

    // ════════════════════════════════════════════════════════════════════
    // Settings changed at runtime
    // ════════════════════════════════════════════════════════════════════

    pub fn set_pitch_lock(&mut self, on: bool) {
        self.settings.rounding.pitch_lock = on;
        self.scheduler.set_pitch_lock(on);
        if !self.sessions.is_empty() {
            self.scheduler.ensure_running();
        }
        debug!(pitch_lock = on, "pitch lock");
    }

    /// Switch the Y-axis destination.  Sends one message so the controller
    /// that is no longer driven is left in a neutral state.
    pub fn set_y_axis_mode(&mut self, mode: YAxisMode) {
        if self.settings.midi.y_axis == mode {
            return;
        }
        self.settings.midi.y_axis = mode;
        self.sink.send(emitter::mode_switch(mode, &self.settings.midi));
        debug!(y_axis = mode.name(), "y axis mode");
    }

    /// Scroll the keyboard.  Live touches keep the key they struck.
    pub fn set_keyboard_left(&mut self, left: f32) {
        if !left.is_finite() {
            warn!(left, "ignoring non-finite keyboard scroll");
            return;
        }
        self.settings.geometry.left = left;
        trace!(left, "keyboard scrolled");
    }

    // ════════════════════════════════════════════════════════════════════
    // Tick
    // ════════════════════════════════════════════════════════════════════

    /// Advance every live touch by one step and send its pitch bend.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        self.drop_unsound();

        let key_width  = self.settings.geometry.key_width;
        let geometry   = self.settings.geometry;
        let midi       = self.settings.midi;
        let pitch_line = self.settings.show_pitch_line;
        let sink  = &mut self.sink;
        let hints = &mut self.hints;

        self.scheduler.tick(self.sessions.values_mut(), now, |session| {
            sink.send(emitter::pitch_bend(session, key_width, &midi));
            if pitch_line {
                hints.push(RenderHint::PitchLine {
                    id: session.id,
                    x:  geometry.to_surface_x(session.current_position()),
                });
            }
        })
    }

    /// One bad touch must not stall the others: end it before ticking.
    fn drop_unsound(&mut self) {
        let unsound: Vec<TouchId> = self
            .sessions
            .values()
            .filter(|s| !s.is_sound())
            .map(|s| s.id)
            .collect();
        for id in unsound {
            warn!(touch = %id, "dropping touch with non-finite position");
            self.release(id);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
