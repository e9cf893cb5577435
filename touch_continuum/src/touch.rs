//! Touch input.
//!
//! The public interface is [`TouchEvent`] delivered over an `mpsc` channel.
//! The host loop does not care whether events come from a touch screen, a
//! script, or a test.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Instant;

use continuum_midi::YAxisMode;
use tracing::debug;

use crate::script::{ScriptStep, TouchScript};
use crate::session::TouchId;

// ════════════════════════════════════════════════════════════════════════════
// TouchEvent
// ════════════════════════════════════════════════════════════════════════════

/// One input event.  Coordinates are raw surface pixels, y growing upward.
#[derive(Clone, Debug, PartialEq)]
pub enum TouchEvent {
    /// A finger landed.
    Down { id: TouchId, x: f32, y: f32, at: Instant },

    /// A finger moved from `(px, py)` to `(x, y)`.
    Move { id: TouchId, x: f32, y: f32, px: f32, py: f32, at: Instant },

    /// A finger lifted.
    Up { id: TouchId },

    /// Pitch lock switched on or off.
    PitchLock(bool),

    /// Y-axis destination changed.
    YAxis(YAxisMode),

    /// Keyboard scrolled so its left edge is at `left`.
    Scroll { left: f32 },

    /// Stop the host loop.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// TouchSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`TouchEvent`]s over a channel.  Dropping the
/// sender ends the stream.
pub trait TouchSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<TouchEvent>);
}

/// Spawn a touch source on its own thread and return the receiving end.
pub fn spawn_touch_source<T: TouchSource>(source: T) -> Receiver<TouchEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// ScriptTouchSource — replays a TouchScript in real time
// ════════════════════════════════════════════════════════════════════════════

/// Plays a [`TouchScript`]: `wait` steps sleep, every other step becomes a
/// timestamped event.
pub struct ScriptTouchSource {
    script: TouchScript,
}

impl ScriptTouchSource {
    pub fn new(script: TouchScript) -> Self {
        ScriptTouchSource { script }
    }
}

impl TouchSource for ScriptTouchSource {
    fn run(self: Box<Self>, tx: Sender<TouchEvent>) {
        let mut tracker = PositionTracker::default();
        for step in self.script {
            if let ScriptStep::Wait(d) = step {
                thread::sleep(d);
                continue;
            }
            let Some(event) = tracker.event_for(step, Instant::now()) else { continue };
            let quit = event == TouchEvent::Quit;
            if tx.send(event).is_err() || quit {
                return;
            }
        }
        debug!("touch script finished");
    }
}

/// Remembers where each scripted finger was so moves can carry their
/// previous position.
#[derive(Debug, Default)]
struct PositionTracker {
    last: HashMap<TouchId, (f32, f32)>,
}

impl PositionTracker {
    fn event_for(&mut self, step: ScriptStep, at: Instant) -> Option<TouchEvent> {
        let event = match step {
            ScriptStep::Down { id, x, y } => {
                self.last.insert(id, (x, y));
                TouchEvent::Down { id, x, y, at }
            }
            ScriptStep::Move { id, x, y } => {
                let (px, py) = self.last.insert(id, (x, y)).unwrap_or((x, y));
                TouchEvent::Move { id, x, y, px, py, at }
            }
            ScriptStep::Up { id } => {
                self.last.remove(&id);
                TouchEvent::Up { id }
            }
            ScriptStep::Wait(_)       => return None,
            ScriptStep::PitchLock(on) => TouchEvent::PitchLock(on),
            ScriptStep::YAxis(mode)   => TouchEvent::YAxis(mode),
            ScriptStep::Scroll(left)  => TouchEvent::Scroll { left },
            ScriptStep::Quit          => TouchEvent::Quit,
        };
        Some(event)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_carry_previous_position() {
        let t0 = Instant::now();
        let mut tracker = PositionTracker::default();
        let id = TouchId(1);

        tracker.event_for(ScriptStep::Down { id, x: 10.0, y: 20.0 }, t0);
        let ev = tracker.event_for(ScriptStep::Move { id, x: 30.0, y: 25.0 }, t0);
        assert_eq!(ev, Some(TouchEvent::Move { id, x: 30.0, y: 25.0, px: 10.0, py: 20.0, at: t0 }));

        let ev = tracker.event_for(ScriptStep::Move { id, x: 35.0, y: 25.0 }, t0);
        assert!(matches!(ev, Some(TouchEvent::Move { px, .. }) if px == 30.0));
    }

    #[test]
    fn move_without_down_has_no_delta() {
        let t0 = Instant::now();
        let mut tracker = PositionTracker::default();
        let ev = tracker.event_for(ScriptStep::Move { id: TouchId(4), x: 7.0, y: 8.0 }, t0);
        assert!(matches!(ev, Some(TouchEvent::Move { px, py, .. }) if px == 7.0 && py == 8.0));
    }

    #[test]
    fn waits_produce_no_event() {
        let mut tracker = PositionTracker::default();
        assert_eq!(
            tracker.event_for(ScriptStep::Wait(std::time::Duration::from_millis(5)), Instant::now()),
            None,
        );
    }

    #[test]
    fn script_source_delivers_in_order_and_closes() {
        let script = TouchScript::parse("down 1 100 400\nwait 1\nmove 1 110 400\nup 1").unwrap();
        let rx = spawn_touch_source(ScriptTouchSource::new(script));
        let events: Vec<TouchEvent> = rx.iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], TouchEvent::Down { .. }));
        assert!(matches!(events[1], TouchEvent::Move { px, .. } if px == 100.0));
        assert_eq!(events[2], TouchEvent::Up { id: TouchId(1) });
    }

    #[test]
    fn quit_stops_the_script() {
        let script = TouchScript::parse("quit\ndown 1 100 400").unwrap();
        let rx = spawn_touch_source(ScriptTouchSource::new(script));
        let events: Vec<TouchEvent> = rx.iter().collect();
        assert_eq!(events, vec![TouchEvent::Quit]);
    }
}
