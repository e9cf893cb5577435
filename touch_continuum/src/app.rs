//! Host loop: feeds touch events to the controller and keeps the rounding
//! scheduler ticking while it asks to.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use continuum_midi::{MidiSink, PerformanceRecorder};
use tracing::{debug, info, trace};

use crate::config::EngineSettings;
use crate::controller::TouchController;
use crate::output::open_midi_output;
use crate::scheduler::TickOutcome;
use crate::touch::TouchEvent;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub settings:     EngineSettings,
    /// Preferred MIDI output port name.
    pub port:         Option<String>,
    /// Write the performance to this Standard MIDI File.
    pub record:       Option<PathBuf>,
    /// Longest time to keep ticking after input ends.
    pub settle_limit: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            settings:     EngineSettings::default(),
            port:         None,
            record:       None,
            settle_limit: Duration::from_secs(2),
        }
    }
}

/// What a run did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub events: usize,
    pub ticks:  u64,
}

// ════════════════════════════════════════════════════════════════════════════
// Loop
// ════════════════════════════════════════════════════════════════════════════

/// Drive `ctl` from `events` until the channel closes or a `Quit` arrives,
/// then let the scheduler settle (at most `settle_limit`) and release any
/// touches still down.
///
/// While the scheduler is stopped this blocks on the channel, so an idle
/// keyboard costs nothing.
pub fn drive<S: MidiSink>(
    ctl:          &mut TouchController<S>,
    events:       &Receiver<TouchEvent>,
    settle_limit: Duration,
) -> RunStats {
    let mut stats = RunStats::default();

    'input: loop {
        // 1. Idle: wait for the next event
        if !ctl.is_running() {
            match events.recv() {
                Ok(TouchEvent::Quit) | Err(_) => break 'input,
                Ok(event) => {
                    ctl.handle(event);
                    stats.events += 1;
                }
            }
        }

        // 2. Drain whatever else arrived
        loop {
            match events.try_recv() {
                Ok(TouchEvent::Quit)            => break 'input,
                Ok(event)                       => {
                    ctl.handle(event);
                    stats.events += 1;
                }
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => break 'input,
            }
        }

        // 3. One rounding step
        if ctl.is_running() {
            let _ = tick_once(ctl, &mut stats);
        }
    }

    debug!(events = stats.events, "input closed, settling");
    let deadline = Instant::now() + settle_limit;
    while Instant::now() < deadline {
        if !ctl.is_running() || !tick_once(ctl, &mut stats).should_continue() {
            break;
        }
    }
    ctl.release_all();
    flush_hints(ctl);
    stats
}

/// One scheduler step.  Sleeps out the rest of the interval only when
/// another tick follows; a stopped scheduler hands straight back to input.
fn tick_once<S: MidiSink>(ctl: &mut TouchController<S>, stats: &mut RunStats) -> TickOutcome {
    let started = Instant::now();
    let outcome = ctl.tick(started);
    stats.ticks += 1;
    flush_hints(ctl);
    if outcome.should_continue() {
        thread::sleep(ctl.tick_interval().saturating_sub(started.elapsed()));
    }
    outcome
}

/// There is no renderer attached; hints only go to the log.
fn flush_hints<S: MidiSink>(ctl: &mut TouchController<S>) {
    for hint in ctl.drain_hints() {
        trace!(?hint, "render hint");
    }
}

/// Run against a live MIDI port (or a null output if none), optionally
/// recording the performance.
pub fn run(cfg: AppConfig, events: Receiver<TouchEvent>) -> anyhow::Result<RunStats> {
    let live     = open_midi_output(cfg.port.as_deref());
    let recorder = cfg.record.as_ref().map(|_| PerformanceRecorder::new());
    let mut ctl  = TouchController::new(cfg.settings, (live, recorder));

    let stats = drive(&mut ctl, &events, cfg.settle_limit);
    info!(events = stats.events, ticks = stats.ticks, "performance finished");

    let (_, recorder) = ctl.into_sink();
    if let (Some(path), Some(rec)) = (cfg.record.as_ref(), recorder) {
        rec.write_file(path)
            .with_context(|| format!("failed to write recording to {}", path.display()))?;
        info!(path = %path.display(), messages = rec.len(), "performance recorded");
    }
    Ok(stats)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
