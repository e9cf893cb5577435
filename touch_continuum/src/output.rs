//! Live MIDI output through `midir`.
//!
//! [`open_midi_output`] always succeeds: with no usable port it hands back a
//! [`NullSink`] so the controller still runs (and can still record).

use anyhow::Context;
use continuum_midi::{MidiMessage, MidiSink, NullSink};
use midir::{MidiOutput, MidiOutputConnection};
use tracing::{info, warn};

const CLIENT_NAME: &str = "touch_continuum";

// ════════════════════════════════════════════════════════════════════════════
// MidirSink
// ════════════════════════════════════════════════════════════════════════════

/// A connected output port.
pub struct MidirSink {
    port: String,
    conn: MidiOutputConnection,
}

impl MidirSink {
    /// Name of the connected port.
    pub fn port(&self) -> &str { &self.port }
}

impl MidiSink for MidirSink {
    fn send(&mut self, message: MidiMessage) {
        if let Err(e) = self.conn.send(message.bytes().as_slice()) {
            warn!(port = %self.port, ?message, "MIDI send failed: {e}");
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Port selection
// ════════════════════════════════════════════════════════════════════════════

/// Names of all output ports, in system order.
pub fn list_output_ports() -> anyhow::Result<Vec<String>> {
    let out = MidiOutput::new(CLIENT_NAME).context("failed to initialise MIDI output")?;
    Ok(out
        .ports()
        .iter()
        .enumerate()
        .map(|(i, p)| out.port_name(p).unwrap_or_else(|_| format!("Port {i}")))
        .collect())
}

/// Index of the port to open: an exact name match, then a case-insensitive
/// substring match, then the first port.
pub fn choose_port(names: &[String], preferred: Option<&str>) -> Option<usize> {
    if names.is_empty() {
        return None;
    }
    let Some(wanted) = preferred.map(str::trim).filter(|w| !w.is_empty()) else {
        return Some(0);
    };
    if let Some(i) = names.iter().position(|n| n == wanted) {
        return Some(i);
    }
    let lower = wanted.to_lowercase();
    if let Some(i) = names.iter().position(|n| n.to_lowercase().contains(&lower)) {
        return Some(i);
    }
    warn!(wanted, "preferred MIDI port not found, using {}", names[0]);
    Some(0)
}

/// Open the preferred output port, falling back to the first one and then
/// to a [`NullSink`].
pub fn open_midi_output(preferred: Option<&str>) -> Box<dyn MidiSink> {
    match try_open(preferred) {
        Ok(Some(sink)) => {
            info!(port = sink.port(), "MIDI output connected");
            Box::new(sink)
        }
        Ok(None) => {
            warn!("no MIDI output ports found, using null output");
            warn!("start a synthesiser first (e.g. `fluidsynth` or `timidity -iA` on Linux)");
            Box::new(NullSink)
        }
        Err(e) => {
            warn!("{e:#}, using null output");
            Box::new(NullSink)
        }
    }
}

fn try_open(preferred: Option<&str>) -> anyhow::Result<Option<MidirSink>> {
    let out = MidiOutput::new(CLIENT_NAME).context("failed to initialise MIDI output")?;
    let ports = out.ports();
    let names: Vec<String> = ports
        .iter()
        .enumerate()
        .map(|(i, p)| out.port_name(p).unwrap_or_else(|_| format!("Port {i}")))
        .collect();

    let Some(index) = choose_port(&names, preferred) else {
        return Ok(None);
    };
    let port = names[index].clone();
    let conn = out
        .connect(&ports[index], "touch_continuum-out")
        .map_err(|e| anyhow::anyhow!("failed to connect to MIDI port {port}: {e}"))?;
    Ok(Some(MidirSink { port, conn }))
}
