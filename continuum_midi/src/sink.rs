//! Destinations for emitted [`MidiMessage`]s.
//!
//! Sending is fire-and-forget: a sink never reports failure back to the
//! engine.  Live backends log and drop messages they cannot deliver.

use crate::MidiMessage;

/// Anything that accepts MIDI messages from the engine.
pub trait MidiSink {
    fn send(&mut self, message: MidiMessage);
}

/// In-memory sink; keeps every message in order.
impl MidiSink for Vec<MidiMessage> {
    fn send(&mut self, message: MidiMessage) {
        self.push(message);
    }
}

impl<S: MidiSink + ?Sized> MidiSink for Box<S> {
    fn send(&mut self, message: MidiMessage) {
        (**self).send(message);
    }
}

impl<S: MidiSink + ?Sized> MidiSink for &mut S {
    fn send(&mut self, message: MidiMessage) {
        (**self).send(message);
    }
}

/// An optional sink; `None` drops everything.
impl<S: MidiSink> MidiSink for Option<S> {
    fn send(&mut self, message: MidiMessage) {
        if let Some(sink) = self {
            sink.send(message);
        }
    }
}

/// Tee: every message goes to both sinks, left first.
impl<A: MidiSink, B: MidiSink> MidiSink for (A, B) {
    fn send(&mut self, message: MidiMessage) {
        self.0.send(message);
        self.1.send(message);
    }
}

/// Discards everything.  Used when no MIDI port is available.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl MidiSink for NullSink {
    fn send(&mut self, message: MidiMessage) {
        tracing::trace!(?message, "null sink dropped message");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_keeps_order() {
        let mut v: Vec<MidiMessage> = Vec::new();
        v.send(MidiMessage::note_on(0, 60));
        v.send(MidiMessage::note_off(0, 60));
        assert_eq!(v, vec![MidiMessage::note_on(0, 60), MidiMessage::note_off(0, 60)]);
    }

    #[test]
    fn tee_feeds_both() {
        let mut tee: (Vec<MidiMessage>, Option<Vec<MidiMessage>>) = (Vec::new(), Some(Vec::new()));
        tee.send(MidiMessage::pitch_bend(1, 8192));
        assert_eq!(tee.0.len(), 1);
        assert_eq!(tee.1.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn none_and_null_drop() {
        let mut none: Option<Vec<MidiMessage>> = None;
        none.send(MidiMessage::note_on(0, 1));
        assert!(none.is_none());
        NullSink.send(MidiMessage::note_on(0, 1));
    }

    #[test]
    fn boxed_dyn_sink_forwards() {
        let mut inner: Vec<MidiMessage> = Vec::new();
        {
            let mut boxed: Box<dyn MidiSink + '_> = Box::new(&mut inner);
            boxed.send(MidiMessage::note_on(0, 64));
        }
        assert_eq!(inner.len(), 1);
    }
}
