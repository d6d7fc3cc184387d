//! Consumers of recognizer output.

use std::io::Write;

use anyhow::Context as _;
use tapestry_ipc::{ClassifiedAction, Event, PrimitiveGesture, SequenceAction, UnrecognizedGesture};

/// Receiver of everything the recognizer produces.
///
/// Errors are logged by the recognizer and never interrupt recognition.
pub trait EventSink {
    fn on_primitive_gesture(&mut self, _primitive: &PrimitiveGesture) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_classified_action(&mut self, _action: &ClassifiedAction) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_unrecognized_gesture(&mut self, _gesture: &UnrecognizedGesture) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_sequence_action(&mut self, _action: &SequenceAction) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Sink that drops everything.
pub struct NullSink;

impl EventSink for NullSink {}

/// Writes every event as one line of JSON.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write(&mut self, event: Event) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.writer, &event).context("error serializing event")?;
        self.writer.write_all(b"\n").context("error writing event")?;
        self.writer.flush().context("error flushing events")?;
        Ok(())
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn on_primitive_gesture(&mut self, primitive: &PrimitiveGesture) -> anyhow::Result<()> {
        self.write(Event::PrimitiveGesture(primitive.clone()))
    }

    fn on_classified_action(&mut self, action: &ClassifiedAction) -> anyhow::Result<()> {
        self.write(Event::ClassifiedAction(action.clone()))
    }

    fn on_unrecognized_gesture(&mut self, gesture: &UnrecognizedGesture) -> anyhow::Result<()> {
        self.write(Event::UnrecognizedGesture(gesture.clone()))
    }

    fn on_sequence_action(&mut self, action: &SequenceAction) -> anyhow::Result<()> {
        self.write(Event::SequenceAction(action.clone()))
    }
}
