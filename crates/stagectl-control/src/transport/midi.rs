use stagectl_core::Command;

use super::TransportWriter;
use crate::error::{ControlError, TransportError};
use crate::midi::{command_bytes, MidiSink};

/// Sends the MIDI commands of each frame to an output port
pub struct MidiWriter {
    sink: Option<MidiSink>,
}

impl MidiWriter {
    /// Connect by port id or name; an empty id selects the first port
    pub fn connect(device_id: &str) -> Result<Self, ControlError> {
        Ok(Self {
            sink: Some(MidiSink::connect(device_id)?),
        })
    }
}

impl TransportWriter for MidiWriter {
    fn name(&self) -> &str {
        "midi"
    }

    fn write(&mut self, command: &Command) -> Result<(), TransportError> {
        if command.midi_commands.is_empty() {
            return Ok(());
        }
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| TransportError::ConnectionClosed("MIDI output closed".to_string()))?;

        for midi in &command.midi_commands {
            sink.send(&command_bytes(midi))
                .map_err(|e| TransportError::Midi(e.to_string()))?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if let Some(sink) = self.sink.take() {
            sink.close();
        }
        Ok(())
    }
}
