//! MIDI messages and output

#[cfg(feature = "midi")]
mod output;

#[cfg(feature = "midi")]
pub use output::{list_output_ports, MidiSink};

use serde::{Deserialize, Serialize};
use stagectl_core::MidiCommand;

/// MIDI message types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MidiMessage {
    NoteOn {
        channel: u8,
        note: u8,
        velocity: u8,
    },
    NoteOff {
        channel: u8,
        note: u8,
        velocity: u8,
    },
    ControlChange {
        channel: u8,
        controller: u8,
        value: u8,
    },
    ProgramChange {
        channel: u8,
        program: u8,
    },
    PitchBend {
        channel: u8,
        value: u16,
    },
    Clock,
    Start,
    Stop,
    Continue,
}

impl MidiMessage {
    /// Parse a MIDI message from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let &status = bytes.first()?;

        // Real-time messages (single byte)
        match status {
            0xF8 => return Some(MidiMessage::Clock),
            0xFA => return Some(MidiMessage::Start),
            0xFC => return Some(MidiMessage::Stop),
            0xFB => return Some(MidiMessage::Continue),
            _ => {}
        }

        let channel = status & 0x0F;
        let data1 = *bytes.get(1)?;
        let data2 = bytes.get(2).copied();

        match status & 0xF0 {
            0x90 => Some(MidiMessage::NoteOn {
                channel,
                note: data1,
                velocity: data2?,
            }),
            0x80 => Some(MidiMessage::NoteOff {
                channel,
                note: data1,
                velocity: data2.unwrap_or(0),
            }),
            0xB0 => Some(MidiMessage::ControlChange {
                channel,
                controller: data1,
                value: data2?,
            }),
            0xC0 => Some(MidiMessage::ProgramChange {
                channel,
                program: data1,
            }),
            0xE0 => {
                let value = (u16::from(data2?) << 7) | u16::from(data1);
                Some(MidiMessage::PitchBend { channel, value })
            }
            _ => None,
        }
    }

    /// Convert to raw MIDI bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => vec![0x90 | channel, *note, *velocity],
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => vec![0x80 | channel, *note, *velocity],
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => vec![0xB0 | channel, *controller, *value],
            MidiMessage::ProgramChange { channel, program } => vec![0xC0 | channel, *program],
            MidiMessage::PitchBend { channel, value } => {
                vec![0xE0 | channel, (*value & 0x7F) as u8, (*value >> 7) as u8]
            }
            MidiMessage::Clock => vec![0xF8],
            MidiMessage::Start => vec![0xFA],
            MidiMessage::Stop => vec![0xFC],
            MidiMessage::Continue => vec![0xFB],
        }
    }
}

/// Wire bytes of a rendered MIDI command. Known messages get their proper
/// length, anything else goes out as three raw bytes.
pub fn command_bytes(command: &MidiCommand) -> Vec<u8> {
    let raw = [command.status, command.data1, command.data2];
    match MidiMessage::from_bytes(&raw) {
        Some(message) => message.to_bytes(),
        None => raw.to_vec(),
    }
}
