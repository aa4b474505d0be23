//! Transport writers
//!
//! A writer realizes one rendered frame on an output medium. The player calls
//! [`TransportWriter::write`] once per frame from the blocking thread pool.

mod artnet;
mod buffer;
#[cfg(feature = "midi")]
mod midi;
mod visualizer;

pub use artnet::ArtNetWriter;
pub use buffer::BufferWriter;
#[cfg(feature = "midi")]
pub use midi::MidiWriter;
pub use visualizer::{VisualizerWriter, DEFAULT_VISUALIZER_ENDPOINT};

use std::fmt;
use std::str::FromStr;

use stagectl_core::Command;

use crate::error::{ControlError, TransportError};

/// Output medium for rendered frames
pub trait TransportWriter: Send {
    /// Name used in logs and reports
    fn name(&self) -> &str;

    /// Realize the commands of one frame
    fn write(&mut self, command: &Command) -> Result<(), TransportError>;

    /// Release the medium. Called once when playback ends.
    fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Selectable transports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Buffer,
    Visualizer,
    ArtNet,
    Midi,
}

impl TransportKind {
    pub const ALL: [TransportKind; 4] = [
        TransportKind::Buffer,
        TransportKind::Visualizer,
        TransportKind::ArtNet,
        TransportKind::Midi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Buffer => "buffer",
            TransportKind::Visualizer => "visualizer",
            TransportKind::ArtNet => "artnet",
            TransportKind::Midi => "midi",
        }
    }

    /// Fail for transports that were not compiled in
    pub fn ensure_available(self) -> Result<Self, ControlError> {
        match self {
            TransportKind::Midi if !cfg!(feature = "midi") => Err(ControlError::FeatureDisabled {
                kind: "transport",
                name: self.as_str().to_string(),
                feature: "midi",
            }),
            _ => Ok(self),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| ControlError::UnknownKind {
                kind: "transport",
                name: s.to_string(),
                expected: "buffer, visualizer, artnet, midi",
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transport_kind() {
        assert_eq!("buffer".parse::<TransportKind>().unwrap(), TransportKind::Buffer);
        assert_eq!(" ArtNet ".parse::<TransportKind>().unwrap(), TransportKind::ArtNet);
        assert!(matches!(
            "dmx".parse::<TransportKind>(),
            Err(ControlError::UnknownKind { .. })
        ));
    }

    #[test]
    fn test_midi_availability_follows_feature() {
        let available = TransportKind::Midi.ensure_available().is_ok();
        assert_eq!(available, cfg!(feature = "midi"));
        assert!(TransportKind::Buffer.ensure_available().is_ok());
    }
}
