//! Rendered timeline units
//!
//! A [`Command`] is produced for every frame of a song. Transports consume
//! them one at a time during playback.

use serde::{Deserialize, Serialize};

use crate::song::{BarChange, MidiCommand};

/// Number of channels in a single DMX universe
pub const DMX_CHANNELS: usize = 512;

/// Network universe a device lives in
pub type DmxUniverse = u16;

/// Channel address inside a universe (0-511)
pub type DmxChannel = u16;

/// Value of a single channel (0-255)
pub type DmxValue = u8;

/// Position of a frame inside the musical structure of a song
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameState {
    /// Absolute frame index
    pub frame: u64,
    /// Bar index, counted from the start of the song
    pub bar: u16,
    /// Note index within the current bar
    pub note: u8,
}

/// Sets one channel of one universe to a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DmxCommand {
    pub universe: DmxUniverse,
    pub channel: DmxChannel,
    pub value: DmxValue,
}

impl DmxCommand {
    pub fn new(universe: DmxUniverse, channel: DmxChannel, value: DmxValue) -> Self {
        Self {
            universe,
            channel,
            value,
        }
    }
}

/// Everything that has to happen on a single frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    #[serde(flatten)]
    pub state: FrameState,
    pub dmx_commands: Vec<DmxCommand>,
    pub midi_commands: Vec<MidiCommand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_change: Option<BarChange>,
}

impl Command {
    /// Create an empty command for the given frame position
    pub fn new(state: FrameState) -> Self {
        Self {
            state,
            dmx_commands: Vec::new(),
            midi_commands: Vec::new(),
            bar_change: None,
        }
    }

    /// Returns true when the frame carries nothing for any transport
    pub fn is_empty(&self) -> bool {
        self.dmx_commands.is_empty() && self.midi_commands.is_empty() && self.bar_change.is_none()
    }
}
