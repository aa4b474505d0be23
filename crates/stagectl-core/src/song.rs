//! Songs, set lists and the musical structure they carry

use serde::{Deserialize, Serialize};

use crate::dmx::DmxDeviceParams;

/// Selects a song by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSelector {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// An ordered list of songs played one after another
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetList {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub songs: Vec<SongSelector>,
}

/// Change of metre and tempo, effective from frame `at` onwards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarChange {
    pub at: u64,
    /// Note subdivision, e.g. 4 for quarter notes
    pub note_value: u8,
    /// Notes per bar
    pub note_count: u8,
    /// Tempo in notes per minute
    pub speed: u16,
}

/// Places a DMX scene inside a song
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenePosition {
    /// Id of the referenced scene
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub at: u64,
    /// How often the scene is played back to back. Zero plays it once.
    #[serde(default)]
    pub repeat: u8,
}

/// Raw MIDI message fired at a given frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MidiCommand {
    pub at: u64,
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

/// Everything that is controlled during a single song
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bar_changes: Vec<BarChange>,
    #[serde(default)]
    pub dmx_scenes: Vec<ScenePosition>,
    #[serde(default)]
    pub midi_commands: Vec<MidiCommand>,
    /// Applied from the first frame on, below everything the scenes set
    #[serde(default)]
    pub dmx_device_params: Vec<DmxDeviceParams>,
}
