//! StageCtl Core - Show Model and Command Rendering
//!
//! This crate contains the show model and the renderer that compiles it:
//! - Songs, set lists and their bar/tempo structure
//! - DMX devices, groups, scenes, presets, animations and transitions
//! - In-memory entity store
//! - Frame grid timing and ease functions
//! - Song rendering into per-frame commands

pub mod command;
pub mod dmx;
pub mod ease;
pub mod error;
pub mod logging;
pub mod render;
pub mod song;
pub mod store;
pub mod timing;

// --- Re-exports grouped by category ---

// Show model
pub use dmx::{
    DmxAnimation, DmxAnimationFrame, DmxDevice, DmxDeviceGroup, DmxDeviceGroupSelector,
    DmxDeviceParams, DmxDeviceSelector, DmxDeviceType, DmxParams, DmxPreset, DmxScene,
    DmxSubScene, DmxTransition, DmxTransitionParams, Led, ParamKind, Selector,
};
pub use song::{BarChange, MidiCommand, ScenePosition, SetList, Song, SongSelector};
pub use store::DataStore;

// Rendering
pub use command::{
    Command, DmxChannel, DmxCommand, DmxUniverse, DmxValue, FrameState, DMX_CHANNELS,
};
pub use ease::EaseFunction;
pub use error::{EntityKind, RenderError, Result};
pub use render::{scene_length, Layer, SongRenderer};
pub use timing::{
    bar_length, frame_duration, frame_states, note_length, song_length, streamline_bar_changes,
    validate_bar_changes, BarChangeMap, MAX_SONG_FRAMES, RENDER_FRAMES,
};

// Logging
pub use logging::LogConfig;
