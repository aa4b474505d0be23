//! Application configuration
//!
//! Loaded from a TOML file when `--config` is given, defaults otherwise.
//! Command line flags are applied on top.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stagectl_control::{
    ArtNetConfig, AudioWaiterConfig, ControlError, TransportKind, WaiterKind,
    DEFAULT_VISUALIZER_ENDPOINT,
};
use stagectl_core::LogConfig;

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the show documents
    pub data_dir: PathBuf,
    pub log: LogConfig,
    pub artnet: ArtNetConfig,
    pub playback: PlaybackConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            log: LogConfig::default(),
            artnet: ArtNetConfig::default(),
            playback: PlaybackConfig::default(),
        }
    }
}

/// Output and start-gate selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Transport names: buffer, visualizer, artnet, midi
    pub transports: Vec<String>,
    /// Waiter names: none, audio
    pub waiters: Vec<String>,
    pub visualizer_endpoint: String,
    /// MIDI output port id or name, empty picks the first port
    pub midi_device_id: String,
    pub audio: AudioWaiterConfig,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            transports: vec![TransportKind::Buffer.to_string()],
            waiters: vec![WaiterKind::None.to_string()],
            visualizer_endpoint: DEFAULT_VISUALIZER_ENDPOINT.to_string(),
            midi_device_id: String::new(),
            audio: AudioWaiterConfig::default(),
        }
    }
}

impl PlaybackConfig {
    /// Parse the configured transports, rejecting unknown and disabled ones.
    /// Duplicates are removed, order is kept.
    pub fn transport_kinds(&self) -> Result<Vec<TransportKind>, ControlError> {
        parse_kinds(&self.transports, |name| {
            name.parse::<TransportKind>()?.ensure_available()
        })
    }

    /// Parse the configured waiters, rejecting unknown and disabled ones
    pub fn waiter_kinds(&self) -> Result<Vec<WaiterKind>, ControlError> {
        parse_kinds(&self.waiters, |name| {
            name.parse::<WaiterKind>()?.ensure_available()
        })
    }
}

fn parse_kinds<K: PartialEq>(
    names: &[String],
    parse: impl Fn(&str) -> Result<K, ControlError>,
) -> Result<Vec<K>, ControlError> {
    let mut kinds = Vec::new();
    for name in names {
        let kind = parse(name)?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

impl AppConfig {
    /// Load the config file, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Invalid config file {:?}", path))
    }
}
