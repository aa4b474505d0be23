//! Error types for rendering songs
use std::fmt;

use thiserror::Error;

/// Kind of entity a reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Song,
    SetList,
    Scene,
    Preset,
    Animation,
    Transition,
    Device,
    DeviceType,
    DeviceGroup,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Song => "song",
            EntityKind::SetList => "set list",
            EntityKind::Scene => "DMX scene",
            EntityKind::Preset => "DMX preset",
            EntityKind::Animation => "DMX animation",
            EntityKind::Transition => "DMX transition",
            EntityKind::Device => "DMX device",
            EntityKind::DeviceType => "DMX device type",
            EntityKind::DeviceGroup => "DMX device group",
        };
        f.write_str(name)
    }
}

/// Rendering errors. Rendering is all-or-nothing, any of these aborts the song.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The bar change map has no entry at frame 0
    #[error("song must have a bar change at frame 0")]
    MissingInitialBarChange,

    /// A bar change with a zero note value, note count or speed
    #[error("invalid bar change at frame {at}: {reason}")]
    InvalidBarChange { at: u64, reason: &'static str },

    /// A referenced entity does not exist in the store
    #[error("{kind} {id:?} not found ({context})")]
    ReferenceNotFound {
        kind: EntityKind,
        id: String,
        context: String,
    },

    /// A device params entry selects neither or both of device and group
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    /// A scene whose metre yields a zero length
    #[error("invalid scene {id:?}: {reason}")]
    InvalidScene { id: String, reason: &'static str },

    /// An animation without a length
    #[error("invalid animation {id:?}: {reason}")]
    InvalidAnimation { id: String, reason: &'static str },

    /// A transition naming an ease function that does not exist
    #[error("unknown ease function {0:?}")]
    UnknownEaseFunction(String),

    /// Placements, MIDI commands or bar changes reach past the frame bound
    #[error("song timeline exceeds {limit} frames")]
    TimelineTooLong { limit: u64 },

    /// A device param resolves to an address outside a DMX universe
    #[error("channel {channel} of device {device:?} is outside the universe (0-511)")]
    ChannelOutOfRange { device: String, channel: u32 },
}

impl RenderError {
    pub(crate) fn not_found(kind: EntityKind, id: &str, context: impl Into<String>) -> Self {
        RenderError::ReferenceNotFound {
            kind,
            id: id.to_string(),
            context: context.into(),
        }
    }
}

/// Result type for rendering operations
pub type Result<T> = std::result::Result<T, RenderError>;
