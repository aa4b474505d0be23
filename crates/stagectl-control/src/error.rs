//! Error types for the control system
use std::io;

use stagectl_core::{EntityKind, RenderError};
use thiserror::Error;

/// Control system errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// Generic MIDI error
    #[error("MIDI error: {0}")]
    MidiError(String),

    /// MIDI initialization error
    #[error("MIDI init error: {0}")]
    #[cfg(feature = "midi")]
    MidiInitError(#[from] midir::InitError),

    /// MIDI transmission error
    #[error("MIDI send error: {0}")]
    #[cfg(feature = "midi")]
    MidiSendError(#[from] midir::SendError),

    /// DMX / Art-Net error
    #[error("DMX error: {0}")]
    DmxError(String),

    /// No IPv4 interface suitable for Art-Net
    #[error("No network interface found for Art-Net")]
    NoInterfaceFound,

    /// Audio input error
    #[error("Audio error: {0}")]
    AudioError(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Output device not found
    #[error("Target not found: {0}")]
    TargetNotFound(String),

    /// A transport or waiter name that does not exist
    #[error("Unknown {kind} {name:?}, expected one of {expected}")]
    UnknownKind {
        kind: &'static str,
        name: String,
        expected: &'static str,
    },

    /// A transport or waiter that was not compiled in
    #[error("{kind} {name:?} requires the {feature:?} feature")]
    FeatureDisabled {
        kind: &'static str,
        name: String,
        feature: &'static str,
    },

    /// A blocking operation was cancelled by shutdown
    #[error("Interrupted by shutdown")]
    Interrupted,
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors of a single transport write
#[derive(Error, Debug)]
pub enum TransportError {
    /// The peer is gone, the writer can not recover
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// Serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MIDI output error
    #[error("MIDI error: {0}")]
    Midi(String),

    /// Lighting controller rejected the update
    #[error("lighting controller error: {0}")]
    Controller(String),
}

impl TransportError {
    /// Fatal errors remove the writer from the running playback
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::ConnectionClosed(_))
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof => TransportError::ConnectionClosed(err.to_string()),
            _ => TransportError::Io(err),
        }
    }
}

/// Playback errors
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Requested song or set list (or a song of the set list) is missing
    #[error("{kind} {id:?} not found")]
    NotFound { kind: EntityKind, id: String },

    /// Rendering a song failed
    #[error("failed to render song {song:?}: {source}")]
    Render {
        song: String,
        #[source]
        source: RenderError,
    },

    /// A waiter failed before playback started
    #[error("waiter {name:?} failed: {source}")]
    Waiter {
        name: String,
        #[source]
        source: ControlError,
    },

    /// Every writer has failed fatally
    #[error("no active transport writers left")]
    NoActiveWriters,

    /// Shutdown was requested during playback
    #[error("playback interrupted")]
    Interrupted,
}
