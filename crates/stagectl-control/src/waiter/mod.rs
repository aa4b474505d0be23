//! Waiters gate the start of a song
//!
//! The player blocks on every configured waiter before frame 0 so playback
//! begins with the live band, not as soon as the previous song ends.

#[cfg(feature = "audio")]
mod audio;

#[cfg(feature = "audio")]
pub use audio::AudioLevelWaiter;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, Result};

/// Blocking start gate
pub trait Waiter: Send {
    fn name(&self) -> &str;

    /// Block until playback may start
    fn wait(&mut self) -> Result<()>;
}

/// Starts playback immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct NoneWaiter;

impl Waiter for NoneWaiter {
    fn name(&self) -> &str {
        "none"
    }

    fn wait(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Audio waiter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioWaiterConfig {
    /// Peak level in 0.0..=1.0 that starts playback
    pub threshold: f32,
    /// How often shutdown is checked while waiting
    pub poll_interval_ms: u64,
}

impl Default for AudioWaiterConfig {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            poll_interval_ms: 100,
        }
    }
}

/// Selectable waiters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaiterKind {
    None,
    Audio,
}

impl WaiterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WaiterKind::None => "none",
            WaiterKind::Audio => "audio",
        }
    }

    /// Fail for waiters that were not compiled in
    pub fn ensure_available(self) -> Result<Self> {
        match self {
            WaiterKind::Audio if !cfg!(feature = "audio") => Err(ControlError::FeatureDisabled {
                kind: "waiter",
                name: self.as_str().to_string(),
                feature: "audio",
            }),
            _ => Ok(self),
        }
    }
}

impl fmt::Display for WaiterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaiterKind {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(WaiterKind::None),
            "audio" => Ok(WaiterKind::Audio),
            _ => Err(ControlError::UnknownKind {
                kind: "waiter",
                name: s.to_string(),
                expected: "none, audio",
            }),
        }
    }
}
