//! StageCtl Control - Real-time Show Playback
//!
//! This crate drives the outputs of a rendered show:
//! - **Player**: frame-accurate playback of songs and set lists
//! - **Art-Net**: lighting state controller with coalesced universe sends
//! - **Transports**: buffer, visualizer, Art-Net and MIDI writers
//! - **Waiters**: start gates that hold a song until the band is ready
//!
//! ## Feature Flags
//!
//! - `midi`: Enable the MIDI transport (requires `midir`)
//! - `audio`: Enable the audio level waiter (requires `cpal`)
//! - `full`: Enable all features
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use stagectl_control::{BufferWriter, NoneWaiter, Player, ShutdownSignal};
//! use stagectl_core::DataStore;
//!
//! # async fn run(store: DataStore) -> Result<(), Box<dyn std::error::Error>> {
//! let player = Player::new(
//!     Arc::new(store),
//!     vec![Box::new(BufferWriter::new(std::io::stdout()))],
//!     vec![Box::new(NoneWaiter)],
//!     ShutdownSignal::new(),
//! );
//! let report = player.play_song("opener").await?;
//! println!("played {} frames", report.frames);
//! # Ok(())
//! # }
//! ```

#![allow(missing_docs)]

/// Art-Net lighting control
pub mod artnet;
/// Error types
pub mod error;
/// MIDI message encoding and output
pub mod midi;
/// Song and set list playback
pub mod playback;
/// Shutdown propagation
pub mod shutdown;
/// Transport writers
pub mod transport;
/// Start gates
pub mod waiter;

// Re-exports
pub use artnet::{ArtNetConfig, ArtNetController, DmxSender, LightingController};
pub use error::{ControlError, PlaybackError, Result, TransportError};
pub use playback::{FrameClock, PlaybackReport, Player, WriterFault};
pub use shutdown::ShutdownSignal;
pub use transport::{
    ArtNetWriter, BufferWriter, TransportKind, TransportWriter, VisualizerWriter,
    DEFAULT_VISUALIZER_ENDPOINT,
};
pub use waiter::{AudioWaiterConfig, NoneWaiter, Waiter, WaiterKind};

pub use midi::MidiMessage;

#[cfg(feature = "midi")]
pub use transport::MidiWriter;

#[cfg(feature = "audio")]
pub use waiter::AudioLevelWaiter;
