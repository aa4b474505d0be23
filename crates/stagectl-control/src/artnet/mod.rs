//! Art-Net lighting control
//!
//! The [`ArtNetController`] keeps the last value of every DMX channel per
//! universe. Channel updates only touch that table and arm a send signal; a
//! background task flushes all universes whenever the signal fires, so any
//! number of updates between two flushes collapse into one send.

mod controller;
pub mod network;
pub mod packet;
pub mod state;

pub use controller::ArtNetController;
pub use network::{broadcast_for, find_artnet_ip, UdpArtNetSender};
pub use packet::{ArtNetNode, PortAddress, ARTNET_PORT};
pub use state::{DmxState, UniverseData};

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use stagectl_core::{DmxCommand, DMX_CHANNELS};

use crate::error::Result;

/// Art-Net settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtNetConfig {
    /// Interface address, discovered when unset
    pub bind_address: Option<Ipv4Addr>,
    /// Broadcast address, derived from the interface when unset
    pub broadcast_address: Option<Ipv4Addr>,
    /// Poll for nodes periodically
    pub discovery: bool,
    /// Seconds between polls
    pub poll_interval_secs: u64,
    /// Milliseconds to collect poll replies
    pub reply_window_ms: u64,
    /// Seconds between node diagnostics
    pub diagnostics_interval_secs: u64,
}

impl Default for ArtNetConfig {
    fn default() -> Self {
        Self {
            bind_address: None,
            broadcast_address: None,
            discovery: true,
            poll_interval_secs: 10,
            reply_window_ms: 500,
            diagnostics_interval_secs: 30,
        }
    }
}

/// Blocking packet output used by the controller.
///
/// Calls happen on the blocking thread pool, concurrently for different
/// universes.
pub trait DmxSender: Send + Sync + 'static {
    /// Send a full universe to a port address
    fn send_dmx(&self, port: PortAddress, data: &[u8; DMX_CHANNELS]) -> Result<()>;

    /// Poll for nodes and register the ones that reply. Returns the number of
    /// nodes seen for the first time.
    fn discover(&self) -> Result<usize> {
        Ok(0)
    }

    /// Nodes registered so far
    fn nodes(&self) -> Vec<ArtNetNode> {
        Vec::new()
    }

    /// Release the network resources. Later sends fail.
    fn close(&self) {}
}

/// Lighting state controller
pub trait LightingController: Send + Sync {
    /// Start the background tasks. Must be called inside a Tokio runtime.
    fn start(&self) -> Result<()>;

    /// Stop the background tasks and close the sender. An update that was
    /// already signalled is still flushed once, later updates are not sent.
    fn stop(&self);

    /// True between a successful `start` and `stop`
    fn is_running(&self) -> bool;

    /// Set a single channel
    fn set_channel(&self, value: DmxCommand);

    /// Set many channels, triggering one send
    fn set_channels(&self, values: &[DmxCommand]);
}
