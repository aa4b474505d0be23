use std::sync::Arc;

use stagectl_core::Command;

use super::TransportWriter;
use crate::artnet::LightingController;
use crate::error::TransportError;

/// Feeds DMX commands into a lighting controller
pub struct ArtNetWriter {
    controller: Arc<dyn LightingController>,
}

impl ArtNetWriter {
    /// Wrap a started controller. Closing the writer stops it.
    pub fn new(controller: Arc<dyn LightingController>) -> Self {
        Self { controller }
    }
}

impl TransportWriter for ArtNetWriter {
    fn name(&self) -> &str {
        "artnet"
    }

    fn write(&mut self, command: &Command) -> Result<(), TransportError> {
        if command.dmx_commands.is_empty() {
            return Ok(());
        }
        if !self.controller.is_running() {
            return Err(TransportError::Controller(
                "lighting controller is not running".to_string(),
            ));
        }
        self.controller.set_channels(&command.dmx_commands);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.controller.stop();
        Ok(())
    }
}
