use midir::{MidiOutput, MidiOutputConnection};

use crate::error::{ControlError, Result};

const CLIENT_NAME: &str = "stagectl";

/// Names of the available MIDI output ports
pub fn list_output_ports() -> Result<Vec<String>> {
    let output = MidiOutput::new(CLIENT_NAME)?;
    Ok(output
        .ports()
        .iter()
        .filter_map(|port| output.port_name(port).ok())
        .collect())
}

/// Open connection to a MIDI output port
pub struct MidiSink {
    connection: MidiOutputConnection,
    name: String,
}

impl MidiSink {
    /// Connect to a port by id or name. An empty id picks the first port.
    pub fn connect(device_id: &str) -> Result<Self> {
        let output = MidiOutput::new(CLIENT_NAME)?;
        let ports = output.ports();

        let port = if device_id.is_empty() {
            ports.first()
        } else {
            ports.iter().find(|port| {
                port.id() == device_id
                    || output
                        .port_name(port)
                        .map(|name| name == device_id)
                        .unwrap_or(false)
            })
        }
        .ok_or_else(|| {
            ControlError::TargetNotFound(if device_id.is_empty() {
                "no MIDI output port available".to_string()
            } else {
                format!("MIDI output port {:?}", device_id)
            })
        })?
        .clone();

        let name = output
            .port_name(&port)
            .unwrap_or_else(|_| "unknown".to_string());
        let connection = output
            .connect(&port, "stagectl-out")
            .map_err(|e| ControlError::MidiError(format!("failed to connect to {:?}: {}", name, e)))?;

        tracing::info!("Connected to MIDI output {:?}", name);
        Ok(Self { connection, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.connection.send(bytes)?;
        Ok(())
    }

    pub fn close(self) {
        self.connection.close();
        tracing::info!("Closed MIDI output {:?}", self.name);
    }
}
