use std::io::{BufWriter, Write};
use std::net::TcpStream;

use stagectl_core::Command;

use super::TransportWriter;
use crate::error::{ControlError, TransportError};

/// Default endpoint of the visualizer backend
pub const DEFAULT_VISUALIZER_ENDPOINT: &str = "localhost:1337";

/// Streams every frame as newline-delimited JSON over TCP
pub struct VisualizerWriter {
    endpoint: String,
    stream: BufWriter<TcpStream>,
}

impl VisualizerWriter {
    /// Connect to the visualizer. Failing to connect is fatal for startup.
    pub fn connect(endpoint: &str) -> Result<Self, ControlError> {
        let stream = TcpStream::connect(endpoint)?;
        stream.set_nodelay(true)?;
        tracing::info!("Connected to visualizer at {}", endpoint);
        Ok(Self {
            endpoint: endpoint.to_string(),
            stream: BufWriter::new(stream),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TransportWriter for VisualizerWriter {
    fn name(&self) -> &str {
        "visualizer"
    }

    fn write(&mut self, command: &Command) -> Result<(), TransportError> {
        serde_json::to_writer(&mut self.stream, command)?;
        self.stream.write_all(b"\n")?;
        self.stream.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.stream.flush()?;
        self.stream
            .get_ref()
            .shutdown(std::net::Shutdown::Both)
            .or_else(|e| match e.kind() {
                std::io::ErrorKind::NotConnected => Ok(()),
                _ => Err(e),
            })?;
        tracing::info!("Disconnected from visualizer at {}", self.endpoint);
        Ok(())
    }
}
