use std::io::Write;

use stagectl_core::Command;

use super::TransportWriter;
use crate::error::TransportError;

/// Writes every non-empty frame as one JSON line, e.g. to stdout.
///
/// Output problems are logged and never fail playback.
pub struct BufferWriter<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> BufferWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, command: &Command) -> Result<(), TransportError> {
        serde_json::to_writer(&mut self.out, command)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write + Send> TransportWriter for BufferWriter<W> {
    fn name(&self) -> &str {
        "buffer"
    }

    fn write(&mut self, command: &Command) -> Result<(), TransportError> {
        if command.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.write_line(command) {
            tracing::warn!("Buffer transport failed on frame {}: {}", command.state.frame, e);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if let Err(e) = self.out.flush() {
            tracing::warn!("Buffer transport failed to flush: {}", e);
        }
        Ok(())
    }
}
