//! Installs the global `tracing` subscriber described by a [`LogConfig`]

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use stagectl_core::LogConfig;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, registry::Registry, util::SubscriberInitExt,
    Layer,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the log file writer alive. Buffered lines are flushed on drop.
pub struct LogGuard {
    _worker: WorkerGuard,
    pub path: PathBuf,
}

/// Log file of the current run
struct LogFile {
    writer: NonBlocking,
    worker: WorkerGuard,
    path: PathBuf,
}

fn open_log_file(config: &LogConfig) -> Result<Option<LogFile>> {
    if !config.file_output {
        return Ok(None);
    }

    config
        .ensure_log_directory()
        .with_context(|| format!("Failed to create log directory {:?}", config.log_dir))?;
    // the subscriber is not installed yet
    if let Err(e) = config.cleanup_old_logs() {
        eprintln!("Warning: Failed to clean up old log files: {}", e);
    }

    let path = config.current_log_path();
    let file =
        File::create(&path).with_context(|| format!("Failed to create log file {:?}", path))?;
    let (writer, worker) = tracing_appender::non_blocking(file);

    Ok(Some(LogFile {
        writer,
        worker,
        path,
    }))
}

/// Output layers for the enabled sinks
fn output_layers(config: &LogConfig, file: Option<NonBlocking>) -> Vec<BoxedLayer> {
    let mut layers = Vec::with_capacity(2);

    if config.console_output {
        // stdout carries command output
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact()
                .boxed(),
        );
    }

    if let Some(writer) = file {
        // transports write from the blocking pool
        layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true)
                .boxed(),
        );
    }

    layers
}

/// Install the subscriber. The returned guard must outlive all logging.
pub fn init(config: &LogConfig) -> Result<Option<LogGuard>> {
    let (writer, guard) = match open_log_file(config)? {
        Some(file) => (
            Some(file.writer),
            Some(LogGuard {
                _worker: file.worker,
                path: file.path,
            }),
        ),
        None => (None, None),
    };

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::builder()
        .with_default_directive(config.parse_level().into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(output_layers(config, writer))
        .with(filter)
        .try_init()
        .context("Failed to install the log subscriber")?;

    tracing::info!("Logging initialized at level: {}", config.level);
    if let Some(guard) = &guard {
        tracing::info!("Log file path: {:?}", guard.path);
    }

    Ok(guard)
}
