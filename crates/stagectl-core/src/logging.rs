//! Logging configuration
//!
//! [`LogConfig`] describes where logs go and how long log files are kept. The
//! binary turns it into a `tracing-subscriber` registry.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// File name prefix of log files
const LOG_FILE_PREFIX: &str = "stagectl";

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level name: trace, debug, info, warn, error or off
    pub level: String,
    /// Log to stderr
    pub console_output: bool,
    /// Log to a file in `log_dir`
    pub file_output: bool,
    /// Directory for log files
    pub log_dir: PathBuf,
    /// Number of log files to keep, 0 keeps all
    pub max_log_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_dir: PathBuf::from("logs"),
            max_log_files: 10,
        }
    }
}

impl LogConfig {
    /// Parse the configured level, falling back to INFO
    pub fn parse_level(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::INFO)
    }

    /// Create the log directory when file output is enabled
    pub fn ensure_log_directory(&self) -> io::Result<()> {
        if self.file_output {
            fs::create_dir_all(&self.log_dir)?;
        }
        Ok(())
    }

    /// Path of the log file for the current run
    pub fn current_log_path(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
        self.log_dir
            .join(format!("{}_{}.log", LOG_FILE_PREFIX, stamp))
    }

    /// Delete the oldest log files so at most `max_log_files - 1` remain,
    /// leaving room for the file of this run. Returns the number removed.
    pub fn cleanup_old_logs(&self) -> io::Result<usize> {
        if self.max_log_files == 0 || !self.log_dir.is_dir() {
            return Ok(0);
        }

        let mut logs: Vec<PathBuf> = fs::read_dir(&self.log_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX) && n.ends_with(".log"))
            })
            .collect();

        // timestamps sort lexically
        logs.sort();

        let keep = self.max_log_files - 1;
        let excess = logs.len().saturating_sub(keep);
        for path in &logs[..excess] {
            fs::remove_file(path)?;
        }
        Ok(excess)
    }
}
