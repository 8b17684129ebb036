use crate::constants::{APP_DIR, LOG_ENV, LOG_FILE};
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub enum Target {
    /// The TUI owns the terminal, so logs go to a file.
    File,
    Stderr,
}

pub fn log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(APP_DIR).join(LOG_FILE))
}

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Returns the log file path when logging to a file.
pub fn init(target: &Target, level: &str) -> Result<Option<PathBuf>> {
    match target {
        Target::Stderr => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter(level))
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init();
            Ok(None)
        }
        Target::File => {
            let Some(path) = log_path() else {
                return Ok(None);
            };
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;

            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter(level))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init();
            Ok(Some(path))
        }
    }
}
