use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Log filter variable (tracing `EnvFilter` syntax).
pub const LOG_ENV: &str = "SPROUT_LOG";

/// Route tracing output to `<dir>/sprout.log`. The TUI owns the terminal,
/// so nothing is written to stdout or stderr.
pub fn init(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join("sprout.log");
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("logging already initialised: {}", e))?;

    Ok(path)
}
