use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Environment variable that overrides the configured log filter.
pub const LOG_ENV: &str = "SHOPLIST_LOG";

/// Route tracing output to the log file. The terminal belongs to the UI, so
/// nothing is ever written to stdout or stderr from here.
pub fn init(config: &LogConfig) -> Result<()> {
    if let Some(parent) = config.file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log dir: {}", parent.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file)
        .with_context(|| format!("failed to open log file {}", config.file.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("invalid log level `{}`", config.level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {}", err))?;

    tracing::debug!(path = %config.file.display(), "logging initialised");
    Ok(())
}
