use anyhow::{Context, Result};
use std::io;
use tracing::Level;

// Logging threshold selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    level: Level,
}

impl LogConfig {
    pub fn from_debug(debug: bool) -> Self {
        let level = if debug { Level::DEBUG } else { Level::INFO };
        Self { level }
    }

    // Message-only output on stdout, filtered at the configured level
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        tracing_subscriber::fmt()
            .with_writer(io::stdout)
            .with_max_level(self.level)
            .without_time()
            .with_level(false)
            .with_target(false)
            .finish()
    }
}

// Install the subscriber for the rest of the process
pub fn init_logging(config: &LogConfig) -> Result<()> {
    tracing::subscriber::set_global_default(config.subscriber())
        .context("failed to install log subscriber")
}
