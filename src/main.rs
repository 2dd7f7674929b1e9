use anyhow::{Context, Result};
use clap::Parser;

mod cli;
mod logging;

use cli::{execute_command, Cli};
use logging::{init_logging, LogConfig};

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Logging is configured once, before any handler exists
    init_logging(&LogConfig::from_debug(cli.debug))?;

    // Build the handler for the selected target and run its search
    execute_command(cli.command).with_context(|| "command execution failed")
}
