//! Shared command context.

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;

/// Everything a command handler needs beyond its own arguments.
pub struct AppContext {
    pub config: Config,
    /// Machine-readable JSON on stdout.
    pub json: bool,
    pub quiet: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        Ok(Self {
            config,
            json: cli.json,
            quiet: cli.quiet,
        })
    }
}
