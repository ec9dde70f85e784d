//! Command handlers for the CLI.
//!
//! Each submodule owns one top-level command and exposes a
//! `run(ctx, args)` entry point. Handlers print human output by
//! default and JSON when the global `--json` flag is set.

pub mod auth;
pub mod delete;
pub mod deploy;
pub mod info;
pub mod list;
pub mod update;

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;

/// Dispatch a parsed command to its handler.
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Auth(args) => auth::run(ctx, args),
        Commands::Deploy(args) => deploy::run(ctx, args),
        Commands::List(args) => list::run(ctx, args),
        Commands::Info(args) => info::run(ctx, args),
        Commands::Delete(args) => delete::run(ctx, args),
        Commands::Update(args) => update::run(ctx, args),
    }
}
