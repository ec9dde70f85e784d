//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;

/// siteship - publish static sites to Azure Static Web Apps
#[derive(Parser, Debug)]
#[command(name = "siteship")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ~/.config/siteship/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in to Azure and manage cached tokens
    Auth(commands::auth::AuthArgs),

    /// Deploy a folder as a static web app
    Deploy(commands::deploy::DeployArgs),

    /// List published apps
    List(commands::list::ListArgs),

    /// Show details for one app
    Info(commands::info::InfoArgs),

    /// Delete a published app
    Delete(commands::delete::DeleteArgs),

    /// Update an app's display name or description
    Update(commands::update::UpdateArgs),
}
