//! siteship deploy - Publish a folder as a static web app
//!
//! First deploy of a folder needs `--name` and `--description`; the
//! resulting `.deploy.json` manifest pins later runs to the same site.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::app::AppContext;
use crate::auth::AuthClient;
use crate::deploy::{collect_files, deploy_folder};
use crate::error::{Result, ShipError};

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Folder to deploy (must contain index.html at its root)
    pub folder: PathBuf,

    /// Display name for the app (required on first deploy)
    #[arg(long)]
    pub name: Option<String>,

    /// Short description of the app (required on first deploy)
    #[arg(long)]
    pub description: Option<String>,
}

pub fn run(ctx: &AppContext, args: &DeployArgs) -> Result<()> {
    ctx.config.validate()?;

    let folder = args.folder.as_path();
    if !folder.is_dir() {
        return Err(ShipError::Filter(format!(
            "deploy folder not found: {}",
            folder.display()
        )));
    }
    check_root_index(folder)?;

    let auth = AuthClient::new()?;
    let tokens = auth.ensure_tokens(&ctx.config)?;

    let spinner = spinner(ctx, &format!("Deploying {}", folder.display()));
    let result = deploy_folder(
        &ctx.config,
        &tokens.access_token,
        &tokens.storage_access_token,
        folder,
        args.name.as_deref(),
        args.description.as_deref(),
    );
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let outcome = result?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }
    if ctx.quiet {
        return Ok(());
    }

    let verb = if outcome.created { "Created" } else { "Updated" };
    println!();
    println!("  {} {} {}", "✓".green(), verb, outcome.slug.bold());
    println!();
    println!("  {:10} {}", "URL".dimmed(), outcome.url.cyan());
    println!(
        "  {:10} {} files, {} compressed",
        "Uploaded".dimmed(),
        outcome.file_count,
        format_size(outcome.archive_bytes as u64)
    );
    println!();
    Ok(())
}

/// Refuse to deploy a folder whose root has no index.html; the published
/// site would only ever serve 404s. The hint names a nested index.html
/// when one exists, since deploying the wrong level is the usual cause.
fn check_root_index(folder: &Path) -> Result<()> {
    if folder.join("index.html").is_file() {
        return Ok(());
    }

    let files = collect_files(folder)?;
    let mut hint = String::from(
        "no index.html found in the root of the deploy folder. \
         The app will not load without a root index.html.\n\n",
    );
    let nested = files
        .iter()
        .find(|f| f.ends_with("/index.html"))
        .and_then(|f| f.rsplit_once('/').map(|(parent, _)| (f.as_str(), parent)));
    if let Some((nested, parent)) = nested {
        hint.push_str(&format!(
            "Found index.html under \"{nested}\". You may want to deploy the \"{}\" \
             subdirectory instead, or move index.html to the root of \"{}\".",
            folder.join(parent).display(),
            folder.display()
        ));
    } else {
        let listing = if files.is_empty() {
            "(none)".to_string()
        } else {
            files.join(", ")
        };
        hint.push_str(&format!(
            "Files found: {listing}.\n\nIf this is a build-based project, run the \
             build step first (e.g. npm run build) and deploy the output \
             directory (e.g. dist/ or build/)."
        ));
    }
    Err(ShipError::Filter(hint))
}

fn spinner(ctx: &AppContext, msg: &str) -> Option<ProgressBar> {
    if ctx.json || ctx.quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
