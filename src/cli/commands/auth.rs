//! siteship auth - Sign in to Azure and manage cached tokens
//!
//! - `siteship auth login`  - Device-code sign-in for ARM and storage scopes
//! - `siteship auth status` - Show cached token state
//! - `siteship auth logout` - Clear cached tokens

use clap::{Args, Subcommand};
use colored::Colorize;

use crate::app::AppContext;
use crate::auth::{AuthClient, DeviceCodeResponse};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Sign in with a device code
    Login,
    /// Show sign-in status
    Status,
    /// Clear cached tokens (does not revoke them)
    Logout,
}

pub fn run(ctx: &AppContext, args: &AuthArgs) -> Result<()> {
    match &args.command {
        AuthCommand::Login => login(ctx),
        AuthCommand::Status => status(ctx),
        AuthCommand::Logout => logout(ctx),
    }
}

fn login(ctx: &AppContext) -> Result<()> {
    ctx.config.validate_auth()?;
    let client = AuthClient::new()?;

    let current = client.status();
    if current.authenticated {
        let user = current.user.unwrap_or_default();
        if ctx.json {
            println!(
                "{}",
                serde_json::json!({
                    "status": "already_signed_in",
                    "user": user,
                })
            );
            return Ok(());
        }
        println!(
            "Already signed in as {}. Use 'siteship auth logout' first to switch accounts.",
            user.bold()
        );
        return Ok(());
    }

    let json = ctx.json;
    let quiet = ctx.quiet;
    let tokens = client.login(&ctx.config, |device: &DeviceCodeResponse| {
        if json {
            // One line per event so wrappers can relay the code while we poll.
            println!(
                "{}",
                serde_json::json!({
                    "status": "awaiting_verification",
                    "user_code": device.user_code,
                    "verification_uri": device.verification_uri,
                    "expires_in": device.expires_in,
                    "interval": device.interval,
                })
            );
        } else if !quiet {
            print_device_code_box(device);
        }
    })?;

    let user = crate::auth::extract_upn(&tokens.access_token).unwrap_or_default();
    if ctx.json {
        println!(
            "{}",
            serde_json::json!({
                "status": "signed_in",
                "user": user,
            })
        );
        return Ok(());
    }

    println!();
    println!("  {} Signed in as {}", "✓".green(), user.bold());
    println!();
    Ok(())
}

fn print_device_code_box(device: &DeviceCodeResponse) {
    let uri_pad = " ".repeat(47_usize.saturating_sub(device.verification_uri.len()));
    let code_pad = " ".repeat(47_usize.saturating_sub(device.user_code.len()));

    println!();
    println!("  ╭──────────────────────────────────────────────────╮");
    println!("  │                                                  │");
    println!("  │   To sign in, open:                              │");
    println!("  │                                                  │");
    println!("  │   {}{}│", device.verification_uri.bold(), uri_pad);
    println!("  │                                                  │");
    println!("  │   and enter the code:                            │");
    println!("  │                                                  │");
    println!("  │   {}{}│", device.user_code.bold(), code_pad);
    println!("  │                                                  │");
    println!("  ╰──────────────────────────────────────────────────╯");
    println!();
    println!("  Waiting for sign-in...");
    println!();
}

fn status(ctx: &AppContext) -> Result<()> {
    let client = AuthClient::new()?;
    let status = client.status();

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    if !status.authenticated {
        println!("{}", "Not signed in".dimmed());
        println!();
        println!("Sign in with: siteship auth login");
        return Ok(());
    }

    println!(
        "Signed in as {}",
        status.user.as_deref().unwrap_or("(unknown)").bold()
    );
    if let Some(seconds) = status.expires_in {
        println!("  management token expires in {}", format_expiry(seconds));
    }
    if let Some(seconds) = status.storage_expires_in {
        println!("  storage token expires in    {}", format_expiry(seconds));
    }
    Ok(())
}

fn logout(ctx: &AppContext) -> Result<()> {
    let client = AuthClient::new()?;

    if !client.status().authenticated {
        if ctx.json {
            println!("{}", serde_json::json!({ "status": "not_signed_in" }));
            return Ok(());
        }
        println!("Not signed in.");
        return Ok(());
    }

    client.logout()?;

    if ctx.json {
        println!("{}", serde_json::json!({ "status": "signed_out" }));
        return Ok(());
    }
    println!("Signed out. Cached tokens cleared.");
    Ok(())
}

fn format_expiry(seconds: i64) -> String {
    if seconds <= 0 {
        return "expired (refreshes on next use)".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{hours}h {minutes}m")
}
