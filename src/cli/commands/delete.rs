//! siteship delete - Delete a published app

use std::io::{self, Write};

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::auth::AuthClient;
use crate::azure::SwaClient;
use crate::error::{Result, ShipError};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// App slug, as shown by `siteship list`
    pub slug: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(ctx: &AppContext, args: &DeleteArgs) -> Result<()> {
    ctx.config.validate()?;
    let auth = AuthClient::new()?;
    let tokens = auth.ensure_tokens(&ctx.config)?;

    let swa = SwaClient::new(&ctx.config, &tokens.access_token);
    // Fetch first so the prompt can show what is about to go, and so a
    // missing slug fails before anyone answers "y".
    let site = swa.get(&args.slug)?;

    if !args.yes {
        if ctx.json {
            return Err(ShipError::Config(
                "refusing to delete without --yes in JSON mode".to_string(),
            ));
        }
        print!(
            "Delete '{}' ({})? This cannot be undone. [y/N] ",
            site.display_name(),
            site.url()
        );
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    swa.delete(&args.slug)?;

    if ctx.json {
        println!(
            "{}",
            serde_json::json!({ "status": "deleted", "slug": args.slug })
        );
        return Ok(());
    }
    if !ctx.quiet {
        println!(
            "Deleted {}. The URL will stop resolving shortly.",
            args.slug.bold()
        );
    }
    Ok(())
}
