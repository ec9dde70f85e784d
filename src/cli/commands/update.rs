//! siteship update - Change an app's display name or description
//!
//! Only touches the metadata tags on the Azure resource; the content and
//! the slug stay as they are.

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::auth::AuthClient;
use crate::azure::SwaClient;
use crate::azure::swa::{TAG_APP_DESCRIPTION, TAG_APP_NAME};
use crate::error::{Result, ShipError};

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// App slug, as shown by `siteship list`
    pub slug: String,

    /// New display name
    #[arg(long)]
    pub name: Option<String>,

    /// New description
    #[arg(long)]
    pub description: Option<String>,
}

pub fn run(ctx: &AppContext, args: &UpdateArgs) -> Result<()> {
    if args.name.is_none() && args.description.is_none() {
        return Err(ShipError::Config(
            "nothing to update; pass --name and/or --description".to_string(),
        ));
    }

    ctx.config.validate()?;
    let auth = AuthClient::new()?;
    let tokens = auth.ensure_tokens(&ctx.config)?;

    let swa = SwaClient::new(&ctx.config, &tokens.access_token);
    let site = swa.get(&args.slug)?;

    // Patch only the tags named on the command line; anything else set on
    // the resource stays as it was.
    let mut tags = site.tags.clone();
    if let Some(name) = &args.name {
        tags.insert(TAG_APP_NAME.to_string(), name.clone());
    }
    if let Some(description) = &args.description {
        tags.insert(TAG_APP_DESCRIPTION.to_string(), description.clone());
    }
    let updated = swa.update_tags(&args.slug, &tags)?;

    if ctx.json {
        println!(
            "{}",
            serde_json::json!({
                "status": "updated",
                "slug": updated.name,
                "name": updated.display_name(),
                "description": updated.description(),
            })
        );
        return Ok(());
    }
    if !ctx.quiet {
        println!("Updated {}", updated.name.bold());
        println!("  {}: {}", "Name".dimmed(), updated.display_name());
        if !updated.description().is_empty() {
            println!("  {}: {}", "Description".dimmed(), updated.description());
        }
    }
    Ok(())
}
