//! siteship info - Show details for one app

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::auth::AuthClient;
use crate::azure::SwaClient;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// App slug, as shown by `siteship list`
    pub slug: String,

    /// Also fetch and print the site's deployment token
    #[arg(long)]
    pub show_deployment_token: bool,
}

pub fn run(ctx: &AppContext, args: &InfoArgs) -> Result<()> {
    ctx.config.validate()?;
    let auth = AuthClient::new()?;
    let tokens = auth.ensure_tokens(&ctx.config)?;

    let swa = SwaClient::new(&ctx.config, &tokens.access_token);
    let site = swa.get(&args.slug)?;
    let deployment_token = if args.show_deployment_token {
        Some(swa.deployment_token(&args.slug)?)
    } else {
        None
    };

    if ctx.json {
        let mut output = serde_json::json!({
            "status": "ok",
            "app": {
                "slug": site.name,
                "name": site.display_name(),
                "description": site.description(),
                "url": site.url(),
                "location": site.location,
                "resourceId": site.id,
            }
        });
        if let Some(token) = deployment_token {
            output["app"]["deploymentToken"] = serde_json::Value::String(token);
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if ctx.quiet {
        return Ok(());
    }

    let name = site.display_name().to_string();
    println!("{}", name.bold());
    println!("{}", "═".repeat(name.len().max(3)));
    println!();
    println!("{}: {}", "Slug".dimmed(), site.name);
    println!("{}: {}", "URL".dimmed(), site.url().cyan());
    if !site.description().is_empty() {
        println!("{}: {}", "Description".dimmed(), site.description());
    }
    if !site.location.is_empty() {
        println!("{}: {}", "Region".dimmed(), site.location);
    }
    println!("{}: {}", "Resource".dimmed(), site.id);

    if let Some(token) = deployment_token {
        println!();
        println!("{}", "Deployment token".bold());
        println!("{}", "─".repeat(40).dimmed());
        println!("{token}");
    }
    Ok(())
}
