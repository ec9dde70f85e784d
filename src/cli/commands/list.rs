//! siteship list - List published apps in the resource group

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::auth::AuthClient;
use crate::azure::{StaticSite, SwaClient};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct ListArgs {}

pub fn run(ctx: &AppContext, _args: &ListArgs) -> Result<()> {
    ctx.config.validate()?;
    let auth = AuthClient::new()?;
    let tokens = auth.ensure_tokens(&ctx.config)?;

    let swa = SwaClient::new(&ctx.config, &tokens.access_token);
    let mut sites = swa.list()?;
    sites.sort_by(|a, b| a.name.cmp(&b.name));

    if ctx.json {
        list_robot(&sites)
    } else {
        list_human(ctx, &sites)
    }
}

fn list_human(ctx: &AppContext, sites: &[StaticSite]) -> Result<()> {
    if ctx.quiet {
        return Ok(());
    }
    if sites.is_empty() {
        println!("{}", "No apps deployed".dimmed());
        println!();
        println!("Deploy one with: siteship deploy <folder> --name <name> --description <text>");
        return Ok(());
    }

    println!("{:32} {:28} URL", "SLUG".bold(), "NAME".bold());
    println!("{}", "─".repeat(92).dimmed());

    for site in sites {
        println!(
            "{:32} {:28} {}",
            truncate_slug(&site.name),
            site.display_name(),
            site.url().cyan()
        );
    }

    println!();
    println!("{} {} apps", "Total:".dimmed(), sites.len());
    Ok(())
}

fn list_robot(sites: &[StaticSite]) -> Result<()> {
    let apps: Vec<serde_json::Value> = sites
        .iter()
        .map(|site| {
            serde_json::json!({
                "slug": site.name,
                "name": site.display_name(),
                "description": site.description(),
                "url": site.url(),
                "resourceId": site.id,
            })
        })
        .collect();

    println!(
        "{}",
        serde_json::json!({
            "status": "ok",
            "count": sites.len(),
            "apps": apps,
        })
    );
    Ok(())
}

// Slugs are ASCII by construction, so byte slicing is safe here.
fn truncate_slug(slug: &str) -> String {
    if slug.len() > 30 {
        format!("{}…", &slug[..29])
    } else {
        slug.to_string()
    }
}
