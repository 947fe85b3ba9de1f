//! twig App - Main Entry Point
//!
//! Renders the counter demo onto a headless surface, replays a few clicks
//! and navigations, and prints the markup after each step.

use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use twig_app::{load_config, routes, Counter};
use twig_dom::{Document, HeadlessSurface, TagKind};
use twig_router::{HashLocation, Router, RouterConfig};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting twig demo...");

    // Parse command line: [--config <path>] [start-url]
    let mut config_path: Option<PathBuf> = None;
    let mut start = "http://localhost/#/".to_string();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            config_path = Some(args.next().context("--config needs a path")?.into());
        } else {
            start = arg;
        }
    }
    let config = match config_path {
        Some(path) => load_config(&path)?,
        None => RouterConfig::default(),
    };
    let host = config.mount_point.clone();

    let surface = HeadlessSurface::new().with_host(&host);
    let doc = Document::new(Counter::default(), surface.clone());
    let location = HashLocation::new(&start).with_context(|| format!("parsing start url {start}"))?;
    let router = Router::attach(&doc, routes(&config), config, &location)?;
    println!("{}\n  {}", location.href(), surface.host_html(&host));

    if let Some(button) = surface.find_by_text(&host, TagKind::Button, "Click Me") {
        for _ in 0..3 {
            surface.dispatch(button, "click");
        }
        println!("after 3 clicks\n  {}", surface.host_html(&host));
    }
    if let Some(like) = surface.find_by_text(&host, TagKind::Button, "Like") {
        surface.dispatch(like, "click");
        println!("after like\n  {}", surface.host_html(&host));
    }

    // Follow the first link on each page, then walk back through history
    for _ in 0..2 {
        let Some(href) = surface
            .find_all(&host, TagKind::A)
            .first()
            .and_then(|&link| surface.attribute(link, "href"))
        else {
            break;
        };
        location.push(&href)?;
        println!("{}\n  {}", location.href(), surface.host_html(&host));
    }
    location.push("#/test/hello")?;
    println!("{}\n  {}", location.href(), surface.host_html(&host));
    location.push("#/nowhere")?;
    println!("{}\n  {}", location.href(), surface.host_html(&host));
    while location.back() {
        tracing::debug!(path = %router.current_path(), "back");
    }
    println!("{}\n  {}", location.href(), surface.host_html(&host));

    for diagnostic in doc.take_diagnostics() {
        tracing::warn!(?diagnostic, "diagnostic");
    }
    Ok(())
}
