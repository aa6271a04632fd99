// src/main.rs
//
// Headless host: open the catalogue, check it, report, close.
// Configuration comes from settings.json and ARTGALLERY_* variables;
// log verbosity from RUST_LOG (default info).

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use artgallery::{Catalog, CatalogConfig};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = CatalogConfig::load().context("loading configuration")?;
    let catalog = Catalog::start(config).context("starting catalogue")?;

    let stats = catalog.health_check().context("checking database")?;
    log::info!(
        "Schema v{}, {} bytes: {} artists, {} artworks, {} events, {} forum posts, {} tutorials, {} performances, {} AR models",
        stats.schema_version,
        stats.size_bytes,
        stats.artist_count,
        stats.artwork_count,
        stats.event_count,
        stats.forum_post_count,
        stats.tutorial_count,
        stats.performance_count,
        stats.ar_model_count,
    );

    let downloaded = catalog
        .state
        .ar_model_service
        .total_downloaded_size()
        .context("summing AR model downloads")?;
    log::info!(
        "Media root {} ({} bytes of AR models, {} bytes of performances)",
        catalog.state.media_store.root().display(),
        downloaded,
        catalog.state.performance_service.disk_usage(),
    );

    catalog.shutdown().context("closing catalogue")?;
    Ok(())
}
