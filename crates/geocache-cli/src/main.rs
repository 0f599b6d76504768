//! geocache-update - refreshes the dashboard's map caches.
//!
//! Run from the repository root with no arguments. Downloads the GeoJSON
//! boundary document, then geocodes every state and city in the source
//! dataset that the location cache does not know yet. Progress goes to
//! stderr through `tracing`; the new-record counts go to stdout.

use std::io;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use geocache_core::geocode::client::build_http_client;
use geocache_core::{
    run_update_pass, AppContext, Config, DataTable, LocationLevel, NominatimClient,
};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let ctx = AppContext::new(Config::load()?);
    let config = ctx.config();
    let http = build_http_client(&config.geocoder)?;

    let boundary = ctx.boundary_cache(http.clone());
    if let Err(e) = boundary.refresh().await {
        warn!(url = %boundary.url(), error = %e, "Could not refresh boundary cache");
    }

    let table = DataTable::from_csv_path(&config.dataset_path)?;
    info!(path = %config.dataset_path.display(), rows = table.len(), "Loaded source dataset");

    let store = ctx.location_store();
    let mut cache = store.load();
    info!(
        records = cache.len(),
        updated = %cache.age_display(),
        "Loaded location cache"
    );

    let geocoder = NominatimClient::with_client(http, &config.geocoder);
    let states = run_update_pass(
        &store,
        &mut cache,
        &table,
        LocationLevel::State,
        &config.columns,
        &geocoder,
    )
    .await?;
    let cities = run_update_pass(
        &store,
        &mut cache,
        &table,
        LocationLevel::City,
        &config.columns,
        &geocoder,
    )
    .await?;

    let unresolved = states.unresolved.len() + cities.unresolved.len();
    if unresolved > 0 {
        warn!(unresolved, "Some locations could not be geocoded; they will be retried on the next run");
    }

    println!("New states: {}", states.new_records);
    println!("New cities: {}", cities.new_records);
    Ok(())
}
