mod analytics;
mod catalog;
mod data;
mod error;
mod fetcher;
mod handlers;
mod models;
mod normalizer;
mod state;
mod storage;
mod upload;

use anyhow::{Context, Result};
use std::sync::Arc;
use tera::Tera;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::catalog::Catalog;
use crate::data::parse_dataset;
use crate::fetcher::{build_client, fetch_first_available};
use crate::state::{AppState, Config, LoadStatus};
use crate::upload::restore_uploads;

/// Loads the dataset (preferred source first, then the fallback) and layers
/// cached uploads on top. Never fails: a missing dataset leaves an empty
/// catalog with an `Unavailable` status.
async fn load_catalog(
    config: &Config,
    client: &reqwest::Client,
    store: &storage::BlobStore,
) -> (Catalog, LoadStatus) {
    let sources = [config.dataset.clone(), config.dataset_fallback.clone()];
    let mut catalog = Catalog::new();

    let status = match fetch_first_available(client, &sources).await {
        Ok((source, text)) => match parse_dataset(&text) {
            Ok(mechs) => {
                catalog.load_bulk(mechs);
                info!("Loaded {} mechs from {}", catalog.len(), source);
                LoadStatus::Ready {
                    source: source.to_string(),
                }
            }
            Err(e) => {
                warn!("Dataset {} is unusable: {}", source, e);
                LoadStatus::Unavailable {
                    reason: e.to_string(),
                }
            }
        },
        Err(e) => LoadStatus::Unavailable {
            reason: e.to_string(),
        },
    };

    let restored = restore_uploads(store, &mut catalog).await;
    if restored > 0 {
        info!(
            "Restored {} uploaded mechs from {}",
            restored,
            store.dir().display()
        );
    }
    (catalog, status)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mech_catalog=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let tera = Tera::new(&config.templates_glob).context("Failed to parse templates")?;
    let client = build_client().context("Failed to build HTTP client")?;

    let store = storage::BlobStore::new(&config.cache_dir);
    let (catalog, status) = load_catalog(&config, &client, &store).await;
    match &status {
        LoadStatus::Unavailable { reason } => warn!("Starting without a dataset: {}", reason),
        LoadStatus::Ready { .. } if catalog.is_empty() => {
            warn!("Dataset contained no usable mechs")
        }
        LoadStatus::Ready { .. } => {}
    }

    let bind_address = config.bind_address.clone();
    let state = Arc::new(AppState::new(tera, config, client, catalog, status));
    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
