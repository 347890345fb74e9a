use std::env;
use tera::Tera;
use tokio::sync::RwLock;

use crate::catalog::Catalog;
use crate::fetcher::DatasetSource;
use crate::storage::BlobStore;

/// Application configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server to.
    pub bind_address: String,
    /// Preferred (enhanced) dataset document.
    pub dataset: DatasetSource,
    /// Plain dataset used when the preferred one cannot be read.
    pub dataset_fallback: DatasetSource,
    /// Enhanced dataset read by the detail page.
    pub detail_dataset: DatasetSource,
    /// Directory of the upload cache.
    pub cache_dir: String,
    pub templates_glob: String,
    pub static_dir: String,
}

impl Config {
    /// Creates Config from environment variables with defaults.
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| env::var(name).unwrap_or_else(|_| default.into());
        Self {
            bind_address: var("BIND_ADDRESS", "0.0.0.0:8201"),
            dataset: DatasetSource::parse(&var("DATASET_URL", "data/mechs-data-enhanced.json")),
            dataset_fallback: DatasetSource::parse(&var(
                "DATASET_FALLBACK_URL",
                "data/mechs-data.json",
            )),
            detail_dataset: DatasetSource::parse(&var(
                "DETAIL_DATASET_URL",
                "data/mechs-data-enhanced.json",
            )),
            cache_dir: var("CACHE_DIR", "data/cache"),
            templates_glob: var("TEMPLATES_GLOB", "templates/**/*.html"),
            static_dir: var("STATIC_DIR", "static"),
        }
    }
}

/// Outcome of the startup dataset load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Ready { source: String },
    Unavailable { reason: String },
}

/// Shared application state passed to all request handlers.
#[derive(Debug)]
pub struct AppState {
    /// Template engine for rendering HTML pages.
    pub tera: Tera,
    pub config: Config,
    pub client: reqwest::Client,
    pub store: BlobStore,
    /// Catalog data protected by RwLock; every mutation holds the write guard
    /// for its whole batch.
    pub data: RwLock<AppData>,
}

#[derive(Debug)]
pub struct AppData {
    pub catalog: Catalog,
    pub status: LoadStatus,
}

impl AppState {
    pub fn new(
        tera: Tera,
        config: Config,
        client: reqwest::Client,
        catalog: Catalog,
        status: LoadStatus,
    ) -> Self {
        let store = BlobStore::new(&config.cache_dir);
        Self {
            tera,
            config,
            client,
            store,
            data: RwLock::new(AppData { catalog, status }),
        }
    }
}
