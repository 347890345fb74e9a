//! Fetches dataset documents from a URL or a local file.

use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::CatalogError;

/// Where a dataset document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Url(String),
    Path(PathBuf),
}

impl DatasetSource {
    /// `http://` and `https://` locations are fetched over the network,
    /// everything else is read from disk.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            DatasetSource::Url(location.to_string())
        } else {
            DatasetSource::Path(PathBuf::from(location))
        }
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::Url(url) => f.write_str(url),
            DatasetSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

pub fn build_client() -> Result<reqwest::Client, CatalogError> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("mech-catalog/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Reads the raw text of a dataset document.
///
/// Any failure, including a non-success HTTP status, is reported as
/// [`CatalogError::SourceUnavailable`].
pub async fn fetch_text(
    client: &reqwest::Client,
    source: &DatasetSource,
) -> Result<String, CatalogError> {
    let unavailable =
        |e: &dyn fmt::Display| CatalogError::SourceUnavailable(format!("{}: {}", source, e));

    match source {
        DatasetSource::Url(url) => {
            let response = client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| unavailable(&e))?;
            response.text().await.map_err(|e| unavailable(&e))
        }
        DatasetSource::Path(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| unavailable(&e)),
    }
}

/// Tries each source in order and returns the first document that could be
/// read, together with the source it came from.
pub async fn fetch_first_available(
    client: &reqwest::Client,
    sources: &[DatasetSource],
) -> Result<(DatasetSource, String), CatalogError> {
    let mut failures = Vec::new();
    for source in sources {
        match fetch_text(client, source).await {
            Ok(text) => {
                info!("Loaded dataset document from {}", source);
                return Ok((source.clone(), text));
            }
            Err(e) => {
                warn!("Dataset source failed: {}", e);
                failures.push(e.to_string());
            }
        }
    }
    Err(CatalogError::SourceUnavailable(if failures.is_empty() {
        "no dataset source configured".to_string()
    } else {
        failures.join("; ")
    }))
}
