//! Key-value blob store used as an opportunistic cache for uploaded records.
//!
//! Each key maps to one file under the store's directory. Nothing in the
//! catalog depends on the store being available; callers log failures and
//! carry on.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::CatalogError;

/// Key under which uploaded records are cached.
pub const UPLOADED_MECHS_KEY: &str = "uploaded-mechs";

#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }

    pub async fn put(&self, key: &str, blob: &str) -> Result<(), CatalogError> {
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.path_for(key), blob).await?;
        Ok(())
    }

    /// Returns `Ok(None)` when nothing is stored under `key`.
    pub async fn get(&self, key: &str) -> Result<Option<String>, CatalogError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes `key`, returning whether anything was stored.
    pub async fn delete(&self, key: &str) -> Result<bool, CatalogError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
