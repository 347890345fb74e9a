//! Upload batches and the upload cache.
//!
//! A batch is processed one file at a time. A file that fails to parse or
//! normalize is recorded in the report and the batch moves on; every file
//! that succeeds is upserted.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::{Catalog, UpsertOutcome};
use crate::data::{export_json, parse_export, parse_upload};
use crate::storage::{BlobStore, UPLOADED_MECHS_KEY};

#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadRequest {
    pub files: Vec<UploadedFile>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UploadFailure {
    pub file: String,
    pub message: String,
}

/// Aggregate result of one upload batch.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct UploadReport {
    pub loaded: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub errors: Vec<UploadFailure>,
}

pub fn ingest_uploads(catalog: &mut Catalog, files: &[UploadedFile]) -> UploadReport {
    let mut report = UploadReport::default();
    for file in files {
        match parse_upload(&file.content) {
            Ok(mech) => {
                report.loaded += 1;
                match catalog.upsert(mech) {
                    UpsertOutcome::Inserted => report.inserted += 1,
                    UpsertOutcome::Replaced => report.replaced += 1,
                }
            }
            Err(e) => {
                warn!("Upload of '{}' rejected: {}", file.name, e);
                report.errors.push(UploadFailure {
                    file: file.name.clone(),
                    message: e.to_string(),
                });
            }
        }
    }
    info!(
        "Upload batch: {} loaded ({} new, {} replaced), {} errors",
        report.loaded,
        report.inserted,
        report.replaced,
        report.errors.len()
    );
    report
}

/// Writes the uploaded records of `catalog` to the cache. Failures are logged.
pub async fn persist_uploads(store: &BlobStore, catalog: &Catalog) {
    let result = match export_json(&catalog.uploaded()) {
        Ok(blob) => store.put(UPLOADED_MECHS_KEY, &blob).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!("Could not cache uploaded mechs: {}", e);
    }
}

/// Upserts cached uploads on top of `catalog`, returning how many were restored.
pub async fn restore_uploads(store: &BlobStore, catalog: &mut Catalog) -> usize {
    let blob = match store.get(UPLOADED_MECHS_KEY).await {
        Ok(Some(blob)) => blob,
        Ok(None) => return 0,
        Err(e) => {
            warn!("Could not read upload cache: {}", e);
            return 0;
        }
    };
    match parse_export(&blob) {
        Ok(mechs) => {
            let count = mechs.len();
            for mech in mechs {
                catalog.upsert(mech);
            }
            count
        }
        Err(e) => {
            warn!("Ignoring unreadable upload cache: {}", e);
            0
        }
    }
}

/// Forgets the cached uploads. Failures are logged.
pub async fn clear_uploads(store: &BlobStore) {
    if let Err(e) = store.delete(UPLOADED_MECHS_KEY).await {
        warn!("Could not clear upload cache: {}", e);
    }
}
