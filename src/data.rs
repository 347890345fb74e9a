//! Data loading module - turns dataset, upload and export documents into
//! canonical records.

use serde_json::Value;
use tracing::warn;

use crate::error::CatalogError;
use crate::models::{DatasetDocument, Mech, MechDetail, Source};
use crate::normalizer::{detail_id, normalize, RawMech};

fn parse_json(text: &str) -> Result<Value, CatalogError> {
    serde_json::from_str(text).map_err(|e| CatalogError::MalformedInput(e.to_string()))
}

/// Parses a dataset document and normalizes every entry as a catalog record.
///
/// Entries that fail normalization are logged and skipped; the document
/// itself must be a bare array or an object with a `mechs` array.
pub fn parse_dataset(text: &str) -> Result<Vec<Mech>, CatalogError> {
    let document: DatasetDocument<Value> =
        serde_json::from_value(parse_json(text)?).map_err(|_| CatalogError::InvalidFormat {
            field: Some("mechs".to_string()),
            reason: "expected an array of mechs or an object with a `mechs` array".to_string(),
        })?;

    let mut mechs = Vec::new();
    for (index, raw) in document.into_records().iter().enumerate() {
        match normalize(raw, Source::Catalog) {
            Ok(mech) => mechs.push(mech),
            Err(e) => warn!("Skipping dataset entry {}: {}", index, e),
        }
    }
    Ok(mechs)
}

/// Parses one uploaded file. Uploads must use the raw game-export shape.
pub fn parse_upload(text: &str) -> Result<Mech, CatalogError> {
    let value = parse_json(text)?;
    match RawMech::classify(&value) {
        Ok(raw @ RawMech::Legacy(_)) => Ok(raw.into_mech(Source::Uploaded)),
        Ok(RawMech::Canonical(_)) => Err(CatalogError::missing_field("ChassisID")),
        Err(e) => Err(e),
    }
}

/// Serializes the full collection as a pretty-printed JSON array.
pub fn export_json(mechs: &[Mech]) -> Result<String, CatalogError> {
    Ok(serde_json::to_string_pretty(mechs)?)
}

/// Reads back a document written by [`export_json`], provenance included.
pub fn parse_export(text: &str) -> Result<Vec<Mech>, CatalogError> {
    let document: DatasetDocument<Mech> = serde_json::from_value(parse_json(text)?)
        .map_err(|e| CatalogError::InvalidFormat {
            field: None,
            reason: e.to_string(),
        })?;
    Ok(document.into_records())
}

fn has_detail_id(raw: &Value, id: &str) -> bool {
    if raw.get("id").and_then(Value::as_str) == Some(id) {
        return true;
    }
    raw.get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| detail_id(name, raw.get("model").and_then(Value::as_str)) == id)
}

/// Finds one record of the enhanced dataset by explicit or derived id.
///
/// The id is matched on the raw entry, so an entry that is present but
/// unreadable is reported as [`CatalogError::InvalidFormat`], never as
/// [`CatalogError::NotFound`].
pub fn find_detail(text: &str, id: &str) -> Result<MechDetail, CatalogError> {
    let document: DatasetDocument<Value> =
        serde_json::from_value(parse_json(text)?).map_err(|_| CatalogError::InvalidFormat {
            field: Some("mechs".to_string()),
            reason: "expected an array of mechs or an object with a `mechs` array".to_string(),
        })?;
    let raw = document
        .into_records()
        .into_iter()
        .find(|raw| has_detail_id(raw, id))
        .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
    serde_json::from_value(raw).map_err(|e| CatalogError::InvalidFormat {
        field: None,
        reason: e.to_string(),
    })
}
