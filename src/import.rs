//! Vendor catalog import
//!
//! Vendors are administered out of band. A catalog is either a TOML file
//! with `[[vendor]]` tables or a JSON array of vendor objects:
//!
//! ```toml
//! [[vendor]]
//! name = "Golden Hour Studio"
//! category = "photographer"
//! location = "Austin, TX"
//! priceMin = 1500.0
//! priceMax = 4000.0
//! ```
//!
//! The whole catalog is validated before anything is written, then inserted
//! in one transaction.

use std::path::Path;
use serde::Deserialize;
use crate::storage::SqliteStore;
use crate::vendor::NewVendor;
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct TomlCatalog {
    #[serde(default)]
    vendor: Vec<NewVendor>,
}

/// Parse catalog text. Input starting with `[` followed by `{` or `]` is
/// treated as JSON; everything else as TOML.
pub fn parse_catalog(contents: &str) -> Result<Vec<NewVendor>> {
    if looks_like_json(contents) {
        return Ok(serde_json::from_str(contents)?);
    }
    let catalog: TomlCatalog =
        toml::from_str(contents).map_err(|e| Error::Validation(format!("invalid catalog: {}", e)))?;
    Ok(catalog.vendor)
}

fn looks_like_json(contents: &str) -> bool {
    let mut chars = contents.trim_start().chars();
    if chars.next() != Some('[') {
        return false;
    }
    matches!(chars.find(|c| !c.is_whitespace()), Some('{') | Some(']'))
}

/// Validate every entry, reporting the first bad one by position.
pub fn validate_catalog(vendors: &[NewVendor]) -> Result<()> {
    for (index, vendor) in vendors.iter().enumerate() {
        vendor.validate().map_err(|e| match e {
            Error::Validation(msg) => Error::Validation(format!("vendor #{}: {}", index + 1, msg)),
            other => other,
        })?;
    }
    Ok(())
}

/// Read, validate and insert a catalog file. Returns the inserted count.
pub fn import_catalog(store: &mut SqliteStore, path: &Path) -> Result<usize> {
    let contents = std::fs::read_to_string(path)?;
    let vendors = parse_catalog(&contents)?;
    validate_catalog(&vendors)?;

    let inserted = store.insert_vendors(&vendors)?;
    tracing::info!("Imported {} vendors from {}", inserted, path.display());
    Ok(inserted)
}
