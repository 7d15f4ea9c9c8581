//! Medicine catalog imported from the public medicine information bank.
//!
//! The bank publishes its metadata as a pipe-delimited CSV with a header
//! row. Each row becomes a [`CatalogEntry`] with the administrative columns
//! removed, and the result is kept in the store for offline search.

use crate::store::{load_collection, save_collection, KvStore, CATALOG_KEY};
use crate::Result;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Columns that carry no information useful for finding a medicine
pub const DROPPED_COLUMNS: [&str; 10] = [
    "POTENTIE",
    "PROCEDURENUMMER",
    "AANVULLENDEMONITORING",
    "PAR_FILENAAM",
    "SPAR_FILENAAM",
    "ARM_FILENAAM",
    "ARMM_FILENAAM",
    "NIEUWS_LINKS",
    "NIEUWS_LINKS_DATUM",
    "NIEUWS_LINK_DATUMS",
];

/// Column holding the product name
pub const NAME_COLUMN: &str = "PRODUCTNAAM";

/// One catalog row, column name to value
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogEntry {
    pub fields: BTreeMap<String, String>,
}

impl CatalogEntry {
    /// Product name, falling back to the first non-empty value
    pub fn name(&self) -> &str {
        self.fields
            .get(NAME_COLUMN)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.fields.values().find(|v| !v.trim().is_empty()))
            .map(String::as_str)
            .unwrap_or("")
    }

    fn matches(&self, needle: &str) -> bool {
        self.fields
            .values()
            .any(|v| v.to_lowercase().contains(needle))
    }
}

/// Parse the pipe-delimited export. Rows that fail to parse are skipped.
pub fn parse_catalog<R: Read>(reader: R) -> Result<Vec<CatalogEntry>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = reader.headers()?.len();
    tracing::debug!("Catalog export has {} columns", columns);

    let mut entries = Vec::new();
    for (row, result) in reader.deserialize::<BTreeMap<String, String>>().enumerate() {
        match result {
            Ok(mut fields) => {
                for column in DROPPED_COLUMNS {
                    fields.remove(column);
                }
                entries.push(CatalogEntry { fields });
            }
            Err(e) => {
                tracing::warn!("Skipping catalog row {}: {}", row + 1, e);
            }
        }
    }

    tracing::debug!("Parsed {} catalog entries", entries.len());
    Ok(entries)
}

/// Parse a downloaded export and store it, replacing any previous catalog
pub fn import_catalog<S: KvStore + ?Sized>(path: &Path, store: &mut S) -> Result<usize> {
    let file = std::fs::File::open(path)?;
    let entries = parse_catalog(file)?;
    save_collection(store, CATALOG_KEY, &entries)?;
    tracing::info!("Imported {} catalog entries from {:?}", entries.len(), path);
    Ok(entries.len())
}

/// Stored catalog, empty when none was imported
pub fn load_catalog<S: KvStore + ?Sized>(store: &S) -> Vec<CatalogEntry> {
    load_collection(store, CATALOG_KEY).unwrap_or_default()
}

/// Case-insensitive substring search over every column.
/// An empty term matches nothing.
pub fn search_catalog<'a>(entries: &'a [CatalogEntry], term: &str) -> Vec<&'a CatalogEntry> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    entries.iter().filter(|e| e.matches(&needle)).collect()
}
