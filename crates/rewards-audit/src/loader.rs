//! NDJSON source loading.
//!
//! Each export holds one JSON object per line. A source either loads
//! completely or not at all: an unreadable file or a single malformed line
//! fails the whole source, and [`load_or_empty`] swaps in an empty collection
//! so the audit can run over whatever else loaded.

use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::AuditConfig;
use crate::error::{AuditError, Result, ResultExt};
use crate::types::{Collection, Record};

/// Outcome of loading one named source.
#[derive(Debug)]
pub struct LoadedSource {
    pub path: PathBuf,
    pub collection: Collection,
    /// Set when the source failed and `collection` is the empty substitute.
    pub error: Option<AuditError>,
}

impl LoadedSource {
    pub fn is_loaded(&self) -> bool {
        self.error.is_none()
    }
}

/// The three exports the audit runs over.
#[derive(Debug)]
pub struct Sources {
    pub receipts: LoadedSource,
    pub users: LoadedSource,
    pub brands: LoadedSource,
}

impl Sources {
    pub fn iter(&self) -> impl Iterator<Item = &LoadedSource> {
        [&self.receipts, &self.users, &self.brands].into_iter()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Read an NDJSON file into a collection named `name`.
///
/// Blank lines are skipped. Every other line must be a JSON object.
pub fn load_collection(path: &Path, name: &str) -> Result<Collection> {
    let file = File::open(path).context(format!("Opening {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut collection = Collection::new(name);

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.context(format!("Reading line {}", line_no))?;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(&line)
            .map_err(|e| AuditError::Json(e).with_context(format!("Line {}", line_no)))?;

        match value {
            Value::Object(object) => collection.push(Record::from_json_object(object)),
            other => {
                return Err(AuditError::InvalidRecord {
                    line: line_no,
                    reason: format!("found {}", json_kind(&other)),
                });
            }
        }
    }

    debug!(
        "Read {} records with {} fields from {}",
        collection.len(),
        collection.columns().len(),
        path.display()
    );
    Ok(collection)
}

/// Load a source, substituting an empty collection on failure.
pub fn load_or_empty(path: &Path, name: &str) -> LoadedSource {
    match load_collection(path, name) {
        Ok(collection) => {
            info!("Successfully loaded {}", path.display());
            LoadedSource {
                path: path.to_path_buf(),
                collection,
                error: None,
            }
        }
        Err(e) => {
            warn!("Error loading {}: {}", path.display(), e);
            LoadedSource {
                path: path.to_path_buf(),
                collection: Collection::new(name),
                error: Some(AuditError::SourceLoad {
                    source_name: name.to_string(),
                    reason: e.to_string(),
                }),
            }
        }
    }
}

/// Load receipts, users and brands as configured.
pub fn load_sources(config: &AuditConfig) -> Sources {
    Sources {
        receipts: load_or_empty(&config.receipts_path(), "receipts"),
        users: load_or_empty(&config.users_path(), "users"),
        brands: load_or_empty(&config.brands_path(), "brands"),
    }
}
