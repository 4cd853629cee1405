//! Annotation-table loader.
//!
//! The pragma scanner emits `{"loop_bounds": [{file, line, column,
//! lower_bound, upper_bound}, ...]}`. Lookups key on `(basename, line)`; the
//! column is informational only because it shifts between compiler versions.

use crate::errors::{EngineError, Result};
use crate::features::loop_bounds::domain::{BoundSource, LoopBound};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// One record of the annotation file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopBoundRecord {
    pub file: String,
    pub line: u32,
    #[serde(default)]
    pub column: u32,
    pub lower_bound: u32,
    pub upper_bound: u32,
}

#[derive(Debug, Deserialize)]
struct BoundsFile {
    loop_bounds: Vec<LoopBoundRecord>,
}

/// Loop bounds indexed by `(basename, line)`.
#[derive(Debug, Clone, Default)]
pub struct BoundsTable {
    by_location: FxHashMap<(String, u32), LoopBound>,
}

impl BoundsTable {
    /// Load the annotation file named in the configuration.
    ///
    /// A file that does not exist is a configuration error; a file that does
    /// not parse is only a warning and yields an empty table (the header will
    /// still be rejected later if no other bound source covers it).
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EngineError::MissingBoundsFile(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let parsed: BoundsFile = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(path = %path.display(), %err, "could not parse loop bounds file");
                return Ok(Self::default());
            }
        };
        let table = Self::from_records(parsed.loop_bounds);
        info!(
            path = %path.display(),
            bounds = table.by_location.len(),
            "loaded loop bounds"
        );
        Ok(table)
    }

    pub fn from_records(records: Vec<LoopBoundRecord>) -> Self {
        let mut by_location = FxHashMap::default();
        for record in records {
            let basename = record
                .file
                .rsplit(['/', '\\'])
                .next()
                .unwrap_or(record.file.as_str())
                .to_string();
            debug!(
                file = basename.as_str(),
                line = record.line,
                upper = record.upper_bound,
                "annotation bound"
            );
            by_location.insert(
                (basename, record.line),
                LoopBound {
                    lower: record.lower_bound,
                    upper: record.upper_bound,
                    source: BoundSource::Annotation,
                },
            );
        }
        Self { by_location }
    }

    pub fn lookup(&self, basename: &str, line: u32) -> Option<LoopBound> {
        self.by_location
            .get(&(basename.to_string(), line))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.by_location.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_location.is_empty()
    }
}
