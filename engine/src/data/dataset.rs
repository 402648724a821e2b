// Loaded datasets and the fingerprint-keyed cache that memoizes them
use super::detector::CsvShape;
use super::normalizer::NormalizedHeaders;
use super::records::CoercionReport;
use super::splitter::InvalidRow;
use crate::error::{PipelineError, Result};
use serde::Serialize;
use shared::models::RecordSet;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Everything one load produces. Never mutated after construction;
/// shared between sessions as `Arc<LoadedDataset>`.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub source_path: PathBuf,
    pub cleaned_path: PathBuf,
    pub shape: CsvShape,
    pub valid_rows: usize,
    pub invalid_rows: Vec<InvalidRow>,
    pub headers: NormalizedHeaders,
    pub coercion: CoercionReport,
    pub records: RecordSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub delimiter: char,
    pub expected_columns: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub records: usize,
    pub coercion_failures: usize,
}

impl LoadedDataset {
    pub fn summary(&self) -> LoadSummary {
        LoadSummary {
            delimiter: self.shape.delimiter.as_char(),
            expected_columns: self.shape.expected_columns,
            valid_rows: self.valid_rows,
            invalid_rows: self.invalid_rows.len(),
            records: self.records.len(),
            coercion_failures: self.coercion.total(),
        }
    }
}

/// Identity and modification state of a load request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub source: PathBuf,
    pub cleaned: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl Fingerprint {
    pub fn of(source: &Path, cleaned: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(source).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PipelineError::InputNotFound { path: source.to_path_buf() },
            _ => PipelineError::from(e),
        })?;
        let source = std::fs::canonicalize(source)?;
        Ok(Fingerprint {
            source,
            cleaned: cleaned.to_path_buf(),
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }

    fn same_request(&self, other: &Fingerprint) -> bool {
        self.source == other.source && self.cleaned == other.cleaned
    }
}

struct CachedEntry {
    dataset: Arc<LoadedDataset>,
    loaded_at: Instant,
}

/// Caller-owned memo of loaded datasets. Entries expire after `ttl`.
pub struct DatasetCache {
    entries: HashMap<Fingerprint, CachedEntry>,
    ttl: Duration,
}

impl DatasetCache {
    pub fn new(ttl: Duration) -> Self {
        DatasetCache {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<LoadedDataset>> {
        self.entries
            .get(fingerprint)
            .filter(|entry| entry.loaded_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.dataset))
    }

    // Replaces any entry for the same source/cleaned pair, stale or not.
    pub fn insert(&mut self, fingerprint: Fingerprint, dataset: LoadedDataset) -> Arc<LoadedDataset> {
        self.entries.retain(|key, _| !key.same_request(&fingerprint));
        let dataset = Arc::new(dataset);
        self.entries.insert(
            fingerprint,
            CachedEntry {
                dataset: Arc::clone(&dataset),
                loaded_at: Instant::now(),
            },
        );
        dataset
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}
