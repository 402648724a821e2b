// Runs the ingestion pipeline, or serves it from the load cache
use std::sync::{Arc, RwLock};

use crate::config::PipelineSettings;
use crate::data::dataset::{DatasetCache, Fingerprint, LoadedDataset};
use crate::data::detector::detect_shape;
use crate::data::records::build_records;
use crate::data::splitter::{split_file, write_cleaned};
use crate::error::{PipelineError, Result};

/// Detect -> split -> write cleaned artifact -> normalize and type.
/// Nothing is written when the source is missing or empty.
pub fn run_pipeline(settings: &PipelineSettings) -> Result<LoadedDataset> {
    let source = settings.source_path.as_path();
    if !source.exists() {
        return Err(PipelineError::InputNotFound { path: source.to_path_buf() });
    }

    let shape = detect_shape(source)?;
    let validation = split_file(source, &shape)?;
    write_cleaned(&validation.valid_rows, shape.delimiter, &settings.cleaned_path)?;

    let built = build_records(&validation.valid_rows, &settings.date_formats);
    tracing::info!(
        path = %source.display(),
        delimiter = %shape.delimiter,
        columns = shape.expected_columns,
        valid = validation.valid_count(),
        invalid = validation.invalid_count(),
        records = built.records.len(),
        "Loaded dataset"
    );

    Ok(LoadedDataset {
        source_path: source.to_path_buf(),
        cleaned_path: settings.cleaned_path.clone(),
        shape,
        valid_rows: validation.valid_count(),
        invalid_rows: validation.invalid_rows,
        headers: built.headers,
        coercion: built.coercion,
        records: built.records,
    })
}

pub fn handle_load_dataset(settings: &PipelineSettings, cache: &Arc<RwLock<DatasetCache>>) -> Result<Arc<LoadedDataset>> {
    let fingerprint = Fingerprint::of(&settings.source_path, &settings.cleaned_path)?;

    {
        let store = cache
            .read()
            .map_err(|_| PipelineError::ProcessingError("Dataset cache lock poisoned".to_string()))?;
        if let Some(dataset) = store.get(&fingerprint) {
            tracing::debug!(path = %settings.source_path.display(), "Dataset cache hit");
            return Ok(dataset);
        }
    }

    tracing::debug!(path = %settings.source_path.display(), "Dataset cache miss, running pipeline");
    let dataset = run_pipeline(settings)?;

    let mut store = cache
        .write()
        .map_err(|_| PipelineError::ProcessingError("Dataset cache lock poisoned".to_string()))?;
    Ok(store.insert(fingerprint, dataset))
}
