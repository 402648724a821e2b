// FollowupService: the entry point the presentation layer talks to.
// One instance per session; sessions share the load cache.
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::config::PipelineSettings;
use crate::data::dataset::{DatasetCache, LoadedDataset};
use crate::error::Result;
use crate::reports::{Granularity, RecordFilter, RecordView};

pub mod build_report;
pub mod export_view;
pub mod load_dataset;

pub use build_report::DashboardReport;

pub struct FollowupService {
    settings: PipelineSettings,
    cache: Arc<RwLock<DatasetCache>>,
}

impl FollowupService {
    pub fn new(settings: PipelineSettings) -> Self {
        let cache = Arc::new(RwLock::new(DatasetCache::new(settings.cache_ttl())));
        FollowupService { settings, cache }
    }

    pub fn with_cache(settings: PipelineSettings, cache: Arc<RwLock<DatasetCache>>) -> Self {
        FollowupService { settings, cache }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn cache(&self) -> Arc<RwLock<DatasetCache>> {
        Arc::clone(&self.cache)
    }

    pub fn load_dataset(&self) -> Result<Arc<LoadedDataset>> {
        tracing::info!(
            source = %self.settings.source_path.display(),
            cleaned = %self.settings.cleaned_path.display(),
            "Load requested"
        );
        load_dataset::handle_load_dataset(&self.settings, &self.cache)
    }

    pub fn build_report(&self, filter: &RecordFilter, granularity: Granularity) -> Result<DashboardReport> {
        let dataset = self.load_dataset()?;
        Ok(build_report::handle_build_report(&dataset, filter, granularity, &self.settings))
    }

    /// Filtered rows as JSON objects, for the detail table.
    pub fn detail_rows(&self, filter: &RecordFilter, limit: Option<usize>) -> Result<Vec<serde_json::Value>> {
        let dataset = self.load_dataset()?;
        Ok(RecordView::filter(&dataset.records, filter).to_json_rows(limit))
    }

    pub fn export_filtered(&self, filter: &RecordFilter, dest: &Path) -> Result<usize> {
        let dataset = self.load_dataset()?;
        export_view::handle_export_view(&dataset, filter, dest)
    }
}
