// Pipeline settings, loaded from a JSON file or the embedded defaults
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SLA_THRESHOLD_RANGE: std::ops::RangeInclusive<u32> = 1..=30;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineSettings {
    pub source_path: PathBuf,
    pub cleaned_path: PathBuf,
    // Tried in order when parsing the request date column
    pub date_formats: Vec<String>,
    pub cache_ttl_secs: u64,
    pub sla_threshold_days: u32,
    pub pending_alert_ratio: f64,
    pub top_n: usize,
    pub equipment_column: String,
    pub category_column: String,
    pub status_column: String,
    pub supplier_column: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings {
            source_path: PathBuf::from("solicitacao_to.csv"),
            cleaned_path: PathBuf::from("csv_validado.csv"),
            date_formats: vec![
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%d %H:%M".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
                "%Y-%m-%d".to_string(),
                "%d/%m/%Y %H:%M:%S".to_string(),
                "%d/%m/%Y %H:%M".to_string(),
                "%d/%m/%Y".to_string(),
            ],
            cache_ttl_secs: 3600,
            sla_threshold_days: 7,
            pending_alert_ratio: 0.2,
            top_n: 5,
            equipment_column: "Cód.Equipamento".to_string(),
            category_column: "TIPO".to_string(),
            status_column: "SITUAÇÃO".to_string(),
            supplier_column: "Fornecedor".to_string(),
        }
    }
}

impl PipelineSettings {
    // Embedded copy of config/default.json, so the binary runs without a config file.
    pub fn load_default() -> Result<Self> {
        let config_str = include_str!("../../config/default.json");
        let settings: PipelineSettings = serde_json::from_str(config_str)
            .map_err(|e| PipelineError::ConfigError(format!("Embedded default config is invalid: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::ConfigError(format!("Cannot read config '{}': {}", path.display(), e)))?;
        let settings: PipelineSettings = serde_json::from_str(&raw)
            .map_err(|e| PipelineError::ConfigError(format!("Invalid config '{}': {}", path.display(), e)))?;
        settings.validate()?;
        tracing::debug!(path = %path.display(), "Loaded pipeline settings");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_path.as_os_str().is_empty() || self.cleaned_path.as_os_str().is_empty() {
            return Err(PipelineError::ConfigError("source_path and cleaned_path must not be empty".to_string()));
        }
        if self.source_path == self.cleaned_path {
            return Err(PipelineError::ConfigError(format!(
                "cleaned_path must differ from source_path ('{}')",
                self.source_path.display()
            )));
        }
        if !SLA_THRESHOLD_RANGE.contains(&self.sla_threshold_days) {
            return Err(PipelineError::ConfigError(format!(
                "sla_threshold_days must be within {}..={}, got {}",
                SLA_THRESHOLD_RANGE.start(),
                SLA_THRESHOLD_RANGE.end(),
                self.sla_threshold_days
            )));
        }
        if self.date_formats.is_empty() {
            return Err(PipelineError::ConfigError("date_formats must list at least one format".to_string()));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
