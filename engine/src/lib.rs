// Engine library root: the ingestion pipeline for fleet procurement
// request exports, and the read-only reports built on top of it.

pub mod config;
pub mod data;
pub mod error;
pub mod reports;
pub mod services;

pub use config::PipelineSettings;
pub use error::{PipelineError, Result};
pub use services::FollowupService;
