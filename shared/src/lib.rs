// Data model shared by the ingestion engine and any presentation layer
// that consumes its record sets.
pub mod models;
pub mod utils;

pub use models::{CanonicalColumns, CanonicalField, CellValue, Record, RecordSet, VALUE_COLUMN};
