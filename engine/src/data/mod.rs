// Ingestion pipeline stages, in dependency order:
// detector -> splitter -> normalizer -> coercion, assembled by `records`.
pub mod atomic_write;
pub mod coercion;
pub mod dataset;
pub mod detector;
pub mod normalizer;
pub mod records;
pub mod splitter;
