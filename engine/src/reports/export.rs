// Writes a filtered view back to comma-delimited text
use super::view::RecordView;
use crate::data::atomic_write::write_atomically;
use crate::error::Result;
use csv::WriterBuilder;
use std::path::Path;

/// Header plus one line per row in the view; missing cells are empty.
/// Returns the number of data rows written.
pub fn export_view(view: &RecordView<'_>, dest: &Path) -> Result<usize> {
    let set = view.set();
    write_atomically(dest, |file| {
        let mut wtr = WriterBuilder::new().delimiter(b',').from_writer(file);
        wtr.write_record(set.columns())?;
        for &row in view.row_indices() {
            wtr.write_record(set.rows()[row].values().iter().map(|v| v.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    })?;
    tracing::info!(path = %dest.display(), rows = view.len(), "Exported filtered view");
    Ok(view.len())
}
