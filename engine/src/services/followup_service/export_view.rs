// Handler for exporting the rows matching a filter
use std::path::Path;

use crate::data::dataset::LoadedDataset;
use crate::error::Result;
use crate::reports::export::export_view;
use crate::reports::{RecordFilter, RecordView};

pub fn handle_export_view(dataset: &LoadedDataset, filter: &RecordFilter, dest: &Path) -> Result<usize> {
    let view = RecordView::filter(&dataset.records, filter);
    export_view(&view, dest)
}
