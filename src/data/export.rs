use std::path::Path;

use crate::data::column_store::ColumnStore;
use crate::error::Result;
use crate::state::selection::SelectionState;

/// Write the table as comma-separated text with a header row of column
/// labels. With `only_selected`, rows nobody has selected are skipped.
/// Returns the number of data rows written.
pub fn write_csv(
    store: &ColumnStore,
    selection: &SelectionState,
    path: &Path,
    only_selected: bool,
) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;
    let nvars = store.nvars();

    writer.write_record(&store.labels()[..nvars])?;

    let mut written = 0;
    let mut record: Vec<String> = Vec::with_capacity(nvars);
    for row in 0..store.npoints() {
        if only_selected && !(row < selection.npoints() && selection.is_selected(row)) {
            continue;
        }
        record.clear();
        record.extend((0..nvars).map(|c| store.column(c)[row].to_string()));
        writer.write_record(&record)?;
        written += 1;
    }
    writer.flush()?;

    tracing::info!("Exported {} rows to {:?}", written, path);
    Ok(written)
}
