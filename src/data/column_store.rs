use crate::data::loader::LoadedTable;
use crate::error::{Result, ViewsError, Warnings};

/// Label of the synthetic last entry in the label list, meaning "no axis".
pub const NOTHING_LABEL: &str = "-nothing-";

/// Upper bound on the number of columns kept from a loaded table.
pub const MAX_VARS: usize = 256;

/// Fewest rows a table may hold. Compaction never goes below this.
pub const MIN_ROWS: usize = 2;

/// Column-major numeric table shared by every plot of a dataset.
///
/// All columns have exactly `npoints` values. `generation` increases every
/// time the row set changes (compaction or replacement), which is what the
/// rank cache keys its permutations on.
#[derive(Debug, Clone)]
pub struct ColumnStore {
    /// `nvars + 1` labels; the last one is always [`NOTHING_LABEL`].
    labels: Vec<String>,
    columns: Vec<Vec<f32>>,
    npoints: usize,
    generation: u64,
}

impl ColumnStore {
    /// Build a store from a loaded table.
    ///
    /// Columns beyond [`MAX_VARS`] are dropped and constant columns are
    /// pruned; both produce warnings rather than errors. A ragged table or
    /// one with fewer than [`MIN_ROWS`] rows is rejected.
    pub fn from_table(table: LoadedTable) -> Result<(Self, Warnings)> {
        let mut warnings = Warnings::new();
        let LoadedTable {
            mut labels,
            mut columns,
        } = table;

        let npoints = columns.first().map(|c| c.len()).unwrap_or(0);
        for (i, col) in columns.iter().enumerate() {
            if col.len() != npoints {
                return Err(ViewsError::RaggedTable {
                    label: labels.get(i).cloned().unwrap_or_else(|| format!("var_{i}")),
                    expected: npoints,
                    actual: col.len(),
                });
            }
        }
        if npoints < MIN_ROWS {
            return Err(ViewsError::EmptyTable { required: MIN_ROWS });
        }

        // Pad or trim labels so they pair up with columns.
        labels.truncate(columns.len());
        while labels.len() < columns.len() {
            labels.push(format!("var_{}", labels.len()));
        }

        if columns.len() > MAX_VARS {
            warnings.push(format!(
                "Table has {} columns; only the first {MAX_VARS} are used",
                columns.len()
            ));
            columns.truncate(MAX_VARS);
            labels.truncate(MAX_VARS);
        }

        let mut kept_labels = Vec::with_capacity(labels.len() + 1);
        let mut kept_columns = Vec::with_capacity(columns.len());
        for (label, col) in labels.into_iter().zip(columns) {
            if is_trivial(&col) {
                warnings.push(format!("Column '{label}' is constant and was skipped"));
                continue;
            }
            kept_labels.push(label);
            kept_columns.push(col);
        }
        if kept_columns.is_empty() {
            return Err(ViewsError::EmptyTable { required: MIN_ROWS });
        }
        kept_labels.push(NOTHING_LABEL.to_string());

        tracing::info!(
            "Column store: {} rows x {} columns",
            npoints,
            kept_columns.len()
        );

        Ok((
            Self {
                labels: kept_labels,
                columns: kept_columns,
                npoints,
                generation: 0,
            },
            warnings,
        ))
    }

    pub fn npoints(&self) -> usize {
        self.npoints
    }

    pub fn nvars(&self) -> usize {
        self.columns.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Column values. Panics on an out-of-range index; callers resolve
    /// user choices through [`ColumnStore::checked_column`].
    pub fn column(&self, index: usize) -> &[f32] {
        &self.columns[index]
    }

    pub fn checked_column(&self, index: usize) -> Result<&[f32]> {
        self.columns
            .get(index)
            .map(|c| c.as_slice())
            .ok_or(ViewsError::ColumnOutOfRange {
                index,
                max: self.columns.len().saturating_sub(1),
            })
    }

    /// All labels including the trailing [`NOTHING_LABEL`].
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, index: usize) -> &str {
        self.labels
            .get(index)
            .map(|s| s.as_str())
            .unwrap_or(NOTHING_LABEL)
    }

    /// Keep only rows whose `keep` flag is set, preserving their order.
    /// Every column is compacted in lockstep and the generation advances.
    /// Returns the new row count.
    pub fn retain_rows(&mut self, keep: &[bool]) -> usize {
        assert_eq!(
            keep.len(),
            self.npoints,
            "row mask length must match the table"
        );
        for col in &mut self.columns {
            let mut dst = 0;
            for src in 0..col.len() {
                if keep[src] {
                    col[dst] = col[src];
                    dst += 1;
                }
            }
            col.truncate(dst);
        }
        self.npoints = keep.iter().filter(|&&k| k).count();
        self.generation += 1;
        self.npoints
    }

    /// Swap in a freshly loaded table. The generation keeps increasing so
    /// nothing cached against the old table can match the new one.
    pub fn replace(&mut self, other: ColumnStore) {
        let generation = self.generation.max(other.generation) + 1;
        *self = other;
        self.generation = generation;
        tracing::info!(
            "Column store replaced: {} rows x {} columns (generation {})",
            self.npoints,
            self.columns.len(),
            self.generation
        );
    }
}

fn is_trivial(col: &[f32]) -> bool {
    match col.first() {
        Some(&first) => col.iter().all(|&v| v == first),
        None => true,
    }
}
