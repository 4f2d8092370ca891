use std::path::Path;

use crate::error::{Result, ViewsError, Warnings};

/// A table as produced by the file readers: labels plus column-major
/// values. Shape is validated later by `ColumnStore::from_table`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedTable {
    pub labels: Vec<String>,
    pub columns: Vec<Vec<f32>>,
}

impl LoadedTable {
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }
}

/// Load a delimited text file or a spreadsheet.
///
/// `max_points` caps the number of data rows read (0 = no limit). Rows
/// with unparseable or non-finite cells are skipped and reported through
/// the returned warnings.
pub fn load_file(path: &Path, max_points: usize) -> Result<(LoadedTable, Warnings)> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    tracing::info!("Loading {:?}", path);
    match ext.as_str() {
        "" | "csv" | "txt" | "dat" | "asc" | "tsv" => {
            let content = std::fs::read(path)?;
            // Fall back to latin1 when the file is not valid UTF-8.
            let text = String::from_utf8(content.clone())
                .unwrap_or_else(|_| content.iter().map(|&b| b as char).collect());
            parse_delimited(&text, max_points)
        }
        "xls" | "xlsx" | "xlsm" | "ods" => load_spreadsheet(path, max_points),
        _ => Err(ViewsError::UnsupportedFormat { extension: ext }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Comma,
    Tab,
    Whitespace,
}

fn is_comment(line: &str) -> bool {
    let t = line.trim_start();
    t.is_empty() || t.starts_with('#') || t.starts_with('!')
}

fn detect_delimiter(line: &str) -> Delimiter {
    if line.contains(',') {
        Delimiter::Comma
    } else if line.contains('\t') {
        Delimiter::Tab
    } else {
        Delimiter::Whitespace
    }
}

/// Parse delimited ASCII text into a table.
pub fn parse_delimited(text: &str, max_points: usize) -> Result<(LoadedTable, Warnings)> {
    let lines: Vec<&str> = text.lines().filter(|l| !is_comment(l)).collect();
    let first = lines.first().ok_or(ViewsError::EmptyTable { required: 2 })?;
    let delimiter = detect_delimiter(first);

    // Runs of blanks collapse to a single tab so the csv reader sees one
    // field separator between values.
    let normalized: String = match delimiter {
        Delimiter::Whitespace => lines
            .iter()
            .map(|l| l.split_whitespace().collect::<Vec<_>>().join("\t"))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => lines.join("\n"),
    };
    let byte = match delimiter {
        Delimiter::Comma => b',',
        Delimiter::Tab | Delimiter::Whitespace => b'\t',
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(byte)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(normalized.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }
    build_table(rows.into_iter().map(Row::Text), max_points)
}

fn load_spreadsheet(path: &Path, max_points: usize) -> Result<(LoadedTable, Warnings)> {
    use calamine::{open_workbook_auto, Data, Reader};

    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ViewsError::Spreadsheet("No sheets found".to_string()))?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let rows = range.rows().map(|row| {
        Row::Cells(
            row.iter()
                .map(|cell| match cell {
                    Data::Float(f) => Cell::Number(*f),
                    Data::Int(i) => Cell::Number(*i as f64),
                    Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
                    Data::String(s) => Cell::Text(s.clone()),
                    Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
                    Data::DateTime(dt) => Cell::Number(dt.as_f64()),
                    Data::Empty | Data::Error(_) => Cell::Text(String::new()),
                })
                .collect(),
        )
    });
    build_table(rows, max_points)
}

enum Cell {
    Number(f64),
    Text(String),
}

enum Row {
    Text(Vec<String>),
    Cells(Vec<Cell>),
}

impl Row {
    fn into_cells(self) -> Vec<Cell> {
        match self {
            Row::Text(fields) => fields.into_iter().map(Cell::Text).collect(),
            Row::Cells(cells) => cells,
        }
    }
}

fn parse_cell(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(v) => Some(*v),
        Cell::Text(s) => s.trim().parse::<f64>().ok(),
    }
}

fn cell_label(cell: &Cell, index: usize) -> String {
    match cell {
        Cell::Text(s) if !s.trim().is_empty() => s.trim().to_string(),
        Cell::Number(v) => v.to_string(),
        _ => format!("var_{index}"),
    }
}

/// Turn raw rows into columns. The first row is a header when any of its
/// cells is not a number.
fn build_table(rows: impl Iterator<Item = Row>, max_points: usize) -> Result<(LoadedTable, Warnings)> {
    let mut warnings = Warnings::new();
    let mut rows = rows.map(Row::into_cells).filter(|cells| !cells.is_empty());

    let first = rows.next().ok_or(ViewsError::EmptyTable { required: 2 })?;
    let header_values: Vec<Option<f64>> = first.iter().map(parse_cell).collect();
    let is_header = header_values.iter().any(|v| v.is_none());
    let ncols = first.len();

    let labels: Vec<String> = if is_header {
        first
            .iter()
            .enumerate()
            .map(|(i, c)| cell_label(c, i))
            .collect()
    } else {
        (0..ncols).map(|i| format!("var_{i}")).collect()
    };

    let mut columns: Vec<Vec<f32>> = vec![Vec::new(); ncols];
    let mut skipped = 0usize;
    if !is_header && !push_row(&header_values, ncols, &mut columns) {
        skipped += 1;
    }

    for cells in rows {
        if max_points > 0 && columns[0].len() >= max_points {
            warnings.push(format!("Stopped reading after {max_points} rows"));
            break;
        }
        let values: Vec<Option<f64>> = cells.iter().map(parse_cell).collect();
        if !push_row(&values, ncols, &mut columns) {
            skipped += 1;
        }
    }

    if skipped > 0 {
        warnings.push(format!("Skipped {skipped} rows with missing or non-numeric values"));
    }
    tracing::info!(
        "Parsed {} rows x {} columns ({} skipped)",
        columns.first().map(|c| c.len()).unwrap_or(0),
        ncols,
        skipped
    );

    Ok((LoadedTable { labels, columns }, warnings))
}

/// Append one row if every one of its first `ncols` values is finite.
fn push_row(values: &[Option<f64>], ncols: usize, columns: &mut [Vec<f32>]) -> bool {
    if values.len() < ncols {
        return false;
    }
    let mut parsed = Vec::with_capacity(ncols);
    for v in &values[..ncols] {
        match v {
            Some(x) if x.is_finite() && (*x as f32).is_finite() => parsed.push(*x as f32),
            _ => return false,
        }
    }
    for (col, v) in columns.iter_mut().zip(parsed) {
        col.push(v);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_csv_with_header() {
        let (table, warnings) = parse_delimited("mass,radius\n1,2\n3,4\n5,6\n", 0).unwrap();
        assert_eq!(table.labels, vec!["mass", "radius"]);
        assert_eq!(table.columns[0], vec![1.0, 3.0, 5.0]);
        assert_eq!(table.columns[1], vec![2.0, 4.0, 6.0]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_parse_whitespace_without_header() {
        let text = "# comment line\n1   2  3\n4 5     6\n! another comment\n7 8 9\n";
        let (table, _) = parse_delimited(text, 0).unwrap();
        assert_eq!(table.labels, vec!["var_0", "var_1", "var_2"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.columns[2], vec![3.0, 6.0, 9.0]);
    }

    #[test]
    fn test_bad_rows_skipped_with_warning() {
        let text = "a\tb\n1\t2\nfoo\t3\n4\tnan\n5\t6\n";
        let (table, warnings) = parse_delimited(text, 0).unwrap();
        assert_eq!(table.columns[0], vec![1.0, 5.0]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_max_points_limit() {
        let text = "x,y\n1,1\n2,2\n3,3\n4,4\n";
        let (table, warnings) = parse_delimited(text, 2).unwrap();
        assert_eq!(table.row_count(), 2);
        assert!(!warnings.is_empty());
    }

    #[test]
    fn test_load_file_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("points.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "u,v").unwrap();
        writeln!(f, "0.5,1.5").unwrap();
        writeln!(f, "2.5,3.5").unwrap();
        drop(f);

        let (table, _) = load_file(&path, 0).unwrap();
        assert_eq!(table.labels, vec!["u", "v"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_file(Path::new("data.parquet"), 0).unwrap_err();
        assert!(matches!(err, ViewsError::UnsupportedFormat { .. }));
    }
}
