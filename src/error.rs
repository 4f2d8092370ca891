//! Error types for OxideViews.
//!
//! Hard failures (unreadable files, malformed tables, bad configuration)
//! are `ViewsError`s. Recoverable conditions that should only be reported
//! to the user go into a [`Warnings`] collector instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewsError {
    #[error("Failed to access file: {0}")]
    FileIo(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported file format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("Table is empty or has fewer than {required} usable rows")]
    EmptyTable { required: usize },

    #[error("Column '{label}' has {actual} rows, expected {expected}")]
    RaggedTable {
        label: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid column index: {index} (available: {max})")]
    ColumnOutOfRange { index: usize, max: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ViewsError>;

impl From<calamine::Error> for ViewsError {
    fn from(e: calamine::Error) -> Self {
        ViewsError::Spreadsheet(e.to_string())
    }
}

impl ViewsError {
    /// Message suitable for the status bar or an error window.
    pub fn user_message(&self) -> String {
        match self {
            ViewsError::FileIo(e) => format!("File error: {e}"),
            ViewsError::Csv(e) => format!("Could not parse delimited file: {e}"),
            ViewsError::Spreadsheet(msg) => format!("Could not read spreadsheet: {msg}"),
            ViewsError::Json(e) => format!("Invalid configuration file: {e}"),
            ViewsError::UnsupportedFormat { extension } => {
                format!("Unsupported file format: '.{extension}'")
            }
            ViewsError::EmptyTable { required } => {
                format!("Not enough data: at least {required} rows are needed")
            }
            ViewsError::RaggedTable {
                label,
                expected,
                actual,
            } => format!("Column '{label}' has {actual} values but the table has {expected} rows"),
            ViewsError::ColumnOutOfRange { index, max } => {
                format!("Column index {index} out of range (max: {max})")
            }
            ViewsError::Config(msg) => format!("Config error: {msg}"),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ViewsError::FileIo(_) => "File Error",
            ViewsError::Csv(_) | ViewsError::Spreadsheet(_) => "Parse Error",
            ViewsError::Json(_) | ViewsError::Config(_) => "Configuration Error",
            ViewsError::UnsupportedFormat { .. } => "Unsupported Format",
            ViewsError::EmptyTable { .. } => "Empty Table",
            ViewsError::RaggedTable { .. } => "Malformed Table",
            ViewsError::ColumnOutOfRange { .. } => "Invalid Column",
        }
    }
}

/// Recoverable conditions collected during an operation and surfaced as a
/// single message string. Duplicates are dropped so a per-frame condition
/// is only reported once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Warnings {
    items: Vec<String>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        if !self.items.contains(&warning) {
            tracing::warn!("{warning}");
            self.items.push(warning);
        }
    }

    pub fn extend(&mut self, other: Warnings) {
        for w in other.items {
            self.push(w);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|s| s.as_str())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// All warnings joined into one line, or `None` when there are none.
    pub fn message(&self) -> Option<String> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ViewsError::ColumnOutOfRange { index: 7, max: 3 };
        assert_eq!(err.user_message(), "Column index 7 out of range (max: 3)");
        assert_eq!(err.title(), "Invalid Column");

        let err = ViewsError::UnsupportedFormat {
            extension: "parquet".to_string(),
        };
        assert_eq!(err.user_message(), "Unsupported file format: '.parquet'");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ViewsError = io_err.into();
        assert!(matches!(err, ViewsError::FileIo(_)));
    }

    #[test]
    fn test_warnings_join_and_dedup() {
        let mut w = Warnings::new();
        assert_eq!(w.message(), None);
        w.push("log10: nonpositive values");
        w.push("log10: nonpositive values");
        w.push("column 'flag' is constant");
        assert_eq!(w.len(), 2);
        assert_eq!(
            w.message().as_deref(),
            Some("log10: nonpositive values; column 'flag' is constant")
        );
    }
}
