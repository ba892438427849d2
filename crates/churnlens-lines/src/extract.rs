//! CSV extraction of per-line modification counts.
//!
//! Reads a headed CSV table, locates the configured line and count columns,
//! and yields one [`RawRow`] per data row. Extra columns are ignored and no
//! deduplication happens here.

use std::io::Read;
use std::path::Path;

use churnlens_core::{ChurnError, CountRecord, CountTable, LinesConfig};
use serde::Serialize;
use tracing::debug;

/// Header names of the two columns the extractor needs.
///
/// # Examples
///
/// ```
/// use churnlens_lines::extract::ColumnNames;
///
/// let columns = ColumnNames::default();
/// assert_eq!(columns.key, "Line Number");
/// assert_eq!(columns.count, "Modification Count");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    /// Line identifier column.
    pub key: String,
    /// Modification count column.
    pub count: String,
}

impl ColumnNames {
    pub fn new(key: impl Into<String>, count: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            count: count.into(),
        }
    }

    /// Header pair for writing tables back out.
    pub fn headers(&self) -> [&str; 2] {
        [self.key.as_str(), self.count.as_str()]
    }
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self::from(&LinesConfig::default())
    }
}

impl From<&LinesConfig> for ColumnNames {
    fn from(config: &LinesConfig) -> Self {
        Self::new(config.key_column.clone(), config.count_column.clone())
    }
}

/// One data row of the input table.
///
/// # Examples
///
/// ```
/// use churnlens_lines::extract::RawRow;
///
/// let row = RawRow::new(1, "L1", 5);
/// assert_eq!(row.to_record().count, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRow {
    /// 1-based data row number in the source (header excluded).
    pub row: usize,
    /// Line identifier.
    pub line: String,
    /// Modification count.
    pub count: u64,
}

impl RawRow {
    pub fn new(row: usize, line: impl Into<String>, count: u64) -> Self {
        Self {
            row,
            line: line.into(),
            count,
        }
    }

    pub fn to_record(&self) -> CountRecord {
        CountRecord::new(self.line.clone(), self.count)
    }
}

/// Collect rows into a [`CountTable`], keeping their order.
pub fn to_table(rows: &[RawRow]) -> CountTable {
    rows.iter().map(RawRow::to_record).collect()
}

/// Read rows from any CSV source.
///
/// # Errors
///
/// Returns [`ChurnError::InvalidInput`] when a configured column is missing,
/// a row has an empty line identifier, a count is not a non-negative
/// integer, or the table has no data rows. Returns [`ChurnError::Csv`] for
/// structurally broken CSV.
///
/// # Examples
///
/// ```
/// use churnlens_lines::extract::{read_rows, ColumnNames};
///
/// let csv = "Line Number,Modification Count\nL1,5\nL2, 7\n";
/// let rows = read_rows(csv.as_bytes(), &ColumnNames::default()).unwrap();
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[1].count, 7);
/// ```
pub fn read_rows<R: Read>(reader: R, columns: &ColumnNames) -> Result<Vec<RawRow>, ChurnError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let key_idx = column_index(&headers, &columns.key)?;
    let count_idx = column_index(&headers, &columns.count)?;

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let row = i + 1;

        let line = record.get(key_idx).unwrap_or("");
        if line.is_empty() {
            return Err(ChurnError::InvalidInput(format!(
                "row {row}: missing value for column '{}'",
                columns.key
            )));
        }

        let raw_count = record.get(count_idx).unwrap_or("");
        let count = parse_count(raw_count).ok_or_else(|| {
            ChurnError::InvalidInput(format!(
                "row {row}: column '{}' must be a non-negative integer, got '{raw_count}'",
                columns.count
            ))
        })?;

        rows.push(RawRow::new(row, line, count));
    }

    if rows.is_empty() {
        return Err(ChurnError::InvalidInput("no data rows".into()));
    }

    debug!(rows = rows.len(), "read line modification rows");
    Ok(rows)
}

/// Read rows from a CSV file at `path`.
///
/// # Errors
///
/// Returns [`ChurnError::FileNotFound`] if `path` does not exist, plus
/// everything [`read_rows`] returns.
pub fn read_rows_from_path(path: &Path, columns: &ColumnNames) -> Result<Vec<RawRow>, ChurnError> {
    if !path.exists() {
        return Err(ChurnError::FileNotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    read_rows(file, columns)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, ChurnError> {
    headers.iter().position(|h| h == name).ok_or_else(|| {
        let found: Vec<&str> = headers.iter().collect();
        ChurnError::InvalidInput(format!(
            "missing column '{name}' (found: {})",
            found.join(", ")
        ))
    })
}

// Integral floats like "5.0" are accepted; spreadsheets export them.
fn parse_count(raw: &str) -> Option<u64> {
    if let Ok(n) = raw.parse::<u64>() {
        return Some(n);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}
