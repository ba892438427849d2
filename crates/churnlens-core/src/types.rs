use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChurnError;

/// A key (line identifier or file path) paired with a count.
///
/// # Examples
///
/// ```
/// use churnlens_core::CountRecord;
///
/// let record = CountRecord::new("src/main.rs", 12);
/// assert_eq!(record.key, "src/main.rs");
/// assert_eq!(record.count, 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountRecord {
    /// Line identifier or file path.
    pub key: String,
    /// Number of modifications or commits.
    pub count: u64,
}

impl CountRecord {
    /// Create a record from anything string-like.
    pub fn new(key: impl Into<String>, count: u64) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// An ordered table of [`CountRecord`]s.
///
/// Insertion order is preserved and is the order outliers are reported in.
///
/// # Examples
///
/// ```
/// use churnlens_core::{CountRecord, CountTable};
///
/// let table: CountTable = vec![CountRecord::new("a", 1), CountRecord::new("b", 4)]
///     .into_iter()
///     .collect();
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.counts(), vec![1.0, 4.0]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountTable {
    records: Vec<CountRecord>,
}

impl CountTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn push(&mut self, record: CountRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CountRecord> {
        self.records.iter()
    }

    /// Keys in table order.
    pub fn keys(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.key.as_str()).collect()
    }

    /// Counts in table order, as floats for statistics.
    pub fn counts(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.count as f64).collect()
    }

    /// Look up the count for `key`.
    pub fn get(&self, key: &str) -> Option<u64> {
        self.records.iter().find(|r| r.key == key).map(|r| r.count)
    }

    /// Write the table as a two-column CSV with the given header.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Io`] if the parent directory cannot be created and
    /// [`ChurnError::Csv`] if the file cannot be written.
    ///
    /// # Examples
    ///
    /// ```
    /// use churnlens_core::{CountRecord, CountTable};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let path = dir.path().join("out.csv");
    /// let table: CountTable = vec![CountRecord::new("a.rs", 3)].into_iter().collect();
    /// table.write_csv(&path, ["File", "Total Changes"]).unwrap();
    /// let written = std::fs::read_to_string(&path).unwrap();
    /// assert_eq!(written, "File,Total Changes\na.rs,3\n");
    /// ```
    pub fn write_csv(&self, path: &Path, headers: [&str; 2]) -> Result<(), ChurnError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(headers)?;
        for record in &self.records {
            let count = record.count.to_string();
            writer.write_record([record.key.as_str(), count.as_str()])?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl FromIterator<CountRecord> for CountTable {
    fn from_iter<I: IntoIterator<Item = CountRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CountTable {
    type Item = CountRecord;
    type IntoIter = std::vec::IntoIter<CountRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a CountTable {
    type Item = &'a CountRecord;
    type IntoIter = std::slice::Iter<'a, CountRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Output format for the stdout summary.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use churnlens_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
