//! Line outlier pipeline: extract → dedup → max-per-line → z-score → write.

use std::path::{Path, PathBuf};

use churnlens_core::{ChurnError, LinesConfig, Stage};
use churnlens_outliers::{detect_outliers, OutlierPolicy, OutlierReport};
use serde::Serialize;
use tracing::{debug, info};

use crate::extract::{self, ColumnNames, RawRow};
use crate::reduce;

/// File name of the deduplicated rows artifact.
pub const UNIQUE_ROWS_FILE: &str = "unique_rows.csv";
/// File name of the max-per-line artifact.
pub const HIGHEST_COUNTS_FILE: &str = "highest_counts.csv";

/// Settings for one pipeline run.
///
/// # Examples
///
/// ```
/// use churnlens_core::LinesConfig;
/// use churnlens_lines::pipeline::LineOutlierOptions;
///
/// let options = LineOutlierOptions::from(&LinesConfig::default());
/// assert_eq!(options.threshold, 3.0);
/// assert!(options.artifacts_dir.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct LineOutlierOptions {
    /// Input column headers.
    pub columns: ColumnNames,
    /// Z-score magnitude above which a line is flagged.
    pub threshold: f64,
    /// Output CSV path.
    pub output: PathBuf,
    /// Where to write intermediate tables, if anywhere.
    pub artifacts_dir: Option<PathBuf>,
}

impl From<&LinesConfig> for LineOutlierOptions {
    fn from(config: &LinesConfig) -> Self {
        Self {
            columns: ColumnNames::from(config),
            threshold: config.threshold,
            output: config.output.clone(),
            artifacts_dir: config.artifacts_dir.clone(),
        }
    }
}

/// In-memory result of reduction and detection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineAnalysis {
    /// Number of rows read.
    pub rows_read: usize,
    /// Rows after exact-duplicate removal.
    pub unique: Vec<RawRow>,
    /// One row per line, carrying its highest count.
    pub highest: Vec<RawRow>,
    /// Z-score outliers among `highest`.
    pub report: OutlierReport,
}

/// Reduce `rows` and flag outliers. Pure; performs no I/O.
///
/// # Examples
///
/// ```
/// use churnlens_lines::extract::RawRow;
/// use churnlens_lines::pipeline::analyze;
/// use churnlens_outliers::OutlierPolicy;
///
/// let rows = vec![
///     RawRow::new(1, "L1", 5),
///     RawRow::new(2, "L1", 9),
///     RawRow::new(3, "L2", 2),
///     RawRow::new(4, "L2", 2),
///     RawRow::new(5, "L3", 100),
/// ];
/// let analysis = analyze(rows, &OutlierPolicy::z_score(3.0).unwrap());
/// assert_eq!(analysis.unique.len(), 4);
/// assert_eq!(analysis.highest.len(), 3);
/// assert!(analysis.report.is_empty());
/// ```
pub fn analyze(rows: Vec<RawRow>, policy: &OutlierPolicy) -> LineAnalysis {
    let rows_read = rows.len();
    let unique = reduce::remove_duplicates(rows);
    let highest = reduce::keep_max_per_key(unique.clone());
    debug!(
        rows_read,
        unique = unique.len(),
        lines = highest.len(),
        "reduced line table"
    );
    let report = detect_outliers(&extract::to_table(&highest), policy);
    LineAnalysis {
        rows_read,
        unique,
        highest,
        report,
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineOutlierRun {
    /// Input table path.
    pub input: PathBuf,
    /// Where the outlier table was written.
    pub output: PathBuf,
    /// Rows read from the input.
    pub rows_read: usize,
    /// Rows left after dedup.
    pub unique_rows: usize,
    /// Distinct lines.
    pub lines: usize,
    /// Artifact files written, if any.
    pub artifacts: Vec<PathBuf>,
    /// Detection outcome.
    pub report: OutlierReport,
}

/// Run the whole pipeline against the CSV at `input`.
///
/// Every error is tagged with the [`Stage`] it occurred in.
///
/// # Errors
///
/// - [`Stage::Detection`] for an invalid threshold
/// - [`Stage::Extraction`] for a missing or malformed input table
/// - [`Stage::Writing`] when the output or an artifact cannot be written
///
/// # Examples
///
/// ```
/// use churnlens_core::LinesConfig;
/// use churnlens_lines::pipeline::{run_line_outliers, LineOutlierOptions};
///
/// let dir = tempfile::tempdir().unwrap();
/// let input = dir.path().join("input.csv");
/// std::fs::write(&input, "Line Number,Modification Count\nL1,5\nL1,9\nL2,2\n").unwrap();
///
/// let mut options = LineOutlierOptions::from(&LinesConfig::default());
/// options.output = dir.path().join("outlier_lines.csv");
///
/// let run = run_line_outliers(&input, &options).unwrap();
/// assert_eq!(run.lines, 2);
/// assert!(options.output.exists());
/// ```
pub fn run_line_outliers(
    input: &Path,
    options: &LineOutlierOptions,
) -> Result<LineOutlierRun, ChurnError> {
    let policy =
        OutlierPolicy::z_score(options.threshold).map_err(|e| e.at(Stage::Detection))?;

    let rows = extract::read_rows_from_path(input, &options.columns)
        .map_err(|e| e.at(Stage::Extraction))?;

    let analysis = analyze(rows, &policy);

    let headers = options.columns.headers();
    let mut artifacts = Vec::new();
    if let Some(dir) = &options.artifacts_dir {
        let unique_path = dir.join(UNIQUE_ROWS_FILE);
        extract::to_table(&analysis.unique)
            .write_csv(&unique_path, headers)
            .map_err(|e| e.at(Stage::Writing))?;
        artifacts.push(unique_path);

        let highest_path = dir.join(HIGHEST_COUNTS_FILE);
        extract::to_table(&analysis.highest)
            .write_csv(&highest_path, headers)
            .map_err(|e| e.at(Stage::Writing))?;
        artifacts.push(highest_path);
    }

    analysis
        .report
        .to_table()
        .write_csv(&options.output, headers)
        .map_err(|e| e.at(Stage::Writing))?;

    info!(
        flagged = analysis.report.len(),
        output = %options.output.display(),
        "wrote line outliers"
    );

    Ok(LineOutlierRun {
        input: input.to_path_buf(),
        output: options.output.clone(),
        rows_read: analysis.rows_read,
        unique_rows: analysis.unique.len(),
        lines: analysis.highest.len(),
        artifacts,
        report: analysis.report,
    })
}
