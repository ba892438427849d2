//! File change outlier pipeline: history → frequency count → median
//! deviation → write.

use std::path::PathBuf;

use churnlens_core::{ChurnError, CountTable, FilesConfig, Stage};
use churnlens_outliers::{detect_outliers, OutlierPolicy, OutlierReport};
use serde::Serialize;
use tracing::info;

use crate::counting::count_file_changes;
use crate::mining::HistorySource;

/// Header of the written outlier table.
pub const OUTPUT_HEADERS: [&str; 2] = ["File", "Total Changes"];

/// Settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct FileOutlierOptions {
    /// Allowed distance from the median, in standard deviations.
    pub threshold: f64,
    /// Output CSV path.
    pub output: PathBuf,
}

impl From<&FilesConfig> for FileOutlierOptions {
    fn from(config: &FilesConfig) -> Self {
        Self {
            threshold: config.threshold,
            output: config.output.clone(),
        }
    }
}

/// Change counts and the outliers among them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysis {
    /// Touched-file entries read from history, blanks included.
    pub entries: usize,
    /// One record per file.
    pub counts: CountTable,
    /// Median-deviation outliers among `counts`.
    pub report: OutlierReport,
}

/// Count changes per file and flag outliers. Performs no writes.
///
/// # Errors
///
/// Returns [`ChurnError::InvalidInput`] when the history lists no files,
/// plus whatever `source` fails with.
///
/// # Examples
///
/// ```
/// use churnlens_gitpulse::pipeline::analyze_history;
/// use churnlens_outliers::OutlierPolicy;
///
/// let history: Vec<String> = ["A", "B", "C", "D"]
///     .iter()
///     .chain(std::iter::repeat(&"D").take(49))
///     .map(|s| s.to_string())
///     .collect();
/// let analysis = analyze_history(&history, &OutlierPolicy::median_deviation(3.0).unwrap()).unwrap();
/// assert_eq!(analysis.counts.get("D"), Some(50));
/// assert!(analysis.report.is_empty());
/// ```
pub fn analyze_history<S>(source: &S, policy: &OutlierPolicy) -> Result<FileAnalysis, ChurnError>
where
    S: HistorySource + ?Sized,
{
    let touched = source.touched_files()?;
    let entries = touched.len();
    let counts = count_file_changes(&touched);
    if counts.is_empty() {
        return Err(ChurnError::InvalidInput(
            "history contains no file changes".into(),
        ));
    }
    let report = detect_outliers(&counts, policy);
    Ok(FileAnalysis {
        entries,
        counts,
        report,
    })
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutlierRun {
    /// Where the outlier table was written.
    pub output: PathBuf,
    /// Touched-file entries read from history.
    pub entries: usize,
    /// Distinct files.
    pub files: usize,
    /// Detection outcome.
    pub report: OutlierReport,
}

/// Run the whole pipeline against `source`.
///
/// # Errors
///
/// - [`Stage::Detection`] for an invalid threshold
/// - [`Stage::Extraction`] when history cannot be read or is empty
/// - [`Stage::Writing`] when the output cannot be written
///
/// # Examples
///
/// ```
/// use churnlens_gitpulse::mining::NameOnlyLog;
/// use churnlens_gitpulse::pipeline::{run_file_outliers, FileOutlierOptions};
///
/// let dir = tempfile::tempdir().unwrap();
/// let options = FileOutlierOptions {
///     threshold: 3.0,
///     output: dir.path().join("file_outliers.csv"),
/// };
/// let log = NameOnlyLog::new("a.rs\nb.rs\n\na.rs\n");
/// let run = run_file_outliers(&log, &options).unwrap();
/// assert_eq!(run.files, 2);
/// assert!(options.output.exists());
/// ```
pub fn run_file_outliers<S>(
    source: &S,
    options: &FileOutlierOptions,
) -> Result<FileOutlierRun, ChurnError>
where
    S: HistorySource + ?Sized,
{
    let policy = OutlierPolicy::median_deviation(options.threshold)
        .map_err(|e| e.at(Stage::Detection))?;

    let analysis = analyze_history(source, &policy).map_err(|e| e.at(Stage::Extraction))?;

    analysis
        .report
        .to_table()
        .write_csv(&options.output, OUTPUT_HEADERS)
        .map_err(|e| e.at(Stage::Writing))?;

    info!(
        flagged = analysis.report.len(),
        output = %options.output.display(),
        "wrote file change outliers"
    );

    Ok(FileOutlierRun {
        output: options.output.clone(),
        entries: analysis.entries,
        files: analysis.counts.len(),
        report: analysis.report,
    })
}
