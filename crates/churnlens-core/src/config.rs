use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ChurnError;

/// Default outlier sensitivity, in standard deviations.
pub const DEFAULT_THRESHOLD: f64 = 3.0;

/// Top-level configuration loaded from `.churnlens.toml`.
///
/// Supports layered resolution: CLI flags > config file > defaults.
///
/// # Examples
///
/// ```
/// use churnlens_core::ChurnConfig;
///
/// let config = ChurnConfig::default();
/// assert_eq!(config.lines.threshold, 3.0);
/// assert_eq!(config.files.threshold, 3.0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChurnConfig {
    /// Line modification outlier settings.
    #[serde(default)]
    pub lines: LinesConfig,
    /// File change outlier settings.
    #[serde(default)]
    pub files: FilesConfig,
}

impl ChurnConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Io`] if the file cannot be read, or
    /// [`ChurnError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use churnlens_core::ChurnConfig;
    /// use std::path::Path;
    ///
    /// let config = ChurnConfig::from_file(Path::new(".churnlens.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, ChurnError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use churnlens_core::ChurnConfig;
    ///
    /// let toml = r#"
    /// [files]
    /// threshold = 2.5
    /// "#;
    /// let config = ChurnConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.files.threshold, 2.5);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, ChurnError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Settings for the line modification pipeline.
///
/// # Examples
///
/// ```
/// use churnlens_core::LinesConfig;
///
/// let config = LinesConfig::default();
/// assert_eq!(config.key_column, "Line Number");
/// assert_eq!(config.count_column, "Modification Count");
/// assert!(config.artifacts_dir.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinesConfig {
    /// Header of the line identifier column.
    #[serde(default = "default_key_column")]
    pub key_column: String,
    /// Header of the modification count column.
    #[serde(default = "default_count_column")]
    pub count_column: String,
    /// Z-score magnitude above which a line is an outlier (default: 3.0).
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Where the outlier table is written.
    #[serde(default = "default_lines_output")]
    pub output: PathBuf,
    /// Directory for `unique_rows.csv` and `highest_counts.csv`, if wanted.
    pub artifacts_dir: Option<PathBuf>,
}

fn default_key_column() -> String {
    "Line Number".into()
}

fn default_count_column() -> String {
    "Modification Count".into()
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_lines_output() -> PathBuf {
    PathBuf::from("outlier_lines.csv")
}

impl Default for LinesConfig {
    fn default() -> Self {
        Self {
            key_column: default_key_column(),
            count_column: default_count_column(),
            threshold: default_threshold(),
            output: default_lines_output(),
            artifacts_dir: None,
        }
    }
}

/// Settings for the git file change pipeline.
///
/// # Examples
///
/// ```
/// use churnlens_core::FilesConfig;
///
/// let config = FilesConfig::default();
/// assert_eq!(config.output.to_str(), Some("file_outliers.csv"));
/// assert!(config.since_days.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Multiple of the standard deviation a file's change count may sit
    /// from the median before it is flagged (default: 3.0).
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Where the outlier table is written.
    #[serde(default = "default_files_output")]
    pub output: PathBuf,
    /// Only count commits from the last N days. Whole history when unset.
    pub since_days: Option<u64>,
    /// Branch to walk instead of `HEAD`.
    pub branch: Option<String>,
    /// Skip commits touching more files than this.
    pub max_files_per_commit: Option<usize>,
}

fn default_files_output() -> PathBuf {
    PathBuf::from("file_outliers.csv")
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            output: default_files_output(),
            since_days: None,
            branch: None,
            max_files_per_commit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = ChurnConfig::default();
        assert_eq!(config.lines.key_column, "Line Number");
        assert_eq!(config.lines.count_column, "Modification Count");
        assert_eq!(config.lines.threshold, 3.0);
        assert_eq!(config.lines.output, PathBuf::from("outlier_lines.csv"));
        assert!(config.lines.artifacts_dir.is_none());
        assert_eq!(config.files.threshold, 3.0);
        assert_eq!(config.files.output, PathBuf::from("file_outliers.csv"));
        assert!(config.files.branch.is_none());
        assert!(config.files.max_files_per_commit.is_none());
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[lines]
key_column = "line"
count_column = "mods"
threshold = 2.0
output = "out/lines.csv"
artifacts_dir = "out"

[files]
threshold = 4.0
output = "out/files.csv"
since_days = 90
branch = "main"
max_files_per_commit = 50
"#;
        let config = ChurnConfig::from_toml(toml).unwrap();
        assert_eq!(config.lines.key_column, "line");
        assert_eq!(config.lines.count_column, "mods");
        assert_eq!(config.lines.threshold, 2.0);
        assert_eq!(config.lines.artifacts_dir, Some(PathBuf::from("out")));
        assert_eq!(config.files.threshold, 4.0);
        assert_eq!(config.files.since_days, Some(90));
        assert_eq!(config.files.branch.as_deref(), Some("main"));
        assert_eq!(config.files.max_files_per_commit, Some(50));
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ChurnConfig::from_toml("").unwrap();
        assert_eq!(config.lines.threshold, 3.0);
        assert_eq!(config.files.output, PathBuf::from("file_outliers.csv"));
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = ChurnConfig::from_toml("[lines]\nthreshold = 1.5\n").unwrap();
        assert_eq!(config.lines.threshold, 1.5);
        assert_eq!(config.lines.key_column, "Line Number");
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = ChurnConfig::from_toml("{{invalid}}");
        assert!(matches!(result, Err(ChurnError::Toml(_))));
    }

    #[test]
    fn from_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".churnlens.toml");
        std::fs::write(&path, "[files]\nsince_days = 30\n").unwrap();
        let config = ChurnConfig::from_file(&path).unwrap();
        assert_eq!(config.files.since_days, Some(30));
    }
}
