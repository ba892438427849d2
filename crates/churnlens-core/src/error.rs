use std::fmt;
use std::path::PathBuf;

/// Pipeline stage an error surfaced in.
///
/// # Examples
///
/// ```
/// use churnlens_core::Stage;
///
/// assert_eq!(Stage::Extraction.to_string(), "extraction");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the raw input table or commit history.
    Extraction,
    /// Computing statistics and flagging outliers.
    Detection,
    /// Writing the output or intermediate artifacts.
    Writing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Extraction => write!(f, "extraction"),
            Stage::Detection => write!(f, "detection"),
            Stage::Writing => write!(f, "writing"),
        }
    }
}

/// Errors that can occur across churnlens.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary reports it through `miette` at the boundary.
///
/// # Examples
///
/// ```
/// use churnlens_core::ChurnError;
///
/// let err = ChurnError::InvalidInput("row 3: count is empty".into());
/// assert!(err.to_string().contains("row 3"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ChurnError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(churnlens::io))]
    Io(#[from] std::io::Error),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    #[diagnostic(code(churnlens::config), help("check .churnlens.toml and the command-line flags"))]
    Config(String),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(churnlens::toml))]
    Toml(#[from] toml::de::Error),

    /// Git operation failure.
    #[error("git error: {0}")]
    #[diagnostic(code(churnlens::git))]
    Git(String),

    /// Input table or history is missing, empty, or malformed.
    #[error("invalid input: {0}")]
    #[diagnostic(code(churnlens::input))]
    InvalidInput(String),

    /// CSV reading or writing failure.
    #[error("CSV error: {0}")]
    #[diagnostic(code(churnlens::csv))]
    Csv(#[from] csv::Error),

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(churnlens::serialization))]
    Serialization(#[from] serde_json::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    #[diagnostic(code(churnlens::not_found))]
    FileNotFound(PathBuf),

    /// An error tagged with the pipeline stage that produced it.
    #[error("{stage} failed: {source}")]
    #[diagnostic(code(churnlens::stage))]
    Stage {
        /// Stage that failed.
        stage: Stage,
        /// Underlying cause.
        #[source]
        source: Box<ChurnError>,
    },
}

impl ChurnError {
    /// Tag this error with the stage it occurred in.
    ///
    /// Already-tagged errors keep their original stage.
    ///
    /// # Examples
    ///
    /// ```
    /// use churnlens_core::{ChurnError, Stage};
    ///
    /// let err = ChurnError::InvalidInput("no data rows".into()).at(Stage::Extraction);
    /// assert_eq!(err.stage(), Some(Stage::Extraction));
    /// assert_eq!(err.to_string(), "extraction failed: invalid input: no data rows");
    /// ```
    pub fn at(self, stage: Stage) -> Self {
        match self {
            tagged @ ChurnError::Stage { .. } => tagged,
            other => ChurnError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage this error was tagged with, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ChurnError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
