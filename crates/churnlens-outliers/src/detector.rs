//! Threshold-based outlier detection over a [`CountTable`].
//!
//! One detector serves both pipelines. The policy picks the center (mean for
//! z-scores, median for change counts); the spread is always the population
//! standard deviation. A zero spread never flags anything.

use churnlens_core::{ChurnError, CountRecord, CountTable, DEFAULT_THRESHOLD};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::stats;

/// Central tendency the deviation is measured from.
///
/// # Examples
///
/// ```
/// use churnlens_outliers::detector::Center;
///
/// assert_eq!(serde_json::to_string(&Center::Median).unwrap(), "\"median\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Center {
    /// Arithmetic mean; the flag test is `|(c - mean) / sigma| > threshold`.
    Mean,
    /// Median; the flag test is `|c - median| > threshold * sigma`.
    Median,
}

/// Which center to use and how many spreads away counts as an outlier.
///
/// # Examples
///
/// ```
/// use churnlens_outliers::detector::{Center, OutlierPolicy};
///
/// let policy = OutlierPolicy::z_score(3.0).unwrap();
/// assert_eq!(policy.center(), Center::Mean);
/// assert!(OutlierPolicy::median_deviation(-1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierPolicy {
    center: Center,
    threshold: f64,
}

impl OutlierPolicy {
    /// Build a policy.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Config`] if `threshold` is negative or not finite.
    pub fn new(center: Center, threshold: f64) -> Result<Self, ChurnError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ChurnError::Config(format!(
                "threshold must be a non-negative number, got {threshold}"
            )));
        }
        Ok(Self { center, threshold })
    }

    /// Mean-centered z-score policy used for line modification counts.
    pub fn z_score(threshold: f64) -> Result<Self, ChurnError> {
        Self::new(Center::Mean, threshold)
    }

    /// Median-centered policy used for file change counts.
    pub fn median_deviation(threshold: f64) -> Result<Self, ChurnError> {
        Self::new(Center::Median, threshold)
    }

    pub fn center(&self) -> Center {
        self.center
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether `count` is an outlier given the distribution `summary`.
    pub fn is_outlier(&self, count: f64, summary: &Summary) -> bool {
        if !summary.has_spread() {
            return false;
        }
        match self.center {
            Center::Mean => ((count - summary.center) / summary.spread).abs() > self.threshold,
            Center::Median => (count - summary.center).abs() > self.threshold * summary.spread,
        }
    }
}

impl Default for OutlierPolicy {
    fn default() -> Self {
        Self {
            center: Center::Mean,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Center and spread of a count distribution.
///
/// # Examples
///
/// ```
/// use churnlens_outliers::detector::{Center, Summary};
///
/// let summary = Summary::compute(&[1.0, 1.0, 1.0, 50.0], Center::Median);
/// assert_eq!(summary.n, 4);
/// assert_eq!(summary.center, 1.0);
/// assert!((summary.spread - 21.22).abs() < 0.01);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Number of values.
    pub n: usize,
    /// Mean or median, per the policy.
    pub center: f64,
    /// Population standard deviation.
    pub spread: f64,
}

impl Summary {
    /// Compute the summary of `values`. An empty sample yields zeros.
    pub fn compute(values: &[f64], center: Center) -> Self {
        let Some(mean) = stats::mean(values) else {
            return Self {
                n: 0,
                center: 0.0,
                spread: 0.0,
            };
        };
        let spread = stats::population_std_dev(values, mean).unwrap_or(0.0);
        let center = match center {
            Center::Mean => mean,
            Center::Median => stats::median(values).unwrap_or(mean),
        };
        Self {
            n: values.len(),
            center,
            spread,
        }
    }

    /// `false` for constant, single-value, or empty samples.
    pub fn has_spread(&self) -> bool {
        self.n > 1 && self.spread.is_finite() && self.spread > 0.0
    }

    /// Deviation of `count` from the center, in spreads. Zero without spread.
    pub fn score(&self, count: f64) -> f64 {
        if self.has_spread() {
            (count - self.center) / self.spread
        } else {
            0.0
        }
    }
}

/// A flagged record together with its deviation score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outlier {
    /// Line identifier or file path.
    pub key: String,
    /// Observed count.
    pub count: u64,
    /// `(count - center) / spread`.
    pub score: f64,
}

/// Outcome of a detection run: the flagged subset plus the statistics used.
///
/// # Examples
///
/// ```
/// use churnlens_core::{CountRecord, CountTable};
/// use churnlens_outliers::detector::{detect_outliers, OutlierPolicy};
///
/// let table: CountTable = vec![CountRecord::new("a", 4), CountRecord::new("b", 4)]
///     .into_iter()
///     .collect();
/// let report = detect_outliers(&table, &OutlierPolicy::z_score(3.0).unwrap());
/// assert!(report.is_empty());
/// assert_eq!(report.summary.spread, 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierReport {
    /// Distribution statistics.
    pub summary: Summary,
    /// Center the deviations were measured from.
    pub center: Center,
    /// Threshold in spreads.
    pub threshold: f64,
    /// Flagged records, in table order.
    pub outliers: Vec<Outlier>,
}

impl OutlierReport {
    pub fn len(&self) -> usize {
        self.outliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outliers.is_empty()
    }

    /// The flagged records as a plain count table.
    pub fn to_table(&self) -> CountTable {
        self.outliers
            .iter()
            .map(|o| CountRecord::new(o.key.clone(), o.count))
            .collect()
    }
}

/// Flag the records of `table` that deviate from the center by more than
/// `policy.threshold()` spreads.
///
/// Pure and deterministic: identical tables yield identical reports. When
/// every count is equal, or there is only one record, nothing is flagged.
///
/// # Examples
///
/// ```
/// use churnlens_core::{CountRecord, CountTable};
/// use churnlens_outliers::detector::{detect_outliers, OutlierPolicy};
///
/// let mut table: CountTable = (0..20)
///     .map(|i| CountRecord::new(format!("f{i}"), 1))
///     .collect();
/// table.push(CountRecord::new("hot.rs", 100));
///
/// let report = detect_outliers(&table, &OutlierPolicy::median_deviation(3.0).unwrap());
/// assert_eq!(report.len(), 1);
/// assert_eq!(report.outliers[0].key, "hot.rs");
/// ```
pub fn detect_outliers(table: &CountTable, policy: &OutlierPolicy) -> OutlierReport {
    let summary = Summary::compute(&table.counts(), policy.center());

    debug!(
        n = summary.n,
        center = summary.center,
        spread = summary.spread,
        threshold = policy.threshold(),
        "computed count distribution"
    );

    let outliers: Vec<Outlier> = table
        .iter()
        .filter(|r| policy.is_outlier(r.count as f64, &summary))
        .map(|r| Outlier {
            key: r.key.clone(),
            count: r.count,
            score: summary.score(r.count as f64),
        })
        .collect();

    debug!(flagged = outliers.len(), "outlier detection finished");

    OutlierReport {
        summary,
        center: policy.center(),
        threshold: policy.threshold(),
        outliers,
    }
}
