//! Statistical outlier detection over count tables.
//!
//! A single detector parameterized by center (mean or median) flags counts
//! that sit more than a threshold number of population standard deviations
//! from the center. Used by both the line modification and the git file
//! change pipelines.

pub mod detector;
pub mod stats;

pub use detector::{detect_outliers, Center, Outlier, OutlierPolicy, OutlierReport, Summary};
