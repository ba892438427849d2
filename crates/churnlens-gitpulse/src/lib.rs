//! Git history analysis: per-file change counts and their outliers.
//!
//! Lists the files every commit touched, counts how many commits touched
//! each file, and flags files whose change count sits far from the median.

pub mod counting;
pub mod mining;
pub mod pipeline;
