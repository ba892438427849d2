//! Line modification outliers.
//!
//! Loads a CSV table of per-line modification counts, removes duplicate
//! rows, keeps the highest count per line, and flags lines whose count has
//! a z-score beyond the configured threshold.

pub mod extract;
pub mod pipeline;
pub mod reduce;
