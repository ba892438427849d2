//! Core types, configuration, and error handling for churnlens.
//!
//! This crate provides the shared foundation used by all other churnlens crates:
//! - [`ChurnError`]: unified error type using `thiserror`, tagged by [`Stage`]
//! - [`ChurnConfig`]: configuration loaded from `.churnlens.toml`
//! - Shared types: [`CountRecord`], [`CountTable`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{ChurnConfig, FilesConfig, LinesConfig, DEFAULT_THRESHOLD};
pub use error::{ChurnError, Stage};
pub use types::{CountRecord, CountTable, OutputFormat};

/// A convenience `Result` type for churnlens operations.
pub type Result<T> = std::result::Result<T, ChurnError>;
