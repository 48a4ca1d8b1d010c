//! Campaign-level errors
//!
//! Only setup and final persistence can fail a campaign. Everything that
//! goes wrong inside an iteration is recorded as that test's status instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("Subject executable not found at: {0}")]
    SubjectNotFound(PathBuf),

    #[error("Subject is not a file: {0}")]
    SubjectNotAFile(PathBuf),

    #[error("Failed to create output directory {path}: {source}")]
    OutputDir { path: PathBuf, source: io::Error },

    #[error("Failed to create campaign log {path}: {source}")]
    Log { path: PathBuf, source: io::Error },

    #[error("Failed to write report {path}: {source}")]
    Report { path: PathBuf, source: io::Error },

    #[error("Failed to write results {path}: {source}")]
    Summary { path: PathBuf, source: io::Error },

    #[error("Invalid campaign configuration: {0}")]
    InvalidConfig(String),
}

pub type CampaignResult<T> = Result<T, CampaignError>;
