//! Error types for the survey preparation pipeline

use std::path::PathBuf;

use thiserror::Error;

use super::xpt::XptError;

/// Errors raised while loading, merging and cleaning survey tables.
///
/// None of these are recovered locally: any failure aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A source file is malformed, keyless or has unusable identifiers.
    #[error("Failed to load {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    /// An expected column (identifier, status, keep-list entry) is absent.
    #[error("Column '{column}' not found in {context}")]
    Schema { context: String, column: String },

    /// A configuration input (removal list, categorical list, source directory)
    /// is missing or unreadable.
    #[error("Invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// Cell contents that cannot be interpreted.
    #[error(transparent)]
    Data(#[from] DataError),

    /// SAS transport decoding failure.
    #[error(transparent)]
    Xpt(#[from] XptError),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Data-quality failures detected while deriving features.
#[derive(Debug, Error)]
pub enum DataError {
    /// A tooth-surface code that is neither "no caries" nor digit-bearing.
    #[error("Unrecognised surface code '{code}' in column '{column}' for subject {subject}")]
    UnrecognisedSurfaceCode {
        column: String,
        subject: u64,
        code: String,
    },
}

impl PipelineError {
    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PipelineError::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn schema(context: impl Into<String>, column: impl Into<String>) -> Self {
        PipelineError::Schema {
            context: context.into(),
            column: column.into(),
        }
    }

    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PipelineError::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
