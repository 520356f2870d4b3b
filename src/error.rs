// src/error.rs

use thiserror::Error;

/// Result type used throughout the pipeline.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Everything that can abort a run. No variant is recovered from locally:
/// the driver stops at the first one it sees.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A sheet (or mapping entry) that the run refers to does not exist.
    #[error("{what} `{name}` not found")]
    NotFound { what: &'static str, name: String },

    /// A correction rule expected a column the sheet does not have.
    #[error("sheet `{sheet}` has no column `{column}`")]
    SchemaMismatch { sheet: String, column: String },

    /// No schema descriptor was persisted for this table.
    #[error("no schema descriptor for table `{0}`")]
    SchemaNotFound(String),

    /// Object store put/get/delete failed.
    #[error("object store error on gs://{bucket}/{name}: {message}")]
    Storage {
        bucket: String,
        name: String,
        message: String,
    },

    /// The warehouse rejected the load job before it started.
    #[error("failed to submit load job for `{table}`: {message}")]
    LoadSubmission { table: String, message: String },

    /// The load job reached a terminal failed state.
    #[error("load job `{job_id}` into `{table}` failed: {}", .diagnostics.join("; "))]
    LoadJob {
        table: String,
        job_id: String,
        diagnostics: Vec<String>,
    },

    /// Spreadsheet backend transport or decoding failure.
    #[error("spreadsheet source error: {0}")]
    Source(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PipelineError {
    pub fn storage(bucket: &str, name: &str, message: impl ToString) -> Self {
        PipelineError::Storage {
            bucket: bucket.to_string(),
            name: name.to_string(),
            message: message.to_string(),
        }
    }
}
