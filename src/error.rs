use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the seed and migration pipelines.
///
/// Variants split into two severities: record-level failures are counted and
/// skipped by the orchestrator, everything else aborts the run.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("failed to connect to PostgreSQL: {0}")]
    SourceConnection(#[source] sqlx::Error),

    #[error("source query failed: {0}")]
    Source(#[from] sqlx::Error),

    #[error("seed data file {path} could not be read: {source}")]
    SeedFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("seed data file {path} is not a JSON array: {source}")]
    SeedParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("table '{0}' does not exist")]
    TableNotFound(String),

    #[error("could not describe table '{table}': {reason}")]
    DestinationCheck { table: String, reason: String },

    #[error("malformed record {record}: {reason}")]
    DataShape { record: String, reason: String },

    #[error("DynamoDB write failed: {0}")]
    Store(String),

    #[error("failed to serialize item: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl EtlError {
    pub fn data_shape(record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataShape {
            record: record.into(),
            reason: reason.into(),
        }
    }

    /// True when the error only concerns the record being processed and the
    /// run may continue with the next one.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            Self::DataShape { .. } | Self::Store(_) | Self::Serialize(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
