//! Error taxonomy for the load pipeline.
//!
//! Row-level errors (`FieldMapping`, `Malformed`) may be tolerated and
//! counted depending on the configured policy; everything else halts the
//! stage that raised it.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EtlError {
    #[error("source unavailable: {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source file exists but does not carry the expected column set.
    #[error("invalid source {path}: missing column '{column}'")]
    InvalidSource { path: PathBuf, column: String },

    #[error("malformed record: {0}")]
    Malformed(#[from] csv::Error),

    /// Unrecognized enumeration literal or unparsable required numeric field.
    #[error("field mapping failed for {field}: {value:?}")]
    FieldMapping { field: &'static str, value: String },

    /// A dimension row that must already exist was not found in the store.
    #[error("missing prerequisite: no {entity} row for key {key}")]
    MissingPrerequisite { entity: &'static str, key: String },

    #[error("duplicate key writing to {table}: {detail}")]
    DuplicateKey { table: &'static str, detail: String },

    /// An award-category triple observed in the fact pass was never
    /// registered by the scan pass.
    #[error("award category lookup miss: {0}")]
    LookupMiss(String),

    /// The two passes over the award source observed different row counts.
    #[error("inconsistent award scans: scan pass saw {scanned} rows, load pass saw {loaded}")]
    InconsistentScan { scanned: usize, loaded: usize },

    #[error("unknown stage '{0}'")]
    UnknownStage(String),

    #[error("stage '{stage}' requires '{prerequisite}' to be committed first")]
    PrerequisiteNotCommitted {
        stage: &'static str,
        prerequisite: &'static str,
    },

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl EtlError {
    /// True for errors scoped to a single source row, which the chunk
    /// tolerance policy may skip-and-count instead of aborting.
    pub fn is_row_level(&self) -> bool {
        matches!(self, EtlError::FieldMapping { .. } | EtlError::Malformed(_))
    }
}
