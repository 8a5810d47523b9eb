use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort the load/reproject/join pipeline.
///
/// All of these indicate malformed inputs or misconfiguration, so none are
/// retried and none fall back to a default value. The presentation layer
/// only ever sees a fully built dataset or one of these messages.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file not found: {path:?}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read {path:?}: {detail}")]
    Read { path: PathBuf, detail: String },

    #[error("column '{column}' not found in {path:?}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("invalid value for column '{column}' in {path:?}: {detail}")]
    InvalidAttribute {
        column: String,
        path: PathBuf,
        detail: String,
    },

    #[error("unsupported geometry format: {0}")]
    UnsupportedFormat(String),

    #[error("cannot reproject from '{crs}': {detail}")]
    Reprojection { crs: String, detail: String },

    #[error("cannot compute nearest pumps: the pump dataset is empty")]
    EmptyPumpSet,
}
