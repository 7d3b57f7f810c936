use thiserror::Error;

/// Request-level failures of the profiling core.
///
/// Data-quality problems never surface here; they are absorbed per column.
#[derive(Debug, Error)]
pub enum ProfilingError {
    #[error("Invalid profiling configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed table: {0}")]
    MalformedTable(String),

    #[error("Failed to start profiling workers: {0}")]
    WorkerPool(String),

    #[error("Column '{0}' not found in table")]
    UnknownColumn(String),

    #[error("A '{0}' visualization needs a column")]
    ColumnRequired(String),

    #[error("Unsupported visualization type '{0}'")]
    UnsupportedChart(String),

    #[error("Insufficient data for visualization: {0}")]
    InsufficientData(String),
}

pub type Result<T> = std::result::Result<T, ProfilingError>;
