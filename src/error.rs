use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecoverError {
    #[error("Unknown month label: {0}")]
    UnknownMonthLabel(String),

    #[error("Malformed year at row {row}: {value}")]
    MalformedYear { row: usize, value: String },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Record {row} has {width} cells but the cache declares {fields} fields")]
    RecordWidth {
        row: usize,
        width: usize,
        fields: usize,
    },

    #[error("Worksheet not found: {0}")]
    WorksheetNotFound(String),

    #[error("Pivot index {index} out of range ({count} pivots)")]
    PivotNotFound { index: usize, count: usize },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "python")]
impl From<RecoverError> for pyo3::PyErr {
    fn from(err: RecoverError) -> pyo3::PyErr {
        pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
    }
}
