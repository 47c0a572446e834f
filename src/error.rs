use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Missing column: {0}")]
    Schema(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Empty batch: at least one row is required")]
    EmptyBatch,

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

#[cfg(feature = "python")]
impl From<AnalyticsError> for pyo3::PyErr {
    fn from(err: AnalyticsError) -> pyo3::PyErr {
        pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
    }
}
