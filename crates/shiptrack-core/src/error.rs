// crates/shiptrack-core/src/error.rs

use shiptrack_parser::LoaderError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Shipment loading failed: {0}")]
    Loader(#[from] LoaderError),

    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[cfg(feature = "runtime")]
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Warehouse load failed: {0}")]
    Warehouse(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
