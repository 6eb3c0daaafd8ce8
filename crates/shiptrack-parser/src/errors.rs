use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to open shipment file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("shipment file is missing required column '{column}'")]
    MissingColumn { column: &'static str },

    #[error("data row {row} could not be read: {source}")]
    DataRow {
        row: usize,
        #[source]
        source: csv::Error,
    },
}
