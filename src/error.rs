use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PricePairError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "map")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("{}:{line}: expected 15 or 16 columns, found {found}", path.display())]
    ColumnLayout {
        path: PathBuf,
        line: u64,
        found: usize,
    },

    #[error("{}: missing required column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PricePairError>;
