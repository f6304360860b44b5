use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("failed to open workbook {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("failed to read sheet '{sheet}': {source}")]
    ReadSheet {
        sheet: String,
        #[source]
        source: calamine::Error,
    },

    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("workbook has no sheets: {0}")]
    NoSheets(PathBuf),

    #[error("invalid workbook spec: {0}")]
    InvalidSpec(String),

    #[error("sheet '{0}' is empty")]
    EmptySheet(String),

    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SheetError>;
