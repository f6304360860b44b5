use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresentationError {
    #[error("invalid slide deck: {0}")]
    InvalidDeck(String),

    #[error("failed to read image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported image format: {0}")]
    UnsupportedImage(PathBuf),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PresentationError>;
