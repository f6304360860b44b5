use {docpilot_common::FromMessage, thiserror::Error};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("invalid PDF spec: {0}")]
    InvalidSpec(String),

    #[error("page {page} is out of range (document has {pages} pages)")]
    PageOutOfRange { page: u32, pages: usize },

    #[error("malformed PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

docpilot_common::impl_context!();
