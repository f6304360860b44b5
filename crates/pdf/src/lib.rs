//! PDF skills built on `lopdf`: create text documents, merge, annotate,
//! fill AcroForm fields, and read metadata and text.

pub mod annotate;
pub mod create;
pub mod error;
pub mod form;
pub mod info;
pub mod merge;
mod text;

pub use error::{Error as PdfError, Result};
