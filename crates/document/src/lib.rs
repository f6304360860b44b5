//! Word (`.docx`) documents.
//!
//! [`build_document`] renders a [`DocumentSpec`] (headings, paragraphs,
//! lists, tables, images and page breaks) and [`extract_text`] reads the
//! paragraph text of an existing document back.

mod build;
pub mod error;
mod read;
pub mod schema;

pub use {
    build::{DocumentReport, build_document},
    error::{DocumentError, Result},
    read::extract_text,
    schema::{Align, DocumentSpec, Section, TextOptions},
};
