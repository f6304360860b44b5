//! Metadata and text extraction.

use std::path::Path;

use {
    lopdf::{Dictionary, Document, Object},
    serde::Serialize,
    tracing::debug,
};

use crate::{
    error::{Context, Error, Result},
    text::object_text,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfInfo {
    pub pages: usize,
    pub version: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub encrypted: bool,
}

fn load(input: &Path) -> Result<Document> {
    Document::load(input).with_context(|| format!("loading {}", input.display()))
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn info_field(info: Option<&Dictionary>, key: &[u8]) -> Option<String> {
    info?
        .get(key)
        .ok()
        .and_then(object_text)
        .filter(|s| !s.trim().is_empty())
}

pub fn info(input: &Path) -> Result<PdfInfo> {
    let doc = load(input)?;
    let dict = info_dictionary(&doc);
    let info = PdfInfo {
        pages: doc.get_pages().len(),
        version: doc.version.clone(),
        title: info_field(dict, b"Title"),
        author: info_field(dict, b"Author"),
        subject: info_field(dict, b"Subject"),
        creator: info_field(dict, b"Creator"),
        producer: info_field(dict, b"Producer"),
        encrypted: doc.trailer.has(b"Encrypt"),
    };
    debug!(input = %input.display(), pages = info.pages, "read pdf info");
    Ok(info)
}

/// Text of the given 1-based pages, or of every page.
pub fn extract_text(input: &Path, pages: Option<&[u32]>) -> Result<String> {
    let doc = load(input)?;
    let total = doc.get_pages().len();
    let selected: Vec<u32> = match pages {
        Some(pages) => {
            if let Some(&page) = pages.iter().find(|&&p| p == 0 || p as usize > total) {
                return Err(Error::PageOutOfRange { page, pages: total });
            }
            pages.to_vec()
        },
        None => (1..=total as u32).collect(),
    };
    doc.extract_text(&selected)
        .with_context(|| format!("extracting text from {}", input.display()))
}
