//! The JSON document format.
//!
//! ```json
//! {
//!   "title": "Incident report",
//!   "sections": [
//!     { "type": "heading", "text": "Summary", "level": 1 },
//!     { "type": "paragraph", "text": "Checkout was down for 12 minutes." },
//!     { "type": "bullet", "items": ["Root cause: expired cert", "Fix: auto-renew"] },
//!     { "type": "table", "rows": [["Time", "Event"], ["09:02", "Alert fired"]] },
//!     { "type": "page_break" }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocumentError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSpec {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl DocumentSpec {
    /// Make relative image paths relative to `base`.
    pub fn resolve_images(&mut self, base: &Path) {
        for section in &mut self.sections {
            if let Section::Image { path, .. } = section
                && path.is_relative()
            {
                *path = base.join(&*path);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.is_none() && self.sections.is_empty() {
            return Err(DocumentError::InvalidSpec(
                "document has neither a title nor sections".into(),
            ));
        }
        for (index, section) in self.sections.iter().enumerate() {
            let problem = match section {
                Section::Heading { level, .. } if !(1..=6).contains(level) => {
                    Some(format!("heading level {level} is outside 1-6"))
                },
                Section::Table { rows, .. } if rows.iter().all(Vec::is_empty) => {
                    Some("table has no cells".to_string())
                },
                Section::Image {
                    width: Some(w), ..
                } if *w <= 0.0 => Some("image width must be positive".to_string()),
                Section::Image {
                    height: Some(h), ..
                } if *h <= 0.0 => Some("image height must be positive".to_string()),
                _ => None,
            };
            if let Some(problem) = problem {
                return Err(DocumentError::InvalidSpec(format!(
                    "section {}: {problem}",
                    index + 1
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

fn default_font_size() -> f64 {
    11.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    /// Points.
    #[serde(default = "default_font_size")]
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// `RRGGBB`, with or without a leading `#`.
    pub color: Option<String>,
    pub align: Align,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            size: default_font_size(),
            bold: false,
            italic: false,
            underline: false,
            color: None,
            align: Align::Left,
        }
    }
}

fn default_heading_level() -> u8 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Section {
    Heading {
        text: String,
        #[serde(default = "default_heading_level")]
        level: u8,
    },
    Paragraph {
        text: String,
        #[serde(default)]
        options: TextOptions,
    },
    Bullet {
        items: Vec<String>,
        /// Indent level, 0 is the outermost.
        #[serde(default)]
        level: u8,
    },
    Numbered {
        items: Vec<String>,
    },
    Table {
        rows: Vec<Vec<serde_json::Value>>,
        /// Bold the first row.
        #[serde(default = "default_true")]
        header: bool,
    },
    Image {
        path: PathBuf,
        /// Inches.
        #[serde(default)]
        width: Option<f64>,
        /// Inches.
        #[serde(default)]
        height: Option<f64>,
    },
    PageBreak,
}

fn default_true() -> bool {
    true
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, serde_json::json};

    #[test]
    fn parses_every_section_type() {
        let spec: DocumentSpec = serde_json::from_value(json!({
            "title": "Report",
            "sections": [
                { "type": "heading", "text": "Intro" },
                { "type": "paragraph", "text": "Body", "options": { "bold": true } },
                { "type": "bullet", "items": ["a"] },
                { "type": "numbered", "items": ["one", "two"] },
                { "type": "table", "rows": [["k", "v"], ["x", 1]] },
                { "type": "image", "path": "chart.png", "width": 4 },
                { "type": "page_break" }
            ]
        }))
        .unwrap();
        assert_eq!(spec.sections.len(), 7);
        assert!(matches!(spec.sections[0], Section::Heading { level: 1, .. }));
        let Section::Paragraph { ref options, .. } = spec.sections[1] else {
            panic!("expected paragraph");
        };
        assert!(options.bold);
        assert_eq!(options.size, 11.0);
        assert!(matches!(spec.sections[6], Section::PageBreak));
        spec.validate().unwrap();
    }

    #[rstest]
    #[case(json!({ "sections": [] }), "neither a title")]
    #[case(json!({ "sections": [{ "type": "heading", "text": "x", "level": 7 }] }), "section 1: heading level 7")]
    #[case(json!({ "sections": [{ "type": "table", "rows": [[]] }] }), "no cells")]
    #[case(json!({ "sections": [{ "type": "image", "path": "a.png", "height": 0 }] }), "height must be positive")]
    fn invalid_specs(#[case] value: serde_json::Value, #[case] message: &str) {
        let spec: DocumentSpec = serde_json::from_value(value).unwrap();
        let err = spec.validate().unwrap_err().to_string();
        assert!(err.contains(message), "{err}");
    }

    #[test]
    fn relative_images_resolve_against_base() {
        let mut spec: DocumentSpec = serde_json::from_value(json!({
            "sections": [{ "type": "image", "path": "img/a.png" }]
        }))
        .unwrap();
        spec.resolve_images(Path::new("/docs"));
        let Section::Image { ref path, .. } = spec.sections[0] else {
            panic!("expected image");
        };
        assert_eq!(path, Path::new("/docs/img/a.png"));
    }
}
