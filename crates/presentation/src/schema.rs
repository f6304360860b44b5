//! The JSON slide-deck format.
//!
//! ```json
//! {
//!   "title": "Q3 review",
//!   "slides": [
//!     { "layout": "title", "title": "Q3 review", "subtitle": "Sales team" },
//!     { "title": "Highlights", "elements": [
//!         { "type": "bullet", "items": ["Revenue up 12%", { "text": "EMEA led", "level": 1 }] },
//!         { "type": "chart", "categories": ["Jul", "Aug"], "values": [120, 180],
//!           "position": { "x": 7, "y": 1.5, "w": 5.5, "h": 4 } }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Positions are in inches from the top-left corner of a 13.33 x 7.5 inch
//! (16:9) slide.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PresentationError, Result};

pub const SLIDE_WIDTH_IN: f64 = 13.333;
pub const SLIDE_HEIGHT_IN: f64 = 7.5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlideDeck {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    pub slides: Vec<Slide>,
}

impl SlideDeck {
    /// Make relative image paths relative to `base` (usually the directory of
    /// the deck file).
    pub fn resolve_images(&mut self, base: &Path) {
        for slide in &mut self.slides {
            for element in &mut slide.elements {
                if let Element::Image { path, .. } = element
                    && path.is_relative()
                {
                    *path = base.join(&*path);
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.slides.is_empty() {
            return Err(PresentationError::InvalidDeck("deck has no slides".into()));
        }
        for (index, slide) in self.slides.iter().enumerate() {
            for element in &slide.elements {
                element
                    .validate()
                    .map_err(|e| PresentationError::InvalidDeck(format!("slide {}: {e}", index + 1)))?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Large centred title and optional subtitle.
    Title,
    /// Title bar at the top, elements below.
    #[default]
    Content,
    /// Elements only.
    Blank,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Slide {
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Speaker notes.
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Background colour as `RRGGBB`.
    #[serde(default)]
    pub background: Option<String>,
}

/// Box in inches. Missing fields take the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            x: 0.5,
            y: 1.5,
            w: 12.333,
            h: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

fn default_font_size() -> f64 {
    18.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    /// Points.
    #[serde(default = "default_font_size")]
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
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
            color: None,
            align: Align::Left,
        }
    }
}

/// A bullet is a bare string at the element's level, or `{text, level}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BulletItem {
    Plain(String),
    Nested {
        text: String,
        #[serde(default)]
        level: u8,
    },
}

impl BulletItem {
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(text) | Self::Nested { text, .. } => text,
        }
    }

    pub fn level(&self, default: u8) -> u8 {
        match self {
            Self::Plain(_) => default,
            Self::Nested { level, .. } => *level,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Vertical bars.
    #[default]
    Column,
    /// Horizontal bars.
    Bar,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Text {
        text: String,
        #[serde(default)]
        position: Position,
        #[serde(default)]
        options: TextOptions,
    },
    Bullet {
        items: Vec<BulletItem>,
        #[serde(default)]
        level: u8,
        #[serde(default)]
        position: Position,
        #[serde(default)]
        options: TextOptions,
    },
    Table {
        rows: Vec<Vec<serde_json::Value>>,
        /// Bold the first row.
        #[serde(default = "default_true")]
        header: bool,
        #[serde(default)]
        position: Position,
        #[serde(default)]
        font_size: Option<f64>,
    },
    Chart {
        #[serde(default)]
        chart_type: ChartKind,
        categories: Vec<String>,
        values: Vec<f64>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        position: Position,
    },
    Image {
        path: PathBuf,
        #[serde(default)]
        position: Position,
    },
}

impl Element {
    fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Self::Table { rows, .. } if rows.is_empty() || rows.iter().all(Vec::is_empty) => {
                Err("table has no cells".into())
            },
            Self::Chart {
                categories, values, ..
            } if categories.len() != values.len() => Err(format!(
                "chart has {} categories but {} values",
                categories.len(),
                values.len()
            )),
            Self::Chart { values, .. } if values.iter().any(|v| !v.is_finite()) => {
                Err("chart values must be finite".into())
            },
            _ => Ok(()),
        }
    }
}
