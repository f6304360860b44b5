//! Builds `.pptx` files from a declarative [`SlideDeck`].
//!
//! The package is written part by part with `zip`: one slide master, one
//! blank layout and a theme, then a slide part per [`Slide`]. Every element
//! becomes plain DrawingML (text boxes, tables, pictures), so the result
//! opens in PowerPoint, Keynote and LibreOffice without embedded charts.

pub mod error;
mod package;
pub mod schema;
mod shapes;
mod xml;

pub use {
    error::{PresentationError, Result},
    package::{PresentationReport, build_presentation},
    schema::{Align, BulletItem, ChartKind, Element, Layout, Position, Slide, SlideDeck, TextOptions},
};
