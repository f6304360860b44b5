use std::{
    fs::File,
    path::{Path, PathBuf},
};

use {
    docx_rs::{
        AbstractNumbering, AlignmentType, BreakType, Docx, IndentLevel, Level, LevelJc,
        LevelText, NumberFormat, Numbering, NumberingId, Paragraph, Pic, Run, SpecialIndentType,
        Start, Style, StyleType, Table, TableCell, TableRow,
    },
    serde::Serialize,
    serde_json::Value,
    tracing::{debug, info},
};

use crate::{
    error::{DocumentError, Result},
    schema::{Align, DocumentSpec, Section, TextOptions},
};

const EMU_PER_INCH: f64 = 914_400.0;
const PX_PER_INCH: f64 = 96.0;
const DEFAULT_IMAGE_WIDTH_IN: f64 = 6.0;

const BULLET_NUMBERING: usize = 1;
const BULLET_GLYPHS: [&str; 3] = ["•", "◦", "▪"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub sections: usize,
    pub images: usize,
}

/// Heading run size in half-points: level 1 is 32pt, each level below
/// drops 2pt down to 22pt at level 6.
fn heading_size(level: u8) -> usize {
    let level = usize::from(level.clamp(1, 6));
    (34 - 2 * level) * 2
}

fn half_points(points: f64) -> usize {
    (points * 2.0).round().max(2.0) as usize
}

fn hex_color(raw: &str) -> Result<String> {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(hex.to_ascii_uppercase())
    } else {
        Err(DocumentError::InvalidSpec(format!(
            "invalid colour '{raw}', expected RRGGBB"
        )))
    }
}

fn alignment(align: Align) -> AlignmentType {
    match align {
        Align::Left => AlignmentType::Left,
        Align::Center => AlignmentType::Center,
        Align::Right => AlignmentType::Right,
        Align::Justify => AlignmentType::Both,
    }
}

fn styled_run(text: &str, options: &TextOptions) -> Result<Run> {
    let mut run = Run::new().add_text(text).size(half_points(options.size));
    if options.bold {
        run = run.bold();
    }
    if options.italic {
        run = run.italic();
    }
    if options.underline {
        run = run.underline("single");
    }
    if let Some(ref color) = options.color {
        run = run.color(hex_color(color)?);
    }
    Ok(run)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn list_level(index: usize, format: &str, text: &str) -> Level {
    let indent = 720 * (index as i32 + 1);
    Level::new(
        index,
        Start::new(1),
        NumberFormat::new(format),
        LevelText::new(text),
        LevelJc::new("left"),
    )
    .indent(Some(indent), Some(SpecialIndentType::Hanging(360)), None, None)
}

fn bullet_numbering() -> AbstractNumbering {
    (0..9).fold(AbstractNumbering::new(BULLET_NUMBERING), |numbering, index| {
        numbering.add_level(list_level(
            index,
            "bullet",
            BULLET_GLYPHS[index % BULLET_GLYPHS.len()],
        ))
    })
}

fn decimal_numbering(id: usize) -> AbstractNumbering {
    AbstractNumbering::new(id).add_level(list_level(0, "decimal", "%1."))
}

fn table(rows: &[Vec<Value>], header: bool) -> Table {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let rows = rows
        .iter()
        .enumerate()
        .map(|(r, row)| {
            let cells = (0..width)
                .map(|c| {
                    let text = row.get(c).map(cell_text).unwrap_or_default();
                    let mut run = Run::new().add_text(text);
                    if header && r == 0 {
                        run = run.bold();
                    }
                    TableCell::new().add_paragraph(Paragraph::new().add_run(run))
                })
                .collect();
            TableRow::new(cells)
        })
        .collect();
    Table::new(rows)
}

fn image(path: &Path, width: Option<f64>, height: Option<f64>) -> Result<Run> {
    let data = std::fs::read(path).map_err(|source| DocumentError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let (w, h) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, w * 2.0 / 3.0),
        (None, Some(h)) => (h * 1.5, h),
        (None, None) => (DEFAULT_IMAGE_WIDTH_IN, DEFAULT_IMAGE_WIDTH_IN * 2.0 / 3.0),
    };
    let pic = Pic::new_with_dimensions(
        data,
        (w * PX_PER_INCH).round() as u32,
        (h * PX_PER_INCH).round() as u32,
    )
    .size(
        (w * EMU_PER_INCH).round() as u32,
        (h * EMU_PER_INCH).round() as u32,
    );
    Ok(Run::new().add_image(pic))
}

fn styles(docx: Docx) -> Docx {
    let docx = docx.add_style(Style::new("Title", StyleType::Paragraph).name("Title"));
    (1..=6).fold(docx, |docx, level| {
        docx.add_style(
            Style::new(format!("Heading{level}"), StyleType::Paragraph)
                .name(format!("Heading {level}")),
        )
    })
}

/// Write `spec` as a `.docx` file at `path`.
pub fn build_document(spec: &DocumentSpec, path: &Path) -> Result<DocumentReport> {
    spec.validate()?;

    let mut docx = styles(Docx::new())
        .add_abstract_numbering(bullet_numbering())
        .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING));

    if let Some(ref title) = spec.title {
        docx = docx.add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(title).size(half_points(28.0)).bold())
                .style("Title")
                .align(AlignmentType::Center),
        );
    }

    // Each numbered list restarts at 1, so it gets its own definition.
    let mut next_numbering = BULLET_NUMBERING + 1;
    let mut images = 0;

    for section in &spec.sections {
        docx = match section {
            Section::Heading { text, level } => docx.add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text(text).size(heading_size(*level)).bold())
                    .style(&format!("Heading{level}")),
            ),
            Section::Paragraph { text, options } => docx.add_paragraph(
                Paragraph::new()
                    .add_run(styled_run(text, options)?)
                    .align(alignment(options.align)),
            ),
            Section::Bullet { items, level } => {
                items.iter().fold(docx, |docx, item| {
                    docx.add_paragraph(
                        Paragraph::new()
                            .add_run(Run::new().add_text(item))
                            .numbering(
                                NumberingId::new(BULLET_NUMBERING),
                                IndentLevel::new(usize::from(*level).min(8)),
                            ),
                    )
                })
            },
            Section::Numbered { items } => {
                let id = next_numbering;
                next_numbering += 1;
                let docx = docx
                    .add_abstract_numbering(decimal_numbering(id))
                    .add_numbering(Numbering::new(id, id));
                items.iter().fold(docx, |docx, item| {
                    docx.add_paragraph(
                        Paragraph::new()
                            .add_run(Run::new().add_text(item))
                            .numbering(NumberingId::new(id), IndentLevel::new(0)),
                    )
                })
            },
            Section::Table { rows, header } => docx.add_table(table(rows, *header)),
            Section::Image {
                path,
                width,
                height,
            } => {
                images += 1;
                docx.add_paragraph(Paragraph::new().add_run(image(path, *width, *height)?))
            },
            Section::PageBreak => {
                docx.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)))
            },
        };
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    docx.build()
        .pack(file)
        .map_err(|e| DocumentError::Pack(e.to_string()))?;

    debug!(numbering_definitions = next_numbering - 1, "numbering");
    info!(
        path = %path.display(),
        sections = spec.sections.len(),
        images,
        "document written"
    );
    Ok(DocumentReport {
        path: path.to_path_buf(),
        sections: spec.sections.len(),
        images,
    })
}
