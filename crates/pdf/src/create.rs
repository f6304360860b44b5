//! Text-only PDFs set in Helvetica.

use std::path::{Path, PathBuf};

use {
    lopdf::{
        Dictionary, Document, Object, ObjectId, Stream,
        content::{Content, Operation},
        dictionary,
    },
    serde::{Deserialize, Serialize},
    tracing::{debug, info},
};

use crate::{
    error::{Context, Error, Result},
    text::{latin1, string_object, wrap},
};

const MARGIN: f32 = 72.0;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;
const TITLE_SCALE: f32 = 1.6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    Letter,
    A4,
}

impl PageSize {
    /// Width and height in points.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            Self::Letter => (612.0, 792.0),
            Self::A4 => (595.0, 842.0),
        }
    }
}

fn default_font_size() -> f32 {
    12.0
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSpec {
    #[serde(default)]
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfSpec {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub page_size: PageSize,
    pub pages: Vec<PageSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateReport {
    pub path: PathBuf,
    pub pages: usize,
}

/// Lines of one output page, after wrapping and overflow.
#[derive(Debug, Default, PartialEq)]
struct Layout {
    title: Option<String>,
    lines: Vec<String>,
}

fn layout(spec: &PdfSpec) -> Vec<Layout> {
    let (width, height) = spec.page_size.dimensions();
    let leading = spec.font_size * 1.2;
    let columns = ((width - 2.0 * MARGIN) / (spec.font_size * AVG_GLYPH_WIDTH)) as usize;
    let rows = ((height - 2.0 * MARGIN) / leading) as usize;
    let title_rows = ((spec.font_size * TITLE_SCALE * 1.2) / leading).ceil() as usize + 1;

    let mut out = Vec::new();
    for (index, page) in spec.pages.iter().enumerate() {
        let title = spec.title.clone().filter(|_| index == 0);
        let mut capacity = rows.saturating_sub(if title.is_some() { title_rows } else { 0 });
        let mut current = Layout {
            title,
            lines: Vec::new(),
        };
        for line in page.lines.iter().flat_map(|l| wrap(l, columns)) {
            if current.lines.len() >= capacity.max(1) {
                out.push(std::mem::take(&mut current));
                capacity = rows;
            }
            current.lines.push(line);
        }
        out.push(current);
    }
    out
}

fn page_content(page: &Layout, spec: &PdfSpec) -> Content {
    let (_, height) = spec.page_size.dimensions();
    let leading = spec.font_size * 1.2;
    let mut operations = vec![Operation::new("BT", vec![])];
    let mut y = height - MARGIN;

    if let Some(ref title) = page.title {
        let size = spec.font_size * TITLE_SCALE;
        y -= size;
        operations.extend([
            Operation::new("Tf", vec!["F2".into(), size.into()]),
            Operation::new("Td", vec![MARGIN.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(latin1(title))]),
            Operation::new("Td", vec![0.into(), (-size * 1.2 - leading).into()]),
        ]);
    } else {
        y -= spec.font_size;
        operations.push(Operation::new("Td", vec![MARGIN.into(), y.into()]));
    }

    operations.extend([
        Operation::new("Tf", vec!["F1".into(), spec.font_size.into()]),
        Operation::new("TL", vec![leading.into()]),
    ]);
    for line in &page.lines {
        operations.push(Operation::new("Tj", vec![Object::string_literal(latin1(line))]));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

fn font(base: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn info_dictionary(spec: &PdfSpec) -> Dictionary {
    let mut info = dictionary! { "Producer" => Object::string_literal("docpilot") };
    if let Some(ref title) = spec.title {
        info.set("Title", string_object(title));
    }
    if let Some(ref author) = spec.author {
        info.set("Author", string_object(author));
    }
    info
}

/// Write `spec` as a PDF at `path`. Long lines wrap and pages that overflow
/// continue on a new page.
pub fn create_pdf(spec: &PdfSpec, path: &Path) -> Result<CreateReport> {
    if spec.pages.is_empty() {
        return Err(Error::InvalidSpec("no pages".into()));
    }
    if !(spec.font_size.is_finite() && (4.0..=72.0).contains(&spec.font_size)) {
        return Err(Error::InvalidSpec(format!(
            "font size {} is outside 4-72",
            spec.font_size
        )));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();
    let regular = doc.add_object(font("Helvetica"));
    let bold = doc.add_object(font("Helvetica-Bold"));
    let resources = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => regular, "F2" => bold },
    });

    let (width, height) = spec.page_size.dimensions();
    let mut kids = Vec::new();
    for page in layout(spec) {
        let content = page_content(&page, spec)
            .encode()
            .context("encoding page content")?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }
    let count = kids.len();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count as i64,
            "Resources" => resources,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        }),
    );
    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(info_dictionary(spec));
    doc.trailer.set("Root", catalog);
    doc.trailer.set("Info", info_id);
    doc.compress();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    doc.save(path)
        .with_context(|| format!("writing {}", path.display()))?;

    debug!(font_size = spec.font_size, "laid out pages");
    info!(path = %path.display(), pages = count, "pdf written");
    Ok(CreateReport {
        path: path.to_path_buf(),
        pages: count,
    })
}
