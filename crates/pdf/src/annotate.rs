//! Add sticky notes, free text and highlights to pages.

use std::path::{Path, PathBuf};

use {
    lopdf::{Dictionary, Document, Object, ObjectId, dictionary},
    serde::{Deserialize, Serialize},
    tracing::{debug, info},
};

use crate::{
    error::{Context, Error, Result},
    text::string_object,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    /// Sticky note icon that opens a popup.
    Text,
    FreeText,
    Highlight,
}

fn default_font_size() -> f32 {
    12.0
}

/// One annotation. `rect` is `[x1, y1, x2, y2]` in points from the
/// bottom-left corner of the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    /// 1-based.
    pub page: u32,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    pub rect: [f32; 4],
    #[serde(default)]
    pub contents: String,
    /// RGB components in `0.0..=1.0`.
    #[serde(default)]
    pub color: Option<[f32; 3]>,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotateReport {
    pub path: PathBuf,
    pub added: usize,
}

fn normalized(rect: [f32; 4]) -> [f32; 4] {
    let [x1, y1, x2, y2] = rect;
    [x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)]
}

fn numbers(values: &[f32]) -> Object {
    Object::Array(values.iter().map(|&v| v.into()).collect())
}

fn annotation_dictionary(annotation: &Annotation, page_id: ObjectId) -> Dictionary {
    let rect = normalized(annotation.rect);
    let [x1, y1, x2, y2] = rect;
    let mut dict = dictionary! {
        "Type" => "Annot",
        "Rect" => numbers(&rect),
        "P" => page_id,
        "Contents" => string_object(&annotation.contents),
        "F" => 4,
    };
    if let Some(ref author) = annotation.author {
        dict.set("T", string_object(author));
    }

    match annotation.kind {
        AnnotationKind::Text => {
            dict.set("Subtype", "Text");
            dict.set("Name", "Comment");
            dict.set("Open", false);
            dict.set("C", numbers(&annotation.color.unwrap_or([1.0, 0.9, 0.2])));
        },
        AnnotationKind::FreeText => {
            let [r, g, b] = annotation.color.unwrap_or([0.0, 0.0, 0.0]);
            dict.set("Subtype", "FreeText");
            dict.set(
                "DA",
                Object::string_literal(format!(
                    "/Helv {} Tf {r} {g} {b} rg",
                    annotation.font_size
                )),
            );
            dict.set("Q", 0);
        },
        AnnotationKind::Highlight => {
            dict.set("Subtype", "Highlight");
            dict.set("C", numbers(&annotation.color.unwrap_or([1.0, 1.0, 0.0])));
            // Upper-left, upper-right, lower-left, lower-right.
            dict.set("QuadPoints", numbers(&[x1, y2, x2, y2, x1, y1, x2, y1]));
        },
    }
    dict
}

/// Append `annotation_id` to the page's `/Annots`, which may be inline or an
/// indirect array.
fn attach(doc: &mut Document, page_id: ObjectId, annotation_id: ObjectId) -> Result<()> {
    let existing = doc.get_dictionary(page_id)?.get(b"Annots").ok().cloned();
    match existing {
        Some(Object::Reference(array_id)) => {
            doc.get_object_mut(array_id)?
                .as_array_mut()?
                .push(Object::Reference(annotation_id));
        },
        Some(Object::Array(mut annots)) => {
            annots.push(Object::Reference(annotation_id));
            doc.get_dictionary_mut(page_id)?.set("Annots", annots);
        },
        _ => {
            doc.get_dictionary_mut(page_id)?
                .set("Annots", vec![Object::Reference(annotation_id)]);
        },
    }
    Ok(())
}

/// Add `annotations` to `input` and write the result to `output`. Every page
/// number is checked before anything is written.
pub fn annotate(input: &Path, output: &Path, annotations: &[Annotation]) -> Result<AnnotateReport> {
    let mut doc = Document::load(input).with_context(|| format!("loading {}", input.display()))?;
    let pages = doc.get_pages();

    let mut targets = Vec::with_capacity(annotations.len());
    for annotation in annotations {
        let page_id = pages
            .get(&annotation.page)
            .copied()
            .ok_or(Error::PageOutOfRange {
                page: annotation.page,
                pages: pages.len(),
            })?;
        if annotation.rect.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidSpec(format!(
                "annotation on page {} has a non-finite rect",
                annotation.page
            )));
        }
        targets.push((annotation, page_id));
    }

    for (annotation, page_id) in targets {
        let annotation_id = doc.add_object(annotation_dictionary(annotation, page_id));
        attach(&mut doc, page_id, annotation_id)?;
        debug!(page = annotation.page, kind = ?annotation.kind, "added annotation");
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    doc.save(output)
        .with_context(|| format!("writing {}", output.display()))?;

    info!(output = %output.display(), added = annotations.len(), "annotated pdf");
    Ok(AnnotateReport {
        path: output.to_path_buf(),
        added: annotations.len(),
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::create::{PdfSpec, create_pdf},
        serde_json::json,
    };

    fn sample(dir: &Path) -> PathBuf {
        let path = dir.join("in.pdf");
        let spec: PdfSpec =
            serde_json::from_value(json!({ "pages": [{ "lines": ["one"] }, { "lines": ["two"] }] }))
                .unwrap();
        create_pdf(&spec, &path).unwrap();
        path
    }

    fn annotations(value: serde_json::Value) -> Vec<Annotation> {
        serde_json::from_value(value).unwrap()
    }

    fn subtypes(doc: &Document, page: u32) -> Vec<String> {
        let page_id = doc.get_pages()[&page];
        let Ok(annots) = doc.get_dictionary(page_id).unwrap().get(b"Annots") else {
            return Vec::new();
        };
        annots
            .as_array()
            .unwrap()
            .iter()
            .map(|a| {
                let dict = doc.get_dictionary(a.as_reference().unwrap()).unwrap();
                String::from_utf8_lossy(dict.get(b"Subtype").unwrap().as_name().unwrap())
                    .into_owned()
            })
            .collect()
    }

    #[test]
    fn adds_each_kind_to_its_page() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.pdf");
        let report = annotate(
            &sample(dir.path()),
            &out,
            &annotations(json!([
                { "page": 1, "type": "text", "rect": [100, 700, 120, 720], "contents": "check this" },
                { "page": 1, "type": "highlight", "rect": [72, 700, 200, 714] },
                { "page": 2, "type": "freetext", "rect": [300, 300, 72, 400], "contents": "note", "font_size": 10 }
            ])),
        )
        .unwrap();
        assert_eq!(report.added, 3);

        let doc = Document::load(&out).unwrap();
        assert_eq!(subtypes(&doc, 1), vec!["Text", "Highlight"]);
        assert_eq!(subtypes(&doc, 2), vec!["FreeText"]);
    }

    #[test]
    fn rect_is_normalized() {
        assert_eq!(normalized([300.0, 300.0, 72.0, 400.0]), [72.0, 300.0, 300.0, 400.0]);
    }

    #[test]
    fn page_out_of_range_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.pdf");
        let err = annotate(
            &sample(dir.path()),
            &out,
            &annotations(json!([
                { "page": 1, "type": "text", "rect": [0, 0, 10, 10] },
                { "page": 5, "type": "text", "rect": [0, 0, 10, 10] }
            ])),
        )
        .unwrap_err();
        assert!(matches!(err, Error::PageOutOfRange { page: 5, pages: 2 }));
        assert!(!out.exists());
    }

    #[test]
    fn page_zero_is_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let err = annotate(
            &sample(dir.path()),
            &dir.path().join("out.pdf"),
            &annotations(json!([{ "page": 0, "type": "highlight", "rect": [0, 0, 1, 1] }])),
        )
        .unwrap_err();
        assert!(matches!(err, Error::PageOutOfRange { page: 0, .. }));
    }
}
