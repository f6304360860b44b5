//! Concatenate PDFs into one document.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use {
    lopdf::{Dictionary, Document, Object, ObjectId, dictionary},
    serde::Serialize,
    tracing::{debug, info},
};

use crate::error::{Context, Error, Result};

/// Page attributes a page may inherit from its ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub path: PathBuf,
    pub inputs: usize,
    pub pages: usize,
}

pub(crate) fn type_name(dict: &Dictionary) -> Option<&[u8]> {
    dict.get(b"Type").and_then(Object::as_name).ok()
}

/// Copy inherited attributes from the page tree onto the page itself so it
/// survives being re-parented.
fn flatten_inherited(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut page = doc.get_dictionary(page_id)?.clone();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(id) = parent
        && depth < 64
    {
        let node = doc.get_dictionary(id)?;
        for key in INHERITABLE {
            if !page.has(key)
                && let Ok(value) = node.get(key)
            {
                page.set(key.to_vec(), value.clone());
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }
    Ok(page)
}

/// Merge `inputs` in order into `output`. Object ids of each input are
/// shifted past the previous one's and all pages hang off a new page tree.
pub fn merge(inputs: &[PathBuf], output: &Path) -> Result<MergeReport> {
    if inputs.len() < 2 {
        return Err(Error::InvalidSpec("merge needs at least two inputs".into()));
    }

    let mut merged = Document::with_version("1.5");
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut next_id = 1;

    for input in inputs {
        let mut doc =
            Document::load(input).with_context(|| format!("loading {}", input.display()))?;
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        debug!(input = %input.display(), pages = page_ids.len(), "loaded input");
        for &page_id in &page_ids {
            pages.push((page_id, flatten_inherited(&doc, page_id)?));
        }

        for (id, object) in doc.objects {
            let skip = match object {
                Object::Dictionary(ref dict) => matches!(
                    type_name(dict),
                    Some(b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline")
                ),
                _ => false,
            };
            if !skip {
                objects.insert(id, object);
            }
        }
    }

    let pages_id = (next_id, 0);
    let mut kids = Vec::with_capacity(pages.len());
    for (page_id, mut page) in pages {
        page.set("Parent", pages_id);
        objects.insert(page_id, Object::Dictionary(page));
        kids.push(Object::Reference(page_id));
    }
    let count = kids.len();
    objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count as i64,
        }),
    );
    let catalog_id = (next_id + 1, 0);
    objects.insert(
        catalog_id,
        Object::Dictionary(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        }),
    );

    merged.objects = objects;
    merged.max_id = next_id + 1;
    merged.trailer.set("Root", catalog_id);
    merged.compress();

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    merged
        .save(output)
        .with_context(|| format!("writing {}", output.display()))?;

    info!(output = %output.display(), inputs = inputs.len(), pages = count, "merged pdfs");
    Ok(MergeReport {
        path: output.to_path_buf(),
        inputs: inputs.len(),
        pages: count,
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            create::{PdfSpec, create_pdf},
            info::extract_text,
        },
        serde_json::json,
    };

    fn make(dir: &Path, name: &str, pages: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let pages: Vec<_> = pages.iter().map(|l| json!({ "lines": [l] })).collect();
        let spec: PdfSpec = serde_json::from_value(json!({ "pages": pages })).unwrap();
        create_pdf(&spec, &path).unwrap();
        path
    }

    #[test]
    fn pages_follow_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = make(dir.path(), "a.pdf", &["alpha one", "alpha two"]);
        let b = make(dir.path(), "b.pdf", &["bravo one"]);
        let out = dir.path().join("merged.pdf");

        let report = merge(&[a, b], &out).unwrap();
        assert_eq!(report.pages, 3);
        assert_eq!(report.inputs, 2);

        let doc = Document::load(&out).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
        let last = extract_text(&out, Some(&[3])).unwrap();
        assert!(last.contains("bravo one"), "{last}");
        let first = extract_text(&out, Some(&[1])).unwrap();
        assert!(first.contains("alpha one"), "{first}");
    }

    #[test]
    fn inherited_media_box_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let a = make(dir.path(), "a.pdf", &["x"]);
        let b = make(dir.path(), "b.pdf", &["y"]);
        let out = dir.path().join("merged.pdf");
        merge(&[a, b], &out).unwrap();

        let doc = Document::load(&out).unwrap();
        for page_id in doc.get_pages().into_values() {
            let page = doc.get_dictionary(page_id).unwrap();
            assert!(page.has(b"MediaBox"));
            assert!(page.has(b"Resources"));
        }
    }

    #[test]
    fn needs_two_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let a = make(dir.path(), "a.pdf", &["x"]);
        assert!(matches!(
            merge(&[a], &dir.path().join("m.pdf")),
            Err(Error::InvalidSpec(_))
        ));
    }

    #[test]
    fn missing_input_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = make(dir.path(), "a.pdf", &["x"]);
        let err = merge(&[a, dir.path().join("nope.pdf")], &dir.path().join("m.pdf"))
            .unwrap_err()
            .to_string();
        assert!(err.contains("nope.pdf"), "{err}");
    }
}
