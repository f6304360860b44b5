//! AcroForm fields: list them and fill them by fully-qualified name.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use {
    lopdf::{Dictionary, Document, Object, ObjectId},
    serde::Serialize,
    tracing::{debug, info, warn},
};

use crate::{
    error::{Context, Error, Result},
    text::{object_text, string_object},
};

const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Button,
    Choice,
    Signature,
    Unknown,
}

impl FieldKind {
    fn from_ft(ft: Option<&[u8]>) -> Self {
        match ft {
            Some(b"Tx") => Self::Text,
            Some(b"Btn") => Self::Button,
            Some(b"Ch") => Self::Choice,
            Some(b"Sig") => Self::Signature,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    /// Fully-qualified name, parent names joined with `.`.
    pub name: String,
    pub kind: FieldKind,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillReport {
    pub path: PathBuf,
    pub filled: Vec<String>,
    /// Requested names that match no field.
    pub unknown: Vec<String>,
}

/// A terminal field: one that holds a value.
struct Field {
    id: ObjectId,
    name: String,
    kind: FieldKind,
}

fn acroform(doc: &Document) -> Option<&Dictionary> {
    let root = doc.trailer.get(b"Root").and_then(Object::as_reference).ok()?;
    match doc.get_dictionary(root).ok()?.get(b"AcroForm").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn references(dict: &Dictionary, key: &[u8]) -> Vec<ObjectId> {
    dict.get(key)
        .and_then(Object::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_reference().ok())
                .collect()
        })
        .unwrap_or_default()
}

fn walk(
    doc: &Document,
    id: ObjectId,
    parent: Option<&str>,
    inherited_ft: Option<&[u8]>,
    depth: usize,
    out: &mut Vec<Field>,
) {
    if depth > MAX_DEPTH {
        warn!(?id, "form field tree too deep");
        return;
    }
    let Ok(dict) = doc.get_dictionary(id) else {
        return;
    };
    let partial = dict.get(b"T").ok().and_then(object_text);
    let name = match (parent, partial) {
        (Some(parent), Some(partial)) => format!("{parent}.{partial}"),
        (None, Some(partial)) => partial,
        (Some(parent), None) => parent.to_string(),
        (None, None) => String::new(),
    };
    let ft = dict.get(b"FT").and_then(Object::as_name).ok().or(inherited_ft);

    // Kids without a /T are widgets of this field, not child fields.
    let child_fields: Vec<ObjectId> = references(dict, b"Kids")
        .into_iter()
        .filter(|kid| doc.get_dictionary(*kid).is_ok_and(|k| k.has(b"T")))
        .collect();
    if child_fields.is_empty() {
        if !name.is_empty() {
            out.push(Field {
                id,
                name,
                kind: FieldKind::from_ft(ft),
            });
        }
        return;
    }
    for kid in child_fields {
        walk(doc, kid, Some(&name).filter(|n| !n.is_empty()).map(String::as_str), ft, depth + 1, out);
    }
}

fn fields(doc: &Document) -> Vec<Field> {
    let mut out = Vec::new();
    if let Some(form) = acroform(doc) {
        for id in references(form, b"Fields") {
            walk(doc, id, None, None, 0, &mut out);
        }
    }
    out
}

fn load(input: &Path) -> Result<Document> {
    Document::load(input).with_context(|| format!("loading {}", input.display()))
}

pub fn list_fields(input: &Path) -> Result<Vec<FieldInfo>> {
    let doc = load(input)?;
    let fields = fields(&doc)
        .into_iter()
        .map(|field| {
            let value = doc
                .get_dictionary(field.id)
                .ok()
                .and_then(|d| d.get(b"V").ok())
                .and_then(object_text);
            FieldInfo {
                name: field.name,
                kind: field.kind,
                value,
            }
        })
        .collect::<Vec<_>>();
    debug!(input = %input.display(), fields = fields.len(), "listed form fields");
    Ok(fields)
}

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "false" | "off" | "no" | "0"
    )
}

/// The appearance state that means "checked": the first `/AP /N` key other
/// than `Off` on the field or its first widget.
fn on_state(doc: &Document, field: &Dictionary) -> Vec<u8> {
    let widgets = std::iter::once(field).chain(
        references(field, b"Kids")
            .into_iter()
            .filter_map(|kid| doc.get_dictionary(kid).ok()),
    );
    for widget in widgets {
        let normal = widget
            .get(b"AP")
            .and_then(Object::as_dict)
            .and_then(|ap| ap.get(b"N"))
            .and_then(Object::as_dict);
        if let Ok(normal) = normal
            && let Some((key, _)) = normal.iter().find(|(key, _)| key.as_slice() != b"Off")
        {
            return key.clone();
        }
    }
    b"Yes".to_vec()
}

fn set_need_appearances(doc: &mut Document) -> Result<()> {
    let root = doc.trailer.get(b"Root")?.as_reference()?;
    let form = doc.get_dictionary(root)?.get(b"AcroForm")?.clone();
    match form {
        Object::Reference(id) => doc.get_dictionary_mut(id)?.set("NeedAppearances", true),
        _ => doc
            .get_dictionary_mut(root)?
            .get_mut(b"AcroForm")?
            .as_dict_mut()?
            .set("NeedAppearances", true),
    }
    Ok(())
}

/// Set the value of each named field and write the result to `output`.
/// Names that match no field are reported, not treated as errors.
pub fn fill(input: &Path, output: &Path, values: &BTreeMap<String, String>) -> Result<FillReport> {
    let mut doc = load(input)?;
    let fields = fields(&doc);
    if fields.is_empty() {
        return Err(Error::Message(format!(
            "{} has no form fields",
            input.display()
        )));
    }

    let mut filled = Vec::new();
    for field in &fields {
        let Some(value) = values.get(&field.name) else {
            continue;
        };
        match field.kind {
            FieldKind::Button => {
                let state = if is_truthy(value) {
                    on_state(&doc, doc.get_dictionary(field.id)?)
                } else {
                    b"Off".to_vec()
                };
                let widgets = references(doc.get_dictionary(field.id)?, b"Kids");
                let dict = doc.get_dictionary_mut(field.id)?;
                dict.set("V", Object::Name(state.clone()));
                dict.set("AS", Object::Name(state.clone()));
                for widget in widgets {
                    if let Ok(widget) = doc.get_dictionary_mut(widget) {
                        widget.set("AS", Object::Name(state.clone()));
                    }
                }
            },
            FieldKind::Signature => {
                warn!(field = %field.name, "skipping signature field");
                continue;
            },
            _ => {
                let dict = doc.get_dictionary_mut(field.id)?;
                dict.set("V", string_object(value));
                dict.remove(b"AP");
            },
        }
        debug!(field = %field.name, "filled field");
        filled.push(field.name.clone());
    }

    let known: BTreeSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    let unknown: Vec<String> = values
        .keys()
        .filter(|name| !known.contains(name.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        warn!(?unknown, "unknown form fields");
    }

    set_need_appearances(&mut doc)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    doc.save(output)
        .with_context(|| format!("writing {}", output.display()))?;

    info!(output = %output.display(), filled = filled.len(), unknown = unknown.len(), "filled form");
    Ok(FillReport {
        path: output.to_path_buf(),
        filled,
        unknown,
    })
}
