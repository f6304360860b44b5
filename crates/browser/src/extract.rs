//! Structured data extraction with a declarative selector map.

use std::collections::BTreeMap;

use {
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
    tracing::{debug, info},
};

use crate::{driver::PageDriver, error::BrowserError};

/// How to read one named field.
///
/// In JSON a field is either a bare selector string (text of the first match)
/// or an object with `selector`, optional `attribute` and `multiple`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FieldInput")]
pub struct FieldSpec {
    /// CSS selector, relative to the current scope. Empty means the scope
    /// element itself.
    pub selector: String,
    /// Attribute to read instead of text. `html` reads `innerHTML`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    /// Collect every match into an array instead of the first one.
    pub multiple: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldInput {
    Selector(String),
    Detailed {
        selector: String,
        #[serde(default)]
        attribute: Option<String>,
        #[serde(default)]
        multiple: bool,
    },
}

impl From<FieldInput> for FieldSpec {
    fn from(input: FieldInput) -> Self {
        match input {
            FieldInput::Selector(selector) => Self::text(selector),
            FieldInput::Detailed {
                selector,
                attribute,
                multiple,
            } => Self {
                selector,
                attribute,
                multiple,
            },
        }
    }
}

impl FieldSpec {
    pub fn text(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            attribute: None,
            multiple: false,
        }
    }
}

/// Field name to spec. Output keys come back in name order.
pub type SelectorMap = BTreeMap<String, FieldSpec>;

/// Shared field reader. Defines `extractFields(scope, fields)`.
pub(crate) const FIELD_READER_JS: &str = r#"
const readField = (el, spec) => {
    if (el == null) return null;
    if (!spec.attribute) return (el.innerText || el.textContent || '').trim();
    if (spec.attribute === 'html') return el.innerHTML;
    return el.getAttribute(spec.attribute);
};
const pickField = (scope, spec) => {
    if (!spec.selector) return spec.multiple ? [readField(scope, spec)] : readField(scope, spec);
    if (spec.multiple) {
        return Array.from(scope.querySelectorAll(spec.selector)).map((el) => readField(el, spec));
    }
    return readField(scope.querySelector(spec.selector), spec);
};
const extractFields = (scope, fields) => {
    const out = {};
    for (const [name, spec] of Object.entries(fields)) out[name] = pickField(scope, spec);
    return out;
};
"#;

pub(crate) fn fields_json(fields: &SelectorMap) -> Result<String, BrowserError> {
    serde_json::to_string(fields)
        .map_err(|e| BrowserError::InvalidConfig(format!("cannot encode selector map: {e}")))
}

fn extract_script(fields: &SelectorMap) -> Result<String, BrowserError> {
    Ok(format!(
        "(() => {{\n{FIELD_READER_JS}\nreturn extractFields(document, {});\n}})()",
        fields_json(fields)?
    ))
}

/// Navigate to `url` and read every field in `fields` from the document.
///
/// Fields whose selector matches nothing come back as `null` (or an empty
/// array for `multiple` fields).
pub async fn extract(
    driver: &mut dyn PageDriver,
    url: &str,
    fields: &SelectorMap,
) -> Result<Map<String, Value>, BrowserError> {
    if fields.is_empty() {
        return Err(BrowserError::InvalidConfig(
            "selector map has no fields".to_string(),
        ));
    }

    driver.goto(url).await?;
    driver.wait_for_idle().await?;

    match driver.evaluate(&extract_script(fields)?).await? {
        Value::Object(map) => {
            let missing = map.values().filter(|v| v.is_null()).count();
            if missing > 0 {
                debug!(url, missing, "some fields matched nothing");
            }
            info!(url, fields = map.len(), "extracted page data");
            Ok(map)
        },
        other => Err(BrowserError::JsEvalFailed(format!(
            "extraction returned {other} instead of an object"
        ))),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::driver::fake::FakePage, serde_json::json};

    #[test]
    fn bare_string_means_first_match_text() {
        let map: SelectorMap = serde_json::from_value(json!({
            "title": "h1",
            "links": { "selector": "a", "attribute": "href", "multiple": true }
        }))
        .unwrap();

        assert_eq!(map["title"], FieldSpec::text("h1"));
        assert_eq!(map["links"].attribute.as_deref(), Some("href"));
        assert!(map["links"].multiple);
    }

    #[test]
    fn script_embeds_field_map() {
        let mut map = SelectorMap::new();
        map.insert("price".into(), FieldSpec::text(".price"));
        let script = extract_script(&map).unwrap();
        assert!(script.contains(r#"{"price":{"selector":".price","multiple":false}}"#));
        assert!(script.contains("extractFields(document"));
    }

    #[tokio::test]
    async fn returns_object_from_page() {
        let mut page = FakePage::with_evaluations([json!({ "title": "Quarterly", "price": null })]);
        let mut map = SelectorMap::new();
        map.insert("title".into(), FieldSpec::text("h1"));
        map.insert("price".into(), FieldSpec::text(".price"));

        let data = extract(&mut page, "https://example.com", &map).await.unwrap();
        assert_eq!(data["title"], "Quarterly");
        assert!(data["price"].is_null());
        assert_eq!(page.log, vec!["goto https://example.com", "idle", "evaluate"]);
    }

    #[tokio::test]
    async fn non_object_result_is_an_error() {
        let mut page = FakePage::with_evaluations([json!([1, 2])]);
        let mut map = SelectorMap::new();
        map.insert("title".into(), FieldSpec::text("h1"));
        let err = extract(&mut page, "https://example.com", &map).await.unwrap_err();
        assert!(matches!(err, BrowserError::JsEvalFailed(_)));
    }

    #[tokio::test]
    async fn empty_map_is_rejected_before_navigation() {
        let mut page = FakePage::default();
        let err = extract(&mut page, "https://example.com", &SelectorMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BrowserError::InvalidConfig(_)));
        assert!(page.log.is_empty());
    }
}
