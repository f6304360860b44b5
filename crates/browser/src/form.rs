//! Form filling.

use std::time::Duration;

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tracing::{debug, info},
};

use crate::{driver::PageDriver, error::BrowserError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Clear the input and type the value.
    #[default]
    Text,
    /// Choose the `<option>` whose value or label matches.
    Select,
    /// Set a checkbox or radio; `value` is read as a boolean.
    Check,
    /// Click the element; `value` is ignored.
    Click,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub selector: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub kind: FieldKind,
}

fn default_wait_after_ms() -> u64 {
    2_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    pub fields: Vec<FormField>,
    /// Clicked after every field is filled.
    #[serde(default)]
    pub submit: Option<String>,
    /// Delay after submitting before reading the final URL.
    #[serde(default = "default_wait_after_ms")]
    pub wait_after_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormReport {
    /// Selectors filled, in order.
    pub filled: Vec<String>,
    pub submitted: bool,
    pub final_url: String,
}

const CLEAR_JS: &str = r#"((sel) => {
    const el = document.querySelector(sel);
    if (!el) return false;
    el.value = '';
    el.dispatchEvent(new Event('input', { bubbles: true }));
    return true;
})"#;

const SELECT_JS: &str = r#"((sel, wanted) => {
    const el = document.querySelector(sel);
    if (!el || !el.options) return false;
    const option = Array.from(el.options).find((o) => o.value === wanted || o.text.trim() === wanted);
    if (!option) return false;
    el.value = option.value;
    el.dispatchEvent(new Event('change', { bubbles: true }));
    return true;
})"#;

const CHECK_JS: &str = r#"((sel, checked) => {
    const el = document.querySelector(sel);
    if (!el) return false;
    if (el.checked !== checked) {
        el.checked = checked;
        el.dispatchEvent(new Event('change', { bubbles: true }));
    }
    return true;
})"#;

/// `"false"`, `"0"`, `"no"` and `"off"` uncheck; anything else checks.
fn truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}

fn call(function: &str, args: &[Value]) -> String {
    let args: Vec<String> = args.iter().map(Value::to_string).collect();
    format!("{function}({})", args.join(", "))
}

async fn run_setter(
    driver: &mut dyn PageDriver,
    selector: &str,
    script: String,
) -> Result<(), BrowserError> {
    match driver.evaluate(&script).await? {
        Value::Bool(true) => Ok(()),
        _ => Err(BrowserError::ElementNotFound(selector.to_string())),
    }
}

async fn fill_field(driver: &mut dyn PageDriver, field: &FormField) -> Result<(), BrowserError> {
    let selector = Value::from(field.selector.as_str());
    match field.kind {
        FieldKind::Text => {
            run_setter(driver, &field.selector, call(CLEAR_JS, &[selector])).await?;
            driver.type_into(&field.selector, &field.value).await
        },
        FieldKind::Select => {
            let script = call(SELECT_JS, &[selector, Value::from(field.value.as_str())]);
            run_setter(driver, &field.selector, script).await
        },
        FieldKind::Check => {
            let script = call(CHECK_JS, &[selector, Value::Bool(truthy(&field.value))]);
            run_setter(driver, &field.selector, script).await
        },
        FieldKind::Click => driver.click(&field.selector).await,
    }
}

/// Navigate to `url`, fill `config.fields` in order and optionally submit.
///
/// The first field that cannot be found aborts the run.
pub async fn fill_form(
    driver: &mut dyn PageDriver,
    url: &str,
    config: &FormConfig,
) -> Result<FormReport, BrowserError> {
    driver.goto(url).await?;
    driver.wait_for_idle().await?;

    let mut filled = Vec::with_capacity(config.fields.len());
    for field in &config.fields {
        fill_field(driver, field).await?;
        debug!(selector = %field.selector, kind = ?field.kind, "filled field");
        filled.push(field.selector.clone());
    }

    let submitted = match config.submit.as_deref() {
        Some(submit) => {
            driver.click(submit).await?;
            if config.wait_after_ms > 0 {
                tokio::time::sleep(Duration::from_millis(config.wait_after_ms)).await;
            }
            true
        },
        None => false,
    };

    let final_url = driver.current_url().await?;
    info!(url, fields = filled.len(), submitted, final_url = %final_url, "form filled");
    Ok(FormReport {
        filled,
        submitted,
        final_url,
    })
}
