//! Multi-page scraping: repeated items on a listing, following a "next" link.

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tracing::{debug, info},
};

use crate::{
    driver::PageDriver,
    error::BrowserError,
    extract::{FIELD_READER_JS, SelectorMap, fields_json},
};

/// Hard upper bound on pages visited, whatever the config asks for.
pub const MAX_PAGES_CAP: u32 = 50;

fn default_max_pages() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Selector matching each repeated item on a page.
    pub item_selector: String,
    /// Fields read relative to each item.
    pub fields: SelectorMap,
    /// Clicked to reach the next page; scraping stops when it is missing or
    /// disabled.
    #[serde(default)]
    pub next_selector: Option<String>,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl ScrapeConfig {
    /// Pages to visit: `max_pages` clamped to `1..=MAX_PAGES_CAP`.
    pub fn page_limit(&self) -> u32 {
        self.max_pages.clamp(1, MAX_PAGES_CAP)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub url: String,
    pub pages_visited: u32,
    /// Each item's fields plus a 1-based `page` number.
    pub items: Vec<Value>,
}

fn items_script(config: &ScrapeConfig) -> Result<String, BrowserError> {
    let item_selector = serde_json::to_string(&config.item_selector)
        .map_err(|e| BrowserError::InvalidConfig(e.to_string()))?;
    let next_selector = serde_json::to_string(&config.next_selector)
        .map_err(|e| BrowserError::InvalidConfig(e.to_string()))?;
    Ok(format!(
        "(() => {{\n{FIELD_READER_JS}\nconst fields = {};\n\
         const items = Array.from(document.querySelectorAll({item_selector})).map((item) => \
         extractFields(item, fields));\n\
         const next = {next_selector} ? document.querySelector({next_selector}) : null;\n\
         const nextDisabled = !!next && (next.disabled === true || \
         next.getAttribute('aria-disabled') === 'true');\n\
         return {{ items, nextDisabled }};\n}})()",
        fields_json(&config.fields)?
    ))
}

/// Items found on one page and whether the "next" control is disabled.
fn parse_page(value: Value) -> Result<(Vec<Value>, bool), BrowserError> {
    match value {
        Value::Null => Ok((Vec::new(), false)),
        Value::Object(mut page) => {
            let next_disabled = page
                .get("nextDisabled")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            match page.remove("items") {
                Some(Value::Array(items)) => Ok((items, next_disabled)),
                Some(Value::Null) | None => Ok((Vec::new(), next_disabled)),
                Some(other) => Err(BrowserError::JsEvalFailed(format!(
                    "scrape returned items {other} instead of an array"
                ))),
            }
        },
        other => Err(BrowserError::JsEvalFailed(format!(
            "scrape returned {other} instead of an object"
        ))),
    }
}

/// Scrape `url`, following `next_selector` until it disappears or is
/// disabled, or the page limit is reached.
pub async fn scrape(
    driver: &mut dyn PageDriver,
    url: &str,
    config: &ScrapeConfig,
) -> Result<ScrapeResult, BrowserError> {
    let script = items_script(config)?;
    let limit = config.page_limit();
    let mut items = Vec::new();
    let mut pages_visited = 0;

    driver.goto(url).await?;

    for page in 1..=limit {
        driver.wait_for_idle().await?;

        let (found, next_disabled) = parse_page(driver.evaluate(&script).await?)?;
        pages_visited = page;
        debug!(page, items = found.len(), "scraped page");

        items.extend(found.into_iter().map(|item| match item {
            Value::Object(mut fields) => {
                fields.insert("page".into(), Value::from(page));
                Value::Object(fields)
            },
            other => other,
        }));

        let Some(next) = config.next_selector.as_deref() else {
            break;
        };
        if page == limit {
            debug!(limit, "page limit reached");
            break;
        }
        if next_disabled {
            debug!(page, "next link disabled, stopping");
            break;
        }
        match driver.click(next).await {
            Ok(()) => {},
            Err(BrowserError::ElementNotFound(_)) => {
                debug!(page, "no next link, stopping");
                break;
            },
            Err(e) => return Err(e),
        }
    }

    info!(url, pages = pages_visited, items = items.len(), "scrape complete");
    Ok(ScrapeResult {
        url: url.to_string(),
        pages_visited,
        items,
    })
}
