//! Dashboard health monitoring.
//!
//! Each check navigates to the dashboard, waits for the network to settle,
//! collects a [`PageProbe`] with one script evaluation, and runs the fixed
//! [`CHECKLIST`] over it. The anomalies found decide the [`Status`].

use std::time::Duration;

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    tracing::{debug, info, warn},
};

use crate::{driver::PageDriver, error::BrowserError};

/// Charts rendered smaller than this (in CSS pixels) on either axis are
/// reported as undersized.
pub const MIN_CHART_WIDTH: f64 = 50.0;
pub const MIN_CHART_HEIGHT: f64 = 50.0;

pub const ERROR_SELECTORS: &[&str] = &[
    ".error",
    ".error-message",
    ".alert-danger",
    ".alert-error",
    ".notification-error",
    "[role=\"alert\"]",
    "[data-error]",
];

pub const LOADING_SELECTORS: &[&str] = &[
    ".loading",
    ".spinner",
    ".loader",
    ".skeleton",
    "[aria-busy=\"true\"]",
    "[data-loading=\"true\"]",
];

pub const CHART_SELECTORS: &[&str] = &[
    "canvas",
    "svg.chart",
    ".chart",
    ".chart-container",
    "[data-chart]",
];

pub const METRIC_SELECTORS: &[&str] = &[".metric", ".kpi", ".stat", "[data-metric]"];

/// Collects everything the checklist needs in one round trip. The selector
/// lists are spliced in from the constants above.
const PROBE_TEMPLATE: &str = r#"
(() => {
    const ERROR_SELECTORS = __ERRORS__;
    const LOADING_SELECTORS = __LOADERS__;
    const CHART_SELECTORS = __CHARTS__;
    const METRIC_SELECTORS = __METRICS__;

    const text = (el, max = 200) =>
        (el.innerText || el.textContent || '').trim().replace(/\s+/g, ' ').substring(0, max);

    const visible = (el) => {
        const rect = el.getBoundingClientRect();
        const style = getComputedStyle(el);
        return style.display !== 'none' &&
            style.visibility !== 'hidden' &&
            (rect.width > 0 || rect.height > 0);
    };

    const hits = (selectors) => selectors.flatMap((selector) =>
        Array.from(document.querySelectorAll(selector))
            .filter(visible)
            .map((el) => ({ selector, text: text(el) })));

    const tables = Array.from(document.querySelectorAll('table')).map((table, index) => {
        const bodyRows = table.querySelectorAll('tbody tr').length;
        const headRows = table.tHead ? table.tHead.rows.length : 0;
        return {
            index,
            id: table.id || null,
            rows: bodyRows || Math.max(table.rows.length - headRows, 0),
            columns: table.rows[0] ? table.rows[0].cells.length : 0,
        };
    });

    const seen = new Set();
    const charts = [];
    for (const selector of CHART_SELECTORS) {
        for (const el of document.querySelectorAll(selector)) {
            if (seen.has(el)) continue;
            seen.add(el);
            const rect = el.getBoundingClientRect();
            charts.push({
                index: charts.length,
                selector,
                id: el.id || null,
                width: rect.width,
                height: rect.height,
            });
        }
    }

    const metrics = Array.from(document.querySelectorAll(METRIC_SELECTORS.join(', ')))
        .slice(0, 100)
        .map((el) => {
            const labelEl = el.querySelector('.label, .title, .name');
            const valueEl = el.querySelector('.value, .number');
            return {
                label: el.getAttribute('data-metric') ||
                    el.getAttribute('aria-label') ||
                    (labelEl ? text(labelEl, 80) : null),
                value: text(valueEl || el, 80),
            };
        });

    return {
        url: location.href,
        title: document.title,
        errors: hits(ERROR_SELECTORS),
        loaders: hits(LOADING_SELECTORS),
        tables,
        charts,
        metrics,
    };
})()
"#;

fn js_array(items: &[&str]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".into())
}

/// The probe script with the selector lists filled in.
pub fn probe_script() -> String {
    PROBE_TEMPLATE
        .replace("__ERRORS__", &js_array(ERROR_SELECTORS))
        .replace("__LOADERS__", &js_array(LOADING_SELECTORS))
        .replace("__CHARTS__", &js_array(CHART_SELECTORS))
        .replace("__METRICS__", &js_array(METRIC_SELECTORS))
}

// ── Probe data ──────────────────────────────────────────────────────────────

/// An element that matched one of the selector lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorHit {
    pub selector: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableInfo {
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub rows: u32,
    pub columns: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartInfo {
    pub index: u32,
    pub selector: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metric {
    pub label: Option<String>,
    pub value: String,
}

/// Snapshot of the DOM facts the checklist looks at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageProbe {
    pub url: String,
    pub title: String,
    pub errors: Vec<SelectorHit>,
    pub loaders: Vec<SelectorHit>,
    pub tables: Vec<TableInfo>,
    pub charts: Vec<ChartInfo>,
    pub metrics: Vec<Metric>,
}

// ── Anomalies ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    ErrorMessage,
    StuckLoader,
    EmptyTable,
    UndersizedChart,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    pub message: String,
}

pub type CheckFn = fn(&PageProbe) -> Vec<Anomaly>;

/// The fixed checklist, evaluated in order.
pub const CHECKLIST: &[(&str, CheckFn)] = &[
    ("error_messages", error_messages),
    ("stuck_loaders", stuck_loaders),
    ("empty_tables", empty_tables),
    ("undersized_charts", undersized_charts),
];

/// Visible error banners or alerts.
pub fn error_messages(probe: &PageProbe) -> Vec<Anomaly> {
    probe
        .errors
        .iter()
        .map(|hit| Anomaly {
            kind: AnomalyKind::ErrorMessage,
            selector: Some(hit.selector.clone()),
            message: if hit.text.is_empty() {
                "error element visible".to_string()
            } else {
                format!("error element visible: {}", hit.text)
            },
        })
        .collect()
}

/// Loading indicators still visible after the settle delay.
pub fn stuck_loaders(probe: &PageProbe) -> Vec<Anomaly> {
    probe
        .loaders
        .iter()
        .map(|hit| Anomaly {
            kind: AnomalyKind::StuckLoader,
            selector: Some(hit.selector.clone()),
            message: "loading indicator still visible after page settled".to_string(),
        })
        .collect()
}

pub fn empty_tables(probe: &PageProbe) -> Vec<Anomaly> {
    probe
        .tables
        .iter()
        .filter(|t| t.rows == 0)
        .map(|t| Anomaly {
            kind: AnomalyKind::EmptyTable,
            selector: Some(match t.id {
                Some(ref id) => format!("table#{id}"),
                None => format!("table:nth-of-type({})", t.index + 1),
            }),
            message: format!("table {} has no data rows", t.index),
        })
        .collect()
}

pub fn undersized_charts(probe: &PageProbe) -> Vec<Anomaly> {
    probe
        .charts
        .iter()
        .filter(|c| c.width < MIN_CHART_WIDTH || c.height < MIN_CHART_HEIGHT)
        .map(|c| Anomaly {
            kind: AnomalyKind::UndersizedChart,
            selector: Some(match c.id {
                Some(ref id) => format!("#{id}"),
                None => c.selector.clone(),
            }),
            message: format!(
                "chart {} rendered at {:.0}x{:.0}px (minimum {MIN_CHART_WIDTH:.0}x{MIN_CHART_HEIGHT:.0})",
                c.index, c.width, c.height
            ),
        })
        .collect()
}

/// Run every check in [`CHECKLIST`] and concatenate the findings.
pub fn evaluate(probe: &PageProbe) -> Vec<Anomaly> {
    CHECKLIST
        .iter()
        .flat_map(|(name, check)| {
            let found = check(probe);
            debug!(check = *name, anomalies = found.len(), "ran dashboard check");
            found
        })
        .collect()
}

// ── Results ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Healthy,
    IssuesDetected,
    Error,
}

/// Status for a check that produced a probe.
pub fn classify(anomalies: &[Anomaly]) -> Status {
    if anomalies.is_empty() {
        Status::Healthy
    } else {
        Status::IssuesDetected
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckData {
    pub metrics: Vec<Metric>,
    pub tables: Vec<TableInfo>,
    pub charts: Vec<ChartInfo>,
}

/// One entry of the monitoring report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub check: u32,
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub status: Status,
    pub anomaly_count: usize,
    pub anomalies: Vec<Anomaly>,
    pub data: CheckData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    pub fn from_probe(check: u32, timestamp: DateTime<Utc>, url: &str, probe: PageProbe) -> Self {
        let anomalies = evaluate(&probe);
        Self {
            check,
            timestamp,
            url: url.to_string(),
            status: classify(&anomalies),
            anomaly_count: anomalies.len(),
            anomalies,
            data: CheckData {
                metrics: probe.metrics,
                tables: probe.tables,
                charts: probe.charts,
            },
            error: None,
        }
    }

    pub fn failed(check: u32, timestamp: DateTime<Utc>, url: &str, error: String) -> Self {
        Self {
            check,
            timestamp,
            url: url.to_string(),
            status: Status::Error,
            anomaly_count: 0,
            anomalies: Vec::new(),
            data: CheckData::default(),
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorSummary {
    pub checks: usize,
    pub healthy: usize,
    pub issues_detected: usize,
    pub errors: usize,
}

pub fn summarize(results: &[CheckResult]) -> MonitorSummary {
    results
        .iter()
        .fold(MonitorSummary::default(), |mut summary, result| {
            summary.checks += 1;
            match result.status {
                Status::Healthy => summary.healthy += 1,
                Status::IssuesDetected => summary.issues_detected += 1,
                Status::Error => summary.errors += 1,
            }
            summary
        })
}

// ── Running ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub url: String,
    pub checks: u32,
    pub interval: Duration,
}

async fn probe_page(driver: &mut dyn PageDriver, url: &str) -> Result<PageProbe, BrowserError> {
    driver.goto(url).await?;
    driver.wait_for_idle().await?;
    let raw = driver.evaluate(&probe_script()).await?;
    serde_json::from_value(raw)
        .map_err(|e| BrowserError::JsEvalFailed(format!("unexpected probe result: {e}")))
}

/// Run one check. Failures become a [`Status::Error`] entry.
pub async fn run_check(driver: &mut dyn PageDriver, url: &str, check: u32) -> CheckResult {
    let timestamp = Utc::now();
    match probe_page(driver, url).await {
        Ok(probe) => {
            let result = CheckResult::from_probe(check, timestamp, url, probe);
            info!(
                check,
                status = ?result.status,
                anomalies = result.anomaly_count,
                "dashboard check complete"
            );
            result
        },
        Err(e) => {
            warn!(check, url, error = %e, "dashboard check failed");
            CheckResult::failed(check, timestamp, url, e.to_string())
        },
    }
}

/// Run `options.checks` checks on the same page, sleeping `interval` between
/// them. Always returns exactly `options.checks` entries.
pub async fn run_monitor(
    driver: &mut dyn PageDriver,
    options: &MonitorOptions,
) -> Vec<CheckResult> {
    let mut results = Vec::with_capacity(options.checks as usize);
    for check in 1..=options.checks {
        results.push(run_check(driver, &options.url, check).await);
        if check < options.checks && !options.interval.is_zero() {
            debug!(
                interval_secs = options.interval.as_secs(),
                "sleeping until next check"
            );
            tokio::time::sleep(options.interval).await;
        }
    }
    results
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::driver::fake::FakePage, serde_json::json};

    fn healthy_probe() -> serde_json::Value {
        json!({
            "url": "https://dash.example.com",
            "title": "Sales",
            "errors": [],
            "loaders": [],
            "tables": [{ "index": 0, "id": "orders", "rows": 12, "columns": 4 }],
            "charts": [{ "index": 0, "selector": "canvas", "width": 640.0, "height": 320.0 }],
            "metrics": [{ "label": "Revenue", "value": "$12,400" }]
        })
    }

    fn broken_probe() -> serde_json::Value {
        json!({
            "errors": [{ "selector": ".alert-danger", "text": "Failed to load data" }],
            "loaders": [{ "selector": ".spinner", "text": "" }],
            "tables": [
                { "index": 0, "rows": 0, "columns": 3 },
                { "index": 1, "id": "ok", "rows": 5, "columns": 3 }
            ],
            "charts": [
                { "index": 0, "selector": "canvas", "id": "revenue", "width": 300.0, "height": 12.0 },
                { "index": 1, "selector": ".chart", "width": 400.0, "height": 200.0 }
            ]
        })
    }

    #[test]
    fn healthy_page_has_no_anomalies() {
        let probe: PageProbe = serde_json::from_value(healthy_probe()).unwrap();
        assert!(evaluate(&probe).is_empty());
        let result = CheckResult::from_probe(1, Utc::now(), "https://dash.example.com", probe);
        assert_eq!(result.status, Status::Healthy);
        assert_eq!(result.data.metrics[0].value, "$12,400");
    }

    #[test]
    fn checklist_finds_each_anomaly_kind_in_order() {
        let probe: PageProbe = serde_json::from_value(broken_probe()).unwrap();
        let anomalies = evaluate(&probe);
        let kinds: Vec<AnomalyKind> = anomalies.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![
            AnomalyKind::ErrorMessage,
            AnomalyKind::StuckLoader,
            AnomalyKind::EmptyTable,
            AnomalyKind::UndersizedChart,
        ]);
        assert!(anomalies[0].message.contains("Failed to load data"));
        assert_eq!(
            anomalies[2].selector.as_deref(),
            Some("table:nth-of-type(1)")
        );
        assert_eq!(anomalies[3].selector.as_deref(), Some("#revenue"));
        assert_eq!(classify(&anomalies), Status::IssuesDetected);
    }

    #[test]
    fn chart_threshold_is_exclusive() {
        let probe = PageProbe {
            charts: vec![ChartInfo {
                width: MIN_CHART_WIDTH,
                height: MIN_CHART_HEIGHT,
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(undersized_charts(&probe).is_empty());
    }

    #[test]
    fn result_serializes_with_report_field_names() {
        let probe: PageProbe = serde_json::from_value(broken_probe()).unwrap();
        let result = CheckResult::from_probe(3, Utc::now(), "https://dash.example.com", probe);
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["check"], 3);
        assert_eq!(v["status"], "issues_detected");
        assert_eq!(v["anomalyCount"], 4);
        assert_eq!(v["anomalies"][0]["type"], "error_message");
        assert!(v["data"]["tables"].is_array());
        assert!(v.get("error").is_none());
        assert!(v["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn probe_script_embeds_selectors() {
        let script = probe_script();
        assert!(!script.contains("__ERRORS__"));
        assert!(script.contains(".alert-danger"));
        assert!(script.contains("[aria-busy=\\\"true\\\"]"));
    }

    #[tokio::test]
    async fn monitor_produces_one_entry_per_check() {
        let mut page =
            FakePage::with_evaluations([healthy_probe(), broken_probe(), healthy_probe()]);
        let options = MonitorOptions {
            url: "https://dash.example.com".into(),
            checks: 3,
            interval: Duration::ZERO,
        };

        let results = run_monitor(&mut page, &options).await;

        assert_eq!(results.len(), 3);
        assert_eq!(page.calls("goto"), 3);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.check, i as u32 + 1);
            assert!(matches!(
                result.status,
                Status::Healthy | Status::IssuesDetected | Status::Error
            ));
        }
        assert!(results.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(summarize(&results), MonitorSummary {
            checks: 3,
            healthy: 2,
            issues_detected: 1,
            errors: 0,
        });
    }

    #[tokio::test]
    async fn failed_check_is_recorded_and_loop_continues() {
        let mut page = FakePage::with_evaluations([healthy_probe(), healthy_probe()]);
        page.failing_gotos.insert(2);
        let options = MonitorOptions {
            url: "https://dash.example.com".into(),
            checks: 3,
            interval: Duration::ZERO,
        };

        let results = run_monitor(&mut page, &options).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[1].status, Status::Error);
        assert!(
            results[1]
                .error
                .as_deref()
                .unwrap()
                .contains("ERR_CONNECTION_REFUSED")
        );
        assert_eq!(results[0].status, Status::Healthy);
        assert_eq!(results[2].status, Status::Healthy);
    }

    #[tokio::test]
    async fn garbage_probe_is_an_error_entry() {
        let mut page = FakePage::with_evaluations([json!("not an object")]);
        let result = run_check(&mut page, "https://dash.example.com", 1).await;
        assert_eq!(result.status, Status::Error);
        assert!(result.error.unwrap().contains("unexpected probe result"));
    }

    #[tokio::test]
    async fn zero_checks_is_empty() {
        let mut page = FakePage::default();
        let options = MonitorOptions {
            url: "https://dash.example.com".into(),
            checks: 0,
            interval: Duration::from_secs(60),
        };
        assert!(run_monitor(&mut page, &options).await.is_empty());
        assert_eq!(page.calls("goto"), 0);
    }
}
