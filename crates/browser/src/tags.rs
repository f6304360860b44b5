//! Tag-manager and analytics installation checker.

use std::sync::LazyLock;

use {
    regex::Regex,
    serde::{Deserialize, Serialize},
    tracing::info,
};

use crate::{driver::PageDriver, error::BrowserError};

const TAG_PROBE_JS: &str = r#"
(() => {
    const scripts = Array.from(document.scripts);
    const dl = window.dataLayer;
    const isArray = Array.isArray(dl);
    return {
        url: location.href,
        scriptSources: scripts.map((s) => s.src).filter(Boolean),
        inlineScripts: scripts.filter((s) => !s.src).map((s) => s.textContent || ''),
        noscriptHtml: Array.from(document.querySelectorAll('noscript')).map((n) => n.innerHTML),
        dataLayerPresent: isArray,
        dataLayerLength: isArray ? dl.length : 0,
        dataLayerEvents: isArray
            ? dl.slice(0, 50).map((e) => (e && typeof e.event === 'string') ? e.event : null).filter(Boolean)
            : [],
        gtmLoaded: typeof window.google_tag_manager === 'object',
        gtagDefined: typeof window.gtag === 'function',
    };
})()
"#;

// Only called with the literals below, which `tag_patterns_compile` covers.
#[allow(clippy::expect_used)]
fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("static tag pattern compiles")
}

static GTM_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"\bGTM-[A-Z0-9]{4,}\b"));
static GA4_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"\bG-[A-Z0-9]{6,}\b"));
static UA_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"\bUA-\d{4,10}-\d{1,4}\b"));

/// Raw facts gathered from the page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TagProbe {
    pub url: String,
    pub script_sources: Vec<String>,
    pub inline_scripts: Vec<String>,
    pub noscript_html: Vec<String>,
    pub data_layer_present: bool,
    pub data_layer_length: u64,
    pub data_layer_events: Vec<String>,
    pub gtm_loaded: bool,
    pub gtag_defined: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagReport {
    pub url: String,
    /// First container found, the one most pages have.
    pub gtm_container_id: Option<String>,
    pub gtm_containers: Vec<String>,
    pub gtm_loaded: bool,
    pub data_layer_present: bool,
    pub data_layer_length: u64,
    pub data_layer_events: Vec<String>,
    pub ga4_measurement_ids: Vec<String>,
    pub universal_analytics_ids: Vec<String>,
    pub gtag_defined: bool,
    pub recommendations: Vec<String>,
}

/// Unique matches in first-seen order.
fn find_ids<'a>(re: &Regex, texts: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for text in texts {
        for m in re.find_iter(text) {
            if !ids.iter().any(|id| id == m.as_str()) {
                ids.push(m.as_str().to_string());
            }
        }
    }
    ids
}

/// Turn a probe into a report with recommendations.
pub fn analyze_tags(probe: &TagProbe) -> TagReport {
    let texts = || {
        probe
            .script_sources
            .iter()
            .chain(&probe.inline_scripts)
            .chain(&probe.noscript_html)
            .map(String::as_str)
    };

    let gtm_containers = find_ids(&GTM_ID, texts());
    let ga4_measurement_ids = find_ids(&GA4_ID, texts());
    let universal_analytics_ids = find_ids(&UA_ID, texts());

    let mut recommendations = Vec::new();
    if gtm_containers.is_empty() {
        recommendations.push(
            "No Google Tag Manager container found; install the GTM snippet in <head> and <body>."
                .to_string(),
        );
    }
    if gtm_containers.len() > 1 {
        recommendations.push(format!(
            "Multiple GTM containers found ({}); consolidate unless this is intentional.",
            gtm_containers.join(", ")
        ));
    }
    if !gtm_containers.is_empty() && !probe.gtm_loaded {
        recommendations.push(
            "GTM snippet is present but the container did not load; check blockers and CSP."
                .to_string(),
        );
    }
    if !probe.data_layer_present {
        recommendations.push(
            "window.dataLayer is not defined; initialize it before the GTM snippet.".to_string(),
        );
    } else if probe.data_layer_length == 0 {
        recommendations.push("dataLayer is empty; no events were pushed on page load.".to_string());
    }
    if ga4_measurement_ids.is_empty() {
        recommendations.push(
            "No GA4 measurement ID found inline; confirm GA4 is configured inside GTM.".to_string(),
        );
    }
    if !universal_analytics_ids.is_empty() {
        recommendations.push(format!(
            "Universal Analytics IDs found ({}); UA no longer processes data, migrate to GA4.",
            universal_analytics_ids.join(", ")
        ));
    }
    if !gtm_containers.is_empty() && !ga4_measurement_ids.is_empty() && probe.gtag_defined {
        recommendations.push(
            "GA4 is hard-coded with gtag.js alongside GTM; pageviews may be double counted."
                .to_string(),
        );
    }

    TagReport {
        url: probe.url.clone(),
        gtm_container_id: gtm_containers.first().cloned(),
        gtm_containers,
        gtm_loaded: probe.gtm_loaded,
        data_layer_present: probe.data_layer_present,
        data_layer_length: probe.data_layer_length,
        data_layer_events: probe.data_layer_events.clone(),
        ga4_measurement_ids,
        universal_analytics_ids,
        gtag_defined: probe.gtag_defined,
        recommendations,
    }
}

/// Navigate to `url` and report its tag-manager setup.
pub async fn check_tags(driver: &mut dyn PageDriver, url: &str) -> Result<TagReport, BrowserError> {
    driver.goto(url).await?;
    driver.wait_for_idle().await?;
    let raw = driver.evaluate(TAG_PROBE_JS).await?;
    let mut probe: TagProbe = serde_json::from_value(raw)
        .map_err(|e| BrowserError::JsEvalFailed(format!("unexpected tag probe result: {e}")))?;
    if probe.url.is_empty() {
        probe.url = url.to_string();
    }

    let report = analyze_tags(&probe);
    info!(
        url,
        container = report.gtm_container_id.as_deref().unwrap_or("none"),
        ga4 = report.ga4_measurement_ids.len(),
        recommendations = report.recommendations.len(),
        "tag check complete"
    );
    Ok(report)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::driver::fake::FakePage, serde_json::json};

    const GTM_SNIPPET: &str = "(function(w,d,s,l,i){w[l]=w[l]||[];w[l].push({'gtm.start':\
        new Date().getTime(),event:'gtm.js'});})(window,document,'script','dataLayer','GTM-AB12CD');";

    #[test]
    fn tag_patterns_compile() {
        assert!(GTM_ID.is_match("GTM-AB12CD"));
        assert!(GA4_ID.is_match("gtag('config', 'G-ABC1234')"));
        assert!(UA_ID.is_match("UA-123456-1"));
        assert!(!GA4_ID.is_match("XG-ABC1234"));
    }

    #[test]
    fn well_configured_site() {
        let probe = TagProbe {
            url: "https://shop.example.com".into(),
            inline_scripts: vec![GTM_SNIPPET.into()],
            data_layer_present: true,
            data_layer_length: 3,
            gtm_loaded: true,
            script_sources: vec![
                "https://www.googletagmanager.com/gtag/js?id=G-ABCDEF1234".into(),
            ],
            ..Default::default()
        };
        let report = analyze_tags(&probe);
        assert_eq!(report.gtm_container_id.as_deref(), Some("GTM-AB12CD"));
        assert_eq!(report.ga4_measurement_ids, vec!["G-ABCDEF1234"]);
        assert!(report.recommendations.is_empty(), "{:?}", report.recommendations);
    }

    #[test]
    fn bare_site_gets_install_advice() {
        let report = analyze_tags(&TagProbe::default());
        assert!(report.gtm_container_id.is_none());
        assert!(report.recommendations.iter().any(|r| r.contains("No Google Tag Manager")));
        assert!(report.recommendations.iter().any(|r| r.contains("dataLayer is not defined")));
        assert!(report.recommendations.iter().any(|r| r.contains("No GA4")));
    }

    #[test]
    fn ids_are_deduplicated_in_order() {
        let probe = TagProbe {
            inline_scripts: vec![
                "gtag('config', 'UA-1234567-1'); gtag('config', 'G-ZZZZZZ99');".into(),
                "GTM-BBBB22 GTM-AAAA11 GTM-BBBB22".into(),
            ],
            noscript_html: vec![
                "<iframe src=\"https://www.googletagmanager.com/ns.html?id=GTM-AAAA11\">".into(),
            ],
            data_layer_present: true,
            data_layer_length: 0,
            gtm_loaded: true,
            gtag_defined: true,
            ..Default::default()
        };
        let report = analyze_tags(&probe);
        assert_eq!(report.gtm_containers, vec!["GTM-BBBB22", "GTM-AAAA11"]);
        assert_eq!(report.universal_analytics_ids, vec!["UA-1234567-1"]);
        let recs = report.recommendations.join("\n");
        assert!(recs.contains("Multiple GTM containers"));
        assert!(recs.contains("dataLayer is empty"));
        assert!(recs.contains("migrate to GA4"));
        assert!(recs.contains("double counted"));
    }

    #[test]
    fn lowercase_lookalikes_do_not_match() {
        let probe = TagProbe {
            inline_scripts: vec!["var id = 'gtm-abcd12'; var g = 'G-short';".into()],
            ..Default::default()
        };
        let report = analyze_tags(&probe);
        assert!(report.gtm_containers.is_empty());
        assert!(report.ga4_measurement_ids.is_empty());
    }

    #[tokio::test]
    async fn check_tags_uses_requested_url_when_probe_has_none() {
        let mut page = FakePage::with_evaluations([json!({
            "inlineScripts": [GTM_SNIPPET],
            "dataLayerPresent": true,
            "dataLayerLength": 2,
            "gtmLoaded": true
        })]);
        let report = check_tags(&mut page, "https://shop.example.com").await.unwrap();
        assert_eq!(report.url, "https://shop.example.com");
        assert_eq!(report.data_layer_length, 2);
        assert_eq!(page.log[0], "goto https://shop.example.com");
    }
}
