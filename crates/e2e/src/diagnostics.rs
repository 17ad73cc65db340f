//! Smoke and diagnostic scripts
//!
//! These look at the live site and report what they saw. None of them
//! decide pass or fail; the suite in `scenario` does that.

use bookprobe_common::generate::random_record;
use bookprobe_common::{is_valid_phone, is_valid_plate, is_valid_vin, valid_record, FormRecord};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::artifacts::ArtifactStore;
use crate::config::ProbeConfig;
use crate::error::E2eResult;
use crate::page::{nth, BrowserPage, ElementInfo, GotoOptions, LoadState, SelectOption};

/// What a plain page load turned up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub url: String,
    pub status: Option<u16>,
    pub title: String,
    pub final_url: String,
    pub inputs: usize,
    pub selects: usize,
    pub forms: usize,
}

impl ConnectionReport {
    /// Any form element at all
    pub fn has_form_elements(&self) -> bool {
        self.inputs + self.selects + self.forms > 0
    }
}

/// Load `url` with a lenient wait and count the form elements
pub async fn check_connection<P>(
    page: &P,
    url: &str,
    config: &ProbeConfig,
    artifacts: &ArtifactStore,
) -> E2eResult<ConnectionReport>
where
    P: BrowserPage + ?Sized,
{
    info!("Checking connection to {}", url);
    let options = GotoOptions {
        wait_until: LoadState::DomContentLoaded,
        timeout: config.timeouts.navigation(),
    };

    let status = match page.goto(url, &options).await {
        Ok(status) => status,
        Err(e) => {
            warn!("Connection failed: {}", e);
            artifacts.capture(page, "connection-error").await;
            return Err(e);
        }
    };
    page.pause(config.timeouts.settle()).await;
    artifacts.capture(page, "simple-connection").await;

    let report = ConnectionReport {
        url: url.to_string(),
        status,
        title: page.title().await?,
        final_url: page.url().await?,
        inputs: page.count("input").await?,
        selects: page.count("select").await?,
        forms: page.count("form").await?,
    };
    info!(
        "{} input(s), {} select(s), {} form(s) on \"{}\"",
        report.inputs, report.selects, report.forms, report.title
    );
    Ok(report)
}

/// Structure of the form controls on a page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageAnalysis {
    pub title: String,
    pub url: String,
    pub selects: Vec<ElementInfo>,
    pub inputs: Vec<ElementInfo>,
    pub buttons: Vec<String>,
    pub checkboxes: Vec<ElementInfo>,
    pub radios: Vec<ElementInfo>,
}

pub async fn analyze_page<P>(page: &P) -> E2eResult<PageAnalysis>
where
    P: BrowserPage + ?Sized,
{
    let analysis = PageAnalysis {
        title: page.title().await?,
        url: page.url().await?,
        selects: page.describe("select").await?,
        inputs: page.describe("input").await?,
        buttons: page
            .visible_texts("button")
            .await?
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect(),
        checkboxes: page.describe(r#"input[type="checkbox"]"#).await?,
        radios: page.describe(r#"input[type="radio"]"#).await?,
    };

    for (i, select) in analysis.selects.iter().enumerate() {
        debug!(
            "select {}: id={:?} name={:?} options={}",
            i,
            select.id,
            select.name,
            select.options.len()
        );
    }
    info!(
        "{} select(s), {} input(s), {} visible button(s)",
        analysis.selects.len(),
        analysis.inputs.len(),
        analysis.buttons.len()
    );
    Ok(analysis)
}

/// Save the page markup for manual inspection
pub async fn dump_markup<P>(page: &P, artifacts: &ArtifactStore) -> E2eResult<PathBuf>
where
    P: BrowserPage + ?Sized,
{
    let path = artifacts.write_markup(page, "debug-page-content.html").await?;
    info!("Markup written to {}", path.display());
    Ok(path)
}

/// Fields touched by `fill_sample_form`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleFill {
    pub filled: Vec<String>,
    pub selects: usize,
}

const SAMPLE_INPUTS: [(&str, &str, &str); 3] = [
    (
        "name",
        r#"input[name*="name"], input[name*="naam"], input[placeholder*="name"], input[placeholder*="naam"]"#,
        "Juan Pérez",
    ),
    (
        "email",
        r#"input[type="email"], input[name*="email"], input[name*="mail"]"#,
        "juan.perez@example.com",
    ),
    (
        "phone",
        r#"input[type="tel"], input[name*="phone"], input[name*="telefoon"]"#,
        "+1234567890",
    ),
];

const SAMPLE_TEXTS: [&str; 2] = ["Additional information", "Comments about the service"];

/// Fill whatever generic form fields the page has
///
/// Each field is optional; a failure on one is logged and the rest go on.
pub async fn fill_sample_form<P>(page: &P) -> E2eResult<SampleFill>
where
    P: BrowserPage + ?Sized,
{
    let mut fill = SampleFill::default();

    for (label, selector, value) in SAMPLE_INPUTS {
        if page.count(selector).await? == 0 {
            continue;
        }
        match page.fill(&nth(selector, 0), value).await {
            Ok(()) => fill.filled.push(label.to_string()),
            Err(e) => warn!("Could not fill {}: {}", label, e),
        }
    }

    for i in 0..page.count("select").await? {
        let select = nth("select", i);
        if page.count(&format!("{} >> option", select)).await? <= 1 {
            continue;
        }
        match page.select_option(&select, &SelectOption::Index(1)).await {
            Ok(()) => fill.selects += 1,
            Err(e) => warn!("Could not set select {}: {}", i, e),
        }
    }

    let free_text = r#"textarea, input[type="text"]:not([name*="email"]):not([name*="phone"])"#;
    let count = page.count(free_text).await?.min(SAMPLE_TEXTS.len());
    for (i, text) in SAMPLE_TEXTS.iter().take(count).enumerate() {
        match page.fill(&nth(free_text, i), text).await {
            Ok(()) => fill.filled.push(format!("text {}", i + 1)),
            Err(e) => warn!("Could not fill text field {}: {}", i + 1, e),
        }
    }

    info!(
        "Sample form: {} field(s), {} select(s)",
        fill.filled.len(),
        fill.selects
    );
    Ok(fill)
}

/// HTTP reachability, independent of the browser
pub async fn probe_reachable(url: &str, timeout: Duration) -> bool {
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            warn!("HTTP client unavailable: {}", e);
            return false;
        }
    };
    match client.get(url).send().await {
        Ok(response) => {
            debug!("{} answered {}", url, response.status());
            !response.status().is_server_error()
        }
        Err(e) => {
            debug!("{} unreachable: {}", url, e);
            false
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoReport {
    pub target_reachable: bool,
    pub visited: String,
    pub title: String,
    pub screenshots: Vec<PathBuf>,
    pub fixture: FormRecord,
    pub generated: FormRecord,
    /// Validator name and verdict on the generated record
    pub checks: Vec<(String, bool)>,
}

/// Walk the tooling end to end; uses the neutral demo page when the
/// target cannot be reached
pub async fn run_demo<P>(
    page: &P,
    config: &ProbeConfig,
    artifacts: &ArtifactStore,
) -> E2eResult<DemoReport>
where
    P: BrowserPage + ?Sized,
{
    let target_reachable =
        probe_reachable(&config.target.base_url, config.timeouts.action()).await;
    let visited = if target_reachable {
        config.target.base_url.clone()
    } else {
        warn!(
            "{} unreachable, using {}",
            config.target.base_url, config.target.demo_url
        );
        config.target.demo_url.clone()
    };
    run_demo_on(page, &visited, target_reachable, config, artifacts).await
}

/// `run_demo` against a known URL
pub async fn run_demo_on<P>(
    page: &P,
    url: &str,
    target_reachable: bool,
    config: &ProbeConfig,
    artifacts: &ArtifactStore,
) -> E2eResult<DemoReport>
where
    P: BrowserPage + ?Sized,
{
    let options = GotoOptions {
        wait_until: LoadState::Load,
        timeout: config.timeouts.navigation(),
    };
    page.goto(url, &options).await?;

    let mut screenshots = Vec::new();
    screenshots.extend(artifacts.capture(page, "demo-page").await);

    let fixture = valid_record();
    let generated = random_record(&fixture);
    let checks = vec![
        ("phone".to_string(), is_valid_phone(&generated.phone)),
        ("plate".to_string(), is_valid_plate(&generated.plate)),
        ("vin".to_string(), is_valid_vin(&generated.vin)),
    ];
    for (name, ok) in &checks {
        info!("Generated {} valid: {}", name, ok);
    }

    screenshots.extend(artifacts.capture(page, "system-demo-final").await);

    Ok(DemoReport {
        target_reachable,
        visited: url.to_string(),
        title: page.title().await?,
        screenshots,
        fixture,
        generated,
        checks,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessibilityChecks {
    pub has_alt_text: bool,
    pub has_labels: bool,
    pub has_headings: bool,
    pub has_title: bool,
}

const LOADERS: [&str; 6] = [
    ".loading",
    ".spinner",
    ".loader",
    r#"[class*="loading"]"#,
    r#"[class*="spinner"]"#,
    r#"[aria-busy="true"]"#,
];

const FORM_ELEMENTS: [&str; 5] = [
    "select",
    r#"input[type="tel"]"#,
    r#"input[type="text"]"#,
    r#"input[type="checkbox"]"#,
    r#"button[type="submit"]"#,
];

const ALL_ERRORS: [&str; 6] = [
    ".error",
    ".alert",
    ".validation-error",
    ".field-error",
    r#"[role="alert"]"#,
    ".message.error",
];

/// Read-only queries used while poking at a form
pub struct FormInspector<'a, P: BrowserPage + ?Sized> {
    page: &'a P,
}

impl<'a, P: BrowserPage + ?Sized> FormInspector<'a, P> {
    pub fn new(page: &'a P) -> Self {
        Self { page }
    }

    /// Page has a select, an input and a submit control
    pub async fn is_form_ready(&self) -> bool {
        for selector in ["select", "input", r#"button[type="submit"], input[type="submit"]"#] {
            if self.page.count(selector).await.unwrap_or(0) == 0 {
                return false;
            }
        }
        true
    }

    /// Basic form controls that never became visible within `timeout`
    pub async fn missing_form_elements(&self, timeout: Duration) -> Vec<&'static str> {
        let mut missing = Vec::new();
        for selector in FORM_ELEMENTS {
            if !self.page.is_visible(selector, Some(timeout)).await.unwrap_or(false) {
                warn!("Form element not visible: {}", selector);
                missing.push(selector);
            }
        }
        missing
    }

    pub async fn count_visible(&self, selector: &str) -> usize {
        self.page
            .describe(selector)
            .await
            .map(|els| els.iter().filter(|e| e.visible).count())
            .unwrap_or(0)
    }

    /// Visible error texts across every known error style, de-duplicated
    pub async fn all_error_messages(&self) -> Vec<String> {
        let mut messages: Vec<String> = Vec::new();
        for selector in ALL_ERRORS {
            for text in self.page.visible_texts(selector).await.unwrap_or_default() {
                let text = text.trim().to_string();
                if !text.is_empty() && !messages.contains(&text) {
                    messages.push(text);
                }
            }
        }
        messages
    }

    /// Wait until no loader indicator is visible, giving each up to `timeout`
    pub async fn wait_for_loaders(&self, timeout: Duration) {
        for selector in LOADERS {
            let deadline = tokio::time::Instant::now() + timeout;
            while self.page.is_visible(selector, None).await.unwrap_or(false) {
                if tokio::time::Instant::now() >= deadline {
                    debug!("Loader {} still visible", selector);
                    break;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }

    pub async fn basic_accessibility(&self) -> E2eResult<AccessibilityChecks> {
        let checks = AccessibilityChecks {
            has_alt_text: self.page.count("img:not([alt])").await? == 0,
            has_labels: self
                .page
                .count("input:not([aria-label]):not([aria-labelledby])")
                .await?
                == 0,
            has_headings: self.page.count("h1, h2, h3, h4, h5, h6").await? > 0,
            has_title: !self.page.title().await?.is_empty(),
        };
        info!("Accessibility: {:?}", checks);
        Ok(checks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::testing::{FakeElement, FakePage};

    #[tokio::test]
    async fn test_connection_counts_elements() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::in_dir(dir.path());
        let page = FakePage::new()
            .with_title("Afspraak")
            .with("input", FakeElement::visible().with_count(4))
            .with("form", FakeElement::visible());
        let config = ProbeConfig {
            timeouts: Timeouts::instant(),
            ..Default::default()
        };

        let report = check_connection(&page, "https://site.test/nl/afspraak", &config, &store)
            .await
            .unwrap();
        assert_eq!(report.inputs, 4);
        assert_eq!(report.selects, 0);
        assert!(report.has_form_elements());
        assert_eq!(std::fs::read_dir(store.screenshot_dir()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_failed_connection_still_screenshots() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::in_dir(dir.path());
        let page = FakePage::new().with_failing_url("https://down.test/");
        let config = ProbeConfig::default();

        assert!(check_connection(&page, "https://down.test/", &config, &store)
            .await
            .is_err());
        let names: Vec<String> = std::fs::read_dir(store.screenshot_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names[0].starts_with("connection-error-"));
    }

    #[tokio::test]
    async fn test_sample_fill_skips_missing_fields() {
        let email = r#"input[type="email"], input[name*="email"], input[name*="mail"]"#;
        let page = FakePage::new()
            .with(email, FakeElement::visible())
            .with(&nth(email, 0), FakeElement::visible())
            .with_select(0, true, 3)
            .with_select(1, true, 1);

        let fill = fill_sample_form(&page).await.unwrap();
        assert_eq!(fill.filled, vec!["email"]);
        assert_eq!(fill.selects, 1);
    }

    #[tokio::test]
    async fn test_error_messages_merge_styles() {
        let page = FakePage::new()
            .with(".error", FakeElement::visible().with_text(" Verplicht veld "))
            .with(".message.error", FakeElement::visible().with_text("Verplicht veld"))
            .with(r#"[role="alert"]"#, FakeElement::visible().with_text("Ongeldig"));
        let inspector = FormInspector::new(&page);
        assert_eq!(
            inspector.all_error_messages().await,
            vec!["Verplicht veld", "Ongeldig"]
        );
    }
}
