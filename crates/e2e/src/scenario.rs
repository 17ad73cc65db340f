//! Scenario suite and its runner
//!
//! Each scenario gets a fresh browser context from a `PageFactory`, runs
//! under its own timeout and produces a `ScenarioResult`. Scenarios that
//! only observe how the site copes with hostile conditions report
//! `Unconfirmed`; they fail only when the flow itself breaks.

use bookprobe_common::fixtures::performance_data;
use bookprobe_common::generate::{random_phone, random_record};
use bookprobe_common::validate::{divergence, precheck};
use bookprobe_common::{
    valid_record, CaseTable, Expectation, FormRecord, Outcome, RapidSubmissions, TestCase,
    Verdict,
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::artifacts::ArtifactStore;
use crate::config::ProbeConfig;
use crate::diagnostics::FormInspector;
use crate::error::{E2eError, E2eResult};
use crate::form::VehicleFormPage;
use crate::page::{BrowserPage, GotoOptions, LoadState, PageFactory, RouteAction, RouteRule};

pub const XSS_PAYLOAD: &str = r#"<script>alert("XSS Test")</script>"#;
pub const SQL_PAYLOAD: &str = "'; DROP TABLE users; --";

const JS_ERROR_SCRIPT: &str =
    "setTimeout(() => { throw new Error('Injected test error'); }, 1000);";
const MEMORY_SCRIPT: &str = "window.largeArray = new Array(1000000).fill(0)\
    .map((_, i) => ({ id: i, data: 'x'.repeat(100) }));";

const VIEWPORTS: [(u32, u32); 2] = [(320, 480), (3840, 2160)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Happy,
    Validation,
    Negative,
    Network,
    Concurrency,
    Security,
    Limits,
}

impl Tag {
    pub const ALL: [Tag; 7] = [
        Tag::Happy,
        Tag::Validation,
        Tag::Negative,
        Tag::Network,
        Tag::Concurrency,
        Tag::Security,
        Tag::Limits,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Happy => "happy",
            Tag::Validation => "validation",
            Tag::Negative => "negative",
            Tag::Network => "network",
            Tag::Concurrency => "concurrency",
            Tag::Security => "security",
            Tag::Limits => "limits",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Tag {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| E2eError::Config(format!("Unknown scenario tag: {}", s)))
    }
}

/// What a scenario does once it has its pages
#[derive(Debug, Clone)]
pub enum ScenarioKind {
    /// Valid record, step by step, screenshot before submitting
    HappyPath,
    /// Valid record through `fill_complete_form`
    HelperFill,
    /// Generated record
    RandomData,
    /// Form controls present after load
    PageLoad,
    /// One fixture case judged against its expectation
    Case(TestCase),
    RapidSubmissions(RapidSubmissions),
    LargeData(FormRecord),
    SlowNetwork { delay_ms: u64 },
    ConnectionLoss,
    ServerHang,
    BlockedCss,
    BlockedThirdPartyScripts,
    InjectedJsError,
    MemoryPressure,
    ConcurrentTabs { tabs: usize },
    /// Hostile text in the name field
    Payload { value: String },
    ViewportExtremes,
}

impl ScenarioKind {
    /// Pages the scenario needs in its context
    pub fn tabs(&self) -> usize {
        match self {
            ScenarioKind::ConcurrentTabs { tabs } => *tabs,
            _ => 1,
        }
    }

    /// Route patterns to clear when the scenario ends
    pub fn route_patterns(&self) -> &'static [&'static str] {
        match self {
            ScenarioKind::SlowNetwork { .. }
            | ScenarioKind::ConnectionLoss
            | ScenarioKind::ServerHang => &["**/*"],
            ScenarioKind::BlockedCss => &["**/*.css"],
            ScenarioKind::BlockedThirdPartyScripts => &["**/*.js"],
            _ => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub tags: Vec<Tag>,
    pub kind: ScenarioKind,
    /// Overrides the configured scenario timeout
    pub timeout: Option<Duration>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, tags: &[Tag], kind: ScenarioKind) -> Self {
        Self {
            name: name.into(),
            tags: tags.to_vec(),
            kind,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }
}

/// Every scenario, with one entry per case in `cases`
pub fn catalog(cases: &CaseTable) -> Vec<Scenario> {
    use ScenarioKind as K;

    let perf = performance_data();
    let mut scenarios = vec![
        Scenario::new("happy path", &[Tag::Happy], K::HappyPath),
        Scenario::new("helper fill", &[Tag::Happy], K::HelperFill),
        Scenario::new("random data", &[Tag::Happy], K::RandomData),
        Scenario::new("page load", &[Tag::Happy], K::PageLoad),
    ];

    for (group, case) in cases.all() {
        scenarios.push(Scenario::new(
            format!("{}: {}", group, case.name),
            &[Tag::Validation],
            K::Case(case.clone()),
        ));
    }

    scenarios.extend([
        Scenario::new(
            "rapid submissions",
            &[Tag::Negative, Tag::Limits],
            K::RapidSubmissions(perf.rapid),
        )
        .with_timeout(Duration::from_secs(300)),
        Scenario::new("large data", &[Tag::Negative, Tag::Limits], K::LargeData(perf.large)),
        Scenario::new(
            "slow network",
            &[Tag::Negative, Tag::Network],
            K::SlowNetwork { delay_ms: 2000 },
        ),
        Scenario::new("connection loss", &[Tag::Negative, Tag::Network], K::ConnectionLoss),
        Scenario::new("server hang", &[Tag::Negative, Tag::Network], K::ServerHang),
        Scenario::new("blocked css", &[Tag::Negative, Tag::Network], K::BlockedCss),
        Scenario::new(
            "blocked third-party scripts",
            &[Tag::Negative, Tag::Network],
            K::BlockedThirdPartyScripts,
        ),
        Scenario::new("injected js error", &[Tag::Negative], K::InjectedJsError),
        Scenario::new("memory pressure", &[Tag::Negative, Tag::Limits], K::MemoryPressure),
        Scenario::new(
            "concurrent tabs",
            &[Tag::Negative, Tag::Concurrency],
            K::ConcurrentTabs { tabs: 3 },
        ),
        Scenario::new(
            "xss payload",
            &[Tag::Negative, Tag::Security],
            K::Payload {
                value: XSS_PAYLOAD.to_string(),
            },
        ),
        Scenario::new(
            "sql payload",
            &[Tag::Negative, Tag::Security],
            K::Payload {
                value: SQL_PAYLOAD.to_string(),
            },
        ),
        Scenario::new(
            "viewport extremes",
            &[Tag::Negative, Tag::Limits],
            K::ViewportExtremes,
        ),
    ]);
    scenarios
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub tags: Vec<Tag>,
    pub verdict: Verdict,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub unconfirmed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// What a scenario body saw
struct Observation {
    verdict: Verdict,
    outcome: Option<Outcome>,
    notes: Vec<String>,
}

impl Observation {
    fn observed(outcome: Outcome) -> Self {
        info!(
            "Observed: errors={} success={} {:?}",
            outcome.has_errors, outcome.has_success, outcome.error_messages
        );
        Self {
            verdict: Verdict::Unconfirmed,
            outcome: Some(outcome),
            notes: Vec::new(),
        }
    }

    fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

type Progress = Box<dyn Fn(&ScenarioResult) + Send + Sync>;

pub struct SuiteRunner<'a, F: PageFactory> {
    factory: &'a F,
    config: &'a ProbeConfig,
    artifacts: ArtifactStore,
    scenarios: Vec<Scenario>,
    progress: Option<Progress>,
}

impl<'a, F: PageFactory> SuiteRunner<'a, F> {
    pub fn new(factory: &'a F, config: &'a ProbeConfig, cases: &CaseTable) -> Self {
        Self {
            factory,
            config,
            artifacts: ArtifactStore::new(&config.artifacts),
            scenarios: catalog(cases),
            progress: None,
        }
    }

    pub fn with_artifacts(mut self, artifacts: ArtifactStore) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Replace the scenario list
    pub fn with_scenarios(mut self, scenarios: Vec<Scenario>) -> Self {
        self.scenarios = scenarios;
        self
    }

    /// Called after every scenario
    pub fn on_result<C>(mut self, callback: C) -> Self
    where
        C: Fn(&ScenarioResult) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub async fn run_all(&self) -> SuiteResult {
        let all: Vec<&Scenario> = self.scenarios.iter().collect();
        self.run_scenarios(&all).await
    }

    pub async fn run_tagged(&self, tag: Tag) -> SuiteResult {
        let tagged: Vec<&Scenario> = self.scenarios.iter().filter(|s| s.has_tag(tag)).collect();
        self.run_scenarios(&tagged).await
    }

    /// Run the scenarios whose name contains `name`
    pub async fn run_named(&self, name: &str) -> E2eResult<SuiteResult> {
        let needle = name.to_lowercase();
        let matching: Vec<&Scenario> = self
            .scenarios
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .collect();
        if matching.is_empty() {
            return Err(E2eError::Config(format!("Scenario not found: {}", name)));
        }
        Ok(self.run_scenarios(&matching).await)
    }

    pub async fn run_scenarios(&self, scenarios: &[&Scenario]) -> SuiteResult {
        let start = Instant::now();
        let started_at = Utc::now();
        let mut results = Vec::with_capacity(scenarios.len());

        if let Err(e) = self.artifacts.ensure_dirs() {
            warn!("Artifact directories not created: {}", e);
        }
        info!("Running {} scenario(s)...", scenarios.len());

        for scenario in scenarios {
            let result = self.run_scenario(scenario).await;
            match result.verdict {
                Verdict::Pass => info!("✓ {} ({} ms)", result.name, result.duration_ms),
                Verdict::Unconfirmed => info!("~ {} ({} ms)", result.name, result.duration_ms),
                Verdict::Fail => error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unexpected outcome")
                ),
            }
            if let Some(progress) = &self.progress {
                progress(&result);
            }
            results.push(result);
        }

        let count = |v: Verdict| results.iter().filter(|r| r.verdict == v).count();
        let suite = SuiteResult {
            run_id: Uuid::new_v4().to_string(),
            started_at,
            total: results.len(),
            passed: count(Verdict::Pass),
            failed: count(Verdict::Fail),
            unconfirmed: count(Verdict::Unconfirmed),
            duration_ms: start.elapsed().as_millis() as u64,
            results,
        };

        info!(
            "Suite results: {} passed, {} failed, {} unconfirmed ({} ms)",
            suite.passed, suite.failed, suite.unconfirmed, suite.duration_ms
        );
        suite
    }

    /// Fresh context, timeout, route cleanup
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioResult {
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.name);

        let finish = |verdict: Verdict, observation: Option<Observation>, error: Option<String>| {
            let (outcome, notes) = observation
                .map(|o| (o.outcome, o.notes))
                .unwrap_or_default();
            ScenarioResult {
                name: scenario.name.clone(),
                tags: scenario.tags.clone(),
                verdict,
                duration_ms: start.elapsed().as_millis() as u64,
                outcome,
                notes,
                error,
            }
        };

        let pages = match self.factory.open(scenario.kind.tabs()).await {
            Ok(pages) if !pages.is_empty() => pages,
            Ok(_) => return finish(Verdict::Fail, None, Some("no page opened".into())),
            Err(e) => return finish(Verdict::Fail, None, Some(e.to_string())),
        };

        let limit = scenario.timeout.unwrap_or_else(|| self.config.timeouts.scenario());
        let run = tokio::time::timeout(limit, self.execute(&scenario.kind, &pages)).await;

        for pattern in scenario.kind.route_patterns() {
            for page in &pages {
                if let Err(e) = page.unroute(pattern).await {
                    debug!("Clearing route {} failed: {}", pattern, e);
                }
            }
        }
        if let Err(e) = self.factory.close(pages).await {
            warn!("Closing context failed: {}", e);
        }

        match run {
            Ok(Ok(observation)) => finish(observation.verdict, Some(observation), None),
            Ok(Err(e)) => finish(Verdict::Fail, None, Some(e.to_string())),
            Err(_) => finish(
                Verdict::Fail,
                None,
                Some(format!("timed out after {} s", limit.as_secs())),
            ),
        }
    }

    async fn execute(&self, kind: &ScenarioKind, pages: &[F::Page]) -> E2eResult<Observation> {
        let page = &pages[0];
        let form = VehicleFormPage::new(page, self.config).with_artifacts(&self.artifacts);

        match kind {
            ScenarioKind::HappyPath => {
                form.goto().await?;
                form.fill_without_submit(&valid_record()).await?;
                form.screenshot("before-submit").await;
                form.submit().await?;
                form.screenshot("after-submit").await;
                Ok(judged(Expectation::Success, form.outcome().await))
            }
            ScenarioKind::HelperFill => {
                form.goto().await?;
                form.fill_complete_form(&valid_record()).await?;
                form.screenshot("helper-fill").await;
                Ok(judged(Expectation::Success, form.outcome().await))
            }
            ScenarioKind::RandomData => {
                let record = random_record(&valid_record());
                info!("Generated record: {} / {} / {}", record.name, record.plate, record.vin);
                form.goto().await?;
                form.fill_complete_form(&record).await?;
                form.screenshot("random-data").await;
                let outcome = form.outcome().await;
                let observation = checked(&record, judged(Expectation::Success, outcome));
                Ok(observation)
            }
            ScenarioKind::PageLoad => {
                form.goto().await?;
                let title = page.title().await?;
                let inspector = FormInspector::new(page);
                let missing = inspector
                    .missing_form_elements(self.config.timeouts.action())
                    .await;
                let verdict = if missing.is_empty() { Verdict::Pass } else { Verdict::Fail };
                let mut observation = Observation {
                    verdict,
                    outcome: None,
                    notes: vec![format!("title: {}", title)],
                };
                if !missing.is_empty() {
                    observation.notes.push(format!("missing: {}", missing.join(", ")));
                }
                Ok(observation)
            }
            ScenarioKind::Case(case) => {
                form.goto().await?;
                form.fill_complete_form(&case.record).await?;
                form.screenshot(&case.name).await;
                let outcome = form.outcome().await;
                Ok(checked(&case.record, judged(case.expected, outcome)))
            }
            ScenarioKind::RapidSubmissions(rapid) => self.rapid(&form, rapid).await,
            ScenarioKind::LargeData(record) => {
                form.goto().await?;
                form.fill_complete_form(record).await?;
                form.screenshot("large-data").await;
                Ok(Observation::observed(form.outcome().await))
            }
            ScenarioKind::SlowNetwork { delay_ms } => {
                page.route(&RouteRule::new("**/*", RouteAction::Delay { ms: *delay_ms }))
                    .await?;
                form.goto().await?;
                form.fill_complete_form(&phone_record()).await?;
                form.screenshot("slow-connection").await;
                Ok(Observation::observed(form.outcome().await))
            }
            ScenarioKind::ConnectionLoss => {
                form.goto().await?;
                form.fill_without_submit(&phone_record()).await?;
                page.route(&RouteRule::new("**/*", RouteAction::Abort)).await?;
                let submitted = form.submit().await;
                page.pause(self.config.timeouts.step_pause() * 3).await;
                page.unroute("**/*").await?;
                form.screenshot("connection-lost").await;
                let observation = Observation::observed(form.outcome().await);
                Ok(match submitted {
                    Ok(()) => observation,
                    Err(e) => observation.note(format!("submit while offline: {}", e)),
                })
            }
            ScenarioKind::ServerHang => {
                page.route(&RouteRule::new("**/*", RouteAction::Hang)).await?;
                let options = GotoOptions {
                    wait_until: LoadState::Load,
                    timeout: self.config.timeouts.action(),
                };
                let note = match page.goto(&self.config.target.base_url, &options).await {
                    Ok(_) => match form.fill_complete_form(&phone_record()).await {
                        Ok(()) => "form filled while requests hung".to_string(),
                        Err(e) => format!("expected timeout: {}", e),
                    },
                    Err(e) => format!("expected timeout: {}", e),
                };
                info!("{}", note);
                page.unroute("**/*").await?;
                form.screenshot("server-timeout").await;
                Ok(Observation {
                    verdict: Verdict::Unconfirmed,
                    outcome: None,
                    notes: vec![note],
                })
            }
            ScenarioKind::BlockedCss => {
                page.route(&RouteRule::new("**/*.css", RouteAction::Abort)).await?;
                form.goto().await?;
                form.fill_complete_form(&phone_record()).await?;
                form.screenshot("no-css").await;
                Ok(Observation::observed(form.outcome().await))
            }
            ScenarioKind::BlockedThirdPartyScripts => {
                let host = self.config.target.first_party_host.clone();
                page.route(&RouteRule::new(
                    "**/*.js",
                    RouteAction::AbortUnlessHost { host },
                ))
                .await?;
                form.goto().await?;
                form.fill_complete_form(&phone_record()).await?;
                form.screenshot("blocked-scripts").await;
                Ok(Observation::observed(form.outcome().await))
            }
            ScenarioKind::InjectedJsError => {
                form.goto().await?;
                page.add_script(JS_ERROR_SCRIPT).await?;
                form.fill_complete_form(&phone_record()).await?;
                form.screenshot("js-error").await;
                Ok(Observation::observed(form.outcome().await))
            }
            ScenarioKind::MemoryPressure => {
                form.goto().await?;
                page.add_script(MEMORY_SCRIPT).await?;
                form.fill_complete_form(&phone_record()).await?;
                form.screenshot("memory-test").await;
                Ok(Observation::observed(form.outcome().await))
            }
            ScenarioKind::ConcurrentTabs { .. } => self.concurrent(pages).await,
            ScenarioKind::Payload { value } => {
                let record = FormRecord {
                    name: value.clone(),
                    phone: random_phone(),
                    ..valid_record()
                };
                form.goto().await?;
                form.fill_complete_form(&record).await?;
                form.screenshot("payload").await;
                Ok(Observation::observed(form.outcome().await))
            }
            ScenarioKind::ViewportExtremes => {
                let mut notes = Vec::new();
                for (width, height) in VIEWPORTS {
                    page.set_viewport(width, height).await?;
                    form.goto().await?;
                    form.fill_complete_form(&phone_record()).await?;
                    form.screenshot(&format!("viewport-{}x{}", width, height)).await;
                    let has_errors = form.has_errors().await;
                    info!("Viewport {}x{}: errors={}", width, height, has_errors);
                    notes.push(format!("{}x{}: errors={}", width, height, has_errors));
                }
                Ok(Observation {
                    verdict: Verdict::Unconfirmed,
                    outcome: None,
                    notes,
                })
            }
        }
    }

    /// Passes when at least one submission went through without errors
    async fn rapid(
        &self,
        form: &VehicleFormPage<'_, F::Page>,
        rapid: &RapidSubmissions,
    ) -> E2eResult<Observation> {
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for i in 1..=rapid.count {
            let record = FormRecord {
                name: format!("{} (Test {})", rapid.record.name, i),
                ..random_record(&rapid.record)
            };
            let result = async {
                form.goto().await?;
                form.fill_complete_form(&record).await?;
                Ok::<bool, E2eError>(form.has_errors().await)
            }
            .await;

            match result {
                Ok(false) => succeeded += 1,
                Ok(true) => failed += 1,
                Err(e) => {
                    warn!("Submission {} failed: {}", i, e);
                    failed += 1;
                }
            }
            form.page().pause(rapid.delay_between).await;
        }

        info!("Rapid submissions: {} ok, {} with errors", succeeded, failed);
        Ok(Observation {
            verdict: if succeeded > 0 { Verdict::Pass } else { Verdict::Fail },
            outcome: None,
            notes: vec![format!("{} ok, {} with errors", succeeded, failed)],
        })
    }

    /// Fill every tab at once; passes when any tab ends without errors
    async fn concurrent(&self, pages: &[F::Page]) -> E2eResult<Observation> {
        let runs = pages.iter().enumerate().map(|(i, page)| async move {
            let form = VehicleFormPage::new(page, self.config).with_artifacts(&self.artifacts);
            let record = FormRecord {
                name: format!("Concurrent User {}", i + 1),
                ..random_record(&valid_record())
            };
            let result = async {
                form.goto().await?;
                form.fill_complete_form(&record).await?;
                form.screenshot(&format!("concurrent-tab-{}", i + 1)).await;
                Ok::<bool, E2eError>(form.has_errors().await)
            }
            .await;
            (i + 1, result)
        });

        let mut clean = 0usize;
        let mut notes = Vec::new();
        for (tab, result) in join_all(runs).await {
            match result {
                Ok(has_errors) => {
                    if !has_errors {
                        clean += 1;
                    }
                    notes.push(format!("tab {}: errors={}", tab, has_errors));
                }
                Err(e) => {
                    warn!("Tab {} failed: {}", tab, e);
                    notes.push(format!("tab {}: {}", tab, e));
                }
            }
        }

        info!("Concurrent tabs without errors: {}/{}", clean, pages.len());
        Ok(Observation {
            verdict: if clean > 0 { Verdict::Pass } else { Verdict::Fail },
            outcome: None,
            notes,
        })
    }

    /// `suite-results.json` in the results directory
    pub fn write_results(&self, suite: &SuiteResult) -> E2eResult<PathBuf> {
        let path = self.artifacts.write_json("suite-results.json", suite)?;
        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

fn phone_record() -> FormRecord {
    FormRecord {
        phone: random_phone(),
        ..valid_record()
    }
}

fn judged(expected: Expectation, outcome: Outcome) -> Observation {
    let verdict = expected.judge(&outcome);
    if verdict == Verdict::Unconfirmed {
        info!(
            "Expected {}, observed errors={} {:?}",
            expected, outcome.has_errors, outcome.error_messages
        );
    }
    Observation {
        verdict,
        outcome: Some(outcome),
        notes: Vec::new(),
    }
}

/// Note where the site and the local validators disagree
fn checked(record: &FormRecord, observation: Observation) -> Observation {
    let Some(outcome) = observation.outcome.as_ref() else {
        return observation;
    };
    match divergence(&precheck(record), outcome) {
        Some(message) => {
            warn!("{}", message);
            observation.note(message)
        }
        None => observation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_covers_every_case() {
        let cases = CaseTable::builtin();
        let scenarios = catalog(&cases);
        let validation = scenarios.iter().filter(|s| s.has_tag(Tag::Validation)).count();
        assert_eq!(validation, cases.len());
        assert!(scenarios.iter().any(|s| s.name == "concurrent tabs"));
    }

    #[test]
    fn test_network_scenarios_clear_routes() {
        for scenario in catalog(&CaseTable::default()) {
            if scenario.has_tag(Tag::Network) {
                assert!(
                    !scenario.kind.route_patterns().is_empty(),
                    "{} leaves routes behind",
                    scenario.name
                );
            }
        }
    }

    #[test]
    fn test_tag_parse() {
        assert_eq!("Network".parse::<Tag>().unwrap(), Tag::Network);
        assert!("visual".parse::<Tag>().is_err());
    }

    #[test]
    fn test_unconfirmed_expectation_keeps_outcome() {
        let outcome = Outcome {
            has_errors: true,
            ..Default::default()
        };
        let observation = judged(Expectation::SuccessOrError, outcome.clone());
        assert_eq!(observation.verdict, Verdict::Unconfirmed);
        assert_eq!(observation.outcome, Some(outcome));
    }

    #[test]
    fn test_divergence_becomes_note() {
        let record = FormRecord {
            plate: "12".into(),
            ..valid_record()
        };
        let observation = checked(&record, judged(Expectation::Error, Outcome::default()));
        assert_eq!(observation.verdict, Verdict::Fail);
        assert_eq!(observation.notes.len(), 1);
    }
}
