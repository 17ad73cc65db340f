//! Smoke scripts: page exploration, diagnostics and demos
//!
//! These report what they saw and only fail when the browser or the
//! navigation fails.

use anyhow::Result;
use bookprobe_e2e::artifacts::ArtifactStore;
use bookprobe_e2e::diagnostics::{
    analyze_page, check_connection, dump_markup, fill_sample_form, run_demo, FormInspector,
    PageAnalysis,
};
use bookprobe_e2e::page::{nth, BrowserPage, GotoOptions, LoadState, SelectOption};
use bookprobe_e2e::ProbeConfig;
use clap::Args;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

use super::BrowserSession;
use crate::output::{print_document, print_list, print_pairs, OutputFormat, TableDisplay};

#[derive(Args, Debug)]
pub struct ExploreArgs {
    /// Page to explore (defaults to the test appointment page)
    pub url: Option<String>,

    /// Keep the browser open this many seconds afterwards
    #[arg(long, default_value = "0")]
    pub hold: u64,
}

#[derive(Args, Debug)]
pub struct UrlArgs {
    /// Page to load (defaults to the configured target)
    pub url: Option<String>,
}

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Page to open (defaults to the test appointment page)
    #[arg(long)]
    pub url: Option<String>,

    /// Option label picked in the first select
    #[arg(long, default_value = "Reparatie")]
    pub job: String,

    /// Seconds to keep the browser open
    #[arg(long, default_value = "600")]
    pub hold: u64,
}

#[derive(Serialize)]
pub struct ControlRow {
    pub kind: &'static str,
    pub name: String,
    pub detail: String,
}

impl TableDisplay for ControlRow {
    fn headers() -> Vec<&'static str> {
        vec!["Kind", "Name", "Detail"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.kind.to_string(), self.name.clone(), self.detail.clone()]
    }
}

fn control_rows(analysis: &PageAnalysis) -> Vec<ControlRow> {
    let mut rows = Vec::new();
    for (i, select) in analysis.selects.iter().enumerate() {
        let options: Vec<String> = select
            .options
            .iter()
            .map(|(value, label)| format!("{}: {}", value, label))
            .collect();
        rows.push(ControlRow {
            kind: "select",
            name: select
                .name
                .clone()
                .or_else(|| select.id.clone())
                .unwrap_or_else(|| format!("#{}", i)),
            detail: options.join(", "),
        });
    }
    for button in &analysis.buttons {
        rows.push(ControlRow {
            kind: "button",
            name: button.trim().to_string(),
            detail: String::new(),
        });
    }
    for input in &analysis.inputs {
        rows.push(ControlRow {
            kind: "input",
            name: input.name.clone().or_else(|| input.id.clone()).unwrap_or_default(),
            detail: format!(
                "type={} placeholder={}",
                input.input_type.as_deref().unwrap_or("text"),
                input.placeholder.as_deref().unwrap_or("")
            ),
        });
    }
    rows
}

async fn hold<P: BrowserPage + ?Sized>(page: &P, seconds: u64) {
    if seconds > 0 {
        info!("Holding the browser open for {} s", seconds);
        page.pause(Duration::from_secs(seconds)).await;
    }
}

pub async fn explore(args: ExploreArgs, config: &ProbeConfig, format: OutputFormat) -> Result<bool> {
    let url = args.url.unwrap_or_else(|| config.target.test_appointment_url.clone());
    let artifacts = ArtifactStore::new(&config.artifacts);
    let session = BrowserSession::launch(config).await?;
    let page = session.page();

    let result = async {
        page.goto(&url, &config.timeouts.goto_options()).await?;
        let analysis = analyze_page(page).await?;
        artifacts.capture(page, "page-screenshot").await;
        hold(page, args.hold).await;
        Ok::<_, anyhow::Error>(analysis)
    }
    .await;
    session.close().await;
    let analysis = result?;

    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_document(&analysis, format),
        _ => {
            print_pairs(
                &[("Title", analysis.title.clone()), ("URL", analysis.url.clone())],
                format,
            );
            print_list(&control_rows(&analysis), format);
        }
    }
    Ok(true)
}

pub async fn diagnose(args: UrlArgs, config: &ProbeConfig, format: OutputFormat) -> Result<bool> {
    let url = args.url.unwrap_or_else(|| config.target.base_url.clone());
    let artifacts = ArtifactStore::new(&config.artifacts);
    artifacts.ensure_dirs()?;
    let session = BrowserSession::launch(config).await?;
    let page = session.page();

    let result = async {
        let connection = check_connection(page, &url, config, &artifacts).await?;
        let markup = dump_markup(page, &artifacts).await?;
        let inspector = FormInspector::new(page);
        inspector.wait_for_loaders(config.timeouts.action()).await;
        let missing = inspector.missing_form_elements(config.timeouts.action()).await;
        let accessibility = inspector.basic_accessibility().await?;
        let errors = inspector.all_error_messages().await;
        Ok::<_, anyhow::Error>((connection, markup, missing, accessibility, errors))
    }
    .await;
    session.close().await;
    let (connection, markup, missing, accessibility, errors) = result?;

    print_pairs(
        &[
            ("URL", connection.url.clone()),
            ("Status", connection.status.map(|s| s.to_string()).unwrap_or_default()),
            ("Title", connection.title.clone()),
            ("Final URL", connection.final_url.clone()),
            ("Inputs", connection.inputs.to_string()),
            ("Selects", connection.selects.to_string()),
            ("Forms", connection.forms.to_string()),
            ("Form ready", connection.has_form_elements().to_string()),
            ("Missing controls", missing.join(", ")),
            ("Alt text on images", accessibility.has_alt_text.to_string()),
            ("Labelled inputs", accessibility.has_labels.to_string()),
            ("Headings", accessibility.has_headings.to_string()),
            ("Title set", accessibility.has_title.to_string()),
            ("Visible errors", errors.join(" | ")),
            ("Markup", markup.display().to_string()),
        ],
        format,
    );
    Ok(true)
}

pub async fn fill_sample(args: UrlArgs, config: &ProbeConfig, format: OutputFormat) -> Result<bool> {
    let url = args.url.unwrap_or_else(|| config.target.test_appointment_url.clone());
    let artifacts = ArtifactStore::new(&config.artifacts);
    let session = BrowserSession::launch(config).await?;
    let page = session.page();

    let result = async {
        page.goto(&url, &config.timeouts.goto_options()).await?;
        page.pause(config.timeouts.settle()).await;
        let fill = fill_sample_form(page).await?;
        let shot = artifacts.capture(page, "sample-fill").await;
        Ok::<_, anyhow::Error>((fill, shot))
    }
    .await;
    session.close().await;
    let (fill, shot) = result?;

    print_pairs(
        &[
            ("Filled", fill.filled.join(", ")),
            ("Selects set", fill.selects.to_string()),
            (
                "Screenshot",
                shot.map(|p| p.display().to_string()).unwrap_or_default(),
            ),
        ],
        format,
    );
    Ok(true)
}

pub async fn demo(config: &ProbeConfig, format: OutputFormat) -> Result<bool> {
    let artifacts = ArtifactStore::new(&config.artifacts);
    let session = BrowserSession::launch(config).await?;
    let result = run_demo(session.page(), config, &artifacts).await;
    session.close().await;
    let report = result?;

    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_document(&report, format),
        _ => {
            let mut pairs = vec![
                ("Target reachable", report.target_reachable.to_string()),
                ("Visited", report.visited.clone()),
                ("Title", report.title.clone()),
                ("Generated name", report.generated.name.clone()),
                ("Generated plate", report.generated.plate.clone()),
                ("Generated VIN", report.generated.vin.clone()),
            ];
            for (name, ok) in &report.checks {
                let key = match name.as_str() {
                    "phone" => "Phone valid",
                    "plate" => "Plate valid",
                    _ => "VIN valid",
                };
                pairs.push((key, ok.to_string()));
            }
            print_pairs(&pairs, format);
        }
    }
    Ok(true)
}

pub async fn open(args: OpenArgs, config: &ProbeConfig) -> Result<bool> {
    let url = args.url.unwrap_or_else(|| config.target.test_appointment_url.clone());
    let session = BrowserSession::launch(config).await?;
    let page = session.page();

    let result = async {
        let options = GotoOptions {
            wait_until: LoadState::NetworkIdle,
            timeout: config.timeouts.navigation(),
        };
        page.goto(&url, &options).await?;
        page.select_option(&nth("select", 0), &SelectOption::Label(args.job.clone()))
            .await?;
        info!("{} selected", args.job);
        hold(page, args.hold).await;
        Ok::<_, anyhow::Error>(())
    }
    .await;
    session.close().await;
    result?;
    Ok(true)
}
