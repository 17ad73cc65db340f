//! Scenario suite

use anyhow::{bail, Result};
use bookprobe_common::CaseTable;
use bookprobe_e2e::scenario::{catalog, Scenario, ScenarioResult, SuiteRunner, Tag};
use bookprobe_e2e::ProbeConfig;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

use super::launch_bridge;
use crate::output::{
    print_error, print_info, print_list, print_success, verdict_mark, OutputFormat, TableDisplay,
};

#[derive(Args, Debug)]
pub struct SuiteArgs {
    /// Run only scenarios with this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Run only scenarios whose name contains this text
    #[arg(short, long)]
    pub name: Option<String>,

    /// Directory of extra YAML case tables
    #[arg(long)]
    pub cases: Option<PathBuf>,

    /// Skip the built-in case table
    #[arg(long)]
    pub no_builtin: bool,

    /// List the scenarios instead of running them
    #[arg(long)]
    pub list: bool,
}

#[derive(Serialize)]
pub struct ScenarioRow {
    pub name: String,
    pub tags: String,
}

impl From<&Scenario> for ScenarioRow {
    fn from(scenario: &Scenario) -> Self {
        Self {
            name: scenario.name.clone(),
            tags: tag_list(&scenario.tags),
        }
    }
}

impl TableDisplay for ScenarioRow {
    fn headers() -> Vec<&'static str> {
        vec!["Scenario", "Tags"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.clone(), self.tags.clone()]
    }
}

#[derive(Serialize)]
pub struct ResultRow {
    #[serde(flatten)]
    pub result: ScenarioResult,
}

impl TableDisplay for ResultRow {
    fn headers() -> Vec<&'static str> {
        vec!["Scenario", "Verdict", "Duration", "Detail"]
    }

    fn row(&self) -> Vec<String> {
        let detail = match &self.result.error {
            Some(error) => error.clone(),
            None => self.result.notes.join("; "),
        };
        vec![
            self.result.name.clone(),
            verdict_mark(self.result.verdict),
            format!("{}ms", self.result.duration_ms),
            detail,
        ]
    }
}

fn tag_list(tags: &[Tag]) -> String {
    tags.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
}

fn load_cases(args: &SuiteArgs) -> Result<CaseTable> {
    let mut cases = if args.no_builtin {
        CaseTable::default()
    } else {
        CaseTable::builtin()
    };
    if let Some(dir) = &args.cases {
        cases.extend(CaseTable::load_dir(dir)?);
    }
    Ok(cases)
}

/// Scenarios the arguments select
fn selected<'s>(scenarios: &'s [Scenario], args: &SuiteArgs, tag: Option<Tag>) -> Vec<&'s Scenario> {
    let needle = args.name.as_deref().map(str::to_lowercase);
    scenarios
        .iter()
        .filter(|s| match (&needle, tag) {
            (Some(needle), _) => s.name.to_lowercase().contains(needle),
            (None, Some(tag)) => s.has_tag(tag),
            (None, None) => true,
        })
        .collect()
}

/// A run that selects nothing must not count as a pass
fn ensure_selected(chosen: &[&Scenario], args: &SuiteArgs, tag: Option<Tag>) -> Result<()> {
    if !chosen.is_empty() {
        return Ok(());
    }
    match (&args.name, tag) {
        (Some(name), _) => bail!("No scenario matches '{}'", name),
        (None, Some(tag)) => bail!("No scenario tagged '{}'", tag),
        (None, None) => bail!("No scenarios selected"),
    }
}

pub async fn execute(args: SuiteArgs, config: &ProbeConfig, format: OutputFormat) -> Result<bool> {
    let cases = load_cases(&args)?;
    let tag = args.tag.as_deref().map(str::parse::<Tag>).transpose()?;
    let scenarios = catalog(&cases);
    let chosen = selected(&scenarios, &args, tag);

    if args.list {
        let rows: Vec<ScenarioRow> = chosen.into_iter().map(ScenarioRow::from).collect();
        print_list(&rows, format);
        return Ok(true);
    }
    ensure_selected(&chosen, &args, tag)?;

    print_info(&format!("Running {} scenario(s) against {}", chosen.len(), config.target.base_url));
    let bar = ProgressBar::new(chosen.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let bridge = launch_bridge(config).await?;
    let progress = bar.clone();
    let runner = SuiteRunner::new(&bridge, config, &cases).on_result(move |result| {
        progress.set_message(result.name.clone());
        progress.inc(1);
    });

    let run = match (&args.name, tag) {
        (Some(name), _) => runner.run_named(name).await,
        (None, Some(tag)) => Ok(runner.run_tagged(tag).await),
        (None, None) => Ok(runner.run_all().await),
    };
    bar.finish_and_clear();
    if let Err(e) = bridge.shutdown().await {
        warn!("Browser shutdown failed: {}", e);
    }
    let suite = run?;

    let path = runner.write_results(&suite)?;
    let rows: Vec<ResultRow> = suite
        .results
        .iter()
        .cloned()
        .map(|result| ResultRow { result })
        .collect();
    print_list(&rows, format);

    let summary = format!(
        "{} passed, {} failed, {} observed in {} (results: {})",
        suite.passed,
        suite.failed,
        suite.unconfirmed,
        bookprobe_common::generate::format_duration(suite.duration_ms),
        path.display()
    );
    if suite.success() {
        print_success(&summary);
    } else {
        print_error(&summary);
    }
    Ok(suite.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(name: Option<&str>) -> SuiteArgs {
        SuiteArgs {
            tag: None,
            name: name.map(String::from),
            cases: None,
            no_builtin: false,
            list: true,
        }
    }

    #[test]
    fn test_selection_by_tag_and_name() {
        let scenarios = catalog(&CaseTable::builtin());
        let network = selected(&scenarios, &args(None), Some(Tag::Network));
        assert_eq!(network.len(), 5);

        let named = selected(&scenarios, &args(Some("PAYLOAD")), None);
        let names: Vec<&str> = named.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["xss payload", "sql payload"]);
    }

    #[test]
    fn test_extra_cases_loaded_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("extra.yaml"),
            "valid:\n  - name: extra\n    record: {}\n    expected: success\n",
        )
        .unwrap();
        let args = SuiteArgs {
            cases: Some(dir.path().to_path_buf()),
            no_builtin: true,
            ..args(None)
        };
        let cases = load_cases(&args).unwrap();
        assert_eq!(cases.len(), 1);
    }

    #[test]
    fn test_missing_cases_dir_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let args = SuiteArgs {
            cases: Some(dir.path().join("typo")),
            no_builtin: true,
            ..args(None)
        };
        assert!(load_cases(&args).is_err());
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let scenarios = catalog(&CaseTable::default());
        let chosen = selected(&scenarios, &args(None), Some(Tag::Validation));
        assert!(chosen.is_empty());
        let err = ensure_selected(&chosen, &args(None), Some(Tag::Validation)).unwrap_err();
        assert_eq!(err.to_string(), "No scenario tagged 'validation'");

        let all = selected(&scenarios, &args(None), None);
        assert!(ensure_selected(&all, &args(None), None).is_ok());
    }
}
