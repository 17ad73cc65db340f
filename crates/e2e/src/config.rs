//! Probe configuration
//!
//! Defaults, then an optional TOML file, then environment overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::page::{GotoOptions, LoadState};
use crate::playwright::PlaywrightConfig;
use crate::selectors::FormSelectors;

/// Where the probes point
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Page hosting the vehicle form
    pub base_url: String,
    pub appointment_url: String,
    pub test_appointment_url: String,
    /// Neutral page used by the demo when the target is unreachable
    pub demo_url: String,
    /// Host whose scripts stay allowed when third-party scripts are blocked
    pub first_party_host: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "https://tvsengineering.com/".to_string(),
            appointment_url: "https://tvsengineering.com/en/appointment/".to_string(),
            test_appointment_url: "https://tvsengineering.com/en/test-appointment/".to_string(),
            demo_url: "https://example.com".to_string(),
            first_party_host: "tvsengineering.com".to_string(),
        }
    }
}

/// Fixed waits, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub navigation_ms: u64,
    pub action_ms: u64,
    pub scenario_ms: u64,
    /// Pause after landing on the form
    pub settle_ms: u64,
    /// Pause after each wizard step and after submit
    pub step_pause_ms: u64,
    /// How long an optional overlay gets to show up
    pub overlay_probe_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation_ms: 45_000,
            action_ms: 10_000,
            scenario_ms: 120_000,
            settle_ms: 5_000,
            step_pause_ms: 1_000,
            overlay_probe_ms: 3_000,
        }
    }
}

impl Timeouts {
    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    pub fn scenario(&self) -> Duration {
        Duration::from_millis(self.scenario_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn step_pause(&self) -> Duration {
        Duration::from_millis(self.step_pause_ms)
    }

    pub fn overlay_probe(&self) -> Duration {
        Duration::from_millis(self.overlay_probe_ms)
    }

    pub fn goto_options(&self) -> GotoOptions {
        GotoOptions {
            wait_until: LoadState::NetworkIdle,
            timeout: self.navigation(),
        }
    }

    /// Every pause set to zero; used when driving an in-memory page
    pub fn instant() -> Self {
        Self {
            navigation_ms: 1_000,
            action_ms: 1_000,
            scenario_ms: 10_000,
            settle_ms: 0,
            step_pause_ms: 0,
            overlay_probe_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub screenshot_dir: PathBuf,
    pub results_dir: PathBuf,
    /// Screenshot after every form step
    pub capture_steps: bool,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: PathBuf::from("screenshots"),
            results_dir: PathBuf::from("test-results"),
            capture_steps: true,
        }
    }
}

/// SMTP relay for payment failure notices
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub from: Option<String>,
    pub to: Vec<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: 587,
            username: None,
            password: None,
            from: None,
            to: Vec::new(),
        }
    }
}

impl NotifyConfig {
    /// Host, sender and at least one recipient are set
    pub fn is_configured(&self) -> bool {
        self.smtp_host.is_some() && self.from.is_some() && !self.to.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub target: TargetConfig,
    pub browser: PlaywrightConfig,
    pub timeouts: Timeouts,
    pub artifacts: ArtifactConfig,
    pub selectors: FormSelectors,
    pub notify: NotifyConfig,
}

impl ProbeConfig {
    /// Parse a TOML document
    pub fn from_toml(content: &str) -> E2eResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Defaults, optional file, then the process environment
    pub fn load(path: Option<&Path>) -> E2eResult<Self> {
        let mut config = match path {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                let content = std::fs::read_to_string(path).map_err(|e| {
                    E2eError::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.browser.action_timeout_ms = config.timeouts.action_ms;
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> E2eResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("BOOKPROBE_BASE_URL") {
            self.target.base_url = url;
        }
        if let Some(headless) = lookup("BOOKPROBE_HEADLESS") {
            self.browser.headless = parse_bool("BOOKPROBE_HEADLESS", &headless)?;
        }
        if let Some(dir) = lookup("BOOKPROBE_SCREENSHOT_DIR") {
            self.artifacts.screenshot_dir = PathBuf::from(dir);
        }
        if let Some(host) = lookup("SMTP_HOST") {
            self.notify.smtp_host = Some(host);
        }
        if let Some(port) = lookup("SMTP_PORT") {
            self.notify.smtp_port = port
                .parse()
                .map_err(|_| E2eError::Config(format!("SMTP_PORT is not a port: {}", port)))?;
        }
        if let Some(user) = lookup("SMTP_USER") {
            self.notify.username = Some(user);
        }
        if let Some(password) = lookup("SMTP_PASSWORD") {
            self.notify.password = Some(password);
        }
        if let Some(from) = lookup("NOTIFY_FROM") {
            self.notify.from = Some(from);
        }
        if let Some(to) = lookup("NOTIFY_TO") {
            self.notify.to = to
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> E2eResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(E2eError::Config(format!("{} is not a boolean: {}", key, other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ProbeConfig::default();
        assert_eq!(config.timeouts.navigation(), Duration::from_secs(45));
        assert_eq!(config.notify.smtp_port, 587);
        assert!(!config.notify.is_configured());
        assert_eq!(config.artifacts.screenshot_dir, PathBuf::from("screenshots"));
    }

    #[test]
    fn test_partial_toml() {
        let config = ProbeConfig::from_toml(
            r#"
            [target]
            base_url = "http://localhost:8080/"

            [timeouts]
            settle_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.target.base_url, "http://localhost:8080/");
        assert_eq!(config.timeouts.settle_ms, 0);
        assert_eq!(config.timeouts.action_ms, 10_000);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("BOOKPROBE_HEADLESS", "false"),
            ("SMTP_HOST", "smtp.example.org"),
            ("SMTP_PORT", "2525"),
            ("NOTIFY_FROM", "probe@example.org"),
            ("NOTIFY_TO", "ops@example.org, qa@example.org"),
        ]
        .into_iter()
        .collect();

        let mut config = ProbeConfig::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert!(!config.browser.headless);
        assert_eq!(config.notify.smtp_port, 2525);
        assert_eq!(config.notify.to, vec!["ops@example.org", "qa@example.org"]);
        assert!(config.notify.is_configured());
    }

    #[test]
    fn test_bad_port_rejected() {
        let mut config = ProbeConfig::default();
        let err = config
            .apply_env(|k| (k == "SMTP_PORT").then(|| "smtp".to_string()))
            .unwrap_err();
        assert!(matches!(err, E2eError::Config(_)));
    }

    #[test]
    fn test_password_not_serialized() {
        let mut config = ProbeConfig::default();
        config.notify.password = Some("secret".into());
        let out = toml::to_string(&config).unwrap();
        assert!(!out.contains("secret"));
    }
}
