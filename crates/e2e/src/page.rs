//! Browser page abstraction
//!
//! Everything above this module talks to a page through `BrowserPage`.
//! Selectors are Playwright selector strings (`css`, `text=`, `role=`);
//! single-element operations act on the first match.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::E2eResult;

/// A selector that resolved to a visible element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub selector: String,
}

impl Locator {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }

    /// The n-th match of this selector
    pub fn nth(&self, index: usize) -> Locator {
        Locator::new(nth(&self.selector, index))
    }
}

/// `selector >> nth=index`
pub fn nth(selector: &str, index: usize) -> String {
    format!("{} >> nth={}", selector, index)
}

/// `role=<role>[name=...]`; a name wrapped in slashes is matched as a pattern
pub fn role(role: &str, name: &str) -> String {
    if name.starts_with('/') {
        format!("role={}[name={}]", role, name)
    } else {
        format!("role={}[name=\"{}\"]", role, name.replace('"', "\\\""))
    }
}

/// `text=<text>`
pub fn text(text: &str) -> String {
    format!("text={}", text)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "option", rename_all = "snake_case")]
pub enum SelectOption {
    Index(usize),
    Label(String),
    Value(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Load,
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    #[default]
    NetworkIdle,
}

#[derive(Debug, Clone)]
pub struct GotoOptions {
    pub wait_until: LoadState,
    pub timeout: Duration,
}

impl Default for GotoOptions {
    fn default() -> Self {
        Self {
            wait_until: LoadState::NetworkIdle,
            timeout: Duration::from_secs(45),
        }
    }
}

/// What a route rule does with matching requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteAction {
    /// Continue after a fixed delay
    Delay { ms: u64 },
    /// Fail the request
    Abort,
    /// Fail unless the request URL contains `host`
    AbortUnlessHost { host: String },
    /// Never answer
    Hang,
}

/// Network interception installed on one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    /// Glob such as `**/*` or `**/*.css`
    pub pattern: String,
    pub action: RouteAction,
}

impl RouteRule {
    pub fn new(pattern: impl Into<String>, action: RouteAction) -> Self {
        Self {
            pattern: pattern.into(),
            action,
        }
    }
}

/// Attributes of one element, used by the page analysis dumps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementInfo {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub input_type: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub visible: bool,
    /// `(value, label)` pairs for `select` elements
    #[serde(default)]
    pub options: Vec<(String, String)>,
}

/// The browser capability every probe is written against
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate; returns the main response status when there is one
    async fn goto(&self, url: &str, options: &GotoOptions) -> E2eResult<Option<u16>>;

    async fn url(&self) -> E2eResult<String>;

    async fn title(&self) -> E2eResult<String>;

    /// Number of elements matching `selector`
    async fn count(&self, selector: &str) -> E2eResult<usize>;

    /// Whether the first match is visible, waiting up to `timeout` for it
    async fn is_visible(&self, selector: &str, timeout: Option<Duration>) -> E2eResult<bool>;

    async fn is_enabled(&self, selector: &str) -> E2eResult<bool>;

    async fn fill(&self, selector: &str, value: &str) -> E2eResult<()>;

    async fn click(&self, selector: &str, force: bool) -> E2eResult<()>;

    async fn check(&self, selector: &str) -> E2eResult<()>;

    async fn select_option(&self, selector: &str, option: &SelectOption) -> E2eResult<()>;

    async fn input_value(&self, selector: &str) -> E2eResult<String>;

    /// Text of every visible match
    async fn visible_texts(&self, selector: &str) -> E2eResult<Vec<String>>;

    async fn describe(&self, selector: &str) -> E2eResult<Vec<ElementInfo>>;

    /// Full page markup
    async fn content(&self) -> E2eResult<String>;

    async fn screenshot(&self, path: &Path, full_page: bool) -> E2eResult<()>;

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> E2eResult<()>;

    async fn route(&self, rule: &RouteRule) -> E2eResult<()>;

    async fn unroute(&self, pattern: &str) -> E2eResult<()>;

    async fn set_viewport(&self, width: u32, height: u32) -> E2eResult<()>;

    /// Inject a script tag into the current document
    async fn add_script(&self, content: &str) -> E2eResult<()>;

    async fn close(&self) -> E2eResult<()>;

    /// Fixed wait
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Hands out fresh, isolated pages
#[async_trait]
pub trait PageFactory: Send + Sync {
    type Page: BrowserPage + 'static;

    /// A new browser context with `tabs` pages in it
    async fn open(&self, tabs: usize) -> E2eResult<Vec<Self::Page>>;

    /// Close pages obtained from `open` together with their context
    async fn close(&self, pages: Vec<Self::Page>) -> E2eResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_selector() {
        assert_eq!(role("button", "Volgende"), r#"role=button[name="Volgende"]"#);
        assert_eq!(role("button", "/Gepland/"), "role=button[name=/Gepland/]");
    }

    #[test]
    fn test_nth_selector() {
        assert_eq!(Locator::new("select").nth(2).selector, "select >> nth=2");
    }

    #[test]
    fn test_route_rule_serializes_tagged() {
        let rule = RouteRule::new("**/*", RouteAction::Delay { ms: 2000 });
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["action"]["kind"], "delay");
        assert_eq!(json["action"]["ms"], 2000);
    }
}
