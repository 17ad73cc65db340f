//! In-memory page for driving the page objects without a browser
//!
//! Selectors are matched by exact string. Each registered element carries a
//! match count, visibility and value; clicks can reveal further elements so
//! a submit can make an error or success banner appear.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{E2eError, E2eResult};
use crate::page::{
    nth, BrowserPage, ElementInfo, GotoOptions, LoadState, PageFactory, RouteRule,
    SelectOption,
};

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub count: usize,
    pub visible: bool,
    pub enabled: bool,
    pub value: String,
    pub text: String,
    pub info: ElementInfo,
}

impl FakeElement {
    pub fn visible() -> Self {
        Self {
            count: 1,
            visible: true,
            enabled: true,
            value: String::new(),
            text: String::new(),
            info: ElementInfo::default(),
        }
    }

    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::visible()
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_info(mut self, info: ElementInfo) -> Self {
        self.info = info;
        self
    }
}

/// Everything the page was asked to do, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeAction {
    Goto(String),
    Fill { selector: String, value: String },
    Click(String),
    Check(String),
    Select { selector: String, option: SelectOption },
    Route(RouteRule),
    Unroute(String),
    Viewport(u32, u32),
    Script,
    Screenshot(PathBuf),
    Close,
}

#[derive(Default)]
struct FakeState {
    url: String,
    title: String,
    content: String,
    elements: HashMap<String, FakeElement>,
    reveals: HashMap<String, Vec<(String, FakeElement)>>,
    broken: HashSet<String>,
    failing_urls: HashSet<String>,
    routes: Vec<RouteRule>,
    actions: Vec<FakeAction>,
    pauses: Vec<Duration>,
}

#[derive(Default)]
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(self, title: &str) -> Self {
        self.state.lock().title = title.to_string();
        self
    }

    pub fn with_content(self, html: &str) -> Self {
        self.state.lock().content = html.to_string();
        self
    }

    pub fn with(self, selector: &str, element: FakeElement) -> Self {
        self.state.lock().elements.insert(selector.to_string(), element);
        self
    }

    /// Register the `index`-th `select` with `options` options
    pub fn with_select(self, index: usize, visible: bool, options: usize) -> Self {
        {
            let mut state = self.state.lock();
            let select = nth("select", index);
            let element = if visible { FakeElement::visible() } else { FakeElement::hidden() };
            state
                .elements
                .insert(format!("{} >> option", select), FakeElement::hidden().with_count(options));
            state.elements.insert(select, element);
            let total = state.elements.get("select").map(|e| e.count).unwrap_or(0);
            state.elements.insert(
                "select".to_string(),
                FakeElement::visible().with_count(total.max(index + 1)),
            );
        }
        self
    }

    /// Clicking `selector` makes `revealed` appear
    pub fn on_click(self, selector: &str, revealed: &str, element: FakeElement) -> Self {
        self.state
            .lock()
            .reveals
            .entry(selector.to_string())
            .or_default()
            .push((revealed.to_string(), element));
        self
    }

    /// Probing `selector` returns an error
    pub fn with_broken(self, selector: &str) -> Self {
        self.state.lock().broken.insert(selector.to_string());
        self
    }

    /// Navigating to `url` fails
    pub fn with_failing_url(self, url: &str) -> Self {
        self.state.lock().failing_urls.insert(url.to_string());
        self
    }

    pub fn actions(&self) -> Vec<FakeAction> {
        self.state.lock().actions.clone()
    }

    pub fn filled(&self) -> Vec<(String, String)> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                FakeAction::Fill { selector, value } => Some((selector, value)),
                _ => None,
            })
            .collect()
    }

    pub fn clicked(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                FakeAction::Click(s) | FakeAction::Check(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn active_routes(&self) -> Vec<RouteRule> {
        self.state.lock().routes.clone()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.state.lock().pauses.clone()
    }

    fn record(&self, action: FakeAction) {
        self.state.lock().actions.push(action);
    }

    fn probe(&self, selector: &str) -> E2eResult<Option<FakeElement>> {
        let state = self.state.lock();
        if state.broken.contains(selector) {
            return Err(E2eError::Playwright(format!("invalid selector: {}", selector)));
        }
        Ok(state.elements.get(selector).cloned())
    }

    fn require(&self, selector: &str) -> E2eResult<FakeElement> {
        self.probe(selector)?
            .filter(|e| e.count > 0)
            .ok_or_else(|| E2eError::Playwright(format!("no element matches {}", selector)))
    }
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn goto(&self, url: &str, _options: &GotoOptions) -> E2eResult<Option<u16>> {
        self.record(FakeAction::Goto(url.to_string()));
        let mut state = self.state.lock();
        if state.failing_urls.contains(url) {
            return Err(E2eError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        state.url = url.to_string();
        Ok(Some(200))
    }

    async fn url(&self) -> E2eResult<String> {
        Ok(self.state.lock().url.clone())
    }

    async fn title(&self) -> E2eResult<String> {
        Ok(self.state.lock().title.clone())
    }

    async fn count(&self, selector: &str) -> E2eResult<usize> {
        Ok(self.probe(selector)?.map(|e| e.count).unwrap_or(0))
    }

    async fn is_visible(&self, selector: &str, _timeout: Option<Duration>) -> E2eResult<bool> {
        Ok(self.probe(selector)?.map(|e| e.count > 0 && e.visible).unwrap_or(false))
    }

    async fn is_enabled(&self, selector: &str) -> E2eResult<bool> {
        Ok(self.require(selector)?.enabled)
    }

    async fn fill(&self, selector: &str, value: &str) -> E2eResult<()> {
        self.require(selector)?;
        self.record(FakeAction::Fill {
            selector: selector.to_string(),
            value: value.to_string(),
        });
        if let Some(element) = self.state.lock().elements.get_mut(selector) {
            element.value = value.to_string();
        }
        Ok(())
    }

    async fn click(&self, selector: &str, _force: bool) -> E2eResult<()> {
        self.require(selector)?;
        self.record(FakeAction::Click(selector.to_string()));
        let mut state = self.state.lock();
        if let Some(revealed) = state.reveals.remove(selector) {
            state.elements.extend(revealed);
        }
        Ok(())
    }

    async fn check(&self, selector: &str) -> E2eResult<()> {
        self.require(selector)?;
        self.record(FakeAction::Check(selector.to_string()));
        Ok(())
    }

    async fn select_option(&self, selector: &str, option: &SelectOption) -> E2eResult<()> {
        self.require(selector)?;
        self.record(FakeAction::Select {
            selector: selector.to_string(),
            option: option.clone(),
        });
        Ok(())
    }

    async fn input_value(&self, selector: &str) -> E2eResult<String> {
        Ok(self.require(selector)?.value)
    }

    async fn visible_texts(&self, selector: &str) -> E2eResult<Vec<String>> {
        Ok(self
            .probe(selector)?
            .filter(|e| e.visible)
            .map(|e| vec![e.text; e.count])
            .unwrap_or_default())
    }

    async fn describe(&self, selector: &str) -> E2eResult<Vec<ElementInfo>> {
        Ok(self
            .probe(selector)?
            .map(|e| vec![e.info; e.count])
            .unwrap_or_default())
    }

    async fn content(&self) -> E2eResult<String> {
        Ok(self.state.lock().content.clone())
    }

    async fn screenshot(&self, path: &Path, _full_page: bool) -> E2eResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, b"\x89PNG")?;
        self.record(FakeAction::Screenshot(path.to_path_buf()));
        Ok(())
    }

    async fn wait_for_load_state(&self, _state: LoadState, _timeout: Duration) -> E2eResult<()> {
        Ok(())
    }

    async fn route(&self, rule: &RouteRule) -> E2eResult<()> {
        self.record(FakeAction::Route(rule.clone()));
        self.state.lock().routes.push(rule.clone());
        Ok(())
    }

    async fn unroute(&self, pattern: &str) -> E2eResult<()> {
        self.record(FakeAction::Unroute(pattern.to_string()));
        self.state.lock().routes.retain(|r| r.pattern != pattern);
        Ok(())
    }

    async fn set_viewport(&self, width: u32, height: u32) -> E2eResult<()> {
        self.record(FakeAction::Viewport(width, height));
        Ok(())
    }

    async fn add_script(&self, _content: &str) -> E2eResult<()> {
        self.record(FakeAction::Script);
        Ok(())
    }

    async fn close(&self) -> E2eResult<()> {
        self.record(FakeAction::Close);
        Ok(())
    }

    async fn pause(&self, duration: Duration) {
        self.state.lock().pauses.push(duration);
    }
}

type Builder = Box<dyn Fn(usize) -> FakePage + Send + Sync>;

/// Builds a fresh `FakePage` per tab and keeps closed pages for inspection
pub struct FakeFactory {
    build: Builder,
    closed: Mutex<Vec<FakePage>>,
    opened: Mutex<usize>,
}

impl FakeFactory {
    /// `build` receives the tab index within the context
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(usize) -> FakePage + Send + Sync + 'static,
    {
        Self {
            build: Box::new(build),
            closed: Mutex::new(Vec::new()),
            opened: Mutex::new(0),
        }
    }

    /// Number of contexts opened so far
    pub fn contexts_opened(&self) -> usize {
        *self.opened.lock()
    }

    /// Action log of every closed page, in close order
    pub fn closed_actions(&self) -> Vec<Vec<FakeAction>> {
        self.closed.lock().iter().map(|p| p.actions()).collect()
    }

    /// Route rules still installed on each closed page
    pub fn closed_routes(&self) -> Vec<Vec<RouteRule>> {
        self.closed.lock().iter().map(|p| p.active_routes()).collect()
    }
}

#[async_trait]
impl PageFactory for FakeFactory {
    type Page = FakePage;

    async fn open(&self, tabs: usize) -> E2eResult<Vec<FakePage>> {
        *self.opened.lock() += 1;
        Ok((0..tabs.max(1)).map(|i| (self.build)(i)).collect())
    }

    async fn close(&self, pages: Vec<FakePage>) -> E2eResult<()> {
        self.closed.lock().extend(pages);
        Ok(())
    }
}
