//! Playwright browser automation
//!
//! A single `node` process runs an embedded driver script and keeps the
//! browser alive for the whole run. Commands go out as one JSON object per
//! line on stdin, replies come back the same way on stdout, tagged with the
//! request id so pages in different tasks can talk to it at once.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command as TokioCommand};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::page::{
    BrowserPage, ElementInfo, GotoOptions, LoadState, PageFactory, RouteRule, SelectOption,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(E2eError::Config(format!("unknown browser: {}", other))),
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// `node` executable
    pub node_binary: PathBuf,
    /// Directory holding the `playwright` package, exported as NODE_PATH
    pub node_modules: PathBuf,
    /// Default timeout Playwright applies to each action
    pub action_timeout_ms: u64,
    /// Upper bound on a single bridge round trip
    pub command_timeout_ms: u64,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            node_binary: PathBuf::from("node"),
            node_modules: PathBuf::from("node_modules"),
            action_timeout_ms: 10_000,
            command_timeout_ms: 120_000,
        }
    }
}

/// Check if Playwright is installed
pub fn check_playwright_installed() -> E2eResult<()> {
    let output = Command::new("npx")
        .args(["playwright", "--version"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match output {
        Ok(status) if status.success() => Ok(()),
        _ => Err(E2eError::PlaywrightNotFound),
    }
}

#[derive(Debug, Deserialize)]
struct BridgeReply {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
}

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<BridgeReply>>>>;

struct BridgeInner {
    outgoing: mpsc::UnboundedSender<String>,
    pending: Pending,
    next_id: AtomicU64,
    command_timeout: Duration,
    action_timeout_ms: u64,
}

impl BridgeInner {
    async fn request(&self, op: &str, page: Option<u64>, mut args: Value) -> E2eResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Value::Object(map) = &mut args {
            map.insert("id".into(), json!(id));
            map.insert("op".into(), json!(op));
            if let Some(page) = page {
                map.insert("page".into(), json!(page));
            }
        }

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        if self.outgoing.send(args.to_string()).is_err() {
            self.pending.lock().remove(&id);
            return Err(E2eError::BridgeClosed);
        }

        let reply = match tokio::time::timeout(self.command_timeout, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => return Err(E2eError::BridgeClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                return Err(E2eError::Timeout(format!("bridge reply to '{}'", op)));
            }
        };

        if reply.ok {
            Ok(reply.value)
        } else {
            Err(E2eError::Playwright(
                reply.error.unwrap_or_else(|| format!("{} failed", op)),
            ))
        }
    }
}

/// Running `node` process hosting one browser
pub struct PlaywrightBridge {
    inner: Arc<BridgeInner>,
    child: Mutex<Option<Child>>,
    viewport: (u32, u32),
    _script_dir: tempfile::TempDir,
}

impl PlaywrightBridge {
    /// Spawn the driver process and launch the browser
    pub async fn launch(config: &PlaywrightConfig) -> E2eResult<Self> {
        check_playwright_installed()?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        let node_path = absolute(&config.node_modules)?;
        debug!("Starting Playwright bridge: {}", script_path.display());

        let mut child = TokioCommand::new(&config.node_binary)
            .arg(&script_path)
            .env("NODE_PATH", &node_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                E2eError::Playwright(format!(
                    "failed to spawn {}: {}",
                    config.node_binary.display(),
                    e
                ))
            })?;

        let mut stdin = child.stdin.take().ok_or(E2eError::BridgeClosed)?;
        let stdout = child.stdout.take().ok_or(E2eError::BridgeClosed)?;
        let stderr = child.stderr.take().ok_or(E2eError::BridgeClosed)?;

        let (outgoing, mut rx) = mpsc::unbounded_channel::<String>();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));

        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if stdin.write_all(line.as_bytes()).await.is_err()
                    || stdin.write_all(b"\n").await.is_err()
                    || stdin.flush().await.is_err()
                {
                    warn!("Playwright bridge stdin closed");
                    break;
                }
            }
        });

        let reader_pending = pending.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                match serde_json::from_str::<BridgeReply>(&line) {
                    Ok(reply) => {
                        if let Some(tx) = reader_pending.lock().remove(&reply.id) {
                            let _ = tx.send(reply);
                        }
                    }
                    Err(_) => debug!("[bridge] {}", line),
                }
            }
            // dropping the senders wakes every waiter with BridgeClosed
            reader_pending.lock().clear();
        });

        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("[browser] {}", line);
            }
        });

        let inner = Arc::new(BridgeInner {
            outgoing,
            pending,
            next_id: AtomicU64::new(1),
            command_timeout: Duration::from_millis(config.command_timeout_ms),
            action_timeout_ms: config.action_timeout_ms,
        });

        inner
            .request(
                "launch",
                None,
                json!({ "browser": config.browser.as_str(), "headless": config.headless }),
            )
            .await?;

        info!(
            "Launched {} ({})",
            config.browser.as_str(),
            if config.headless { "headless" } else { "headed" }
        );

        Ok(Self {
            inner,
            child: Mutex::new(Some(child)),
            viewport: (config.viewport_width, config.viewport_height),
            _script_dir: script_dir,
        })
    }

    /// Fresh browser context with its own cookies and storage
    pub async fn new_context(&self, viewport: (u32, u32)) -> E2eResult<BrowserContext> {
        let id = self
            .inner
            .request(
                "new_context",
                None,
                json!({ "viewport": { "width": viewport.0, "height": viewport.1 } }),
            )
            .await?;
        let id = id
            .as_u64()
            .ok_or_else(|| E2eError::Playwright("context id missing".into()))?;

        Ok(BrowserContext {
            bridge: self.inner.clone(),
            id,
        })
    }

    /// Close the browser and stop the process
    pub async fn shutdown(&self) -> E2eResult<()> {
        let _ = tokio::time::timeout(
            Duration::from_secs(5),
            self.inner.request("shutdown", None, json!({})),
        )
        .await;

        let child = self.child.lock().take();
        if let Some(mut child) = child {
            #[cfg(unix)]
            if let Some(pid) = child.id() {
                use nix::sys::signal::{kill, Signal};
                use nix::unistd::Pid;

                let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            }
            if tokio::time::timeout(Duration::from_millis(500), child.wait())
                .await
                .is_err()
            {
                let _ = child.kill().await;
            }
        }
        info!("Browser closed");
        Ok(())
    }
}

impl Drop for PlaywrightBridge {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.lock().take() {
            let _ = child.start_kill();
        }
    }
}

#[async_trait]
impl PageFactory for PlaywrightBridge {
    type Page = PlaywrightPage;

    async fn open(&self, tabs: usize) -> E2eResult<Vec<PlaywrightPage>> {
        let context = self.new_context(self.viewport).await?;
        let mut pages = Vec::with_capacity(tabs.max(1));
        for _ in 0..tabs.max(1) {
            pages.push(context.new_page().await?);
        }
        Ok(pages)
    }

    async fn close(&self, pages: Vec<PlaywrightPage>) -> E2eResult<()> {
        let mut contexts: Vec<u64> = pages.iter().map(|p| p.context).collect();
        contexts.dedup();
        for context in contexts {
            self.inner
                .request("close_context", None, json!({ "context": context }))
                .await?;
        }
        Ok(())
    }
}

fn absolute(path: &Path) -> E2eResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Browser context; pages opened from it share cookies
pub struct BrowserContext {
    bridge: Arc<BridgeInner>,
    id: u64,
}

impl BrowserContext {
    pub async fn new_page(&self) -> E2eResult<PlaywrightPage> {
        let id = self
            .bridge
            .request(
                "new_page",
                None,
                json!({ "context": self.id, "action_timeout_ms": self.bridge.action_timeout_ms }),
            )
            .await?;
        let id = id
            .as_u64()
            .ok_or_else(|| E2eError::Playwright("page id missing".into()))?;

        Ok(PlaywrightPage {
            bridge: self.bridge.clone(),
            id,
            context: self.id,
        })
    }

    pub async fn close(&self) -> E2eResult<()> {
        self.bridge
            .request("close_context", None, json!({ "context": self.id }))
            .await?;
        Ok(())
    }
}

/// One tab driven through the bridge
pub struct PlaywrightPage {
    bridge: Arc<BridgeInner>,
    id: u64,
    context: u64,
}

impl PlaywrightPage {
    async fn call(&self, op: &str, args: Value) -> E2eResult<Value> {
        self.bridge.request(op, Some(self.id), args).await
    }

    async fn call_unit(&self, op: &str, args: Value) -> E2eResult<()> {
        self.call(op, args).await.map(|_| ())
    }
}

fn as_bool(value: Value) -> bool {
    value.as_bool().unwrap_or(false)
}

fn as_string(value: Value) -> String {
    value.as_str().map(str::to_string).unwrap_or_default()
}

#[async_trait]
impl BrowserPage for PlaywrightPage {
    async fn goto(&self, url: &str, options: &GotoOptions) -> E2eResult<Option<u16>> {
        let status = self
            .call(
                "goto",
                json!({
                    "url": url,
                    "wait_until": options.wait_until,
                    "timeout_ms": options.timeout.as_millis() as u64,
                }),
            )
            .await
            .map_err(|e| E2eError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(status.as_u64().map(|s| s as u16))
    }

    async fn url(&self) -> E2eResult<String> {
        self.call("url", json!({})).await.map(as_string)
    }

    async fn title(&self) -> E2eResult<String> {
        self.call("title", json!({})).await.map(as_string)
    }

    async fn count(&self, selector: &str) -> E2eResult<usize> {
        let n = self.call("count", json!({ "selector": selector })).await?;
        Ok(n.as_u64().unwrap_or(0) as usize)
    }

    async fn is_visible(&self, selector: &str, timeout: Option<Duration>) -> E2eResult<bool> {
        self.call(
            "is_visible",
            json!({
                "selector": selector,
                "timeout_ms": timeout.map(|t| t.as_millis() as u64),
            }),
        )
        .await
        .map(as_bool)
    }

    async fn is_enabled(&self, selector: &str) -> E2eResult<bool> {
        self.call("is_enabled", json!({ "selector": selector }))
            .await
            .map(as_bool)
    }

    async fn fill(&self, selector: &str, value: &str) -> E2eResult<()> {
        self.call_unit("fill", json!({ "selector": selector, "value": value }))
            .await
    }

    async fn click(&self, selector: &str, force: bool) -> E2eResult<()> {
        self.call_unit("click", json!({ "selector": selector, "force": force }))
            .await
    }

    async fn check(&self, selector: &str) -> E2eResult<()> {
        self.call_unit("check", json!({ "selector": selector })).await
    }

    async fn select_option(&self, selector: &str, option: &SelectOption) -> E2eResult<()> {
        self.call_unit(
            "select_option",
            json!({ "selector": selector, "option": option }),
        )
        .await
    }

    async fn input_value(&self, selector: &str) -> E2eResult<String> {
        self.call("input_value", json!({ "selector": selector }))
            .await
            .map(as_string)
    }

    async fn visible_texts(&self, selector: &str) -> E2eResult<Vec<String>> {
        let texts = self
            .call("visible_texts", json!({ "selector": selector }))
            .await?;
        Ok(serde_json::from_value(texts)?)
    }

    async fn describe(&self, selector: &str) -> E2eResult<Vec<ElementInfo>> {
        let infos = self.call("describe", json!({ "selector": selector })).await?;
        Ok(serde_json::from_value(infos)?)
    }

    async fn content(&self) -> E2eResult<String> {
        self.call("content", json!({})).await.map(as_string)
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> E2eResult<()> {
        let path = absolute(path)?;
        self.call_unit(
            "screenshot",
            json!({ "path": path.to_string_lossy(), "full_page": full_page }),
        )
        .await
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> E2eResult<()> {
        self.call_unit(
            "wait_for_load_state",
            json!({ "state": state, "timeout_ms": timeout.as_millis() as u64 }),
        )
        .await
    }

    async fn route(&self, rule: &RouteRule) -> E2eResult<()> {
        self.call_unit(
            "route",
            json!({ "pattern": rule.pattern, "action": rule.action }),
        )
        .await
    }

    async fn unroute(&self, pattern: &str) -> E2eResult<()> {
        self.call_unit("unroute", json!({ "pattern": pattern })).await
    }

    async fn set_viewport(&self, width: u32, height: u32) -> E2eResult<()> {
        self.call_unit("set_viewport", json!({ "width": width, "height": height }))
            .await
    }

    async fn add_script(&self, content: &str) -> E2eResult<()> {
        self.call_unit("add_script", json!({ "content": content }))
            .await
    }

    async fn close(&self) -> E2eResult<()> {
        self.call_unit("close_page", json!({})).await
    }
}

/// Driver script run by `node`
const BRIDGE_SCRIPT: &str = r##"
const readline = require('readline');
const playwright = require('playwright');

let browser = null;
let nextId = 1;
const contexts = new Map();
const pages = new Map();

const reply = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');
const first = (page, selector) => page.locator(selector).first();

const ops = {
  async launch(a) {
    browser = await playwright[a.browser].launch({ headless: a.headless });
    return null;
  },
  async new_context(a) {
    const ctx = await browser.newContext({ viewport: a.viewport });
    const id = nextId++;
    contexts.set(id, ctx);
    return id;
  },
  async close_context(a) {
    const ctx = contexts.get(a.context);
    if (ctx) {
      for (const [id, page] of pages) {
        if (page.context() === ctx) pages.delete(id);
      }
      await ctx.close();
      contexts.delete(a.context);
    }
    return null;
  },
  async new_page(a) {
    const ctx = contexts.get(a.context);
    if (!ctx) throw new Error('unknown context ' + a.context);
    const page = await ctx.newPage();
    page.setDefaultTimeout(a.action_timeout_ms);
    page.on('pageerror', (err) => process.stderr.write('pageerror: ' + err.message + '\n'));
    page.on('dialog', (dialog) => {
      process.stderr.write('dialog: ' + dialog.message() + '\n');
      dialog.dismiss().catch(() => {});
    });
    const id = nextId++;
    pages.set(id, page);
    return id;
  },
  async close_page(a, page) {
    await page.close();
    pages.delete(a.page);
    return null;
  },
  async goto(a, page) {
    const res = await page.goto(a.url, { waitUntil: a.wait_until, timeout: a.timeout_ms });
    return res ? res.status() : null;
  },
  async url(a, page) { return page.url(); },
  async title(a, page) { return await page.title(); },
  async count(a, page) { return await page.locator(a.selector).count(); },
  async is_visible(a, page) {
    const loc = first(page, a.selector);
    if (a.timeout_ms) {
      try {
        await loc.waitFor({ state: 'visible', timeout: a.timeout_ms });
        return true;
      } catch (e) {
        return false;
      }
    }
    return await loc.isVisible();
  },
  async is_enabled(a, page) { return await first(page, a.selector).isEnabled(); },
  async fill(a, page) { await first(page, a.selector).fill(a.value); return null; },
  async click(a, page) { await first(page, a.selector).click({ force: !!a.force }); return null; },
  async check(a, page) { await first(page, a.selector).check({ force: true }); return null; },
  async select_option(a, page) {
    const o = a.option;
    const arg = o.by === 'index' ? { index: o.option } : o.by === 'label' ? { label: o.option } : { value: o.option };
    await first(page, a.selector).selectOption(arg);
    return null;
  },
  async input_value(a, page) { return await first(page, a.selector).inputValue(); },
  async visible_texts(a, page) {
    const out = [];
    for (const el of await page.locator(a.selector).all()) {
      if (await el.isVisible()) out.push(((await el.textContent()) || '').trim());
    }
    return out;
  },
  async describe(a, page) {
    return await page.locator(a.selector).evaluateAll((els) => els.map((el) => ({
      tag: el.tagName.toLowerCase(),
      id: el.id || null,
      name: el.getAttribute('name'),
      type: el.getAttribute('type'),
      placeholder: el.getAttribute('placeholder'),
      value: el.getAttribute('value'),
      text: (el.textContent || '').trim().slice(0, 200),
      visible: !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length),
      options: el.tagName === 'SELECT'
        ? Array.from(el.options).map((o) => [o.value, (o.textContent || '').trim()])
        : [],
    })));
  },
  async content(a, page) { return await page.content(); },
  async screenshot(a, page) { await page.screenshot({ path: a.path, fullPage: !!a.full_page }); return null; },
  async wait_for_load_state(a, page) { await page.waitForLoadState(a.state, { timeout: a.timeout_ms }); return null; },
  async route(a, page) {
    const act = a.action;
    await page.route(a.pattern, (route) => {
      const ignore = () => {};
      switch (act.kind) {
        case 'delay':
          setTimeout(() => route.continue().catch(ignore), act.ms);
          break;
        case 'abort':
          route.abort('failed').catch(ignore);
          break;
        case 'abort_unless_host':
          if (route.request().url().includes(act.host)) route.continue().catch(ignore);
          else route.abort('failed').catch(ignore);
          break;
        default:
          break;
      }
    });
    return null;
  },
  async unroute(a, page) { await page.unroute(a.pattern); return null; },
  async set_viewport(a, page) { await page.setViewportSize({ width: a.width, height: a.height }); return null; },
  async add_script(a, page) { await page.addScriptTag({ content: a.content }); return null; },
  async shutdown() {
    if (browser) await browser.close();
    browser = null;
    setImmediate(() => process.exit(0));
    return null;
  },
};

const rl = readline.createInterface({ input: process.stdin });
rl.on('line', async (line) => {
  let msg;
  try {
    msg = JSON.parse(line);
  } catch (e) {
    return;
  }
  try {
    const op = ops[msg.op];
    if (!op) throw new Error('unknown op ' + msg.op);
    let page;
    if (msg.page !== undefined && msg.page !== null) {
      page = pages.get(msg.page);
      if (!page) throw new Error('unknown page ' + msg.page);
    }
    const value = await op(msg, page);
    reply({ id: msg.id, ok: true, value: value === undefined ? null : value });
  } catch (e) {
    reply({ id: msg.id, ok: false, error: e.message });
  }
});
rl.on('close', async () => {
  if (browser) await browser.close().catch(() => {});
  process.exit(0);
});
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playwright_config_default() {
        let config = PlaywrightConfig::default();
        assert_eq!(config.browser, Browser::Chromium);
        assert!(config.headless);
        assert_eq!(config.viewport_width, 1280);
    }

    #[test]
    fn test_browser_parse() {
        assert_eq!("webkit".parse::<Browser>().unwrap(), Browser::Webkit);
        assert!("lynx".parse::<Browser>().is_err());
    }

    #[test]
    fn test_bridge_script_covers_page_ops() {
        for op in [
            "goto", "count", "is_visible", "fill", "click", "check", "select_option",
            "visible_texts", "describe", "screenshot", "route", "unroute", "add_script",
        ] {
            assert!(BRIDGE_SCRIPT.contains(&format!("async {}(", op)), "missing op {}", op);
        }
    }

    #[tokio::test]
    async fn test_request_fails_when_bridge_gone() {
        let (outgoing, rx) = mpsc::unbounded_channel();
        drop(rx);
        let inner = BridgeInner {
            outgoing,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            command_timeout: Duration::from_secs(1),
            action_timeout_ms: 1000,
        };
        let err = inner.request("title", Some(1), json!({})).await.unwrap_err();
        assert!(matches!(err, E2eError::BridgeClosed));
        assert!(inner.pending.lock().is_empty());
    }

    #[tokio::test]
    async fn test_reply_routed_by_id() {
        let (outgoing, mut rx) = mpsc::unbounded_channel::<String>();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let inner = Arc::new(BridgeInner {
            outgoing,
            pending: pending.clone(),
            next_id: AtomicU64::new(7),
            command_timeout: Duration::from_secs(5),
            action_timeout_ms: 1000,
        });

        // stand-in for the node side: echo the selector back
        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                let msg: Value = serde_json::from_str(&line).unwrap();
                let reply = BridgeReply {
                    id: msg["id"].as_u64().unwrap(),
                    ok: true,
                    value: msg["selector"].clone(),
                    error: None,
                };
                if let Some(tx) = pending.lock().remove(&reply.id) {
                    let _ = tx.send(reply);
                }
            }
        });

        let page = PlaywrightPage {
            bridge: inner,
            id: 3,
            context: 1,
        };
        assert_eq!(page.input_value("#name").await.unwrap(), "#name");
        assert_eq!(page.input_value("#plate").await.unwrap(), "#plate");
    }
}
