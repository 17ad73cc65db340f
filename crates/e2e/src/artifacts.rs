//! Screenshot and markup dumps
//!
//! Everything written here is a disposable diagnostic. A failed capture is
//! logged and never fails the step that asked for it.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ArtifactConfig;
use crate::error::E2eResult;
use crate::page::BrowserPage;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    screenshot_dir: PathBuf,
    results_dir: PathBuf,
    capture_steps: bool,
    /// Shared by clones so concurrent tabs never reuse a file name
    sequence: Arc<AtomicU64>,
}

impl ArtifactStore {
    pub fn new(config: &ArtifactConfig) -> Self {
        Self {
            screenshot_dir: config.screenshot_dir.clone(),
            results_dir: config.results_dir.clone(),
            capture_steps: config.capture_steps,
            sequence: Arc::default(),
        }
    }

    /// Store rooted at `root/screenshots` and `root/test-results`
    pub fn in_dir(root: &Path) -> Self {
        Self {
            screenshot_dir: root.join("screenshots"),
            results_dir: root.join("test-results"),
            capture_steps: true,
            sequence: Arc::default(),
        }
    }

    pub fn screenshot_dir(&self) -> &Path {
        &self.screenshot_dir
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn captures_steps(&self) -> bool {
        self.capture_steps
    }

    pub fn ensure_dirs(&self) -> E2eResult<()> {
        std::fs::create_dir_all(&self.screenshot_dir)?;
        std::fs::create_dir_all(&self.results_dir)?;
        Ok(())
    }

    /// Full-page screenshot at `<label>-<unix millis>-<seq>.png`
    pub async fn capture<P>(&self, page: &P, label: &str) -> Option<PathBuf>
    where
        P: BrowserPage + ?Sized,
    {
        if let Err(e) = std::fs::create_dir_all(&self.screenshot_dir) {
            warn!("Cannot create {}: {}", self.screenshot_dir.display(), e);
            return None;
        }

        let path = self.screenshot_dir.join(format!(
            "{}-{}-{}.png",
            sanitize(label),
            chrono::Utc::now().timestamp_millis(),
            self.sequence.fetch_add(1, Ordering::Relaxed)
        ));

        match page.screenshot(&path, true).await {
            Ok(()) => {
                debug!("Screenshot: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Screenshot '{}' failed: {}", label, e);
                None
            }
        }
    }

    /// Step screenshot, only when step capture is on
    pub async fn capture_step<P>(&self, page: &P, label: &str) -> Option<PathBuf>
    where
        P: BrowserPage + ?Sized,
    {
        if self.capture_steps {
            self.capture(page, label).await
        } else {
            None
        }
    }

    /// Write the page's full markup to `<results>/<name>`
    pub async fn write_markup<P>(&self, page: &P, name: &str) -> E2eResult<PathBuf>
    where
        P: BrowserPage + ?Sized,
    {
        std::fs::create_dir_all(&self.results_dir)?;
        let html = page.content().await?;
        let path = self.results_dir.join(name);
        std::fs::write(&path, html)?;
        Ok(path)
    }

    /// Pretty JSON under the results directory
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.results_dir)?;
        let path = self.results_dir.join(name);
        std::fs::write(&path, serde_json::to_string_pretty(value)?)?;
        Ok(path)
    }
}

fn sanitize(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize("rapid submission 3/10"), "rapid-submission-3-10");
        assert_eq!(sanitize("phone_filled"), "phone_filled");
    }

    #[tokio::test]
    async fn test_same_label_never_overwrites() {
        use crate::testing::FakePage;

        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::in_dir(dir.path());
        let tab = store.clone();
        let (page_a, page_b) = (FakePage::new(), FakePage::new());
        let (first, second) = tokio::join!(
            store.capture(&page_a, "name-done"),
            tab.capture(&page_b, "name-done"),
        );
        assert_ne!(first.unwrap(), second.unwrap());
        store.capture(&FakePage::new(), "name-done").await.unwrap();
        assert_eq!(std::fs::read_dir(store.screenshot_dir()).unwrap().count(), 3);
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::in_dir(dir.path());
        let path = store.write_json("out.json", &vec![1, 2, 3]).unwrap();
        let back: Vec<u32> = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }
}
