//! Transient dialogs, toasts and modals
//!
//! Absence is the common case, so lookups return `Option` and dismissal
//! returns whether anything was closed.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::page::{text, BrowserPage, Locator};

/// An overlay that may appear and how to close it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub name: String,
    /// Visible while the overlay is open
    pub marker: String,
    /// Clicked to close it
    pub close: String,
    pub force: bool,
}

impl Overlay {
    /// Overlay closed by clicking its own text
    pub fn button(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            marker: text(label),
            close: text(label),
            force: false,
        }
    }

    pub fn new(name: &str, marker: &str, close: &str) -> Self {
        Self {
            name: name.to_string(),
            marker: marker.to_string(),
            close: close.to_string(),
            force: false,
        }
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    /// "I understand" notice after choosing the job type
    pub fn understood() -> Self {
        Self::button("understood", "Ik begrijp het")
    }

    /// Confirmation after picking a date
    pub fn proceed() -> Self {
        Self::button("proceed", "Doorgaan")
    }

    /// Remote diagnosis offer
    pub fn remote_diagnosis() -> Self {
        Self::button("remote-diagnosis", "Nee bedankt")
    }

    /// Toast offering a callback
    pub fn toast() -> Self {
        Self::new("toast", "#toast:visible", "#toast .btnNo").forced()
    }

    /// Diagnosis price offer on the English form
    pub fn diagnosis_offer() -> Self {
        Self::new(
            "diagnosis-offer",
            "text=For a comprehensive diagnosis",
            "text=No thanks",
        )
    }

    pub fn builtin() -> Vec<Overlay> {
        vec![
            Self::understood(),
            Self::proceed(),
            Self::remote_diagnosis(),
            Self::toast(),
            Self::diagnosis_offer(),
        ]
    }
}

/// Wait up to `timeout` for `selector` to become visible
pub async fn try_locate<P>(page: &P, selector: &str, timeout: Duration) -> Option<Locator>
where
    P: BrowserPage + ?Sized,
{
    let wait = (!timeout.is_zero()).then_some(timeout);
    match page.is_visible(selector, wait).await {
        Ok(true) => Some(Locator::new(selector)),
        Ok(false) => None,
        Err(e) => {
            debug!("Probe for '{}' failed: {}", selector, e);
            None
        }
    }
}

/// Close `overlay` if it shows up within `timeout`
pub async fn dismiss<P>(page: &P, overlay: &Overlay, timeout: Duration) -> bool
where
    P: BrowserPage + ?Sized,
{
    if try_locate(page, &overlay.marker, timeout).await.is_none() {
        debug!("No {} overlay", overlay.name);
        return false;
    }
    match page.click(&overlay.close, overlay.force).await {
        Ok(()) => {
            info!("Closed {} overlay", overlay.name);
            true
        }
        Err(e) => {
            warn!("Could not close {} overlay: {}", overlay.name, e);
            false
        }
    }
}

/// Try each overlay once; returns how many were closed
pub async fn dismiss_all<P>(page: &P, overlays: &[Overlay], timeout: Duration) -> usize
where
    P: BrowserPage + ?Sized,
{
    let mut closed = 0;
    for overlay in overlays {
        if dismiss(page, overlay, timeout).await {
            closed += 1;
        }
    }
    closed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeElement, FakePage};

    #[tokio::test]
    async fn test_absent_overlay_is_none() {
        let page = FakePage::new();
        assert!(try_locate(&page, "text=Doorgaan", Duration::ZERO).await.is_none());
        assert!(!dismiss(&page, &Overlay::proceed(), Duration::ZERO).await);
        assert!(page.clicked().is_empty());
    }

    #[tokio::test]
    async fn test_visible_overlay_is_clicked() {
        let page = FakePage::new()
            .with("#toast:visible", FakeElement::visible())
            .with("#toast .btnNo", FakeElement::visible());
        assert!(dismiss(&page, &Overlay::toast(), Duration::ZERO).await);
        assert_eq!(page.clicked(), vec!["#toast .btnNo"]);
    }

    #[tokio::test]
    async fn test_broken_probe_counts_as_absent() {
        let page = FakePage::new().with_broken("text=Ik begrijp het");
        assert_eq!(dismiss_all(&page, &[Overlay::understood()], Duration::ZERO).await, 0);
    }
}
