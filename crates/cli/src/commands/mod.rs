//! CLI Commands

pub mod appointment;
pub mod data;
pub mod inspect;
pub mod payment;
pub mod suite;

use anyhow::{anyhow, Result};
use bookprobe_e2e::playwright::{PlaywrightBridge, PlaywrightPage};
use bookprobe_e2e::{PageFactory, ProbeConfig};
use tracing::warn;

/// One browser with one page
pub struct BrowserSession {
    bridge: PlaywrightBridge,
    page: PlaywrightPage,
}

impl BrowserSession {
    pub async fn launch(config: &ProbeConfig) -> Result<Self> {
        let bridge = launch_bridge(config).await?;
        let page = bridge
            .open(1)
            .await?
            .pop()
            .ok_or_else(|| anyhow!("browser opened no page"))?;
        Ok(Self { bridge, page })
    }

    pub fn page(&self) -> &PlaywrightPage {
        &self.page
    }

    pub async fn close(self) {
        if let Err(e) = self.bridge.close(vec![self.page]).await {
            warn!("Closing page failed: {}", e);
        }
        if let Err(e) = self.bridge.shutdown().await {
            warn!("Browser shutdown failed: {}", e);
        }
    }
}

pub async fn launch_bridge(config: &ProbeConfig) -> Result<PlaywrightBridge> {
    Ok(PlaywrightBridge::launch(&config.browser).await?)
}
