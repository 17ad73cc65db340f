//! Error types for browser-driven probes

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npm i playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Browser bridge closed")]
    BridgeClosed,

    #[error("No visible element for {field} (tried: {})", tried.join(", "))]
    ElementNotFound { field: String, tried: Vec<String> },

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Payment flow: {0}")]
    PaymentFlow(String),

    #[error("Notification failed: {0}")]
    Notify(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Common(#[from] bookprobe_common::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
