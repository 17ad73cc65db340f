//! BookProbe browser probes
//!
//! Drives the booking site through Playwright:
//! - A persistent Node bridge speaking newline-delimited JSON
//! - A page object for the vehicle service form
//! - Appointment wizards, overlay handling and payment-link checks
//! - A tagged scenario suite with per-scenario timeouts
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SuiteRunner (Rust)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PageFactory ── open(tabs) / close(pages)                   │
//! │    ├── PlaywrightBridge   (node + playwright, stdin/stdout)  │
//! │    └── FakeFactory        (in-memory pages for tests)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  BrowserPage                                                │
//! │    ├── VehicleFormPage    (selector candidates per field)    │
//! │    ├── AppointmentFlow / TestAppointmentWizard               │
//! │    ├── PaymentProbe       (+ Notifier on failure)            │
//! │    └── diagnostics        (smoke scripts, never assertions)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod artifacts;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod form;
pub mod notify;
pub mod overlay;
pub mod page;
pub mod payment;
pub mod playwright;
pub mod scenario;
pub mod selectors;
pub mod testing;
pub mod wizard;

pub use artifacts::ArtifactStore;
pub use config::ProbeConfig;
pub use error::{E2eError, E2eResult};
pub use form::VehicleFormPage;
pub use notify::{FailureNotice, Notifier};
pub use page::{BrowserPage, PageFactory};
pub use payment::{PaymentProbe, PaymentReport};
pub use playwright::{PlaywrightBridge, PlaywrightConfig};
pub use scenario::{Scenario, ScenarioResult, SuiteResult, SuiteRunner, Tag};
pub use wizard::{AppointmentFlow, FlowReport, TestAppointmentWizard};
