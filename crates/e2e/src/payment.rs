//! Payment link probe
//!
//! Opens an invoice payment link, picks a payment method and checks that
//! the method's next screen appears. Failures are mailed through the
//! configured `Notifier`; a failing notifier never changes the report.

use bookprobe_common::PaymentMethod;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use crate::error::{E2eError, E2eResult};
use crate::notify::{FailureNotice, Notifier};
use crate::page::{role, text, BrowserPage, GotoOptions, LoadState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Started,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStep {
    pub step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PaymentStep {
    fn new(step: &str, status: StepStatus) -> Self {
        Self {
            step: step.to_string(),
            method: None,
            status,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReport {
    pub success: bool,
    pub payment_link: String,
    pub payment_method: PaymentMethod,
    pub steps: Vec<PaymentStep>,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_amount: Option<String>,
}

pub const INVOICE_MARKER: &str = "Verkoopfactuur";
const CARD_FORM_MARKER: &str = "Card Holder Name";
const AMOUNT_CELL: &str = r#"tr:has-text("Amount charged now") >> td:last-child"#;

#[derive(Debug, Clone)]
pub struct PaymentTiming {
    pub navigation: Duration,
    /// Wait for the payment options and for the method screen
    pub settle: Duration,
}

impl Default for PaymentTiming {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(45),
            settle: Duration::from_secs(2),
        }
    }
}

pub struct PaymentProbe<'a, P: BrowserPage + ?Sized> {
    page: &'a P,
    notifier: &'a dyn Notifier,
    timing: PaymentTiming,
}

impl<'a, P: BrowserPage + ?Sized> PaymentProbe<'a, P> {
    pub fn new(page: &'a P, notifier: &'a dyn Notifier) -> Self {
        Self {
            page,
            notifier,
            timing: PaymentTiming::default(),
        }
    }

    pub fn with_timing(mut self, timing: PaymentTiming) -> Self {
        self.timing = timing;
        self
    }

    pub async fn run(&self, link: &str, method: PaymentMethod) -> PaymentReport {
        let mut report = PaymentReport {
            success: false,
            payment_link: link.to_string(),
            payment_method: method,
            steps: Vec::new(),
            errors: Vec::new(),
            page_title: None,
            charge_amount: None,
        };

        match self.walk(link, method, &mut report).await {
            Ok(()) => {
                report.success = true;
                info!("Payment flow for {} completed", method);
            }
            Err(e) => {
                let message = e.to_string();
                error!("Payment flow for {} failed: {}", method, message);
                report.errors.push(message.clone());
                report.steps.push(PaymentStep {
                    error: Some(message.clone()),
                    ..PaymentStep::new("error", StepStatus::Failed)
                });

                let notice = FailureNotice::new(method.as_str(), link, &message);
                if let Err(e) = self.notifier.send_failure(&notice).await {
                    error!("Failure notice not sent: {}", e);
                }
            }
        }
        report
    }

    async fn walk(
        &self,
        link: &str,
        method: PaymentMethod,
        report: &mut PaymentReport,
    ) -> E2eResult<()> {
        info!("Opening payment link {}", link);
        report.steps.push(PaymentStep::new("navigation", StepStatus::Started));
        let options = GotoOptions {
            wait_until: LoadState::Load,
            timeout: self.timing.navigation,
        };
        self.page.goto(link, &options).await?;
        self.page
            .wait_for_load_state(LoadState::NetworkIdle, self.timing.navigation)
            .await?;
        report.steps.push(PaymentStep::new("navigation", StepStatus::Completed));

        self.page.pause(self.timing.settle).await;
        let title = self.page.title().await?;
        info!("Page title: {}", title);
        report.page_title = Some(title);

        if self.page.count(&text(INVOICE_MARKER)).await? == 0 {
            return Err(E2eError::PaymentFlow("Invoice page not loaded".into()));
        }
        report.steps.push(PaymentStep::new("invoice_load", StepStatus::Completed));

        let label = method.button_label();
        let button = role("button", &format!("/{}/i", label));
        report.steps.push(PaymentStep {
            method: Some(label.to_string()),
            ..PaymentStep::new("select_method", StepStatus::Started)
        });
        if self.page.count(&button).await? == 0 {
            return Err(E2eError::PaymentFlow(format!(
                "Payment button for {} not found",
                label
            )));
        }
        self.page.click(&button, false).await?;
        self.page.pause(self.timing.settle).await;
        report.steps.push(PaymentStep {
            method: Some(label.to_string()),
            ..PaymentStep::new("select_method", StepStatus::Completed)
        });

        match method {
            PaymentMethod::CreditCard => self.check_card_form(report).await,
            PaymentMethod::Ideal => self.check_ideal(report).await,
            PaymentMethod::DebitCard | PaymentMethod::BankTransfer => Ok(()),
        }
    }

    async fn check_card_form(&self, report: &mut PaymentReport) -> E2eResult<()> {
        if self.page.count(&text(CARD_FORM_MARKER)).await? == 0 {
            return Err(E2eError::PaymentFlow("Credit card form not loaded".into()));
        }
        report.steps.push(PaymentStep::new("credit_card_form", StepStatus::Completed));

        if self.page.count(AMOUNT_CELL).await? > 0 {
            let amount = self
                .page
                .visible_texts(AMOUNT_CELL)
                .await?
                .into_iter()
                .next()
                .unwrap_or_default();
            info!("Amount to charge: {}", amount);
            report.charge_amount = Some(amount);
            report.steps.push(PaymentStep::new("verify_amount", StepStatus::Completed));
        }
        Ok(())
    }

    /// Redirect to the provider, or its landing page rendered in place
    async fn check_ideal(&self, report: &mut PaymentReport) -> E2eResult<()> {
        let url = self.page.url().await?;
        if url.contains("ideal") || url.contains("pay.") {
            info!("Redirected to payment provider: {}", url);
            report.steps.push(PaymentStep::new("ideal_redirect", StepStatus::Completed));
            return Ok(());
        }
        let markers = self.page.count(&text("Betalen met iDEAL")).await?
            + self.page.count(&text("iDEAL")).await?;
        if markers > 0 {
            report.steps.push(PaymentStep::new("ideal_form", StepStatus::Completed));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LogNotifier;
    use crate::testing::{FakeElement, FakePage};

    fn instant() -> PaymentTiming {
        PaymentTiming {
            navigation: Duration::from_secs(1),
            settle: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_card_flow_reads_amount() {
        let page = FakePage::new()
            .with_title("Invoice PROJ-1137")
            .with("text=Verkoopfactuur", FakeElement::visible())
            .with("role=button[name=/Credit card/i]", FakeElement::visible())
            .on_click(
                "role=button[name=/Credit card/i]",
                "text=Card Holder Name",
                FakeElement::visible(),
            )
            .on_click(
                "role=button[name=/Credit card/i]",
                AMOUNT_CELL,
                FakeElement::visible().with_text("€ 121,00"),
            );
        let notifier = LogNotifier::new();

        let report = PaymentProbe::new(&page, &notifier)
            .with_timing(instant())
            .run("https://pay.example/invoice", PaymentMethod::CreditCard)
            .await;

        assert!(report.success, "{:?}", report.errors);
        assert_eq!(report.charge_amount.as_deref(), Some("€ 121,00"));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_report_serializes_camel_case() {
        let page = FakePage::new();
        let notifier = LogNotifier::new();
        let report = PaymentProbe::new(&page, &notifier)
            .with_timing(instant())
            .run("https://pay.example/invoice", PaymentMethod::Ideal)
            .await;
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["paymentMethod"], "ideal");
        assert_eq!(json["success"], false);
    }
}
