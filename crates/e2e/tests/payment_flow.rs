//! Payment probe failure handling

use async_trait::async_trait;
use bookprobe_common::PaymentMethod;
use bookprobe_e2e::notify::{FailureNotice, LogNotifier, Notifier};
use bookprobe_e2e::payment::{PaymentProbe, PaymentTiming, StepStatus};
use bookprobe_e2e::testing::{FakeElement, FakePage};
use bookprobe_e2e::{E2eError, E2eResult};
use std::time::Duration;

const LINK: &str = "https://portal.example/invoice/PROJ-1137";

struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send_failure(&self, _notice: &FailureNotice) -> E2eResult<()> {
        Err(E2eError::Notify("relay refused".into()))
    }
}

fn timing() -> PaymentTiming {
    PaymentTiming {
        navigation: Duration::from_secs(1),
        settle: Duration::ZERO,
    }
}

fn invoice() -> FakePage {
    FakePage::new()
        .with_title("Verkoopfactuur PROJ-1137")
        .with("text=Verkoopfactuur", FakeElement::visible())
}

#[tokio::test]
async fn test_missing_invoice_notifies() {
    let page = FakePage::new();
    let notifier = LogNotifier::new();

    let report = PaymentProbe::new(&page, &notifier)
        .with_timing(timing())
        .run(LINK, PaymentMethod::Ideal)
        .await;

    assert!(!report.success);
    assert!(report.errors[0].contains("Invoice page not loaded"));
    assert_eq!(report.steps.last().unwrap().status, StepStatus::Failed);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].payment_method, "ideal");
    assert_eq!(sent[0].payment_link, LINK);
}

#[tokio::test]
async fn test_failing_notifier_does_not_change_report() {
    let page = FakePage::new();
    let report = PaymentProbe::new(&page, &FailingNotifier)
        .with_timing(timing())
        .run(LINK, PaymentMethod::CreditCard)
        .await;

    assert!(!report.success);
    assert_eq!(report.errors.len(), 1);
}

#[tokio::test]
async fn test_missing_method_button_fails() {
    let page = invoice();
    let notifier = LogNotifier::new();

    let report = PaymentProbe::new(&page, &notifier)
        .with_timing(timing())
        .run(LINK, PaymentMethod::BankTransfer)
        .await;

    assert!(!report.success);
    assert!(report.errors[0].contains("not found"));
    assert_eq!(report.page_title.as_deref(), Some("Verkoopfactuur PROJ-1137"));
}

#[tokio::test]
async fn test_ideal_page_rendered_in_place() {
    let button = "role=button[name=/iDEAL/i]";
    let page = invoice()
        .with(button, FakeElement::visible())
        .on_click(button, "text=Betalen met iDEAL", FakeElement::visible());
    let notifier = LogNotifier::new();

    let report = PaymentProbe::new(&page, &notifier)
        .with_timing(timing())
        .run(LINK, PaymentMethod::Ideal)
        .await;

    assert!(report.success, "{:?}", report.errors);
    assert!(report.steps.iter().any(|s| s.step == "ideal_form"));
    assert!(notifier.sent().is_empty());
}
