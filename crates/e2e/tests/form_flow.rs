//! Page object behaviour against scripted pages

mod support;

use bookprobe_common::{valid_record, Answer, FormRecord};
use bookprobe_e2e::form::VehicleFormPage;
use bookprobe_e2e::testing::{FakeAction, FakeElement, FakePage};
use bookprobe_e2e::E2eError;
use support::*;

#[tokio::test]
async fn test_complete_form_fills_in_order() {
    let page = accepting_form();
    let config = config();
    let form = VehicleFormPage::new(&page, &config);

    form.goto().await.unwrap();
    form.fill_complete_form(&valid_record()).await.unwrap();

    let filled: Vec<String> = page.filled().into_iter().map(|(s, _)| s).collect();
    assert_eq!(filled, vec![PHONE, NAME, PLATE, MILEAGE, VIN]);
    assert_eq!(
        page.clicked(),
        vec![USER_TYPE, RENTAL_NO, OPERABLE_YES, TERMS, SUBMIT]
    );

    let outcome = form.outcome().await;
    assert!(outcome.has_success);
    assert!(!outcome.has_errors);
}

#[tokio::test]
async fn test_missing_name_field_stops_before_submit() {
    let page = FakePage::new()
        .with(PHONE, FakeElement::visible())
        .with(USER_TYPE, FakeElement::visible())
        .with(SUBMIT, FakeElement::visible());
    let config = config();
    let form = VehicleFormPage::new(&page, &config);

    let err = form.fill_complete_form(&valid_record()).await.unwrap_err();
    match err {
        E2eError::ElementNotFound { field, tried } => {
            assert_eq!(field, "name");
            assert_eq!(tried.len(), 3);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!page.clicked().contains(&SUBMIT.to_string()));
}

#[tokio::test]
async fn test_empty_name_reaches_submit_and_reports_error() {
    let page = rejecting_form();
    let config = config();
    let form = VehicleFormPage::new(&page, &config);
    let record = FormRecord {
        name: String::new(),
        ..valid_record()
    };

    form.fill_complete_form(&record).await.unwrap();

    assert!(page.clicked().contains(&SUBMIT.to_string()));
    let outcome = form.outcome().await;
    assert!(outcome.has_errors);
    assert!(!outcome.has_success);
    assert_eq!(outcome.error_messages, vec!["Ongeldig kenteken".to_string()]);
}

#[tokio::test]
async fn test_best_effort_steps_do_not_abort() {
    // No phone, rental, operable or terms controls at all
    let page = FakePage::new()
        .with(USER_TYPE, FakeElement::visible())
        .with(NAME, FakeElement::visible())
        .with(PLATE, FakeElement::visible())
        .with(MILEAGE, FakeElement::visible())
        .with(VIN, FakeElement::visible())
        .with(SUBMIT, FakeElement::visible());
    let config = config();
    let form = VehicleFormPage::new(&page, &config);

    form.fill_complete_form(&valid_record()).await.unwrap();
    assert_eq!(page.clicked().last().map(String::as_str), Some(SUBMIT));
}

#[tokio::test]
async fn test_hidden_mandatory_field_is_not_found() {
    let page = bare_form().with(VIN, FakeElement::hidden());
    let config = config();
    let form = VehicleFormPage::new(&page, &config);

    let err = form.fill_vin("12345678901234567").await.unwrap_err();
    assert!(matches!(err, E2eError::ElementNotFound { ref field, .. } if field == "vin"));
}

#[tokio::test]
async fn test_unaccepted_terms_left_unchecked() {
    let page = accepting_form();
    let config = config();
    let form = VehicleFormPage::new(&page, &config);
    let record = FormRecord {
        terms_accepted: false,
        ..valid_record()
    };

    form.fill_complete_form(&record).await.unwrap();
    assert!(!page.clicked().contains(&TERMS.to_string()));
}

#[tokio::test]
async fn test_parked_yes_checks_radio() {
    let parked_yes = r#"input[name="attvs[]"][value="1"]"#;
    let page = bare_form().with(parked_yes, FakeElement::visible());
    let config = config();
    let form = VehicleFormPage::new(&page, &config);

    form.answer_parked(Answer::Yes).await.unwrap();
    assert_eq!(page.actions(), vec![FakeAction::Check(parked_yes.to_string())]);
}

#[tokio::test]
async fn test_navigation_failure_propagates() {
    let config = config();
    let page = bare_form().with_failing_url(&config.target.base_url);
    let form = VehicleFormPage::new(&page, &config);

    assert!(matches!(
        form.goto().await,
        Err(E2eError::Navigation { .. })
    ));
}
