//! Scripted pages shared by the integration tests

#![allow(dead_code)]

use bookprobe_e2e::config::{ProbeConfig, Timeouts};
use bookprobe_e2e::testing::{FakeElement, FakePage};

pub const PHONE: &str = r#"input[placeholder*="1234567"]"#;
pub const USER_TYPE: &str = r#"input[name="attvs[]"][value="0"]"#;
pub const NAME: &str = r#"input[name*="name"]"#;
pub const PLATE: &str = r#"input[name*="plate"]"#;
pub const MILEAGE: &str = r#"input[name*="mileage"]"#;
pub const VIN: &str = r#"input[name*="vin"]"#;
pub const RENTAL_NO: &str = r#"input[name="loanCar[]"][value="0"]"#;
pub const OPERABLE_YES: &str = r#"input[name="inoperableCar[]"][value="0"]"#;
pub const TERMS: &str = r#"input[name="terms[]"]"#;
pub const SUBMIT: &str = r#"button[type="submit"]:visible"#;

pub fn config() -> ProbeConfig {
    ProbeConfig {
        timeouts: Timeouts::instant(),
        ..Default::default()
    }
}

/// Every form control, without any submit reaction
pub fn bare_form() -> FakePage {
    FakePage::new()
        .with_title("Afspraak maken")
        .with_select(0, false, 1)
        .with_select(1, true, 4)
        .with(PHONE, FakeElement::visible())
        .with(USER_TYPE, FakeElement::visible())
        .with(NAME, FakeElement::visible())
        .with(PLATE, FakeElement::visible())
        .with(MILEAGE, FakeElement::visible())
        .with(VIN, FakeElement::visible())
        .with(RENTAL_NO, FakeElement::visible())
        .with(OPERABLE_YES, FakeElement::visible())
        .with(TERMS, FakeElement::visible())
        .with(SUBMIT, FakeElement::visible())
        .with(r#"input[type="tel"]"#, FakeElement::visible())
        .with(r#"input[type="text"]"#, FakeElement::visible().with_count(5))
        .with(r#"input[type="checkbox"]"#, FakeElement::visible())
        .with(r#"button[type="submit"]"#, FakeElement::visible())
}

/// Submitting shows a success banner
pub fn accepting_form() -> FakePage {
    bare_form().on_click(
        SUBMIT,
        ".success",
        FakeElement::visible().with_text("Bedankt voor uw aanvraag"),
    )
}

/// Submitting shows a validation error
pub fn rejecting_form() -> FakePage {
    bare_form().on_click(
        SUBMIT,
        ".error",
        FakeElement::visible().with_text("Ongeldig kenteken"),
    )
}
