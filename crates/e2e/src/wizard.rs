//! Multi-step appointment flows
//!
//! Two layouts exist on the site: the short English appointment form that
//! ends on the scheduling choice, and the longer Dutch "test appointment"
//! wizard paged with "Volgende". Both are linear; optional overlays are
//! dismissed when they show up and everything else must succeed.

use bookprobe_common::FormRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{ProbeConfig, Timeouts};
use crate::error::{E2eError, E2eResult};
use crate::overlay::{dismiss, try_locate, Overlay};
use crate::page::{nth, role, text, BrowserPage, SelectOption};

/// Steps completed by a flow run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowReport {
    pub flow: String,
    pub steps: Vec<String>,
    pub overlays_closed: usize,
    pub final_url: Option<String>,
}

struct FlowDriver<'a, P: BrowserPage + ?Sized> {
    page: &'a P,
    timeouts: &'a Timeouts,
    report: FlowReport,
}

impl<'a, P: BrowserPage + ?Sized> FlowDriver<'a, P> {
    fn new(page: &'a P, timeouts: &'a Timeouts, flow: &str) -> Self {
        Self {
            page,
            timeouts,
            report: FlowReport {
                flow: flow.to_string(),
                ..Default::default()
            },
        }
    }

    fn done(&mut self, step: &str) {
        info!("[{}] {}", self.report.flow, step);
        self.report.steps.push(step.to_string());
    }

    async fn pause(&self) {
        self.page.pause(self.timeouts.step_pause()).await;
    }

    async fn pause_long(&self) {
        self.page.pause(self.timeouts.step_pause() * 2).await;
    }

    async fn overlay(&mut self, overlay: &Overlay) {
        if dismiss(self.page, overlay, self.timeouts.overlay_probe()).await {
            self.report.overlays_closed += 1;
            self.pause().await;
        }
    }

    async fn open(&mut self, url: &str) -> E2eResult<()> {
        self.page.goto(url, &self.timeouts.goto_options()).await?;
        self.done("open");
        Ok(())
    }

    async fn click(&mut self, selector: &str, step: &str) -> E2eResult<()> {
        self.page.click(selector, false).await?;
        self.done(step);
        self.pause().await;
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str, step: &str) -> E2eResult<()> {
        self.page.fill(selector, value).await?;
        self.done(step);
        Ok(())
    }

    async fn next_page(&mut self, into: &str) -> E2eResult<()> {
        self.page.click(&role("button", "Volgende"), false).await?;
        self.done(&format!("next: {}", into));
        self.pause().await;
        Ok(())
    }

    /// Fail unless `selector` shows up within `timeout`
    async fn expect_visible(&mut self, selector: &str, timeout: Duration) -> E2eResult<()> {
        if try_locate(self.page, selector, timeout).await.is_none() {
            return Err(E2eError::AssertionFailed(format!("{} not visible", selector)));
        }
        self.done(&format!("visible: {}", selector));
        Ok(())
    }

    async fn finish(mut self) -> FlowReport {
        self.report.final_url = self.page.url().await.ok();
        self.report
    }
}

/// Inputs for the short appointment form
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppointmentData {
    pub job: String,
    pub phone: String,
    pub language: String,
    pub user_type: String,
    pub name: String,
    pub plate: String,
    pub mileage: String,
    pub vin: String,
    pub email: String,
    pub street: String,
    pub house_number: String,
    pub postcode: String,
    pub city: String,
}

impl Default for AppointmentData {
    fn default() -> Self {
        Self {
            job: "Diagnosis".into(),
            phone: "+573001234567".into(),
            language: "Engels".into(),
            user_type: "Individual".into(),
            name: "Test User".into(),
            plate: "ABC-123".into(),
            mileage: "50000".into(),
            vin: "1HGBH41JXMN109186".into(),
            email: "test@example.com".into(),
            street: "Test Street".into(),
            house_number: "123".into(),
            postcode: "12345".into(),
            city: "Test City".into(),
        }
    }
}

impl AppointmentData {
    pub fn from_record(record: &FormRecord) -> Self {
        Self {
            phone: record.phone.clone(),
            name: record.name.clone(),
            plate: record.plate.clone(),
            mileage: record.mileage.clone(),
            vin: record.vin.clone(),
            ..Default::default()
        }
    }
}

/// Short English appointment form; done when the scheduling choice shows
pub struct AppointmentFlow<'a, P: BrowserPage + ?Sized> {
    page: &'a P,
    url: String,
    timeouts: &'a Timeouts,
}

pub const SCHEDULING_HEADING: &str = "How would you like to schedule your car for repair?";
pub const SCHEDULING_OPTIONS: [&str; 3] = [
    "Place in queue",
    "Bring immediately and wait",
    "Set a fixed date",
];

impl<'a, P: BrowserPage + ?Sized> AppointmentFlow<'a, P> {
    pub fn new(page: &'a P, config: &'a ProbeConfig) -> Self {
        Self {
            page,
            url: config.target.appointment_url.clone(),
            timeouts: &config.timeouts,
        }
    }

    pub async fn run(&self, data: &AppointmentData) -> E2eResult<FlowReport> {
        let mut flow = FlowDriver::new(self.page, self.timeouts, "appointment");
        let selects = "select";

        flow.open(&self.url).await?;

        self.page
            .select_option(&nth(selects, 0), &SelectOption::Label(data.job.clone()))
            .await?;
        flow.done("job");
        flow.pause().await;

        flow.fill(
            r#"input[placeholder*="321"], input[placeholder*="123"]"#,
            &data.phone,
            "phone",
        )
        .await?;
        flow.pause().await;

        self.page
            .select_option(&nth(selects, 1), &SelectOption::Label(data.language.clone()))
            .await?;
        flow.done("language");
        flow.pause().await;

        self.page
            .select_option(&nth(selects, 2), &SelectOption::Label(data.user_type.clone()))
            .await?;
        flow.done("user type");
        flow.pause().await;

        let toast = Overlay::new(
            "toast",
            r#"#toast, .toast, [class*="toast"]:visible"#,
            r#"#toast button:has-text("No"), #toast .btnNo, [class*="toast"] button:has-text("No"), [class*="toast"] .btnNo"#,
        );
        flow.overlay(&toast).await;

        flow.fill(r#"input[name*="name"], input[placeholder*="Name"]"#, &data.name, "name")
            .await?;
        flow.fill(r#"input[name*="plate"], input[name*="license"]"#, &data.plate, "plate")
            .await?;
        flow.fill(
            r#"input[name*="mileage"], input[type="number"]"#,
            &data.mileage,
            "mileage",
        )
        .await?;
        flow.fill(r#"input[name*="vin"]"#, &data.vin, "vin").await?;
        flow.pause_long().await;

        flow.overlay(&Overlay::diagnosis_offer()).await;

        // address fields only appear once the VIN is in
        flow.expect_visible(
            r#"input[placeholder="Email.."], input[name*="email"]"#,
            self.timeouts.settle(),
        )
        .await?;
        let address = [
            (r#"input[placeholder="Email.."], input[name*="email"]"#, &data.email, "email"),
            (r#"input[placeholder="Street.."], input[name*="street"]"#, &data.street, "street"),
            (
                r#"input[placeholder="House number.."], input[name*="house"]"#,
                &data.house_number,
                "house number",
            ),
            (
                r#"input[placeholder="Postcode.."], input[name*="postcode"]"#,
                &data.postcode,
                "postcode",
            ),
            (r#"input[placeholder="City.."], input[name*="city"]"#, &data.city, "city"),
        ];
        for (selector, value, step) in address {
            flow.fill(selector, value, step).await?;
        }
        flow.pause().await;
        flow.overlay(&Overlay::toast()).await;

        self.page.click(r#"[target-id="attvsno"]"#, true).await?;
        flow.done("not at the shop");
        flow.pause().await;
        flow.overlay(&Overlay::toast()).await;

        self.page.check(r#"input[name="terms[]"]"#).await?;
        flow.done("terms");
        flow.pause().await;

        flow.click(r#"#section1 >> text=Continue"#, "continue").await?;
        flow.pause().await;

        flow.expect_visible(&text(SCHEDULING_HEADING), self.timeouts.action())
            .await?;
        for option in SCHEDULING_OPTIONS {
            flow.expect_visible(&text(option), Duration::ZERO).await?;
        }

        Ok(flow.finish().await)
    }
}

/// Inputs for the Dutch test-appointment wizard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardData {
    /// Job type label, e.g. "Diagnose" or "Reparatie"
    pub job: String,
    /// Day of month clicked in the calendar
    pub calendar_day: String,
    pub phone: String,
    pub customer_type: String,
    pub name: String,
    pub plate: String,
    pub mileage: String,
    pub vin: String,
    /// Sound checklist entries; empty answers "Nee"
    pub sounds: Vec<String>,
}

impl Default for WizardData {
    fn default() -> Self {
        Self {
            job: "Diagnose".into(),
            calendar_day: "23".into(),
            phone: "3012345678".into(),
            customer_type: "Particulier".into(),
            name: "Test User".into(),
            plate: "ABC-123".into(),
            mileage: "50000".into(),
            vin: "1HGBH41JXMN109186".into(),
            sounds: vec![
                "Ratelende".into(),
                "terugschakelen".into(),
                "afremmen".into(),
            ],
        }
    }
}

impl WizardData {
    /// Repair job with no sound complaints
    pub fn repair() -> Self {
        Self {
            job: "Reparatie".into(),
            calendar_day: "27".into(),
            sounds: Vec::new(),
            ..Default::default()
        }
    }

    pub fn from_record(record: &FormRecord) -> Self {
        Self {
            phone: record.phone.clone(),
            name: record.name.clone(),
            plate: record.plate.clone(),
            mileage: record.mileage.clone(),
            vin: record.vin.clone(),
            ..Default::default()
        }
    }
}

pub const WIZARD_SUCCESS: &str = "Uw afspraak is succesvol gemaakt";

/// Multi-page "Volgende" wizard ending in a booked appointment
pub struct TestAppointmentWizard<'a, P: BrowserPage + ?Sized> {
    page: &'a P,
    url: String,
    timeouts: &'a Timeouts,
}

impl<'a, P: BrowserPage + ?Sized> TestAppointmentWizard<'a, P> {
    pub fn new(page: &'a P, config: &'a ProbeConfig) -> Self {
        Self {
            page,
            url: config.target.test_appointment_url.clone(),
            timeouts: &config.timeouts,
        }
    }

    pub async fn run(&self, data: &WizardData) -> E2eResult<FlowReport> {
        let mut flow = FlowDriver::new(self.page, self.timeouts, "test-appointment");
        let nee = role("button", "Nee");

        flow.open(&self.url).await?;

        // job
        self.page
            .select_option(&nth("select", 0), &SelectOption::Label(data.job.clone()))
            .await?;
        flow.done("job");
        flow.pause().await;
        flow.overlay(&Overlay::understood()).await;

        // planning
        flow.next_page("planning").await?;
        flow.click(&role("button", "/Gepland/"), "fixed date").await?;
        self.pick_day(&mut flow, &data.calendar_day).await;
        flow.overlay(&Overlay::proceed()).await;

        // contact
        flow.next_page("contact").await?;
        flow.fill(r#"input[type="tel"], input[placeholder*="6"]"#, &data.phone, "phone")
            .await?;
        let lookup = r#"button:has-text("Controleren")"#;
        if try_locate(self.page, lookup, self.timeouts.overlay_probe()).await.is_some() {
            match self.page.click(lookup, false).await {
                Ok(()) => {
                    flow.done("phone lookup");
                    flow.pause_long().await;
                }
                Err(e) => warn!("Phone lookup failed: {}", e),
            }
        }

        // preferences
        flow.next_page("preferences").await?;
        self.page
            .select_option(
                &role("combobox", "/Klanttype/"),
                &SelectOption::Label(data.customer_type.clone()),
            )
            .await?;
        flow.done("customer type");
        let name = role("textbox", "/Naam/");
        let prefilled = self.page.input_value(&name).await.unwrap_or_default();
        if prefilled.is_empty() {
            flow.fill(&name, &data.name, "name").await?;
        } else {
            debug!("Name prefilled by lookup: {}", prefilled);
        }
        flow.overlay(&Overlay::remote_diagnosis()).await;

        // vehicle
        flow.next_page("vehicle").await?;
        flow.fill(&role("textbox", "/Kenteken/"), &data.plate, "plate").await?;
        flow.fill(&role("textbox", "/Kilometerstand/"), &data.mileage, "mileage")
            .await?;
        flow.fill(&role("textbox", "/VIN/"), &data.vin, "vin").await?;
        flow.pause_long().await;
        flow.click(&nth(&nee, 0), "not at the shop").await?;
        flow.click(&nth(&nee, 1), "no rental car").await?;

        // symptoms
        flow.next_page("driving problems").await?;
        flow.click(&nee, "no driving problems").await?;

        flow.next_page("sounds").await?;
        if data.sounds.is_empty() {
            flow.click(&nee, "no sounds").await?;
        } else {
            flow.click(&role("button", "Ja"), "sounds").await?;
            for sound in &data.sounds {
                flow.click(&role("button", &format!("/{}/", sound)), sound)
                    .await?;
            }
        }

        flow.next_page("vibrations").await?;
        flow.click(&nee, "no vibrations").await?;

        flow.next_page("dashboard").await?;
        flow.click(&nee, "no dashboard warnings").await?;

        // confirmation
        flow.next_page("confirmation").await?;
        self.page.check(&role("checkbox", "/Akkoord/")).await?;
        flow.done("terms");
        flow.pause().await;

        let submit = role("button", "/Afspraak maken/");
        self.wait_enabled(&submit).await?;
        flow.click(&submit, "submit").await?;
        flow.pause_long().await;

        flow.expect_visible(&text(WIZARD_SUCCESS), self.timeouts.action())
            .await?;

        Ok(flow.finish().await)
    }

    /// Open the date picker and click a day; a miss is only logged
    async fn pick_day(&self, flow: &mut FlowDriver<'a, P>, day: &str) {
        let picker = role("textbox", "/Selecteer een datum/");
        if let Err(e) = self.page.click(&picker, true).await {
            warn!("Date picker did not open: {}", e);
            return;
        }
        flow.pause().await;

        let cell = format!("text=\"{}\"", day);
        if try_locate(self.page, &cell, self.timeouts.overlay_probe()).await.is_none() {
            warn!("Day {} not offered, keeping the default date", day);
            return;
        }
        match self.page.click(&cell, true).await {
            Ok(()) => {
                flow.done(&format!("day {}", day));
                flow.pause().await;
            }
            Err(e) => warn!("Picking day {} failed: {}", day, e),
        }
    }

    async fn wait_enabled(&self, selector: &str) -> E2eResult<()> {
        let deadline = tokio::time::Instant::now() + self.timeouts.action();
        loop {
            if self.page.is_enabled(selector).await.unwrap_or(false) {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(E2eError::Timeout(format!("{} to become enabled", selector)));
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeElement, FakePage};

    #[tokio::test]
    async fn test_appointment_flow_needs_scheduling_heading() {
        let page = FakePage::new()
            .with("select >> nth=0", FakeElement::visible())
            .with("select >> nth=1", FakeElement::visible())
            .with("select >> nth=2", FakeElement::visible());
        let config = ProbeConfig {
            timeouts: Timeouts::instant(),
            ..Default::default()
        };

        // the phone input is missing, so the flow stops there
        let err = AppointmentFlow::new(&page, &config)
            .run(&AppointmentData::default())
            .await
            .unwrap_err();
        assert!(matches!(err, E2eError::Playwright(_)));
    }

    #[test]
    fn test_repair_wizard_answers_no_sounds() {
        let data = WizardData::repair();
        assert_eq!(data.job, "Reparatie");
        assert!(data.sounds.is_empty());
    }
}
