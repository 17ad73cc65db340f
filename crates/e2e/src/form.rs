//! Page object for the vehicle service form
//!
//! One method per form step. Each step walks its selector candidates and
//! acts on the first visible match. Mandatory steps fail with
//! `ElementNotFound` when nothing matches, best-effort steps log and return.

use bookprobe_common::{Answer, Field, FormRecord, Outcome};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::artifacts::ArtifactStore;
use crate::config::{ProbeConfig, Timeouts};
use crate::error::{E2eError, E2eResult};
use crate::page::{nth, BrowserPage, LoadState, SelectOption};
use crate::selectors::{find_visible, FormSelectors, SelectorCandidates, StepPolicy};

enum Act<'v> {
    Fill(&'v str),
    Check,
    Click,
}

pub struct VehicleFormPage<'a, P: BrowserPage + ?Sized> {
    page: &'a P,
    url: String,
    selectors: &'a FormSelectors,
    timeouts: &'a Timeouts,
    artifacts: Option<&'a ArtifactStore>,
}

impl<'a, P: BrowserPage + ?Sized> VehicleFormPage<'a, P> {
    pub fn new(page: &'a P, config: &'a ProbeConfig) -> Self {
        Self {
            page,
            url: config.target.base_url.clone(),
            selectors: &config.selectors,
            timeouts: &config.timeouts,
            artifacts: None,
        }
    }

    /// Take step screenshots into `store`
    pub fn with_artifacts(mut self, store: &'a ArtifactStore) -> Self {
        self.artifacts = Some(store);
        self
    }

    pub fn page(&self) -> &'a P {
        self.page
    }

    async fn snapshot(&self, label: &str) {
        if let Some(store) = self.artifacts {
            store.capture_step(self.page, label).await;
        }
    }

    /// Screenshot regardless of the per-step setting
    pub async fn screenshot(&self, label: &str) {
        if let Some(store) = self.artifacts {
            store.capture(self.page, label).await;
        }
    }

    /// Open the form and let it settle
    pub async fn goto(&self) -> E2eResult<()> {
        info!("Opening form at {}", self.url);
        let options = self.timeouts.goto_options();

        if let Err(e) = self.page.goto(&self.url, &options).await {
            warn!("Navigation failed: {}", e);
            self.screenshot("navigation-error").await;
            return Err(e);
        }

        self.page.pause(self.timeouts.settle()).await;
        let title = self.page.title().await.unwrap_or_default();
        info!("Loaded \"{}\"", title);
        self.snapshot("page-loaded").await;
        Ok(())
    }

    /// Resolve `candidates` and act on the match; `false` when nothing matched
    async fn act(&self, candidates: &SelectorCandidates, act: Act<'_>) -> E2eResult<bool> {
        let Some(locator) = find_visible(self.page, candidates).await else {
            return Ok(false);
        };
        debug!("Using '{}'", locator.selector);
        match act {
            Act::Fill(value) => self.page.fill(&locator.selector, value).await?,
            Act::Check => self.page.check(&locator.selector).await?,
            Act::Click => self.page.click(&locator.selector, false).await?,
        }
        Ok(true)
    }

    /// Apply the leniency policy of `field` to a step result
    async fn settle_step(
        &self,
        field: Field,
        found: bool,
        candidates: &SelectorCandidates,
    ) -> E2eResult<()> {
        if found {
            self.snapshot(&format!("{}-done", field)).await;
            return Ok(());
        }
        match StepPolicy::for_field(field) {
            StepPolicy::Mandatory => Err(E2eError::ElementNotFound {
                field: field.to_string(),
                tried: candidates.as_slice().to_vec(),
            }),
            StepPolicy::BestEffort => {
                warn!("No visible element for {}, continuing", field);
                self.snapshot(&format!("no-{}", field)).await;
                Ok(())
            }
        }
    }

    async fn fill_field(&self, field: Field, value: &str) -> E2eResult<()> {
        let candidates = self
            .selectors
            .text_field(field)
            .ok_or_else(|| E2eError::Config(format!("{} is not a text field", field)))?;
        let found = self.act(candidates, Act::Fill(value)).await?;
        if found {
            info!("Filled {}", field);
        }
        self.settle_step(field, found, candidates).await
    }

    /// First visible `select` with more than one option gets its second option
    pub async fn select_service_type(&self) -> E2eResult<()> {
        for base in self.selectors.service_type.iter() {
            let total = self.page.count(base).await.unwrap_or(0);
            debug!("{} candidate(s) for '{}'", total, base);

            for i in 0..total {
                let select = nth(base, i);
                let visible = self.page.is_visible(&select, None).await.unwrap_or(false);
                let options = self
                    .page
                    .count(&format!("{} >> option", select))
                    .await
                    .unwrap_or(0);
                debug!("Select {}: visible={}, options={}", i, visible, options);

                if !visible || options <= 1 {
                    continue;
                }
                match self.page.select_option(&select, &SelectOption::Index(1)).await {
                    Ok(()) => {
                        info!("Selected service type in select {}", i);
                        self.snapshot("service_type-done").await;
                        return Ok(());
                    }
                    Err(e) => debug!("Select {} rejected the option: {}", i, e),
                }
            }
        }
        self.settle_step(Field::ServiceType, false, &self.selectors.service_type)
            .await
    }

    pub async fn fill_phone(&self, phone: &str) -> E2eResult<()> {
        self.fill_field(Field::Phone, phone).await
    }

    /// Private customer radio
    pub async fn select_user_type(&self) -> E2eResult<()> {
        let found = self.act(&self.selectors.user_type, Act::Check).await?;
        self.settle_step(Field::UserType, found, &self.selectors.user_type)
            .await
    }

    pub async fn fill_name(&self, name: &str) -> E2eResult<()> {
        self.fill_field(Field::Name, name).await
    }

    pub async fn fill_plate(&self, plate: &str) -> E2eResult<()> {
        self.fill_field(Field::Plate, plate).await
    }

    pub async fn fill_mileage(&self, mileage: &str) -> E2eResult<()> {
        self.fill_field(Field::Mileage, mileage).await
    }

    pub async fn fill_vin(&self, vin: &str) -> E2eResult<()> {
        self.fill_field(Field::Vin, vin).await
    }

    /// "Is the car parked at the shop?"
    pub async fn answer_parked(&self, answer: Answer) -> E2eResult<()> {
        if answer == Answer::No {
            debug!("Parked = no is covered by the user type radio");
            return Ok(());
        }
        let candidates = self.selectors.parked.for_answer(answer);
        let found = self.act(candidates, Act::Check).await?;
        self.settle_step(Field::Parked, found, candidates).await
    }

    /// "Do you need a rental car?"
    pub async fn answer_rental(&self, answer: Answer) -> E2eResult<()> {
        let candidates = self.selectors.rental.for_answer(answer);
        let found = self.act(candidates, Act::Check).await?;
        self.settle_step(Field::Rental, found, candidates).await
    }

    /// "Can the car be driven?"
    pub async fn answer_operable(&self, answer: Answer) -> E2eResult<()> {
        let candidates = self.selectors.operable.for_answer(answer);
        let found = self.act(candidates, Act::Check).await?;
        self.settle_step(Field::Operable, found, candidates).await
    }

    pub async fn accept_terms(&self) -> E2eResult<()> {
        let found = self.act(&self.selectors.terms, Act::Check).await?;
        self.settle_step(Field::Terms, found, &self.selectors.terms)
            .await
    }

    pub async fn submit(&self) -> E2eResult<()> {
        let found = self.act(&self.selectors.submit, Act::Click).await?;
        if found {
            self.page.pause(self.timeouts.step_pause()).await;
        }
        self.settle_step(Field::Submit, found, &self.selectors.submit)
            .await
    }

    /// Every step in form order, then submit
    ///
    /// A failing step aborts the rest; earlier steps are not undone.
    pub async fn fill_complete_form(&self, record: &FormRecord) -> E2eResult<()> {
        for field in Field::FORM_ORDER {
            self.run_step(field, record).await?;
        }
        Ok(())
    }

    /// Every step except submit
    pub async fn fill_without_submit(&self, record: &FormRecord) -> E2eResult<()> {
        for field in Field::FORM_ORDER.into_iter().filter(|f| *f != Field::Submit) {
            self.run_step(field, record).await?;
        }
        Ok(())
    }

    async fn run_step(&self, field: Field, record: &FormRecord) -> E2eResult<()> {
        match field {
            Field::ServiceType => self.select_service_type().await,
            Field::Phone => self.fill_phone(&record.phone).await,
            Field::UserType => self.select_user_type().await,
            Field::Name => self.fill_name(&record.name).await,
            Field::Plate => self.fill_plate(&record.plate).await,
            Field::Mileage => self.fill_mileage(&record.mileage).await,
            Field::Vin => self.fill_vin(&record.vin).await,
            Field::Parked => self.answer_parked(record.parked_answer).await,
            Field::Rental => self.answer_rental(record.rental_answer).await,
            Field::Operable => self.answer_operable(record.operable_answer).await,
            Field::Terms if !record.terms_accepted => {
                debug!("Leaving terms unchecked");
                Ok(())
            }
            Field::Terms => self.accept_terms().await,
            Field::Submit => self.submit().await,
        }
    }

    /// Any error indicator visible
    pub async fn has_errors(&self) -> bool {
        find_visible(self.page, &self.selectors.errors).await.is_some()
    }

    /// Any success indicator visible
    pub async fn has_success(&self) -> bool {
        find_visible(self.page, &self.selectors.success).await.is_some()
    }

    /// Text of every visible error indicator
    pub async fn error_messages(&self) -> Vec<String> {
        let mut messages: Vec<String> = Vec::new();
        for selector in self.selectors.errors.iter() {
            match self.page.visible_texts(selector).await {
                Ok(texts) => {
                    for text in texts {
                        if !text.is_empty() && !messages.contains(&text) {
                            messages.push(text);
                        }
                    }
                }
                Err(e) => debug!("Reading '{}' failed: {}", selector, e),
            }
        }
        messages
    }

    pub async fn outcome(&self) -> Outcome {
        let has_errors = self.has_errors().await;
        let error_messages = if has_errors {
            self.error_messages().await
        } else {
            Vec::new()
        };
        Outcome {
            has_errors,
            has_success: self.has_success().await,
            error_messages,
        }
    }

    /// Wait for the network to go quiet, then a short pause
    pub async fn wait_for_page_stability(&self) -> E2eResult<()> {
        self.page
            .wait_for_load_state(LoadState::NetworkIdle, self.timeouts.navigation())
            .await?;
        self.page.pause(Duration::from_millis(self.timeouts.step_pause_ms)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeElement, FakePage};

    fn config() -> ProbeConfig {
        ProbeConfig {
            timeouts: Timeouts::instant(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_first_visible_candidate_wins() {
        let page = FakePage::new()
            .with(r#"input[name*="name"]"#, FakeElement::hidden())
            .with(r#"input[placeholder*="klant"]"#, FakeElement::visible())
            .with(r#"input[name="name[]"]"#, FakeElement::visible());
        let config = config();
        let form = VehicleFormPage::new(&page, &config);

        form.fill_name("Ana").await.unwrap();
        assert_eq!(
            page.filled(),
            vec![(r#"input[placeholder*="klant"]"#.to_string(), "Ana".to_string())]
        );
    }

    #[tokio::test]
    async fn test_service_type_skips_single_option_selects() {
        let page = FakePage::new()
            .with_select(0, true, 1)
            .with_select(1, false, 7)
            .with_select(2, true, 7);
        let config = config();
        let form = VehicleFormPage::new(&page, &config);

        form.select_service_type().await.unwrap();
        let selected: Vec<_> = page
            .actions()
            .into_iter()
            .filter(|a| matches!(a, crate::testing::FakeAction::Select { .. }))
            .collect();
        assert_eq!(
            selected,
            vec![crate::testing::FakeAction::Select {
                selector: "select >> nth=2".into(),
                option: SelectOption::Index(1)
            }]
        );
    }

    #[tokio::test]
    async fn test_parked_no_touches_nothing() {
        let page = FakePage::new();
        let config = config();
        let form = VehicleFormPage::new(&page, &config);
        form.answer_parked(Answer::No).await.unwrap();
        assert!(page.actions().is_empty());
    }

    #[tokio::test]
    async fn test_error_messages_deduplicated() {
        let page = FakePage::new()
            .with(".error", FakeElement::visible().with_text("Ongeldig kenteken"))
            .with(".alert", FakeElement::visible().with_text("Ongeldig kenteken"))
            .with(".field-error", FakeElement::hidden().with_text("hidden"));
        let config = config();
        let form = VehicleFormPage::new(&page, &config);
        assert_eq!(form.error_messages().await, vec!["Ongeldig kenteken"]);
        assert!(form.has_errors().await);
        assert!(!form.has_success().await);
    }
}
