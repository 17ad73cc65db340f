//! Selector fallback chains for the vehicle form

use bookprobe_common::{Answer, Field};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::page::{BrowserPage, Locator};

/// Ordered selectors for one logical field; the first visible match wins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorCandidates(Vec<String>);

impl SelectorCandidates {
    pub fn new<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(selectors.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// What happens when no candidate of a step resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPolicy {
    /// Fail the step with `ElementNotFound`
    Mandatory,
    /// Log a warning and carry on
    BestEffort,
}

impl StepPolicy {
    pub fn for_field(field: Field) -> Self {
        match field {
            Field::UserType
            | Field::Name
            | Field::Plate
            | Field::Mileage
            | Field::Vin
            | Field::Submit => StepPolicy::Mandatory,
            Field::ServiceType
            | Field::Phone
            | Field::Parked
            | Field::Rental
            | Field::Operable
            | Field::Terms => StepPolicy::BestEffort,
        }
    }
}

/// Radio candidates for a yes/no question
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerSelectors {
    pub yes: SelectorCandidates,
    pub no: SelectorCandidates,
}

impl AnswerSelectors {
    pub fn for_answer(&self, answer: Answer) -> &SelectorCandidates {
        match answer {
            Answer::Yes => &self.yes,
            Answer::No => &self.no,
        }
    }
}

/// Candidate tables for every step of the vehicle form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSelectors {
    /// Every `select` on the page; scanned for the first usable one
    pub service_type: SelectorCandidates,
    pub phone: SelectorCandidates,
    pub user_type: SelectorCandidates,
    pub name: SelectorCandidates,
    pub plate: SelectorCandidates,
    pub mileage: SelectorCandidates,
    pub vin: SelectorCandidates,
    /// Only `yes` is used; "no" is the user-type radio
    pub parked: AnswerSelectors,
    pub rental: AnswerSelectors,
    /// `yes` means the car can be driven
    pub operable: AnswerSelectors,
    pub terms: SelectorCandidates,
    pub submit: SelectorCandidates,
    pub errors: SelectorCandidates,
    pub success: SelectorCandidates,
}

impl Default for FormSelectors {
    fn default() -> Self {
        Self {
            service_type: SelectorCandidates::new(["select"]),
            phone: SelectorCandidates::new([
                r#"input[placeholder*="1234567"]"#,
                r#"input[name*="phone"]"#,
                r#"input[type="text"][placeholder*="321"]"#,
                r#"input[type="text"][placeholder*="123"]"#,
            ]),
            user_type: SelectorCandidates::new([
                r#"input[name="attvs[]"][value="0"]"#,
                r#"input[name*="attvs"]"#,
            ]),
            name: SelectorCandidates::new([
                r#"input[name*="name"]"#,
                r#"input[placeholder*="klant"]"#,
                r#"input[name="name[]"]"#,
            ]),
            plate: SelectorCandidates::new([
                r#"input[name*="plate"]"#,
                r#"input[placeholder*="Kenteken"]"#,
                r#"input[name="licenseplate[]"]"#,
            ]),
            mileage: SelectorCandidates::new([
                r#"input[name*="mileage"]"#,
                r#"input[placeholder*="Kilometerstand"]"#,
                r#"input[name="mileage[]"]"#,
            ]),
            vin: SelectorCandidates::new([
                r#"input[name*="vin"]"#,
                r#"input[placeholder*="typ"]"#,
                r#"input[name="vin[]"]"#,
            ]),
            parked: AnswerSelectors {
                yes: SelectorCandidates::new([
                    r#"input[name="attvs[]"][value="1"]"#,
                    r#"input[name*="attvs"][value="1"]"#,
                ]),
                no: SelectorCandidates::default(),
            },
            rental: AnswerSelectors {
                yes: SelectorCandidates::new([
                    r#"input[name="loanCar[]"][value="1"]"#,
                    r#"input[name*="loanCar"][value="1"]"#,
                ]),
                no: SelectorCandidates::new([
                    r#"input[name="loanCar[]"][value="0"]"#,
                    r#"input[name*="loanCar"][value="0"]"#,
                ]),
            },
            operable: AnswerSelectors {
                yes: SelectorCandidates::new([
                    r#"input[name="inoperableCar[]"][value="0"]"#,
                    r#"input[name*="inoperableCar"][value="0"]"#,
                ]),
                no: SelectorCandidates::new([
                    r#"input[name="inoperableCar[]"][value="1"]"#,
                    r#"input[name*="inoperableCar"][value="1"]"#,
                ]),
            },
            terms: SelectorCandidates::new([
                r#"input[name="terms[]"]"#,
                r#"input[type="checkbox"] >> nth=0"#,
            ]),
            submit: SelectorCandidates::new([
                r#"button[type="submit"]:visible"#,
                r#"input[type="submit"]:visible"#,
                r#"button[type="submit"]"#,
            ]),
            errors: SelectorCandidates::new([
                ".error",
                ".alert",
                ".validation-error",
                ".field-error",
                r#"[role="alert"]"#,
            ]),
            success: SelectorCandidates::new([
                ".success",
                ".confirmation",
                ".thank-you",
                ".bedankt",
                r#"[data-testid="success"]"#,
            ]),
        }
    }
}

impl FormSelectors {
    /// Candidates for a text field
    pub fn text_field(&self, field: Field) -> Option<&SelectorCandidates> {
        match field {
            Field::Phone => Some(&self.phone),
            Field::Name => Some(&self.name),
            Field::Plate => Some(&self.plate),
            Field::Mileage => Some(&self.mileage),
            Field::Vin => Some(&self.vin),
            _ => None,
        }
    }
}

/// First candidate that exists and is visible
///
/// A candidate whose probe errors (bad selector, detached frame) is skipped.
pub async fn find_visible<P>(page: &P, candidates: &SelectorCandidates) -> Option<Locator>
where
    P: BrowserPage + ?Sized,
{
    for selector in candidates.iter() {
        match page.count(selector).await {
            Ok(0) => continue,
            Ok(_) => {}
            Err(e) => {
                debug!("Selector '{}' failed: {}", selector, e);
                continue;
            }
        }
        match page.is_visible(selector, None).await {
            Ok(true) => return Some(Locator::new(selector)),
            Ok(false) => debug!("Selector '{}' present but hidden", selector),
            Err(e) => debug!("Selector '{}' failed: {}", selector, e),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table() {
        let mandatory: Vec<Field> = Field::FORM_ORDER
            .into_iter()
            .filter(|f| StepPolicy::for_field(*f) == StepPolicy::Mandatory)
            .collect();
        assert_eq!(
            mandatory,
            vec![
                Field::UserType,
                Field::Name,
                Field::Plate,
                Field::Mileage,
                Field::Vin,
                Field::Submit
            ]
        );
    }

    #[test]
    fn test_selectors_override_from_toml() {
        let selectors: FormSelectors =
            toml::from_str("name = ['#customer-name']\n[rental]\nno = ['#no-rental']\n").unwrap();
        assert_eq!(selectors.name.as_slice(), ["#customer-name"]);
        assert_eq!(selectors.rental.no.as_slice(), ["#no-rental"]);
        assert_eq!(selectors.plate, FormSelectors::default().plate);
    }

    #[test]
    fn test_parked_no_has_no_candidates() {
        assert!(FormSelectors::default().parked.for_answer(Answer::No).is_empty());
    }
}
