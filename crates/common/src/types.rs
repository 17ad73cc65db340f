//! Core types for BookProbe

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Yes/no answer to one of the form's questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    pub fn is_yes(self) -> bool {
        matches!(self, Answer::Yes)
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Yes => write!(f, "yes"),
            Answer::No => write!(f, "no"),
        }
    }
}

impl FromStr for Answer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "ja" | "true" => Ok(Answer::Yes),
            "no" | "n" | "nee" | "false" => Ok(Answer::No),
            other => Err(Error::UnknownAnswer(other.to_string())),
        }
    }
}

/// Flat set of logical field values fed into one form run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRecord {
    #[serde(default = "default_service_type")]
    pub service_type: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_user_type")]
    pub user_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub plate: String,
    #[serde(default)]
    pub mileage: String,
    #[serde(default)]
    pub vin: String,
    #[serde(default = "default_no")]
    pub parked_answer: Answer,
    #[serde(default = "default_no")]
    pub rental_answer: Answer,
    #[serde(default = "default_yes")]
    pub operable_answer: Answer,
    #[serde(default = "default_terms")]
    pub terms_accepted: bool,
}

fn default_service_type() -> String {
    "diagnose".to_string()
}

fn default_user_type() -> String {
    "particular".to_string()
}

fn default_no() -> Answer {
    Answer::No
}

fn default_yes() -> Answer {
    Answer::Yes
}

fn default_terms() -> bool {
    true
}

impl Default for FormRecord {
    fn default() -> Self {
        Self {
            service_type: default_service_type(),
            phone: String::new(),
            user_type: default_user_type(),
            name: String::new(),
            plate: String::new(),
            mileage: String::new(),
            vin: String::new(),
            parked_answer: Answer::No,
            rental_answer: Answer::No,
            operable_answer: Answer::Yes,
            terms_accepted: true,
        }
    }
}

impl FormRecord {
    /// Value of a text field, `None` for click-type steps
    pub fn value_of(&self, field: Field) -> Option<&str> {
        match field {
            Field::ServiceType => Some(&self.service_type),
            Field::Phone => Some(&self.phone),
            Field::UserType => Some(&self.user_type),
            Field::Name => Some(&self.name),
            Field::Plate => Some(&self.plate),
            Field::Mileage => Some(&self.mileage),
            Field::Vin => Some(&self.vin),
            _ => None,
        }
    }

    /// Text fields that were left empty
    pub fn empty_fields(&self) -> Vec<Field> {
        [Field::Phone, Field::Name, Field::Plate, Field::Mileage, Field::Vin]
            .into_iter()
            .filter(|f| self.value_of(*f).map(str::is_empty).unwrap_or(false))
            .collect()
    }
}

/// Logical form field or wizard step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ServiceType,
    Phone,
    UserType,
    Name,
    Plate,
    Mileage,
    Vin,
    Parked,
    Rental,
    Operable,
    Terms,
    Submit,
}

impl Field {
    /// Fill order used by the complete-form composite
    pub const FORM_ORDER: [Field; 12] = [
        Field::ServiceType,
        Field::Phone,
        Field::UserType,
        Field::Name,
        Field::Plate,
        Field::Mileage,
        Field::Vin,
        Field::Parked,
        Field::Rental,
        Field::Operable,
        Field::Terms,
        Field::Submit,
    ];
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Field::ServiceType => "service_type",
            Field::Phone => "phone",
            Field::UserType => "user_type",
            Field::Name => "name",
            Field::Plate => "plate",
            Field::Mileage => "mileage",
            Field::Vin => "vin",
            Field::Parked => "parked",
            Field::Rental => "rental",
            Field::Operable => "operable",
            Field::Terms => "terms",
            Field::Submit => "submit",
        };
        write!(f, "{}", s)
    }
}

/// Expected outcome of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    Success,
    Error,
    /// Depends on an unconfirmed business rule of the site
    SuccessOrError,
}

impl Expectation {
    /// Judge an observed outcome against this expectation
    pub fn judge(self, outcome: &Outcome) -> Verdict {
        match self {
            Expectation::Success if outcome.has_errors => Verdict::Fail,
            Expectation::Success => Verdict::Pass,
            Expectation::Error if outcome.has_errors => Verdict::Pass,
            Expectation::Error => Verdict::Fail,
            Expectation::SuccessOrError => Verdict::Unconfirmed,
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Success => write!(f, "success"),
            Expectation::Error => write!(f, "error"),
            Expectation::SuccessOrError => write!(f, "success_or_error"),
        }
    }
}

/// Which field a failing case is expected to trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorTag {
    Phone,
    Name,
    Plate,
    Vin,
    Mileage,
    Terms,
    Multiple,
    NameSanitization,
    MileageValidation,
    ParkedValidation,
    RentalValidation,
    OperableValidation,
}

/// Fixture record plus the outcome it should produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub record: FormRecord,
    pub expected: Expectation,
    #[serde(default)]
    pub expected_error: Option<ErrorTag>,
}

impl TestCase {
    pub fn new(name: impl Into<String>, record: FormRecord, expected: Expectation) -> Self {
        Self {
            name: name.into(),
            record,
            expected,
            expected_error: None,
        }
    }

    pub fn with_error(mut self, tag: ErrorTag) -> Self {
        self.expected_error = Some(tag);
        self
    }
}

/// What the page showed after a submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub has_errors: bool,
    pub has_success: bool,
    #[serde(default)]
    pub error_messages: Vec<String>,
}

/// Result of judging an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    /// Observed and logged, not asserted
    Unconfirmed,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "pass"),
            Verdict::Fail => write!(f, "fail"),
            Verdict::Unconfirmed => write!(f, "unconfirmed"),
        }
    }
}

/// Payment method offered on the invoice page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    Ideal,
    DebitCard,
    BankTransfer,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::CreditCard,
        PaymentMethod::Ideal,
        PaymentMethod::DebitCard,
        PaymentMethod::BankTransfer,
    ];

    /// Visible label of the method's button
    pub fn button_label(self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "Credit card",
            PaymentMethod::Ideal => "iDEAL",
            PaymentMethod::DebitCard => "Debit card",
            PaymentMethod::BankTransfer => "Bank transfer",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::Ideal => "ideal",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" | "credit card" => Ok(PaymentMethod::CreditCard),
            "ideal" | "iDEAL" => Ok(PaymentMethod::Ideal),
            "debit_card" | "debit card" => Ok(PaymentMethod::DebitCard),
            "bank_transfer" | "bank transfer" => Ok(PaymentMethod::BankTransfer),
            other => Err(Error::UnknownPaymentMethod(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(has_errors: bool) -> Outcome {
        Outcome {
            has_errors,
            ..Default::default()
        }
    }

    #[test]
    fn test_judge_success_and_error() {
        assert_eq!(Expectation::Success.judge(&outcome(false)), Verdict::Pass);
        assert_eq!(Expectation::Success.judge(&outcome(true)), Verdict::Fail);
        assert_eq!(Expectation::Error.judge(&outcome(true)), Verdict::Pass);
        assert_eq!(Expectation::Error.judge(&outcome(false)), Verdict::Fail);
    }

    #[test]
    fn test_ambiguous_cases_are_never_asserted() {
        assert_eq!(Expectation::SuccessOrError.judge(&outcome(true)), Verdict::Unconfirmed);
        assert_eq!(Expectation::SuccessOrError.judge(&outcome(false)), Verdict::Unconfirmed);
    }

    #[test]
    fn test_empty_fields() {
        let record = FormRecord {
            phone: "3015363880".to_string(),
            plate: "ABC123".to_string(),
            ..Default::default()
        };
        assert_eq!(record.empty_fields(), vec![Field::Name, Field::Mileage, Field::Vin]);
    }

    #[test]
    fn test_record_deserializes_with_defaults() {
        let record: FormRecord = serde_yaml::from_str("phone: '3015363880'\nname: Ana\n").unwrap();
        assert_eq!(record.service_type, "diagnose");
        assert_eq!(record.operable_answer, Answer::Yes);
        assert!(record.terms_accepted);
    }

    #[test]
    fn test_answer_parse() {
        assert_eq!("Ja".parse::<Answer>().unwrap(), Answer::Yes);
        assert_eq!("no".parse::<Answer>().unwrap(), Answer::No);
        assert!("maybe".parse::<Answer>().is_err());
    }
}
