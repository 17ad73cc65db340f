//! Shape checks for phone, plate and VIN values
//!
//! These are used to pre-classify fixture data and to cross-check what the
//! live site decided. A disagreement is reported, never reconciled.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{Field, FormRecord, Outcome};

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^3[0-9]{9}$").unwrap());
static PLATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]{3}[0-9]{3}$").unwrap());
static VIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").unwrap());

/// Ten digits, mobile numbers start with 3
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Three letters followed by three digits, any case
pub fn is_valid_plate(plate: &str) -> bool {
    PLATE_RE.is_match(plate)
}

/// Seventeen characters, I, O and Q excluded
pub fn is_valid_vin(vin: &str) -> bool {
    VIN_RE.is_match(vin)
}

/// Local verdict on one field of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCheck {
    pub field: Field,
    pub valid: bool,
}

/// Classify the pattern-checked fields of a record
pub fn precheck(record: &FormRecord) -> Vec<FieldCheck> {
    vec![
        FieldCheck {
            field: Field::Phone,
            valid: is_valid_phone(&record.phone),
        },
        FieldCheck {
            field: Field::Plate,
            valid: is_valid_plate(&record.plate),
        },
        FieldCheck {
            field: Field::Vin,
            valid: is_valid_vin(&record.vin),
        },
    ]
}

/// Describe how the site disagreed with the local checks, if it did
pub fn divergence(checks: &[FieldCheck], outcome: &Outcome) -> Option<String> {
    let invalid: Vec<String> = checks
        .iter()
        .filter(|c| !c.valid)
        .map(|c| c.field.to_string())
        .collect();

    if invalid.is_empty() && outcome.has_errors {
        Some(format!(
            "site reported errors for locally valid data: {:?}",
            outcome.error_messages
        ))
    } else if !invalid.is_empty() && !outcome.has_errors {
        Some(format!(
            "site accepted locally invalid fields: {}",
            invalid.join(", ")
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precheck_valid_record() {
        let record = FormRecord {
            phone: "3015363880".to_string(),
            plate: "abc123".to_string(),
            vin: "1HGBH41JXMN109186".to_string(),
            ..Default::default()
        };
        assert!(precheck(&record).iter().all(|c| c.valid));
    }

    #[test]
    fn test_divergence_reports_both_directions() {
        let valid = [FieldCheck { field: Field::Phone, valid: true }];
        let invalid = [FieldCheck { field: Field::Plate, valid: false }];
        let rejected = Outcome {
            has_errors: true,
            ..Default::default()
        };
        let accepted = Outcome::default();

        assert!(divergence(&valid, &rejected).is_some());
        assert!(divergence(&invalid, &accepted).unwrap().contains("plate"));
        assert!(divergence(&valid, &accepted).is_none());
        assert!(divergence(&invalid, &rejected).is_none());
    }
}
