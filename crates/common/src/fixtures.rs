//! Fixture records and case tables
//!
//! The builtin table covers valid data, empty mandatory fields, malformed
//! plates/phones/VINs, edge values and form-specific answers. Extra tables
//! can be loaded from YAML files with the same shape.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{Answer, ErrorTag, Expectation, FormRecord, TestCase};

/// Baseline record every case is derived from
pub fn valid_record() -> FormRecord {
    FormRecord {
        service_type: "diagnose".to_string(),
        phone: "3015363880".to_string(),
        user_type: "particular".to_string(),
        name: "carlos gallego".to_string(),
        plate: "TEST123".to_string(),
        mileage: "50000".to_string(),
        vin: "12345678901234567".to_string(),
        parked_answer: Answer::No,
        rental_answer: Answer::No,
        operable_answer: Answer::Yes,
        terms_accepted: true,
    }
}

/// Case groups keyed by purpose
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseTable {
    #[serde(default)]
    pub valid: Vec<TestCase>,
    #[serde(default)]
    pub empty_fields: Vec<TestCase>,
    #[serde(default)]
    pub invalid_plates: Vec<TestCase>,
    #[serde(default)]
    pub invalid_phones: Vec<TestCase>,
    #[serde(default)]
    pub invalid_vins: Vec<TestCase>,
    #[serde(default)]
    pub edge_cases: Vec<TestCase>,
    #[serde(default)]
    pub form_specific: Vec<TestCase>,
}

impl CaseTable {
    pub const GROUPS: [&'static str; 7] = [
        "valid",
        "empty_fields",
        "invalid_plates",
        "invalid_phones",
        "invalid_vins",
        "edge_cases",
        "form_specific",
    ];

    /// The cases shipped with the crate
    pub fn builtin() -> Self {
        let base = valid_record();
        let with = |f: &dyn Fn(&mut FormRecord)| {
            let mut record = base.clone();
            f(&mut record);
            record
        };
        let error = |name: &str, record: FormRecord, tag: ErrorTag| {
            TestCase::new(name, record, Expectation::Error).with_error(tag)
        };
        let unsure = |name: &str, record: FormRecord, tag: ErrorTag| {
            TestCase::new(name, record, Expectation::SuccessOrError).with_error(tag)
        };

        Self {
            valid: vec![
                TestCase::new("standard valid user", base.clone(), Expectation::Success),
                TestCase::new(
                    "high but valid mileage",
                    with(&|r| r.mileage = "999999".to_string()),
                    Expectation::Success,
                ),
                TestCase::new(
                    "minimal valid VIN",
                    with(&|r| r.vin = "12345678901234567".to_string()),
                    Expectation::Success,
                ),
            ],
            empty_fields: vec![
                error("empty phone", with(&|r| r.phone.clear()), ErrorTag::Phone),
                error("empty name", with(&|r| r.name.clear()), ErrorTag::Name),
                error("empty plate", with(&|r| r.plate.clear()), ErrorTag::Plate),
                error(
                    "all fields empty",
                    with(&|r| {
                        r.phone.clear();
                        r.name.clear();
                        r.plate.clear();
                        r.mileage.clear();
                        r.vin.clear();
                    }),
                    ErrorTag::Multiple,
                ),
            ],
            invalid_plates: [
                ("plate too short", "TEST"),
                ("plate too long", "TEST12345"),
                ("plate with hyphen", "TEST-123"),
                ("plate with at sign", "TEST@123"),
                ("plate digits only", "1234567"),
            ]
            .into_iter()
            .map(|(name, plate)| error(name, with(&|r| r.plate = plate.to_string()), ErrorTag::Plate))
            .collect(),
            invalid_phones: [
                ("phone with 9 digits", "301536388"),
                ("phone with 11 digits", "30153638801"),
                ("phone with hyphens", "301-536-3880"),
                ("phone with a letter", "301536388a"),
                ("phone letters only", "abcdefghij"),
            ]
            .into_iter()
            .map(|(name, phone)| error(name, with(&|r| r.phone = phone.to_string()), ErrorTag::Phone))
            .collect(),
            invalid_vins: [
                ("VIN too short", "12345"),
                ("VIN too long", "12345678901234567890"),
                ("VIN with special characters", "123-456-789"),
            ]
            .into_iter()
            .map(|(name, vin)| error(name, with(&|r| r.vin = vin.to_string()), ErrorTag::Vin))
            .collect(),
            edge_cases: vec![
                unsure(
                    "name with markup characters",
                    with(&|r| r.name = "Carlos<>Gallego".to_string()),
                    ErrorTag::NameSanitization,
                ),
                error(
                    "negative mileage",
                    with(&|r| r.mileage = "-50000".to_string()),
                    ErrorTag::Mileage,
                ),
                unsure(
                    "zero mileage",
                    with(&|r| r.mileage = "0".to_string()),
                    ErrorTag::MileageValidation,
                ),
                error(
                    "extremely high mileage",
                    with(&|r| r.mileage = "999999999".to_string()),
                    ErrorTag::Mileage,
                ),
                TestCase::new(
                    "lowercase plate",
                    with(&|r| r.plate = "test123".to_string()),
                    Expectation::Success,
                ),
                error("very long name", with(&|r| r.name = "a".repeat(100)), ErrorTag::Name),
            ],
            form_specific: vec![
                error("terms not accepted", with(&|r| r.terms_accepted = false), ErrorTag::Terms),
                unsure(
                    "parked at the shop",
                    with(&|r| r.parked_answer = Answer::Yes),
                    ErrorTag::ParkedValidation,
                ),
                unsure(
                    "wants a rental car",
                    with(&|r| r.rental_answer = Answer::Yes),
                    ErrorTag::RentalValidation,
                ),
                unsure(
                    "car not operable",
                    with(&|r| r.operable_answer = Answer::No),
                    ErrorTag::OperableValidation,
                ),
            ],
        }
    }

    /// Cases of one named group
    pub fn group(&self, name: &str) -> Result<&[TestCase]> {
        let cases = match name {
            "valid" => &self.valid,
            "empty_fields" => &self.empty_fields,
            "invalid_plates" => &self.invalid_plates,
            "invalid_phones" => &self.invalid_phones,
            "invalid_vins" => &self.invalid_vins,
            "edge_cases" => &self.edge_cases,
            "form_specific" => &self.form_specific,
            other => return Err(Error::UnknownCaseGroup(other.to_string())),
        };
        Ok(cases)
    }

    /// Every case paired with its group name
    pub fn all(&self) -> Vec<(&'static str, &TestCase)> {
        Self::GROUPS
            .iter()
            .filter_map(|g| self.group(g).ok().map(|cases| (*g, cases)))
            .flat_map(|(g, cases)| cases.iter().map(move |c| (g, c)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append the groups of another table
    pub fn extend(&mut self, other: CaseTable) {
        self.valid.extend(other.valid);
        self.empty_fields.extend(other.empty_fields);
        self.invalid_plates.extend(other.invalid_plates);
        self.invalid_phones.extend(other.invalid_phones);
        self.invalid_vins.extend(other.invalid_vins);
        self.edge_cases.extend(other.edge_cases);
        self.form_specific.extend(other.form_specific);
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let table: CaseTable = serde_yaml::from_str(yaml)?;
        if let Some((_, case)) = table.all().into_iter().find(|(_, c)| c.name.trim().is_empty()) {
            return Err(Error::InvalidFixture(format!(
                "case with empty name (expected {})",
                case.expected
            )));
        }
        Ok(table)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Merge every `*.yaml`/`*.yml` table under a directory
    pub fn load_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::InvalidFixture(format!(
                "case directory not found: {}",
                dir.display()
            )));
        }
        let mut table = CaseTable::default();

        for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            let is_yaml = entry
                .path()
                .extension()
                .map(|ext| ext == "yaml" || ext == "yml")
                .unwrap_or(false);
            if !is_yaml {
                continue;
            }
            tracing::debug!("Loading case table {}", entry.path().display());
            table.extend(Self::from_file(entry.path())?);
        }

        Ok(table)
    }
}

/// Repeated submissions with a short pause in between
#[derive(Debug, Clone)]
pub struct RapidSubmissions {
    pub count: usize,
    pub delay_between: Duration,
    pub record: FormRecord,
}

#[derive(Debug, Clone)]
pub struct PerformanceData {
    pub rapid: RapidSubmissions,
    pub large: FormRecord,
}

pub fn performance_data() -> PerformanceData {
    PerformanceData {
        rapid: RapidSubmissions {
            count: 10,
            delay_between: Duration::from_millis(100),
            record: valid_record(),
        },
        large: FormRecord {
            name: "a".repeat(500),
            phone: "3015363880".to_string(),
            plate: "TEST123456789".to_string(),
            mileage: "999999999".to_string(),
            vin: "123456789012345678901234567890".to_string(),
            ..FormRecord::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_group_sizes() {
        let table = CaseTable::builtin();
        assert_eq!(table.valid.len(), 3);
        assert_eq!(table.empty_fields.len(), 4);
        assert_eq!(table.invalid_plates.len(), 5);
        assert_eq!(table.invalid_phones.len(), 5);
        assert_eq!(table.invalid_vins.len(), 3);
        assert_eq!(table.edge_cases.len(), 6);
        assert_eq!(table.form_specific.len(), 4);
        assert_eq!(table.len(), 30);
    }

    #[test]
    fn test_terms_case_withholds_acceptance() {
        let table = CaseTable::builtin();
        let case = &table.form_specific[0];
        assert!(!case.record.terms_accepted);
        assert_eq!(case.expected_error, Some(ErrorTag::Terms));
    }

    #[test]
    fn test_unknown_group() {
        assert!(CaseTable::builtin().group("nope").is_err());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
invalid_phones:
  - name: landline number
    expected: error
    expected_error: phone
    record:
      phone: '0101234567'
      name: Ana
      plate: ABC123
"#;
        let table = CaseTable::from_yaml(yaml).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.invalid_phones[0].record.phone, "0101234567");
    }

    #[test]
    fn test_from_yaml_rejects_unnamed_case() {
        let yaml = "valid:\n  - name: ''\n    expected: success\n    record: {}\n";
        assert!(CaseTable::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_load_dir_merges_tables() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.yaml"),
            "valid:\n  - name: one\n    expected: success\n    record: {}\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.yml"),
            "edge_cases:\n  - name: two\n    expected: success_or_error\n    record: {}\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("ignored.txt"), "not yaml").unwrap();

        let table = CaseTable::load_dir(dir.path()).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_load_dir_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("typo");
        let err = CaseTable::load_dir(&missing).unwrap_err();
        assert!(matches!(err, Error::InvalidFixture(_)));
        assert!(err.to_string().contains("case directory not found"));
    }

    #[test]
    fn test_load_dir_rejects_a_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cases.yaml");
        std::fs::write(&file, "valid: []\n").unwrap();
        assert!(CaseTable::load_dir(&file).is_err());
    }
}
